use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::services::{Sale, SaleInput};

/// Dates travel as `dd-MM-yyyy`.
mod day_month_year {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d-%m-%Y";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleRequest {
    pub product_id: i32,
    #[serde(with = "day_month_year")]
    pub start: NaiveDate,
    #[serde(with = "day_month_year")]
    pub stop: NaiveDate,
    pub discount: i32,
    pub enabled: bool,
}

impl From<UpdateSaleRequest> for SaleInput {
    fn from(req: UpdateSaleRequest) -> Self {
        SaleInput {
            product_id: req.product_id,
            start: req.start,
            stop: req.stop,
            discount: req.discount,
            enabled: req.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentSalesResponse {
    pub otd: Option<Sale>,
    pub ad: Option<Sale>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_request_uses_day_first_dates() {
        let req: UpdateSaleRequest = serde_json::from_str(
            r#"{"product_id": 3, "start": "01-02-2024", "stop": "15-02-2024", "discount": 20, "enabled": true}"#,
        )
        .unwrap();
        assert_eq!(req.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(req.stop, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["start"], "01-02-2024");
    }

    #[test]
    fn test_sale_request_rejects_iso_dates() {
        let result = serde_json::from_str::<UpdateSaleRequest>(
            r#"{"product_id": 3, "start": "2024-02-01", "stop": "15-02-2024", "discount": 20, "enabled": true}"#,
        );
        assert!(result.is_err());
    }
}
