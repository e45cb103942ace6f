//! Plain-text PDF receipts for orders.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

use crate::db::entities::{order, product, user};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF encoding failed: {0}")]
    Encoding(#[from] lopdf::Error),
    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const LINE_HEIGHT: i64 = 18;

/// Name offered to the browser for the receipt download.
pub fn receipt_filename(order: &order::Model) -> String {
    format!("userOrder_{}_{}.pdf", order.id, order.user_id)
}

/// The receipt text, one entry per line.
pub fn receipt_lines(order: &order::Model, product: &product::Model, owner: &user::Model) -> Vec<String> {
    vec![
        format!("Order #{}", order.id),
        String::new(),
        format!("Customer: {} {}", owner.first_name, owner.surname),
        format!("Email: {}", owner.email),
        format!("Address: {}", owner.address),
        String::new(),
        format!("Product: {} (#{})", product.category, product.id),
        format!("Ram: {} GB", product.ram),
        format!("Cores: {}", product.cores),
        format!("Storage: {} GB", product.storage),
        format!("Transfer: {} GB", product.transfer),
        String::new(),
        format!("Purchased: {}", order.creation_date.format("%d-%m-%Y %H:%M UTC")),
        format!("Valid until: {}", order.expiry_date.format("%d-%m-%Y %H:%M UTC")),
        format!("Total paid: {:.2}", order.final_cost),
    ]
}

fn text_operations(lines: &[String]) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F2".into(), 18.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
        Operation::new("Tj", vec![Object::string_literal("Purchase receipt")]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("TL", vec![LINE_HEIGHT.into()]),
        Operation::new("T*", vec![]),
    ];
    for line in lines {
        operations.push(Operation::new("T*", vec![]));
        if !line.is_empty() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        }
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

/// Renders a one-page receipt for `order`.
pub fn export_order_receipt(
    order: &order::Model,
    product: &product::Model,
    owner: &user::Model,
) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let content = Content {
        operations: text_operations(&receipt_lines(order, product, owner)),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fixtures() -> (order::Model, product::Model, user::Model) {
        let created = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let order = order::Model {
            id: 12,
            user_id: 5,
            product_id: 3,
            final_cost: 135.0,
            creation_date: created,
            expiry_date: Utc.with_ymd_and_hms(2024, 4, 4, 10, 0, 0).unwrap(),
        };
        let product = product::Model {
            id: 3,
            category: "Pro".to_string(),
            price: 150.0,
            ram: 16,
            cores: 8,
            storage: 320,
            transfer: 5000,
        };
        let owner = user::Model {
            id: 5,
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            address: "12 Analytical Row".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            enabled: true,
            profile_picture_filename: None,
            created_at: created,
            updated_at: created,
        };
        (order, product, owner)
    }

    #[test]
    fn test_receipt_filename() {
        let (order, _, _) = fixtures();
        assert_eq!(receipt_filename(&order), "userOrder_12_5.pdf");
    }

    #[test]
    fn test_receipt_lines_describe_order() {
        let (order, product, owner) = fixtures();
        let lines = receipt_lines(&order, &product, &owner);
        assert_eq!(lines[0], "Order #12");
        assert!(lines.contains(&"Customer: Ada Lovelace".to_string()));
        assert!(lines.contains(&"Ram: 16 GB".to_string()));
        assert!(lines.contains(&"Valid until: 04-04-2024 10:00 UTC".to_string()));
        assert!(lines.contains(&"Total paid: 135.00".to_string()));
    }

    #[test]
    fn test_export_produces_single_page_pdf() {
        let (order, product, owner) = fixtures();
        let bytes = export_order_receipt(&order, &product, &owner).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }
}
