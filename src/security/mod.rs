//! Roles and the capability checks applied by the web layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::entities::order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_CLIENT")]
    Client,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Client, Role::Admin];

    /// Role given to every account on registration.
    pub const DEFAULT: Role = Role::Client;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "ROLE_CLIENT",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller of a request, resolved from its token and reloaded from the
/// database so role and enabled-flag changes apply immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub surname: String,
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }

    /// Orders are visible to their owner and to administrators.
    pub fn can_access_order(&self, order: &order::Model) -> bool {
        self.is_admin() || order.user_id == self.id
    }

    /// Profiles can be edited by their owner and by administrators.
    pub fn can_manage_user(&self, user_id: i32) -> bool {
        self.is_admin() || self.id == user_id
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i32, roles: Vec<Role>) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            email: format!("user{id}@example.com"),
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            roles,
        }
    }

    fn order_owned_by(user_id: i32) -> order::Model {
        let now = Utc::now();
        order::Model {
            id: 10,
            user_id,
            product_id: 1,
            final_cost: 20.0,
            creation_date: now,
            expiry_date: now,
        }
    }

    #[test]
    fn test_role_names_round_trip() {
        assert_eq!(Role::from_name("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_name("ROLE_CLIENT"), Some(Role::Client));
        assert_eq!(Role::from_name("ROLE_ROOT"), None);
        assert_eq!(Role::DEFAULT.to_string(), "ROLE_CLIENT");
    }

    #[test]
    fn test_owner_can_access_own_order() {
        let client = user(1, vec![Role::Client]);
        assert!(client.can_access_order(&order_owned_by(1)));
    }

    #[test]
    fn test_client_cannot_access_foreign_order() {
        let client = user(1, vec![Role::Client]);
        assert!(!client.can_access_order(&order_owned_by(2)));
        assert!(!client.can_manage_user(2));
    }

    #[test]
    fn test_admin_can_access_any_order() {
        let admin = user(5, vec![Role::Client, Role::Admin]);
        assert!(admin.is_admin());
        assert!(admin.can_access_order(&order_owned_by(2)));
        assert!(admin.can_manage_user(2));
    }

    #[test]
    fn test_user_without_roles_has_no_capabilities() {
        let nobody = user(3, vec![]);
        assert!(!nobody.has_any_role(&[Role::Client, Role::Admin]));
    }
}
