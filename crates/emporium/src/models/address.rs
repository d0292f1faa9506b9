use serde::{Deserialize, Serialize};

use super::Entity;

/// A saved shipping address. Exactly one address per user with any address is
/// the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub user_id:     String,
    pub full_name:   String,
    pub line1:       String,
    pub line2:       Option<String>,
    pub city:        String,
    pub state:       Option<String>,
    pub postal_code: String,
    pub country:     String,
    pub phone:       Option<String>,
    pub is_default:  bool,
}

impl Entity for Address {
    const COLLECTION: &'static str = "addresses";
    const NAME: &'static str = "Address";
}
