use serde::{Deserialize, Serialize};

use super::Entity;

/// A registered tenant. The document id is the tenant slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
}

impl Entity for Tenant {
    const COLLECTION: &'static str = "tenants";
    const NAME: &'static str = "Tenant";
}
