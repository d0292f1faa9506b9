use serde::{Deserialize, Serialize};

use super::Entity;

/// A catalogue entry. `rating` and `num_reviews` are derived from the
/// product's reviews and never set by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name:        String,
    pub description: String,
    pub brand:       String,
    pub category:    String,
    pub price_cents: u64,
    pub stock:       u64,
    pub images:      Vec<String>,
    pub rating:      f64,
    pub num_reviews: u64,
    /// Id of the admin who created the product.
    pub created_by:  String,
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const NAME: &'static str = "Product";
}
