use emporium_store::{CollectionOptions, UniqueIndex};
use serde::{Deserialize, Serialize};

use super::Entity;

/// A rating left by a customer for a product of a delivered order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub product_id: String,
    pub user_id:    String,
    /// Author name at the time of writing.
    pub user_name:  String,
    pub order_id:   String,
    /// 1 to 5.
    pub rating:     u8,
    pub comment:    String,
}

impl Entity for Review {
    const COLLECTION: &'static str = "reviews";
    const NAME: &'static str = "Review";

    fn collection_options() -> CollectionOptions {
        CollectionOptions::default().unique(UniqueIndex::compound(&["user_id", "product_id", "order_id"]))
    }
}
