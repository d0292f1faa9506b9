//! Document schemas persisted in tenant stores.
//!
//! Every model is stored as the `data` of a store document; the document id
//! and timestamps are surfaced alongside the fields through [`Stored`].

use chrono::{DateTime, Utc};
use emporium_store::{CollectionOptions, Document};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub mod address;
pub mod event;
pub mod image;
pub mod order;
pub mod product;
pub mod review;
pub mod tenant;
pub mod user;

pub use address::Address;
pub use event::EventRecord;
pub use image::ImageAsset;
pub use order::{Order, OrderItem, OrderStatus, ShippingAddress};
pub use product::Product;
pub use review::Review;
pub use tenant::Tenant;
pub use user::{Role, User, UserProfile};

/// A model persisted in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection holding the documents.
    const COLLECTION: &'static str;
    /// Name used in error messages.
    const NAME: &'static str;

    /// Unique indexes and other collection settings.
    fn collection_options() -> CollectionOptions { CollectionOptions::default() }
}

/// A model together with the metadata of the document that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id:         String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data:       T,
}

impl<T: DeserializeOwned> Stored<T> {
    /// Decodes the data of a store document.
    pub fn from_document(doc: Document) -> serde_json::Result<Self> {
        let id = doc.id().to_owned();
        let created_at = doc.created_at();
        let updated_at = doc.updated_at();
        Ok(Self {
            id,
            created_at,
            updated_at,
            data: serde_json::from_value(doc.into_data())?,
        })
    }
}
