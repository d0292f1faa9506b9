use chrono::{DateTime, Utc};
use emporium_store::{CollectionOptions, UniqueIndex};
use serde::{Deserialize, Serialize};

use super::{Entity, Stored};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

/// A user account. `email` is stored lowercased and unique per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name:          String,
    pub email:         String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role:          Role,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const NAME: &'static str = "User";

    fn collection_options() -> CollectionOptions { CollectionOptions::default().unique(UniqueIndex::single("email")) }
}

/// The public view of a user, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id:         String,
    pub name:       String,
    pub email:      String,
    pub role:       Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Stored<User>> for UserProfile {
    fn from(user: &Stored<User>) -> Self {
        Self {
            id:         user.id.clone(),
            name:       user.data.name.clone(),
            email:      user.data.email.clone(),
            role:       user.data.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
