use emporium_store::{Filter, SortOrder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

use super::{optional_text, required_text};
use crate::{
    models::{Address, Stored},
    repository::{eq, UPDATED_AT},
    tenancy::TenantContext,
    ApiError,
    ApiResult,
};

/// Most addresses a user may keep.
pub const MAX_ADDRESSES_PER_USER: usize = 10;
const MAX_FIELD_LEN: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub full_name:   String,
    pub line1:       String,
    pub line2:       Option<String>,
    pub city:        String,
    pub state:       Option<String>,
    pub postal_code: String,
    pub country:     String,
    pub phone:       Option<String>,
    #[serde(default)]
    pub is_default:  bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub full_name:   Option<String>,
    pub line1:       Option<String>,
    pub line2:       Option<String>,
    pub city:        Option<String>,
    pub state:       Option<String>,
    pub postal_code: Option<String>,
    pub country:     Option<String>,
    pub phone:       Option<String>,
    /// Only `true` has an effect; the default moves by marking another address.
    pub is_default:  Option<bool>,
}

fn user_lock(user_id: &str) -> String { format!("addresses:{user_id}") }

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    /// The user's addresses, default first, then most recently updated.
    pub async fn list_addresses(&self, user_id: &str) -> ApiResult<Vec<Stored<Address>>> {
        self.addresses
            .find(
                vec![eq("user_id", user_id)],
                vec![
                    ("is_default".to_owned(), SortOrder::Descending),
                    (UPDATED_AT.to_owned(), SortOrder::Descending),
                ],
            )
            .await
    }

    /// One of the user's addresses. Other users' addresses are reported as
    /// missing.
    pub async fn address(&self, user_id: &str, id: &str) -> ApiResult<Stored<Address>> {
        match self.addresses.get(id).await? {
            Some(address) if address.data.user_id == user_id => Ok(address),
            Some(_) | None => Err(ApiError::not_found("Address", id)),
        }
    }

    /// Saves a new address. The first address of a user becomes the default.
    pub async fn create_address(&self, user_id: &str, input: NewAddress) -> ApiResult<Stored<Address>> {
        trace!("Adding address for user {}", user_id);
        let mut address = Address {
            user_id:     user_id.to_owned(),
            full_name:   required_text("full_name", &input.full_name, MAX_FIELD_LEN)?,
            line1:       required_text("line1", &input.line1, MAX_FIELD_LEN)?,
            line2:       optional_text("line2", input.line2.as_deref(), MAX_FIELD_LEN)?,
            city:        required_text("city", &input.city, MAX_FIELD_LEN)?,
            state:       optional_text("state", input.state.as_deref(), MAX_FIELD_LEN)?,
            postal_code: required_text("postal_code", &input.postal_code, 20)?,
            country:     required_text("country", &input.country, MAX_FIELD_LEN)?,
            phone:       optional_text("phone", input.phone.as_deref(), 30)?,
            is_default:  input.is_default,
        };

        let _guard = self.locks.lock(&user_lock(user_id)).await;
        let existing = self.addresses.count(&[eq("user_id", user_id)]).await?;
        if existing >= MAX_ADDRESSES_PER_USER {
            return Err(ApiError::validation(format!(
                "You can save at most {MAX_ADDRESSES_PER_USER} addresses"
            )));
        }
        if existing == 0 {
            address.is_default = true;
        }
        let created = self.addresses.insert(address).await?;
        if created.data.is_default {
            self.clear_other_defaults(user_id, &created.id).await?;
        }
        Ok(created)
    }

    pub async fn update_address(&self, user_id: &str, id: &str, patch: AddressPatch) -> ApiResult<Stored<Address>> {
        let _guard = self.locks.lock(&user_lock(user_id)).await;
        let mut address = self.address(user_id, id).await?.data;
        if let Some(ref full_name) = patch.full_name {
            address.full_name = required_text("full_name", full_name, MAX_FIELD_LEN)?;
        }
        if let Some(ref line1) = patch.line1 {
            address.line1 = required_text("line1", line1, MAX_FIELD_LEN)?;
        }
        if let Some(ref line2) = patch.line2 {
            address.line2 = optional_text("line2", Some(line2), MAX_FIELD_LEN)?;
        }
        if let Some(ref city) = patch.city {
            address.city = required_text("city", city, MAX_FIELD_LEN)?;
        }
        if let Some(ref state) = patch.state {
            address.state = optional_text("state", Some(state), MAX_FIELD_LEN)?;
        }
        if let Some(ref postal_code) = patch.postal_code {
            address.postal_code = required_text("postal_code", postal_code, 20)?;
        }
        if let Some(ref country) = patch.country {
            address.country = required_text("country", country, MAX_FIELD_LEN)?;
        }
        if let Some(ref phone) = patch.phone {
            address.phone = optional_text("phone", Some(phone), 30)?;
        }
        let make_default = patch.is_default == Some(true) && !address.is_default;
        if make_default {
            address.is_default = true;
        }

        let updated = self.addresses.save(id, &address).await?;
        if make_default {
            self.clear_other_defaults(user_id, id).await?;
        }
        Ok(updated)
    }

    /// Makes the address the user's default.
    pub async fn set_default_address(&self, user_id: &str, id: &str) -> ApiResult<Stored<Address>> {
        self.update_address(
            user_id,
            id,
            AddressPatch {
                is_default: Some(true),
                ..AddressPatch::default()
            },
        )
        .await
    }

    /// Deletes an address. Deleting the default promotes the most recently
    /// updated remaining address.
    pub async fn delete_address(&self, user_id: &str, id: &str) -> ApiResult<()> {
        let _guard = self.locks.lock(&user_lock(user_id)).await;
        let address = self.address(user_id, id).await?;
        self.addresses.delete(id).await?;

        if address.data.is_default {
            let next = self
                .addresses
                .find(
                    vec![eq("user_id", user_id)],
                    vec![(UPDATED_AT.to_owned(), SortOrder::Descending)],
                )
                .await?
                .into_iter()
                .next();
            if let Some(next) = next {
                debug!("Address {} promoted to default for user {}", next.id, user_id);
                self.addresses
                    .patch(&next.id, json!({ "is_default": true }))
                    .await?;
            }
        }
        Ok(())
    }

    /// Removes every address of a user, returning how many were deleted.
    pub async fn delete_addresses_of(&self, user_id: &str) -> ApiResult<usize> {
        let _guard = self.locks.lock(&user_lock(user_id)).await;
        let addresses = self
            .addresses
            .find(vec![eq("user_id", user_id)], vec![])
            .await?;
        for address in &addresses {
            self.addresses.delete(&address.id).await?;
        }
        Ok(addresses.len())
    }

    async fn clear_other_defaults(&self, user_id: &str, keep: &str) -> ApiResult<()> {
        let defaults = self
            .addresses
            .find(
                vec![
                    eq("user_id", user_id),
                    Filter::Equals("is_default".to_owned(), json!(true)),
                ],
                vec![],
            )
            .await?;
        for other in defaults.iter().filter(|a| a.id != keep) {
            self.addresses
                .patch(&other.id, json!({ "is_default": false }))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{address_input, customer, tenant};

    async fn defaults(ctx: &TenantContext, user_id: &str) -> Vec<String> {
        ctx.list_addresses(user_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.data.is_default)
            .map(|a| a.data.line1)
            .collect()
    }

    #[tokio::test]
    async fn test_first_address_is_default_and_default_moves() {
        let (ctx, _temp_dir) = tenant().await;
        let user = customer(&ctx, "a@example.com").await;

        let home = ctx.create_address(&user.id, address_input("Home")).await.unwrap();
        assert!(home.data.is_default);
        let work = ctx.create_address(&user.id, address_input("Work")).await.unwrap();
        assert!(!work.data.is_default);
        assert_eq!(defaults(&ctx, &user.id).await, vec!["Home"]);

        ctx.set_default_address(&user.id, &work.id).await.unwrap();
        assert_eq!(defaults(&ctx, &user.id).await, vec!["Work"]);

        let mut cabin = address_input("Cabin");
        cabin.is_default = true;
        ctx.create_address(&user.id, cabin).await.unwrap();
        assert_eq!(defaults(&ctx, &user.id).await, vec!["Cabin"]);

        let listed = ctx.list_addresses(&user.id).await.unwrap();
        assert_eq!(listed[0].data.line1, "Cabin");
    }

    #[tokio::test]
    async fn test_deleting_default_promotes_most_recent() {
        let (ctx, _temp_dir) = tenant().await;
        let user = customer(&ctx, "a@example.com").await;
        let home = ctx.create_address(&user.id, address_input("Home")).await.unwrap();
        let work = ctx.create_address(&user.id, address_input("Work")).await.unwrap();
        ctx.create_address(&user.id, address_input("Gym")).await.unwrap();
        ctx.update_address(
            &user.id,
            &work.id,
            AddressPatch {
                city: Some("Bergen".to_owned()),
                ..AddressPatch::default()
            },
        )
        .await
        .unwrap();

        ctx.delete_address(&user.id, &home.id).await.unwrap();
        assert_eq!(defaults(&ctx, &user.id).await, vec!["Work"]);
    }

    #[tokio::test]
    async fn test_ownership_and_limit() {
        let (ctx, _temp_dir) = tenant().await;
        let owner = customer(&ctx, "owner@example.com").await;
        let other = customer(&ctx, "other@example.com").await;
        let home = ctx.create_address(&owner.id, address_input("Home")).await.unwrap();

        assert!(matches!(
            ctx.address(&other.id, &home.id).await,
            Err(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            ctx.delete_address(&other.id, &home.id).await,
            Err(ApiError::NotFound { .. })
        ));

        for i in 1..MAX_ADDRESSES_PER_USER {
            ctx.create_address(&owner.id, address_input(&format!("Line {i}")))
                .await
                .unwrap();
        }
        assert!(matches!(
            ctx.create_address(&owner.id, address_input("One too many")).await,
            Err(ApiError::Validation { .. })
        ));

        assert_eq!(ctx.delete_addresses_of(&owner.id).await.unwrap(), MAX_ADDRESSES_PER_USER);
        assert!(ctx.list_addresses(&owner.id).await.unwrap().is_empty());
    }
}
