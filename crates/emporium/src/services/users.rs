use emporium_crypto::PasswordParams;
use emporium_store::{Filter, StoreError};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, trace};

use super::{normalize_email, required_text};
use crate::{
    events::DomainEvent,
    models::{Role, Stored, User},
    pagination::{Page, PageRequest},
    repository::{eq, newest_first},
    tenancy::TenantContext,
    ApiError,
    ApiResult,
};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;
const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub name:     String,
    pub email:    String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub name:     Option<String>,
    pub email:    Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateUser {
    pub name:  Option<String>,
    pub email: Option<String>,
    pub role:  Option<Role>,
}

/// Filters of the admin user listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role:   Option<Role>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

fn check_password(password: &str) -> ApiResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Hashes on the blocking pool; Argon2 is deliberately slow.
async fn hash_password(password: &str, params: PasswordParams) -> ApiResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || emporium_crypto::hash_password(&password, &params))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn verify_password(password: &str, phc: &str) -> ApiResult<bool> {
    let password = password.to_owned();
    let phc = phc.to_owned();
    tokio::task::spawn_blocking(move || emporium_crypto::verify_password(&password, &phc))
        .await
        .map_err(|e| ApiError::internal(format!("password verification task failed: {e}")))?
        .map_err(ApiError::from)
}

fn user_lock(user_id: &str) -> String { format!("user:{user_id}") }

fn email_taken(result: ApiResult<Stored<User>>) -> ApiResult<Stored<User>> {
    result.map_err(|e| {
        if matches!(
            e,
            ApiError::Store {
                source: StoreError::UniqueViolation { .. },
            }
        ) {
            ApiError::conflict("Email already registered")
        }
        else {
            e
        }
    })
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    /// Creates a customer account.
    ///
    /// # Errors
    ///
    /// * `Validation` for an empty name, a malformed email or a short password
    /// * `Conflict` if the email is already registered in this tenant
    pub async fn register_user(&self, input: RegisterUser) -> ApiResult<Stored<User>> {
        trace!("Registering user in tenant {}", self.slug);
        let user = self
            .create_user(&input.name, &input.email, &input.password, Role::Customer)
            .await?;
        self.bus.publish(DomainEvent::UserRegistered {
            user_id: user.id.clone(),
            email:   user.data.email.clone(),
        });
        info!("User {} registered in tenant {}", user.id, self.slug);
        Ok(user)
    }

    /// Creates an admin, or promotes the account holding `email` and resets
    /// its name and password.
    pub async fn create_admin(&self, name: &str, email: &str, password: &str) -> ApiResult<Stored<User>> {
        let normalized = normalize_email(email)?;
        match self.users.find_one(&[eq("email", &normalized)]).await? {
            Some(existing) => {
                let name = required_text("name", name, MAX_NAME_LEN)?;
                check_password(password)?;
                let password_hash = hash_password(password, self.config.password_params).await?;
                let _guard = self.locks.lock(&user_lock(&existing.id)).await;
                let promoted = self
                    .users
                    .patch(
                        &existing.id,
                        json!({ "name": name, "password_hash": password_hash, "role": Role::Admin }),
                    )
                    .await?;
                info!("User {} promoted to admin in tenant {}", promoted.id, self.slug);
                Ok(promoted)
            },
            None => self.create_user(name, email, password, Role::Admin).await,
        }
    }

    async fn create_user(&self, name: &str, email: &str, password: &str, role: Role) -> ApiResult<Stored<User>> {
        let name = required_text("name", name, MAX_NAME_LEN)?;
        let email = normalize_email(email)?;
        check_password(password)?;
        let password_hash = hash_password(password, self.config.password_params).await?;
        email_taken(
            self.users
                .insert(User {
                    name,
                    email,
                    password_hash,
                    role,
                })
                .await,
        )
    }

    /// Checks credentials. Unknown emails and wrong passwords fail alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<Stored<User>> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_one(&[eq("email", &email)]).await?
        else {
            debug!("Login for unknown email in tenant {}", self.slug);
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        };
        if !verify_password(password, &user.data.password_hash).await? {
            debug!("Wrong password for user {}", user.id);
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
        Ok(user)
    }

    pub async fn user(&self, id: &str) -> ApiResult<Stored<User>> { self.users.require(id).await }

    /// Updates the caller's own name, email or password. Only the given
    /// fields are written, so a concurrent role change is kept.
    pub async fn update_profile(&self, user_id: &str, input: UpdateProfile) -> ApiResult<Stored<User>> {
        let mut changes = Map::new();
        if let Some(ref name) = input.name {
            changes.insert("name".to_owned(), json!(required_text("name", name, MAX_NAME_LEN)?));
        }
        if let Some(ref email) = input.email {
            changes.insert("email".to_owned(), json!(normalize_email(email)?));
        }
        if let Some(ref password) = input.password {
            check_password(password)?;
            let password_hash = hash_password(password, self.config.password_params).await?;
            changes.insert("password_hash".to_owned(), json!(password_hash));
        }
        self.patch_user(user_id, changes).await
    }

    /// Lists users, newest first.
    pub async fn list_users(&self, filter: UserFilter, page: PageRequest) -> ApiResult<Page<Stored<User>>> {
        let mut filters = Vec::new();
        if let Some(role) = filter.role {
            filters.push(eq("role", role.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filters.push(Filter::Or(vec![
                Filter::ContainsInsensitive("name".to_owned(), search.to_owned()),
                Filter::ContainsInsensitive("email".to_owned(), search.to_owned()),
            ]));
        }
        self.users.page(filters, newest_first(), page).await
    }

    /// Changes another user's name, email or role.
    pub async fn admin_update_user(&self, id: &str, input: AdminUpdateUser) -> ApiResult<Stored<User>> {
        let mut changes = Map::new();
        if let Some(ref name) = input.name {
            changes.insert("name".to_owned(), json!(required_text("name", name, MAX_NAME_LEN)?));
        }
        if let Some(ref email) = input.email {
            changes.insert("email".to_owned(), json!(normalize_email(email)?));
        }
        if let Some(role) = input.role {
            changes.insert("role".to_owned(), json!(role));
        }
        self.patch_user(id, changes).await
    }

    /// Writes `changes` under the user's lock.
    async fn patch_user(&self, id: &str, changes: Map<String, Value>) -> ApiResult<Stored<User>> {
        let _guard = self.locks.lock(&user_lock(id)).await;
        self.users.require(id).await?;
        let updated = email_taken(self.users.patch(id, Value::Object(changes)).await)?;
        debug!("User {} updated in tenant {}", id, self.slug);
        Ok(updated)
    }

    /// Deletes a user and their addresses. Admins cannot delete themselves.
    pub async fn delete_user(&self, actor_id: &str, id: &str) -> ApiResult<()> {
        if actor_id == id {
            return Err(ApiError::validation("You cannot delete your own account"));
        }
        self.users.require(id).await?;
        let removed_addresses = self.delete_addresses_of(id).await?;
        self.users.delete(id).await?;
        info!(
            "User {} deleted with {} addresses in tenant {}",
            id, removed_addresses, self.slug
        );
        Ok(())
    }
}
