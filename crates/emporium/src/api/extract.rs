//! Request extractors resolving the tenant, the caller and request bodies.
//!
//! Every rejection is an [`ApiError`], so clients always receive the JSON
//! error shape.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest,
        FromRequestParts,
        Query,
        Request,
    },
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::AppState;
use crate::{
    auth::Claims,
    models::{Role, Stored, User},
    tenancy::{TenantContext, DEFAULT_TENANT},
    ApiError,
};

/// Header selecting the tenant of a request.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The tenant named by the `X-Tenant-Id` header, `default` when absent.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Arc<TenantContext>);

impl FromRequestParts<AppState> for CurrentTenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let slug = match parts.headers.get(TENANT_HEADER) {
            Some(value) => {
                value
                    .to_str()
                    .map_err(|_| ApiError::validation("X-Tenant-Id must be ASCII"))?
                    .trim()
            },
            None => DEFAULT_TENANT,
        };
        let slug = if slug.is_empty() { DEFAULT_TENANT } else { slug };
        Ok(Self(state.tenants.tenant(slug).await?))
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Reads the bearer token, falling back to the `access_token` query parameter
/// for clients such as `EventSource` that cannot set headers.
fn bearer_token(parts: &Parts) -> Result<String, ApiError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Not authorized, malformed token"))?;
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, malformed token"));
    }
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.access_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))
}

/// An authenticated user of the request's tenant.
///
/// The token must have been issued for the same tenant and its subject must
/// still exist. Authorization uses the stored role, not the one in the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub tenant: Arc<TenantContext>,
    pub user:   Stored<User>,
    pub claims: Claims,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool { self.user.data.role == Role::Admin }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(&token)?;
        let CurrentTenant(tenant) = CurrentTenant::from_request_parts(parts, state).await?;
        if claims.tenant != tenant.slug {
            debug!("Token for tenant {} used on tenant {}", claims.tenant, tenant.slug);
            return Err(ApiError::unauthorized("Token was issued for another tenant"));
        }
        let user = tenant
            .users
            .get(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
        Ok(Self {
            tenant,
            user,
            claims,
        })
    }
}

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        if auth.is_admin() {
            Ok(Self(auth))
        }
        else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

/// `Json<T>` answering malformed bodies with a JSON `400`, or `415` when the
/// content type is not JSON.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    Err(ApiError::UnsupportedMediaType {
                        message: "expected a JSON request body".to_owned(),
                    })
                }
                else {
                    Err(ApiError::validation(rejection.body_text()))
                }
            },
        }
    }
}

/// `Query<T>` answering malformed query strings with a JSON `400`.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| ApiError::validation(rejection.body_text()))
    }
}
