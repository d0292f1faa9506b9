use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    extract::{AdminUser, AuthUser, CurrentTenant, ValidJson, ValidQuery},
    AppState,
};
use crate::{
    models::{Stored, User, UserProfile},
    pagination::{Page, PageParams},
    services::users::{AdminUpdateUser, RegisterUser, UpdateProfile, UserFilter},
    ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email:    String,
    pub password: String,
}

/// Answer of register and login.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user:  UserProfile,
}

fn session(state: &AppState, tenant: &str, user: &Stored<User>) -> ApiResult<Session> {
    Ok(Session {
        token: state.tokens.issue(&user.id, tenant, user.data.role)?,
        user:  UserProfile::from(user),
    })
}

pub async fn register(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    ValidJson(input): ValidJson<RegisterUser>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let user = tenant.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(session(&state, &tenant.slug, &user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    ValidJson(credentials): ValidJson<Credentials>,
) -> ApiResult<Json<Session>> {
    let user = tenant
        .authenticate(&credentials.email, &credentials.password)
        .await?;
    debug!("User {} logged in to tenant {}", user.id, tenant.slug);
    Ok(Json(session(&state, &tenant.slug, &user)?))
}

pub async fn me(auth: AuthUser) -> Json<UserProfile> { Json(UserProfile::from(&auth.user)) }

pub async fn update_me(auth: AuthUser, ValidJson(input): ValidJson<UpdateProfile>) -> ApiResult<Json<UserProfile>> {
    let updated = auth.tenant.update_profile(&auth.user.id, input).await?;
    Ok(Json(UserProfile::from(&updated)))
}

pub async fn list_users(
    AdminUser(admin): AdminUser,
    ValidQuery(filter): ValidQuery<UserFilter>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> ApiResult<Json<Page<UserProfile>>> {
    let page = page.resolve(admin.tenant.config.page_limits)?;
    let users = admin.tenant.list_users(filter, page).await?;
    Ok(Json(users.map(|user| UserProfile::from(&user))))
}

pub async fn get_user(AdminUser(admin): AdminUser, Path(id): Path<String>) -> ApiResult<Json<UserProfile>> {
    let user = admin.tenant.user(&id).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn update_user(
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<AdminUpdateUser>,
) -> ApiResult<Json<UserProfile>> {
    let user = admin.tenant.admin_update_user(&id, input).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn delete_user(AdminUser(admin): AdminUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    admin.tenant.delete_user(&admin.user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
