use axum::Json;
use serde::Deserialize;

use super::extract::{AdminUser, ValidQuery};
use crate::{
    events::EventEnvelope,
    pagination::{Page, PageParams},
    ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

pub async fn list_events(
    AdminUser(admin): AdminUser,
    ValidQuery(query): ValidQuery<EventQuery>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> ApiResult<Json<Page<EventEnvelope>>> {
    let page = page.resolve(admin.tenant.config.page_limits)?;
    let event_type = query.event_type.as_deref().filter(|t| !t.is_empty());
    Ok(Json(admin.tenant.list_events(event_type, page).await?))
}
