use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::{debug, warn};

use super::extract::AuthUser;
use crate::events::EventEnvelope;

fn to_sse(envelope: &EventEnvelope) -> Option<Event> {
    Event::default()
        .event(envelope.event.event_type())
        .id(envelope.id.clone())
        .json_data(envelope)
        .map_err(|e| warn!("Failed to encode event {}: {}", envelope.id, e))
        .ok()
}

/// Server-sent events of the caller's tenant. Admins see every event,
/// customers only the ones concerning them.
pub async fn notifications(auth: AuthUser) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let admin = auth.is_admin();
    let user_id = auth.user.id.clone();
    debug!("Notification stream opened for user {} in tenant {}", user_id, auth.tenant.slug);

    let stream = BroadcastStream::new(auth.tenant.bus.subscribe()).filter_map(move |item| {
        match item {
            Ok(envelope) if admin || envelope.event.concerns_user(&user_id) => to_sse(&envelope).map(Ok::<_, Infallible>),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Notification stream of user {} skipped {} events", user_id, skipped);
                None
            },
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
