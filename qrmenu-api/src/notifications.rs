use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use qrmenu_core::access::can_access_vendor;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /v1/notifications/stream
/// Order-lifecycle events for the caller's vendor scope, as SSE. Access is
/// re-evaluated per event against the order's owning vendor, so a staff
/// client only ever sees its own vendor's orders while admins see all.
pub async fn notification_stream(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |event| {
        let user = user.clone();
        async move {
            // Lagged receivers drop events rather than erroring the stream.
            let event = event.ok()?;
            if !can_access_vendor(Some(&user), event.vendor_id) {
                return None;
            }
            let sse = Event::default().event("new_order").json_data(&event.notification).ok()?;
            Some(Ok(sse))
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
