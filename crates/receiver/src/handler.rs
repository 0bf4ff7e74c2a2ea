//! Webhook Route

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use std::sync::Arc;

use crate::receiver::NotificationReceiver;

/// Path the cluster's webhook receiver is pointed at
pub const NOTIFY_PATH: &str = "/notify";

/// Router exposing the notification endpoint
pub fn router(receiver: Arc<NotificationReceiver>) -> Router {
    Router::new()
        .route(NOTIFY_PATH, post(notify_handler))
        .with_state(receiver)
}

/// Always acknowledges, whatever the body looked like
async fn notify_handler(State(receiver): State<Arc<NotificationReceiver>>, body: Bytes) -> StatusCode {
    receiver.ingest(&body);
    StatusCode::OK
}
