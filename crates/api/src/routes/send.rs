//! Notification delivery route.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use tracing::Instrument;
use uuid::Uuid;

use gcm_common::error::AppError;
use gcm_common::types::DeliverySummary;
use gcm_notifier::DeliveryRequest;
use gcm_notifier::request::InboundRequest;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/send", post(send_notification))
}

/// POST /api/send — Deliver one notification to a batch of registration ids.
///
/// Responds with the per-token summary once every token is final or the retry
/// ceiling is hit. If the client disconnects the handler future is dropped and
/// the delivery is abandoned.
async fn send_notification(
    State(state): State<AppState>,
    body: Result<Json<InboundRequest>, JsonRejection>,
) -> Result<Json<DeliverySummary>, AppError> {
    let Json(inbound) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("send", request_id = %request_id);

    async move {
        let request = DeliveryRequest::from_inbound(inbound, &state.limits)?;

        tracing::debug!(
            tokens = request.tokens.len(),
            time_to_live = ?request.time_to_live,
            "Ready to push notification"
        );

        let summary = match state.request_timeout {
            Some(timeout) => {
                state
                    .dispatcher
                    .dispatch_until(&request, tokio::time::sleep(timeout))
                    .await?
            }
            None => state.dispatcher.dispatch(&request).await?,
        };

        Ok::<_, AppError>(Json(summary))
    }
    .instrument(span)
    .await
}
