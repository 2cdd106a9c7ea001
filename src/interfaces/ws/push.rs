//! Push-channel WebSocket endpoints
//!
//! Admission happens before the upgrade so a bad or missing `?token=` is
//! answered with a plain HTTP status. Once upgraded, the socket only forwards
//! what the hub sends; inbound frames other than ping/close are ignored.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, info, warn};

use crate::application::{AdmissionError, Channel, Connection, SharedFanoutHub, Subscription};
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::middleware::identity_rejection;
use crate::interfaces::http::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// `GET /ws/owner/telemetry?token=`
pub async fn ws_owner_telemetry(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Response {
    upgrade(ws, state, query, Channel::OwnerTelemetry).await
}

/// `GET /ws/admin/alerts?token=`
pub async fn ws_admin_alerts(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Response {
    upgrade(ws, state, query, Channel::AdminAlerts).await
}

pub(crate) fn admission_rejection(e: AdmissionError) -> ApiError {
    match e {
        AdmissionError::Identity(e) => identity_rejection(e),
        AdmissionError::Forbidden { .. } => ApiError::forbidden(e.to_string()),
        AdmissionError::NotConnecting(_) => ApiError::new(StatusCode::CONFLICT, e.to_string()),
    }
}

async fn upgrade(ws: WebSocketUpgrade, state: AppState, query: TokenQuery, channel: Channel) -> Response {
    let mut conn = Connection::new(channel);
    let subscription = match conn
        .open(&state.hub, state.identities.as_ref(), query.token.as_deref())
        .await
    {
        Ok(sub) => sub,
        Err(e) => return admission_rejection(e).into_response(),
    };

    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| forward(socket, conn, subscription, hub))
}

async fn forward(socket: WebSocket, mut conn: Connection, mut subscription: Subscription, hub: SharedFanoutHub) {
    let (mut sink, mut stream) = socket.split();
    let user_id = conn.identity().map(|i| i.user_id);

    loop {
        select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(?user_id, error = %e, "Push socket error");
                    break;
                }
            },
            outbound = subscription.receiver.recv() => match outbound {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        debug!(?user_id, error = %e, "Push send failed");
                        break;
                    }
                }
                // hub closed, or this session was dropped for falling behind
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    conn.close(&hub);
    info!(?user_id, connected_at = %conn.connected_at, "Push channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IdentityError, UserRole};

    #[test]
    fn admission_failures_map_to_http_statuses() {
        assert_eq!(
            admission_rejection(AdmissionError::Identity(IdentityError::Missing)).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            admission_rejection(AdmissionError::Forbidden {
                channel: "admin_alerts",
                actual: UserRole::Driver,
            })
            .status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            admission_rejection(AdmissionError::Identity(IdentityError::Disabled)).status,
            StatusCode::FORBIDDEN
        );
    }
}
