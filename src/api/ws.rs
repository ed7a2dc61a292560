// =============================================================================
// WebSocket Handler — Push-based page updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate StateSnapshot on connect.
//   2. A fresh snapshot whenever the state version has changed, checked
//      every 500 ms.
//
// Snapshots carry every container's current markup, so a client only has to
// replace each container's innerHTML.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::app_state::AppState;

const PUSH_INTERVAL: Duration = Duration::from_millis(500);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

// =============================================================================
// Connection handler
// =============================================================================

/// Push loop and receive loop for one connection, joined by `select!`.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut sequence: u64 = 0;
    if let Err(e) = send_snapshot(&mut sender, &state, &mut sequence).await {
        warn!(error = %e, "Failed to send initial WebSocket snapshot");
        return;
    }
    let mut last_sent_version = state.current_state_version();

    let mut push_interval = interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            // ── Push: only when the version moved ───────────────────────
            _ = push_interval.tick() => {
                let current_version = state.current_state_version();
                if current_version != last_sent_version {
                    if let Err(e) = send_snapshot(&mut sender, &state, &mut sequence).await {
                        debug!(error = %e, "WebSocket send failed — disconnecting");
                        break;
                    }
                    last_sent_version = current_version;
                }
            }

            // ── Receive: pings and close ────────────────────────────────
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "Failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(messages = sequence, "WebSocket connection closed");
}

// =============================================================================
// Helpers
// =============================================================================

/// JSON text of the current snapshot.
pub fn snapshot_message(state: &AppState) -> Option<String> {
    match serde_json::to_string(&state.snapshot()) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize snapshot");
            None
        }
    }
}

async fn send_snapshot<S>(
    sender: &mut S,
    state: &Arc<AppState>,
    sequence: &mut u64,
) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    // Serialisation errors are not network errors; keep the connection.
    let Some(json) = snapshot_message(state) else {
        return Ok(());
    };
    sender.send(Message::Text(json)).await?;
    *sequence += 1;
    debug!(seq = *sequence, "WebSocket snapshot sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::page::ContainerContent;
    use crate::runtime_config::DashboardConfig;
    use crate::types::ContainerId;

    #[test]
    fn snapshot_message_lists_every_container() {
        let state = AppState::new(DashboardConfig::default());
        state
            .page
            .replace(ContainerId::KlineChartContainer, ContainerContent::Svg("<svg></svg>".into()))
            .unwrap();
        state.increment_version();

        let json: serde_json::Value = serde_json::from_str(&snapshot_message(&state).unwrap()).unwrap();
        assert_eq!(json["version"], 2);
        assert_eq!(json["containers"].as_object().unwrap().len(), 5);
        assert_eq!(json["containers"]["kline-chart-container"], "<svg></svg>");
        assert_eq!(json["containers"]["orderbook-container"], "");
    }
}
