//! WebSocket observer endpoint
//!
//! Clients connect to `GET /ws` and receive every timer event as a JSON
//! text frame. The same socket accepts command frames, so a client can
//! start, stop, reset, or query the shared timer without a separate HTTP
//! round trip. `GET_TIMER_STATE` is answered unicast on the issuing socket;
//! everything else surfaces through the shared broadcast.
//!
//! If a client falls behind, lagged events are silently skipped and the
//! client resumes from the most recent one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::timer::TimerCommand;

/// Upgrade an HTTP request to a WebSocket connection and begin streaming
/// timer events.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_timer(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the WebSocket lifecycle: forward broadcast events, take commands
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("Observer connected");

    let mut rx = state.timer.subscribe();

    loop {
        tokio::select! {
            // Fan out the next timer event to this observer.
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize timer event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json)).await.is_err() {
                            debug!("Observer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Observer lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Take a command frame, or notice the client going away.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if handle_command(&text, &mut socket, &state).await.is_err() {
                            debug!("Observer disconnected (reply failed)");
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Observer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("Observer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        return;
                    }
                    _ => {
                        // Ignore binary and pong frames.
                    }
                }
            }
        }
    }
}

/// Dispatch one command frame and send the unicast reply, when there is one.
///
/// The returned error only signals that the reply socket is gone.
async fn handle_command(
    text: &str,
    socket: &mut WebSocket,
    state: &Arc<AppState>,
) -> Result<(), axum::Error> {
    if let Some(reply) = dispatch_command(text, state).await {
        socket.send(Message::Text(reply)).await?;
    }
    Ok(())
}

/// Parse and apply one command frame, returning the unicast reply frame for
/// `GET_TIMER_STATE`.
///
/// Unparseable frames are logged and dropped; commands never produce a
/// user-visible error.
async fn dispatch_command(text: &str, state: &Arc<AppState>) -> Option<String> {
    let command: TimerCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            debug!("Ignoring unparseable command frame: {}", e);
            return None;
        }
    };

    match command {
        TimerCommand::StartTimer { duration } => {
            state.record_command("start");
            if let Err(e) = state.timer.start(duration) {
                warn!("Failed to start timer: {}", e);
            }
            None
        }
        TimerCommand::StopTimer => {
            state.record_command("stop");
            if let Err(e) = state.timer.stop() {
                warn!("Failed to stop timer: {}", e);
            }
            None
        }
        TimerCommand::ResetTimer => {
            state.record_command("reset");
            if let Err(e) = state.timer.reset() {
                warn!("Failed to reset timer: {}", e);
            }
            None
        }
        TimerCommand::GetTimerState => match state.timer.query().await {
            Ok(reply) => {
                let frame = json!({ "event": "TIMER_STATE", "data": reply });
                Some(frame.to_string())
            }
            Err(e) => {
                warn!("Failed to query timer state: {}", e);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::timer::{TimerAuthority, TimerEvent};
    use std::time::Duration;

    fn test_state() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        let timer = Arc::new(TimerAuthority::new(
            store,
            60_000,
            Duration::from_millis(1_000),
        ));
        Arc::new(AppState::new(timer, 0, "127.0.0.1".to_string()))
    }

    #[tokio::test]
    async fn start_frame_starts_the_timer() {
        let state = test_state();

        let reply =
            dispatch_command(r#"{"command":"START_TIMER","duration":5000}"#, &state).await;
        assert_eq!(reply, None);

        let queried = state.timer.query().await.unwrap();
        assert!(queried.is_active);
        assert!(queried.time_left > 0 && queried.time_left <= 5_000);
        assert_eq!(state.get_last_command().0, Some("start".to_string()));
    }

    #[tokio::test]
    async fn get_timer_state_frame_is_answered_unicast() {
        let state = test_state();
        let mut rx = state.timer.subscribe();
        state.timer.start(Some(5_000)).unwrap();
        rx.try_recv().unwrap(); // TIMER_STARTED

        let reply = dispatch_command(r#"{"command":"GET_TIMER_STATE"}"#, &state)
            .await
            .unwrap();
        let frame: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(frame["event"], "TIMER_STATE");
        assert_eq!(frame["data"]["isActive"], true);
        assert!(frame["data"]["timeLeft"].as_i64().unwrap() > 0);

        // the reply went to the issuing socket only, nothing was broadcast
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_and_reset_frames_apply_their_commands() {
        let state = test_state();
        state.timer.start(Some(60_000)).unwrap();
        let mut rx = state.timer.subscribe();

        assert_eq!(dispatch_command(r#"{"command":"STOP_TIMER"}"#, &state).await, None);
        assert_eq!(rx.try_recv().unwrap(), TimerEvent::TimerStopped);

        assert_eq!(dispatch_command(r#"{"command":"RESET_TIMER"}"#, &state).await, None);
        assert_eq!(rx.try_recv().unwrap(), TimerEvent::TimerReset);

        let queried = state.timer.query().await.unwrap();
        assert!(!queried.is_active);
    }

    #[tokio::test]
    async fn unparseable_frames_are_dropped_without_side_effects() {
        let state = test_state();
        let mut rx = state.timer.subscribe();

        assert_eq!(dispatch_command("not json at all", &state).await, None);
        assert_eq!(
            dispatch_command(r#"{"command":"EXPLODE_TIMER"}"#, &state).await,
            None
        );

        assert!(rx.try_recv().is_err());
        let queried = state.timer.query().await.unwrap();
        assert!(!queried.is_active);
        assert_eq!(state.get_last_command().0, None);
    }
}
