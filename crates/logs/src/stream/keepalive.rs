//! Keep-alive — periodic text frame so idle proxies keep the socket open.

use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use super::session::{SessionState, SessionStateCell, SharedSink};
use crate::metrics::StreamMetrics;

pub const KEEP_ALIVE_PAYLOAD: &str = "keep alive";
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(25_000);

/// Tick every `period`, starting one full period after open, until the
/// session closes or is cancelled. Send failures are swallowed; a send
/// blocked on a peer that stopped reading is abandoned on cancellation.
pub(crate) async fn run_keep_alive<S>(
    sink: SharedSink<S>,
    state: Arc<SessionStateCell>,
    metrics: Arc<StreamMetrics>,
    period: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match state.get() {
                    SessionState::Open => {
                        let send = async {
                            sink.lock()
                                .await
                                .send(Message::Text(KEEP_ALIVE_PAYLOAD.to_string()))
                                .await
                        };
                        tokio::select! {
                            sent = send => {
                                if let Err(e) = &sent {
                                    debug!("Keep-alive send failed: {}", e);
                                }
                                metrics.record_keep_alive(sent.is_ok());
                            }
                            _ = cancel_rx.changed() => {
                                debug!("Keep-alive send abandoned on cancellation");
                                break;
                            }
                        }
                    }
                    SessionState::Connecting => trace!("Keep-alive tick before open, skipping"),
                    SessionState::Closed => break,
                }
            }
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
            }
        }
    }

    trace!("Keep-alive timer stopped");
}
