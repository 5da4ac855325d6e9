//! Session — one live log stream over an established WebSocket.
//!
//! A session runs two tasks: the dispatch task, which reads frames in arrival
//! order and is the only caller of the listener, and the keep-alive task.
//! Both share the write half of the socket behind an async mutex. `cancel()`
//! only flips atomic state and signals a watch channel; the dispatch task
//! does the actual close, bounded by [`CLOSE_TIMEOUT`] so a peer that has
//! stopped reading cannot hold back the terminal signal.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio::time;
use tracing::{debug, info};

use super::dispatch::{Dispatcher, Flow};
use super::keepalive::run_keep_alive;
use super::listener::LogListener;
use crate::metrics::StreamMetrics;

/// Upper bound on flushing the close frame once the dispatch loop exits.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) type SharedSink<S> = Arc<tokio::sync::Mutex<SplitSink<WebSocketStream<S>, Message>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closed = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Connecting,
            1 => SessionState::Open,
            _ => SessionState::Closed,
        }
    }
}

/// Lock-free holder for the session state machine.
#[derive(Debug)]
pub(crate) struct SessionStateCell(AtomicU8);

impl SessionStateCell {
    pub(crate) fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Connecting -> Open. A session cancelled before it opened stays Closed.
    fn open(&self) -> bool {
        self.0
            .compare_exchange(
                SessionState::Connecting as u8,
                SessionState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Transition to Closed; returns the previous state.
    fn close(&self) -> SessionState {
        SessionState::from_u8(self.0.swap(SessionState::Closed as u8, Ordering::AcqRel))
    }
}

/// Handle to a running log stream.
///
/// Dropping the handle cancels the stream.
pub struct StreamingSession {
    state: Arc<SessionStateCell>,
    cancel_tx: Arc<watch::Sender<bool>>,
    metrics: Arc<StreamMetrics>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl StreamingSession {
    /// Bind `listener` to an open WebSocket and start the dispatch and
    /// keep-alive tasks. Must be called inside a tokio runtime.
    pub fn start<S, L>(ws: WebSocketStream<S>, listener: L, keep_alive_period: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        L: LogListener,
    {
        let (sink, stream) = ws.split();
        let sink: SharedSink<S> = Arc::new(tokio::sync::Mutex::new(sink));
        let state = Arc::new(SessionStateCell::new(SessionState::Connecting));
        let metrics = Arc::new(StreamMetrics::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);

        let dispatcher = Dispatcher::new(listener, Arc::clone(&metrics));
        let dispatch = tokio::spawn(run_dispatch(
            stream,
            Arc::clone(&sink),
            dispatcher,
            Arc::clone(&state),
            Arc::clone(&cancel_tx),
            cancel_rx.clone(),
        ));

        tokio::spawn(run_keep_alive(
            sink,
            Arc::clone(&state),
            Arc::clone(&metrics),
            keep_alive_period,
            cancel_rx,
        ));

        if state.open() {
            info!("Log stream open (keep-alive every {:?})", keep_alive_period);
        }

        Self {
            state,
            cancel_tx,
            metrics,
            dispatch: Mutex::new(Some(dispatch)),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }

    pub fn keep_alive_ticks(&self) -> u64 {
        self.metrics.keep_alive_ticks()
    }

    /// Stop the stream. Safe to call from any thread, any number of times;
    /// never blocks and never fails.
    pub fn cancel(&self) {
        if self.state.close() != SessionState::Closed {
            debug!("Cancelling log stream");
        }
        self.cancel_tx.send_replace(true);
    }

    /// Wait until the dispatch task has delivered its terminal signal.
    pub async fn closed(&self) {
        let handle = self.dispatch.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                debug!("Dispatch task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_dispatch<S, L>(
    mut stream: SplitStream<WebSocketStream<S>>,
    sink: SharedSink<S>,
    mut dispatcher: Dispatcher<L>,
    state: Arc<SessionStateCell>,
    cancel_tx: Arc<watch::Sender<bool>>,
    mut cancel_rx: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    L: LogListener,
{
    loop {
        tokio::select! {
            biased;
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    debug!("Dispatch loop observed cancellation");
                    break;
                }
            }
            next = stream.next() => match next {
                Some(Ok(message)) => {
                    if dispatcher.handle(message) == Flow::Stop {
                        break;
                    }
                }
                Some(Err(e)) => {
                    dispatcher.transport_error(e);
                    break;
                }
                None => {
                    dispatcher.stream_ended();
                    break;
                }
            }
        }
    }

    state.close();
    cancel_tx.send_replace(true);

    let close = async { sink.lock().await.close().await };
    match time::timeout(CLOSE_TIMEOUT, close).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Ignoring error while closing log stream: {}", e),
        Err(_) => debug!("Peer did not accept close frame within {:?}, abandoning", CLOSE_TIMEOUT),
    }

    // Cancellation is observed as a normal closure.
    dispatcher.complete();
    info!("Log stream closed");
}
