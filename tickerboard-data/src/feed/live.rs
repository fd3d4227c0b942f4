//! Live ticker stream client.
//!
//! Connects to the Binance all-market ticker stream, keeps the connection alive with
//! pings, reconnects after drops, and emits parsed [`TickerRecord`] batches.

use crate::{
    config::FeedConfig,
    error::DataError,
    feed::{binance::parse_live_frame, timeout::TimeoutStream},
    ticker::TickerRecord,
};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Live connection status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Whether the live loop should keep delivering batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Continue,
    Stop,
}

/// Live ticker stream client.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    config: FeedConfig,
}

/// Handle to a running live subscription.
///
/// Dropping the handle, or calling [`LiveSubscription::unsubscribe`], aborts the
/// connection task: no further batches are delivered and the socket is released.
#[derive(Debug)]
pub struct LiveSubscription {
    task: JoinHandle<()>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

/// [`LiveSubscription`] delivering batches over a bounded channel.
#[derive(Debug)]
pub struct LiveChannel {
    pub subscription: LiveSubscription,
    pub batch_rx: mpsc::Receiver<Vec<TickerRecord>>,
}

impl LiveFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    /// Subscribe to the live stream, invoking `on_batch` for every parsed batch.
    ///
    /// `on_batch` runs on the connection task. Returning [`Delivery::Stop`] ends the
    /// subscription.
    pub fn subscribe_with<F>(self, on_batch: F) -> LiveSubscription
    where
        F: FnMut(Vec<TickerRecord>) -> Delivery + Send + 'static,
    {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let task = tokio::spawn(run_live_loop(self.config, on_batch, status_tx));

        LiveSubscription { task, status_rx }
    }

    /// Subscribe to the live stream, delivering batches over a bounded channel.
    ///
    /// Batches are dropped with a warning when the receiver falls behind; the stream
    /// resends every symbol each frame so the next batch catches up.
    pub fn subscribe(self) -> LiveChannel {
        let (batch_tx, batch_rx) = mpsc::channel(self.config.channel_buffer_size);

        let subscription = self.subscribe_with(move |batch| match batch_tx.try_send(batch) {
            Ok(()) => Delivery::Continue,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("live batch receiver lagging, dropping batch");
                Delivery::Continue
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                let error = DataError::ChannelClosed("live batches".to_string());
                info!(%error, "stopping live feed");
                Delivery::Stop
            }
        });

        LiveChannel {
            subscription,
            batch_rx,
        }
    }
}

impl LiveSubscription {
    /// Receiver of [`ConnectionStatus`] updates.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the subscription and release the underlying connection.
    pub fn unsubscribe(self) {
        drop(self)
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Main live connection loop with auto-reconnect.
async fn run_live_loop<F>(
    config: FeedConfig,
    mut on_batch: F,
    status_tx: watch::Sender<ConnectionStatus>,
) where
    F: FnMut(Vec<TickerRecord>) -> Delivery + Send + 'static,
{
    info!(url = %config.ws_url, "starting live ticker feed");

    loop {
        status_tx.send_replace(ConnectionStatus::Reconnecting);

        match connect_async(config.ws_url.as_str()).await {
            Ok((ws_stream, _)) => {
                info!(url = %config.ws_url, "connected to live ticker stream");
                status_tx.send_replace(ConnectionStatus::Connected);

                let (mut write, read) = ws_stream.split();

                // Spawn ping task to keep connection alive
                let ping_interval = config.ping_interval;
                let (ping_shutdown_tx, mut ping_shutdown_rx) = mpsc::channel::<()>(1);
                let ping_task = tokio::spawn(async move {
                    let mut interval = tokio::time::interval(ping_interval);
                    interval.tick().await;
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                if write.send(Message::Ping(vec![].into())).await.is_err() {
                                    debug!("failed to send ping, connection likely dead");
                                    break;
                                }
                            }
                            _ = ping_shutdown_rx.recv() => {
                                let _ = write.close().await;
                                break;
                            }
                        }
                    }
                });

                let mut read = TimeoutStream::new(read, config.read_timeout);
                let mut delivery = Delivery::Continue;

                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Some(batch) = parse_live_frame(&text) {
                                delivery = on_batch(batch);
                                if delivery == Delivery::Stop {
                                    break;
                                }
                            }
                        }
                        Ok(Message::Close(frame)) => {
                            info!(?frame, "live ticker stream closed by server");
                            break;
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                            // Heartbeat - tungstenite handles pong replies
                        }
                        Err(error) => {
                            let error = DataError::from(error);
                            if error.is_terminal() {
                                error!(%error, "live ticker stream error");
                                break;
                            }
                            warn!(%error, "live ticker stream error, continuing");
                        }
                        _ => {}
                    }
                }

                // Stop ping task, it owns the write half and closes the socket
                let _ = ping_shutdown_tx.send(()).await;
                let _ = ping_task.await;

                status_tx.send_replace(ConnectionStatus::Disconnected);

                if delivery == Delivery::Stop {
                    info!("live ticker feed stopped");
                    return;
                }

                warn!(timed_out = read.timed_out(), "live ticker stream disconnected, will reconnect");
            }
            Err(error) => {
                error!(url = %config.ws_url, %error, "failed to connect to live ticker stream");
                status_tx.send_replace(ConnectionStatus::Disconnected);
            }
        }

        debug!(delay = ?config.reconnect_delay, "waiting before reconnecting");
        tokio::time::sleep(config.reconnect_delay).await;
    }
}
