//! Reactive ticker store.
//!
//! [`TickerBoard`] owns the current [`TickerMap`] version and is the only place new
//! versions are produced. Every version is published as an `Arc<TickerMap>` on a
//! [`watch`] channel, consumers read the latest version and never mutate it.
//!
//! [`BoardRunner`] drives a board from the snapshot poller and the live stream.

use crate::{
    config::FeedConfig,
    error::DataError,
    favorites::FavoriteSet,
    feed::{ConnectionStatus, Delivery, LiveFeed, LiveSubscription, Snapshot, SnapshotClient},
    merge::{self, TickerMap},
    symbol::Symbol,
    ticker::TickerRecord,
};
use parking_lot::Mutex;
use std::{collections::BTreeSet, sync::Arc};
use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct BoardState {
    mapping: Arc<TickerMap>,
    favorites: FavoriteSet,
    held: BTreeSet<Symbol>,
    last_error: Option<DataError>,
    closed: bool,
}

/// Single owner of the merged [`TickerMap`].
#[derive(Debug)]
pub struct TickerBoard {
    state: Mutex<BoardState>,
    mapping_tx: watch::Sender<Arc<TickerMap>>,
}

impl Default for TickerBoard {
    fn default() -> Self {
        Self::new(FavoriteSet::default(), BTreeSet::new())
    }
}

impl TickerBoard {
    pub fn new(favorites: FavoriteSet, held: BTreeSet<Symbol>) -> Self {
        let mapping = Arc::new(TickerMap::new());
        let (mapping_tx, _) = watch::channel(Arc::clone(&mapping));

        Self {
            state: Mutex::new(BoardState {
                mapping,
                favorites,
                held,
                last_error: None,
                closed: false,
            }),
            mapping_tx,
        }
    }

    /// Receiver notified with every new [`TickerMap`] version.
    pub fn subscribe(&self) -> watch::Receiver<Arc<TickerMap>> {
        self.mapping_tx.subscribe()
    }

    /// Latest [`TickerMap`] version.
    pub fn mapping(&self) -> Arc<TickerMap> {
        Arc::clone(&self.state.lock().mapping)
    }

    pub fn favorites(&self) -> FavoriteSet {
        self.state.lock().favorites.clone()
    }

    /// Error of the most recent failed snapshot, cleared by the next successful one.
    pub fn last_error(&self) -> Option<DataError> {
        self.state.lock().last_error.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Merge the outcome of a snapshot cycle. Returns `false` if the board is closed.
    ///
    /// A failed cycle records the error and leaves the mapping untouched.
    pub fn apply_snapshot(&self, result: Result<Snapshot, DataError>) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            debug!("board closed, ignoring snapshot");
            return false;
        }

        match result {
            Ok(snapshot) => {
                let next = merge::merge(
                    &state.mapping,
                    Some(snapshot.primary.as_slice()),
                    snapshot.secondary.as_deref(),
                    &state.favorites,
                    &state.held,
                );
                state.last_error = None;
                self.publish(&mut state, next);
            }
            Err(error) => {
                warn!(%error, "snapshot failed, retaining previous tickers");
                state.last_error = Some(error);
            }
        }

        true
    }

    /// Apply a live stream batch. Returns `false` if the board is closed.
    pub fn apply_live(&self, batch: &[TickerRecord]) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }

        let next = merge::apply_live(&state.mapping, batch);
        self.publish(&mut state, next);
        true
    }

    /// Replace the favourites consulted by subsequent merges.
    pub fn set_favorites(&self, favorites: FavoriteSet) {
        self.state.lock().favorites = favorites;
    }

    /// Toggle one favourite, returning whether it is now pinned.
    pub fn toggle_favorite(&self, symbol: &str) -> bool {
        self.state.lock().favorites.toggle(symbol)
    }

    /// Replace the portfolio symbols consulted by subsequent merges.
    pub fn set_held(&self, held: BTreeSet<Symbol>) {
        self.state.lock().held = held;
    }

    /// Stop accepting updates. Every later apply is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            info!(tickers = state.mapping.len(), "closing ticker board");
            state.closed = true;
        }
    }

    fn publish(&self, state: &mut BoardState, next: TickerMap) {
        if *state.mapping == next {
            return;
        }

        let next = Arc::new(next);
        state.mapping = Arc::clone(&next);
        self.mapping_tx.send_replace(next);
    }
}

/// Spawns the tasks that feed a [`TickerBoard`].
#[derive(Debug)]
pub struct BoardRunner;

impl BoardRunner {
    /// Start polling snapshots every `config.poll_interval` and applying the live
    /// stream to `board`. Must be called from within a tokio runtime.
    pub fn spawn(config: FeedConfig, board: Arc<TickerBoard>) -> Result<BoardHandle, DataError> {
        config.validate()?;
        let client = SnapshotClient::new(config.clone())?;
        let refresh = Arc::new(Notify::new());

        let poll_task = tokio::spawn(run_snapshot_loop(
            client,
            config.clone(),
            Arc::clone(&board),
            Arc::clone(&refresh),
        ));

        let live_board = Arc::clone(&board);
        let live = LiveFeed::new(config).subscribe_with(move |batch| {
            if live_board.apply_live(&batch) {
                Delivery::Continue
            } else {
                Delivery::Stop
            }
        });

        Ok(BoardHandle {
            board,
            poll_task,
            live,
            refresh,
        })
    }
}

async fn run_snapshot_loop(
    client: SnapshotClient,
    config: FeedConfig,
    board: Arc<TickerBoard>,
    refresh: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = refresh.notified() => {
                debug!("snapshot refresh requested");
                interval.reset();
            }
        }

        let result = client.fetch_snapshot().await;
        if !board.apply_snapshot(result) {
            break;
        }
    }

    debug!("snapshot loop stopped");
}

/// Handle to the tasks spawned by [`BoardRunner::spawn`].
///
/// Dropping the handle tears the tasks down and closes the board.
#[derive(Debug)]
pub struct BoardHandle {
    board: Arc<TickerBoard>,
    poll_task: JoinHandle<()>,
    live: LiveSubscription,
    refresh: Arc<Notify>,
}

impl BoardHandle {
    pub fn board(&self) -> &Arc<TickerBoard> {
        &self.board
    }

    /// Receiver of live stream [`ConnectionStatus`] updates.
    pub fn live_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.live.status()
    }

    /// Fetch a snapshot now instead of waiting for the next poll.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Stop polling, stop the live stream and close the board.
    pub fn shutdown(self) {
        drop(self)
    }
}

impl Drop for BoardHandle {
    fn drop(&mut self) {
        self.board.close();
        self.poll_task.abort();
    }
}
