//! # Tickerboard-Data
//! Aggregates public spot ticker data from three independently timed sources into one
//! consistent, orderable table:
//! * A periodic bulk 24h statistics snapshot (REST).
//! * A secondary rates snapshot for the one asset missing from the primary source.
//! * A continuous all-market live ticker stream (WebSocket).
//!
//! The [`TickerBoard`](board::TickerBoard) owns the merged [`TickerMap`](merge::TickerMap)
//! and publishes every new version. Derived [`views`] and [`portfolio`] valuation are
//! pure functions over a version.
//!
//! ## Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use tickerboard_data::{
//!     board::{BoardRunner, TickerBoard},
//!     config::FeedConfig,
//!     views::ViewQuery,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let board = Arc::new(TickerBoard::default());
//!     let handle = BoardRunner::spawn(FeedConfig::from_env(), Arc::clone(&board)).unwrap();
//!
//!     let mut tickers = board.subscribe();
//!     while tickers.changed().await.is_ok() {
//!         let mapping = tickers.borrow_and_update().clone();
//!         for record in ViewQuery::default().apply(&mapping, &board.favorites()).iter().take(10) {
//!             println!("{} {}", record.display_pair, record.last_price);
//!         }
//!     }
//!
//!     handle.shutdown();
//! }
//! ```

/// All [`Error`](std::error::Error)s generated in Tickerboard-Data.
pub mod error;

/// Upstream endpoints, poll cadence and connection tuning.
pub mod config;

/// Quote asset and leveraged-token classification of exchange symbols.
pub mod symbol;

/// Normalised [`TickerRecord`](ticker::TickerRecord).
pub mod ticker;

/// Snapshot and live stream clients.
pub mod feed;

/// Pure merge of snapshot, secondary and live batches into a [`TickerMap`](merge::TickerMap).
pub mod merge;

/// Filter, search, sort and formatting over a [`TickerMap`](merge::TickerMap).
pub mod views;

/// User pinned symbols.
pub mod favorites;

/// Portfolio positions and decimal valuation.
pub mod portfolio;

/// Round trip profit calculator.
pub mod calculator;

/// Device-local JSON persistence.
pub mod storage;

/// Reactive store and the tasks feeding it.
pub mod board;

pub use board::{BoardHandle, BoardRunner, TickerBoard};
pub use error::DataError;
pub use favorites::FavoriteSet;
pub use merge::TickerMap;
pub use symbol::Symbol;
pub use ticker::{TickerRecord, TickerSource};
