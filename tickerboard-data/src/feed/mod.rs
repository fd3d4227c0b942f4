//! Upstream feed clients: the periodic snapshot puller and the live stream.

/// Binance bulk 24h statistics and `!ticker@arr` payloads.
pub mod binance;

/// Tonapi rates payload for the secondary asset.
pub mod tonapi;

/// Lenient numeric parsing helpers.
pub mod de;

/// Concurrent primary + secondary snapshot client.
pub mod snapshot;

/// Live stream client with reconnect and subscription handles.
pub mod live;

/// Idle timeout stream wrapper.
pub mod timeout;

pub use live::{ConnectionStatus, Delivery, LiveChannel, LiveFeed, LiveSubscription};
pub use snapshot::{Snapshot, SnapshotClient};
