//! Ticker merge engine.
//!
//! Reconciles the primary snapshot, the secondary snapshot and live stream batches
//! into one [`TickerMap`]. Every function here is pure: it reads only its explicit
//! inputs and returns a new mapping, so repeated or out-of-order invocation from
//! independently timed sources stays deterministic.
//!
//! Policy when sources disagree:
//! - `quote_volume`: the primary snapshot wins.
//! - `last_price` / `price_change_percent`: the most recent upstream observation wins,
//!   compared by [`TickerRecord::observed_at`]. Untimed observations always apply.

use crate::{
    favorites::FavoriteSet,
    symbol::Symbol,
    ticker::{TickerRecord, TickerSource},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Authoritative mapping from [`Symbol`] to [`TickerRecord`].
///
/// Symbols are unique by construction. Equality ignores insertion order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TickerMap(IndexMap<Symbol, TickerRecord>);

impl TickerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&TickerRecord> {
        self.0.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TickerRecord> {
        self.0.values()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.0.keys()
    }
}

impl FromIterator<TickerRecord> for TickerMap {
    /// Later records replace earlier records for the same symbol.
    fn from_iter<T: IntoIterator<Item = TickerRecord>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|record| (record.symbol.clone(), record))
                .collect(),
        )
    }
}

/// Merge one snapshot cycle into `previous`.
///
/// - `snapshot`: `None` means no primary snapshot this cycle; every previous record is
///   kept. `Some` replaces the mapping with the snapshot's symbols, reconciled against
///   `previous`.
/// - `secondary`: `None` means the secondary source failed; its previously published
///   records are carried over. `Some` upserts price and change, never volume.
/// - Symbols in `favorites` or `held` present in `previous` always survive.
pub fn merge(
    previous: &TickerMap,
    snapshot: Option<&[TickerRecord]>,
    secondary: Option<&[TickerRecord]>,
    favorites: &FavoriteSet,
    held: &BTreeSet<Symbol>,
) -> TickerMap {
    let mut merged = match snapshot {
        None => previous.0.clone(),
        Some(batch) => {
            let mut next = IndexMap::with_capacity(batch.len());
            for incoming in batch {
                let record = match previous.get(&incoming.symbol) {
                    Some(prior) => reconcile_snapshot(prior, incoming),
                    None => incoming.clone(),
                };
                next.insert(record.symbol.clone(), record);
            }
            next
        }
    };

    match secondary {
        Some(batch) => {
            for incoming in batch {
                match merged.get_mut(&incoming.symbol) {
                    Some(existing) => apply_price(existing, incoming),
                    None => {
                        let mut record = incoming.clone();
                        if let Some(prior) = previous.get(&incoming.symbol) {
                            record.quote_volume = prior.quote_volume;
                        }
                        merged.insert(record.symbol.clone(), record);
                    }
                }
            }
        }
        None => {
            for prior in previous.iter() {
                if prior.source == TickerSource::Secondary && !merged.contains_key(&prior.symbol) {
                    merged.insert(prior.symbol.clone(), prior.clone());
                }
            }
        }
    }

    for prior in previous.iter() {
        let retained = favorites.contains(&prior.symbol) || held.contains(&prior.symbol);
        if retained && !merged.contains_key(&prior.symbol) {
            merged.insert(prior.symbol.clone(), prior.clone());
        }
    }

    TickerMap(merged)
}

/// Apply a live stream batch to `previous`.
///
/// Unknown symbols are inserted. Known symbols take the batch's price and change
/// unless the batch observation is older. Volume is only taken from the live stream
/// for records the live stream created, elsewhere the snapshot owns it.
pub fn apply_live(previous: &TickerMap, batch: &[TickerRecord]) -> TickerMap {
    let mut next = previous.0.clone();

    for incoming in batch {
        match next.get_mut(&incoming.symbol) {
            Some(existing) => {
                if existing.source == TickerSource::Live && !incoming.is_older_than(existing) {
                    existing.quote_volume = incoming.quote_volume;
                }
                apply_price(existing, incoming);
            }
            None => {
                next.insert(incoming.symbol.clone(), incoming.clone());
            }
        }
    }

    TickerMap(next)
}

/// Reconcile a primary snapshot record against the previously merged record. The
/// snapshot takes ownership of the record, including one the live stream created.
fn reconcile_snapshot(prior: &TickerRecord, incoming: &TickerRecord) -> TickerRecord {
    let mut record = prior.clone();
    record.source = incoming.source;
    record.quote_volume = incoming.quote_volume;
    apply_price(&mut record, incoming);
    record
}

/// Take `incoming`'s price fields unless its observation is strictly older.
fn apply_price(existing: &mut TickerRecord, incoming: &TickerRecord) {
    if incoming.is_older_than(existing) {
        return;
    }

    existing.last_price = incoming.last_price;
    existing.price_change_percent = incoming
        .price_change_percent
        .or(existing.price_change_percent);
    existing.observed_at = incoming.observed_at.or(existing.observed_at);
}
