use crate::symbol::{self, QuoteAsset, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Feed that first observed a [`TickerRecord`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum TickerSource {
    /// Periodic bulk 24h statistics snapshot.
    Primary,
    /// Rates endpoint for the one asset missing from the primary snapshot.
    Secondary,
    /// Continuous push stream.
    Live,
}

/// Normalised 24h statistics of one traded pair.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct TickerRecord {
    pub symbol: Symbol,
    pub display_pair: SmolStr,
    pub last_price: Decimal,
    /// `None` when the upstream did not report a parseable 24h change.
    pub price_change_percent: Option<Decimal>,
    pub quote_volume: Decimal,
    /// Upstream provided event or close time, never the local clock.
    pub observed_at: Option<DateTime<Utc>>,
    pub source: TickerSource,
}

impl TickerRecord {
    /// Construct a new [`TickerRecord`], deriving the `display_pair` from the `symbol`.
    pub fn new(
        symbol: impl Into<Symbol>,
        last_price: Decimal,
        price_change_percent: Option<Decimal>,
        quote_volume: Decimal,
        observed_at: Option<DateTime<Utc>>,
        source: TickerSource,
    ) -> Self {
        let symbol = symbol.into();
        Self {
            display_pair: symbol::display_pair(&symbol),
            symbol,
            last_price,
            price_change_percent,
            quote_volume,
            observed_at,
            source,
        }
    }

    pub fn quote_asset(&self) -> Option<QuoteAsset> {
        QuoteAsset::from_symbol(&self.symbol)
    }

    pub fn base_asset(&self) -> Option<&str> {
        symbol::base_asset(&self.symbol)
    }

    /// Determine if this record's price observation is strictly older than `other`'s.
    ///
    /// Records without an observation time are never considered older, so an
    /// untimed update always applies.
    pub fn is_older_than(&self, other: &TickerRecord) -> bool {
        match (self.observed_at, other.observed_at) {
            (Some(this), Some(that)) => this < that,
            _ => false,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.price_change_percent
            .is_some_and(|change| change >= Decimal::ZERO)
    }
}
