//! Derived views over a [`TickerMap`].
//!
//! Read-only: every function borrows the mapping and returns references into it.

use crate::{
    favorites::FavoriteSet,
    merge::TickerMap,
    symbol::{self, QuoteAsset},
    ticker::TickerRecord,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

/// USDT quoted bases priced in the thousands, shown with 2 decimals.
const HIGH_MAGNITUDE_BASES: [&str; 8] = ["BTC", "ETH", "BNB", "BCH", "MKR", "YFI", "PAXG", "WBTC"];

/// USDT quoted bases priced below one cent, shown with 5 decimals.
const SUB_CENT_BASES: [&str; 10] = [
    "PEPE", "SHIB", "BONK", "FLOKI", "LUNC", "BTTC", "WIN", "XEC", "SATS", "RATS",
];

const HIGH_MAGNITUDE_DECIMALS: u32 = 2;
const SUB_CENT_DECIMALS: u32 = 5;
const DEFAULT_USDT_DECIMALS: u32 = 4;
const BTC_QUOTE_DECIMALS: u32 = 8;
const VOLUME_FRACTION_DECIMALS: u32 = 3;

/// Record class shown by a markets table.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum QuoteFilter {
    #[default]
    All,
    Usdt,
    Btc,
    Favorites,
}

impl QuoteFilter {
    pub const ALL: [QuoteFilter; 4] = [
        QuoteFilter::All,
        QuoteFilter::Usdt,
        QuoteFilter::Btc,
        QuoteFilter::Favorites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteFilter::All => "ALL",
            QuoteFilter::Usdt => "USDT",
            QuoteFilter::Btc => "BTC",
            QuoteFilter::Favorites => "FAV",
        }
    }

    fn matches(&self, record: &TickerRecord, favorites: &FavoriteSet) -> bool {
        match self {
            QuoteFilter::All => true,
            QuoteFilter::Usdt => symbol::is_tracked_in(&record.symbol, QuoteAsset::Usdt),
            QuoteFilter::Btc => symbol::is_tracked_in(&record.symbol, QuoteAsset::Btc),
            QuoteFilter::Favorites => favorites.contains(&record.symbol),
        }
    }
}

impl Display for QuoteFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum SortColumn {
    Symbol,
    Pair,
    Price,
    Change,
    #[default]
    Volume,
}

impl SortColumn {
    /// Next column in table order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Symbol => SortColumn::Pair,
            SortColumn::Pair => SortColumn::Price,
            SortColumn::Price => SortColumn::Change,
            SortColumn::Change => SortColumn::Volume,
            SortColumn::Volume => SortColumn::Symbol,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Symbol => "symbol",
            SortColumn::Pair => "pair",
            SortColumn::Price => "price",
            SortColumn::Change => "change",
            SortColumn::Volume => "volume",
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Records of the requested class, in mapping order.
pub fn filter<'a>(
    mapping: &'a TickerMap,
    class: QuoteFilter,
    favorites: &FavoriteSet,
) -> Vec<&'a TickerRecord> {
    mapping
        .iter()
        .filter(|record| class.matches(record, favorites))
        .collect()
}

/// Records whose symbol contains `query`, ignoring case. A blank query matches all.
pub fn search<'a>(records: Vec<&'a TickerRecord>, query: &str) -> Vec<&'a TickerRecord> {
    let query = query.trim().to_uppercase();
    if query.is_empty() {
        return records;
    }

    records
        .into_iter()
        .filter(|record| record.symbol.to_uppercase().contains(&query))
        .collect()
}

/// Stable sort by `column`.
///
/// A missing 24h change always sorts last regardless of `direction`.
pub fn sort<'a>(
    mut records: Vec<&'a TickerRecord>,
    column: SortColumn,
    direction: SortDirection,
) -> Vec<&'a TickerRecord> {
    records.sort_by(|a, b| match column {
        SortColumn::Symbol => direction.apply(a.symbol.cmp(&b.symbol)),
        SortColumn::Pair => direction.apply(a.display_pair.cmp(&b.display_pair)),
        SortColumn::Price => direction.apply(a.last_price.cmp(&b.last_price)),
        SortColumn::Volume => direction.apply(a.quote_volume.cmp(&b.quote_volume)),
        SortColumn::Change => {
            match (a.price_change_percent, b.price_change_percent) {
                (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    });
    records
}

/// Complete markets table query: filter, then search, then sort.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ViewQuery {
    pub class: QuoteFilter,
    pub search: String,
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl ViewQuery {
    pub fn apply<'a>(&self, mapping: &'a TickerMap, favorites: &FavoriteSet) -> Vec<&'a TickerRecord> {
        let records = filter(mapping, self.class, favorites);
        let records = search(records, &self.search);
        sort(records, self.column, self.direction)
    }
}

/// Number of decimals used to display the record's last price.
pub fn price_decimals(record: &TickerRecord) -> u32 {
    match record.quote_asset() {
        Some(QuoteAsset::Btc) => BTC_QUOTE_DECIMALS,
        Some(QuoteAsset::Usdt) => match record.base_asset() {
            Some(base) if HIGH_MAGNITUDE_BASES.contains(&base) => HIGH_MAGNITUDE_DECIMALS,
            Some(base) if SUB_CENT_BASES.contains(&base) => SUB_CENT_DECIMALS,
            _ => DEFAULT_USDT_DECIMALS,
        },
        None => DEFAULT_USDT_DECIMALS,
    }
}

/// Last price rounded half away from zero to the asset class precision, zero padded.
pub fn format_price(record: &TickerRecord) -> String {
    fixed_decimals(record.last_price, price_decimals(record))
}

/// Quote volume with thousands separators.
///
/// USDT pairs are truncated to whole units, other pairs keep up to 3 fraction digits.
pub fn format_volume(record: &TickerRecord) -> String {
    match record.quote_asset() {
        Some(QuoteAsset::Usdt) => group_thousands(record.quote_volume.trunc()),
        _ => group_thousands(
            record
                .quote_volume
                .round_dp_with_strategy(VOLUME_FRACTION_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        ),
    }
}

/// Signed percent with 2 decimals (eg/ `+1.25%`), or `-` when unknown.
pub fn format_change(record: &TickerRecord) -> String {
    match record.price_change_percent {
        Some(change) if change >= Decimal::ZERO => format!("+{}%", fixed_decimals(change, 2)),
        Some(change) => format!("{}%", fixed_decimals(change, 2)),
        None => "-".to_string(),
    }
}

/// Round half away from zero and pad with trailing zeros to exactly `decimals` places.
pub fn fixed_decimals(value: Decimal, decimals: u32) -> String {
    let mut value = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(decimals);
    value.to_string()
}

/// Group the integer part of `value` in threes with `,`, trimming trailing fraction zeros.
pub fn group_thousands(value: Decimal) -> String {
    let rendered = value.normalize().to_string();
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(unsigned) => ("-", unsigned),
        None => ("", rendered.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
