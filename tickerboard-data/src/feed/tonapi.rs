//! Tonapi rates payload for the secondary snapshot source.
//!
//! The secondary source reports a price and a 24h change for one asset that the
//! primary snapshot does not list. It never reports volume.

use crate::{
    error::DataError,
    feed::de::{decimal_from_json, percent_from_str},
    symbol::Symbol,
    ticker::{TickerRecord, TickerSource},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// ### Raw Payload Examples
/// See docs: <https://tonapi.io/api-v2#operations-Rates-getRates>
/// ```json
/// {
///     "rates": {
///         "TON": {
///             "prices": { "USD": 5.2 },
///             "diff_24h": { "USD": "+1.23%" }
///         }
///     }
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct TonapiRates {
    pub rates: HashMap<String, TonapiRate>,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct TonapiRate {
    #[serde(default)]
    pub prices: HashMap<String, Value>,

    #[serde(default)]
    pub diff_24h: HashMap<String, String>,
}

/// Case-insensitive map lookup, tonapi echoes keys in the case they were requested.
fn get_ignore_case<'a, V>(map: &'a HashMap<String, V>, key: &str) -> Option<&'a V> {
    map.iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

/// Parse a tonapi rates body into the single secondary [`TickerRecord`].
///
/// `quote_volume` is always zero since the source does not report it. An unparseable
/// 24h change yields `None` rather than failing the record.
pub fn parse_rates(
    body: &[u8],
    token: &str,
    currency: &str,
    symbol: &Symbol,
) -> Result<Vec<TickerRecord>, DataError> {
    let rates = serde_json::from_slice::<TonapiRates>(body)?;

    let rate = get_ignore_case(&rates.rates, token)
        .ok_or_else(|| DataError::Deserialise(format!("rates missing token {token}")))?;

    let last_price = get_ignore_case(&rate.prices, currency)
        .and_then(decimal_from_json)
        .filter(|price| *price > Decimal::ZERO)
        .ok_or_else(|| {
            DataError::Deserialise(format!("rates missing positive {currency} price for {token}"))
        })?;

    let price_change_percent =
        get_ignore_case(&rate.diff_24h, currency).and_then(|diff| percent_from_str(diff));

    Ok(vec![TickerRecord::new(
        symbol.clone(),
        last_price,
        price_change_percent,
        Decimal::ZERO,
        None,
        TickerSource::Secondary,
    )])
}
