//! Binance spot 24h ticker payloads: the bulk REST snapshot and the `!ticker@arr`
//! WebSocket stream.

use crate::{
    error::DataError,
    feed::de::datetime_from_epoch_ms,
    symbol,
    ticker::{TickerRecord, TickerSource},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/rest-api/market-data-endpoints#24hr-ticker-price-change-statistics>
/// ```json
/// {
///     "symbol": "BTCUSDT",
///     "priceChange": "-94.99999800",
///     "priceChangePercent": "-95.960",
///     "lastPrice": "4.00000200",
///     "quoteVolume": "15.30000000",
///     "openTime": 1499783499040,
///     "closeTime": 1499869899040
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceTicker24h {
    pub symbol: String,

    #[serde(alias = "price", with = "rust_decimal::serde::str")]
    pub last_price: Decimal,

    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price_change_percent: Option<Decimal>,

    #[serde(alias = "volumeQuote", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,

    #[serde(default)]
    pub close_time: Option<i64>,
}

/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#all-market-rolling-window-statistics-streams>
/// ```json
/// {
///     "e": "24hrTicker",
///     "E": 1672515782136,
///     "s": "BNBBTC",
///     "P": "250.00",
///     "c": "0.0025",
///     "q": "18"
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BinanceLiveTicker {
    #[serde(rename = "E")]
    pub event_time: i64,

    #[serde(rename = "s")]
    pub symbol: String,

    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub last_price: Decimal,

    #[serde(rename = "P", with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,

    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
}

impl From<BinanceTicker24h> for TickerRecord {
    fn from(ticker: BinanceTicker24h) -> Self {
        TickerRecord::new(
            symbol::normalise(&ticker.symbol),
            ticker.last_price,
            ticker.price_change_percent,
            ticker.quote_volume,
            ticker.close_time.and_then(datetime_from_epoch_ms),
            TickerSource::Primary,
        )
    }
}

impl From<BinanceLiveTicker> for TickerRecord {
    fn from(ticker: BinanceLiveTicker) -> Self {
        TickerRecord::new(
            symbol::normalise(&ticker.symbol),
            ticker.last_price,
            Some(ticker.price_change_percent),
            ticker.quote_volume,
            datetime_from_epoch_ms(ticker.event_time),
            TickerSource::Live,
        )
    }
}

/// Determine if a record passes the tracked-symbol and positive-price filter shared by
/// both Binance feeds.
fn is_tradeable(record: &TickerRecord) -> bool {
    symbol::is_tracked(&record.symbol) && record.last_price > Decimal::ZERO
}

/// Parse a bulk 24h statistics response body.
///
/// A body that is not a JSON array fails the whole snapshot. Individual elements that
/// fail to parse are dropped.
pub fn parse_snapshot(body: &[u8]) -> Result<Vec<TickerRecord>, DataError> {
    let elements = serde_json::from_slice::<Vec<Value>>(body)?;
    let total = elements.len();

    let records = elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<BinanceTicker24h>(element).ok())
        .map(TickerRecord::from)
        .collect::<Vec<_>>();

    let malformed = total - records.len();
    if malformed > 0 {
        debug!(malformed, total, "dropped malformed Binance snapshot records");
    }

    Ok(records.into_iter().filter(is_tradeable).collect())
}

/// Parse a `!ticker@arr` frame.
///
/// Returns `None` for malformed frames (non-array payloads, unparseable numeric fields)
/// and for frames containing no tracked symbols.
pub fn parse_live_frame(text: &str) -> Option<Vec<TickerRecord>> {
    let tickers = match serde_json::from_str::<Vec<BinanceLiveTicker>>(text) {
        Ok(tickers) => tickers,
        Err(error) => {
            let payload = text.chars().take(100).collect::<String>();
            debug!(%error, %payload, "dropping malformed live frame");
            return None;
        }
    };

    let batch = tickers
        .into_iter()
        .map(TickerRecord::from)
        .filter(is_tradeable)
        .collect::<Vec<_>>();

    (!batch.is_empty()).then_some(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    mod de {
        use super::*;

        #[test]
        fn test_binance_ticker_24h() {
            let input = r#"
                {
                    "symbol": "BTCUSDT",
                    "priceChange": "-94.99999800",
                    "priceChangePercent": "-1.960",
                    "weightedAvgPrice": "0.29628482",
                    "lastPrice": "65432.10000000",
                    "volume": "8913.30000000",
                    "quoteVolume": "1234567.89000000",
                    "openTime": 1499783499040,
                    "closeTime": 1499869899040,
                    "count": 76
                }
            "#;

            let actual = serde_json::from_str::<BinanceTicker24h>(input).unwrap();
            assert_eq!(
                actual,
                BinanceTicker24h {
                    symbol: "BTCUSDT".to_string(),
                    last_price: dec!(65432.10000000),
                    price_change_percent: Some(dec!(-1.960)),
                    quote_volume: dec!(1234567.89000000),
                    close_time: Some(1499869899040),
                }
            );
        }

        #[test]
        fn test_binance_live_ticker() {
            let input = r#"
                {
                    "e": "24hrTicker",
                    "E": 1672515782136,
                    "s": "BNBBTC",
                    "p": "0.0015",
                    "P": "250.00",
                    "c": "0.0025",
                    "Q": "10",
                    "q": "18",
                    "C": 1672515782136
                }
            "#;

            let actual = serde_json::from_str::<BinanceLiveTicker>(input).unwrap();
            assert_eq!(
                actual,
                BinanceLiveTicker {
                    event_time: 1672515782136,
                    symbol: "BNBBTC".to_string(),
                    last_price: dec!(0.0025),
                    price_change_percent: dec!(250.00),
                    quote_volume: dec!(18),
                }
            );
        }
    }

    #[test]
    fn test_parse_snapshot_filters_and_drops_malformed_records() {
        let body = br#"[
            {"symbol": "BTCUSDT", "lastPrice": "60000.00", "priceChangePercent": "1.5", "quoteVolume": "1000", "closeTime": 1700000000000},
            {"symbol": "ETHBTC", "lastPrice": "0.05", "priceChangePercent": "-0.5", "quoteVolume": "12.5", "closeTime": 1700000000000},
            {"symbol": "BTCUPUSDT", "lastPrice": "10.0", "priceChangePercent": "3.0", "quoteVolume": "50", "closeTime": 1700000000000},
            {"symbol": "ETHEUR", "lastPrice": "3000.0", "priceChangePercent": "0.1", "quoteVolume": "70", "closeTime": 1700000000000},
            {"symbol": "DEADUSDT", "lastPrice": "0.00000000", "priceChangePercent": "0.0", "quoteVolume": "0", "closeTime": 1700000000000},
            {"symbol": "BADUSDT", "lastPrice": "not-a-number", "priceChangePercent": "0.0", "quoteVolume": "0"},
            {"unexpected": true}
        ]"#;

        let records = parse_snapshot(body).unwrap();
        let symbols = records.iter().map(|record| record.symbol.as_str()).collect::<Vec<_>>();

        assert_eq!(symbols, vec!["BTCUSDT", "ETHBTC"]);
        assert_eq!(records[0].display_pair, "BTC/USDT");
        assert_eq!(records[0].source, TickerSource::Primary);
        assert_eq!(records[1].price_change_percent, Some(dec!(-0.5)));
    }

    #[test]
    fn test_parse_snapshot_non_array_fails() {
        let body = br#"{"code": -1003, "msg": "Too many requests"}"#;
        assert!(matches!(parse_snapshot(body), Err(DataError::Deserialise(_))));
    }

    #[test]
    fn test_parse_live_frame() {
        struct TestCase {
            input: &'static str,
            expected: Option<Vec<&'static str>>,
        }

        let tests = vec![
            TestCase {
                // TC0: valid frame with an untracked symbol filtered out
                input: r#"[
                    {"e":"24hrTicker","E":1,"s":"BTCUSDT","P":"1.0","c":"60000.1","q":"100"},
                    {"e":"24hrTicker","E":1,"s":"ETHDOWNUSDT","P":"1.0","c":"1.2","q":"100"}
                ]"#,
                expected: Some(vec!["BTCUSDT"]),
            },
            TestCase {
                // TC1: non-array payload is dropped
                input: r#"{"e":"24hrTicker","E":1,"s":"BTCUSDT","P":"1.0","c":"60000.1","q":"100"}"#,
                expected: None,
            },
            TestCase {
                // TC2: unparseable numeric field drops the whole frame
                input: r#"[
                    {"e":"24hrTicker","E":1,"s":"BTCUSDT","P":"1.0","c":"60000.1","q":"100"},
                    {"e":"24hrTicker","E":1,"s":"ETHUSDT","P":"1.0","c":"NaN?","q":"100"}
                ]"#,
                expected: None,
            },
            TestCase {
                // TC3: frame with no tracked symbols emits nothing
                input: r#"[{"e":"24hrTicker","E":1,"s":"ETHEUR","P":"1.0","c":"3000","q":"100"}]"#,
                expected: None,
            },
            TestCase {
                // TC4: not JSON at all
                input: "ping",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = parse_live_frame(test.input).map(|batch| {
                batch
                    .into_iter()
                    .map(|record| record.symbol.to_string())
                    .collect::<Vec<_>>()
            });
            let expected = test
                .expected
                .map(|symbols| symbols.into_iter().map(str::to_string).collect::<Vec<_>>());
            assert_eq!(actual, expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_parse_live_frame_record_fields() {
        let batch = parse_live_frame(
            r#"[{"e":"24hrTicker","E":1700000000123,"s":"ETHUSDT","P":"-2.5","c":"3000.5","q":"987654.3"}]"#,
        )
        .unwrap();

        let record = &batch[0];
        assert_eq!(record.last_price, dec!(3000.5));
        assert_eq!(record.price_change_percent, Some(dec!(-2.5)));
        assert_eq!(record.quote_volume, dec!(987654.3));
        assert_eq!(record.observed_at, datetime_from_epoch_ms(1700000000123));
        assert_eq!(record.source, TickerSource::Live);
    }
}
