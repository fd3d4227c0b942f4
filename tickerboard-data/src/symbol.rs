//! Exchange-native symbol classification.
//!
//! A symbol is *tracked* when it ends in one of the two supported quote assets and
//! is not a leveraged-token variant (eg/ `BTCUPUSDT`, `ETHDOWNUSDT`).

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};

/// Exchange-native market identifier, uppercase with no separator (eg/ `BTCUSDT`).
pub type Symbol = SmolStr;

/// Markers appended to the underlying asset by leveraged-token issuers.
const LEVERAGED_MARKERS: [&str; 4] = ["UP", "DOWN", "BULL", "BEAR"];

/// Shortest underlying a leveraged token is issued on, so `JUP` is not read as `J` + `UP`.
const MIN_LEVERAGED_UNDERLYING_LEN: usize = 3;

/// Listed assets whose base ends in a leveraged marker (eg/ `SYRUP` is not `SYR` + `UP`).
const NON_LEVERAGED_BASES: [&str; 1] = ["SYRUP"];

/// Quote assets the board tracks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum QuoteAsset {
    Usdt,
    Btc,
}

impl QuoteAsset {
    /// Checked in order, `USDT` first, so `BTCUSDT` is never read as a `BTC` quoted pair.
    pub const ALL: [QuoteAsset; 2] = [QuoteAsset::Usdt, QuoteAsset::Btc];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteAsset::Usdt => "USDT",
            QuoteAsset::Btc => "BTC",
        }
    }

    /// Determine the [`QuoteAsset`] of a symbol from its suffix.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|quote| symbol.len() > quote.as_str().len() && symbol.ends_with(quote.as_str()))
    }
}

impl Display for QuoteAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base asset of a symbol with a recognised quote asset (eg/ `BTCUSDT` -> `BTC`).
pub fn base_asset(symbol: &str) -> Option<&str> {
    QuoteAsset::from_symbol(symbol)
        .map(|quote| &symbol[..symbol.len() - quote.as_str().len()])
}

/// Determine if a symbol is a leveraged-token variant.
pub fn is_leveraged(symbol: &str) -> bool {
    let Some(base) = base_asset(symbol) else {
        return false;
    };
    if NON_LEVERAGED_BASES.contains(&base) {
        return false;
    }

    LEVERAGED_MARKERS.iter().any(|marker| {
        base.strip_suffix(marker)
            .is_some_and(|underlying| underlying.len() >= MIN_LEVERAGED_UNDERLYING_LEN)
    })
}

/// Determine if a symbol is quoted in `quote` and is not a leveraged-token variant.
pub fn is_tracked_in(symbol: &str, quote: QuoteAsset) -> bool {
    QuoteAsset::from_symbol(symbol) == Some(quote) && !is_leveraged(symbol)
}

/// Determine if a symbol is quoted in any supported [`QuoteAsset`] and is not leveraged.
pub fn is_tracked(symbol: &str) -> bool {
    QuoteAsset::from_symbol(symbol).is_some() && !is_leveraged(symbol)
}

/// Human-readable pair with a separator before the quote asset (eg/ `BTC/USDT`).
///
/// Symbols without a recognised quote asset are returned unchanged.
pub fn display_pair(symbol: &str) -> SmolStr {
    match (base_asset(symbol), QuoteAsset::from_symbol(symbol)) {
        (Some(base), Some(quote)) => smol_str::format_smolstr!("{base}/{quote}"),
        _ => SmolStr::new(symbol),
    }
}

/// Normalise user or upstream input into an exchange-native [`Symbol`].
pub fn normalise(input: &str) -> Symbol {
    let cleaned = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | ' '))
        .flat_map(char::to_uppercase)
        .collect::<String>();
    SmolStr::new(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_asset_from_symbol() {
        struct TestCase {
            input: &'static str,
            expected: Option<QuoteAsset>,
        }

        let tests = vec![
            TestCase {
                // TC0: USDT quoted
                input: "ETHUSDT",
                expected: Some(QuoteAsset::Usdt),
            },
            TestCase {
                // TC1: BTC quoted
                input: "ETHBTC",
                expected: Some(QuoteAsset::Btc),
            },
            TestCase {
                // TC2: BTCUSDT is USDT quoted, not BTC
                input: "BTCUSDT",
                expected: Some(QuoteAsset::Usdt),
            },
            TestCase {
                // TC3: unsupported quote asset
                input: "ETHEUR",
                expected: None,
            },
            TestCase {
                // TC4: bare quote asset has no base
                input: "USDT",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = QuoteAsset::from_symbol(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_is_leveraged() {
        struct TestCase {
            input: &'static str,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: UP token
                input: "BTCUPUSDT",
                expected: true,
            },
            TestCase {
                // TC1: DOWN token
                input: "ETHDOWNUSDT",
                expected: true,
            },
            TestCase {
                // TC2: BEAR token
                input: "XRPBEARUSDT",
                expected: true,
            },
            TestCase {
                // TC3: BULL token quoted in BTC
                input: "LINKBULLBTC",
                expected: true,
            },
            TestCase {
                // TC4: short base ending in UP is a real asset
                input: "JUPUSDT",
                expected: false,
            },
            TestCase {
                // TC5: marker not at the end of the base asset
                input: "SUPERUSDT",
                expected: false,
            },
            TestCase {
                // TC6: unrecognised quote asset
                input: "BTCUPEUR",
                expected: false,
            },
            TestCase {
                // TC7: listed asset whose base ends in UP
                input: "SYRUPUSDT",
                expected: false,
            },
            TestCase {
                // TC8: listed asset whose base ends in UP quoted in BTC
                input: "SYRUPBTC",
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = is_leveraged(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_is_tracked() {
        assert!(is_tracked("BTCUSDT"));
        assert!(is_tracked("ETHBTC"));
        assert!(!is_tracked("BTCUPUSDT"));
        assert!(!is_tracked("BTCEUR"));

        assert!(is_tracked_in("ETHBTC", QuoteAsset::Btc));
        assert!(!is_tracked_in("ETHBTC", QuoteAsset::Usdt));
        assert!(!is_tracked_in("ETHDOWNUSDT", QuoteAsset::Usdt));
    }

    #[test]
    fn test_display_pair() {
        assert_eq!(display_pair("BTCUSDT"), "BTC/USDT");
        assert_eq!(display_pair("ETHBTC"), "ETH/BTC");
        assert_eq!(display_pair("ETHEUR"), "ETHEUR");
    }

    #[test]
    fn test_normalise() {
        assert_eq!(normalise(" btc/usdt "), "BTCUSDT");
        assert_eq!(normalise("eth-btc"), "ETHBTC");
        assert_eq!(normalise("ton"), "TON");
    }
}
