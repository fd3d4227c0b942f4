use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `tickerboard-data`.
///
/// Payloads are rendered to `String` so an error can be cloned into the
/// [`TickerBoard`](crate::board::TickerBoard) "last error" slot and shown next to
/// retained data.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status} returned by {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to deserialise upstream payload: {0}")]
    Deserialise(String),

    #[error("SocketError: {0}")]
    Socket(String),

    #[error("local storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid portfolio position: {0}")]
    InvalidPosition(String),

    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

impl DataError {
    /// Determine if an error requires the live stream connection to re-initialise.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_terminal(&self) -> bool {
        match self {
            DataError::Socket(error_msg) => {
                let error_lower = error_msg.to_lowercase();
                error_lower.contains("terminated")
                    || error_lower.contains("connectionclosed")
                    || error_lower.contains("alreadyclosed")
                    || error_lower.contains("sendafterclosing")
                    || error_lower.contains("io(")
                    || error_lower.contains("timeout")
            }
            DataError::ChannelClosed(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(value: reqwest::Error) -> Self {
        match (value.status(), value.url()) {
            (Some(status), Some(url)) => Self::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            },
            _ if value.is_decode() => Self::Deserialise(value.to_string()),
            _ => Self::Http(value.to_string()),
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Deserialise(value.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DataError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(format!("{value:?}"))
    }
}

impl From<std::io::Error> for DataError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_is_terminal() {
        struct TestCase {
            input: DataError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: is not terminal w/ DataError::Http
                input: DataError::Http("connection refused".to_string()),
                expected: false,
            },
            TestCase {
                // TC1: is terminal w/ DataError::Socket containing "ConnectionClosed"
                input: DataError::Socket("WebSocket error: ConnectionClosed".to_string()),
                expected: true,
            },
            TestCase {
                // TC2: is terminal w/ DataError::Socket containing "Io("
                input: DataError::Socket("Io(Kind(UnexpectedEof))".to_string()),
                expected: true,
            },
            TestCase {
                // TC3: is terminal w/ DataError::Socket containing "timeout"
                input: DataError::Socket(
                    "WebSocket read timeout: no data received for 120 seconds".to_string(),
                ),
                expected: true,
            },
            TestCase {
                // TC4: is not terminal w/ DataError::Socket protocol noise
                input: DataError::Socket("unexpected pong payload".to_string()),
                expected: false,
            },
            TestCase {
                // TC5: is terminal w/ DataError::ChannelClosed
                input: DataError::ChannelClosed("live batches".to_string()),
                expected: true,
            },
            TestCase {
                // TC6: is not terminal w/ DataError::HttpStatus
                input: DataError::HttpStatus {
                    url: "https://api.binance.com/api/v3/ticker/24hr".to_string(),
                    status: 429,
                },
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_terminal();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_data_error_from_serde_json() {
        let error = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        assert!(matches!(DataError::from(error), DataError::Deserialise(_)));
    }
}
