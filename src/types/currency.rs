//! Currency codes for the ledger
//!
//! Currencies are validated three-letter ISO codes. Each code knows its
//! minor-unit precision, which bounds the number of fraction digits an
//! amount may carry and drives exchange rounding.

use super::error::CurrencyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 4217 currency code
///
/// Stored as three uppercase ASCII letters. Serialized as a plain string
/// (`"RUB"`), so snapshots stay human readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Russian ruble
    pub const RUB: Currency = Currency(*b"RUB");
    /// US dollar
    pub const USD: Currency = Currency(*b"USD");
    /// Euro
    pub const EUR: Currency = Currency(*b"EUR");

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII letters
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Number of fraction digits used by this currency
    ///
    /// Zero-decimal currencies are listed explicitly; every other code
    /// uses two minor units.
    pub fn minor_units(&self) -> u32 {
        match &self.0 {
            b"JPY" | b"KRW" | b"VND" | b"CLP" | b"ISK" => 0,
            _ => 2,
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let trimmed = code.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(CurrencyError::InvalidCode {
                code: trimmed.to_string(),
            });
        }
        let mut upper = [0u8; 3];
        for (slot, byte) in upper.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Ok(Currency(upper))
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
