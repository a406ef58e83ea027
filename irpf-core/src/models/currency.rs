use std::fmt;

use serde::{Deserialize, Serialize};

/// Currencies an invoice can be issued in. Every amount the engine reports
/// carries one of these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD", alias = "usd")]
    Usd,
    #[serde(rename = "EUR", alias = "eur")]
    Eur,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Case-insensitive parse of an ISO code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Usd => Self::Eur,
            Self::Eur => Self::Usd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
