use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Which quoted price a return is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// The raw closing price.
    Close,
    /// The dividend/split-adjusted closing price. Points without an adjusted
    /// value fall back to the raw close.
    #[default]
    AdjustedClose,
}

impl PriceField {
    pub fn label(&self) -> &'static str {
        match self {
            PriceField::Close => "Close",
            PriceField::AdjustedClose => "Adjusted Close",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PriceField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "close" | "raw" => Ok(PriceField::Close),
            "adjusted" | "adjusted_close" | "adj_close" => Ok(PriceField::AdjustedClose),
            other => Err(CoreError::InvalidInput(
                "price field".to_string(),
                format!("unknown value '{other}', expected 'close' or 'adjusted'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("close".parse::<PriceField>().unwrap(), PriceField::Close);
        assert_eq!("Adjusted".parse::<PriceField>().unwrap(), PriceField::AdjustedClose);
        assert_eq!("adj_close".parse::<PriceField>().unwrap(), PriceField::AdjustedClose);
        assert!("open".parse::<PriceField>().is_err());
    }

    #[test]
    fn defaults_to_adjusted_close() {
        assert_eq!(PriceField::default(), PriceField::AdjustedClose);
    }
}
