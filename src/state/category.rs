use serde::{Deserialize, Serialize};
use std::fmt;

/// A listing category, crawled with its own pagination sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Properties for sale
    Sale,

    /// Properties for rent
    Rent,
}

impl Category {
    /// Path segment appended to the search URL
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Sale => "for-sale",
            Self::Rent => "for-rent",
        }
    }

    /// Short lowercase name, as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rent => "rent",
        }
    }

    /// Whether index requests carry the `priceType` parameter
    pub fn needs_price_type(&self) -> bool {
        matches!(self, Self::Rent)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
