//! Company identity: symbol, sector and how wildly its price moves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Industry sector a company belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyCategory {
    Technology,
    Lifestyle,
    Infrastructure,
    Materials,
    Entertainment,
}

impl CompanyCategory {
    pub const ALL: [CompanyCategory; 5] = [
        CompanyCategory::Technology,
        CompanyCategory::Lifestyle,
        CompanyCategory::Infrastructure,
        CompanyCategory::Materials,
        CompanyCategory::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyCategory::Technology => "TECHNOLOGY",
            CompanyCategory::Lifestyle => "LIFESTYLE",
            CompanyCategory::Infrastructure => "INFRASTRUCTURE",
            CompanyCategory::Materials => "MATERIALS",
            CompanyCategory::Entertainment => "ENTERTAINMENT",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CompanyCategory::Technology => "Technology",
            CompanyCategory::Lifestyle => "Lifestyle",
            CompanyCategory::Infrastructure => "Infrastructure",
            CompanyCategory::Materials => "Materials",
            CompanyCategory::Entertainment => "Entertainment",
        }
    }
}

impl FromStr for CompanyCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s))
    }
}

impl fmt::Display for CompanyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

/// Volatility tier scaling a company's random daily move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    Low,
    Medium,
    High,
}

impl Volatility {
    pub fn multiplier(&self) -> f64 {
        match self {
            Volatility::Low => 0.5,
            Volatility::Medium => 1.0,
            Volatility::High => 1.8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Volatility::Low => "LOW",
            Volatility::Medium => "MEDIUM",
            Volatility::High => "HIGH",
        }
    }
}

impl FromStr for Volatility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Volatility::Low),
            "MEDIUM" => Ok(Volatility::Medium),
            "HIGH" => Ok(Volatility::High),
            _ => Err(anyhow::anyhow!("Unknown volatility: {}", s)),
        }
    }
}

/// A listed company. Loaded once at game start and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Ticker symbol (e.g., "CYBT")
    pub symbol: String,

    /// Display name
    pub name: String,

    pub category: CompanyCategory,

    /// One-line description for listings
    #[serde(default)]
    pub description: String,

    pub volatility: Volatility,

    #[serde(default)]
    pub has_dividend: bool,

    /// Player level at which the company becomes tradable
    pub unlock_level: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_ignores_case() {
        assert_eq!(
            "technology".parse::<CompanyCategory>().unwrap(),
            CompanyCategory::Technology
        );
        assert_eq!(
            "Materials".parse::<CompanyCategory>().unwrap(),
            CompanyCategory::Materials
        );
        assert!("finance".parse::<CompanyCategory>().is_err());
    }

    #[test]
    fn test_volatility_multiplier() {
        assert_eq!("high".parse::<Volatility>().unwrap().multiplier(), 1.8);
        assert_eq!(Volatility::Low.multiplier(), 0.5);
        assert!("extreme".parse::<Volatility>().is_err());
    }
}
