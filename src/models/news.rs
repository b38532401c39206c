//! News events and the price impact they carry.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Sentiment class of a news item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsType {
    Positive,
    Negative,
    Neutral,
    MarketWide,
}

impl NewsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsType::Positive => "POSITIVE",
            NewsType::Negative => "NEGATIVE",
            NewsType::Neutral => "NEUTRAL",
            NewsType::MarketWide => "MARKET_WIDE",
        }
    }

    pub fn default_impact(&self) -> MarketImpact {
        match self {
            NewsType::Positive => MarketImpact::positive(),
            NewsType::Negative => MarketImpact::negative(),
            NewsType::Neutral => MarketImpact::neutral(),
            NewsType::MarketWide => MarketImpact::new(-0.10, 0.10, 0.7),
        }
    }
}

/// Price impact of a news item: a fractional range applied with some probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketImpact {
    /// Lower bound of the fractional move (e.g., -0.15)
    pub min_change: f64,

    /// Upper bound of the fractional move (e.g., 0.30)
    pub max_change: f64,

    /// Chance the impact materialises (0.0 to 1.0)
    pub probability: f64,
}

impl MarketImpact {
    pub fn new(min_change: f64, max_change: f64, probability: f64) -> Self {
        Self {
            min_change,
            max_change,
            probability: probability.clamp(0.0, 1.0),
        }
    }

    pub fn positive() -> Self {
        Self::new(0.05, 0.15, 0.8)
    }

    pub fn negative() -> Self {
        Self::new(-0.15, -0.05, 0.8)
    }

    pub fn neutral() -> Self {
        Self::new(-0.03, 0.03, 0.5)
    }

    pub fn volatile() -> Self {
        Self::new(-0.25, 0.25, 0.9)
    }

    /// Scale the upside of the range, leaving any downside untouched.
    pub fn scale_upside(&self, multiplier: f64) -> Self {
        let scale = |v: f64| if v > 0.0 { v * multiplier } else { v };
        Self::new(
            scale(self.min_change),
            scale(self.max_change),
            self.probability,
        )
    }

    /// Resolve the impact: with `probability`, a uniform draw in
    /// `[min_change, max_change)`; otherwise zero.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if rng.random::<f64>() < self.probability {
            self.min_change + (self.max_change - self.min_change) * rng.random::<f64>()
        } else {
            0.0
        }
    }
}

/// A news item published on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Symbols whose price this news moves
    pub affected_companies: Vec<String>,

    pub impact: MarketImpact,
    pub news_type: NewsType,

    /// Seconds after midnight on `day`
    pub occurred_at: u32,

    pub day: u32,
}

impl NewsEvent {
    pub fn affects(&self, symbol: &str) -> bool {
        self.affected_companies.iter().any(|s| s == symbol)
    }

    /// In-day time as `HH:MM`.
    pub fn formatted_time(&self) -> String {
        let secs = self.occurred_at % 86_400;
        format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_resolve_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let impact = MarketImpact::new(-0.15, -0.05, 1.0);

        for _ in 0..200 {
            let v = impact.resolve(&mut rng);
            assert!((-0.15..=-0.05).contains(&v), "impact {} out of range", v);
        }
    }

    #[test]
    fn test_resolve_zero_probability_never_fires() {
        let mut rng = StdRng::seed_from_u64(7);
        let impact = MarketImpact::new(0.05, 0.15, 0.0);

        assert!((0..200).all(|_| impact.resolve(&mut rng) == 0.0));
    }

    #[test]
    fn test_scale_upside() {
        let scaled = MarketImpact::positive().scale_upside(1.5);
        assert!((scaled.min_change - 0.075).abs() < 1e-12);
        assert!((scaled.max_change - 0.225).abs() < 1e-12);

        let untouched = MarketImpact::negative().scale_upside(1.5);
        assert_eq!(untouched, MarketImpact::negative());

        let mixed = MarketImpact::neutral().scale_upside(0.7);
        assert_eq!(mixed.min_change, -0.03);
        assert!((mixed.max_change - 0.021).abs() < 1e-12);
    }

    #[test]
    fn test_formatted_time() {
        let event = NewsEvent {
            id: "n1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            affected_companies: vec!["CYBT".to_string()],
            impact: MarketImpact::positive(),
            news_type: NewsType::Positive,
            occurred_at: 14 * 3600 + 5 * 60,
            day: 2,
        };
        assert_eq!(event.formatted_time(), "14:05");
        assert!(event.affects("CYBT"));
        assert!(!event.affects("FOOD"));
    }
}
