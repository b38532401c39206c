//! Daily news generation from a curated pool of sector and market headlines.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

use crate::config::GameConfig;
use crate::models::{Company, CompanyCategory, Difficulty, MarketImpact, NewsEvent, NewsType};

/// Earliest in-day publication time (09:00).
const MARKET_OPEN_SECS: u32 = 9 * 3600;

/// Latest in-day publication time (15:00).
const MARKET_CLOSE_SECS: u32 = 15 * 3600;

/// Which companies a headline moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsScope {
    MarketWide,
    Sector(CompanyCategory),
}

/// A headline in the pool.
#[derive(Debug, Clone)]
pub struct NewsTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub scope: NewsScope,
    pub news_type: NewsType,
    pub impact: MarketImpact,
}

impl NewsTemplate {
    fn affected_symbols(&self, companies: &[Company]) -> Vec<String> {
        companies
            .iter()
            .filter(|c| match self.scope {
                NewsScope::MarketWide => true,
                NewsScope::Sector(category) => c.category == category,
            })
            .map(|c| c.symbol.clone())
            .collect()
    }
}

/// Samples each day's headlines.
#[derive(Debug, Clone)]
pub struct NewsGenerator {
    pool: Vec<NewsTemplate>,
    min_per_day: usize,
    max_per_day: usize,
}

impl NewsGenerator {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_pool(
            standard_pool(),
            config.min_news_per_day,
            config.max_news_per_day,
        )
    }

    pub fn with_pool(pool: Vec<NewsTemplate>, min_per_day: usize, max_per_day: usize) -> Self {
        Self {
            pool,
            min_per_day,
            max_per_day: max_per_day.max(min_per_day),
        }
    }

    /// Headlines for `day`, sorted by publication time.
    ///
    /// Only headlines that touch at least one listed company are eligible.
    /// Upside of every impact range is scaled by the difficulty's
    /// positive-news multiplier.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        day: u32,
        companies: &[Company],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Vec<NewsEvent> {
        let eligible: Vec<(&NewsTemplate, Vec<String>)> = self
            .pool
            .iter()
            .map(|t| (t, t.affected_symbols(companies)))
            .filter(|(_, symbols)| !symbols.is_empty())
            .collect();

        if eligible.is_empty() {
            return Vec::new();
        }

        let count = rng
            .random_range(self.min_per_day..=self.max_per_day)
            .min(eligible.len());
        let multiplier = difficulty.positive_news_multiplier();

        let mut events: Vec<NewsEvent> = eligible
            .choose_multiple(rng, count)
            .map(|(template, symbols)| NewsEvent {
                id: format!("news_{}_{}", day, uuid::Uuid::new_v4().simple()),
                title: template.title.to_string(),
                description: template.description.to_string(),
                affected_companies: symbols.clone(),
                impact: template.impact.scale_upside(multiplier),
                news_type: template.news_type,
                occurred_at: 0,
                day,
            })
            .collect();

        for event in &mut events {
            event.occurred_at = rng.random_range(MARKET_OPEN_SECS..=MARKET_CLOSE_SECS);
        }
        events.sort_by_key(|e| e.occurred_at);

        debug!(day = day, count = events.len(), "Generated news");
        events
    }
}

/// The built-in headline pool.
pub fn standard_pool() -> Vec<NewsTemplate> {
    use CompanyCategory::*;
    use NewsScope::*;

    vec![
        // Market-wide
        NewsTemplate {
            title: "Central bank holds rates steady",
            description: "Policy unchanged; markets digest the guidance.",
            scope: MarketWide,
            news_type: NewsType::MarketWide,
            impact: NewsType::MarketWide.default_impact(),
        },
        NewsTemplate {
            title: "Surprise rate cut lifts equities",
            description: "Cheaper money sends buyers back into stocks.",
            scope: MarketWide,
            news_type: NewsType::Positive,
            impact: MarketImpact::new(0.02, 0.08, 0.8),
        },
        NewsTemplate {
            title: "Global recession fears spread",
            description: "Weak factory data rattles investors worldwide.",
            scope: MarketWide,
            news_type: NewsType::Negative,
            impact: MarketImpact::new(-0.08, -0.02, 0.8),
        },
        NewsTemplate {
            title: "Yen swings sharply overnight",
            description: "Currency volatility whipsaws exporters and importers alike.",
            scope: MarketWide,
            news_type: NewsType::MarketWide,
            impact: MarketImpact::volatile(),
        },
        // Technology
        NewsTemplate {
            title: "AI chip demand hits record",
            description: "Data-center orders outstrip supply for a third quarter.",
            scope: Sector(Technology),
            news_type: NewsType::Positive,
            impact: MarketImpact::positive(),
        },
        NewsTemplate {
            title: "Major data breach under investigation",
            description: "Regulators investigate a leak affecting millions of accounts.",
            scope: Sector(Technology),
            news_type: NewsType::Negative,
            impact: MarketImpact::negative(),
        },
        // Lifestyle
        NewsTemplate {
            title: "Consumer spending beats forecasts",
            description: "Holiday sales come in well above expectations.",
            scope: Sector(Lifestyle),
            news_type: NewsType::Positive,
            impact: MarketImpact::positive(),
        },
        NewsTemplate {
            title: "Food prices climb on poor harvest",
            description: "Input costs squeeze margins across retail and food.",
            scope: Sector(Lifestyle),
            news_type: NewsType::Negative,
            impact: MarketImpact::new(-0.10, -0.03, 0.7),
        },
        // Infrastructure
        NewsTemplate {
            title: "Government unveils infrastructure package",
            description: "A multi-year spending plan targets power grids and hospitals.",
            scope: Sector(Infrastructure),
            news_type: NewsType::Positive,
            impact: MarketImpact::positive(),
        },
        NewsTemplate {
            title: "Utility regulator reviews tariffs",
            description: "Analysts split on whether the outcome helps or hurts.",
            scope: Sector(Infrastructure),
            news_type: NewsType::Neutral,
            impact: MarketImpact::neutral(),
        },
        // Materials
        NewsTemplate {
            title: "Construction boom drives steel orders",
            description: "Order books are full through next year.",
            scope: Sector(Materials),
            news_type: NewsType::Positive,
            impact: MarketImpact::new(0.04, 0.12, 0.8),
        },
        NewsTemplate {
            title: "Chemical plant accident halts output",
            description: "Production suspended pending a safety inspection.",
            scope: Sector(Materials),
            news_type: NewsType::Negative,
            impact: MarketImpact::negative(),
        },
        // Entertainment
        NewsTemplate {
            title: "Blockbuster release breaks sales records",
            description: "Launch-week numbers beat every analyst estimate.",
            scope: Sector(Entertainment),
            news_type: NewsType::Positive,
            impact: MarketImpact::new(0.08, 0.25, 0.7),
        },
        NewsTemplate {
            title: "Star player injury shakes the league",
            description: "Broadcast and merchandise revenue outlook uncertain.",
            scope: Sector(Entertainment),
            news_type: NewsType::Neutral,
            impact: MarketImpact::new(-0.06, 0.04, 0.6),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Roster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generates_two_to_four_sorted_items() {
        let generator = NewsGenerator::new(&GameConfig::default());
        let companies = Roster::standard().companies();
        let mut rng = StdRng::seed_from_u64(17);

        for day in 1..=50 {
            let news = generator.generate(day, &companies, Difficulty::Normal, &mut rng);
            assert!((2..=4).contains(&news.len()), "got {} items", news.len());
            assert!(news
                .windows(2)
                .all(|w| w[0].occurred_at <= w[1].occurred_at));
            assert!(news.iter().all(|n| n.day == day));
            assert!(news
                .iter()
                .all(|n| (MARKET_OPEN_SECS..=MARKET_CLOSE_SECS).contains(&n.occurred_at)));

            // No headline twice in one day
            let mut titles: Vec<_> = news.iter().map(|n| n.title.as_str()).collect();
            titles.sort();
            titles.dedup();
            assert_eq!(titles.len(), news.len());
        }
    }

    #[test]
    fn test_scopes_pick_the_right_companies() {
        let companies = Roster::standard().companies();
        let pool = standard_pool();

        let market = pool
            .iter()
            .find(|t| t.scope == NewsScope::MarketWide)
            .unwrap();
        assert_eq!(market.affected_symbols(&companies).len(), companies.len());

        let tech = pool
            .iter()
            .find(|t| t.scope == NewsScope::Sector(CompanyCategory::Technology))
            .unwrap();
        let mut symbols = tech.affected_symbols(&companies);
        symbols.sort();
        assert_eq!(symbols, vec!["CYBT".to_string(), "DGTL".to_string()]);
    }

    #[test]
    fn test_sectors_without_companies_are_skipped() {
        let companies: Vec<Company> = Roster::standard()
            .companies()
            .into_iter()
            .filter(|c| c.category == CompanyCategory::Materials)
            .collect();
        let pool: Vec<NewsTemplate> = standard_pool()
            .into_iter()
            .filter(|t| t.scope != NewsScope::MarketWide)
            .collect();
        let generator = NewsGenerator::with_pool(pool, 4, 4);
        let mut rng = StdRng::seed_from_u64(2);

        let news = generator.generate(1, &companies, Difficulty::Normal, &mut rng);
        // Only the two materials headlines can apply
        assert_eq!(news.len(), 2);
        for event in &news {
            assert!(event.affects("MTRL") && event.affects("CHMC"));
        }
    }

    #[test]
    fn test_difficulty_scales_good_news() {
        let companies = Roster::standard().companies();
        let pool: Vec<NewsTemplate> = standard_pool()
            .into_iter()
            .filter(|t| t.title == "AI chip demand hits record")
            .collect();
        let generator = NewsGenerator::with_pool(pool, 1, 1);

        let mut rng = StdRng::seed_from_u64(1);
        let easy = generator.generate(1, &companies, Difficulty::Easy, &mut rng);
        let mut rng = StdRng::seed_from_u64(1);
        let hard = generator.generate(1, &companies, Difficulty::Hard, &mut rng);

        assert!((easy[0].impact.max_change - 0.225).abs() < 1e-9);
        assert!((hard[0].impact.max_change - 0.105).abs() < 1e-9);
    }
}
