//! The fixed universe of listed companies and their reference prices.

use rand::Rng;
use rust_decimal::Decimal;

use crate::models::{Company, CompanyCategory, Money, Stock, Volatility};

/// A company together with the price it lists around.
#[derive(Debug, Clone)]
pub struct Listing {
    pub company: Company,
    pub base_price: Money,
}

/// Ordered list of every company in the game. The first entries are the ones
/// tradable from day one.
#[derive(Debug, Clone)]
pub struct Roster {
    listings: Vec<Listing>,
}

impl Roster {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// The ten built-in companies.
    pub fn standard() -> Self {
        use CompanyCategory::*;
        use Volatility::*;

        let listings = [
            (
                "CYBT",
                "Cybertron Systems",
                Technology,
                "Cloud security and network appliances",
                High,
                false,
                1,
                1000,
            ),
            (
                "FOOD",
                "Harvest Foods",
                Lifestyle,
                "Packaged food and convenience stores",
                Low,
                true,
                1,
                800,
            ),
            (
                "RETL",
                "Metro Retail",
                Lifestyle,
                "Department stores and online shopping",
                Medium,
                true,
                1,
                1100,
            ),
            (
                "MTRL",
                "Ironclad Materials",
                Materials,
                "Steel and construction materials",
                Medium,
                true,
                1,
                950,
            ),
            (
                "ENTM",
                "Pixel Entertainment",
                Entertainment,
                "Console and mobile game publisher",
                High,
                false,
                1,
                780,
            ),
            (
                "ENGY",
                "Coastal Energy",
                Infrastructure,
                "Power generation and utilities",
                Low,
                true,
                1,
                1500,
            ),
            (
                "DGTL",
                "Digital Frontier",
                Technology,
                "Semiconductors and AI accelerators",
                High,
                false,
                2,
                1800,
            ),
            (
                "MDCL",
                "Meridian Medical",
                Infrastructure,
                "Hospitals and medical devices",
                Medium,
                true,
                2,
                2200,
            ),
            (
                "CHMC",
                "Nova Chemicals",
                Materials,
                "Specialty chemicals and battery materials",
                Medium,
                true,
                3,
                1350,
            ),
            (
                "SPRT",
                "Arena Sports",
                Entertainment,
                "Sports clubs and broadcasting rights",
                High,
                false,
                3,
                920,
            ),
        ]
        .into_iter()
        .map(|(symbol, name, category, about, volatility, dividend, level, base)| Listing {
            company: Company {
                symbol: symbol.to_string(),
                name: name.to_string(),
                category,
                description: about.to_string(),
                volatility,
                has_dividend: dividend,
                unlock_level: level,
            },
            base_price: Money::from_yen(base),
        })
        .collect();

        Self::new(listings)
    }

    #[cfg(test)]
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    #[cfg(test)]
    pub fn companies(&self) -> Vec<Company> {
        self.listings().iter().map(|l| l.company.clone()).collect()
    }

    /// Symbols of the first `count` listings.
    pub fn initial_symbols(&self, count: usize) -> Vec<String> {
        self.listings
            .iter()
            .take(count)
            .map(|l| l.company.symbol.clone())
            .collect()
    }

    /// List every company at its base price times a uniform factor in
    /// `[1 - spread, 1 + spread]`.
    pub fn list_stocks<R: Rng + ?Sized>(
        &self,
        spread: f64,
        timestamp: i64,
        rng: &mut R,
    ) -> Vec<Stock> {
        self.listings
            .iter()
            .map(|listing| {
                let factor = 1.0 + rng.random_range(-spread..=spread);
                let factor = Decimal::try_from(factor)
                    .unwrap_or(Decimal::ONE)
                    .round_dp(6);
                let price = (listing.base_price * factor).amount().round_dp(2);
                Stock::listed(listing.company.clone(), Money::new(price), timestamp)
            })
            .collect()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}
