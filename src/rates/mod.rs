//! Rate tables: bond rates, bidragssats, market prices, fees, tax constants
//!
//! Rate tables are plain data. They are built once (from the built-in
//! February 2026 quotes or from CSV files) and passed explicitly to every
//! component that needs a lookup.

mod bidragssats;
mod fees;
mod products;
pub mod loader;

pub use bidragssats::{BidragssatsEntry, BidragssatsSchedule, Institution, LtvBracket};
pub use fees::{DeductionRates, FeeSchedule};
pub use loader::LoadedRates;
pub use products::LoanProduct;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rate data older than this many days is flagged as aging
pub const AGING_AFTER_DAYS: i64 = 30;

/// Rate data older than this many days is flagged as stale
pub const STALE_AFTER_DAYS: i64 = 90;

/// Fixed EUR/DKK peg
pub const EUR_DKK_PEG: f64 = 7.46;

/// How old the rate data is relative to a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Staleness {
    Fresh,
    Aging { days: i64 },
    Stale { days: i64 },
}

/// Container for all rate data used by the calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTables {
    /// Date the quotes were collected
    pub as_of: NaiveDate,
    /// Loan products in presentation order
    pub products: Vec<LoanProduct>,
    /// Institutions in comparison order
    pub institutions: Vec<Institution>,
    pub fees: FeeSchedule,
    pub deduction: DeductionRates,
    /// EUR/DKK conversion rate
    pub eur_dkk: f64,
}

impl RateTables {
    /// Built-in quotes as of 2026-02-01
    pub fn february_2026() -> Self {
        Self {
            as_of: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap_or_default(),
            products: LoanProduct::february_2026(),
            institutions: Institution::february_2026(),
            fees: FeeSchedule::default(),
            deduction: DeductionRates::default(),
            eur_dkk: EUR_DKK_PEG,
        }
    }

    /// Load rate tables from CSV files in the default location (data/rates/)
    pub fn from_csv() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_csv_path(Path::new(loader::DEFAULT_RATES_PATH))
    }

    /// Load rate tables from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let loaded = LoadedRates::load_from(path)?;

        Ok(Self {
            as_of: loaded.as_of,
            products: loaded.products,
            institutions: loaded.institutions,
            fees: loaded.fees,
            deduction: loaded.deduction,
            eur_dkk: loaded.eur_dkk,
        })
    }

    pub fn product(&self, id: &str) -> Option<&LoanProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn institution(&self, id: &str) -> Option<&Institution> {
        self.institutions.iter().find(|i| i.id == id)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.id.as_str())
    }

    pub fn institution_ids(&self) -> impl Iterator<Item = &str> {
        self.institutions.iter().map(|i| i.id.as_str())
    }

    /// Age of the rate data on `today`
    pub fn staleness(&self, today: NaiveDate) -> Staleness {
        let days = (today - self.as_of).num_days();
        if days > STALE_AFTER_DAYS {
            Staleness::Stale { days }
        } else if days > AGING_AFTER_DAYS {
            Staleness::Aging { days }
        } else {
            Staleness::Fresh
        }
    }
}

impl Default for RateTables {
    fn default() -> Self {
        Self::february_2026()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lookups() {
        let rates = RateTables::february_2026();

        assert_eq!(rates.product("F5").map(|p| p.annual_rate), Some(0.0266));
        assert!(rates.product("F10").is_none());
        assert!(rates.institution("Nykredit").is_some());
        assert!(rates.institution("nykredit").is_none());
        assert_eq!(rates.institution_ids().count(), 5);
    }

    #[test]
    fn test_staleness_thresholds() {
        let rates = RateTables::february_2026();

        assert_eq!(rates.staleness(day(2026, 2, 1)), Staleness::Fresh);
        assert_eq!(rates.staleness(day(2026, 3, 3)), Staleness::Fresh); // 30 days
        assert_eq!(rates.staleness(day(2026, 3, 4)), Staleness::Aging { days: 31 });
        assert_eq!(rates.staleness(day(2026, 5, 2)), Staleness::Aging { days: 90 });
        assert_eq!(rates.staleness(day(2026, 5, 3)), Staleness::Stale { days: 91 });
    }
}
