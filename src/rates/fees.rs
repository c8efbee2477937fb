//! One-time origination fees and interest-deduction rates

use serde::{Deserialize, Serialize};

/// Fees charged once when the loan is established
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Tinglysningsafgift, fixed portion (DKK)
    pub registration_flat: f64,
    /// Tinglysningsafgift, share of principal
    pub registration_rate: f64,
    /// Establishment/origination fee (DKK)
    pub establishment_fee: f64,
    /// Kursskæring: bond sell/buy spread, share of principal
    pub spread_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            registration_flat: 1_850.0,
            registration_rate: 0.0145,
            establishment_fee: 5_000.0,
            spread_rate: 0.0050,
        }
    }
}

/// Two-tier rentefradrag on bond interest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeductionRates {
    /// Rate on annual interest up to `threshold`
    pub low_rate: f64,
    /// Rate on annual interest above `threshold`
    pub high_rate: f64,
    /// Annual threshold (DKK)
    pub threshold: f64,
}

impl Default for DeductionRates {
    fn default() -> Self {
        Self {
            low_rate: 0.33,
            high_rate: 0.25,
            threshold: 50_000.0,
        }
    }
}
