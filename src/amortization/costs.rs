//! One-time origination costs
//!
//! Registration duty (flat + percentage), establishment fee, bond spread
//! (kursskæring) and the price discount when the bond sells below par.

use crate::rates::FeeSchedule;
use serde::{Deserialize, Serialize};

/// Itemised one-time costs at origination (DKK)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneTimeCosts {
    /// Tinglysningsafgift: flat + rate × principal
    pub registration: f64,
    pub establishment: f64,
    /// Kursskæring: spread rate × principal
    pub spread: f64,
    /// (100 − price)% of principal when the bond trades below par, otherwise 0
    pub price_discount: f64,
    pub total: f64,
}

impl OneTimeCosts {
    /// Cash actually received from the bond sale
    pub fn proceeds(principal: f64, market_price: f64) -> f64 {
        principal * market_price / 100.0
    }
}

/// Compute one-time costs for `principal` funded at `market_price` (percent of face value).
///
/// A premium bond (price above 100) earns no credit; the discount term is clamped at zero.
pub fn one_time_costs(principal: f64, market_price: f64, fees: &FeeSchedule) -> OneTimeCosts {
    let registration = fees.registration_flat + fees.registration_rate * principal;
    let establishment = fees.establishment_fee;
    let spread = fees.spread_rate * principal;
    let price_discount = ((100.0 - market_price) / 100.0 * principal).max(0.0);

    OneTimeCosts {
        registration,
        establishment,
        spread,
        price_discount,
        total: registration + establishment + spread + price_discount,
    }
}
