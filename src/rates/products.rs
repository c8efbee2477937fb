//! Loan products: bond coupon rate and default market price (kurs)

use serde::{Deserialize, Serialize};

/// A mortgage-bond-funded loan product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    /// Product key, e.g. "fixed_30y" or "F5"
    pub id: String,

    /// Annual coupon rate of the underlying bond
    pub annual_rate: f64,

    /// Default bond market price as percent of face value
    pub default_price: f64,
}

impl LoanProduct {
    pub fn new(id: impl Into<String>, annual_rate: f64, default_price: f64) -> Self {
        Self {
            id: id.into(),
            annual_rate,
            default_price,
        }
    }

    /// Monthly bond rate used by the amortization engine
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }

    /// Products quoted February 2026
    pub fn february_2026() -> Vec<Self> {
        vec![
            Self::new("fixed_30y", 0.0400, 98.0), // 4% coupon at slight discount
            Self::new("F1", 0.0233, 99.5),
            Self::new("F3", 0.0242, 99.2),
            Self::new("F5", 0.0266, 98.8),
        ]
    }
}
