//! Realkredit - Danish mortgage-bond loan calculator
//!
//! This library provides:
//! - Versioned rate tables (bond rates, bidragssats, fees, deduction rates)
//! - Month-by-month amortization with interest-only periods
//! - One-time cost aggregation and the ÅOP effective annual cost rate
//! - Institution comparison ranked by lifetime cost, with switching breakeven
//! - Rentefradrag and cross-border rental property taxation

pub mod error;
pub mod rates;
pub mod loan;
pub mod amortization;
pub mod comparison;
pub mod tax;

// Re-export commonly used types
pub use error::ConfigurationError;
pub use rates::{RateTables, Staleness};
pub use loan::{LoanConfiguration, LoanRequest, LoanShape};
pub use amortization::{AmortizationEngine, LoanAnalysisResult, MonthlyBreakdown};
pub use comparison::{Analyzer, Breakeven, RankedResult};
pub use tax::{CountryPreset, ForeignPropertyAnalysis, ForeignPropertyParams};
