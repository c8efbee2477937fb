//! Danish rentefradrag on mortgage bond interest
//!
//! Only bond interest is deductible. Bidragssats is a fee, never interest,
//! and is excluded everywhere in this module.

use crate::amortization::{round_to_cents, LoanAnalysisResult};
use crate::rates::DeductionRates;
use serde::Serialize;

/// Tax saving on `annual_bond_interest` under the two-tier deduction
pub fn interest_deduction(annual_bond_interest: f64, rates: &DeductionRates) -> f64 {
    let interest = annual_bond_interest.max(0.0);
    let low_portion = interest.min(rates.threshold);
    let high_portion = (interest - rates.threshold).max(0.0);

    round_to_cents(low_portion * rates.low_rate + high_portion * rates.high_rate)
}

/// Monthly tax saving for each row of the schedule.
///
/// Each month's bond interest is annualized (×12) for the threshold and the
/// resulting saving divided by 12. Actual filing is annual.
pub fn monthly_deductions(result: &LoanAnalysisResult, rates: &DeductionRates) -> Vec<f64> {
    result
        .schedule
        .iter()
        .map(|row| round_to_cents(interest_deduction(row.bond_interest * 12.0, rates) / 12.0))
        .collect()
}

/// Bond interest and tax saving for one loan year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyDeduction {
    /// Loan year (1-based)
    pub year: u32,
    pub bond_interest: f64,
    pub saving: f64,
}

/// Deduction per loan year, from the actual interest paid in each 12-month block
pub fn yearly_deductions(
    result: &LoanAnalysisResult,
    rates: &DeductionRates,
) -> Vec<YearlyDeduction> {
    result
        .schedule
        .chunks(12)
        .enumerate()
        .map(|(idx, rows)| {
            // Deduction on the raw sum; only the reported interest is rounded
            let bond_interest: f64 = rows.iter().map(|r| r.bond_interest).sum();
            YearlyDeduction {
                year: idx as u32 + 1,
                bond_interest: round_to_cents(bond_interest),
                saving: interest_deduction(bond_interest, rates),
            }
        })
        .collect()
}

/// Sum of the yearly savings over the whole term
pub fn lifetime_deduction(result: &LoanAnalysisResult, rates: &DeductionRates) -> f64 {
    round_to_cents(yearly_deductions(result, rates).iter().map(|y| y.saving).sum())
}
