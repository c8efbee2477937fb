//! One month of the domestic loan set against the foreign property income

use super::deduction::interest_deduction;
use super::foreign::ForeignPropertyAnalysis;
use crate::amortization::{round_to_cents, LoanAnalysisResult};
use crate::rates::DeductionRates;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CombinedMonthlyPicture {
    /// Month actually used after clamping into the schedule
    pub month: u32,
    /// Total payment on the domestic loan
    pub gross_cost: f64,
    /// Rentefradrag saving on that month's bond interest
    pub deduction_saving: f64,
    pub net_cost: f64,
    /// Foreign property income after all taxes, in DKK
    pub foreign_net_income: f64,
    /// Net loan cost minus foreign income; negative means net positive cash flow
    pub combined_net: f64,
}

/// Combined view for `month` (1-based). Out-of-range months are clamped to the
/// first or last row; an empty schedule yields zero loan figures.
pub fn combined_monthly_picture(
    loan: &LoanAnalysisResult,
    foreign: &ForeignPropertyAnalysis,
    month: u32,
    rates: &DeductionRates,
) -> CombinedMonthlyPicture {
    let foreign_net_income = foreign.net_monthly_domestic;

    let Some(last) = loan.schedule.len().checked_sub(1) else {
        return CombinedMonthlyPicture {
            month: 0,
            gross_cost: 0.0,
            deduction_saving: 0.0,
            net_cost: 0.0,
            foreign_net_income,
            combined_net: round_to_cents(-foreign_net_income),
        };
    };

    let idx = (month.max(1) as usize - 1).min(last);
    let row = &loan.schedule[idx];

    let deduction_saving =
        round_to_cents(interest_deduction(row.bond_interest * 12.0, rates) / 12.0);
    let net_cost = round_to_cents(row.total_payment - deduction_saving);

    CombinedMonthlyPicture {
        month: row.month,
        gross_cost: row.total_payment,
        deduction_saving,
        net_cost,
        foreign_net_income,
        combined_net: round_to_cents(net_cost - foreign_net_income),
    }
}
