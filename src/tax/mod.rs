//! Danish interest deduction and cross-border property taxation

mod combined;
mod deduction;
mod foreign;

pub use combined::{combined_monthly_picture, CombinedMonthlyPicture};
pub use deduction::{
    interest_deduction, lifetime_deduction, monthly_deductions, yearly_deductions, YearlyDeduction,
};
pub use foreign::{
    analyze_foreign_property, CountryPreset, DebtCeiling, ForeignPropertyAnalysis,
    ForeignPropertyParams, CROSS_BORDER_TAX_NOTE, DEFAULT_DEBT_CEILING_MULTIPLIER,
    DEFAULT_DOMESTIC_MARGINAL_RATE, DEFAULT_FOREIGN_TAX_RATE, FOREIGN_INTEREST_DISCLAIMER,
    ITALY_TREATY_NOTE,
};
