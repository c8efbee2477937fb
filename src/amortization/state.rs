//! Running state while building a schedule

use crate::loan::LoanConfiguration;

/// Position of the schedule builder within the loan term
#[derive(Debug, Clone)]
pub struct AmortizationState {
    /// Current month (1-indexed, 0 before the first month)
    pub month: u32,

    /// Outstanding balance at the start of the current month
    pub balance: f64,

    /// Whether the current month falls in the interest-only window
    pub interest_only: bool,

    io_months: u32,
}

impl AmortizationState {
    /// State before month 1
    pub fn from_config(config: &LoanConfiguration) -> Self {
        Self {
            month: 0,
            balance: config.principal(),
            interest_only: config.io_months() > 0,
            io_months: config.io_months(),
        }
    }

    /// Move to the next month
    pub fn advance_month(&mut self) {
        self.month += 1;
        self.interest_only = self.month <= self.io_months;
    }

    /// Apply this month's principal repayment to the balance
    pub fn repay(&mut self, principal: f64) {
        self.balance = super::round_to_cents(self.balance - principal);
    }
}
