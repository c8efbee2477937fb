//! Bidragssats (contribution fee) schedules by institution and LTV bracket
//!
//! The fee is an annual percentage of the outstanding balance, charged monthly.
//! Each institution quotes a rate per LTV bracket for annuity loans plus an
//! extra premium that applies while the loan is interest-only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// LTV bracket used for the bidragssats lookup (inclusive lower bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LtvBracket {
    /// LTV below 40%
    Low,
    /// 40% up to (not including) 60%
    Mid,
    /// 60% and above
    High,
}

impl LtvBracket {
    pub const ALL: [LtvBracket; 3] = [LtvBracket::Low, LtvBracket::Mid, LtvBracket::High];

    /// Bracket for a loan-to-value ratio
    pub fn for_ltv(ltv: f64) -> Self {
        if ltv >= 0.60 {
            LtvBracket::High
        } else if ltv >= 0.40 {
            LtvBracket::Mid
        } else {
            LtvBracket::Low
        }
    }

    /// Key used in rate files
    pub fn key(&self) -> &'static str {
        match self {
            LtvBracket::Low => "0-40",
            LtvBracket::Mid => "40-60",
            LtvBracket::High => "60-80",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }
}

impl fmt::Display for LtvBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.key())
    }
}

/// Rates for one institution in one bracket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidragssatsEntry {
    /// Annual rate during the annuity phase
    pub annuity: f64,
    /// Added on top of `annuity` during interest-only months
    pub io_premium: f64,
}

impl BidragssatsEntry {
    pub const fn new(annuity: f64, io_premium: f64) -> Self {
        Self { annuity, io_premium }
    }

    pub fn annual_rate(&self, interest_only: bool) -> f64 {
        if interest_only {
            self.annuity + self.io_premium
        } else {
            self.annuity
        }
    }
}

/// Bidragssats schedule for one institution across all brackets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidragssatsSchedule {
    pub low: BidragssatsEntry,
    pub mid: BidragssatsEntry,
    pub high: BidragssatsEntry,
}

impl BidragssatsSchedule {
    pub fn entry(&self, bracket: LtvBracket) -> &BidragssatsEntry {
        match bracket {
            LtvBracket::Low => &self.low,
            LtvBracket::Mid => &self.mid,
            LtvBracket::High => &self.high,
        }
    }

    /// Effective annual rate for a loan at `ltv`, with the IO premium when `interest_only`
    pub fn effective_rate(&self, ltv: f64, interest_only: bool) -> f64 {
        self.entry(LtvBracket::for_ltv(ltv)).annual_rate(interest_only)
    }
}

/// A lending institution and its fee schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: String,
    pub bidragssats: BidragssatsSchedule,
}

impl Institution {
    pub fn new(id: impl Into<String>, bidragssats: BidragssatsSchedule) -> Self {
        Self {
            id: id.into(),
            bidragssats,
        }
    }

    /// Institutions and schedules quoted February 2026
    pub fn february_2026() -> Vec<Self> {
        let e = BidragssatsEntry::new;
        let inst = |id: &str, low, mid, high| {
            Self::new(id, BidragssatsSchedule { low, mid, high })
        };
        vec![
            inst("Totalkredit", e(0.0040, 0.0004), e(0.0065, 0.0006), e(0.0090, 0.0010)),
            inst("Nykredit", e(0.0044, 0.0005), e(0.0070, 0.0007), e(0.0095, 0.0011)),
            inst("Realkredit Danmark", e(0.0042, 0.0004), e(0.0068, 0.0006), e(0.0092, 0.0010)),
            inst("BRFkredit", e(0.0045, 0.0005), e(0.0072, 0.0007), e(0.0097, 0.0012)),
            inst("Nordea Kredit", e(0.0043, 0.0005), e(0.0069, 0.0007), e(0.0093, 0.0011)),
        ]
    }
}
