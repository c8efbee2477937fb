//! Loan input structures and validation

mod config;

pub use config::{LoanConfiguration, LoanRequest, LoanShape, MAX_LTV};
