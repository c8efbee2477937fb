//! Loan request and validated loan configuration

use crate::error::ConfigurationError;
use crate::rates::{BidragssatsSchedule, LoanProduct, LtvBracket, RateTables};
use serde::{Deserialize, Serialize};

/// Regulatory LTV ceiling for mortgage-bond-funded loans
pub const MAX_LTV: f64 = 0.80;

/// Longest term a mortgage bond loan can run
pub const MAX_TERM_YEARS: u32 = 50;

/// Loan parameters as supplied by a caller, not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Market value of the property (DKK)
    pub property_value: f64,
    /// Principal being borrowed (DKK)
    pub principal: f64,
    /// Loan product key
    pub product: String,
    /// Total term in years
    pub term_years: u32,
    /// Interest-only years at the start (0 = pure annuity)
    #[serde(default)]
    pub io_years: u32,
    /// Lending institution key
    pub institution: String,
    /// Bond price as percent of face value; product default when absent
    #[serde(default)]
    pub market_price: Option<f64>,
}

/// A loan that has passed validation against a set of rate tables.
///
/// The only way to obtain one is [`LoanConfiguration::new`], so every
/// configuration reaching the engine satisfies the LTV, term and key checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanConfiguration {
    property_value: f64,
    principal: f64,
    product: LoanProduct,
    term_years: u32,
    io_years: u32,
    institution: String,
    bidragssats: BidragssatsSchedule,
    market_price: f64,
}

impl LoanConfiguration {
    /// Validate `request` and resolve its product and institution in `rates`
    pub fn new(request: LoanRequest, rates: &RateTables) -> Result<Self, ConfigurationError> {
        for (field, value) in [
            ("property_value", request.property_value),
            ("principal", request.principal),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigurationError::NonPositiveAmount { field, value });
            }
        }
        if request.term_years == 0 || request.term_years > MAX_TERM_YEARS {
            return Err(ConfigurationError::InvalidTerm {
                term_years: request.term_years,
                max: MAX_TERM_YEARS,
            });
        }
        if request.io_years >= request.term_years {
            return Err(ConfigurationError::InvalidInterestOnly {
                io_years: request.io_years,
                term_years: request.term_years,
            });
        }

        let product = rates
            .product(&request.product)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownProduct(request.product.clone()))?;
        let institution = rates
            .institution(&request.institution)
            .ok_or_else(|| ConfigurationError::UnknownInstitution(request.institution.clone()))?;

        let ltv = request.principal / request.property_value;
        if ltv > MAX_LTV {
            return Err(ConfigurationError::LtvTooHigh { ltv, max: MAX_LTV });
        }
        if !(ltv > 0.0) {
            return Err(ConfigurationError::NonPositiveAmount { field: "ltv", value: ltv });
        }

        let market_price = request.market_price.unwrap_or(product.default_price);
        if !market_price.is_finite() || market_price <= 0.0 {
            return Err(ConfigurationError::InvalidMarketPrice(market_price));
        }

        Ok(Self {
            property_value: request.property_value,
            principal: request.principal,
            product,
            term_years: request.term_years,
            io_years: request.io_years,
            bidragssats: institution.bidragssats.clone(),
            institution: request.institution,
            market_price,
        })
    }

    /// Same loan at a different institution
    pub fn with_institution(
        &self,
        institution: &str,
        rates: &RateTables,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            LoanRequest {
                institution: institution.to_string(),
                ..self.to_request()
            },
            rates,
        )
    }

    /// The request this configuration was built from, with the market price made explicit
    pub fn to_request(&self) -> LoanRequest {
        LoanRequest {
            property_value: self.property_value,
            principal: self.principal,
            product: self.product.id.clone(),
            term_years: self.term_years,
            io_years: self.io_years,
            institution: self.institution.clone(),
            market_price: Some(self.market_price),
        }
    }

    pub fn property_value(&self) -> f64 {
        self.property_value
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn product(&self) -> &LoanProduct {
        &self.product
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    pub fn io_years(&self) -> u32 {
        self.io_years
    }

    pub fn institution(&self) -> &str {
        &self.institution
    }

    pub fn bidragssats(&self) -> &BidragssatsSchedule {
        &self.bidragssats
    }

    pub fn market_price(&self) -> f64 {
        self.market_price
    }

    /// Loan-to-value at origination
    pub fn ltv(&self) -> f64 {
        self.principal / self.property_value
    }

    pub fn ltv_bracket(&self) -> LtvBracket {
        LtvBracket::for_ltv(self.ltv())
    }

    pub fn total_months(&self) -> u32 {
        self.term_years * 12
    }

    pub fn io_months(&self) -> u32 {
        self.io_years * 12
    }

    pub fn annuity_months(&self) -> u32 {
        self.total_months() - self.io_months()
    }
}

/// Loan parameters shared by every institution in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanShape {
    pub property_value: f64,
    pub principal: f64,
    pub product: String,
    pub term_years: u32,
    #[serde(default)]
    pub io_years: u32,
    #[serde(default)]
    pub market_price: Option<f64>,
}

impl LoanShape {
    /// Request for this shape at one institution
    pub fn for_institution(&self, institution: &str) -> LoanRequest {
        LoanRequest {
            property_value: self.property_value,
            principal: self.principal,
            product: self.product.clone(),
            term_years: self.term_years,
            io_years: self.io_years,
            institution: institution.to_string(),
            market_price: self.market_price,
        }
    }
}

impl From<&LoanRequest> for LoanShape {
    fn from(request: &LoanRequest) -> Self {
        Self {
            property_value: request.property_value,
            principal: request.principal,
            product: request.product.clone(),
            term_years: request.term_years,
            io_years: request.io_years,
            market_price: request.market_price,
        }
    }
}
