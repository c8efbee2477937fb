//! Foreign rental property P&L with credit-method cross-border tax
//!
//! One computation covers every country. Country specifics (currency, default
//! tax rate, exchange rate, treaty wording) live in a [`CountryPreset`].

use crate::amortization::round_to_cents;
use crate::error::ConfigurationError;
use crate::rates::EUR_DKK_PEG;
use serde::{Deserialize, Serialize};

/// Default effective foreign tax on rental income
pub const DEFAULT_FOREIGN_TAX_RATE: f64 = 0.21;

/// Default Danish marginal tax rate
pub const DEFAULT_DOMESTIC_MARGINAL_RATE: f64 = 0.42;

/// Default debt ceiling as a multiple of annual gross income
pub const DEFAULT_DEBT_CEILING_MULTIPLIER: f64 = 3.5;

pub const CROSS_BORDER_TAX_NOTE: &str = "Cross-border rental income is taxed first in the country \
where the property is located. Denmark taxes the same income under the credit method: the foreign \
tax is credited against the Danish tax, so the combined rate equals the higher of the two rates \
and the same income is never taxed twice. Check the applicable double-taxation treaty for the \
method that actually applies to you.";

pub const ITALY_TREATY_NOTE: &str = "Denmark-Italy tax treaty (1999), Article 6: income from \
immovable property may be taxed in Italy, where the property is situated. Any Danish top-up \
shown here assumes the credit method; under exemption with progression the Italian income is \
exempt in Denmark but can raise the marginal rate on other income.";

pub const FOREIGN_INTEREST_DISCLAIMER: &str = "Whether interest on a foreign mortgage is \
deductible under Danish rentefradrag rules is uncertain and is NOT applied automatically. \
Consult a Danish tax adviser before claiming it.";

/// Country-specific defaults for a foreign property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryPreset {
    pub name: String,
    /// ISO currency code of the property's country
    pub currency: String,
    pub foreign_tax_rate: f64,
    /// 1 unit of foreign currency in DKK. `None` follows the EUR peg of
    /// the rate tables in use.
    #[serde(default)]
    pub currency_to_domestic: Option<f64>,
    pub tax_note: String,
    pub disclaimer: String,
}

impl CountryPreset {
    /// Euro-area property with no treaty-specific wording
    pub fn generic() -> Self {
        Self {
            name: "Foreign".to_string(),
            currency: "EUR".to_string(),
            foreign_tax_rate: DEFAULT_FOREIGN_TAX_RATE,
            currency_to_domestic: None,
            tax_note: CROSS_BORDER_TAX_NOTE.to_string(),
            disclaimer: FOREIGN_INTEREST_DISCLAIMER.to_string(),
        }
    }

    /// Italian rental property taxed under cedolare secca (21%)
    pub fn italy() -> Self {
        Self {
            name: "Italy".to_string(),
            tax_note: format!("{} {}", ITALY_TREATY_NOTE, CROSS_BORDER_TAX_NOTE),
            ..Self::generic()
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "generic" | "foreign" => Some(Self::generic()),
            "italy" | "it" => Some(Self::italy()),
            _ => None,
        }
    }
}

fn default_domestic_marginal_rate() -> f64 {
    DEFAULT_DOMESTIC_MARGINAL_RATE
}

fn default_debt_ceiling_multiplier() -> f64 {
    DEFAULT_DEBT_CEILING_MULTIPLIER
}

/// Inputs for the foreign property analysis. Monetary amounts are monthly
/// and in the foreign currency unless the name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignPropertyParams {
    pub property_value: f64,
    pub monthly_rental_income: f64,
    /// Operating expenses (maintenance, insurance, ...)
    pub monthly_expenses: f64,
    #[serde(default)]
    pub mortgage_balance: f64,
    /// Annual rate on the foreign mortgage
    #[serde(default)]
    pub mortgage_rate: f64,
    #[serde(default = "default_domestic_marginal_rate")]
    pub domestic_marginal_rate: f64,
    /// Annual gross income in DKK, 0 when unknown
    #[serde(default)]
    pub annual_gross_income: f64,
    #[serde(default = "default_debt_ceiling_multiplier")]
    pub debt_ceiling_multiplier: f64,
    #[serde(default = "CountryPreset::generic")]
    pub country: CountryPreset,
}

impl ForeignPropertyParams {
    /// Property without mortgage or income data, using the generic preset
    pub fn new(property_value: f64, monthly_rental_income: f64, monthly_expenses: f64) -> Self {
        Self::from_preset(
            CountryPreset::generic(),
            property_value,
            monthly_rental_income,
            monthly_expenses,
        )
    }

    pub fn from_preset(
        country: CountryPreset,
        property_value: f64,
        monthly_rental_income: f64,
        monthly_expenses: f64,
    ) -> Self {
        Self {
            property_value,
            monthly_rental_income,
            monthly_expenses,
            mortgage_balance: 0.0,
            mortgage_rate: 0.0,
            domestic_marginal_rate: DEFAULT_DOMESTIC_MARGINAL_RATE,
            annual_gross_income: 0.0,
            debt_ceiling_multiplier: DEFAULT_DEBT_CEILING_MULTIPLIER,
            country,
        }
    }

    pub fn with_mortgage(mut self, balance: f64, annual_rate: f64) -> Self {
        self.mortgage_balance = balance;
        self.mortgage_rate = annual_rate;
        self
    }

    pub fn with_income(mut self, annual_gross_income: f64, debt_ceiling_multiplier: f64) -> Self {
        self.annual_gross_income = annual_gross_income;
        self.debt_ceiling_multiplier = debt_ceiling_multiplier;
        self
    }

    pub fn foreign_tax_rate(&self) -> f64 {
        self.country.foreign_tax_rate
    }

    /// Exchange rate in use; the built-in EUR peg unless the preset fixes one
    pub fn currency_to_domestic(&self) -> f64 {
        self.country.currency_to_domestic.unwrap_or(EUR_DKK_PEG)
    }

    /// Use `eur_dkk` as the exchange rate unless the preset already fixes one
    pub fn with_default_peg(mut self, eur_dkk: f64) -> Self {
        self.country.currency_to_domestic.get_or_insert(eur_dkk);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let amounts = [
            ("property_value", self.property_value),
            ("monthly_rental_income", self.monthly_rental_income),
            ("monthly_expenses", self.monthly_expenses),
            ("mortgage_balance", self.mortgage_balance),
            ("annual_gross_income", self.annual_gross_income),
            ("debt_ceiling_multiplier", self.debt_ceiling_multiplier),
        ];
        for (field, value) in amounts {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigurationError::NegativeAmount { field, value });
            }
        }

        let rates = [
            ("mortgage_rate", self.mortgage_rate),
            ("foreign_tax_rate", self.foreign_tax_rate()),
            ("domestic_marginal_rate", self.domestic_marginal_rate),
        ];
        for (field, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::InvalidRate { field, value });
            }
        }

        let fx = self.currency_to_domestic();
        if !(fx > 0.0 && fx.is_finite()) {
            return Err(ConfigurationError::NonPositiveAmount {
                field: "currency_to_domestic",
                value: fx,
            });
        }
        Ok(())
    }
}

/// Domestic borrowing headroom after the foreign mortgage (DKK)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebtCeiling {
    /// Annual income × multiplier; 0 when no income is given
    pub max_total_debt: f64,
    pub foreign_mortgage_domestic: f64,
    /// Never negative
    pub available_domestic_debt: f64,
}

impl DebtCeiling {
    pub fn compute(
        annual_gross_income: f64,
        multiplier: f64,
        foreign_mortgage_domestic: f64,
    ) -> Self {
        let max_total_debt = if annual_gross_income > 0.0 {
            round_to_cents(annual_gross_income * multiplier)
        } else {
            0.0
        };

        Self {
            max_total_debt,
            foreign_mortgage_domestic,
            available_domestic_debt: round_to_cents(
                (max_total_debt - foreign_mortgage_domestic).max(0.0),
            ),
        }
    }
}

/// Monthly P&L of the foreign property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignPropertyAnalysis {
    pub currency: String,
    pub gross_monthly_foreign: f64,
    pub expenses_monthly_foreign: f64,
    pub mortgage_interest_foreign: f64,
    /// Rent − expenses − mortgage interest, floored at 0
    pub taxable_base_foreign: f64,
    pub foreign_tax_foreign: f64,
    /// After expenses, mortgage interest and foreign tax
    pub net_monthly_foreign: f64,
    /// Danish top-up tax under the credit method (DKK)
    pub domestic_topup_tax: f64,
    /// Net income in DKK after all taxes
    pub net_monthly_domestic: f64,
    pub debt_ceiling: DebtCeiling,
    pub tax_note: String,
    pub disclaimer: String,
}

/// Monthly foreign-property P&L, credit-method tax and debt ceiling
pub fn analyze_foreign_property(
    params: &ForeignPropertyParams,
) -> Result<ForeignPropertyAnalysis, ConfigurationError> {
    params.validate()?;

    let fx = params.currency_to_domestic();
    let foreign_rate = params.foreign_tax_rate();

    let mortgage_interest = if params.mortgage_balance > 0.0 {
        params.mortgage_balance * params.mortgage_rate / 12.0
    } else {
        0.0
    };

    let pre_tax = params.monthly_rental_income - params.monthly_expenses - mortgage_interest;
    let taxable_base = pre_tax.max(0.0);
    let foreign_tax = round_to_cents(taxable_base * foreign_rate);
    let net_monthly_foreign = round_to_cents(pre_tax - foreign_tax);

    // Denmark only collects the difference when its rate is higher
    let topup_rate = (params.domestic_marginal_rate - foreign_rate).max(0.0);
    let domestic_topup_tax = round_to_cents(taxable_base * fx * topup_rate);
    let net_monthly_domestic = round_to_cents(net_monthly_foreign * fx - domestic_topup_tax);

    let debt_ceiling = DebtCeiling::compute(
        params.annual_gross_income,
        params.debt_ceiling_multiplier,
        round_to_cents(params.mortgage_balance * fx),
    );

    Ok(ForeignPropertyAnalysis {
        currency: params.country.currency.clone(),
        gross_monthly_foreign: params.monthly_rental_income,
        expenses_monthly_foreign: params.monthly_expenses,
        mortgage_interest_foreign: round_to_cents(mortgage_interest),
        taxable_base_foreign: round_to_cents(taxable_base),
        foreign_tax_foreign: foreign_tax,
        net_monthly_foreign,
        domestic_topup_tax,
        net_monthly_domestic,
        debt_ceiling,
        tax_note: params.country.tax_note.clone(),
        disclaimer: params.country.disclaimer.clone(),
    })
}
