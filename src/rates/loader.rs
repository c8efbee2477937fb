//! CSV-based rate table loader
//!
//! Loads rate tables from CSV files in data/rates/

use super::{
    BidragssatsEntry, BidragssatsSchedule, DeductionRates, FeeSchedule, Institution, LoanProduct,
    LtvBracket,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;

/// Default path to rate tables directory
pub const DEFAULT_RATES_PATH: &str = "data/rates";

#[derive(Debug, serde::Deserialize)]
struct ProductRow {
    product: String,
    annual_rate: f64,
    default_price: f64,
}

#[derive(Debug, serde::Deserialize)]
struct BidragssatsRow {
    institution: String,
    bracket: String,
    annuity: f64,
    io_premium: f64,
}

/// Load loan products from products.csv, in file order
pub fn load_products(path: &Path) -> Result<Vec<LoanProduct>, Box<dyn Error>> {
    let file = File::open(path.join("products.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut products: Vec<LoanProduct> = Vec::new();
    for result in reader.deserialize() {
        let row: ProductRow = result?;
        if products.iter().any(|p| p.id == row.product) {
            return Err(format!("Duplicate product: {}", row.product).into());
        }
        products.push(LoanProduct::new(row.product, row.annual_rate, row.default_price));
    }

    if products.is_empty() {
        return Err("products.csv contains no products".into());
    }
    Ok(products)
}

/// Load institutions from bidragssats.csv
///
/// One row per institution and bracket. Institutions keep the order of their
/// first row; every institution must define all three brackets.
pub fn load_institutions(path: &Path) -> Result<Vec<Institution>, Box<dyn Error>> {
    let file = File::open(path.join("bidragssats.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, [Option<BidragssatsEntry>; 3]> = HashMap::new();

    for result in reader.deserialize() {
        let row: BidragssatsRow = result?;
        let bracket = LtvBracket::from_key(row.bracket.trim())
            .ok_or_else(|| format!("Unknown LTV bracket: {}", row.bracket))?;

        if !entries.contains_key(&row.institution) {
            order.push(row.institution.clone());
        }
        let slots = entries.entry(row.institution.clone()).or_insert([None; 3]);
        if slots[bracket as usize].is_some() {
            let msg = format!(
                "Duplicate bidragssats for {} bracket {}",
                row.institution,
                bracket.key()
            );
            return Err(msg.into());
        }
        slots[bracket as usize] = Some(BidragssatsEntry::new(row.annuity, row.io_premium));
    }

    let mut institutions = Vec::with_capacity(order.len());
    for id in order {
        let slots = entries[&id];
        let missing = |b: LtvBracket| format!("{} has no bidragssats for bracket {}", id, b.key());
        let schedule = BidragssatsSchedule {
            low: slots[LtvBracket::Low as usize].ok_or_else(|| missing(LtvBracket::Low))?,
            mid: slots[LtvBracket::Mid as usize].ok_or_else(|| missing(LtvBracket::Mid))?,
            high: slots[LtvBracket::High as usize].ok_or_else(|| missing(LtvBracket::High))?,
        };
        institutions.push(Institution::new(id, schedule));
    }

    if institutions.is_empty() {
        return Err("bidragssats.csv contains no institutions".into());
    }
    Ok(institutions)
}

/// Load scalar parameters from parameters.csv
/// Returns HashMap<key, raw value>
pub fn load_parameters(path: &Path) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let file = File::open(path.join("parameters.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut params = HashMap::new();
    for result in reader.records() {
        let record = result?;
        params.insert(record[0].trim().to_string(), record[1].trim().to_string());
    }

    Ok(params)
}

fn number(params: &HashMap<String, String>, key: &str) -> Result<f64, Box<dyn Error>> {
    let raw = params
        .get(key)
        .ok_or_else(|| format!("parameters.csv is missing {}", key))?;
    raw.parse::<f64>()
        .map_err(|e| format!("parameters.csv {}: {}", key, e).into())
}

fn check(ok: bool, what: impl FnOnce() -> String) -> Result<(), Box<dyn Error>> {
    if ok {
        Ok(())
    } else {
        Err(what().into())
    }
}

fn is_rate(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// All rate data loaded from a directory
pub struct LoadedRates {
    pub as_of: NaiveDate,
    pub products: Vec<LoanProduct>,
    pub institutions: Vec<Institution>,
    pub fees: FeeSchedule,
    pub deduction: DeductionRates,
    pub eur_dkk: f64,
}

impl LoadedRates {
    /// Load all rates from the default path
    pub fn load_default() -> Result<Self, Box<dyn Error>> {
        Self::load_from(Path::new(DEFAULT_RATES_PATH))
    }

    /// Load all rates from a specific path
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        let params = load_parameters(path)?;
        let as_of_raw = params
            .get("as_of")
            .ok_or("parameters.csv is missing as_of")?;

        let loaded = Self {
            as_of: NaiveDate::parse_from_str(as_of_raw, "%Y-%m-%d")?,
            products: load_products(path)?,
            institutions: load_institutions(path)?,
            fees: FeeSchedule {
                registration_flat: number(&params, "registration_flat")?,
                registration_rate: number(&params, "registration_rate")?,
                establishment_fee: number(&params, "establishment_fee")?,
                spread_rate: number(&params, "spread_rate")?,
            },
            deduction: DeductionRates {
                low_rate: number(&params, "deduction_low_rate")?,
                high_rate: number(&params, "deduction_high_rate")?,
                threshold: number(&params, "deduction_threshold")?,
            },
            eur_dkk: number(&params, "eur_dkk")?,
        };
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values no loan calculation can use
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        for p in &self.products {
            check(is_rate(p.annual_rate), || {
                format!("{}: annual_rate {} outside [0, 1]", p.id, p.annual_rate)
            })?;
            check(p.default_price > 0.0 && p.default_price.is_finite(), || {
                format!("{}: default_price {} must be positive", p.id, p.default_price)
            })?;
        }

        for inst in &self.institutions {
            for bracket in LtvBracket::ALL {
                let e = inst.bidragssats.entry(bracket);
                check(is_rate(e.annuity) && is_rate(e.io_premium), || {
                    format!("{} bracket {}: bidragssats outside [0, 1]", inst.id, bracket.key())
                })?;
            }
        }

        let fees = &self.fees;
        for (key, value) in [
            ("registration_flat", fees.registration_flat),
            ("establishment_fee", fees.establishment_fee),
            ("deduction_threshold", self.deduction.threshold),
        ] {
            check(value >= 0.0 && value.is_finite(), || {
                format!("{} {} must be non-negative", key, value)
            })?;
        }
        for (key, value) in [
            ("registration_rate", fees.registration_rate),
            ("spread_rate", fees.spread_rate),
            ("deduction_low_rate", self.deduction.low_rate),
            ("deduction_high_rate", self.deduction.high_rate),
        ] {
            check(is_rate(value), || format!("{} {} outside [0, 1]", key, value))?;
        }

        check(self.eur_dkk > 0.0 && self.eur_dkk.is_finite(), || {
            format!("eur_dkk {} must be positive", self.eur_dkk)
        })
    }
}
