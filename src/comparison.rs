//! Institution comparison and the analysis entry point
//!
//! [`Analyzer`] holds the rate tables once and runs any number of loan
//! analyses, institution comparisons and foreign-property evaluations
//! against them.

use crate::amortization::{AmortizationEngine, LoanAnalysisResult};
use crate::error::ConfigurationError;
use crate::loan::{LoanConfiguration, LoanRequest, LoanShape};
use crate::rates::RateTables;
use crate::tax::{self, CombinedMonthlyPicture, ForeignPropertyAnalysis, ForeignPropertyParams};
use log::info;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// One institution's outcome in a comparison run
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    /// 1 = cheapest
    pub rank: usize,
    pub institution: String,
    pub lifetime_cost: f64,
    pub bidragssats_total: f64,
    pub bond_interest_total: f64,
    pub aop: f64,
    pub one_time_costs: f64,
    #[serde(skip)]
    pub result: LoanAnalysisResult,
}

impl RankedResult {
    fn from_result(result: LoanAnalysisResult) -> Self {
        Self {
            rank: 0,
            institution: result.config.institution().to_string(),
            lifetime_cost: result.totals.lifetime_cost,
            bidragssats_total: result.totals.bidragssats,
            bond_interest_total: result.totals.bond_interest,
            aop: result.aop,
            one_time_costs: result.totals.one_time_costs,
            result,
        }
    }
}

/// Months needed to recover the cost of switching to the cheapest institution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Breakeven {
    AlreadyCheapest,
    Months(f64),
    /// Month-1 payment is not lower, so switching never pays back
    Never,
}

impl Breakeven {
    pub fn months(&self) -> f64 {
        match self {
            Breakeven::AlreadyCheapest => 0.0,
            Breakeven::Months(m) => *m,
            Breakeven::Never => f64::INFINITY,
        }
    }
}

/// Breakeven for moving from `current` to `alternative`.
///
/// Switching cost is the alternative's one-time cost; the saving is the
/// difference in month-1 total payment. This is a short-horizon heuristic:
/// payment profiles that diverge later (different IO lengths) are not seen.
pub fn breakeven_months(current: &RankedResult, alternative: &RankedResult) -> Breakeven {
    let monthly_saving = current.result.first_payment() - alternative.result.first_payment();
    if monthly_saving <= 0.0 {
        return Breakeven::Never;
    }
    let months = alternative.one_time_costs / monthly_saving;
    Breakeven::Months((months * 10.0).round() / 10.0)
}

/// Entry point bound to one set of rate tables
#[derive(Debug, Clone)]
pub struct Analyzer {
    rates: RateTables,
}

impl Analyzer {
    pub fn new(rates: RateTables) -> Self {
        Self { rates }
    }

    /// Analyzer over rate tables loaded from a CSV directory
    pub fn from_csv_path(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(RateTables::from_csv_path(path)?))
    }

    pub fn rates(&self) -> &RateTables {
        &self.rates
    }

    pub fn configure(&self, request: LoanRequest) -> Result<LoanConfiguration, ConfigurationError> {
        LoanConfiguration::new(request, &self.rates)
    }

    /// Full pipeline for one loan: schedule, costs, totals and ÅOP
    pub fn analyze(&self, request: LoanRequest) -> Result<LoanAnalysisResult, ConfigurationError> {
        let config = self.configure(request)?;
        Ok(AmortizationEngine::new(&self.rates).analyze(&config))
    }

    /// Analyze `shape` at every institution and rank by lifetime cost.
    ///
    /// Ties keep the institution order of the rate tables.
    pub fn compare_institutions(
        &self,
        shape: &LoanShape,
    ) -> Result<Vec<RankedResult>, ConfigurationError> {
        let engine = AmortizationEngine::new(&self.rates);

        let results: Vec<_> = self
            .rates
            .institutions
            .par_iter()
            .map(|institution| -> Result<RankedResult, ConfigurationError> {
                let request = shape.for_institution(&institution.id);
                let config = LoanConfiguration::new(request, &self.rates)?;
                Ok(RankedResult::from_result(engine.analyze(&config)))
            })
            .collect();
        let mut ranked = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        // sort_by is stable
        ranked.sort_by(|a, b| a.lifetime_cost.total_cmp(&b.lifetime_cost));
        for (idx, r) in ranked.iter_mut().enumerate() {
            r.rank = idx + 1;
        }

        if let (Some(first), Some(last)) = (ranked.first(), ranked.last()) {
            info!(
                "Compared {} institutions for {} over {}y: cheapest {} ({:.2}), dearest {} ({:.2})",
                ranked.len(),
                shape.product,
                shape.term_years,
                first.institution,
                first.lifetime_cost,
                last.institution,
                last.lifetime_cost,
            );
        }

        Ok(ranked)
    }

    /// Ranked comparison plus each institution's breakeven against rank 1
    pub fn rank_with_breakeven(
        &self,
        shape: &LoanShape,
    ) -> Result<(Vec<RankedResult>, HashMap<String, Breakeven>), ConfigurationError> {
        let ranked = self.compare_institutions(shape)?;

        let mut breakeven = HashMap::with_capacity(ranked.len());
        if let Some(cheapest) = ranked.first() {
            for r in &ranked {
                let value = if r.rank == 1 {
                    Breakeven::AlreadyCheapest
                } else {
                    breakeven_months(r, cheapest)
                };
                breakeven.insert(r.institution.clone(), value);
            }
        }

        Ok((ranked, breakeven))
    }

    /// Foreign property P&L. A preset without its own exchange rate uses
    /// the EUR peg of these rate tables.
    pub fn analyze_foreign_property(
        &self,
        params: &ForeignPropertyParams,
    ) -> Result<ForeignPropertyAnalysis, ConfigurationError> {
        let params = params.clone().with_default_peg(self.rates.eur_dkk);
        tax::analyze_foreign_property(&params)
    }

    /// Combined view using this analyzer's deduction rates
    pub fn combined_monthly_picture(
        &self,
        loan: &LoanAnalysisResult,
        foreign: &ForeignPropertyAnalysis,
        month: u32,
    ) -> CombinedMonthlyPicture {
        tax::combined_monthly_picture(loan, foreign, month, &self.rates.deduction)
    }

    /// Annual rentefradrag for `annual_bond_interest` under this analyzer's rates
    pub fn interest_deduction(&self, annual_bond_interest: f64) -> f64 {
        tax::interest_deduction(annual_bond_interest, &self.rates.deduction)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(RateTables::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{BidragssatsEntry, BidragssatsSchedule, Institution};
    use approx::assert_abs_diff_eq;

    fn shape(property_value: f64, principal: f64) -> LoanShape {
        LoanShape {
            property_value,
            principal,
            product: "fixed_30y".to_string(),
            term_years: 30,
            io_years: 0,
            market_price: None,
        }
    }

    #[test]
    fn test_totalkredit_cheapest_at_low_ltv() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(5_000_000.0, 1_500_000.0)).unwrap();

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].institution, "Totalkredit");
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_totalkredit_cheapest_at_high_ltv() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(4_000_000.0, 3_000_000.0)).unwrap();
        assert_eq!(ranked[0].institution, "Totalkredit");
        assert_eq!(ranked.last().map(|r| r.institution.as_str()), Some("BRFkredit"));
    }

    #[test]
    fn test_costs_non_decreasing_by_rank() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(4_000_000.0, 2_000_000.0)).unwrap();

        for pair in ranked.windows(2) {
            assert!(pair[0].lifetime_cost <= pair[1].lifetime_cost);
            assert_eq!(pair[1].rank, pair[0].rank + 1);
        }
    }

    #[test]
    fn test_ranked_fields_match_result() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(4_000_000.0, 3_000_000.0)).unwrap();

        for r in &ranked {
            assert_eq!(r.institution, r.result.config.institution());
            assert_eq!(r.lifetime_cost, r.result.lifetime_cost());
            assert_eq!(r.bidragssats_total, r.result.totals.bidragssats);
            assert_eq!(r.bond_interest_total, r.result.totals.bond_interest);
            assert_eq!(r.one_time_costs, r.result.one_time_costs());
            assert_eq!(r.aop, r.result.aop);
            assert_eq!(r.result.schedule.len(), 360);
        }
    }

    #[test]
    fn test_bond_interest_same_across_institutions() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(4_000_000.0, 3_000_000.0)).unwrap();

        // Only the bidragssats differs between lenders
        let interest = ranked[0].bond_interest_total;
        assert!(ranked.iter().all(|r| (r.bond_interest_total - interest).abs() < 0.01));
    }

    #[test]
    fn test_parameters_propagate() {
        let analyzer = Analyzer::default();
        let s = LoanShape {
            product: "F5".to_string(),
            term_years: 25,
            io_years: 0,
            ..shape(3_000_000.0, 2_000_000.0)
        };
        let ranked = analyzer.compare_institutions(&s).unwrap();

        for r in &ranked {
            assert_eq!(r.result.config.product().id, "F5");
            assert_eq!(r.result.config.principal(), 2_000_000.0);
            assert_eq!(r.result.schedule.len(), 300);
        }
    }

    #[test]
    fn test_interest_only_raises_bidragssats() {
        let analyzer = Analyzer::default();
        let annuity = analyzer.compare_institutions(&shape(4_000_000.0, 3_000_000.0)).unwrap();
        let io = analyzer
            .compare_institutions(&LoanShape {
                io_years: 10,
                ..shape(4_000_000.0, 3_000_000.0)
            })
            .unwrap();

        assert!(io[0].bidragssats_total > annuity[0].bidragssats_total);
    }

    #[test]
    fn test_comparison_is_deterministic() {
        let analyzer = Analyzer::default();
        let s = shape(4_000_000.0, 3_000_000.0);
        let first = analyzer.compare_institutions(&s).unwrap();
        let second = analyzer.compare_institutions(&s).unwrap();

        let key = |v: &[RankedResult]| -> Vec<(String, f64)> {
            v.iter().map(|r| (r.institution.clone(), r.lifetime_cost)).collect()
        };
        assert_eq!(key(&first), key(&second));
    }

    #[test]
    fn test_ties_keep_table_order() {
        let mut rates = RateTables::february_2026();
        let flat = BidragssatsEntry::new(0.005, 0.001);
        let schedule = BidragssatsSchedule { low: flat, mid: flat, high: flat };
        rates.institutions = vec![
            Institution::new("Zulu", schedule),
            Institution::new("Alpha", schedule),
            Institution::new("Mike", schedule),
        ];

        let ranked = Analyzer::new(rates)
            .compare_institutions(&shape(4_000_000.0, 3_000_000.0))
            .unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.institution.as_str()).collect();
        assert_eq!(order, ["Zulu", "Alpha", "Mike"]);
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let analyzer = Analyzer::default();
        let err = analyzer.compare_institutions(&shape(1_000_000.0, 900_000.0)).unwrap_err();
        assert!(matches!(err, ConfigurationError::LtvTooHigh { .. }));
    }

    #[test]
    fn test_breakeven_map() {
        let analyzer = Analyzer::default();
        let (ranked, breakeven) =
            analyzer.rank_with_breakeven(&shape(4_000_000.0, 3_000_000.0)).unwrap();

        assert_eq!(breakeven.len(), ranked.len());
        assert_eq!(breakeven[&ranked[0].institution], Breakeven::AlreadyCheapest);
        for r in &ranked[1..] {
            let months = breakeven[&r.institution].months();
            assert!(months > 0.0, "{} breakeven {}", r.institution, months);
        }
    }

    #[test]
    fn test_breakeven_math() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(4_000_000.0, 3_000_000.0)).unwrap();
        let cheapest = &ranked[0];
        let current = &ranked[1];

        let saving = current.result.first_payment() - cheapest.result.first_payment();
        let expected = ((cheapest.one_time_costs / saving) * 10.0).round() / 10.0;

        match breakeven_months(current, cheapest) {
            Breakeven::Months(m) => assert_abs_diff_eq!(m, expected, epsilon = 1e-9),
            other => panic!("unexpected breakeven {:?}", other),
        }
    }

    #[test]
    fn test_breakeven_never_when_not_cheaper_monthly() {
        let analyzer = Analyzer::default();
        let ranked = analyzer.compare_institutions(&shape(4_000_000.0, 3_000_000.0)).unwrap();

        let b = breakeven_months(&ranked[0], &ranked[1]);
        assert_eq!(b, Breakeven::Never);
        assert!(b.months().is_infinite());
        assert_eq!(breakeven_months(&ranked[0], &ranked[0]), Breakeven::Never);
    }

    #[test]
    fn test_breakeven_values() {
        assert_eq!(Breakeven::AlreadyCheapest.months(), 0.0);
        assert_eq!(Breakeven::Months(42.5).months(), 42.5);
        assert_eq!(Breakeven::Never.months(), f64::INFINITY);
    }

    #[test]
    fn test_foreign_property_uses_table_peg() {
        let mut rates = RateTables::february_2026();
        rates.eur_dkk = 10.0;
        let analyzer = Analyzer::new(rates);

        let params = ForeignPropertyParams::new(250_000.0, 1_000.0, 0.0);
        let result = analyzer.analyze_foreign_property(&params).unwrap();

        // 1,000 taxed at the 42% Danish rate, converted at 10.0
        assert_abs_diff_eq!(result.net_monthly_domestic, 5_800.0, epsilon = 0.01);
        assert_abs_diff_eq!(result.domestic_topup_tax, 1_000.0 * 10.0 * 0.21, epsilon = 0.01);
    }

    #[test]
    fn test_explicit_exchange_rate_wins_over_peg() {
        let mut rates = RateTables::february_2026();
        rates.eur_dkk = 10.0;
        let analyzer = Analyzer::new(rates);

        let mut params = ForeignPropertyParams::new(250_000.0, 1_000.0, 0.0);
        params.country.currency_to_domestic = Some(7.46);
        let result = analyzer.analyze_foreign_property(&params).unwrap();
        assert_abs_diff_eq!(result.net_monthly_domestic, 4_326.8, epsilon = 0.01);
    }

    #[test]
    fn test_analyze_and_foreign_entry_points() {
        let analyzer = Analyzer::default();
        let loan = analyzer
            .analyze(shape(4_000_000.0, 3_000_000.0).for_institution("Nykredit"))
            .unwrap();
        assert_eq!(loan.config.institution(), "Nykredit");

        let foreign = analyzer
            .analyze_foreign_property(&ForeignPropertyParams::new(250_000.0, 1_200.0, 200.0))
            .unwrap();
        let picture = analyzer.combined_monthly_picture(&loan, &foreign, 1);
        assert_eq!(picture.gross_cost, loan.first_payment());

        assert!(matches!(
            analyzer.analyze(shape(4_000_000.0, 3_000_000.0).for_institution("Danske")),
            Err(ConfigurationError::UnknownInstitution(_))
        ));
    }
}
