//! Realkredit CLI
//!
//! Command-line front end for loan analysis, institution comparison and
//! foreign property evaluation.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::warn;
use realkredit::amortization::write_schedule_csv;
use realkredit::comparison::{Analyzer, Breakeven, RankedResult};
use realkredit::loan::{LoanRequest, LoanShape};
use realkredit::rates::{LtvBracket, RateTables, Staleness};
use realkredit::tax::{self, CountryPreset, ForeignPropertyParams};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "realkredit")]
#[command(version, about = "Danish mortgage analysis", long_about = None)]
struct Cli {
    /// Directory with products.csv, bidragssats.csv and parameters.csv
    #[arg(long, global = true, env = "REALKREDIT_RATES_DIR")]
    rates_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one loan at one institution
    Analyze {
        #[command(flatten)]
        loan: LoanArgs,

        #[arg(long, default_value = "Totalkredit")]
        institution: String,
    },

    /// Rank every institution by lifetime cost
    Compare {
        #[command(flatten)]
        loan: LoanArgs,
    },

    /// Foreign rental property P&L, optionally set against a domestic loan
    Foreign(ForeignArgs),

    /// Show the rate tables in use
    Rates,

    /// Write the month-by-month schedule as CSV
    Schedule {
        #[command(flatten)]
        loan: LoanArgs,

        #[arg(long, default_value = "Totalkredit")]
        institution: String,

        /// Output file
        #[arg(short, long, default_value = "schedule.csv")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct LoanArgs {
    /// Property value (DKK)
    #[arg(long)]
    property_value: f64,

    /// Amount to borrow (DKK)
    #[arg(long)]
    principal: f64,

    #[arg(long, default_value = "fixed_30y")]
    product: String,

    #[arg(long, default_value_t = 30)]
    term: u32,

    /// Interest-only years at the start of the loan
    #[arg(long, default_value_t = 0)]
    io_years: u32,

    /// Bond price in percent of face value (product default if omitted)
    #[arg(long)]
    price: Option<f64>,
}

impl LoanArgs {
    fn shape(&self) -> LoanShape {
        LoanShape {
            property_value: self.property_value,
            principal: self.principal,
            product: self.product.clone(),
            term_years: self.term,
            io_years: self.io_years,
            market_price: self.price,
        }
    }

    fn request(&self, institution: &str) -> LoanRequest {
        self.shape().for_institution(institution)
    }
}

#[derive(Args)]
struct ForeignArgs {
    /// Country preset (generic, italy)
    #[arg(long, default_value = "generic")]
    country: String,

    /// Property value in foreign currency
    #[arg(long)]
    value: f64,

    /// Monthly rental income in foreign currency
    #[arg(long)]
    rent: f64,

    /// Monthly operating expenses in foreign currency
    #[arg(long, default_value_t = 0.0)]
    expenses: f64,

    #[arg(long, default_value_t = 0.0)]
    mortgage_balance: f64,

    /// Annual rate on the foreign mortgage
    #[arg(long, default_value_t = 0.0)]
    mortgage_rate: f64,

    /// Overrides the preset's foreign tax rate
    #[arg(long)]
    foreign_tax_rate: Option<f64>,

    #[arg(long, default_value_t = tax::DEFAULT_DOMESTIC_MARGINAL_RATE)]
    marginal_rate: f64,

    /// Overrides the preset's exchange rate (DKK per unit)
    #[arg(long)]
    fx: Option<f64>,

    /// Annual gross income (DKK)
    #[arg(long, default_value_t = 0.0)]
    income: f64,

    #[arg(long, default_value_t = tax::DEFAULT_DEBT_CEILING_MULTIPLIER)]
    debt_multiplier: f64,

    /// Domestic loan principal for the combined monthly view
    #[arg(long, requires = "loan_property_value")]
    loan_principal: Option<f64>,

    /// Property value behind the domestic loan (DKK)
    #[arg(long, requires = "loan_principal")]
    loan_property_value: Option<f64>,

    #[arg(long, default_value = "fixed_30y")]
    loan_product: String,

    #[arg(long, default_value_t = 30)]
    loan_term: u32,

    #[arg(long, default_value_t = 0)]
    loan_io_years: u32,

    /// Bond price of the domestic loan (product default if omitted)
    #[arg(long)]
    loan_price: Option<f64>,

    #[arg(long, default_value = "Totalkredit")]
    institution: String,

    /// Month of the domestic loan to show in the combined view
    #[arg(long, default_value_t = 1)]
    month: u32,
}

impl ForeignArgs {
    fn params(&self) -> Result<ForeignPropertyParams> {
        let mut country = CountryPreset::by_name(&self.country)
            .ok_or_else(|| anyhow!("unknown country preset '{}'", self.country))?;
        if let Some(rate) = self.foreign_tax_rate {
            country.foreign_tax_rate = rate;
        }
        if let Some(fx) = self.fx {
            country.currency_to_domestic = Some(fx);
        }

        let mut params =
            ForeignPropertyParams::from_preset(country, self.value, self.rent, self.expenses)
                .with_mortgage(self.mortgage_balance, self.mortgage_rate)
                .with_income(self.income, self.debt_multiplier);
        params.domestic_marginal_rate = self.marginal_rate;
        Ok(params)
    }

    /// Domestic loan for the combined view, when one was given
    fn loan_request(&self) -> Option<LoanRequest> {
        let (principal, property_value) = (self.loan_principal?, self.loan_property_value?);
        let shape = LoanShape {
            property_value,
            principal,
            product: self.loan_product.clone(),
            term_years: self.loan_term,
            io_years: self.loan_io_years,
            market_price: self.loan_price,
        };
        Some(shape.for_institution(&self.institution))
    }
}

fn load_rates(dir: Option<&Path>) -> Result<RateTables> {
    let rates = match dir {
        Some(dir) => RateTables::from_csv_path(dir)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("loading rate tables from {}", dir.display()))?,
        None => RateTables::default(),
    };

    match rates.staleness(Local::now().date_naive()) {
        Staleness::Fresh => {}
        Staleness::Aging { days } => {
            warn!("Rate tables are {} days old (as of {})", days, rates.as_of)
        }
        Staleness::Stale { days } => warn!(
            "Rate tables are {} days old (as of {}); update them before relying on the figures",
            days, rates.as_of
        ),
    }
    Ok(rates)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn dkk(amount: f64) -> String {
    format!("DKK {:>14.2}", amount)
}

fn pct(rate: f64) -> String {
    format!("{:.3}%", rate * 100.0)
}

fn run_analyze(
    analyzer: &Analyzer,
    loan: &LoanArgs,
    institution: &str,
    json: bool,
) -> Result<()> {
    let result = analyzer.analyze(loan.request(institution))?;
    if json {
        return print_json(&result);
    }

    let config = &result.config;
    println!(
        "{} / {} ({} years, {} interest-only)",
        config.institution(),
        config.product().id,
        config.term_years(),
        config.io_years()
    );
    println!("  Principal:        {}", dkk(config.principal()));
    println!("  LTV:              {:.1}% (bracket {})", config.ltv() * 100.0, config.ltv_bracket());
    println!("  Bond price:       {:.2}", config.market_price());
    println!();

    if let Some(first) = result.schedule.first() {
        println!("Month 1");
        println!("  Bond interest:    {}", dkk(first.bond_interest));
        println!("  Bidragssats:      {}", dkk(first.bidragssats));
        println!("  Principal:        {}", dkk(first.principal));
        println!("  Total payment:    {}", dkk(first.total_payment));
        println!();
    }

    let costs = &result.cost_breakdown;
    println!("One-time costs");
    println!("  Registration:     {}", dkk(costs.registration));
    println!("  Establishment:    {}", dkk(costs.establishment));
    println!("  Spread:           {}", dkk(costs.spread));
    println!("  Price discount:   {}", dkk(costs.price_discount));
    println!("  Total:            {}", dkk(costs.total));
    println!();

    let totals = &result.totals;
    println!("Lifetime");
    println!("  Bond interest:    {}", dkk(totals.bond_interest));
    println!("  Bidragssats:      {}", dkk(totals.bidragssats));
    println!("  Principal:        {}", dkk(totals.principal));
    println!("  Total cost:       {}", dkk(totals.lifetime_cost));
    let aop_flag = if result.aop_converged { "" } else { " (not converged)" };
    println!("  ÅOP:              {}{}", pct(result.aop), aop_flag);
    println!();

    let deduction = &analyzer.rates().deduction;
    let yearly = tax::yearly_deductions(&result, deduction);
    println!("Rentefradrag");
    if let Some(year1) = yearly.first() {
        println!("  Year 1 saving:    {}", dkk(year1.saving));
    }
    println!("  Lifetime saving:  {}", dkk(tax::lifetime_deduction(&result, deduction)));
    Ok(())
}

#[derive(Serialize)]
struct ComparisonRow<'a> {
    #[serde(flatten)]
    ranked: &'a RankedResult,
    breakeven: Breakeven,
}

fn run_compare(analyzer: &Analyzer, loan: &LoanArgs, json: bool) -> Result<()> {
    let (ranked, breakeven) = analyzer.rank_with_breakeven(&loan.shape())?;
    let breakeven_for =
        |r: &RankedResult| breakeven.get(&r.institution).copied().unwrap_or(Breakeven::Never);

    if json {
        let rows: Vec<ComparisonRow> = ranked
            .iter()
            .map(|r| ComparisonRow { ranked: r, breakeven: breakeven_for(r) })
            .collect();
        return print_json(&rows);
    }

    println!(
        "{:>4} {:<20} {:>16} {:>14} {:>16} {:>9} {:>10}",
        "Rank", "Institution", "Total cost", "Bidragssats", "Bond interest", "ÅOP", "Breakeven"
    );
    println!("{}", "-".repeat(95));
    for r in &ranked {
        let months = match breakeven_for(r) {
            Breakeven::AlreadyCheapest => "-".to_string(),
            Breakeven::Months(m) => format!("{:.1}", m),
            Breakeven::Never => "never".to_string(),
        };
        println!(
            "{:>4} {:<20} {:>16.2} {:>14.2} {:>16.2} {:>9} {:>10}",
            r.rank,
            r.institution,
            r.lifetime_cost,
            r.bidragssats_total,
            r.bond_interest_total,
            pct(r.aop),
            months
        );
    }
    println!();
    println!(
        "Breakeven: months of month-1 savings needed to recover \
         the cheapest lender's one-time costs"
    );
    Ok(())
}

fn run_foreign(analyzer: &Analyzer, args: &ForeignArgs, json: bool) -> Result<()> {
    let params = args.params()?;
    let analysis = analyzer.analyze_foreign_property(&params)?;

    let combined = match args.loan_request() {
        Some(request) => {
            let loan = analyzer.analyze(request)?;
            Some(analyzer.combined_monthly_picture(&loan, &analysis, args.month))
        }
        None => None,
    };

    if json {
        #[derive(Serialize)]
        struct Output<'a> {
            foreign: &'a tax::ForeignPropertyAnalysis,
            combined: Option<tax::CombinedMonthlyPicture>,
        }
        return print_json(&Output { foreign: &analysis, combined });
    }

    let cur = &analysis.currency;
    println!("{} property, monthly", params.country.name);
    println!("  Rental income:        {} {:>12.2}", cur, analysis.gross_monthly_foreign);
    println!("  Expenses:             {} {:>12.2}", cur, analysis.expenses_monthly_foreign);
    println!("  Mortgage interest:    {} {:>12.2}", cur, analysis.mortgage_interest_foreign);
    println!("  Taxable base:         {} {:>12.2}", cur, analysis.taxable_base_foreign);
    println!("  Foreign tax:          {} {:>12.2}", cur, analysis.foreign_tax_foreign);
    println!("  Net:                  {} {:>12.2}", cur, analysis.net_monthly_foreign);
    println!("  Danish top-up tax:    {}", dkk(analysis.domestic_topup_tax));
    println!("  Net in DKK:           {}", dkk(analysis.net_monthly_domestic));
    println!();

    let ceiling = &analysis.debt_ceiling;
    println!("Debt ceiling");
    println!("  Max total debt:       {}", dkk(ceiling.max_total_debt));
    println!("  Foreign mortgage:     {}", dkk(ceiling.foreign_mortgage_domestic));
    println!("  Available in DK:      {}", dkk(ceiling.available_domestic_debt));
    println!();

    if let Some(c) = combined {
        println!("Combined, month {}", c.month);
        println!("  Loan payment:         {}", dkk(c.gross_cost));
        println!("  Deduction saving:     {}", dkk(c.deduction_saving));
        println!("  Net loan cost:        {}", dkk(c.net_cost));
        println!("  Foreign net income:   {}", dkk(c.foreign_net_income));
        println!("  Combined net:         {}", dkk(c.combined_net));
        println!();
    }

    println!("{}", analysis.tax_note);
    println!();
    println!("{}", analysis.disclaimer);
    Ok(())
}

fn run_rates(rates: &RateTables, json: bool) -> Result<()> {
    if json {
        return print_json(rates);
    }

    println!("Rate tables as of {}", rates.as_of);
    println!();
    println!("{:<12} {:>8} {:>8}", "Product", "Rate", "Price");
    for p in &rates.products {
        println!("{:<12} {:>8} {:>8.2}", p.id, pct(p.annual_rate), p.default_price);
    }
    println!();

    print!("{:<20}", "Bidragssats");
    for bracket in LtvBracket::ALL {
        print!(" {:>16}", format!("{} (+IO)", bracket));
    }
    println!();
    for inst in &rates.institutions {
        print!("{:<20}", inst.id);
        for bracket in LtvBracket::ALL {
            let e = inst.bidragssats.entry(bracket);
            print!(" {:>16}", format!("{:.2}% +{:.2}%", e.annuity * 100.0, e.io_premium * 100.0));
        }
        println!();
    }
    println!();

    let fees = &rates.fees;
    println!(
        "Registration: {:.0} + {:.2}%   Establishment: {:.0}   Spread: {:.2}%",
        fees.registration_flat,
        fees.registration_rate * 100.0,
        fees.establishment_fee,
        fees.spread_rate * 100.0
    );
    let d = &rates.deduction;
    println!(
        "Rentefradrag: {:.0}% up to {:.0}, {:.0}% above   EUR/DKK {:.4}",
        d.low_rate * 100.0,
        d.threshold,
        d.high_rate * 100.0,
        rates.eur_dkk
    );
    Ok(())
}

fn run_schedule(
    analyzer: &Analyzer,
    loan: &LoanArgs,
    institution: &str,
    output: &Path,
) -> Result<()> {
    let result = analyzer.analyze(loan.request(institution))?;
    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    write_schedule_csv(BufWriter::new(file), &result.schedule)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("writing {}", output.display()))?;

    println!("Wrote {} months to {}", result.schedule.len(), output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let rates = load_rates(cli.rates_dir.as_deref())?;

    let analyzer = Analyzer::new(rates);
    match &cli.command {
        Command::Analyze { loan, institution } => {
            run_analyze(&analyzer, loan, institution, cli.json)?
        }
        Command::Compare { loan } => run_compare(&analyzer, loan, cli.json)?,
        Command::Foreign(args) => run_foreign(&analyzer, args, cli.json)?,
        Command::Schedule { loan, institution, output } => {
            run_schedule(&analyzer, loan, institution, output)?
        }
        Command::Rates => run_rates(analyzer.rates(), cli.json)?,
    }

    Ok(())
}
