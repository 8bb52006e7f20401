use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::{CalculationInput, CalculationResult, InvalidInputError, compute};
use crate::scenario::{Baseline, Comparison, format_currency, write_comparison_csv};

pub(crate) const DEFAULT_BASE_SALARY: f64 = 65_000.0;
pub(crate) const DEFAULT_EMPLOYEE_PENSION_PCT: f64 = 5.0;
pub(crate) const DEFAULT_EMPLOYER_PENSION_PCT: f64 = 3.0;
pub(crate) const DEFAULT_EV_LEASE_MONTHLY: f64 = 500.0;
pub(crate) const DEFAULT_EV_P11D_VALUE: f64 = 45_000.0;
pub(crate) const DEFAULT_PORT: u16 = 8080;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum CliBaseline {
    NoEv,
    NoOtherSacrifice,
    NoSacrifice,
}

impl From<CliBaseline> for Baseline {
    fn from(value: CliBaseline) -> Self {
        match value {
            CliBaseline::NoEv => Baseline::NoEv,
            CliBaseline::NoOtherSacrifice => Baseline::NoOtherSacrifice,
            CliBaseline::NoSacrifice => Baseline::NoSacrifice,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "takehome",
    about = "UK take-home pay under salary sacrifice (pension, EV lease, other)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annual and monthly breakdown for one set of inputs
    Calculate(InputArgs),
    /// Entered inputs against the same inputs with a sacrifice removed
    Compare(CompareArgs),
    /// Start the JSON HTTP API
    Serve {
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub(crate) struct InputArgs {
    #[arg(long, default_value_t = DEFAULT_BASE_SALARY, help = "Annual base salary in GBP")]
    pub(crate) base_salary: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual bonus in GBP")]
    pub(crate) bonus: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_EMPLOYEE_PENSION_PCT,
        help = "Employee pension contribution in percent of pensionable pay"
    )]
    pub(crate) employee_pension_pct: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_EMPLOYER_PENSION_PCT,
        help = "Employer pension contribution in percent of pensionable pay"
    )]
    pub(crate) employer_pension_pct: f64,
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Whether pension percentages also apply to the bonus"
    )]
    pub(crate) pension_applies_to_bonus: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_EV_LEASE_MONTHLY,
        help = "Gross monthly EV lease sacrificed from salary"
    )]
    pub(crate) ev_lease_monthly: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_EV_P11D_VALUE,
        help = "Car P11D value used for benefit in kind"
    )]
    pub(crate) ev_p11d_value: f64,
    #[arg(long, default_value_t = 0.0, help = "Any other monthly salary sacrifice")]
    pub(crate) other_sacrifice_monthly: f64,
    #[arg(long, default_value_t = 0)]
    pub(crate) num_children: u32,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, value_enum, default_value_t = CliBaseline::NoEv)]
    baseline: CliBaseline,
    #[arg(long, help = "Print the comparison as CSV")]
    csv: bool,
}

pub(crate) fn default_input_args() -> InputArgs {
    InputArgs {
        base_salary: DEFAULT_BASE_SALARY,
        bonus: 0.0,
        employee_pension_pct: DEFAULT_EMPLOYEE_PENSION_PCT,
        employer_pension_pct: DEFAULT_EMPLOYER_PENSION_PCT,
        pension_applies_to_bonus: true,
        ev_lease_monthly: DEFAULT_EV_LEASE_MONTHLY,
        ev_p11d_value: DEFAULT_EV_P11D_VALUE,
        other_sacrifice_monthly: 0.0,
        num_children: 0,
    }
}

pub(crate) fn build_inputs(args: InputArgs) -> Result<CalculationInput, InvalidInputError> {
    CalculationInput {
        base_salary: args.base_salary,
        bonus: args.bonus,
        employee_pension_pct: args.employee_pension_pct,
        employer_pension_pct: args.employer_pension_pct,
        pension_applies_to_bonus: args.pension_applies_to_bonus,
        ev_lease_monthly: args.ev_lease_monthly,
        ev_p11d_value: args.ev_p11d_value,
        other_sacrifice_monthly: args.other_sacrifice_monthly,
        num_children: args.num_children,
    }
    .validated()
}

pub async fn run_cli(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Calculate(args) => {
            let input = build_inputs(args).map_err(|e| e.to_string())?;
            print!("{}", render_result(&compute(&input)));
        }
        Command::Compare(args) => {
            let input = build_inputs(args.input).map_err(|e| e.to_string())?;
            let comparison = Comparison::against_baseline(&input, args.baseline.into());
            if args.csv {
                write_comparison_csv(&comparison, std::io::stdout().lock())
                    .map_err(|e| format!("CSV export failed: {e}"))?;
            } else {
                print!("{}", render_comparison(&comparison));
            }
        }
        Command::Serve { port } => {
            super::run_http_server(port)
                .await
                .map_err(|e| format!("Server error: {e}"))?;
        }
    }
    Ok(())
}

fn render_result(result: &CalculationResult) -> String {
    let mut lines = vec![
        ("Taxable Gross", result.taxable_gross_annual),
        ("Benefit in Kind", result.benefit_in_kind_annual),
        ("Adjusted Net Income", result.adjusted_net_income_annual),
        ("Personal Allowance", result.personal_allowance),
        ("Income Tax", result.income_tax_annual),
        ("National Insurance", result.national_insurance_annual),
        ("Child Benefit Charge", result.child_benefit_charge_annual),
        ("Pension (Your Contribution)", result.employee_pension_annual),
        ("Employer Pension", result.employer_pension_annual),
        ("Total Pension Pot", result.total_pension_pot_annual),
        ("Total Package Value", result.total_package_value_annual),
        ("Annual Take Home", result.take_home_annual),
    ]
    .into_iter()
    .map(|(label, value)| format!("{label:<28} {:>16}", format_currency(value, 2)))
    .collect::<Vec<_>>();

    lines.push(format!(
        "{:<28} {:>16}",
        "Monthly Take Home",
        format_currency(result.take_home_monthly(), 2)
    ));
    if result.in_allowance_taper() {
        lines.push(
            "Note: adjusted net income is in the personal allowance taper (effective 60% band)"
                .to_string(),
        );
    }
    lines.join("\n") + "\n"
}

fn render_comparison(comparison: &Comparison) -> String {
    let mut out = format!(
        "{:<28} {:>16} {:>16}\n",
        "Metric", comparison.a.label, comparison.b.label
    );
    for row in comparison.rows() {
        out.push_str(&format!(
            "{:<28} {:>16} {:>16}\n",
            row.metric,
            format_currency(row.a, 2),
            format_currency(row.b, 2)
        ));
    }

    let gross = comparison.gross_monthly_sacrifice();
    let cost = comparison.effective_monthly_cost();
    out.push_str(&format!(
        "\nEffective monthly cost: {} (gross sacrifice {}, tax relief {})\n",
        format_currency(cost, 2),
        format_currency(gross, 2),
        format_currency(comparison.tax_relief_monthly(), 2)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn cli_defaults_match_default_input_args() {
        let cli = Cli::parse_from(["takehome", "calculate"]);
        let Command::Calculate(args) = cli.command else {
            panic!("expected calculate subcommand");
        };
        let defaults = default_input_args();
        assert_approx(args.base_salary, defaults.base_salary);
        assert_approx(args.ev_lease_monthly, defaults.ev_lease_monthly);
        assert_approx(args.ev_p11d_value, defaults.ev_p11d_value);
        assert_eq!(args.pension_applies_to_bonus, defaults.pension_applies_to_bonus);
        assert_eq!(args.num_children, defaults.num_children);
    }

    #[test]
    fn cli_parses_compare_flags() {
        let cli = Cli::parse_from([
            "takehome",
            "compare",
            "--base-salary",
            "110000",
            "--pension-applies-to-bonus",
            "false",
            "--num-children",
            "2",
            "--baseline",
            "no-sacrifice",
            "--csv",
        ]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare subcommand");
        };
        assert_approx(args.input.base_salary, 110_000.0);
        assert!(!args.input.pension_applies_to_bonus);
        assert_eq!(args.input.num_children, 2);
        assert_eq!(args.baseline, CliBaseline::NoSacrifice);
        assert!(args.csv);
    }

    #[test]
    fn cli_parses_serve_port() {
        let cli = Cli::parse_from(["takehome", "serve", "--port", "9000"]);
        assert!(matches!(cli.command, Command::Serve { port: 9000 }));
    }

    #[test]
    fn build_inputs_rejects_negative_bonus() {
        let mut args = default_input_args();
        args.bonus = -1.0;
        let err = build_inputs(args).expect_err("must reject negative bonus");
        assert_eq!(err.field(), "bonus");
    }

    #[test]
    fn build_inputs_rejects_percentage_above_hundred() {
        let mut args = default_input_args();
        args.employee_pension_pct = 120.0;
        let err = build_inputs(args).expect_err("must reject 120%");
        assert_eq!(
            err.to_string(),
            "employee_pension_pct: percentage must be in [0,100], got 120"
        );
    }

    #[test]
    fn build_inputs_rejects_non_finite_amounts() {
        let mut args = default_input_args();
        args.ev_p11d_value = f64::NAN;
        let err = build_inputs(args).expect_err("must reject NaN");
        assert_eq!(err, InvalidInputError::NonFinite { field: "ev_p11d_value" });
    }

    #[test]
    fn render_result_flags_allowance_taper() {
        let mut args = default_input_args();
        args.base_salary = 110_000.0;
        args.employee_pension_pct = 0.0;
        args.ev_lease_monthly = 0.0;
        args.ev_p11d_value = 0.0;
        let input = build_inputs(args).expect("valid inputs");
        let text = render_result(&compute(&input));
        assert!(text.contains("Personal Allowance"));
        assert!(text.contains("£7,570.00"));
        assert!(text.contains("effective 60% band"));
    }

    #[test]
    fn render_comparison_reports_effective_cost() {
        let input = build_inputs(default_input_args()).expect("valid inputs");
        let comparison = Comparison::against_baseline(&input, Baseline::NoEv);
        let text = render_comparison(&comparison);
        assert!(text.starts_with("Metric"));
        assert!(text.contains("Without EV"));
        assert!(text.contains("Effective monthly cost: "));
        assert!(text.contains("gross sacrifice £500.00"));
    }
}
