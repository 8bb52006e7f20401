//! Side-by-side comparison of two calculator runs.
//!
//! A comparison is nothing more than two independent [`compute`] calls; the
//! calculator itself has no notion of scenarios.

mod export;

pub use export::{format_currency, write_comparison_csv};

use serde::Serialize;

use crate::core::{CalculationInput, CalculationResult, compute};

/// What gets stripped from the entered input to form the reference scenario.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Baseline {
    #[default]
    NoEv,
    NoOtherSacrifice,
    NoSacrifice,
}

impl Baseline {
    pub fn strip(self, input: &CalculationInput) -> CalculationInput {
        let mut stripped = input.clone();
        if matches!(self, Self::NoEv | Self::NoSacrifice) {
            stripped.ev_lease_monthly = 0.0;
            stripped.ev_p11d_value = 0.0;
        }
        if matches!(self, Self::NoOtherSacrifice | Self::NoSacrifice) {
            stripped.other_sacrifice_monthly = 0.0;
        }
        stripped
    }

    pub fn labels(self) -> (&'static str, &'static str) {
        match self {
            Self::NoEv => ("Without EV", "With EV"),
            Self::NoOtherSacrifice => ("Without Other Sacrifice", "With Other Sacrifice"),
            Self::NoSacrifice => ("Without Sacrifice", "With Sacrifice"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub label: String,
    pub input: CalculationInput,
    pub result: CalculationResult,
}

impl Scenario {
    pub fn new(label: impl Into<String>, input: CalculationInput) -> Self {
        let result = compute(&input);
        Self {
            label: label.into(),
            input,
            result,
        }
    }

    fn gross_sacrifice_annual(&self) -> f64 {
        self.result.ev_lease_annual + self.result.other_sacrifice_annual
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub a: Scenario,
    pub b: Scenario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    Whole,
    Pence,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    pub metric: &'static str,
    pub a: f64,
    pub b: f64,
    #[serde(skip)]
    pub format: RowFormat,
}

impl Comparison {
    pub fn new(a: Scenario, b: Scenario) -> Self {
        Self { a, b }
    }

    /// Reference scenario first, the entered input second.
    pub fn against_baseline(input: &CalculationInput, baseline: Baseline) -> Self {
        let (label_a, label_b) = baseline.labels();
        Self::new(
            Scenario::new(label_a, baseline.strip(input)),
            Scenario::new(label_b, input.clone()),
        )
    }

    /// Monthly take-home given up by moving from scenario A to scenario B.
    pub fn effective_monthly_cost(&self) -> f64 {
        (self.a.result.take_home_annual - self.b.result.take_home_annual) / 12.0
    }

    pub fn gross_monthly_sacrifice(&self) -> f64 {
        (self.b.gross_sacrifice_annual() - self.a.gross_sacrifice_annual()) / 12.0
    }

    /// Part of the gross sacrifice paid for by lower tax, NI and HICBC.
    pub fn tax_relief_monthly(&self) -> f64 {
        self.gross_monthly_sacrifice() - self.effective_monthly_cost()
    }

    pub fn rows(&self) -> Vec<BreakdownRow> {
        use RowFormat::{Pence, Whole};
        vec![
            self.row("Gross Salary", Whole, |s| s.input.total_gross()),
            self.row("Income Tax", Whole, |s| s.result.income_tax_annual),
            self.row("National Insurance", Whole, |s| {
                s.result.national_insurance_annual
            }),
            self.row("Child Benefit Charge", Whole, |s| {
                s.result.child_benefit_charge_annual
            }),
            self.row("Pension (Your Contribution)", Whole, |s| {
                s.result.employee_pension_annual
            }),
            self.row("Employer Pension", Whole, |s| s.result.employer_pension_annual),
            self.row("Adjusted Net Income", Whole, |s| {
                s.result.adjusted_net_income_annual
            }),
            self.row("Annual Take Home", Pence, |s| s.result.take_home_annual),
            self.row("Monthly Take Home", Pence, |s| s.result.take_home_monthly()),
        ]
    }

    fn row(
        &self,
        metric: &'static str,
        format: RowFormat,
        value: impl Fn(&Scenario) -> f64,
    ) -> BreakdownRow {
        BreakdownRow {
            metric,
            a: value(&self.a),
            b: value(&self.b),
            format,
        }
    }
}
