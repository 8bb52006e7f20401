use serde::Serialize;
use thiserror::Error;

/// One evaluation request. Amounts are annual GBP unless the field name says monthly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationInput {
    pub base_salary: f64,
    pub bonus: f64,
    pub employee_pension_pct: f64,
    pub employer_pension_pct: f64,
    pub pension_applies_to_bonus: bool,
    pub ev_lease_monthly: f64,
    /// List price used for the benefit-in-kind charge.
    pub ev_p11d_value: f64,
    pub other_sacrifice_monthly: f64,
    pub num_children: u32,
}

/// Largest accepted amount. Anything above this can overflow to infinity once
/// summed and multiplied through the bands.
pub const MAX_AMOUNT: f64 = 1e12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("{field}: value must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field}: amount must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field}: percentage must be in [0,100], got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },
    #[error("{field}: amount is too large (max {max}), got {value}", max = MAX_AMOUNT)]
    TooLarge { field: &'static str, value: f64 },
}

impl InvalidInputError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::NonFinite { field }
            | Self::Negative { field, .. }
            | Self::PercentOutOfRange { field, .. }
            | Self::TooLarge { field, .. } => field,
        }
    }
}

impl CalculationInput {
    /// Checks every field in declaration order and reports the first violation.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        for (field, value) in [
            ("base_salary", self.base_salary),
            ("bonus", self.bonus),
        ] {
            ensure_amount(field, value)?;
        }
        for (field, value) in [
            ("employee_pension_pct", self.employee_pension_pct),
            ("employer_pension_pct", self.employer_pension_pct),
        ] {
            ensure_percent(field, value)?;
        }
        for (field, value) in [
            ("ev_lease_monthly", self.ev_lease_monthly),
            ("ev_p11d_value", self.ev_p11d_value),
            ("other_sacrifice_monthly", self.other_sacrifice_monthly),
        ] {
            ensure_amount(field, value)?;
        }
        Ok(())
    }

    pub fn validated(self) -> Result<Self, InvalidInputError> {
        self.validate()?;
        Ok(self)
    }

    pub fn total_gross(&self) -> f64 {
        self.base_salary + self.bonus
    }
}

pub(crate) fn ensure_amount(field: &'static str, value: f64) -> Result<(), InvalidInputError> {
    if !value.is_finite() {
        return Err(InvalidInputError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(InvalidInputError::Negative { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(InvalidInputError::TooLarge { field, value });
    }
    Ok(())
}

pub(crate) fn ensure_percent(field: &'static str, value: f64) -> Result<(), InvalidInputError> {
    if !value.is_finite() {
        return Err(InvalidInputError::NonFinite { field });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(InvalidInputError::PercentOutOfRange { field, value });
    }
    Ok(())
}

/// A marginal band: `width` of income taxed at `rate`. The last band is usually unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBand {
    pub width: f64,
    pub rate: f64,
}

impl TaxBand {
    pub const fn new(width: f64, rate: f64) -> Self {
        Self { width, rate }
    }

    pub const fn unbounded(rate: f64) -> Self {
        Self {
            width: f64::INFINITY,
            rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub take_home_annual: f64,
    pub income_tax_annual: f64,
    pub national_insurance_annual: f64,
    pub child_benefit_charge_annual: f64,
    pub employee_pension_annual: f64,
    pub employer_pension_annual: f64,
    pub total_pension_pot_annual: f64,
    /// Post-sacrifice pay plus benefit in kind; the figure both means tests look at.
    pub adjusted_net_income_annual: f64,
    pub total_package_value_annual: f64,

    pub taxable_gross_annual: f64,
    pub benefit_in_kind_annual: f64,
    pub ev_lease_annual: f64,
    pub other_sacrifice_annual: f64,
    pub personal_allowance: f64,
    pub taxable_income_annual: f64,
}

impl CalculationResult {
    pub fn take_home_monthly(&self) -> f64 {
        self.take_home_annual / 12.0
    }

    /// Adjusted net income sits where the allowance is partly withdrawn,
    /// giving an effective 60% marginal rate.
    pub fn in_allowance_taper(&self) -> bool {
        self.adjusted_net_income_annual > super::engine::ALLOWANCE_TAPER_START
            && self.personal_allowance > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CalculationInput {
        CalculationInput {
            base_salary: 65_000.0,
            bonus: 0.0,
            employee_pension_pct: 5.0,
            employer_pension_pct: 3.0,
            pension_applies_to_bonus: true,
            ev_lease_monthly: 500.0,
            ev_p11d_value: 45_000.0,
            other_sacrifice_monthly: 0.0,
            num_children: 0,
        }
    }

    #[test]
    fn huge_finite_salary_is_rejected_before_it_can_overflow() {
        let input = CalculationInput {
            base_salary: 1e308,
            bonus: 1e308,
            ..valid_input()
        };
        let err = input.validate().expect_err("must reject 1e308");
        assert_eq!(
            err,
            InvalidInputError::TooLarge {
                field: "base_salary",
                value: 1e308
            }
        );
        assert_eq!(err.field(), "base_salary");
        assert!(err.to_string().starts_with("base_salary: amount is too large"));
    }

    #[test]
    fn too_large_applies_to_monthly_amounts_too() {
        let input = CalculationInput {
            ev_p11d_value: 2e12,
            ..valid_input()
        };
        assert_eq!(input.validate().unwrap_err().field(), "ev_p11d_value");
    }

    #[test]
    fn amount_at_the_ceiling_is_accepted() {
        let input = CalculationInput {
            base_salary: MAX_AMOUNT,
            bonus: MAX_AMOUNT,
            ..valid_input()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn first_violation_in_field_order_wins() {
        let input = CalculationInput {
            bonus: 1e13,
            employee_pension_pct: 150.0,
            other_sacrifice_monthly: -1.0,
            ..valid_input()
        };
        assert_eq!(input.validate().unwrap_err().field(), "bonus");
    }
}
