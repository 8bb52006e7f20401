use super::types::{CalculationInput, CalculationResult, TaxBand};

pub const PERSONAL_ALLOWANCE: f64 = 12_570.0;
pub const ALLOWANCE_TAPER_START: f64 = 100_000.0;

/// Zero-emission company cars.
pub const EV_BIK_RATE: f64 = 0.02;

pub const CHILD_BENEFIT_ELDEST: f64 = 1_331.20;
pub const CHILD_BENEFIT_ADDITIONAL: f64 = 881.40;
pub const CHILD_BENEFIT_CHARGE_START: f64 = 60_000.0;
pub const CHILD_BENEFIT_CHARGE_WIDTH: f64 = 20_000.0;

/// Bands over taxable income, i.e. after the personal allowance has been deducted.
pub const INCOME_TAX_BANDS: [TaxBand; 3] = [
    TaxBand::new(37_700.0, 0.20),
    TaxBand::new(125_140.0 - 50_270.0, 0.40),
    TaxBand::unbounded(0.45),
];

/// Bands over taxable gross pay. The primary threshold is a zero-rate band.
pub const NATIONAL_INSURANCE_BANDS: [TaxBand; 3] = [
    TaxBand::new(12_570.0, 0.0),
    TaxBand::new(50_270.0 - 12_570.0, 0.08),
    TaxBand::unbounded(0.02),
];

pub fn compute(input: &CalculationInput) -> CalculationResult {
    let pensionable = if input.pension_applies_to_bonus {
        input.base_salary + input.bonus
    } else {
        input.base_salary
    };
    let employee_pension = pensionable * input.employee_pension_pct / 100.0;
    let employer_pension = pensionable * input.employer_pension_pct / 100.0;

    let ev_lease_annual = input.ev_lease_monthly * 12.0;
    let other_sacrifice_annual = input.other_sacrifice_monthly * 12.0;
    let total_gross = input.total_gross();
    let taxable_gross = total_gross - employee_pension - ev_lease_annual - other_sacrifice_annual;

    let benefit_in_kind = input.ev_p11d_value * EV_BIK_RATE;
    let adjusted_net_income = taxable_gross + benefit_in_kind;

    let allowance = personal_allowance(adjusted_net_income);
    let taxable_income = (adjusted_net_income - allowance).max(0.0);
    let income_tax = apply_marginal_bands(taxable_income, &INCOME_TAX_BANDS);
    let national_insurance = apply_marginal_bands(taxable_gross, &NATIONAL_INSURANCE_BANDS);
    let child_benefit_charge = child_benefit_charge(adjusted_net_income, input.num_children);

    let take_home = taxable_gross - income_tax - national_insurance - child_benefit_charge;

    CalculationResult {
        take_home_annual: take_home,
        income_tax_annual: income_tax,
        national_insurance_annual: national_insurance,
        child_benefit_charge_annual: child_benefit_charge,
        employee_pension_annual: employee_pension,
        employer_pension_annual: employer_pension,
        total_pension_pot_annual: employee_pension + employer_pension,
        adjusted_net_income_annual: adjusted_net_income,
        total_package_value_annual: total_gross + employer_pension,
        taxable_gross_annual: taxable_gross,
        benefit_in_kind_annual: benefit_in_kind,
        ev_lease_annual,
        other_sacrifice_annual,
        personal_allowance: allowance,
        taxable_income_annual: taxable_income,
    }
}

/// Consumes `amount` through `bands` in order, each band taking up to its width.
pub fn apply_marginal_bands(amount: f64, bands: &[TaxBand]) -> f64 {
    let mut remaining = amount.max(0.0);
    let mut total = 0.0;
    for band in bands {
        if remaining <= 0.0 {
            break;
        }
        let slice = remaining.min(band.width);
        total += slice * band.rate;
        remaining -= slice;
    }
    total
}

/// £1 of allowance is withdrawn for every £2 above the taper start.
pub fn personal_allowance(adjusted_net_income: f64) -> f64 {
    if adjusted_net_income <= ALLOWANCE_TAPER_START {
        return PERSONAL_ALLOWANCE;
    }
    (PERSONAL_ALLOWANCE - (adjusted_net_income - ALLOWANCE_TAPER_START) / 2.0).max(0.0)
}

pub fn base_child_benefit(num_children: u32) -> f64 {
    if num_children == 0 {
        return 0.0;
    }
    CHILD_BENEFIT_ELDEST + f64::from(num_children - 1) * CHILD_BENEFIT_ADDITIONAL
}

pub fn child_benefit_charge(adjusted_net_income: f64, num_children: u32) -> f64 {
    if num_children == 0 || adjusted_net_income <= CHILD_BENEFIT_CHARGE_START {
        return 0.0;
    }
    let clawback =
        ((adjusted_net_income - CHILD_BENEFIT_CHARGE_START) / CHILD_BENEFIT_CHARGE_WIDTH).min(1.0);
    base_child_benefit(num_children) * clawback
}
