mod engine;
mod types;

pub use engine::{
    INCOME_TAX_BANDS, NATIONAL_INSURANCE_BANDS, apply_marginal_bands, base_child_benefit,
    child_benefit_charge, compute, personal_allowance,
};
pub use types::{CalculationInput, CalculationResult, InvalidInputError, MAX_AMOUNT, TaxBand};
