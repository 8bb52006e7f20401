//! Saved income profiles.
//!
//! A profile is the slow-moving part of an input (salary, bonus, pension rates,
//! children) so it can be reloaded while the sacrifice figures are varied. The
//! store is owned by the caller; the calculator never reads it.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::core::{CalculationInput, InvalidInputError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub base_salary: f64,
    pub bonus: f64,
    pub employee_pension_pct: f64,
    pub employer_pension_pct: f64,
    pub num_children: u32,
}

impl Profile {
    pub fn from_input(input: &CalculationInput) -> Self {
        Self {
            base_salary: input.base_salary,
            bonus: input.bonus,
            employee_pension_pct: input.employee_pension_pct,
            employer_pension_pct: input.employer_pension_pct,
            num_children: input.num_children,
        }
    }

    /// Overwrites the profiled fields; EV and other sacrifice fields are left as they are.
    pub fn apply_to(&self, input: &mut CalculationInput) {
        input.base_salary = self.base_salary;
        input.bonus = self.bonus;
        input.employee_pension_pct = self.employee_pension_pct;
        input.employer_pension_pct = self.employer_pension_pct;
        input.num_children = self.num_children;
    }

    pub fn validate(&self) -> Result<(), InvalidInputError> {
        let mut probe = CalculationInput {
            base_salary: 0.0,
            bonus: 0.0,
            employee_pension_pct: 0.0,
            employer_pension_pct: 0.0,
            pension_applies_to_bonus: false,
            ev_lease_monthly: 0.0,
            ev_p11d_value: 0.0,
            other_sacrifice_monthly: 0.0,
            num_children: 0,
        };
        self.apply_to(&mut probe);
        probe.validate()
    }
}

pub trait ProfileStore: Send + Sync {
    fn save(&self, session: &str, profile: Profile);
    fn load(&self, session: &str) -> Option<Profile>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn save(&self, session: &str, profile: Profile) {
        let mut profiles = self
            .profiles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        profiles.insert(session.to_string(), profile);
    }

    fn load(&self, session: &str) -> Option<Profile> {
        let profiles = self
            .profiles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        profiles.get(session).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        Profile {
            base_salary: 82_000.0,
            bonus: 6_000.0,
            employee_pension_pct: 7.0,
            employer_pension_pct: 5.0,
            num_children: 2,
        }
    }

    #[test]
    fn load_returns_none_for_unknown_session() {
        let store = InMemoryProfileStore::new();
        assert_eq!(store.load("missing"), None);
    }

    #[test]
    fn save_then_load_is_keyed_by_session() {
        let store = InMemoryProfileStore::new();
        store.save("alice", sample_profile());

        let mut other = sample_profile();
        other.base_salary = 30_000.0;
        store.save("bob", other.clone());

        assert_eq!(store.load("alice"), Some(sample_profile()));
        assert_eq!(store.load("bob"), Some(other));
    }

    #[test]
    fn save_overwrites_previous_profile() {
        let store = InMemoryProfileStore::new();
        store.save("s", sample_profile());
        let mut updated = sample_profile();
        updated.num_children = 0;
        store.save("s", updated.clone());
        assert_eq!(store.load("s"), Some(updated));
    }

    #[test]
    fn apply_to_keeps_sacrifice_fields() {
        let mut input = CalculationInput {
            base_salary: 1.0,
            bonus: 1.0,
            employee_pension_pct: 1.0,
            employer_pension_pct: 1.0,
            pension_applies_to_bonus: true,
            ev_lease_monthly: 450.0,
            ev_p11d_value: 40_000.0,
            other_sacrifice_monthly: 25.0,
            num_children: 0,
        };
        sample_profile().apply_to(&mut input);

        assert_eq!(input.base_salary, 82_000.0);
        assert_eq!(input.num_children, 2);
        assert_eq!(input.ev_lease_monthly, 450.0);
        assert_eq!(input.ev_p11d_value, 40_000.0);
        assert_eq!(input.other_sacrifice_monthly, 25.0);
        assert!(input.pension_applies_to_bonus);
        assert_eq!(Profile::from_input(&input), sample_profile());
    }

    #[test]
    fn validate_rejects_out_of_range_percentage() {
        let mut profile = sample_profile();
        profile.employer_pension_pct = 150.0;
        let err = profile.validate().expect_err("must reject");
        assert_eq!(err.field(), "employer_pension_pct");
        assert!(err.to_string().contains("percentage must be in [0,100]"));
    }
}
