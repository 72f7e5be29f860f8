use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::FIELD_DELIMITER;

/// Fraction of the ceiling at which spending counts as "near the limit".
pub const NEAR_LIMIT_THRESHOLD: f64 = 0.8;

/// Spending tracker for one wishlist: an optional ceiling and an
/// accumulated spent amount. Both figures are kept non-negative; negative
/// inputs are rejected with a warning and leave the prior value unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    max_budget: f64,
    spent_amount: f64,
    enabled: bool,
}

impl Budget {
    /// Disabled budget with zero ceiling and zero spent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_budget: 0.0,
            spent_amount: 0.0,
            enabled: false,
        }
    }

    /// Enabled budget with the given ceiling.
    #[must_use]
    pub fn with_limit(max_budget: f64) -> Self {
        Self {
            max_budget,
            spent_amount: 0.0,
            enabled: true,
        }
    }

    /// Set the ceiling. Enables tracking as a side effect.
    pub fn set_max(&mut self, amount: f64) {
        if amount < 0.0 {
            warn!("rejecting negative max budget: {amount}");
            return;
        }
        self.max_budget = amount;
        self.enabled = true;
        info!("max budget set to {amount}");
    }

    pub fn set_spent(&mut self, amount: f64) {
        if amount < 0.0 {
            warn!("rejecting negative spent amount: {amount}");
            return;
        }
        self.spent_amount = amount;
        debug!("spent amount set to {amount}");
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[must_use]
    pub fn max_budget(&self) -> f64 {
        self.max_budget
    }

    #[must_use]
    pub fn spent_amount(&self) -> f64 {
        self.spent_amount
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.max_budget - self.spent_amount
    }

    /// Spent as a percentage of the ceiling; 0 when no ceiling is set.
    #[must_use]
    pub fn spending_percentage(&self) -> f64 {
        if self.max_budget <= 0.0 {
            return 0.0;
        }
        self.spent_amount / self.max_budget * 100.0
    }

    pub fn add_expense(&mut self, amount: f64) {
        if amount < 0.0 {
            warn!("rejecting negative expense: {amount}");
            return;
        }
        self.spent_amount += amount;
        debug!(
            "added expense {amount}, total spent {}",
            self.spent_amount
        );

        if self.is_near_limit(NEAR_LIMIT_THRESHOLD) && !self.is_over_budget() {
            warn!(
                "approaching budget limit ({:.2}% used)",
                self.spending_percentage()
            );
        }
        if self.is_over_budget() {
            warn!(
                "over budget: spent {}, limit {}",
                self.spent_amount, self.max_budget
            );
        }
    }

    /// Remove an expense; the spent amount never drops below zero.
    pub fn remove_expense(&mut self, amount: f64) {
        if amount < 0.0 {
            warn!("rejecting negative expense removal: {amount}");
            return;
        }
        self.spent_amount = (self.spent_amount - amount).max(0.0);
        debug!(
            "removed expense {amount}, total spent {}",
            self.spent_amount
        );
    }

    /// Reset the spent amount to zero; the ceiling is untouched.
    pub fn reset(&mut self) {
        self.spent_amount = 0.0;
        info!("spent amount reset to 0");
    }

    /// False while disabled or without a positive ceiling.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        if !self.enabled || self.max_budget <= 0.0 {
            return false;
        }
        self.spent_amount > self.max_budget
    }

    /// False while disabled or without a positive ceiling.
    #[must_use]
    pub fn is_near_limit(&self, threshold: f64) -> bool {
        if !self.enabled || self.max_budget <= 0.0 {
            return false;
        }
        self.spent_amount / self.max_budget >= threshold
    }

    #[must_use]
    pub fn status_message(&self) -> String {
        if !self.enabled {
            return "Budget tracking is disabled".to_string();
        }
        if self.is_over_budget() {
            let overage = self.spent_amount - self.max_budget;
            format!("OVER BUDGET by €{overage:.2}!")
        } else if self.is_near_limit(0.9) {
            format!("Warning: {:.2}% of budget used", self.spending_percentage())
        } else {
            format!("Within budget ({:.2}%)", self.spending_percentage())
        }
    }

    /// Encode as `max|spent|enabled` with two-decimal amounts.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{:.2}|{:.2}|{}",
            self.max_budget,
            self.spent_amount,
            i32::from(self.enabled)
        )
    }

    /// Decode the `max|spent|enabled` form. Malformed text (fewer than 3
    /// fields, unparsable numbers) yields a default disabled budget rather
    /// than an error.
    #[must_use]
    pub fn decode(data: &str) -> Self {
        let fields: Vec<&str> = data.trim_end().split(FIELD_DELIMITER).collect();
        if fields.len() < 3 {
            warn!("malformed budget record, using defaults");
            return Self::new();
        }
        let (Ok(max_budget), Ok(spent_amount)) =
            (fields[0].parse::<f64>(), fields[1].parse::<f64>())
        else {
            warn!("malformed budget record, using defaults");
            return Self::new();
        };
        Self {
            max_budget,
            spent_amount,
            enabled: fields[2] == "1",
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_disabled_and_zero() {
        let budget = Budget::new();
        assert!(!budget.is_enabled());
        assert!(budget.max_budget().abs() < f64::EPSILON);
        assert!(budget.spent_amount().abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_max_enables() {
        let mut budget = Budget::new();
        budget.set_max(100.0);
        assert!(budget.is_enabled());
        assert!((budget.max_budget() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_max_rejected() {
        let mut budget = Budget::with_limit(50.0);
        budget.set_max(-10.0);
        assert!((budget.max_budget() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_spent_rejected() {
        let mut budget = Budget::with_limit(50.0);
        budget.set_spent(20.0);
        budget.set_spent(-5.0);
        assert!((budget.spent_amount() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_and_remove_expense() {
        let mut budget = Budget::with_limit(100.0);
        budget.add_expense(30.0);
        budget.add_expense(20.0);
        assert!((budget.spent_amount() - 50.0).abs() < f64::EPSILON);
        budget.remove_expense(10.0);
        assert!((budget.spent_amount() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_expense_clamps_at_zero() {
        let mut budget = Budget::with_limit(100.0);
        budget.add_expense(10.0);
        budget.remove_expense(25.0);
        assert!(budget.spent_amount().abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_expense_rejected() {
        let mut budget = Budget::with_limit(100.0);
        budget.add_expense(-10.0);
        assert!(budget.spent_amount().abs() < f64::EPSILON);
        budget.add_expense(10.0);
        budget.remove_expense(-5.0);
        assert!((budget.spent_amount() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remaining_and_percentage() {
        let mut budget = Budget::with_limit(200.0);
        budget.add_expense(50.0);
        assert!((budget.remaining() - 150.0).abs() < f64::EPSILON);
        assert!((budget.spending_percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_zero_without_ceiling() {
        let mut budget = Budget::new();
        budget.enable();
        budget.set_spent(10.0);
        assert!(budget.spending_percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn test_over_budget() {
        let mut budget = Budget::with_limit(50.0);
        budget.add_expense(60.0);
        assert!(budget.is_over_budget());

        budget.disable();
        assert!(!budget.is_over_budget());
    }

    #[test]
    fn test_over_budget_requires_positive_ceiling() {
        let mut budget = Budget::new();
        budget.enable();
        budget.set_spent(10.0);
        assert!(!budget.is_over_budget());
    }

    #[test]
    fn test_near_limit() {
        let mut budget = Budget::with_limit(12.0);
        budget.set_spent(10.0);
        // 10/12 ≈ 83%
        assert!(budget.is_near_limit(0.8));
        assert!(!budget.is_near_limit(0.9));
        assert!(!budget.is_over_budget());
    }

    #[test]
    fn test_near_limit_disabled() {
        let mut budget = Budget::with_limit(10.0);
        budget.set_spent(9.0);
        budget.disable();
        assert!(!budget.is_near_limit(0.8));
    }

    #[test]
    fn test_reset() {
        let mut budget = Budget::with_limit(100.0);
        budget.add_expense(40.0);
        budget.reset();
        assert!(budget.spent_amount().abs() < f64::EPSILON);
        assert!((budget.max_budget() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_status_messages() {
        let mut budget = Budget::new();
        assert_eq!(budget.status_message(), "Budget tracking is disabled");

        budget.set_max(100.0);
        budget.set_spent(30.0);
        assert_eq!(budget.status_message(), "Within budget (30.00%)");

        budget.set_spent(95.0);
        assert_eq!(budget.status_message(), "Warning: 95.00% of budget used");

        budget.set_spent(120.0);
        assert_eq!(budget.status_message(), "OVER BUDGET by €20.00!");
    }

    #[test]
    fn test_encode_format() {
        let mut budget = Budget::with_limit(100.0);
        budget.set_spent(37.5);
        assert_eq!(budget.encode(), "100.00|37.50|1");

        budget.disable();
        assert_eq!(budget.encode(), "100.00|37.50|0");
    }

    #[test]
    fn test_decode_round_trip() {
        let mut budget = Budget::with_limit(250.0);
        budget.set_spent(99.99);
        let decoded = Budget::decode(&budget.encode());
        assert!((decoded.max_budget() - 250.0).abs() < f64::EPSILON);
        assert!((decoded.spent_amount() - 99.99).abs() < f64::EPSILON);
        assert!(decoded.is_enabled());
    }

    #[test]
    fn test_decode_malformed_yields_default() {
        for text in ["", "100.00", "100.00|37.50", "abc|37.50|1", "100.00|x|1"] {
            let budget = Budget::decode(text);
            assert!(!budget.is_enabled(), "input {text:?}");
            assert!(budget.max_budget().abs() < f64::EPSILON, "input {text:?}");
            assert!(budget.spent_amount().abs() < f64::EPSILON, "input {text:?}");
        }
    }
}
