use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{Customer, Loan};

/// weight of the on-time repayment ratio
const ON_TIME_WEIGHT: Decimal = dec!(25);
/// starting points for loan volume, reduced per loan ever taken
const VOLUME_BASE: Decimal = dec!(20);
const VOLUME_PENALTY_PER_LOAN: Decimal = dec!(5);
/// starting points for recent activity, reduced per loan approved this year
const ACTIVITY_BASE: Decimal = dec!(20);
const ACTIVITY_PENALTY_PER_LOAN: Decimal = dec!(5);
/// awarded when accumulated debt stays within the sanctioned limit
const HEADROOM_BONUS: Decimal = dec!(35);

/// component-level view of a computed credit score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub on_time_history: Decimal,
    pub loan_volume: Decimal,
    pub recent_activity: Decimal,
    pub debt_headroom: Decimal,
    pub over_limit: bool,
}

impl ScoreBreakdown {
    /// unrounded composite score; exactly zero when the debt ceiling is breached
    pub fn total(&self) -> Decimal {
        if self.over_limit {
            Decimal::ZERO
        } else {
            self.on_time_history + self.loan_volume + self.recent_activity + self.debt_headroom
        }
    }

    /// score as reported to callers, nearest integer with ties to even
    pub fn rounded(&self) -> i64 {
        self.total().round().to_i64().unwrap_or(0)
    }
}

/// compute the credit score for a customer from their full loan history
pub fn credit_score(customer: &Customer, past_loans: &[Loan], today: NaiveDate) -> ScoreBreakdown {
    let count = Decimal::from(past_loans.len() as u64);

    let on_time_history = if past_loans.is_empty() {
        Decimal::ZERO
    } else {
        let serviced = past_loans.iter().filter(|l| l.is_fully_serviced()).count();
        Decimal::from(serviced as u64) / count * ON_TIME_WEIGHT
    };

    let loan_volume = (VOLUME_BASE - VOLUME_PENALTY_PER_LOAN * count).max(Decimal::ZERO);

    let this_year = past_loans
        .iter()
        .filter(|l| l.approved_in_year(today.year()))
        .count();
    let recent_activity = (ACTIVITY_BASE - ACTIVITY_PENALTY_PER_LOAN * Decimal::from(this_year as u64))
        .max(Decimal::ZERO);

    let over_limit = customer.is_over_limit();
    let debt_headroom = if over_limit { Decimal::ZERO } else { HEADROOM_BONUS };

    ScoreBreakdown {
        on_time_history,
        loan_volume,
        recent_activity,
        debt_headroom,
        over_limit,
    }
}
