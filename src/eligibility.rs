use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::model::{Customer, Loan};
use crate::payments;
use crate::scoring;
use crate::types::{ApprovalTier, CustomerId};

/// outcome of evaluating a proposed loan
///
/// `corrected_interest_rate` and `monthly_installment` are only populated
/// when the loan is approved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub customer_id: CustomerId,
    pub credit_score: i64,
    pub approval: bool,
    pub interest_rate: Rate,
    pub corrected_interest_rate: Option<Rate>,
    pub tenure: i32,
    pub monthly_installment: Option<Money>,
}

/// scoring, tier selection, affordability veto and installment pricing
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityEngine;

impl EligibilityEngine {
    pub fn new() -> Self {
        EligibilityEngine
    }

    /// evaluate a proposed loan against a customer's record and full history
    pub fn evaluate(
        &self,
        customer: &Customer,
        past_loans: &[Loan],
        loan_amount: Money,
        interest_rate: Rate,
        tenure: i32,
        today: NaiveDate,
    ) -> EligibilityResult {
        let breakdown = scoring::credit_score(customer, past_loans, today);
        let score = breakdown.total();

        let tier = ApprovalTier::from_score(score);
        let mut approval = tier.approved();
        let corrected_rate = match tier.rate_floor() {
            Some(floor) => interest_rate.max(floor),
            None => interest_rate,
        };

        // active installments above half the salary veto the tier outcome
        let obligations = payments::monthly_obligations(past_loans, today);
        if obligations > customer.monthly_salary.half() {
            approval = false;
        }

        // a term that is non-positive or beyond the decimal range cannot be priced
        let mut monthly_installment = None;
        if approval {
            if tenure > 0 {
                match payments::calculate_emi(loan_amount, corrected_rate, tenure as u32) {
                    Some(emi) => monthly_installment = Some(emi.round_dp(2)),
                    None => approval = false,
                }
            } else {
                approval = false;
            }
        }

        EligibilityResult {
            customer_id: customer.customer_id,
            credit_score: breakdown.rounded(),
            approval,
            interest_rate,
            corrected_interest_rate: approval.then(|| corrected_rate.round_dp(2)),
            tenure,
            monthly_installment,
        }
    }
}
