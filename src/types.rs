use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// unique identifier for a customer
pub type CustomerId = i64;

/// unique identifier for a loan
pub type LoanId = i64;

/// payload for registering a new customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub monthly_salary: Money,
    pub phone_number: String,
}

/// proposed loan terms, shared by eligibility checks and loan creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub tenure: i32,
}

/// approval tier derived from the unrounded credit score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalTier {
    /// score above 50, any interest rate accepted
    Prime,
    /// score above 30 up to 50, rate floored at 12%
    NearPrime,
    /// score above 10 up to 30, rate floored at 16%
    Subprime,
    /// score of 10 or below, no loan offered
    Declined,
}

impl ApprovalTier {
    /// classify an unrounded credit score
    pub fn from_score(score: Decimal) -> Self {
        if score > dec!(50) {
            ApprovalTier::Prime
        } else if score > dec!(30) {
            ApprovalTier::NearPrime
        } else if score > dec!(10) {
            ApprovalTier::Subprime
        } else {
            ApprovalTier::Declined
        }
    }

    /// whether this tier can be offered a loan at all
    pub fn approved(&self) -> bool {
        !matches!(self, ApprovalTier::Declined)
    }

    /// minimum interest rate the tier may be priced at
    pub fn rate_floor(&self) -> Option<Rate> {
        match self {
            ApprovalTier::Prime => None,
            ApprovalTier::NearPrime => Some(Rate::from_percent(dec!(12))),
            ApprovalTier::Subprime => Some(Rate::from_percent(dec!(16))),
            ApprovalTier::Declined => None,
        }
    }
}
