use thiserror::Error;

use crate::eligibility::EligibilityResult;
use crate::types::{CustomerId, LoanId};

#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("customer not found: {customer_id}")]
    CustomerNotFound {
        customer_id: CustomerId,
    },

    #[error("loan not found: {loan_id}")]
    LoanNotFound {
        loan_id: LoanId,
    },

    #[error("loan not approved based on eligibility check")]
    LoanNotApproved {
        eligibility: Box<EligibilityResult>,
    },

    #[error("invalid request: {message}")]
    Validation {
        message: String,
    },

    #[error("data file not found: {path}")]
    DataFileMissing {
        path: String,
    },

    #[error("malformed record in {path}: {message}")]
    MalformedRecord {
        path: String,
        message: String,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApprovalError {
    /// shorthand for request validation failures
    pub fn validation(message: impl Into<String>) -> Self {
        ApprovalError::Validation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApprovalError>;
