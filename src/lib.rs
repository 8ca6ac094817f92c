pub mod config;
pub mod decimal;
pub mod eligibility;
pub mod errors;
pub mod http;
pub mod ingest;
pub mod model;
pub mod payments;
pub mod scoring;
pub mod service;
pub mod store;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use eligibility::{EligibilityEngine, EligibilityResult};
pub use errors::{ApprovalError, Result};
pub use ingest::IngestReport;
pub use model::{Customer, Loan, NewCustomer, NewLoan};
pub use scoring::ScoreBreakdown;
pub use service::{ApprovalService, LoanCreated, LoanDetail, LoanSummary};
pub use store::{CustomerStore, LoanStore, Store};
pub use types::{ApprovalTier, CustomerId, LoanId, LoanRequest, RegisterCustomerRequest};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
