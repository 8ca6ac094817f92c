pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::decimal::Money;
use crate::errors::Result;
use crate::model::{Customer, Loan, NewCustomer, NewLoan};
use crate::types::{CustomerId, LoanId};

/// customer persistence operations
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// persist a new customer and return it with its assigned id
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer>;

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// add newly disbursed principal to the customer's debt counter
    async fn add_debt(&self, id: CustomerId, amount: Money) -> Result<()>;

    /// insert or replace a customer under an explicit id, keeping any
    /// existing debt counter untouched
    async fn upsert_customer(&self, customer: Customer) -> Result<()>;
}

/// loan persistence operations
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// persist a new loan and return it with its assigned id
    async fn insert_loan(&self, loan: NewLoan) -> Result<Loan>;

    async fn loan_by_id(&self, id: LoanId) -> Result<Option<Loan>>;

    /// full history for a customer, oldest id first
    async fn loans_for_customer(&self, id: CustomerId) -> Result<Vec<Loan>>;

    /// insert or replace a loan under an explicit id
    async fn upsert_loan(&self, loan: Loan) -> Result<()>;
}

/// combined handle the service layer works against
pub trait Store: CustomerStore + LoanStore {}

impl<T: CustomerStore + LoanStore> Store for T {}
