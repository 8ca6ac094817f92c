use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::decimal::Money;
use crate::errors::Result;
use crate::model::{Customer, Loan, NewCustomer, NewLoan};
use crate::store::{CustomerStore, LoanStore};
use crate::types::{CustomerId, LoanId};

/// in-memory store for tests and local experimentation
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    customers: HashMap<CustomerId, Customer>,
    loans: HashMap<LoanId, Loan>,
    last_customer_id: CustomerId,
    last_loan_id: LoanId,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let mut inner = self.inner.lock().await;
        inner.last_customer_id += 1;
        let customer = Customer {
            customer_id: inner.last_customer_id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            age: customer.age,
            phone_number: customer.phone_number,
            monthly_salary: customer.monthly_salary,
            approved_limit: customer.approved_limit,
            current_debt: customer.current_debt,
        };
        inner.customers.insert(customer.customer_id, customer.clone());
        Ok(customer)
    }

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        let inner = self.inner.lock().await;
        Ok(inner.customers.get(&id).cloned())
    }

    async fn add_debt(&self, id: CustomerId, amount: Money) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(customer) = inner.customers.get_mut(&id) {
            customer.current_debt += amount;
        }
        Ok(())
    }

    async fn upsert_customer(&self, customer: Customer) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.last_customer_id = inner.last_customer_id.max(customer.customer_id);
        match inner.customers.get_mut(&customer.customer_id) {
            Some(existing) => {
                let kept_debt = existing.current_debt;
                *existing = Customer {
                    current_debt: kept_debt,
                    ..customer
                };
            }
            None => {
                inner.customers.insert(customer.customer_id, customer);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert_loan(&self, loan: NewLoan) -> Result<Loan> {
        let mut inner = self.inner.lock().await;
        inner.last_loan_id += 1;
        let loan = Loan {
            loan_id: inner.last_loan_id,
            customer_id: loan.customer_id,
            loan_amount: loan.loan_amount,
            tenure: loan.tenure,
            interest_rate: loan.interest_rate,
            monthly_payment: loan.monthly_payment,
            emis_paid_on_time: loan.emis_paid_on_time,
            date_of_approval: loan.date_of_approval,
            end_date: loan.end_date,
        };
        inner.loans.insert(loan.loan_id, loan.clone());
        Ok(loan)
    }

    async fn loan_by_id(&self, id: LoanId) -> Result<Option<Loan>> {
        let inner = self.inner.lock().await;
        Ok(inner.loans.get(&id).cloned())
    }

    async fn loans_for_customer(&self, id: CustomerId) -> Result<Vec<Loan>> {
        let inner = self.inner.lock().await;
        let mut loans: Vec<Loan> = inner
            .loans
            .values()
            .filter(|l| l.customer_id == id)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.loan_id);
        Ok(loans)
    }

    async fn upsert_loan(&self, loan: Loan) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.last_loan_id = inner.last_loan_id.max(loan.loan_id);
        inner.loans.insert(loan.loan_id, loan);
        Ok(())
    }
}
