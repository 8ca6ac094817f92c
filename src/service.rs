use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decimal::{Money, Rate};
use crate::eligibility::{EligibilityEngine, EligibilityResult};
use crate::errors::{ApprovalError, Result};
use crate::model::{Customer, Loan, NewCustomer, NewLoan};
use crate::store::Store;
use crate::types::{CustomerId, LoanId, LoanRequest, RegisterCustomerRequest};

/// longest loan term accepted, in months
const MAX_TENURE_MONTHS: i32 = 600;

/// per-customer write locks; evaluation and persistence of a new loan happen
/// under the lock so concurrent requests see each other's debt
#[derive(Default)]
struct CustomerLocks {
    locks: parking_lot::Mutex<HashMap<CustomerId, Arc<tokio::sync::Mutex<()>>>>,
}

impl CustomerLocks {
    fn for_customer(&self, id: CustomerId) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.locks.lock();
        map.entry(id).or_default().clone()
    }
}

/// response body for a created loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanCreated {
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub loan_approved: bool,
    pub message: String,
    pub monthly_installment: Money,
}

/// single loan with its customer embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDetail {
    pub loan_id: LoanId,
    pub customer: Customer,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    pub tenure: i32,
}

/// one row of a customer's loan listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    pub repayments_left: i32,
}

/// application core wiring the store, the eligibility engine and the clock
pub struct ApprovalService {
    store: Arc<dyn Store>,
    engine: EligibilityEngine,
    time: SafeTimeProvider,
    locks: CustomerLocks,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn Store>, time: SafeTimeProvider) -> Self {
        ApprovalService {
            store,
            engine: EligibilityEngine::new(),
            time,
            locks: CustomerLocks::default(),
        }
    }

    fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    /// register a customer, deriving the approved limit from salary
    pub async fn register_customer(&self, request: RegisterCustomerRequest) -> Result<Customer> {
        if !request.monthly_salary.is_positive() {
            return Err(ApprovalError::validation("monthly_salary must be positive"));
        }
        if request.age <= 0 {
            return Err(ApprovalError::validation("age must be positive"));
        }
        let customer = self
            .store
            .insert_customer(NewCustomer::register(
                request.first_name,
                request.last_name,
                request.age,
                request.phone_number,
                request.monthly_salary,
            ))
            .await?;
        info!("registered customer {}", customer.customer_id);
        Ok(customer)
    }

    /// run the eligibility engine without touching any state
    pub async fn check_eligibility(&self, request: &LoanRequest) -> Result<EligibilityResult> {
        validate_terms(request)?;
        let customer = self.customer(request.customer_id).await?;
        let history = self.store.loans_for_customer(request.customer_id).await?;
        Ok(self.engine.evaluate(
            &customer,
            &history,
            request.loan_amount,
            request.interest_rate,
            request.tenure,
            self.today(),
        ))
    }

    /// evaluate and, if approved, persist the loan and grow the debt counter
    pub async fn create_loan(&self, request: &LoanRequest) -> Result<LoanCreated> {
        validate_terms(request)?;
        let lock = self.locks.for_customer(request.customer_id);
        let _guard = lock.lock().await;

        let customer = self.customer(request.customer_id).await?;
        let history = self.store.loans_for_customer(request.customer_id).await?;
        let today = self.today();
        let eligibility = self.engine.evaluate(
            &customer,
            &history,
            request.loan_amount,
            request.interest_rate,
            request.tenure,
            today,
        );

        if !eligibility.approval {
            info!(
                "loan rejected for customer {} with score {}",
                request.customer_id, eligibility.credit_score
            );
            return Err(ApprovalError::LoanNotApproved {
                eligibility: Box::new(eligibility),
            });
        }

        let rate = eligibility
            .corrected_interest_rate
            .unwrap_or(request.interest_rate);
        let installment = eligibility.monthly_installment.unwrap_or(Money::ZERO);
        let loan = self
            .store
            .insert_loan(NewLoan {
                customer_id: request.customer_id,
                loan_amount: request.loan_amount,
                tenure: request.tenure,
                interest_rate: rate,
                monthly_payment: installment,
                emis_paid_on_time: 0,
                date_of_approval: today,
                end_date: Loan::end_date_for(today, request.tenure),
            })
            .await?;
        self.store
            .add_debt(request.customer_id, request.loan_amount)
            .await?;
        info!(
            "created loan {} for customer {} at {}",
            loan.loan_id, loan.customer_id, loan.interest_rate
        );

        Ok(LoanCreated {
            loan_id: loan.loan_id,
            customer_id: loan.customer_id,
            loan_approved: true,
            message: "Loan approved and created successfully".to_string(),
            monthly_installment: loan.monthly_payment,
        })
    }

    /// single loan with its customer embedded
    pub async fn view_loan(&self, loan_id: LoanId) -> Result<LoanDetail> {
        let loan = self
            .store
            .loan_by_id(loan_id)
            .await?
            .ok_or(ApprovalError::LoanNotFound { loan_id })?;
        let customer = self.customer(loan.customer_id).await?;
        Ok(LoanDetail {
            loan_id: loan.loan_id,
            customer,
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            monthly_payment: loan.monthly_payment,
            tenure: loan.tenure,
        })
    }

    /// every loan of a customer with the months still to run
    pub async fn view_customer_loans(&self, customer_id: CustomerId) -> Result<Vec<LoanSummary>> {
        // resolve the customer first so unknown ids surface as not-found
        self.customer(customer_id).await?;
        let today = self.today();
        let loans = self.store.loans_for_customer(customer_id).await?;
        Ok(loans
            .into_iter()
            .map(|loan| LoanSummary {
                loan_id: loan.loan_id,
                loan_amount: loan.loan_amount,
                interest_rate: loan.interest_rate,
                monthly_payment: loan.monthly_payment,
                repayments_left: loan.repayments_left(today),
            })
            .collect())
    }

    async fn customer(&self, customer_id: CustomerId) -> Result<Customer> {
        self.store
            .customer_by_id(customer_id)
            .await?
            .ok_or(ApprovalError::CustomerNotFound { customer_id })
    }
}

fn validate_terms(request: &LoanRequest) -> Result<()> {
    if request.loan_amount.is_negative() {
        return Err(ApprovalError::validation("loan_amount cannot be negative"));
    }
    if request.interest_rate.is_negative() {
        return Err(ApprovalError::validation("interest_rate cannot be negative"));
    }
    if request.tenure > MAX_TENURE_MONTHS {
        return Err(ApprovalError::validation(format!(
            "tenure cannot exceed {MAX_TENURE_MONTHS} months"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn test_service() -> ApprovalService {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        ApprovalService::new(
            Arc::new(MemoryStore::new()),
            SafeTimeProvider::new(TimeSource::Test(start)),
        )
    }

    fn register_request(salary: i64) -> RegisterCustomerRequest {
        RegisterCustomerRequest {
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            age: 34,
            monthly_salary: Money::from_major(salary),
            phone_number: "9876543210".to_string(),
        }
    }

    fn loan_request(customer_id: CustomerId, amount: i64, rate: Rate, tenure: i32) -> LoanRequest {
        LoanRequest {
            customer_id,
            loan_amount: Money::from_major(amount),
            interest_rate: rate,
            tenure,
        }
    }

    #[tokio::test]
    async fn test_register_assigns_id_and_limit() {
        let service = test_service();
        let customer = service
            .register_customer(register_request(133_333))
            .await
            .unwrap();
        assert_eq!(customer.customer_id, 1);
        assert_eq!(customer.approved_limit, Money::from_major(4_800_000));
        assert_eq!(customer.current_debt, Money::ZERO);
    }

    #[tokio::test]
    async fn test_register_rejects_non_positive_salary() {
        let service = test_service();
        let err = service
            .register_customer(register_request(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_check_eligibility_unknown_customer() {
        let service = test_service();
        let err = service
            .check_eligibility(&loan_request(99, 100_000, Rate::from_percent(dec!(12)), 12))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApprovalError::CustomerNotFound { customer_id: 99 }
        ));
    }

    #[tokio::test]
    async fn test_tenure_above_cap_is_validation_error() {
        let service = test_service();
        let customer = service
            .register_customer(register_request(100_000))
            .await
            .unwrap();
        let over = loan_request(customer.customer_id, 100_000, Rate::from_percent(dec!(12)), 7_000);
        let err = service.create_loan(&over).await.unwrap_err();
        assert!(matches!(err, ApprovalError::Validation { .. }));
        let err = service.check_eligibility(&over).await.unwrap_err();
        assert!(matches!(err, ApprovalError::Validation { .. }));

        // the cap itself is accepted
        let at_cap = loan_request(customer.customer_id, 100_000, Rate::from_percent(dec!(12)), 600);
        assert!(service.create_loan(&at_cap).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_loan_persists_terms_and_debt() {
        let service = test_service();
        let customer = service
            .register_customer(register_request(100_000))
            .await
            .unwrap();
        let created = service
            .create_loan(&loan_request(
                customer.customer_id,
                100_000,
                Rate::from_percent(dec!(12)),
                12,
            ))
            .await
            .unwrap();
        assert!(created.loan_approved);
        assert_eq!(created.loan_id, 1);
        assert_eq!(
            created.monthly_installment,
            Money::from_str_exact("8884.88").unwrap()
        );

        let detail = service.view_loan(created.loan_id).await.unwrap();
        assert_eq!(detail.customer.current_debt, Money::from_major(100_000));
        assert_eq!(detail.interest_rate, Rate::from_percent(dec!(12)));
        assert_eq!(detail.tenure, 12);
        // approval date comes from the injected clock
        let loans = service
            .view_customer_loans(customer.customer_id)
            .await
            .unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].repayments_left, 12);
    }

    #[tokio::test]
    async fn test_create_loan_stores_corrected_rate() {
        let service = test_service();
        let customer = service
            .register_customer(register_request(500_000))
            .await
            .unwrap();
        // import a busy current-year history that lands the score on the
        // 12% floor tier
        for (i, serviced) in [true, true, true, false, false].iter().enumerate() {
            let approval = NaiveDate::from_ymd_opt(2024, 1 + i as u32, 2).unwrap();
            service
                .store
                .upsert_loan(Loan {
                    loan_id: 100 + i as LoanId,
                    customer_id: customer.customer_id,
                    loan_amount: Money::from_major(50_000),
                    tenure: 2,
                    interest_rate: Rate::from_percent(dec!(10)),
                    monthly_payment: Money::from_major(5_000),
                    emis_paid_on_time: if *serviced { 2 } else { 0 },
                    date_of_approval: approval,
                    end_date: Loan::end_date_for(approval, 2),
                })
                .await
                .unwrap();
        }
        let eligibility = service
            .check_eligibility(&loan_request(
                customer.customer_id,
                200_000,
                Rate::from_percent(dec!(8.5)),
                6,
            ))
            .await
            .unwrap();
        assert_eq!(eligibility.credit_score, 50);
        assert_eq!(
            eligibility.corrected_interest_rate,
            Some(Rate::from_percent(dec!(12)))
        );

        let created = service
            .create_loan(&loan_request(
                customer.customer_id,
                200_000,
                Rate::from_percent(dec!(8.5)),
                6,
            ))
            .await
            .unwrap();
        let detail = service.view_loan(created.loan_id).await.unwrap();
        assert_eq!(detail.interest_rate, Rate::from_percent(dec!(12)));
        assert_eq!(detail.customer.current_debt, Money::from_major(200_000));
    }

    #[tokio::test]
    async fn test_create_loan_rejection_carries_eligibility() {
        let service = test_service();
        let customer = service
            .register_customer(register_request(100_000))
            .await
            .unwrap();
        // debt imported over the sanctioned limit zeroes the score
        service
            .store
            .add_debt(customer.customer_id, Money::from_major(4_000_000))
            .await
            .unwrap();
        let err = service
            .create_loan(&loan_request(
                customer.customer_id,
                100_000,
                Rate::from_percent(dec!(12)),
                12,
            ))
            .await
            .unwrap_err();
        match err {
            ApprovalError::LoanNotApproved { eligibility } => {
                assert_eq!(eligibility.credit_score, 0);
                assert!(!eligibility.approval);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // nothing was persisted
        assert!(service
            .view_customer_loans(customer.customer_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_serialize_per_customer() {
        let service = Arc::new(test_service());
        let customer = service
            .register_customer(register_request(100_000))
            .await
            .unwrap();
        // each loan alone fits the limit check, but whichever lands second
        // must see the first one's debt and be declined
        let request = loan_request(
            customer.customer_id,
            4_000_000,
            Rate::from_percent(dec!(12)),
            12,
        );
        let (a, b) = tokio::join!(service.create_loan(&request), service.create_loan(&request));
        let approvals = [a.is_ok(), b.is_ok()];
        assert_eq!(approvals.iter().filter(|ok| **ok).count(), 1);
        let rejected = if a.is_err() { a } else { b };
        assert!(matches!(
            rejected.unwrap_err(),
            ApprovalError::LoanNotApproved { .. }
        ));
    }

    #[tokio::test]
    async fn test_view_loan_unknown_id() {
        let service = test_service();
        let err = service.view_loan(404).await.unwrap_err();
        assert!(matches!(err, ApprovalError::LoanNotFound { loan_id: 404 }));
    }

    #[tokio::test]
    async fn test_view_loans_unknown_customer() {
        let service = test_service();
        let err = service.view_customer_loans(404).await.unwrap_err();
        assert!(matches!(
            err,
            ApprovalError::CustomerNotFound { customer_id: 404 }
        ));
    }
}
