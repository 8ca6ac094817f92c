use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::decimal::Money;
use crate::errors::Result;
use crate::model::{Customer, Loan, NewCustomer, NewLoan};
use crate::store::{CustomerStore, LoanStore};
use crate::types::{CustomerId, LoanId};

/// postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// connect, run pending migrations and hand back a ready store
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("database ready");
        Ok(PgStore { pool })
    }

    /// move the id sequences past explicitly inserted rows so the next
    /// registration or loan gets a fresh id
    pub async fn sync_id_sequences(&self) -> Result<()> {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('customers', 'customer_id'),
                    (SELECT COALESCE(MAX(customer_id), 0) + 1 FROM customers), false)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('loans', 'loan_id'),
                    (SELECT COALESCE(MAX(loan_id), 0) + 1 FROM loans), false)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers
                 (first_name, last_name, age, phone_number,
                  monthly_salary, approved_limit, current_debt)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.age)
        .bind(&customer.phone_number)
        .bind(customer.monthly_salary)
        .bind(customer.approved_limit)
        .bind(customer.current_debt)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE customer_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn add_debt(&self, id: CustomerId, amount: Money) -> Result<()> {
        sqlx::query(
            "UPDATE customers SET current_debt = current_debt + $2 WHERE customer_id = $1",
        )
        .bind(id)
        .bind(amount)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_customer(&self, customer: Customer) -> Result<()> {
        sqlx::query(
            "INSERT INTO customers
                 (customer_id, first_name, last_name, age, phone_number,
                  monthly_salary, approved_limit, current_debt)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (customer_id) DO UPDATE SET
                 first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 age = EXCLUDED.age,
                 phone_number = EXCLUDED.phone_number,
                 monthly_salary = EXCLUDED.monthly_salary,
                 approved_limit = EXCLUDED.approved_limit",
        )
        .bind(customer.customer_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.age)
        .bind(&customer.phone_number)
        .bind(customer.monthly_salary)
        .bind(customer.approved_limit)
        .bind(customer.current_debt)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LoanStore for PgStore {
    async fn insert_loan(&self, loan: NewLoan) -> Result<Loan> {
        let row = sqlx::query_as::<_, Loan>(
            "INSERT INTO loans
                 (customer_id, loan_amount, tenure, interest_rate,
                  monthly_payment, emis_paid_on_time, date_of_approval, end_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(loan.customer_id)
        .bind(loan.loan_amount)
        .bind(loan.tenure)
        .bind(loan.interest_rate)
        .bind(loan.monthly_payment)
        .bind(loan.emis_paid_on_time)
        .bind(loan.date_of_approval)
        .bind(loan.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn loan_by_id(&self, id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE loan_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn loans_for_customer(&self, id: CustomerId) -> Result<Vec<Loan>> {
        let rows = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE customer_id = $1 ORDER BY loan_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_loan(&self, loan: Loan) -> Result<()> {
        sqlx::query(
            "INSERT INTO loans
                 (loan_id, customer_id, loan_amount, tenure, interest_rate,
                  monthly_payment, emis_paid_on_time, date_of_approval, end_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (loan_id) DO UPDATE SET
                 customer_id = EXCLUDED.customer_id,
                 loan_amount = EXCLUDED.loan_amount,
                 tenure = EXCLUDED.tenure,
                 interest_rate = EXCLUDED.interest_rate,
                 monthly_payment = EXCLUDED.monthly_payment,
                 emis_paid_on_time = EXCLUDED.emis_paid_on_time,
                 date_of_approval = EXCLUDED.date_of_approval,
                 end_date = EXCLUDED.end_date",
        )
        .bind(loan.loan_id)
        .bind(loan.customer_id)
        .bind(loan.loan_amount)
        .bind(loan.tenure)
        .bind(loan.interest_rate)
        .bind(loan.monthly_payment)
        .bind(loan.emis_paid_on_time)
        .bind(loan.date_of_approval)
        .bind(loan.end_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
