use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::decimal::{Money, Rate};
use crate::types::{CustomerId, LoanId};

/// customer record as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: String,
    pub monthly_salary: Money,
    pub approved_limit: Money,
    pub current_debt: Money,
}

impl Customer {
    /// sanctioned limit derived from salary at registration:
    /// 36x monthly salary, rounded to the nearest 100_000
    pub fn approved_limit_for(monthly_salary: Money) -> Money {
        (monthly_salary * Decimal::from(36)).round_to_nearest(100_000)
    }

    /// whether accumulated principal has breached the sanctioned limit
    pub fn is_over_limit(&self) -> bool {
        self.current_debt > self.approved_limit
    }
}

/// customer data not yet assigned an identifier
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: String,
    pub monthly_salary: Money,
    pub approved_limit: Money,
    pub current_debt: Money,
}

impl NewCustomer {
    /// build a registration record with the derived limit and zero debt
    pub fn register(
        first_name: String,
        last_name: String,
        age: i32,
        phone_number: String,
        monthly_salary: Money,
    ) -> Self {
        let approved_limit = Customer::approved_limit_for(monthly_salary);
        NewCustomer {
            first_name,
            last_name,
            age,
            phone_number,
            monthly_salary,
            approved_limit,
            current_debt: Money::ZERO,
        }
    }
}

/// loan record as persisted; `interest_rate` is the rate the loan was
/// actually priced at, after any tier correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub tenure: i32,
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    pub emis_paid_on_time: i32,
    pub date_of_approval: NaiveDate,
    pub end_date: NaiveDate,
}

impl Loan {
    /// every scheduled installment was paid on time
    pub fn is_fully_serviced(&self) -> bool {
        self.emis_paid_on_time >= self.tenure
    }

    /// still running on the given date
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.end_date >= today
    }

    /// approved during the given calendar year
    pub fn approved_in_year(&self, year: i32) -> bool {
        self.date_of_approval.year() == year
    }

    /// whole calendar months from `today` until the end date, floored at zero
    pub fn repayments_left(&self, today: NaiveDate) -> i32 {
        let months = (self.end_date.year() - today.year()) * 12
            + (self.end_date.month() as i32 - today.month() as i32);
        months.max(0)
    }

    /// nominal end date: approval plus thirty days per month of tenure
    pub fn end_date_for(approval: NaiveDate, tenure: i32) -> NaiveDate {
        approval + chrono::Duration::days(tenure as i64 * 30)
    }
}

/// loan data not yet assigned an identifier
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub tenure: i32,
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    pub emis_paid_on_time: i32,
    pub date_of_approval: NaiveDate,
    pub end_date: NaiveDate,
}
