use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::decimal::{Money, Rate};
use crate::errors::{ApprovalError, Result};
use crate::model::{Customer, Loan};
use crate::store::Store;

const DATE_FORMAT: &str = "%m/%d/%Y";

/// row shape of customer_data.csv
#[derive(Debug, Deserialize)]
struct CustomerRecord {
    #[serde(rename = "Customer ID")]
    customer_id: i64,
    #[serde(rename = "First Name")]
    first_name: String,
    #[serde(rename = "Last Name")]
    last_name: String,
    #[serde(rename = "Age")]
    age: i32,
    #[serde(rename = "Phone Number")]
    phone_number: String,
    #[serde(rename = "Monthly Salary")]
    monthly_salary: Decimal,
    #[serde(rename = "Approved Limit")]
    approved_limit: Decimal,
}

impl CustomerRecord {
    fn into_customer(self) -> Customer {
        Customer {
            customer_id: self.customer_id,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            phone_number: self.phone_number,
            monthly_salary: Money::from_decimal(self.monthly_salary),
            approved_limit: Money::from_decimal(self.approved_limit),
            current_debt: Money::ZERO,
        }
    }
}

/// row shape of loan_data.csv
#[derive(Debug, Deserialize)]
struct LoanRecord {
    #[serde(rename = "Loan ID")]
    loan_id: i64,
    #[serde(rename = "Customer ID")]
    customer_id: i64,
    #[serde(rename = "Loan Amount")]
    loan_amount: Decimal,
    #[serde(rename = "Tenure")]
    tenure: i32,
    #[serde(rename = "Interest Rate")]
    interest_rate: Decimal,
    #[serde(rename = "Monthly payment")]
    monthly_payment: Decimal,
    #[serde(rename = "EMIs paid on Time")]
    emis_paid_on_time: i32,
    #[serde(rename = "Date of Approval")]
    date_of_approval: String,
    #[serde(rename = "End Date")]
    end_date: String,
}

impl LoanRecord {
    fn into_loan(self, path_label: &str) -> Result<Loan> {
        let date_of_approval = parse_date(path_label, &self.date_of_approval)?;
        let end_date = parse_date(path_label, &self.end_date)?;
        Ok(Loan {
            loan_id: self.loan_id,
            customer_id: self.customer_id,
            loan_amount: Money::from_decimal(self.loan_amount),
            tenure: self.tenure,
            interest_rate: Rate::from_percent(self.interest_rate),
            monthly_payment: Money::from_decimal(self.monthly_payment),
            emis_paid_on_time: self.emis_paid_on_time,
            date_of_approval,
            end_date,
        })
    }
}

fn parse_date(path_label: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| ApprovalError::MalformedRecord {
        path: path_label.to_string(),
        message: format!("bad date {raw:?}: {e}"),
    })
}

/// counts of what a bulk import actually did
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub customers: usize,
    pub loans: usize,
    pub skipped_loans: usize,
    pub missing_files: Vec<String>,
}

/// import both csv exports, tolerating either file being absent
pub async fn run(
    store: &dyn Store,
    customers_path: &Path,
    loans_path: &Path,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    if customers_path.exists() {
        report.customers = ingest_customers(store, customers_path).await?;
    } else {
        error!("{} not found, skipping customer import", customers_path.display());
        report.missing_files.push(customers_path.display().to_string());
    }

    if loans_path.exists() {
        let (ingested, skipped) = ingest_loans(store, loans_path).await?;
        report.loans = ingested;
        report.skipped_loans = skipped;
    } else {
        error!("{} not found, skipping loan import", loans_path.display());
        report.missing_files.push(loans_path.display().to_string());
    }

    Ok(report)
}

/// upsert every customer row; imported rows never reset an existing debt counter
pub async fn ingest_customers(store: &dyn Store, path: &Path) -> Result<usize> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|_| ApprovalError::DataFileMissing {
        path: label.clone(),
    })?;
    let customers = read_customers(&label, file)?;
    let count = customers.len();
    for customer in customers {
        store.upsert_customer(customer).await?;
    }
    info!("ingested {count} customer records from {label}");
    Ok(count)
}

/// upsert loan rows, skipping those that reference an unknown customer
pub async fn ingest_loans(store: &dyn Store, path: &Path) -> Result<(usize, usize)> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|_| ApprovalError::DataFileMissing {
        path: label.clone(),
    })?;
    let loans = read_loans(&label, file)?;

    let mut ingested = 0;
    let mut skipped = 0;
    for loan in loans {
        if store.customer_by_id(loan.customer_id).await?.is_none() {
            warn!(
                "customer {} not found for loan {}, skipping",
                loan.customer_id, loan.loan_id
            );
            skipped += 1;
            continue;
        }
        store.upsert_loan(loan).await?;
        ingested += 1;
    }
    info!("ingested {ingested} loan records from {label} ({skipped} skipped)");
    Ok((ingested, skipped))
}

fn read_customers<R: Read>(label: &str, reader: R) -> Result<Vec<Customer>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut customers = Vec::new();
    for record in csv_reader.deserialize::<CustomerRecord>() {
        let record = record.map_err(|source| ApprovalError::Csv {
            path: label.to_string(),
            source,
        })?;
        customers.push(record.into_customer());
    }
    Ok(customers)
}

fn read_loans<R: Read>(label: &str, reader: R) -> Result<Vec<Loan>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut loans = Vec::new();
    for record in csv_reader.deserialize::<LoanRecord>() {
        let record = record.map_err(|source| ApprovalError::Csv {
            path: label.to_string(),
            source,
        })?;
        loans.push(record.into_loan(label)?);
    }
    Ok(loans)
}
