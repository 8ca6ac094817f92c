use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::model::Loan;

/// equated monthly installment for an amortizing loan
///
/// EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)
///
/// returns `None` when the terms overflow the decimal range
pub fn calculate_emi(principal: Money, annual_rate: Rate, months: u32) -> Option<Money> {
    if months == 0 {
        return Some(principal);
    }

    let r = annual_rate.monthly_fraction();

    if r.is_zero() {
        return Some(principal / Decimal::from(months));
    }

    let mut compound = Decimal::ONE;
    let base = Decimal::ONE + r;
    for _ in 0..months {
        compound = compound.checked_mul(base)?;
    }

    let numerator = principal.as_decimal().checked_mul(r)?.checked_mul(compound)?;
    let denominator = compound - Decimal::ONE;

    numerator.checked_div(denominator).map(Money::from_decimal)
}

/// combined installment burden of the loans still running on `today`
pub fn monthly_obligations(loans: &[Loan], today: NaiveDate) -> Money {
    loans
        .iter()
        .filter(|l| l.is_active_on(today))
        .map(|l| l.monthly_payment)
        .fold(Money::ZERO, |acc, x| acc + x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan_with_payment(monthly_payment: Money, end_date: NaiveDate) -> Loan {
        Loan {
            loan_id: 1,
            customer_id: 1,
            loan_amount: Money::from_major(100_000),
            tenure: 12,
            interest_rate: Rate::from_percent(dec!(10)),
            monthly_payment,
            emis_paid_on_time: 0,
            date_of_approval: date(2023, 1, 1),
            end_date,
        }
    }

    #[test]
    fn test_emi_standard_case() {
        let emi =
            calculate_emi(Money::from_major(100_000), Rate::from_percent(dec!(12)), 12).unwrap();
        assert_eq!(emi.round_dp(2), Money::from_str_exact("8884.88").unwrap());
    }

    #[test]
    fn test_emi_zero_rate_is_straight_line() {
        let emi = calculate_emi(Money::from_major(120_000), Rate::ZERO, 12).unwrap();
        assert_eq!(emi, Money::from_major(10_000));
    }

    #[test]
    fn test_emi_zero_term_returns_principal() {
        let emi = calculate_emi(Money::from_major(50_000), Rate::from_percent(dec!(10)), 0).unwrap();
        assert_eq!(emi, Money::from_major(50_000));
    }

    #[test]
    fn test_emi_single_month_covers_one_period_interest() {
        let emi = calculate_emi(Money::from_major(10_000), Rate::from_percent(dec!(12)), 1).unwrap();
        // one month at 1% on the full principal
        assert_eq!(emi.round_dp(2), Money::from_str_exact("10100.00").unwrap());
    }

    #[test]
    fn test_emi_extreme_terms_return_none() {
        // either a very long term or a huge rate drives the compound
        // factor past the decimal range
        assert_eq!(
            calculate_emi(Money::from_major(100_000), Rate::from_percent(dec!(12)), 7_000),
            None
        );
        assert_eq!(
            calculate_emi(Money::from_major(100_000), Rate::from_percent(dec!(100000)), 600),
            None
        );
    }

    #[test]
    fn test_obligations_sum_active_loans_only() {
        let today = date(2024, 6, 15);
        let loans = vec![
            loan_with_payment(Money::from_major(9_000), date(2024, 6, 15)),
            loan_with_payment(Money::from_major(7_500), date(2025, 1, 1)),
            loan_with_payment(Money::from_major(4_000), date(2024, 6, 14)),
        ];
        // the loan that ended yesterday is excluded, the one ending today counts
        assert_eq!(monthly_obligations(&loans, today), Money::from_major(16_500));
    }

    #[test]
    fn test_obligations_empty_history() {
        assert_eq!(monthly_obligations(&[], date(2024, 6, 15)), Money::ZERO);
    }
}
