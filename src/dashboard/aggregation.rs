//! Totals derived from a list of transactions.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    locale::Locale,
    transaction::{Transaction, TransactionType},
};

/// Colour of the income bar.
pub const INCOME_COLOR: &str = "#22c55e";
/// Colour of the expense bar.
pub const EXPENSE_COLOR: &str = "#ef4444";

/// The income, expense and balance of a set of transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// The sum of all income amounts.
    pub income: Decimal,
    /// The sum of all expense amounts.
    pub expense: Decimal,
    /// Income minus expenses.
    pub balance: Decimal,
}

/// Sum the amounts of `transactions` by type.
///
/// The order of `transactions` does not matter and an empty list gives all
/// zeros. Amounts are at most [Amount::MAX](crate::Amount::MAX), so the
/// totals are exact for any realistic list. Beyond that they saturate at
/// the limits of [Decimal] instead of panicking.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let (income, expense) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expense), transaction| {
            let amount = transaction.amount.value();

            match transaction.type_ {
                TransactionType::Income => (income.saturating_add(amount), expense),
                TransactionType::Expense => (income, expense.saturating_add(amount)),
            }
        },
    );

    Summary {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

/// One bar of the income/expense chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    /// The localized name of the bar.
    pub label: String,
    /// The height of the bar.
    pub value: Decimal,
    /// The fill colour as a CSS hex string.
    pub color: &'static str,
}

/// The two chart bars for `summary`, income first.
pub fn income_expense_bars(summary: &Summary, locale: Locale) -> Vec<ChartBar> {
    vec![
        ChartBar {
            label: locale.income().to_owned(),
            value: summary.income,
            color: INCOME_COLOR,
        },
        ChartBar {
            label: locale.expense().to_owned(),
            value: summary.expense,
            color: EXPENSE_COLOR,
        },
    ]
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        locale::Locale,
        transaction::{Amount, Transaction, TransactionId, TransactionType},
    };

    use super::{EXPENSE_COLOR, INCOME_COLOR, Summary, income_expense_bars, summarize};

    fn transaction(type_: TransactionType, amount: Decimal) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            name: "test".to_owned(),
            amount: Amount::new(amount).unwrap(),
            type_,
            date: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn empty_list_sums_to_zero() {
        assert_eq!(
            summarize(&[]),
            Summary {
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
                balance: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn income_minus_expense_is_balance() {
        let transactions = [
            transaction(TransactionType::Income, dec!(100)),
            transaction(TransactionType::Expense, dec!(40)),
        ];

        assert_eq!(
            summarize(&transactions),
            Summary {
                income: dec!(100),
                expense: dec!(40),
                balance: dec!(60),
            }
        );
    }

    #[test]
    fn many_maximum_amounts_sum_without_overflow() {
        let max = Amount::MAX.value();
        let mut transactions = vec![transaction(TransactionType::Income, max); 10_000];
        transactions.push(transaction(TransactionType::Expense, max));

        let summary = summarize(&transactions);

        assert_eq!(summary.income, max * Decimal::from(10_000));
        assert_eq!(summary.expense, max);
        assert_eq!(summary.balance, max * Decimal::from(9_999));
    }

    #[test]
    fn decimal_amounts_sum_exactly() {
        let transactions = [
            transaction(TransactionType::Income, dec!(0.1)),
            transaction(TransactionType::Income, dec!(0.2)),
            transaction(TransactionType::Expense, dec!(0.3)),
        ];

        let summary = summarize(&transactions);

        assert_eq!(summary.income, dec!(0.3));
        assert_eq!(summary.balance, Decimal::ZERO);
        assert_eq!(summary.income - summary.expense, summary.balance);
    }

    #[test]
    fn order_does_not_matter() {
        let mut transactions = vec![
            transaction(TransactionType::Expense, dec!(12.5)),
            transaction(TransactionType::Income, dec!(1000)),
            transaction(TransactionType::Expense, dec!(250.75)),
        ];
        let want = summarize(&transactions);

        transactions.reverse();

        assert_eq!(summarize(&transactions), want);
        assert_eq!(want.balance, dec!(736.75));
    }

    #[test]
    fn bars_list_income_then_expense() {
        let summary = Summary {
            income: dec!(100),
            expense: dec!(40),
            balance: dec!(60),
        };

        let bars = income_expense_bars(&summary, Locale::Thai);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].label, "รายรับ");
        assert_eq!(bars[0].value, dec!(100));
        assert_eq!(bars[0].color, INCOME_COLOR);
        assert_eq!(bars[1].label, "รายจ่าย");
        assert_eq!(bars[1].value, dec!(40));
        assert_eq!(bars[1].color, EXPENSE_COLOR);
    }
}
