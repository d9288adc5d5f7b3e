//! The state behind the dashboard screen.

use crate::{
    dashboard::aggregation::{ChartBar, Summary, income_expense_bars, summarize},
    locale::Locale,
    month::{MonthFilter, filter_by_month},
    timezone::CalendarZone,
    transaction::Transaction,
};

/// The latest snapshot of a user's transactions and the views derived from it.
///
/// The filtered list and the summary are recomputed whenever the snapshot or
/// the filter changes, so they always agree with each other.
#[derive(Debug, Clone)]
pub struct DashboardView {
    zone: CalendarZone,
    filter: MonthFilter,
    snapshot: Option<Vec<Transaction>>,
    filtered: Vec<Transaction>,
    summary: Summary,
}

impl DashboardView {
    /// An empty dashboard that shows every month and has not received a
    /// snapshot yet.
    pub fn new(zone: CalendarZone) -> Self {
        Self {
            zone,
            filter: MonthFilter::All,
            snapshot: None,
            filtered: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Replace the transactions with a new snapshot.
    pub fn apply_snapshot(&mut self, transactions: &[Transaction]) {
        self.snapshot = Some(transactions.to_vec());
        self.recompute();
    }

    /// Show only the transactions that pass `filter`.
    pub fn set_filter(&mut self, filter: MonthFilter) {
        self.filter = filter;
        self.recompute();
    }

    /// The current month filter.
    pub fn filter(&self) -> MonthFilter {
        self.filter
    }

    /// The calendar zone used for month boundaries.
    pub fn zone(&self) -> CalendarZone {
        self.zone
    }

    /// The transactions that pass the filter, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.filtered
    }

    /// Every transaction in the latest snapshot.
    pub fn all_transactions(&self) -> &[Transaction] {
        self.snapshot.as_deref().unwrap_or_default()
    }

    /// The totals of the filtered transactions.
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// The chart bars for the filtered transactions.
    pub fn chart_bars(&self, locale: Locale) -> Vec<ChartBar> {
        income_expense_bars(&self.summary, locale)
    }

    /// Whether no snapshot has arrived yet.
    pub fn is_loading(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Whether the filter leaves nothing to show.
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    fn recompute(&mut self) {
        self.filtered = filter_by_month(self.all_transactions(), &self.filter, &self.zone);
        self.summary = summarize(&self.filtered);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Month, OffsetDateTime, macros::datetime};

    use crate::{
        dashboard::aggregation::summarize,
        month::{MonthFilter, MonthKey},
        timezone::CalendarZone,
        transaction::{Amount, Transaction, TransactionId, TransactionType},
    };

    use super::DashboardView;

    fn transaction(type_: TransactionType, amount: Decimal, date: OffsetDateTime) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            name: "test".to_owned(),
            amount: Amount::new(amount).unwrap(),
            type_,
            date,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            transaction(
                TransactionType::Expense,
                dec!(40),
                datetime!(2024-02-10 0:00 UTC),
            ),
            transaction(
                TransactionType::Income,
                dec!(100),
                datetime!(2024-02-01 0:00 UTC),
            ),
            transaction(
                TransactionType::Income,
                dec!(500),
                datetime!(2024-01-05 0:00 UTC),
            ),
        ]
    }

    #[test]
    fn starts_loading_and_empty() {
        let view = DashboardView::new(CalendarZone::Utc);

        assert!(view.is_loading());
        assert!(view.is_empty());
        assert_eq!(view.filter(), MonthFilter::All);
        assert_eq!(view.summary().balance, Decimal::ZERO);
    }

    #[test]
    fn snapshot_updates_summary() {
        let mut view = DashboardView::new(CalendarZone::Utc);

        view.apply_snapshot(&sample());

        assert!(!view.is_loading());
        assert_eq!(view.transactions().len(), 3);
        assert_eq!(view.summary().income, dec!(600));
        assert_eq!(view.summary().expense, dec!(40));
        assert_eq!(view.summary().balance, dec!(560));
    }

    #[test]
    fn filter_change_recomputes_summary() {
        let mut view = DashboardView::new(CalendarZone::Utc);
        view.apply_snapshot(&sample());

        view.set_filter(MonthFilter::Month(MonthKey::new(2024, Month::February)));

        assert_eq!(view.transactions().len(), 2);
        assert_eq!(view.all_transactions().len(), 3);
        assert_eq!(view.summary().balance, dec!(60));
    }

    #[test]
    fn filter_set_before_snapshot_applies_to_it() {
        let mut view = DashboardView::new(CalendarZone::Utc);
        view.set_filter(MonthFilter::Month(MonthKey::new(2024, Month::January)));

        view.apply_snapshot(&sample());

        assert_eq!(view.transactions().len(), 1);
        assert_eq!(view.summary().income, dec!(500));
    }

    #[test]
    fn summary_always_matches_filtered_list() {
        let mut view = DashboardView::new(CalendarZone::Utc);
        let january = MonthFilter::Month(MonthKey::new(2024, Month::January));
        let march = MonthFilter::Month(MonthKey::new(2024, Month::March));
        let mut later_snapshot = sample();
        later_snapshot.remove(0);

        view.apply_snapshot(&sample());
        assert_eq!(view.summary(), summarize(view.transactions()));
        view.set_filter(january);
        assert_eq!(view.summary(), summarize(view.transactions()));
        view.apply_snapshot(&later_snapshot);
        assert_eq!(view.summary(), summarize(view.transactions()));
        view.set_filter(march);
        assert_eq!(view.summary(), summarize(view.transactions()));
        assert!(view.is_empty());
        view.set_filter(MonthFilter::All);
        assert_eq!(view.summary(), summarize(&later_snapshot));
    }

    #[test]
    fn empty_snapshot_is_loaded_but_empty() {
        let mut view = DashboardView::new(CalendarZone::Utc);

        view.apply_snapshot(&[]);

        assert!(!view.is_loading());
        assert!(view.is_empty());
    }
}
