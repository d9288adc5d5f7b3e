//! Dashboard module
//!
//! Derives what the dashboard shows from a user's transactions: the month
//! filter, the income/expense summary and the chart.

mod aggregation;
mod charts;
mod view;

pub use aggregation::{ChartBar, Summary, income_expense_bars, summarize};
pub use charts::income_expense_chart;
pub use view::DashboardView;
