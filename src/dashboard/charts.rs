//! Chart generation for the dashboard.
//!
//! The income/expense chart is generated as JSON configuration for the
//! ECharts library with `charming`.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Tooltip,
        Trigger,
    },
    series::bar,
};
use rust_decimal::prelude::ToPrimitive;

use crate::{
    dashboard::aggregation::{Summary, income_expense_bars},
    locale::Locale,
};

/// Fill colour of the bar series.
const BAR_COLOR: &str = "#8884d8";

/// A bar chart comparing the income and expenses in `summary`.
pub fn income_expense_chart(summary: &Summary, locale: Locale) -> Chart {
    let bars = income_expense_bars(summary, locale);
    let labels: Vec<String> = bars.iter().map(|bar| bar.label.clone()).collect();
    let values: Vec<f64> = bars
        .iter()
        .map(|bar| bar.value.to_f64().unwrap_or_default())
        .collect();

    Chart::new()
        .title(Title::new().text(locale.chart_title()))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name(locale.chart_series_name())
                .item_style(ItemStyle::new().color(BAR_COLOR))
                .data(values),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('th-TH', {
              style: 'currency',
              currency: 'THB'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{dashboard::aggregation::Summary, locale::Locale};

    use super::{BAR_COLOR, income_expense_chart};

    #[test]
    fn chart_options_contain_labels_and_values() {
        let summary = Summary {
            income: dec!(100),
            expense: dec!(40),
            balance: dec!(60),
        };

        let options = income_expense_chart(&summary, Locale::English).to_string();

        assert!(options.contains("Income"), "missing income label in {options}");
        assert!(options.contains("Expenses"), "missing expense label in {options}");
        assert!(options.contains(BAR_COLOR), "missing bar colour in {options}");
        assert!(options.contains("THB"), "missing currency formatter in {options}");
    }

    #[test]
    fn chart_title_is_localized() {
        let options = income_expense_chart(&Summary::default(), Locale::Thai).to_string();

        assert!(options.contains("สรุปรายรับ-รายจ่าย"), "missing Thai title in {options}");
    }
}
