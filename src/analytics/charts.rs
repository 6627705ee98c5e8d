//! Chart configurations for the analytics page.
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered into an HTML container by a small initialization script.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, JsFunction, Tooltip, Trigger},
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{category::CategorySummary, html::HeadElement, period};

use super::stats::{DailySummary, PaymentMethodSummary};

/// An analytics chart with its HTML container ID and ECharts configuration.
pub(super) struct AnalyticsChart {
    /// The HTML element ID to use for the chart (kebab-case).
    pub(super) id: &'static str,
    /// The ECharts configuration as a JSON string.
    pub(super) options: String,
}

/// Renders the HTML containers for the analytics charts.
pub(super) fn charts_view(charts: &[AnalyticsChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for the analytics charts, with
/// dark mode support and responsive resizing.
pub(super) fn charts_script(charts: &[AnalyticsChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A pie of the totals recorded against each category, colored with the
/// categories' own badge colors.
pub(super) fn category_pie(title: &str, summaries: &[CategorySummary]) -> Chart {
    let colors: Vec<Color> = summaries
        .iter()
        .map(|summary| summary.color.as_str().into())
        .collect();
    let data: Vec<(f64, &str)> = summaries
        .iter()
        .map(|summary| (summary.total, summary.name.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text(title))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom("0"))
        .color(colors)
        .series(Pie::new().name(title).radius(vec!["40%", "70%"]).data(data))
}

/// A pie of the totals settled through each payment method.
pub(super) fn payment_method_pie(title: &str, summaries: &[PaymentMethodSummary]) -> Chart {
    let data: Vec<(f64, &str)> = summaries
        .iter()
        .map(|summary| (summary.total, summary.payment_method.label()))
        .collect();

    Chart::new()
        .title(Title::new().text(title))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom("0"))
        .series(Pie::new().name(title).radius(vec!["40%", "70%"]).data(data))
}

/// A bar chart of income against expense for each day in the window.
pub(super) fn daily_bar_chart(days: &[DailySummary]) -> Chart {
    let labels: Vec<String> = days
        .iter()
        .map(|day| period::format_date_label(day.date))
        .collect();
    let income_values: Vec<f64> = days.iter().map(|day| day.income).collect();
    let expense_values: Vec<f64> = days.iter().map(|day| day.expense).collect();

    Chart::new()
        .title(Title::new().text("Daily income vs expense"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("1%").right("4%"))
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
        .color(vec![Color::from("#4CAF50"), Color::from("#F44336")])
        .series(Bar::new().name("Income").data(income_values))
        .series(Bar::new().name("Expense").data(expense_values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values.
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
