mod cards;
mod chart;
mod raw_table;

pub use cards::{format_mean, truncate_label};
pub use chart::{render_chart, series_colors};

use crate::models::{Criteria, DashboardView, FilterOptions, Notice, RawSort};
use maud::{html, Markup, PreEscaped, DOCTYPE};

const PAGE_TITLE: &str = "Pagespeed Insights Visualizer";
const STYLE_CSS: &str = include_str!("style.css");

pub fn criteria_query(criteria: &Criteria, sort: RawSort) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("applied", "1");
    if let Some(start) = criteria.dates.start {
        query.append_pair("start", &start.format("%Y-%m-%d").to_string());
    }
    if let Some(end) = criteria.dates.end {
        query.append_pair("end", &end.format("%Y-%m-%d").to_string());
    }
    for url in &criteria.urls {
        query.append_pair("url", url);
    }
    for metric in &criteria.metrics {
        query.append_pair("metric", metric.as_str());
    }
    if let Some(strategy) = &criteria.strategy {
        query.append_pair("strategy", strategy);
    }
    query.append_pair("sort", sort.key.as_str());
    query.append_pair("order", if sort.descending { "desc" } else { "asc" });
    query.finish()
}

pub fn render_page(view: &DashboardView) -> String {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (PAGE_TITLE) }
                style { (PreEscaped(STYLE_CSS)) }
            }
            body {
                aside.sidebar {
                    h2 { "Filters" }
                    @if !view.halted() {
                        (filter_form(&view.options, &view.criteria))
                    }
                    form method="post" action="/reload" {
                        button type="submit" { "Reload data" }
                    }
                }
                main {
                    h1 { (PAGE_TITLE) }
                    (notices(&view.notices))
                    @if let Some(raw) = &view.raw {
                        (summary_section(view))
                        (chart_section(view))
                        (raw_table::raw_table(raw, &view.criteria))
                    }
                }
            }
        }
    };
    markup.into_string()
}

fn notices(notices: &[Notice]) -> Markup {
    html! {
        @for notice in notices {
            div class={ "notice notice-" (notice.level.as_str()) } { (notice.message) }
        }
    }
}

fn filter_form(options: &FilterOptions, criteria: &Criteria) -> Markup {
    let date_value = |date: Option<chrono::NaiveDate>| date.map(|d| d.format("%Y-%m-%d").to_string());
    let min = date_value(options.min_date);
    let max = date_value(options.max_date);

    html! {
        form method="get" action="/" {
            input type="hidden" name="applied" value="1";
            input type="hidden" name="sort" value=(criteria.sort.key.as_str());
            input type="hidden" name="order" value=(if criteria.sort.descending { "desc" } else { "asc" });

            @if options.min_date.is_some() {
                fieldset {
                    legend { "Date range" }
                    input type="date" name="start" min=[min.as_deref()] max=[max.as_deref()]
                        value=[date_value(criteria.dates.start)];
                    input type="date" name="end" min=[min.as_deref()] max=[max.as_deref()]
                        value=[date_value(criteria.dates.end)];
                }
            }

            label for="url" { "URLs to analyze" }
            select id="url" name="url" multiple size=(options.urls.len().clamp(2, 8)) {
                @for url in &options.urls {
                    option value=(url) selected[criteria.urls.contains(url)] { (url) }
                }
            }

            label for="metric" { "Metrics to display" }
            select id="metric" name="metric" multiple size=(options.metrics.len().max(2)) {
                @for metric in &options.metrics {
                    option value=(metric.as_str()) selected[criteria.metrics.contains(metric)] { (metric.as_str()) }
                }
            }

            @if !options.strategies.is_empty() {
                fieldset.strategy {
                    legend { "Device strategy" }
                    @for strategy in &options.strategies {
                        label {
                            input type="radio" name="strategy" value=(strategy)
                                checked[criteria.strategy.as_ref() == Some(strategy)];
                            (strategy)
                        }
                    }
                }
            }

            button type="submit" { "Apply" }
        }
    }
}

fn summary_section(view: &DashboardView) -> Markup {
    html! {
        @if !view.summaries.is_empty() {
            section.averages {
                h2 { "Performance Averages" }
                (cards::summary_cards(&view.summaries))
            }
        }
    }
}

fn chart_section(view: &DashboardView) -> Markup {
    html! {
        section.charts {
            h2 { "Performance Charts" }
            @for url_chart in &view.charts {
                @if chart::has_points(url_chart) {
                    @match render_chart(url_chart) {
                        Ok(svg) => {
                            div.chart { (PreEscaped(svg)) }
                        },
                        Err(error) => {
                            div.notice.notice-error { "Chart for " (url_chart.url) " failed: " (error) }
                        },
                    }
                } @else {
                    div.notice.notice-info { "No metric values to plot for " (url_chart.title()) "." }
                }
            }
        }
    }
}
