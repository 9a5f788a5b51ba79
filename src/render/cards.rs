use crate::models::UrlSummary;
use maud::{html, Markup};

const LABEL_MAX_CHARS: usize = 30;

pub fn truncate_label(url: &str) -> String {
    if url.chars().count() > LABEL_MAX_CHARS {
        let head: String = url.chars().take(LABEL_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

pub fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(value) => format!("{:.1}", value),
        None => "n/a".to_string(),
    }
}

pub fn summary_cards(summaries: &[UrlSummary]) -> Markup {
    html! {
        div.cards style={ "grid-template-columns: repeat(" (summaries.len().max(1)) ", minmax(0, 1fr));" } {
            @for summary in summaries {
                div.card {
                    h3 title=(summary.url) { (truncate_label(&summary.url)) }
                    @for average in &summary.averages {
                        div.metric title={ "Average for " (summary.url) } {
                            span.metric-label { "Avg " (average.metric.label()) }
                            span.metric-value { (format_mean(average.mean)) }
                        }
                    }
                    p.rows { (summary.row_count) " measurements" }
                }
            }
        }
    }
}
