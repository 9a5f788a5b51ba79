use crate::errors::{AppError, AppResult};
use crate::models::UrlChart;
use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use std::ops::Range;

const CHART_SIZE: (u32, u32) = (1000, 500);

pub fn series_colors(count: usize) -> Vec<RGBColor> {
    (0..count)
        .map(|idx| {
            let position = if count <= 1 {
                0.0
            } else {
                idx as f32 / (count - 1) as f32
            };
            <ViridisRGB as ColorMap<RGBColor>>::get_color(&ViridisRGB, position)
        })
        .collect()
}

pub fn has_points(chart: &UrlChart) -> bool {
    chart.series.iter().any(|series| !series.points.is_empty())
}

/// Renders one url's metrics as an SVG document: x is time, y the raw score,
/// one marked line per metric.
pub fn render_chart(chart: &UrlChart) -> AppResult<String> {
    let (x_range, y_range) = axis_ranges(chart)
        .ok_or_else(|| AppError::Render(format!("no points to plot for {}", chart.url)))?;
    let colors = series_colors(chart.series.len());

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title(), ("sans-serif", 20))
            .margin(12)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_error)?;

        ctx.configure_mesh()
            .x_labels(6)
            .x_desc("Date")
            .y_desc("Score")
            .x_label_formatter(&|dt: &DateTime<Utc>| dt.format("%Y-%m-%d %H:%M").to_string())
            .draw()
            .map_err(render_error)?;

        for (series, color) in chart.series.iter().zip(colors) {
            ctx.draw_series(LineSeries::new(series.points.iter().copied(), color.stroke_width(2)))
                .map_err(render_error)?
                .label(series.metric.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            ctx.draw_series(
                series
                    .points
                    .iter()
                    .map(|point| Circle::new(*point, 4, color.filled())),
            )
            .map_err(render_error)?;
        }

        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn axis_ranges(chart: &UrlChart) -> Option<(Range<DateTime<Utc>>, Range<f64>)> {
    let mut points = chart.series.iter().flat_map(|series| series.points.iter());
    let &(first_time, first_value) = points.next()?;
    let (mut t_lo, mut t_hi, mut v_lo, mut v_hi) = (first_time, first_time, first_value, first_value);
    for &(time, value) in points {
        t_lo = t_lo.min(time);
        t_hi = t_hi.max(time);
        v_lo = v_lo.min(value);
        v_hi = v_hi.max(value);
    }

    if t_lo == t_hi {
        t_lo -= Duration::hours(1);
        t_hi += Duration::hours(1);
    }
    let pad = if v_hi > v_lo { (v_hi - v_lo) * 0.05 } else { v_lo.abs().max(1.0) * 0.05 };
    Some((t_lo..t_hi, (v_lo - pad)..(v_hi + pad)))
}

fn render_error(err: impl std::fmt::Display) -> AppError {
    AppError::Render(err.to_string())
}
