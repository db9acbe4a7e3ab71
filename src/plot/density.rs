//! Gap density plot.
//!
//! Each company's gaps are smoothed with a Gaussian kernel density
//! estimate and drawn as one line.

use super::svg::SvgDocument;
use super::PALETTE;
use crate::config::PlotConfig;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;
use tracing::warn;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;

/// Evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Scott's rule bandwidth. `None` when the sample cannot be smoothed.
pub fn scott_bandwidth(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let sd = samples.iter().std_dev();
    // NaN also fails this check
    if !(sd > 0.0) {
        return None;
    }
    Some(sd * (samples.len() as f64).powf(-0.2))
}

/// Gaussian kernel density estimate of `samples` evaluated on `grid`.
pub fn gaussian_kde(samples: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let bandwidth = scott_bandwidth(samples)?;
    let kernel = Normal::new(0.0, bandwidth).ok()?;
    let n = samples.len() as f64;

    Some(
        grid.iter()
            .map(|&x| samples.iter().map(|&s| kernel.pdf(x - s)).sum::<f64>() / n)
            .collect(),
    )
}

/// A company's density curve.
#[derive(Debug, Clone)]
pub struct DensityCurve {
    pub label: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

/// Density curves for every series that can be smoothed, in input order.
pub fn density_curves(series: &[(String, Vec<f64>)], settings: &PlotConfig) -> Vec<DensityCurve> {
    let grid = linspace(settings.clip_min, settings.clip_max, settings.grid_points);

    series
        .iter()
        .filter_map(|(label, gaps)| match gaussian_kde(gaps, &grid) {
            Some(ys) => Some(DensityCurve {
                label: label.clone(),
                xs: grid.clone(),
                ys,
            }),
            None => {
                warn!(
                    "Skipping density for {}: needs at least two distinct gaps",
                    label
                );
                None
            }
        })
        .collect()
}

/// Render the density plot. `None` when no series can be drawn.
pub fn render_gap_density(series: &[(String, Vec<f64>)], settings: &PlotConfig) -> Option<String> {
    let curves = density_curves(series, settings);
    if curves.is_empty() {
        return None;
    }

    let (x_min, x_max) = (settings.x_min, settings.x_max.max(settings.x_min + 1.0));
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let visible_max = curves
        .iter()
        .flat_map(|c| c.xs.iter().zip(&c.ys))
        .filter(|(x, _)| (x_min..=x_max).contains(*x))
        .map(|(_, y)| *y)
        .fold(0.0_f64, f64::max);
    let y_max = if visible_max > 0.0 { visible_max * 1.05 } else { 1.0 };

    let to_px = |x: f64, y: f64| {
        (
            MARGIN_LEFT + (x - x_min) / (x_max - x_min) * plot_w,
            MARGIN_TOP + plot_h - y / y_max * plot_h,
        )
    };

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.clip_rect("plot-area", MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h);

    // Axes
    doc.rect(MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h, "none", Some("#333333"));
    for tick in linspace(x_min, x_max, 6) {
        let (px, py) = to_px(tick, 0.0);
        doc.line(px, py, px, py + 5.0, "#333333", 1.0);
        doc.text(px, py + 20.0, 12.0, "middle", "#333333", &format_tick(tick));
    }
    for tick in linspace(0.0, y_max, 6) {
        let (px, py) = to_px(x_min, tick);
        doc.line(px - 5.0, py, px, py, "#333333", 1.0);
        doc.text(px - 8.0, py + 4.0, 12.0, "end", "#333333", &format!("{:.3}", tick));
    }

    for (i, curve) in curves.iter().enumerate() {
        let points: Vec<(f64, f64)> = curve
            .xs
            .iter()
            .zip(&curve.ys)
            .map(|(&x, &y)| to_px(x, y))
            .collect();
        doc.polyline(&points, PALETTE[i % PALETTE.len()], Some("plot-area"));
    }

    // Legend
    let legend_x = MARGIN_LEFT + plot_w - 260.0;
    for (i, curve) in curves.iter().enumerate() {
        let y = MARGIN_TOP + 20.0 + i as f64 * 20.0;
        let color = PALETTE[i % PALETTE.len()];
        doc.line(legend_x, y - 4.0, legend_x + 24.0, y - 4.0, color, 2.0);
        doc.text(legend_x + 30.0, y, 12.0, "start", "#333333", &curve.label);
    }

    doc.text(
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        16.0,
        "middle",
        "#111111",
        &format!(
            "Distribution of Days Between Bookings (Top {} Companies)",
            series.len()
        ),
    );
    doc.text(
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 20.0,
        14.0,
        "middle",
        "#111111",
        "Days Gap",
    );
    doc.vertical_text(20.0, MARGIN_TOP + plot_h / 2.0, 14.0, "Density");

    Some(doc.render())
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
        assert_eq!(linspace(2.0, 4.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_bandwidth_needs_spread() {
        assert_eq!(scott_bandwidth(&[3.0]), None);
        assert_eq!(scott_bandwidth(&[2.0, 2.0, 2.0]), None);
        assert!(scott_bandwidth(&[1.0, 2.0, 4.0]).unwrap() > 0.0);
    }

    #[test]
    fn test_kde_integrates_to_about_one() {
        let samples = [1.0, 2.0, 2.0, 3.0, 7.0];
        let grid = linspace(-20.0, 30.0, 2001);
        let density = gaussian_kde(&samples, &grid).unwrap();

        let step = grid[1] - grid[0];
        let area: f64 = density.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 1e-3, "area was {}", area);
        assert!(density.iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn test_render_skips_flat_series() {
        let settings = PlotConfig::default();
        let series = vec![("Flat".to_string(), vec![1.0, 1.0])];
        assert!(render_gap_density(&series, &settings).is_none());

        let series = vec![
            ("Flat".to_string(), vec![1.0, 1.0]),
            ("Busy & Co".to_string(), vec![0.0, 1.0, 3.0, 2.0]),
        ];
        let svg = render_gap_density(&series, &settings).unwrap();
        assert!(svg.contains("Busy &amp; Co"));
        assert!(!svg.contains(">Flat<"));
        assert!(svg.contains("Top 2 Companies"));
        assert!(svg.contains("<polyline"));
    }
}
