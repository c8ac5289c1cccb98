//! Chart Plotter Module
//! Renders analysis output as static PNG charts using plotters.

use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use statrs::distribution::{Continuous, Normal};
use std::path::Path;

use crate::stats::{percentile, CorrelationMatrix, LossRatioRow, TemporalRow};

/// Primary series color
pub const BAR_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

/// Color palette for grouped series
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

const KDE_CURVE_POINTS: usize = 200;

/// Renders static analysis charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Vertical bar chart of grouped loss ratios, highest first.
    /// Groups with an undefined ratio are skipped.
    pub fn loss_ratio_bar(rows: &[LossRatioRow], category: &str, path: &Path) -> Result<()> {
        let bars: Vec<(String, f64)> = rows
            .iter()
            .filter_map(|r| r.loss_ratio.map(|v| (r.keys.join(" / "), v)))
            .collect();
        anyhow::ensure!(!bars.is_empty(), "no defined loss ratios to plot");

        let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_max = bars.iter().map(|(_, v)| *v).fold(0.0f64, f64::max).max(1e-6) * 1.15;
        let labels: Vec<String> = bars.iter().map(|(k, _)| k.clone()).collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Loss Ratio by {}", category), ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d((0..bars.len()).into_segmented(), 0f64..y_max)?;

        let mesh_labels = labels.clone();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_label_formatter(&move |seg| match seg {
                SegmentValue::CenterOf(i) => mesh_labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc(category)
            .y_desc("Loss Ratio")
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), *v),
                ],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))?;

        root.present().with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Histogram with a Gaussian KDE overlay.
    pub fn histogram(values: &[f64], column: &str, path: &Path) -> Result<()> {
        anyhow::ensure!(!values.is_empty(), "no values to plot");

        let (min, width, counts) = bin_values(values);
        let n_bins = counts.len();
        let max_count = counts.iter().copied().max().unwrap_or(1) as f64;
        let x_max = min + width * n_bins as f64;

        let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Distribution of {}", column), ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(min..x_max, 0f64..max_count * 1.15)?;

        chart
            .configure_mesh()
            .x_desc(column)
            .y_desc("Frequency")
            .draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = min + width * i as f64;
            Rectangle::new(
                [(x0, 0.0), (x0 + width, count as f64)],
                BAR_COLOR.mix(0.5).filled(),
            )
        }))?;

        // KDE curve, scaled from density to bin-count units
        if let Ok(kernel) = Normal::new(0.0, 1.0) {
            let bandwidth = silverman_bandwidth(values);
            if bandwidth > 0.0 {
                let scale = values.len() as f64 * width;
                let step = (x_max - min) / KDE_CURVE_POINTS as f64;
                let curve: Vec<(f64, f64)> = (0..=KDE_CURVE_POINTS)
                    .map(|i| {
                        let x = min + step * i as f64;
                        (x, kde_density(values, x, bandwidth, &kernel) * scale)
                    })
                    .collect();
                chart
                    .draw_series(LineSeries::new(curve, PALETTE[0].stroke_width(2)))?
                    .label("KDE")
                    .legend(|(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], PALETTE[0].stroke_width(2))
                    });
                chart
                    .configure_series_labels()
                    .border_style(&BLACK)
                    .draw()?;
            }
        }

        root.present().with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Monthly mean line with point markers.
    pub fn temporal_line(rows: &[TemporalRow], value_column: &str, path: &Path) -> Result<()> {
        let points: Vec<(usize, f64)> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.mean.map(|m| (i, m)))
            .collect();
        anyhow::ensure!(!points.is_empty(), "no monthly values to plot");

        let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_min = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        let y_max = points
            .iter()
            .map(|(_, v)| *v)
            .fold(f64::NEG_INFINITY, f64::max);
        let pad = ((y_max - y_min) * 0.1).max(1e-6);

        let labels: Vec<String> = rows
            .iter()
            .map(|r| r.month.format("%Y-%m").to_string())
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Monthly {} Trend", value_column),
                ("sans-serif", 30),
            )
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(
                -0.5f64..rows.len() as f64 - 0.5,
                y_min - pad..y_max + pad,
            )?;

        let mesh_labels = labels.clone();
        chart
            .configure_mesh()
            .x_labels(labels.len().min(12))
            .x_label_formatter(&move |v| {
                let i = v.round();
                if i >= 0.0 && (v - i).abs() < 0.25 {
                    mesh_labels.get(i as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .x_desc("Month")
            .y_desc(value_column)
            .draw()?;

        chart.draw_series(LineSeries::new(
            points.iter().map(|(i, v)| (*i as f64, *v)),
            BAR_COLOR.stroke_width(2),
        ))?;
        chart.draw_series(
            points
                .iter()
                .map(|(i, v)| Circle::new((*i as f64, *v), 3, BAR_COLOR.filled())),
        )?;

        root.present().with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Correlation heatmap with per-cell annotations, centered on zero.
    pub fn correlation_heatmap(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
        let n = matrix.columns.len();
        anyhow::ensure!(n > 0, "empty correlation matrix");

        let root = BitMapBackend::new(path, (900, 800)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Correlation Matrix", ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)?;

        let x_names = matrix.columns.clone();
        let y_names = matrix.columns.clone();
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&move |v| {
                x_names.get(v.floor() as usize).cloned().unwrap_or_default()
            })
            .y_label_formatter(&move |v| {
                y_names.get(v.floor() as usize).cloned().unwrap_or_default()
            })
            .draw()?;

        chart.draw_series((0..n).flat_map(|i| {
            let row = &matrix.values[i];
            (0..n).map(move |j| {
                Rectangle::new(
                    [(i as f64, j as f64), (i as f64 + 1.0, j as f64 + 1.0)],
                    heat_color(row[j]).filled(),
                )
            })
        }))?;

        let annotation = TextStyle::from(("sans-serif", 16).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series((0..n).flat_map(|i| {
            let row = matrix.values[i].clone();
            let style = annotation.clone();
            (0..n).map(move |j| {
                let label = if row[j].is_nan() {
                    "-".to_string()
                } else {
                    format!("{:.2}", row[j])
                };
                Text::new(label, (i as f64 + 0.5, j as f64 + 0.5), style.clone())
            })
        }))?;

        root.present().with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Quartile boxplots per group, 1.5*IQR whiskers.
    pub fn boxplot(
        groups: &[(String, Vec<f64>)],
        column: &str,
        group_label: &str,
        path: &Path,
    ) -> Result<()> {
        let groups: Vec<&(String, Vec<f64>)> =
            groups.iter().filter(|(_, v)| !v.is_empty()).collect();
        anyhow::ensure!(!groups.is_empty(), "no values to plot");

        let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut y_min = f32::INFINITY;
        let mut y_max = f32::NEG_INFINITY;
        for (_, values) in &groups {
            for &v in values {
                y_min = y_min.min(v as f32);
                y_max = y_max.max(v as f32);
            }
        }
        let pad = ((y_max - y_min) * 0.1).max(1e-6);

        let title = if groups.len() > 1 {
            format!("Boxplot of {} by {}", column, group_label)
        } else {
            format!("Boxplot of {}", column)
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(
                (0..groups.len()).into_segmented(),
                y_min - pad..y_max + pad,
            )?;

        let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups.len())
            .x_label_formatter(&move |seg| match seg {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc(group_label)
            .y_desc(column)
            .draw()?;

        chart.draw_series(groups.iter().enumerate().map(|(i, (_, values))| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i), &Quartiles::new(values))
                .width(24)
                .style(BAR_COLOR.stroke_width(2))
        }))?;

        root.present().with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Freedman-Diaconis bins (Sturges fallback): origin, bin width and counts.
pub(crate) fn bin_values(values: &[f64]) -> (f64, f64, Vec<usize>) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    if max == min {
        return (min - 0.5, 1.0, vec![n]);
    }

    let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
    let fd_width = 2.0 * iqr / (n as f64).powf(1.0 / 3.0);
    let n_bins = if fd_width > 0.0 {
        (((max - min) / fd_width).ceil() as usize).clamp(1, 100)
    } else {
        ((n as f64).log2().ceil() as usize + 1).clamp(1, 100)
    };
    let width = (max - min) / n_bins as f64;

    let mut counts = vec![0usize; n_bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    (min, width, counts)
}

/// Silverman's rule-of-thumb bandwidth.
pub(crate) fn silverman_bandwidth(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);

    let spread = if iqr > 0.0 {
        std.min(iqr / 1.34)
    } else {
        std
    };
    0.9 * spread * (n as f64).powf(-0.2)
}

fn kde_density(values: &[f64], x: f64, bandwidth: f64, kernel: &Normal) -> f64 {
    let sum: f64 = values
        .iter()
        .map(|&xi| kernel.pdf((x - xi) / bandwidth))
        .sum();
    sum / (values.len() as f64 * bandwidth)
}

/// Map a correlation in [-1, 1] to a blue-white-red ramp; NaN is grey.
pub(crate) fn heat_color(r: f64) -> RGBColor {
    if r.is_nan() {
        return RGBColor(220, 220, 220);
    }
    let t = r.clamp(-1.0, 1.0).abs();
    let channel = (255.0 * (1.0 - t)) as u8;
    if r >= 0.0 {
        RGBColor(255, channel, channel)
    } else {
        RGBColor(channel, channel, 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bins_cover_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (min, width, counts) = bin_values(&values);
        assert_relative_eq!(min, 0.0);
        assert!(width > 0.0);
        assert_eq!(counts.iter().sum::<usize>(), values.len());
    }

    #[test]
    fn constant_values_use_a_single_bin() {
        let (_, width, counts) = bin_values(&[3.0, 3.0, 3.0]);
        assert_relative_eq!(width, 1.0);
        assert_eq!(counts, vec![3]);
    }

    #[test]
    fn bandwidth_is_positive_for_spread_data() {
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert!(silverman_bandwidth(&values) > 0.0);
    }

    #[test]
    fn bandwidth_is_zero_for_degenerate_input() {
        assert_relative_eq!(silverman_bandwidth(&[1.0]), 0.0);
    }

    fn channels(c: RGBColor) -> (u8, u8, u8) {
        (c.0, c.1, c.2)
    }

    #[test]
    fn heat_colors_follow_the_ramp() {
        assert_eq!(channels(heat_color(1.0)), (255, 0, 0));
        assert_eq!(channels(heat_color(-1.0)), (0, 0, 255));
        assert_eq!(channels(heat_color(0.0)), (255, 255, 255));
        assert_eq!(channels(heat_color(f64::NAN)), (220, 220, 220));
    }

    #[test]
    fn kde_integrates_to_roughly_one() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let bandwidth = silverman_bandwidth(&values);
        let kernel = Normal::new(0.0, 1.0).unwrap();

        let step = 0.01;
        let mut integral = 0.0;
        let mut x = -10.0;
        while x <= 14.0 {
            integral += kde_density(&values, x, bandwidth, &kernel) * step;
            x += step;
        }
        assert_relative_eq!(integral, 1.0, epsilon = 1e-2);
    }
}
