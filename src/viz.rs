//! Segment size chart using Plotters

use std::path::Path;

use plotters::prelude::*;

use crate::report::SegmentCount;
use crate::segment::Segment;

/// One color per segment, in [`Segment::ALL`] order
const SEGMENT_COLORS: [RGBColor; 7] = [
    RED,
    RGBColor(255, 140, 0),
    GREEN,
    YELLOW,
    BLUE,
    MAGENTA,
    RGBColor(128, 128, 128),
];

fn segment_color(segment: Segment) -> RGBColor {
    let index = Segment::ALL.iter().position(|&s| s == segment).unwrap_or(0);
    SEGMENT_COLORS[index]
}

/// Upper bound of the y axis, leaving headroom above the tallest bar
pub fn chart_y_max(counts: &[SegmentCount]) -> f64 {
    let tallest = counts.iter().map(|c| c.customers).max().unwrap_or(0).max(1);
    tallest as f64 * 1.1
}

/// Draw a bar chart of customers per segment and save it as PNG
pub fn create_segment_chart(counts: &[SegmentCount], output_path: &Path) -> crate::Result<()> {
    if counts.is_empty() {
        anyhow::bail!("no segments to plot");
    }

    let root = BitMapBackend::new(output_path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = counts.len() as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption("Customers per Segment", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n - 0.5), 0f64..chart_y_max(counts))?;

    let label_at = |x: &f64| -> String {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        counts
            .get(index as usize)
            .map(|c| c.segment.label().to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&label_at)
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, count) in counts.iter().enumerate() {
        let x = i as f64;
        let color = segment_color(count.segment);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, count.customers as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    tracing::info!(path = %output_path.display(), "segment chart saved");

    Ok(())
}
