use crate::error::{OptimizerError, Result};
use crate::genetic_optimizer::GenerationRecord;
use plotters::prelude::*;
use std::path::Path;

fn chart_error(error: impl std::fmt::Display) -> OptimizerError {
    OptimizerError::Chart(error.to_string())
}

/// Fitness range covered by the history, padded so flat lines stay visible.
pub fn fitness_bounds(history: &[GenerationRecord]) -> (f64, f64) {
    let values = history
        .iter()
        .flat_map(|r| [r.best_fitness, r.mean_fitness]);

    let (low, high) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }

    let padding = ((high - low) * 0.05).max(1.0);
    (low - padding, high + padding)
}

/// Draws best-so-far and mean fitness per generation.
pub fn plot_convergence(history: &[GenerationRecord], output_path: &Path) -> Result<()> {
    // Create a drawing area for the chart.
    let root = BitMapBackend::new(output_path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let generations = history.len().max(2);
    let (low, high) = fitness_bounds(history);

    let mut chart = ChartBuilder::on(&root)
        .caption("Fitness convergence", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1..generations, low..high)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc("Generation")
        .y_desc("Fitness")
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(LineSeries::new(
            history.iter().map(|r| (r.generation, r.best_fitness)),
            &RED,
        ))
        .map_err(chart_error)?
        .label("Best so far")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .draw_series(LineSeries::new(
            history.iter().map(|r| (r.generation, r.mean_fitness)),
            &BLUE,
        ))
        .map_err(chart_error)?
        .label("Generation mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    // Configure the legend for the chart.
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .map_err(chart_error)?;

    // Save the result to the specified output path.
    root.present().map_err(chart_error)?;
    Ok(())
}
