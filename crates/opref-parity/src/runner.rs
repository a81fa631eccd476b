//! Runs candidates against the scatter oracle over scenario tables.

use std::fmt::Write;

use anyhow::{Context, Result};
use log::{info, warn};
use opref::{conv_transpose2d, DType, Float};
use serde::Serialize;

use crate::candidate::ConvTranspose2dCandidate;
use crate::compare::{allclose_tensors, max_abs_diff};
use crate::data::{random_tensor, seeded_rng};
use crate::scenarios::ConvTransposeScenario;
use crate::tolerance::{parity_config, ParityConfig, Tolerance};

/// Outcome of one candidate on one scenario at one dtype.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub candidate: String,
    pub dtype: DType,
    pub output_shape: Vec<usize>,
    /// NaN when the candidate failed or returned a different shape.
    pub max_abs_diff: f64,
    pub tolerance: Tolerance,
    pub passed: bool,
    pub failure: Option<String>,
}

/// Runs one scenario with tolerances from `OPREF_PARITY_CONFIG`.
pub fn run_conv_transpose_scenario<T, C>(
    candidate: &C,
    scenario: &ConvTransposeScenario,
    seed: u64,
) -> Result<ScenarioReport>
where
    T: Float,
    C: ConvTranspose2dCandidate,
{
    run_conv_transpose_scenario_with::<T, C>(candidate, scenario, seed, parity_config()?)
}

/// Runs one scenario with explicit tolerances.
///
/// Inputs are drawn uniformly from `[0, 1)` with `seed`. An oracle rejection is an error since
/// the scenario itself is broken; a candidate error or mismatch is a failed report.
pub fn run_conv_transpose_scenario_with<T, C>(
    candidate: &C,
    scenario: &ConvTransposeScenario,
    seed: u64,
    config: &ParityConfig,
) -> Result<ScenarioReport>
where
    T: Float,
    C: ConvTranspose2dCandidate,
{
    let mut rng = seeded_rng(seed);
    let input = random_tensor::<T>(&mut rng, &scenario.input_shape)
        .with_context(|| format!("scenario {}: invalid input shape", scenario.name))?;
    let filter = random_tensor::<T>(&mut rng, &scenario.filter_shape)
        .with_context(|| format!("scenario {}: invalid filter shape", scenario.name))?;

    let expected = conv_transpose2d(&input, &filter, &scenario.config)
        .with_context(|| format!("oracle rejected scenario {}", scenario.name))?;
    let tolerance = config.resolve(T::DTYPE, candidate.name(), &scenario.name);

    let mut report = ScenarioReport {
        scenario: scenario.name.clone(),
        candidate: candidate.name().to_string(),
        dtype: T::DTYPE,
        output_shape: expected.dims().to_vec(),
        max_abs_diff: f64::NAN,
        tolerance,
        passed: false,
        failure: None,
    };

    match candidate.conv_transpose2d(&input, &filter, &scenario.config) {
        Ok(actual) => {
            if actual.dims() == expected.dims() {
                report.max_abs_diff = max_abs_diff(expected.data(), actual.data());
            }
            match allclose_tensors(&expected, &actual, tolerance) {
                Ok(()) => report.passed = true,
                Err(err) => report.failure = Some(err.to_string()),
            }
        }
        Err(err) => report.failure = Some(format!("candidate error: {err:#}")),
    }

    match &report.failure {
        None => info!(
            "{} {} ({}): ok, max |diff| {:.3e}",
            report.candidate, report.scenario, report.dtype, report.max_abs_diff
        ),
        Some(failure) => warn!(
            "{} {} ({}): {failure}",
            report.candidate, report.scenario, report.dtype
        ),
    }
    Ok(report)
}

/// Runs every scenario in order; scenario `i` uses seed `base_seed + i`.
pub fn run_all<T, C>(
    candidate: &C,
    scenarios: &[ConvTransposeScenario],
    base_seed: u64,
) -> Result<Vec<ScenarioReport>>
where
    T: Float,
    C: ConvTranspose2dCandidate,
{
    run_all_with::<T, C>(candidate, scenarios, base_seed, parity_config()?)
}

pub fn run_all_with<T, C>(
    candidate: &C,
    scenarios: &[ConvTransposeScenario],
    base_seed: u64,
    config: &ParityConfig,
) -> Result<Vec<ScenarioReport>>
where
    T: Float,
    C: ConvTranspose2dCandidate,
{
    let reports = scenarios
        .iter()
        .enumerate()
        .map(|(idx, scenario)| {
            let seed = base_seed.wrapping_add(idx as u64);
            run_conv_transpose_scenario_with::<T, C>(candidate, scenario, seed, config)
        })
        .collect::<Result<Vec<_>>>()?;
    let failed = reports.iter().filter(|report| !report.passed).count();
    if failed == 0 {
        info!(
            "{}: {} scenarios passed at {}",
            candidate.name(),
            reports.len(),
            T::DTYPE
        );
    } else {
        warn!(
            "{}: {failed} of {} scenarios failed at {}",
            candidate.name(),
            reports.len(),
            T::DTYPE
        );
    }
    Ok(reports)
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
    Center,
}

struct Col {
    header: &'static str,
    width: usize,
    align: Align,
}

fn format_cell(value: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{value:<width$}"),
        Align::Right => format!("{value:>width$}"),
        Align::Center => {
            let pad = width.saturating_sub(value.len());
            let left = pad / 2;
            let right = pad - left;
            format!("{}{}{}", " ".repeat(left), value, " ".repeat(right))
        }
    }
}

fn border(widths: &[usize]) -> String {
    let mut line = String::new();
    line.push('+');
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}

fn report_cells(report: &ScenarioReport) -> [String; 7] {
    [
        report.scenario.clone(),
        report.candidate.clone(),
        report.dtype.to_string(),
        format!("{:?}", report.output_shape),
        format!("{:.3e}", report.max_abs_diff),
        format!("{:e}/{:e}", report.tolerance.atol, report.tolerance.rtol),
        if report.passed { "ok" } else { "fail" }.to_string(),
    ]
}

/// Formats reports as a bordered text table, one row per report.
pub fn render_report_table(reports: &[ScenarioReport]) -> String {
    let mut cols = [
        ("scenario", Align::Left),
        ("candidate", Align::Left),
        ("dtype", Align::Center),
        ("output", Align::Left),
        ("max_abs_diff", Align::Right),
        ("atol/rtol", Align::Right),
        ("status", Align::Center),
    ]
    .map(|(header, align)| Col {
        header,
        width: header.len(),
        align,
    });

    let rows: Vec<[String; 7]> = reports.iter().map(report_cells).collect();
    for row in &rows {
        for (col, cell) in cols.iter_mut().zip(row) {
            col.width = col.width.max(cell.len());
        }
    }

    let widths: Vec<usize> = cols.iter().map(|col| col.width).collect();
    let header = cols
        .iter()
        .map(|col| format_cell(col.header, col.width, col.align))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut out = String::new();
    let _ = writeln!(out, "{}", border(&widths));
    let _ = writeln!(out, "| {header} |");
    let _ = writeln!(out, "{}", border(&widths));
    for row in &rows {
        let cells = cols
            .iter()
            .zip(row)
            .map(|(col, cell)| format_cell(cell, col.width, col.align))
            .collect::<Vec<_>>()
            .join(" | ");
        let _ = writeln!(out, "| {cells} |");
    }
    let _ = writeln!(out, "{}", border(&widths));
    out
}
