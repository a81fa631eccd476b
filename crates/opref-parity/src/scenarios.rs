//! Scenario tables for transposed-convolution parity runs.
//!
//! Two families share one set of rows: the general family (one group, except the `groups` row)
//! and the depthwise family, where the group count equals the input channel count. Every row
//! that is meaningful channel-last also appears with an `_nhwc` suffix.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use opref::ops::conv_transpose::{
    validate_conv_transpose2d, ConvTranspose2dConfig, ConvTranspose2dGeometry, PaddingAlgorithm,
};
use opref::DataFormat;
use serde::{Deserialize, Serialize};

use crate::tolerance::matches_pattern;

/// One parity case. `input_shape` is in the layout named by `config.data_format`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvTransposeScenario {
    pub name: String,
    pub input_shape: [usize; 4],
    pub filter_shape: [usize; 4],
    #[serde(default)]
    pub config: ConvTranspose2dConfig,
}

impl ConvTransposeScenario {
    pub fn input_dims_nchw(&self) -> [usize; 4] {
        match self.config.data_format {
            DataFormat::Nchw => self.input_shape,
            DataFormat::Nhwc => DataFormat::PERM_NHWC_TO_NCHW.map(|axis| self.input_shape[axis]),
        }
    }

    /// Geometry the oracle derives for this row; fails for rows the oracle would reject.
    pub fn geometry(&self) -> opref::Result<ConvTranspose2dGeometry> {
        validate_conv_transpose2d(&self.input_dims_nchw(), &self.filter_shape, &self.config)
    }

    /// Output dims in the scenario's own layout.
    pub fn output_shape(&self) -> opref::Result<[usize; 4]> {
        let geometry = self.geometry()?;
        Ok(self.config.data_format.dims_from_nchw(geometry.output_dims()))
    }
}

#[derive(Clone, Copy)]
enum Family {
    General,
    Depthwise,
}

impl Family {
    fn prefix(self) -> &'static str {
        match self {
            Family::General => "",
            Family::Depthwise => "depthwise_",
        }
    }

    /// Groups for the rows with three input channels.
    fn groups(self) -> usize {
        match self {
            Family::General => 1,
            Family::Depthwise => 3,
        }
    }

    /// Groups for the four-channel `groups` row.
    fn grouped_row_groups(self) -> usize {
        match self {
            Family::General => 2,
            Family::Depthwise => 4,
        }
    }
}

struct Row {
    name: &'static str,
    input_nchw: [usize; 4],
    filter: [usize; 4],
    config: ConvTranspose2dConfig,
    channel_last: bool,
}

fn rows(family: Family) -> Vec<Row> {
    let groups = family.groups();
    let base = ConvTranspose2dConfig::new().with_groups(groups);
    let row = |name, input_nchw, filter, config, channel_last| Row {
        name,
        input_nchw,
        filter,
        config,
        channel_last,
    };

    vec![
        row("base", [2, 3, 5, 5], [3, 6, 3, 3], base.clone(), true),
        row(
            "symmetric_pad",
            [2, 3, 5, 5],
            [3, 6, 3, 3],
            base.clone().with_paddings([1, 1]),
            true,
        ),
        row(
            "asymmetric_pad",
            [2, 3, 5, 5],
            [3, 6, 3, 3],
            base.clone().with_paddings([1, 0, 1, 2]),
            true,
        ),
        row(
            "same_pad",
            [2, 3, 6, 5],
            [3, 6, 4, 3],
            base.clone()
                .with_strides([2, 1])
                .with_dilations([1, 2])
                .with_padding_algorithm(PaddingAlgorithm::Same),
            false,
        ),
        row(
            "valid_pad",
            [2, 3, 5, 5],
            [3, 6, 3, 3],
            base.clone().with_padding_algorithm(PaddingAlgorithm::Valid),
            false,
        ),
        row(
            "groups",
            [2, 4, 5, 5],
            [4, 3, 3, 3],
            base.clone()
                .with_groups(family.grouped_row_groups())
                .with_paddings([1, 1]),
            true,
        ),
        row(
            "stride",
            [2, 3, 5, 5],
            [3, 6, 3, 3],
            base.clone().with_paddings([1, 1]).with_strides([2, 2]),
            true,
        ),
        row(
            "dilation",
            [2, 3, 5, 5],
            [3, 6, 3, 3],
            base.clone().with_paddings([1, 1]).with_dilations([2, 2]),
            true,
        ),
        row(
            "even_upsample",
            [2, 3, 7, 7],
            [3, 6, 5, 5],
            base.clone()
                .with_paddings([2, 2])
                .with_strides([2, 2])
                .with_output_size([14, 14]),
            true,
        ),
        row(
            "even_upsample_output_padding",
            [2, 3, 7, 7],
            [3, 6, 5, 5],
            base.with_paddings([2, 2])
                .with_strides([2, 2])
                .with_output_padding([1, 1]),
            true,
        ),
    ]
}

fn family_scenarios(family: Family) -> Vec<ConvTransposeScenario> {
    let rows = rows(family);
    let channel_first = rows.iter().map(|row| ConvTransposeScenario {
        name: format!("{}{}", family.prefix(), row.name),
        input_shape: row.input_nchw,
        filter_shape: row.filter,
        config: row.config.clone(),
    });
    let channel_last = rows
        .iter()
        .filter(|row| row.channel_last)
        .map(|row| ConvTransposeScenario {
            name: format!("{}{}_nhwc", family.prefix(), row.name),
            input_shape: DataFormat::Nhwc.dims_from_nchw(row.input_nchw),
            filter_shape: row.filter,
            config: row.config.clone().with_data_format(DataFormat::Nhwc),
        });
    channel_first.chain(channel_last).collect()
}

/// The built-in table: general rows, then depthwise rows, each NCHW before NHWC.
pub fn conv_transpose_scenarios() -> Vec<ConvTransposeScenario> {
    let mut scenarios = family_scenarios(Family::General);
    scenarios.extend(family_scenarios(Family::Depthwise));
    scenarios
}

pub fn find_scenario<'a>(
    scenarios: &'a [ConvTransposeScenario],
    name: &str,
) -> Option<&'a ConvTransposeScenario> {
    scenarios.iter().find(|scenario| scenario.name == name)
}

/// Rows whose name matches a `*` glob.
pub fn select_scenarios<'a>(
    scenarios: &'a [ConvTransposeScenario],
    pattern: &str,
) -> Vec<&'a ConvTransposeScenario> {
    scenarios
        .iter()
        .filter(|scenario| matches_pattern(&scenario.name, pattern))
        .collect()
}

/// Parses a JSON array of scenarios. Names must be unique.
pub fn scenarios_from_json_str(contents: &str) -> Result<Vec<ConvTransposeScenario>> {
    let scenarios: Vec<ConvTransposeScenario> =
        serde_json::from_str(contents).context("invalid scenario table")?;
    for (idx, scenario) in scenarios.iter().enumerate() {
        if scenarios[..idx].iter().any(|prev| prev.name == scenario.name) {
            bail!("duplicate scenario name {:?}", scenario.name);
        }
    }
    Ok(scenarios)
}

pub fn load_scenarios(path: &Path) -> Result<Vec<ConvTransposeScenario>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario table {}", path.display()))?;
    scenarios_from_json_str(&contents)
        .with_context(|| format!("failed to parse scenario table {}", path.display()))
}
