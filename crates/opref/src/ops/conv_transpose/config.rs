use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OpError, Result};
use crate::layout::DataFormat;

/// How the spatial padding of a transposed convolution is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaddingAlgorithm {
    /// Use the caller's `paddings` as given.
    #[default]
    Explicit,
    /// Pad so a forward convolution would produce `ceil(in / stride)`.
    Same,
    /// No padding at all.
    Valid,
}

impl PaddingAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            PaddingAlgorithm::Explicit => "EXPLICIT",
            PaddingAlgorithm::Same => "SAME",
            PaddingAlgorithm::Valid => "VALID",
        }
    }
}

impl fmt::Display for PaddingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaddingAlgorithm {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EXPLICIT" => Ok(PaddingAlgorithm::Explicit),
            "SAME" => Ok(PaddingAlgorithm::Same),
            "VALID" => Ok(PaddingAlgorithm::Valid),
            other => Err(OpError::InvalidPaddingAlgorithm(other.to_string())),
        }
    }
}

/// Caller-supplied spatial padding.
///
/// Serialized as a flat list: two values `[h, w]` pad both edges of an axis by the same amount,
/// four values are `[top, bottom, left, right]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub enum ExplicitPadding {
    Symmetric([usize; 2]),
    PerEdge([usize; 4]),
}

impl ExplicitPadding {
    pub fn from_slice(values: &[usize]) -> Result<Self> {
        match *values {
            [h, w] => Ok(ExplicitPadding::Symmetric([h, w])),
            [top, bottom, left, right] => Ok(ExplicitPadding::PerEdge([top, bottom, left, right])),
            _ => Err(OpError::InvalidPaddingLength(values.len())),
        }
    }

    /// Expands to `[top, bottom, left, right]`.
    pub fn edges(self) -> [usize; 4] {
        match self {
            ExplicitPadding::Symmetric([h, w]) => [h, h, w, w],
            ExplicitPadding::PerEdge(edges) => edges,
        }
    }
}

impl Default for ExplicitPadding {
    fn default() -> Self {
        ExplicitPadding::Symmetric([0, 0])
    }
}

impl From<[usize; 2]> for ExplicitPadding {
    fn from(values: [usize; 2]) -> Self {
        ExplicitPadding::Symmetric(values)
    }
}

impl From<[usize; 4]> for ExplicitPadding {
    fn from(values: [usize; 4]) -> Self {
        ExplicitPadding::PerEdge(values)
    }
}

impl TryFrom<Vec<usize>> for ExplicitPadding {
    type Error = OpError;

    fn try_from(values: Vec<usize>) -> Result<Self> {
        ExplicitPadding::from_slice(&values)
    }
}

impl From<ExplicitPadding> for Vec<usize> {
    fn from(padding: ExplicitPadding) -> Self {
        match padding {
            ExplicitPadding::Symmetric(values) => values.to_vec(),
            ExplicitPadding::PerEdge(values) => values.to_vec(),
        }
    }
}

/// Attributes of a 2-D transposed convolution.
///
/// Missing fields take their defaults when deserialized, so a scenario file only needs to list
/// what differs from a stride-1, unpadded, ungrouped NCHW call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvTranspose2dConfig {
    pub strides: [usize; 2],
    pub paddings: ExplicitPadding,
    pub dilations: [usize; 2],
    pub groups: usize,
    pub padding_algorithm: PaddingAlgorithm,
    pub data_format: DataFormat,
    /// Requested post-crop spatial size.
    pub output_size: Option<[usize; 2]>,
    /// Extra rows/columns on the trailing edge, each smaller than the matching stride.
    pub output_padding: Option<[usize; 2]>,
}

impl Default for ConvTranspose2dConfig {
    fn default() -> Self {
        Self {
            strides: [1, 1],
            paddings: ExplicitPadding::default(),
            dilations: [1, 1],
            groups: 1,
            padding_algorithm: PaddingAlgorithm::Explicit,
            data_format: DataFormat::Nchw,
            output_size: None,
            output_padding: None,
        }
    }
}

impl ConvTranspose2dConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strides(mut self, strides: [usize; 2]) -> Self {
        self.strides = strides;
        self
    }

    pub fn with_paddings(mut self, paddings: impl Into<ExplicitPadding>) -> Self {
        self.paddings = paddings.into();
        self
    }

    pub fn with_dilations(mut self, dilations: [usize; 2]) -> Self {
        self.dilations = dilations;
        self
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_padding_algorithm(mut self, algorithm: PaddingAlgorithm) -> Self {
        self.padding_algorithm = algorithm;
        self
    }

    pub fn with_data_format(mut self, format: DataFormat) -> Self {
        self.data_format = format;
        self
    }

    pub fn with_output_size(mut self, output_size: [usize; 2]) -> Self {
        self.output_size = Some(output_size);
        self
    }

    pub fn with_output_padding(mut self, output_padding: [usize; 2]) -> Self {
        self.output_padding = Some(output_padding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_algorithm_names_are_exact() {
        assert_eq!("SAME".parse::<PaddingAlgorithm>().unwrap(), PaddingAlgorithm::Same);
        assert_eq!("VALID".parse::<PaddingAlgorithm>().unwrap(), PaddingAlgorithm::Valid);
        assert_eq!(
            "EXPLICIT".parse::<PaddingAlgorithm>().unwrap(),
            PaddingAlgorithm::Explicit
        );
        assert_eq!(
            "FULL".parse::<PaddingAlgorithm>().unwrap_err(),
            OpError::InvalidPaddingAlgorithm("FULL".to_string())
        );
    }

    #[test]
    fn explicit_padding_expands_to_edges() {
        assert_eq!(ExplicitPadding::from([1, 2]).edges(), [1, 1, 2, 2]);
        assert_eq!(ExplicitPadding::from([1, 0, 1, 2]).edges(), [1, 0, 1, 2]);
        assert_eq!(
            ExplicitPadding::from_slice(&[1, 2, 3]).unwrap_err(),
            OpError::InvalidPaddingLength(3)
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "strides": [2, 1],
            "dilations": [1, 2],
            "padding_algorithm": "SAME",
            "data_format": "NHWC"
        }"#;
        let config: ConvTranspose2dConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.strides, [2, 1]);
        assert_eq!(config.groups, 1);
        assert_eq!(config.paddings, ExplicitPadding::Symmetric([0, 0]));
        assert_eq!(config.padding_algorithm, PaddingAlgorithm::Same);
        assert_eq!(config.data_format, DataFormat::Nhwc);
        assert_eq!(config.output_size, None);
    }

    #[test]
    fn config_rejects_bad_padding_length() {
        let json = r#"{ "paddings": [1, 2, 3] }"#;
        let err = serde_json::from_str::<ConvTranspose2dConfig>(json).unwrap_err();
        assert!(err.to_string().contains("2 or 4 values"), "{err}");
    }

    #[test]
    fn config_serializes_paddings_flat() {
        let config = ConvTranspose2dConfig::new()
            .with_paddings([1, 0, 1, 2])
            .with_output_padding([1, 1]);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["paddings"], serde_json::json!([1, 0, 1, 2]));
        assert_eq!(value["padding_algorithm"], "EXPLICIT");
        assert_eq!(value["output_padding"], serde_json::json!([1, 1]));
    }
}
