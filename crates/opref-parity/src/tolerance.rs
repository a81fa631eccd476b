//! Per-dtype tolerances with optional file overrides.
//!
//! Resolution order, later entries winning field by field:
//! dtype default, the file's `default`, rules matching only the candidate, rules matching only the
//! scenario, rules matching both. Rule patterns accept `*` wildcards.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use log::debug;
use opref::DType;
use serde::{Deserialize, Serialize};

use crate::env;

pub const F32_ATOL: f64 = 1e-5;
pub const F32_RTOL: f64 = 1e-5;
pub const F16_ATOL: f64 = 1e-2;
pub const F16_RTOL: f64 = 1e-2;

static PARITY_CONFIG: OnceLock<std::result::Result<ParityConfig, String>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl Tolerance {
    pub const fn new(atol: f64, rtol: f64) -> Self {
        Self { atol, rtol }
    }

    pub fn for_dtype(dtype: DType) -> Self {
        match dtype {
            DType::F16 => Self::new(F16_ATOL, F16_RTOL),
            DType::F32 | DType::F64 => Self::new(F32_ATOL, F32_RTOL),
            DType::I32 | DType::I64 => Self::new(0.0, 0.0),
        }
    }

    /// Largest allowed `|expected - actual|` for this pair of values.
    pub fn threshold(&self, expected: f64, actual: f64) -> f64 {
        self.atol + self.rtol * expected.abs().max(actual.abs())
    }

    fn apply(&mut self, patch: &ToleranceOverride) {
        if let Some(atol) = patch.atol {
            self.atol = atol;
        }
        if let Some(rtol) = patch.rtol {
            self.rtol = rtol;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToleranceOverride {
    #[serde(default)]
    pub atol: Option<f64>,
    #[serde(default)]
    pub rtol: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRule {
    #[serde(default)]
    pub candidate: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub atol: Option<f64>,
    #[serde(default)]
    pub rtol: Option<f64>,
}

impl ToleranceRule {
    fn patch(&self) -> ToleranceOverride {
        ToleranceOverride {
            atol: self.atol,
            rtol: self.rtol,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParityConfig {
    #[serde(default)]
    pub default: Option<ToleranceOverride>,
    #[serde(default)]
    pub rules: Vec<ToleranceRule>,
}

impl ParityConfig {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("invalid parity tolerance config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read parity config {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("failed to parse parity config {}", path.display()))
    }

    /// Loads the file named by `OPREF_PARITY_CONFIG`, or an empty config when unset.
    pub fn from_env() -> Result<Self> {
        match env::config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn resolve(&self, dtype: DType, candidate: &str, scenario: &str) -> Tolerance {
        let mut resolved = Tolerance::for_dtype(dtype);
        if let Some(defaults) = &self.default {
            resolved.apply(defaults);
        }

        let mut candidate_rule = None;
        let mut scenario_rule = None;
        let mut both_rule = None;
        for rule in &self.rules {
            let candidate_match = rule
                .candidate
                .as_deref()
                .is_some_and(|pattern| matches_pattern(candidate, pattern));
            let scenario_match = rule
                .scenario
                .as_deref()
                .is_some_and(|pattern| matches_pattern(scenario, pattern));
            match (candidate_match, scenario_match) {
                (true, true) => both_rule = Some(rule.patch()),
                (true, false) if rule.scenario.is_none() => candidate_rule = Some(rule.patch()),
                (false, true) if rule.candidate.is_none() => scenario_rule = Some(rule.patch()),
                _ => {}
            }
        }

        for patch in [candidate_rule, scenario_rule, both_rule].iter().flatten() {
            resolved.apply(patch);
        }
        debug!("tolerance for {candidate}/{scenario} ({dtype}): {resolved:?}");
        resolved
    }
}

/// Process-wide config loaded once from `OPREF_PARITY_CONFIG`.
pub fn parity_config() -> Result<&'static ParityConfig> {
    PARITY_CONFIG
        .get_or_init(|| ParityConfig::from_env().map_err(|err| format!("{err:#}")))
        .as_ref()
        .map_err(|err| anyhow!("{err}"))
}

/// Glob match where `*` spans any run of characters, including none.
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    let mut pieces = pattern.split('*');
    let Some(head) = pieces.next() else {
        return value.is_empty();
    };
    let Some(mut rest) = value.strip_prefix(head) else {
        return false;
    };
    let tail: Vec<&str> = pieces.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };
    for piece in middle {
        match rest.find(piece) {
            Some(found) => rest = &rest[found + piece.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(matches_pattern("gather", "gather"));
        assert!(!matches_pattern("gather", "gathe"));
        assert!(matches_pattern("anything", "*"));
        assert!(matches_pattern("even_upsample_nhwc", "even_*"));
        assert!(matches_pattern("even_upsample_nhwc", "*_nhwc"));
        assert!(matches_pattern("even_upsample_nhwc", "even*sample*nhwc"));
        assert!(!matches_pattern("even_upsample", "*_nhwc"));
        assert!(!matches_pattern("ab", "a*b*b"));
        assert!(matches_pattern("abb", "a*b*b"));
    }

    #[test]
    fn dtype_defaults() {
        let config = ParityConfig::default();
        assert_eq!(
            config.resolve(DType::F32, "gather", "base"),
            Tolerance::new(1e-5, 1e-5)
        );
        assert_eq!(
            config.resolve(DType::F16, "gather", "base"),
            Tolerance::new(1e-2, 1e-2)
        );
        assert_eq!(Tolerance::for_dtype(DType::I64), Tolerance::new(0.0, 0.0));
    }

    #[test]
    fn rule_precedence() {
        let config = ParityConfig::from_json_str(
            r#"{
                "default": { "atol": 1e-4 },
                "rules": [
                    { "candidate": "both", "scenario": "*_nhwc", "rtol": 0.5 },
                    { "scenario": "*_nhwc", "atol": 0.25, "rtol": 0.25 },
                    { "candidate": "b*", "atol": 0.125 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.resolve(DType::F32, "gather", "base"),
            Tolerance::new(1e-4, 1e-5)
        );
        assert_eq!(
            config.resolve(DType::F32, "both", "base"),
            Tolerance::new(0.125, 1e-5)
        );
        assert_eq!(
            config.resolve(DType::F32, "gather", "stride_nhwc"),
            Tolerance::new(0.25, 0.25)
        );
        // Candidate rule, then scenario rule, then the combined rule.
        assert_eq!(
            config.resolve(DType::F32, "both", "stride_nhwc"),
            Tolerance::new(0.25, 0.5)
        );
    }

    #[test]
    fn load_reports_path_on_failure() {
        let path = std::env::temp_dir()
            .join(format!("opref-parity-{}-bad.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let err = ParityConfig::load(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(format!("{err:#}").contains("failed to parse parity config"));

        let missing = std::env::temp_dir().join("opref-parity-definitely-missing.json");
        assert!(ParityConfig::load(&missing).is_err());
    }
}
