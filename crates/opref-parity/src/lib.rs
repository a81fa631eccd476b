//! Parity checks of candidate operators against the `opref` oracles.
//!
//! A run draws seeded inputs for each scenario, evaluates the scatter oracle and the candidate,
//! and compares them with `|expected - actual| <= atol + rtol * max(|expected|, |actual|)`.
//! Tolerances default per dtype and can be overridden per candidate or scenario through the
//! JSON file named by `OPREF_PARITY_CONFIG`.

pub mod candidate;
pub mod compare;
pub mod data;
pub mod env;
pub mod runner;
pub mod scenarios;
pub mod tolerance;

pub use candidate::{ConvTranspose2dCandidate, GatherCandidate};
pub use compare::{allclose, allclose_tensors, assert_close, max_abs_diff, ParityError};
pub use data::{random_signed_vec, random_tensor, random_vec, seeded_rng};
pub use runner::{
    render_report_table, run_all, run_all_with, run_conv_transpose_scenario,
    run_conv_transpose_scenario_with, ScenarioReport,
};
pub use scenarios::{conv_transpose_scenarios, find_scenario, load_scenarios, ConvTransposeScenario};
pub use tolerance::{parity_config, ParityConfig, Tolerance, ToleranceRule};
