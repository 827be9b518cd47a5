//! IAM Access Probe Core API Interface

pub mod model;
mod run_probes;
mod suites;

pub use run_probes::{load_sdk_config, run_probes, run_probes_with_sdk_config, select_cases};
pub use suites::{list_suites, show_suite};
