//! This crate provides the core logic for IAM Access Probe:
//! - Declarative probe tables (embedded suites and custom JSON files)
//! - Placeholder resolution against a run's role, bucket and access point
//! - Live S3 probes under assumed-role credentials and IAM policy simulation
//! - The result ledger and its table/JSON reports
//!

pub mod api;
pub mod aws;
pub mod case;
mod errors;
pub mod executor;
pub mod ledger;
pub mod outcome;
pub mod suites;
pub mod template;

// Re-exports for a small, focused public API
pub use api::model::{RunConfig, SuiteInfo};
pub use aws::AwsError;
pub use case::{
    ProbeAction, ProbeCase, ProbeRequest, ProbeSuite, ResolvedCase, RoleCategory, Target,
};
pub use errors::ProbeError;
pub use executor::{run_cases, AwsProbeExecutor, ExecutorOptions, ProbeExecutor};
pub use ledger::{ProbeResult, ResultLedger, Summary};
pub use outcome::{DenialKind, ExpectedOutcome, Observation, ResourcePolicy, Verdict};
pub use template::RunContext;
