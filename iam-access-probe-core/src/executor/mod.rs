//! Probe execution: a single dispatcher over the closed set of probe requests,
//! and the sequential runner feeding the ledger.

/// AWS-backed executor
pub mod aws;

pub use aws::{AwsProbeExecutor, ExecutorOptions};

use async_trait::async_trait;
use log::{info, warn};

use crate::case::ResolvedCase;
use crate::ledger::{ProbeResult, ResultLedger};
use crate::outcome::{Observation, Verdict};

/// Executes one resolved case and reports what happened
#[async_trait]
pub trait ProbeExecutor: Send {
    /// Execute `case`. Never fails: problems are observations.
    async fn execute(&mut self, case: &ResolvedCase) -> Observation;
}

/// Run `cases` one at a time, in order, recording each result in `ledger`.
pub async fn run_cases<E>(executor: &mut E, cases: &[ResolvedCase], ledger: &mut ResultLedger)
where
    E: ProbeExecutor + ?Sized,
{
    for case in cases {
        info!(
            "Probing '{}': {} on {} as {} (expect {})",
            case.name,
            case.request.action_label(),
            case.request.resource_label(),
            case.principal,
            case.expected
        );

        let observed = executor.execute(case).await;
        let result = ProbeResult::new(case.clone(), observed);
        match &result.verdict {
            Verdict::Pass => info!("'{}' passed ({})", case.name, result.observed),
            Verdict::Fail { message } => warn!("'{}' failed: {}", case.name, message),
            Verdict::Inconclusive { reason } => warn!("'{}' inconclusive: {}", case.name, reason),
        }
        ledger.record(result);
    }
}
