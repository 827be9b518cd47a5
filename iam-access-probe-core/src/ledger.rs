//! Result ledger for one probe run and its text/JSON renderings.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::case::ResolvedCase;
use crate::errors::{ProbeError, Result};
use crate::outcome::{Observation, ResourcePolicy, Verdict};

/// Outcome of executing one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    /// The case as executed
    pub case: ResolvedCase,
    /// What was observed
    pub observed: Observation,
    /// Comparison of observed against expected
    pub verdict: Verdict,
}

impl ProbeResult {
    /// Evaluate `observed` against the case's expectation
    pub fn new(case: ResolvedCase, observed: Observation) -> Self {
        let verdict = Verdict::evaluate(case.expected, &observed);
        Self {
            case,
            observed,
            verdict,
        }
    }

    /// `observed == expected`
    pub const fn passed(&self) -> bool {
        self.verdict.is_pass()
    }
}

/// Pass/fail counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of probes executed
    pub total: usize,
    /// Probes whose verdict is pass
    pub passed: usize,
    /// Probes whose verdict is fail
    pub failed: usize,
    /// Probes that could not be asserted
    pub inconclusive: usize,
}

impl Summary {
    /// True when every probe passed
    pub const fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Process exit status: 0 all passed, 1 any failure, 2 inconclusive only
    pub const fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            1
        } else if self.inconclusive > 0 {
            2
        } else {
            0
        }
    }
}

/// Ordered results of a single run plus diagnostic context.
///
/// Append-only while the run executes. Rendering borrows the ledger and never
/// changes it, so it can be rendered as often as needed.
#[derive(Debug, Clone, Serialize)]
pub struct ResultLedger {
    principal: String,
    bucket: String,
    started_at: DateTime<Utc>,
    resource_policy: ResourcePolicy,
    results: Vec<ProbeResult>,
    summary: Summary,
}

impl ResultLedger {
    /// Empty ledger for a run of `principal` against `bucket`
    pub fn new(principal: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            bucket: bucket.into(),
            started_at: Utc::now(),
            resource_policy: ResourcePolicy::NotFetched,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Record the bucket policy fetched for diagnostics
    pub fn set_resource_policy(&mut self, policy: ResourcePolicy) {
        self.resource_policy = policy;
    }

    /// Append a result
    pub fn record(&mut self, result: ProbeResult) {
        self.summary.total += 1;
        match result.verdict {
            Verdict::Pass => self.summary.passed += 1,
            Verdict::Fail { .. } => self.summary.failed += 1,
            Verdict::Inconclusive { .. } => self.summary.inconclusive += 1,
        }
        self.results.push(result);
    }

    /// Principal under test
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Bucket under test
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Bucket policy state
    pub const fn resource_policy(&self) -> &ResourcePolicy {
        &self.resource_policy
    }

    /// Results in execution order
    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    /// Counts
    pub const fn summary(&self) -> Summary {
        self.summary
    }

    /// Fixed-width text report
    pub fn render_table(&self) -> String {
        const HEADERS: [&str; 8] = [
            "#", "CASE", "PRINCIPAL", "ACTION", "RESOURCE", "EXPECTED", "OBSERVED", "RESULT",
        ];

        let rows: Vec<[String; 8]> = self
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                [
                    (i + 1).to_string(),
                    r.case.name.clone(),
                    r.case.principal.clone(),
                    r.case.request.action_label().to_string(),
                    r.case.request.resource_label(),
                    r.case.expected.to_string(),
                    r.observed.to_string(),
                    r.verdict.label().to_string(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "IAM Access Probe Report");
        let _ = writeln!(out, "Principal: {}", self.principal);
        let _ = writeln!(out, "Bucket:    {}", self.bucket);
        let _ = writeln!(out, "Started:   {}", self.started_at.to_rfc3339());
        let _ = writeln!(out);

        write_row(&mut out, &widths, HEADERS.iter().copied());
        let _ = writeln!(
            out,
            "{}",
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
        );
        for row in &rows {
            write_row(&mut out, &widths, row.iter().map(String::as_str));
        }

        let problems: Vec<_> = self
            .results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.passed())
            .collect();
        if !problems.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Details:");
            for (i, r) in problems {
                let detail = match &r.verdict {
                    Verdict::Fail { message } => message.as_str(),
                    Verdict::Inconclusive { reason } => reason.as_str(),
                    Verdict::Pass => continue,
                };
                let _ = writeln!(
                    out,
                    "  [{}] {} {}: {}",
                    i + 1,
                    r.verdict.label(),
                    r.case.name,
                    detail
                );
            }
        }

        let _ = writeln!(out);
        match &self.resource_policy {
            ResourcePolicy::NotFetched => {}
            ResourcePolicy::Absent => {
                let _ = writeln!(out, "Resource policy: none attached to {}", self.bucket);
            }
            ResourcePolicy::Unavailable(reason) => {
                let _ = writeln!(out, "Resource policy: unavailable ({})", reason);
            }
            ResourcePolicy::Attached(doc) => {
                let _ = writeln!(out, "Resource policy:");
                for line in pretty_policy(doc).lines() {
                    let _ = writeln!(out, "  {}", line);
                }
            }
        }

        let s = self.summary;
        let _ = writeln!(
            out,
            "Passed {}/{} ({} failed, {} inconclusive)",
            s.passed, s.total, s.failed, s.inconclusive
        );
        out
    }

    /// JSON report
    pub fn render_json(&self, pretty: bool) -> Result<String> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.map_err(|e| ProbeError::json_parsing("result ledger", e))
    }
}

fn write_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let line = cells
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Pretty-print a policy document, or return it untouched if it is not JSON
fn pretty_policy(doc: &str) -> String {
    serde_json::from_str::<serde_json::Value>(doc)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| doc.to_string())
}
