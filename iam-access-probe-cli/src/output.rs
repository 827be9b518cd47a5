use anyhow::{Context, Result};
use iam_access_probe_core::{ProbeSuite, ResultLedger, SuiteInfo};
use log::debug;
use std::io::{self, Write};

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "iam-access-probe: {}", msg);
}

pub(crate) fn warn(msg: &str) {
    let _ = writeln!(io::stderr(), "iam-access-probe (warning): {}", msg);
}

/// Print the run report to stdout
pub(crate) fn print_report(ledger: &ResultLedger, json: bool) -> Result<()> {
    let rendered = if json {
        let mut out = ledger
            .render_json(true)
            .context("Failed to serialize the probe report to JSON")?;
        out.push('\n');
        out
    } else {
        ledger.render_table()
    };

    let stdout = io::stdout();
    let mut w = stdout.lock();
    w.write_all(rendered.as_bytes())
        .context("Failed to write the probe report")?;
    w.flush().context("Failed to write the probe report")?;
    debug!("Report written to stdout ({} results)", ledger.results().len());
    Ok(())
}

/// Print the outcome in one line to stderr
pub(crate) fn print_outcome(ledger: &ResultLedger) {
    let s = ledger.summary();
    if s.failed > 0 {
        warn(&format!("{} of {} probes failed", s.failed, s.total));
    } else if s.inconclusive > 0 {
        warn(&format!(
            "{} of {} probes were inconclusive; no failures",
            s.inconclusive, s.total
        ));
    } else {
        note(&format!("all {} probes passed", s.total));
    }
}

pub(crate) fn print_suites(suites: &[SuiteInfo]) {
    let width = suites.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let stdout = io::stdout();
    let mut w = stdout.lock();
    for suite in suites {
        let mut marker = String::new();
        if suite.needs_access_point {
            marker.push_str(" [needs --access-point-alias]");
        }
        for role in &suite.named_roles {
            marker.push_str(&format!(" [needs --role {}=ARN]", role));
        }
        let _ = writeln!(
            w,
            "{:<width$}  {:>2} cases  {}{}",
            suite.name,
            suite.case_count,
            suite.description,
            marker,
            width = width
        );
    }
}

pub(crate) fn print_suite(suite: &ProbeSuite) -> Result<()> {
    let json = serde_json::to_string_pretty(suite)
        .with_context(|| format!("Failed to serialize suite '{}'", suite.name))?;
    println!("{}", json);
    Ok(())
}
