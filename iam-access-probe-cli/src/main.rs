//! `iam-access-probe`: run S3 authorization probe suites against live AWS and
//! report whether every observed outcome matched its expectation.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use iam_access_probe_core::api::{list_suites, run_probes, show_suite};
use iam_access_probe_core::{RoleCategory, RunConfig};
use log::{debug, LevelFilter};

mod output;

/// Exit status for usage, configuration and setup errors
const EXIT_ERROR: u8 = 3;
/// Exit status when interrupted
const EXIT_INTERRUPTED: u8 = 130;

/// Probe IAM authorization outcomes for S3 buckets, access points and roles.
#[derive(Parser, Debug)]
#[command(name = "iam-access-probe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run probe suites and print the report.
    ///
    /// Exit status: 0 all passed, 1 any failure, 2 inconclusive results only,
    /// 3 usage or setup error.
    Run(RunArgs),
    /// List the embedded probe suites.
    ListSuites,
    /// Print one embedded suite as JSON.
    ShowSuite {
        /// Suite name, as shown by list-suites
        name: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ReportFormat {
    /// Fixed-width text table
    #[default]
    Table,
    /// JSON document
    Json,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Role ARN under test
    #[arg(long, env = "PROBE_ROLE_ARN")]
    role_arn: String,

    /// Bucket under test
    #[arg(long, env = "PROBE_BUCKET_NAME")]
    bucket_name: String,

    /// Additional role for cases that name it as ${Role:NAME}; repeatable
    #[arg(long = "role", value_name = "NAME=ARN", value_parser = parse_named_role)]
    roles: Vec<(String, String)>,

    /// Run category-tagged cases for this category (input, control or output)
    #[arg(long, value_parser = RoleCategory::from_str)]
    role_category: Option<RoleCategory>,

    /// Access point alias used by access-point cases
    #[arg(long)]
    access_point_alias: Option<String>,

    /// Embedded suite to run; repeatable. Defaults to role-simulation when a
    /// category is given and bucket-policy otherwise.
    #[arg(long = "suite", value_name = "NAME")]
    suites: Vec<String>,

    /// Custom suite file (JSON), run after any embedded suites
    #[arg(long = "cases", value_name = "FILE")]
    case_file: Option<PathBuf>,

    /// Give up on a single probe after this many seconds
    #[arg(long, value_name = "SECS")]
    probe_timeout_secs: Option<u64>,

    /// AWS region override
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Endpoint override for every AWS call
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Use path-style S3 addressing
    #[arg(long)]
    path_style: bool,

    /// STS role session name
    #[arg(long, default_value = iam_access_probe_core::aws::client_cache::DEFAULT_SESSION_NAME)]
    session_name: String,

    /// AWS partition substituted for ${Partition}
    #[arg(long, default_value = "aws")]
    partition: String,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    format: ReportFormat,
}

fn parse_named_role(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, arn)) if !name.trim().is_empty() && !arn.trim().is_empty() => {
            Ok((name.trim().to_string(), arn.trim().to_string()))
        }
        _ => Err(format!("expected NAME=ARN, got '{}'", value)),
    }
}

impl RunArgs {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::new(self.role_arn, self.bucket_name);
        config.roles = self.roles.into_iter().collect();
        config.role_category = self.role_category;
        config.access_point_alias = self.access_point_alias;
        config.suites = self.suites;
        config.case_file = self.case_file;
        config.probe_timeout = self.probe_timeout_secs.map(Duration::from_secs);
        config.region = self.region;
        config.endpoint_url = self.endpoint_url;
        config.force_path_style = self.path_style;
        config.session_name = self.session_name;
        config.partition = self.partition;
        config
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

async fn run(args: RunArgs) -> Result<ExitCode> {
    let format = args.format;
    let config = args.into_config();
    debug!("Run configuration: {:?}", config);

    let ledger = tokio::select! {
        ledger = run_probes(&config) => ledger.context("Probe run could not start")?,
        _ = tokio::signal::ctrl_c() => {
            output::warn("interrupted; no report was produced");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    output::print_report(&ledger, format == ReportFormat::Json)?;
    output::print_outcome(&ledger);

    let code = ledger.summary().exit_code();
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(EXIT_ERROR)))
}

async fn dispatch(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Run(args) => run(args).await,
        Commands::ListSuites => {
            output::print_suites(&list_suites()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::ShowSuite { name } => {
            output::print_suite(&show_suite(&name)?)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose);

    match dispatch(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            output::warn(&format!("{:#}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
