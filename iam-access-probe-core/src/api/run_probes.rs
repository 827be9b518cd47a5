use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use log::{debug, info, warn};

use crate::api::model::RunConfig;
use crate::case::ResolvedCase;
use crate::errors::ProbeError;
use crate::executor::{run_cases, AwsProbeExecutor, ExecutorOptions};
use crate::ledger::ResultLedger;
use crate::outcome::ResourcePolicy;
use crate::suites::{find_suite, load_suite_file};
use crate::template::RunContext;

/// Select and resolve the cases a run will execute, in table order.
///
/// Everything here is local: a bad suite name, an unresolvable placeholder or
/// a missing access point alias fails before any AWS call is made.
pub fn select_cases(config: &RunConfig) -> Result<Vec<ResolvedCase>> {
    if config.role_arn.trim().is_empty() {
        return Err(ProbeError::validation_field("role ARN must not be empty", "role_arn").into());
    }
    if config.bucket_name.trim().is_empty() {
        return Err(
            ProbeError::validation_field("bucket name must not be empty", "bucket_name").into(),
        );
    }
    for (name, arn) in &config.roles {
        if name.trim().is_empty() || arn.trim().is_empty() {
            return Err(ProbeError::validation_field(
                format!("named role '{}' needs a non-empty name and ARN", name),
                "roles",
            )
            .into());
        }
    }

    let mut suites = Vec::new();
    for name in config.effective_suites() {
        suites.push(find_suite(&name)?);
    }
    if let Some(path) = &config.case_file {
        suites.push(
            load_suite_file(path)
                .with_context(|| format!("Failed to load cases from {}", path.display()))?,
        );
    }

    let context = RunContext {
        role_arn: config.role_arn.clone(),
        bucket_name: config.bucket_name.clone(),
        access_point_alias: config.access_point_alias.clone(),
        partition: config.partition.clone(),
        roles: config.roles.clone(),
    };

    let mut cases = Vec::new();
    for suite in &suites {
        let before = cases.len();
        for case in suite.cases.iter().filter(|c| c.applies_to(config.role_category)) {
            cases.push(
                context
                    .resolve(case)
                    .with_context(|| format!("Invalid case in suite '{}'", suite.name))?,
            );
        }
        debug!(
            "Suite '{}': {} of {} cases selected",
            suite.name,
            cases.len() - before,
            suite.cases.len()
        );
    }

    if cases.is_empty() {
        let hint = match config.role_category {
            Some(category) => format!("no case applies to role category '{}'", category),
            None => "category-tagged cases need --role-category".to_string(),
        };
        return Err(ProbeError::validation_field(
            format!("No probe cases selected: {}", hint),
            "role_category",
        )
        .into());
    }
    Ok(cases)
}

/// Load the caller's AWS configuration with the run's overrides
pub async fn load_sdk_config(config: &RunConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint.clone());
    }
    loader.load().await
}

/// Run every selected case against AWS and return the ledger
pub async fn run_probes(config: &RunConfig) -> Result<ResultLedger> {
    let cases = select_cases(config)?;
    let sdk_config = load_sdk_config(config).await;
    execute(config, &sdk_config, &cases).await
}

/// Like [`run_probes`], with an already-loaded SDK configuration
pub async fn run_probes_with_sdk_config(
    config: &RunConfig,
    sdk_config: &SdkConfig,
) -> Result<ResultLedger> {
    let cases = select_cases(config)?;
    execute(config, sdk_config, &cases).await
}

async fn execute(
    config: &RunConfig,
    sdk_config: &SdkConfig,
    cases: &[ResolvedCase],
) -> Result<ResultLedger> {
    info!(
        "Running {} probe(s) for {} against bucket {}",
        cases.len(),
        config.role_arn,
        config.bucket_name
    );

    let mut executor = AwsProbeExecutor::new(
        sdk_config,
        &ExecutorOptions {
            session_name: config.session_name.clone(),
            force_path_style: config.force_path_style,
            probe_timeout: config.probe_timeout,
        },
    );
    let mut ledger = ResultLedger::new(&config.role_arn, &config.bucket_name);

    // Best effort: live-only runs still report the policy as context.
    let needs_policy = cases.iter().any(|c| c.request.uses_resource_policy());
    let policy = executor.load_resource_policy(&config.bucket_name).await;
    if let ResourcePolicy::Unavailable(reason) = policy {
        if needs_policy {
            warn!("Bucket policy for {} is unavailable: {}", config.bucket_name, reason);
        } else {
            info!("Bucket policy for {} is unavailable: {}", config.bucket_name, reason);
        }
    }
    ledger.set_resource_policy(policy.clone());

    run_cases(&mut executor, cases, &mut ledger).await;

    let summary = ledger.summary();
    info!(
        "Run finished: {}/{} passed, {} failed, {} inconclusive ({} role(s) assumed)",
        summary.passed,
        summary.total,
        summary.failed,
        summary.inconclusive,
        executor.assumed_roles()
    );
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ProbeRequest, RoleCategory, Target};
    use std::io::Write;

    fn config() -> RunConfig {
        RunConfig::new("arn:aws:iam::123456789012:role/bucket-policy", "example-bucket")
    }

    #[test]
    fn test_select_default_bucket_suite() {
        let cases = select_cases(&config()).unwrap();
        assert_eq!(cases.len(), 7);
        assert!(cases
            .iter()
            .all(|c| c.principal == "arn:aws:iam::123456789012:role/bucket-policy"));
        assert_eq!(cases[0].name, "List top level bucket contents should fail");
    }

    #[test]
    fn test_select_by_category() {
        let mut config = config();
        config.role_category = Some(RoleCategory::Control);
        let cases = select_cases(&config).unwrap();

        let actions: Vec<_> = cases
            .iter()
            .map(|c| match &c.request {
                ProbeRequest::Simulate(sim) => (sim.action.as_str(), c.expected.is_allowed()),
                other => panic!("unexpected request {:?}", other),
            })
            .collect();
        assert_eq!(
            actions,
            vec![
                ("s3:ListBucket", true),
                ("s3:GetObject", false),
                ("s3:PutObject", false),
                ("s3:DeleteObject", false),
            ]
        );
    }

    #[test]
    fn test_tagged_suite_without_category_is_rejected() {
        let mut config = config();
        config.suites = vec!["role-simulation".to_string()];
        let err = select_cases(&config).unwrap_err();
        assert!(err.to_string().contains("--role-category"));
    }

    #[test]
    fn test_access_point_suite_requires_alias() {
        let mut config = config();
        config.suites = vec!["access-point".to_string()];
        assert!(select_cases(&config).is_err());

        config.access_point_alias = Some("ap-alias-s3alias".to_string());
        let cases = select_cases(&config).unwrap();
        assert!(cases.iter().any(|c| matches!(
            &c.request,
            ProbeRequest::GetObject { target: Target::AccessPoint, bucket, .. }
                if bucket == "ap-alias-s3alias"
        )));
    }

    #[test]
    fn test_multi_role_suite_needs_named_role() {
        let mut config = config();
        config.suites = vec!["multi-role".to_string()];
        let err = select_cases(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("Role:BarConsumer"));

        config.roles.insert(
            "BarConsumer".to_string(),
            "arn:aws:iam::123456789012:role/dp-bar-consumer-rp".to_string(),
        );
        let cases = select_cases(&config).unwrap();
        assert_eq!(cases.len(), 8);
        let principals: Vec<_> = cases.iter().map(|c| c.principal.as_str()).collect();
        assert_eq!(
            principals[..5],
            [
                "arn:aws:iam::123456789012:role/bucket-policy",
                "arn:aws:iam::123456789012:role/bucket-policy",
                "arn:aws:iam::123456789012:role/bucket-policy",
                "arn:aws:iam::123456789012:role/bucket-policy",
                "arn:aws:iam::123456789012:role/dp-bar-consumer-rp",
            ]
        );
    }

    #[test]
    fn test_named_role_with_empty_arn_is_rejected() {
        let mut config = config();
        config.roles.insert("BarConsumer".to_string(), " ".to_string());
        let err = select_cases(&config).unwrap_err();
        assert!(err.to_string().contains("BarConsumer"));
    }

    #[test]
    fn test_empty_identifiers_are_rejected() {
        let mut config = config();
        config.role_arn = String::new();
        assert!(select_cases(&config).is_err());

        let mut config = self::config();
        config.bucket_name = " ".to_string();
        assert!(select_cases(&config).is_err());
    }

    #[test]
    fn test_unknown_suite_is_rejected() {
        let mut config = config();
        config.suites = vec!["missing".to_string()];
        let err = select_cases(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown probe suite 'missing'"));
    }

    #[test]
    fn test_case_file_runs_after_named_suites() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "custom",
                "cases": [{{
                    "name": "Put foo/new.txt is denied",
                    "action": {{ "operation": "put-object", "key": "foo/new.txt" }},
                    "expected": "access-denied"
                }}]
            }}"#
        )
        .unwrap();

        let mut config = config();
        config.suites = vec!["read-only".to_string()];
        config.case_file = Some(file.path().to_path_buf());
        let cases = select_cases(&config).unwrap();

        assert_eq!(cases.len(), 5);
        assert_eq!(cases[4].name, "Put foo/new.txt is denied");
    }
}
