//! Probe suites embedded in the binary, plus loading of custom suite files.
//!
//! Suites are plain JSON under `resources/suites`, parsed once and cached.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::debug;
use rust_embed::RustEmbed;

use crate::case::ProbeSuite;
use crate::errors::{ProbeError, Result};

/// Embedded probe suites
#[derive(RustEmbed)]
#[folder = "resources/suites"]
#[include = "*.json"]
struct EmbeddedSuites;

/// Static cache for the parsed suites
static SUITE_CACHE: OnceLock<Arc<Vec<ProbeSuite>>> = OnceLock::new();

/// Load and cache every embedded suite, sorted by name.
///
/// # Errors
/// Returns `ProbeError::JsonParsing` if an embedded file is not a valid suite.
pub fn embedded_suites() -> Result<Arc<Vec<ProbeSuite>>> {
    if let Some(suites) = SUITE_CACHE.get() {
        return Ok(suites.clone());
    }

    let mut suites = Vec::new();
    for file in EmbeddedSuites::iter() {
        let Some(embedded) = EmbeddedSuites::get(&file) else {
            continue;
        };
        let suite: ProbeSuite = serde_json::from_slice(&embedded.data)
            .map_err(|e| ProbeError::json_parsing(format!("embedded suite file '{}'", file), e))?;
        debug!("Loaded embedded suite '{}' ({} cases)", suite.name, suite.cases.len());
        suites.push(suite);
    }
    suites.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(SUITE_CACHE.get_or_init(|| Arc::new(suites)).clone())
}

/// Look up one embedded suite by name
pub fn find_suite(name: &str) -> Result<ProbeSuite> {
    let suites = embedded_suites()?;
    suites.iter().find(|s| s.name == name).cloned().ok_or_else(|| {
        let available = suites.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        ProbeError::suite_not_found(name, &available)
    })
}

/// Read a custom suite from a JSON file
pub fn load_suite_file(path: &Path) -> Result<ProbeSuite> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ProbeError::file_system("read", path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| ProbeError::json_parsing(format!("suite file '{}'", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ProbeAction, RoleCategory, Target};
    use crate::outcome::{DenialKind, ExpectedOutcome};
    use std::io::Write;

    fn case<'a>(suite: &'a ProbeSuite, name: &str) -> &'a crate::case::ProbeCase {
        suite
            .cases
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("suite '{}' has no case '{}'", suite.name, name))
    }

    #[test]
    fn test_embedded_suites_load_and_cache() {
        let suites = embedded_suites().unwrap();
        let names: Vec<_> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "access-point",
                "bucket-policy",
                "multi-role",
                "prefix-simulation",
                "read-only",
                "resource-policy-simulation",
                "role-simulation",
            ]
        );
        for suite in suites.iter() {
            assert!(!suite.cases.is_empty(), "suite {} is empty", suite.name);
            assert!(!suite.description.is_empty(), "suite {} has no description", suite.name);
        }

        let again = embedded_suites().unwrap();
        assert!(Arc::ptr_eq(&suites, &again));
    }

    #[test]
    fn test_unknown_suite_lists_available_names() {
        let err = find_suite("nope").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("bucket-policy"));
    }

    #[test]
    fn test_bucket_policy_suite_prefix_semantics() {
        let suite = find_suite("bucket-policy").unwrap();
        let denied = ExpectedOutcome::Denied(Some(DenialKind::AccessDenied));

        for (name, prefix) in [
            ("List top level bucket contents should fail", None),
            ("List bar/ should fail", Some("bar/")),
            ("List with parent path fo should fail", Some("fo")),
            ("List with similar path foobar/ should fail", Some("foobar/")),
        ] {
            let c = case(&suite, name);
            assert_eq!(c.expected, denied, "{}", name);
            assert_eq!(
                c.action,
                ProbeAction::ListObjects {
                    target: Target::Bucket,
                    prefix: prefix.map(str::to_string)
                }
            );
        }
        assert!(case(&suite, "Listing foo/ should succeed").expected.is_allowed());
        assert!(case(&suite, "Get foo/test.txt should succeed").expected.is_allowed());
    }

    #[test]
    fn test_access_point_suite_covers_both_layers() {
        let suite = find_suite("access-point").unwrap();
        let direct = case(&suite, "Get foo/test.txt directly from bucket should fail");
        let via_ap = case(&suite, "Get foo/test.txt via access point should succeed");

        assert!(matches!(
            direct.action,
            ProbeAction::GetObject { target: Target::Bucket, ref key } if key == "foo/test.txt"
        ));
        assert!(!direct.expected.is_allowed());
        assert!(matches!(
            via_ap.action,
            ProbeAction::GetObject { target: Target::AccessPoint, ref key } if key == "foo/test.txt"
        ));
        assert!(via_ap.expected.is_allowed());
    }

    #[test]
    fn test_multi_role_suite_splits_by_principal() {
        let suite = find_suite("multi-role").unwrap();
        let bar = Some("${Role:BarConsumer}".to_string());
        let (run_role, bar_consumer): (Vec<_>, Vec<_>) =
            suite.cases.iter().partition(|c| c.principal.is_none());
        assert_eq!(run_role.len(), 4);
        assert_eq!(bar_consumer.len(), 4);
        assert!(bar_consumer.iter().all(|c| c.principal == bar));

        let get_bar = case(&suite, "BarConsumer - Get object from bar/");
        assert!(get_bar.expected.is_allowed());
        let get_foo = case(&suite, "BarConsumer - Get object from foo/");
        assert_eq!(get_foo.expected, ExpectedOutcome::Denied(Some(DenialKind::AccessDenied)));
    }

    #[test]
    fn test_role_simulation_input_scenario() {
        let suite = find_suite("role-simulation").unwrap();
        let input: Vec<_> = suite
            .cases
            .iter()
            .filter(|c| c.applies_to(Some(RoleCategory::Input)))
            .map(|c| match &c.action {
                ProbeAction::Simulate { action, resource, .. } => {
                    (action.as_str(), resource.as_str(), c.expected)
                }
                other => panic!("unexpected action {:?}", other),
            })
            .collect();

        let implicit = ExpectedOutcome::Denied(Some(DenialKind::ImplicitDeny));
        assert_eq!(
            input,
            vec![
                ("s3:GetObject", "arn:${Partition}:s3:::${BucketName}/example.txt", ExpectedOutcome::Allowed),
                ("s3:ListBucket", "arn:${Partition}:s3:::${BucketName}", ExpectedOutcome::Allowed),
                ("s3:PutObject", "arn:${Partition}:s3:::${BucketName}/example.txt", implicit),
                ("s3:DeleteObject", "arn:${Partition}:s3:::${BucketName}/example.txt", implicit),
            ]
        );
        assert!(suite.cases.iter().all(|c| !c.applies_to(None)));
    }

    #[test]
    fn test_load_suite_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "custom",
                "cases": [{{
                    "name": "Put is denied",
                    "action": {{ "operation": "put-object", "key": "foo/test.txt" }},
                    "expected": "access-denied"
                }}]
            }}"#
        )
        .unwrap();

        let suite = load_suite_file(file.path()).unwrap();
        assert_eq!(suite.name, "custom");
        assert_eq!(suite.description, "");
        assert_eq!(suite.cases.len(), 1);
    }

    #[test]
    fn test_load_suite_file_errors() {
        let err = load_suite_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ProbeError::FileSystem { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "name": "broken", "cases": [{{ "name": "x" }}] }}"#).unwrap();
        let err = load_suite_file(file.path()).unwrap_err();
        assert!(matches!(err, ProbeError::JsonParsing { .. }));
    }
}
