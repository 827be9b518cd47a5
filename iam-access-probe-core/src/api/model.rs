//! Configuration and summary types exposed by the public API.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::aws::client_cache::DEFAULT_SESSION_NAME;
use crate::case::RoleCategory;

/// Suite run when a category is selected and no suite is named
pub const DEFAULT_ROLE_SUITE: &str = "role-simulation";
/// Suite run when neither a category nor a suite is named
pub const DEFAULT_BUCKET_SUITE: &str = "bucket-policy";
/// Partition used when none is configured
pub const DEFAULT_PARTITION: &str = "aws";

/// Everything one probe run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Role under test
    pub role_arn: String,
    /// Further roles by name, referenced from cases as `${Role:NAME}`
    pub roles: BTreeMap<String, String>,
    /// Bucket under test
    pub bucket_name: String,
    /// Access point alias for access-point cases
    pub access_point_alias: Option<String>,
    /// Restrict category-tagged cases to this category
    pub role_category: Option<RoleCategory>,
    /// Embedded suites to run, in order
    pub suites: Vec<String>,
    /// Custom suite file, run after the embedded suites
    pub case_file: Option<PathBuf>,
    /// Upper bound per probe
    pub probe_timeout: Option<Duration>,
    /// Region override
    pub region: Option<String>,
    /// Endpoint override for every AWS client (local stacks, tests)
    pub endpoint_url: Option<String>,
    /// Path-style S3 addressing
    pub force_path_style: bool,
    /// STS role session name
    pub session_name: String,
    /// Value for `${Partition}`
    pub partition: String,
}

impl RunConfig {
    /// Config with defaults for everything but the role and bucket
    pub fn new(role_arn: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            roles: BTreeMap::new(),
            bucket_name: bucket_name.into(),
            access_point_alias: None,
            role_category: None,
            suites: Vec::new(),
            case_file: None,
            probe_timeout: None,
            region: None,
            endpoint_url: None,
            force_path_style: false,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            partition: DEFAULT_PARTITION.to_string(),
        }
    }

    /// Suites to run when none are named explicitly
    pub(crate) fn effective_suites(&self) -> Vec<String> {
        if !self.suites.is_empty() || self.case_file.is_some() {
            return self.suites.clone();
        }
        let default = if self.role_category.is_some() {
            DEFAULT_ROLE_SUITE
        } else {
            DEFAULT_BUCKET_SUITE
        };
        vec![default.to_string()]
    }
}

/// One line of `list-suites`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteInfo {
    /// Suite name
    pub name: String,
    /// Suite description
    pub description: String,
    /// Number of cases
    pub case_count: usize,
    /// Whether any case targets an access point
    pub needs_access_point: bool,
    /// Names of the `${Role:NAME}` roles the suite refers to
    pub named_roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suite_selection() {
        let mut config = RunConfig::new("arn:aws:iam::123456789012:role/r", "b");
        assert_eq!(config.effective_suites(), vec![DEFAULT_BUCKET_SUITE]);

        config.role_category = Some(RoleCategory::Output);
        assert_eq!(config.effective_suites(), vec![DEFAULT_ROLE_SUITE]);

        config.case_file = Some(PathBuf::from("custom.json"));
        assert!(config.effective_suites().is_empty());

        config.suites = vec!["read-only".to_string()];
        assert_eq!(config.effective_suites(), vec!["read-only"]);
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = RunConfig::new("arn:aws:iam::123456789012:role/r", "b");
        assert_eq!(config.session_name, "s3_access_test");
        assert_eq!(config.partition, "aws");
        assert!(!config.force_path_style);
        assert!(config.probe_timeout.is_none());
    }
}
