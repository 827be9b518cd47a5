//! Probe tables: cases as pure, serializable data, and their resolved form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ProbeError;
use crate::outcome::ExpectedOutcome;

/// Body written by `put-object` cases that do not specify one
pub const DEFAULT_PUT_BODY: &str = "test";

/// Role category a case applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleCategory {
    /// Consumes data: reads and lists
    Input,
    /// Inspects the bucket without touching object data
    Control,
    /// Produces data: writes
    Output,
}

impl RoleCategory {
    /// kebab-case name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Control => "control",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleCategory {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "control" => Ok(Self::Control),
            "output" => Ok(Self::Output),
            other => Err(ProbeError::validation_field(
                format!("unknown role category '{}' (expected input, control or output)", other),
                "role_category",
            )),
        }
    }
}

/// Which enforcement layer a live probe goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    /// The bucket name, evaluated against the bucket policy
    #[default]
    Bucket,
    /// The access point alias, evaluated against the access point policy
    AccessPoint,
}

/// One IAM condition context entry passed to the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextValue {
    /// Context key, e.g. `aws:SourceIp`
    pub key: String,
    /// Values for the key
    pub values: Vec<String>,
    /// IAM context key type (`string`, `ip`, `boolean`, ...)
    #[serde(default = "default_context_type")]
    pub value_type: String,
}

fn default_context_type() -> String {
    "string".to_string()
}

fn default_put_body() -> String {
    DEFAULT_PUT_BODY.to_string()
}

/// What a case does. A closed set interpreted by a single dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum ProbeAction {
    /// ListObjectsV2, optionally under a prefix
    ListObjects {
        /// bucket or access point
        #[serde(default)]
        target: Target,
        /// key prefix, listed verbatim
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
    /// GetObject
    GetObject {
        /// bucket or access point
        #[serde(default)]
        target: Target,
        /// object key
        key: String,
    },
    /// PutObject
    PutObject {
        /// bucket or access point
        #[serde(default)]
        target: Target,
        /// object key
        key: String,
        /// object body
        #[serde(default = "default_put_body")]
        body: String,
    },
    /// SimulatePrincipalPolicy for one action on one resource
    Simulate {
        /// IAM action (`s3:GetObject`) or abstract name (`read-object`)
        action: String,
        /// resource ARN, may contain placeholders
        resource: String,
        /// pass the bucket policy to the simulator
        #[serde(default)]
        include_resource_policy: bool,
        /// additional condition context
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        context: Vec<ContextValue>,
    },
}

/// Map abstract action names to IAM action names; IAM names pass through.
pub fn iam_action_name(action: &str) -> &str {
    match action {
        "read-object" => "s3:GetObject",
        "write-object" => "s3:PutObject",
        "delete-object" => "s3:DeleteObject",
        "list-bucket" => "s3:ListBucket",
        other => other,
    }
}

/// One row of a probe table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeCase {
    /// Human-readable identifier
    pub name: String,
    /// Role to probe as; the run's role when absent. May contain placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    /// What to do
    pub action: ProbeAction,
    /// What should happen
    pub expected: ExpectedOutcome,
    /// Role categories this case belongs to; empty means every category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_categories: Vec<RoleCategory>,
}

impl ProbeCase {
    /// Whether this case runs for the selected category.
    ///
    /// Untagged cases always run. Tagged cases only run when their category
    /// is selected.
    pub fn applies_to(&self, selected: Option<RoleCategory>) -> bool {
        if self.role_categories.is_empty() {
            return true;
        }
        selected.is_some_and(|category| self.role_categories.contains(&category))
    }
}

/// A named probe table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSuite {
    /// Suite name used on the command line
    pub name: String,
    /// What the suite verifies
    #[serde(default)]
    pub description: String,
    /// Cases, executed in order
    pub cases: Vec<ProbeCase>,
}

/// A simulation request after placeholder resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationRequest {
    /// IAM action name
    pub action: String,
    /// Resource ARN
    pub resource: String,
    /// Whether to pass the bucket policy
    pub include_resource_policy: bool,
    /// Condition context
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextValue>,
}

/// A concrete request against AWS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum ProbeRequest {
    /// ListObjectsV2
    ListObjects {
        /// enforcement layer
        target: Target,
        /// bucket name or access point alias
        bucket: String,
        /// prefix
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
    /// GetObject
    GetObject {
        /// enforcement layer
        target: Target,
        /// bucket name or access point alias
        bucket: String,
        /// key
        key: String,
    },
    /// PutObject
    PutObject {
        /// enforcement layer
        target: Target,
        /// bucket name or access point alias
        bucket: String,
        /// key
        key: String,
        /// body
        #[serde(skip)]
        body: String,
    },
    /// SimulatePrincipalPolicy
    Simulate(SimulationRequest),
}

impl ProbeRequest {
    /// Action column for reports
    pub fn action_label(&self) -> &str {
        match self {
            Self::ListObjects { .. } => "ListObjectsV2",
            Self::GetObject { .. } => "GetObject",
            Self::PutObject { .. } => "PutObject",
            Self::Simulate(sim) => &sim.action,
        }
    }

    /// Resource column for reports
    pub fn resource_label(&self) -> String {
        let via = |target: &Target| match target {
            Target::Bucket => "",
            Target::AccessPoint => " (access point)",
        };
        match self {
            Self::ListObjects {
                target,
                bucket,
                prefix,
            } => format!("s3://{}/{}{}", bucket, prefix.as_deref().unwrap_or(""), via(target)),
            Self::GetObject {
                target,
                bucket,
                key,
            }
            | Self::PutObject {
                target,
                bucket,
                key,
                ..
            } => format!("s3://{}/{}{}", bucket, key, via(target)),
            Self::Simulate(sim) => sim.resource.clone(),
        }
    }

    /// Whether this request is a simulation evaluated with the bucket policy
    pub const fn uses_resource_policy(&self) -> bool {
        matches!(
            self,
            Self::Simulate(SimulationRequest {
                include_resource_policy: true,
                ..
            })
        )
    }
}

/// A case with every placeholder and target resolved for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCase {
    /// Case name
    pub name: String,
    /// Role ARN the probe runs as
    pub principal: String,
    /// Concrete request
    pub request: ProbeRequest,
    /// Expected outcome
    pub expected: ExpectedOutcome,
}
