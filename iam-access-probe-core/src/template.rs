//! Run-scoped values and the `${Name}` placeholders that refer to them.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::case::{
    iam_action_name, ProbeAction, ProbeCase, ProbeRequest, ResolvedCase, SimulationRequest, Target,
};
use crate::errors::{ProbeError, Result};

/// Placeholder for the run's role ARN
pub const ROLE_ARN: &str = "RoleArn";
/// Placeholder for the run's bucket name
pub const BUCKET_NAME: &str = "BucketName";
/// Placeholder for the run's access point alias
pub const ACCESS_POINT_ALIAS: &str = "AccessPointAlias";
/// Placeholder for the AWS partition
pub const PARTITION: &str = "Partition";
/// Prefix of `${Role:NAME}`, a role registered for the run under `NAME`
pub const NAMED_ROLE_PREFIX: &str = "Role:";

/// Matches `${Name}` and `${Role:NAME}`
pub(crate) fn get_placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z][A-Za-z0-9]*(?::[A-Za-z0-9_.-]+)?)\}")
            .expect("Invalid placeholder regex")
    })
}

/// Names of the `${Role:NAME}` placeholders used in `template`, in order of appearance
pub fn named_role_references(template: &str) -> Vec<String> {
    get_placeholder_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .filter_map(|name| name.as_str().strip_prefix(NAMED_ROLE_PREFIX))
        .map(str::to_string)
        .collect()
}

/// Identifiers a probe table is resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Role under test; principal for cases that do not name one
    pub role_arn: String,
    /// Bucket under test
    pub bucket_name: String,
    /// Access point alias, required by access-point cases
    pub access_point_alias: Option<String>,
    /// AWS partition, usually `aws`
    pub partition: String,
    /// Additional roles by name, for `${Role:NAME}`
    pub roles: BTreeMap<String, String>,
}

impl RunContext {
    fn lookup(&self, case: &str, name: &str) -> Result<&str> {
        match name {
            ROLE_ARN => Ok(&self.role_arn),
            BUCKET_NAME => Ok(&self.bucket_name),
            PARTITION => Ok(&self.partition),
            ACCESS_POINT_ALIAS => self.access_point_alias.as_deref().ok_or_else(|| {
                ProbeError::placeholder(case, name, "no access point alias was configured")
            }),
            other => match other.strip_prefix(NAMED_ROLE_PREFIX) {
                Some(role) => self.roles.get(role).map(String::as_str).ok_or_else(|| {
                    ProbeError::placeholder(
                        case,
                        other,
                        format!("no role named '{}' was configured (--role {}=ARN)", role, role),
                    )
                }),
                None => Err(ProbeError::placeholder(
                    case,
                    other,
                    "unknown placeholder (supported: RoleArn, BucketName, AccessPointAlias, \
                     Partition, Role:NAME)",
                )),
            },
        }
    }

    /// Replace every `${Name}` in `template`.
    pub fn substitute(&self, case: &str, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in get_placeholder_regex().captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            out.push_str(self.lookup(case, name.as_str())?);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    fn bucket_for(&self, case: &str, target: Target) -> Result<String> {
        match target {
            Target::Bucket => Ok(self.bucket_name.clone()),
            Target::AccessPoint => self.lookup(case, ACCESS_POINT_ALIAS).map(str::to_string),
        }
    }

    /// Resolve a case into a concrete request for this run.
    ///
    /// Fails before any remote call when a placeholder or access point alias
    /// cannot be resolved, or when the resolved principal is empty.
    pub fn resolve(&self, case: &ProbeCase) -> Result<ResolvedCase> {
        let name = case.name.as_str();
        let principal = match &case.principal {
            Some(template) => self.substitute(name, template)?,
            None => self.role_arn.clone(),
        };
        if principal.trim().is_empty() {
            return Err(ProbeError::validation_field(
                format!("case '{}' has an empty principal", name),
                "principal",
            ));
        }

        let request = match &case.action {
            ProbeAction::ListObjects { target, prefix } => ProbeRequest::ListObjects {
                target: *target,
                bucket: self.bucket_for(name, *target)?,
                prefix: prefix.clone(),
            },
            ProbeAction::GetObject { target, key } => ProbeRequest::GetObject {
                target: *target,
                bucket: self.bucket_for(name, *target)?,
                key: key.clone(),
            },
            ProbeAction::PutObject { target, key, body } => ProbeRequest::PutObject {
                target: *target,
                bucket: self.bucket_for(name, *target)?,
                key: key.clone(),
                body: body.clone(),
            },
            ProbeAction::Simulate {
                action,
                resource,
                include_resource_policy,
                context,
            } => ProbeRequest::Simulate(SimulationRequest {
                action: iam_action_name(action).to_string(),
                resource: self.substitute(name, resource)?,
                include_resource_policy: *include_resource_policy,
                context: context.clone(),
            }),
        };

        Ok(ResolvedCase {
            name: case.name.clone(),
            principal,
            request,
            expected: case.expected,
        })
    }
}
