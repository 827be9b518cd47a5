use anyhow::Result;

use crate::api::model::SuiteInfo;
use crate::case::{ProbeAction, ProbeSuite, Target};
use crate::suites::{embedded_suites, find_suite};
use crate::template::named_role_references;

fn targets_access_point(action: &ProbeAction) -> bool {
    match action {
        ProbeAction::ListObjects { target, .. }
        | ProbeAction::GetObject { target, .. }
        | ProbeAction::PutObject { target, .. } => *target == Target::AccessPoint,
        ProbeAction::Simulate { resource, .. } => resource.contains("${AccessPointAlias}"),
    }
}

fn named_roles(suite: &ProbeSuite) -> Vec<String> {
    let mut roles = Vec::new();
    for case in &suite.cases {
        let mut fields = vec![case.principal.as_deref().unwrap_or_default()];
        if let ProbeAction::Simulate { resource, .. } = &case.action {
            fields.push(resource.as_str());
        }
        for role in fields.into_iter().flat_map(named_role_references) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
    }
    roles
}

/// Summaries of every embedded suite, sorted by name
pub fn list_suites() -> Result<Vec<SuiteInfo>> {
    Ok(embedded_suites()?
        .iter()
        .map(|suite| SuiteInfo {
            name: suite.name.clone(),
            description: suite.description.clone(),
            case_count: suite.cases.len(),
            needs_access_point: suite.cases.iter().any(|c| targets_access_point(&c.action)),
            named_roles: named_roles(suite),
        })
        .collect())
}

/// One embedded suite as declared
pub fn show_suite(name: &str) -> Result<ProbeSuite> {
    Ok(find_suite(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_suites() {
        let suites = list_suites().unwrap();
        let access_point = suites.iter().find(|s| s.name == "access-point").unwrap();
        assert!(access_point.needs_access_point);
        assert_eq!(access_point.case_count, 7);

        let read_only = suites.iter().find(|s| s.name == "read-only").unwrap();
        assert!(!read_only.needs_access_point);
        assert_eq!(read_only.case_count, 4);
        assert!(read_only.named_roles.is_empty());

        let multi_role = suites.iter().find(|s| s.name == "multi-role").unwrap();
        assert_eq!(multi_role.case_count, 8);
        assert_eq!(multi_role.named_roles, vec!["BarConsumer"]);
    }

    #[test]
    fn test_show_suite() {
        assert_eq!(show_suite("role-simulation").unwrap().cases.len(), 11);
        assert!(show_suite("unknown").is_err());
    }
}
