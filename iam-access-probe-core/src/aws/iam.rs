use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::{ContextEntry, ContextKeyTypeEnum, PolicyEvaluationDecisionType};
use aws_sdk_iam::Client as IamClient;
use log::{debug, warn};

use crate::case::{ContextValue, SimulationRequest};
use crate::outcome::{DenialKind, Observation};

/// Map an IAM evaluation decision to an observation.
///
/// Decision values this crate does not know are inconclusive.
pub fn classify_decision(decision: &PolicyEvaluationDecisionType) -> Observation {
    match decision {
        PolicyEvaluationDecisionType::Allowed => Observation::Allowed,
        PolicyEvaluationDecisionType::ExplicitDeny => Observation::Denied {
            kind: DenialKind::ExplicitDeny,
        },
        PolicyEvaluationDecisionType::ImplicitDeny => Observation::Denied {
            kind: DenialKind::ImplicitDeny,
        },
        other => Observation::Inconclusive {
            reason: format!("unrecognised evaluation decision '{}'", other.as_str()),
        },
    }
}

fn context_entry(value: &ContextValue) -> ContextEntry {
    ContextEntry::builder()
        .context_key_name(&value.key)
        .context_key_type(ContextKeyTypeEnum::from(value.value_type.as_str()))
        .set_context_key_values(Some(value.values.clone()))
        .build()
}

/// Run `SimulatePrincipalPolicy` for a single (principal, action, resource).
///
/// The simulation call failing is reported as inconclusive, never as an
/// implicit deny: the two mean different things to whoever reads the report.
pub async fn simulate_principal_policy(
    client: &IamClient,
    principal: &str,
    request: &SimulationRequest,
    resource_policy: Option<&str>,
) -> Observation {
    let context_entries = if request.context.is_empty() {
        None
    } else {
        Some(request.context.iter().map(context_entry).collect::<Vec<_>>())
    };

    let result = client
        .simulate_principal_policy()
        .policy_source_arn(principal)
        .action_names(&request.action)
        .resource_arns(&request.resource)
        .set_resource_policy(resource_policy.map(str::to_string))
        .set_context_entries(context_entries)
        .send()
        .await;

    let out = match result {
        Ok(out) => out,
        Err(e) => {
            let message = DisplayErrorContext(&e).to_string();
            warn!("Error simulating policy for {}: {}", principal, message);
            return Observation::Inconclusive {
                reason: format!("policy simulation call failed: {}", message),
            };
        }
    };

    match out.evaluation_results() {
        [single] => {
            debug!(
                "Simulated {} on {} as {}: {}",
                single.eval_action_name(),
                request.resource,
                principal,
                single.eval_decision().as_str()
            );
            classify_decision(single.eval_decision())
        }
        [] => Observation::Inconclusive {
            reason: "policy simulation returned no evaluation results".to_string(),
        },
        many => Observation::Inconclusive {
            reason: format!(
                "policy simulation returned {} evaluation results, expected one",
                many.len()
            ),
        },
    }
}
