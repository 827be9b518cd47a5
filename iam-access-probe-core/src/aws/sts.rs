use std::time::SystemTime;

use aws_sdk_s3::config::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use log::debug;

use crate::aws::{AwsError, AwsResult};

/// Provider name attached to credentials obtained through `AssumeRole`.
const ASSUMED_ROLE_PROVIDER: &str = "iam-access-probe-assume-role";

/// Assume `role_arn` and return its temporary credentials.
///
/// The returned credentials carry the session expiry reported by STS so the
/// SDK can refuse to sign with them once they lapse.
///
/// # Arguments
///
/// * `client` - STS client authenticated as the caller
/// * `role_arn` - role to assume, must be non-empty
/// * `session_name` - role session name recorded in CloudTrail
pub async fn assume_role(
    client: &StsClient,
    role_arn: &str,
    session_name: &str,
) -> AwsResult<Credentials> {
    if role_arn.trim().is_empty() {
        return Err(AwsError::AssumeRoleError {
            role_arn: role_arn.to_string(),
            message: "role ARN must not be empty".to_string(),
        });
    }

    let out = client
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(|e| AwsError::AssumeRoleError {
            role_arn: role_arn.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    let creds = out.credentials().ok_or_else(|| {
        AwsError::SdkError(format!("AssumeRole response for {} has no Credentials", role_arn))
    })?;

    let expiry = SystemTime::try_from(*creds.expiration()).ok();
    debug!("Assumed role {} (expires {:?})", role_arn, creds.expiration());

    Ok(Credentials::new(
        creds.access_key_id(),
        creds.secret_access_key(),
        Some(creds.session_token().to_string()),
        expiry,
        ASSUMED_ROLE_PROVIDER,
    ))
}
