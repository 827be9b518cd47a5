use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::Client as IamClient;
use aws_sdk_s3::Client as S3Client;
use log::info;

use crate::aws::client_cache::{RoleClientCache, DEFAULT_SESSION_NAME};
use crate::aws::{iam, s3};
use crate::case::{ProbeRequest, ResolvedCase, SimulationRequest};
use crate::executor::ProbeExecutor;
use crate::outcome::{Observation, ResourcePolicy};

/// Tunables for [`AwsProbeExecutor`]
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// STS role session name
    pub session_name: String,
    /// Use path-style S3 addressing
    pub force_path_style: bool,
    /// Upper bound for a single probe, including role assumption
    pub probe_timeout: Option<Duration>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            session_name: DEFAULT_SESSION_NAME.to_string(),
            force_path_style: false,
            probe_timeout: None,
        }
    }
}

/// Executes probes against real AWS endpoints.
///
/// Live probes run as the case principal through a per-role client cache.
/// Simulations and the bucket-policy fetch run as the caller.
pub struct AwsProbeExecutor {
    role_clients: RoleClientCache,
    caller_s3: S3Client,
    iam_client: IamClient,
    resource_policy: ResourcePolicy,
    probe_timeout: Option<Duration>,
}

impl AwsProbeExecutor {
    /// Build the executor from the caller's SDK configuration
    pub fn new(config: &SdkConfig, options: &ExecutorOptions) -> Self {
        let caller_s3 = S3Client::from_conf(
            aws_sdk_s3::config::Builder::from(config)
                .force_path_style(options.force_path_style)
                .build(),
        );

        Self {
            role_clients: RoleClientCache::new(
                config,
                &options.session_name,
                options.force_path_style,
            ),
            caller_s3,
            iam_client: IamClient::new(config),
            resource_policy: ResourcePolicy::NotFetched,
            probe_timeout: options.probe_timeout,
        }
    }

    /// Fetch the bucket policy once for this run.
    ///
    /// Simulations that include the resource policy use this document.
    pub async fn load_resource_policy(&mut self, bucket: &str) -> &ResourcePolicy {
        if matches!(self.resource_policy, ResourcePolicy::NotFetched) {
            self.resource_policy = s3::fetch_bucket_policy(&self.caller_s3, bucket).await;
        }
        &self.resource_policy
    }

    /// Bucket policy state
    pub const fn resource_policy(&self) -> &ResourcePolicy {
        &self.resource_policy
    }

    /// Number of roles assumed so far
    pub fn assumed_roles(&self) -> usize {
        self.role_clients.len()
    }

    async fn client_for(&mut self, principal: &str) -> Result<S3Client, Observation> {
        self.role_clients
            .client_for(principal)
            .await
            .map_err(|e| Observation::SetupFailed {
                message: e.to_string(),
            })
    }

    async fn simulate(&self, principal: &str, request: &SimulationRequest) -> Observation {
        let policy = if request.include_resource_policy {
            match &self.resource_policy {
                ResourcePolicy::Attached(doc) => Some(doc.as_str()),
                ResourcePolicy::Absent => None,
                ResourcePolicy::Unavailable(reason) => {
                    return Observation::Inconclusive {
                        reason: format!("bucket policy could not be fetched: {}", reason),
                    }
                }
                ResourcePolicy::NotFetched => {
                    return Observation::Inconclusive {
                        reason: "bucket policy was not fetched for this run".to_string(),
                    }
                }
            }
        } else {
            None
        };

        iam::simulate_principal_policy(&self.iam_client, principal, request, policy).await
    }

    async fn dispatch(&mut self, case: &ResolvedCase) -> Observation {
        match &case.request {
            ProbeRequest::ListObjects { bucket, prefix, .. } => {
                match self.client_for(&case.principal).await {
                    Ok(client) => s3::list_objects(&client, bucket, prefix.as_deref()).await,
                    Err(setup) => setup,
                }
            }
            ProbeRequest::GetObject { bucket, key, .. } => {
                match self.client_for(&case.principal).await {
                    Ok(client) => s3::get_object(&client, bucket, key).await,
                    Err(setup) => setup,
                }
            }
            ProbeRequest::PutObject {
                bucket, key, body, ..
            } => match self.client_for(&case.principal).await {
                Ok(client) => s3::put_object(&client, bucket, key, body).await,
                Err(setup) => setup,
            },
            ProbeRequest::Simulate(simulation) => {
                self.simulate(&case.principal, simulation).await
            }
        }
    }
}

#[async_trait]
impl ProbeExecutor for AwsProbeExecutor {
    async fn execute(&mut self, case: &ResolvedCase) -> Observation {
        match self.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.dispatch(case)).await {
                Ok(observed) => observed,
                Err(_) => {
                    info!("'{}' exceeded the probe timeout of {:?}", case.name, limit);
                    Observation::Inconclusive {
                        reason: format!("probe timed out after {:?}", limit),
                    }
                }
            },
            None => self.dispatch(case).await,
        }
    }
}
