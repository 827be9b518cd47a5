use std::collections::HashMap;

use aws_config::SdkConfig;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sts::Client as StsClient;
use log::{debug, info};

use crate::aws::{sts::assume_role, AwsResult};

/// Default STS session name for assumed probe roles
pub const DEFAULT_SESSION_NAME: &str = "s3_access_test";

/// Builds S3 clients bound to assumed-role credentials and keeps one per role.
///
/// The cache is owned by a single probe run. A miss performs exactly one STS
/// `AssumeRole` call; failures are returned to the caller and not remembered,
/// so a later probe for the same role tries again.
pub struct RoleClientCache {
    base_config: SdkConfig,
    sts_client: StsClient,
    session_name: String,
    force_path_style: bool,
    clients: HashMap<String, S3Client>,
}

impl RoleClientCache {
    /// New cache using `base_config` (the caller's identity) for STS
    pub fn new(
        base_config: &SdkConfig,
        session_name: impl Into<String>,
        force_path_style: bool,
    ) -> Self {
        Self {
            base_config: base_config.clone(),
            sts_client: StsClient::new(base_config),
            session_name: session_name.into(),
            force_path_style,
            clients: HashMap::new(),
        }
    }

    /// Return the client for `role_arn`, assuming the role on first use.
    pub async fn client_for(&mut self, role_arn: &str) -> AwsResult<S3Client> {
        if let Some(client) = self.clients.get(role_arn) {
            debug!("Reusing S3 client for {}", role_arn);
            return Ok(client.clone());
        }

        info!("Assuming role {} (session '{}')", role_arn, self.session_name);
        let credentials = assume_role(&self.sts_client, role_arn, &self.session_name).await?;

        let s3_config = aws_sdk_s3::config::Builder::from(&self.base_config)
            .credentials_provider(credentials)
            .force_path_style(self.force_path_style)
            .build();
        let client = S3Client::from_conf(s3_config);

        self.clients.insert(role_arn.to_string(), client.clone());
        Ok(client)
    }

    /// Number of roles with a cached client
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True when no role has been assumed yet
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
