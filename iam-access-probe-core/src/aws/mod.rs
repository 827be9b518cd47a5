//! AWS SDK integration: STS role assumption, per-role S3 clients, S3 data-plane
//! probes and IAM policy simulation.

/// per-role credentialed S3 clients
pub mod client_cache;

/// iam policy simulation
pub mod iam;

/// s3 data-plane calls
pub mod s3;

/// sts calls
pub mod sts;

use thiserror::Error;

#[derive(Error, Debug)]
/// AWS Errors from AWS SDK calls
pub enum AwsError {
    #[error("Failed to assume role '{role_arn}': {message}")]
    /// errors from STS AssumeRole, fatal for every probe run as that role
    AssumeRoleError {
        /// role that could not be assumed
        role_arn: String,
        /// rendered SDK error
        message: String,
    },
    #[error("AWS SDK error: {0}")]
    /// errors from SDK output
    SdkError(String),
}

/// Type of AWS Result extending Result
pub type AwsResult<T> = Result<T, AwsError>;
