//! S3 data-plane probes and the bucket-policy diagnostic fetch.
//!
//! Every probe returns an [`Observation`] rather than a `Result`: an error from
//! S3 is the thing being measured, not a failure of the harness.

use std::fmt::Debug;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use log::{debug, warn};

use crate::outcome::{DenialKind, Observation, ResourcePolicy};

/// The only S3 error code accepted as a denial signal
pub const ACCESS_DENIED_CODE: &str = "AccessDenied";

/// Error code S3 returns when a bucket has no policy attached
pub const NO_SUCH_BUCKET_POLICY_CODE: &str = "NoSuchBucketPolicy";

/// Classify a provider error by its reason code.
///
/// Only `AccessDenied` is a denial. Anything else, including errors that carry
/// no code at all, is an unexpected error and must not satisfy a denial
/// expectation.
pub fn classify_error_code(code: Option<&str>, message: impl Into<String>) -> Observation {
    match code {
        Some(ACCESS_DENIED_CODE) => Observation::Denied {
            kind: DenialKind::AccessDenied,
        },
        other => Observation::Error {
            code: other.map(str::to_string),
            message: message.into(),
        },
    }
}

fn classify_sdk_error<E, R>(err: &SdkError<E, R>) -> Observation
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    let code = err.as_service_error().and_then(ProvideErrorMetadata::code);
    classify_error_code(code, DisplayErrorContext(err).to_string())
}

/// ListObjectsV2 on `bucket` (bucket name or access point alias)
pub async fn list_objects(client: &S3Client, bucket: &str, prefix: Option<&str>) -> Observation {
    let result = client
        .list_objects_v2()
        .bucket(bucket)
        .set_prefix(prefix.map(str::to_string))
        .send()
        .await;

    match result {
        Ok(out) => {
            debug!(
                "Listed {} keys in {} (prefix {:?})",
                out.key_count().unwrap_or_default(),
                bucket,
                prefix
            );
            Observation::Allowed
        }
        Err(e) => classify_sdk_error(&e),
    }
}

/// GetObject, reading the body to the end so the output is proven retrievable
pub async fn get_object(client: &S3Client, bucket: &str, key: &str) -> Observation {
    let out = match client.get_object().bucket(bucket).key(key).send().await {
        Ok(out) => out,
        Err(e) => return classify_sdk_error(&e),
    };

    match out.body.collect().await {
        Ok(data) => {
            debug!("Read {} bytes from {}/{}", data.into_bytes().len(), bucket, key);
            Observation::Allowed
        }
        Err(e) => Observation::Error {
            code: None,
            message: format!("GetObject succeeded but the body could not be read: {}", e),
        },
    }
}

/// PutObject with a small text body
pub async fn put_object(client: &S3Client, bucket: &str, key: &str, body: &str) -> Observation {
    let result = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body.as_bytes().to_vec()))
        .send()
        .await;

    match result {
        Ok(_) => Observation::Allowed,
        Err(e) => classify_sdk_error(&e),
    }
}

/// Fetch the bucket policy for diagnostics.
///
/// A missing policy is a normal state. Any other failure is reported as
/// unavailable so simulations that need the document can refuse to guess.
pub async fn fetch_bucket_policy(client: &S3Client, bucket: &str) -> ResourcePolicy {
    match client.get_bucket_policy().bucket(bucket).send().await {
        Ok(out) => match out.policy() {
            Some(policy) if !policy.is_empty() => ResourcePolicy::Attached(policy.to_string()),
            _ => ResourcePolicy::Absent,
        },
        Err(e) => {
            let code = e.as_service_error().and_then(ProvideErrorMetadata::code);
            if code == Some(NO_SUCH_BUCKET_POLICY_CODE) {
                debug!("No bucket policy found for {}", bucket);
                ResourcePolicy::Absent
            } else {
                let message = DisplayErrorContext(&e).to_string();
                warn!("Error fetching bucket policy for {}: {}", bucket, message);
                ResourcePolicy::Unavailable(message)
            }
        }
    }
}
