//! Shared fixtures: an SDK configuration pointed at a wiremock server, and
//! canned STS, IAM and S3 responses.

#![allow(dead_code)]

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use iam_access_probe_core::RunConfig;
use wiremock::matchers::{body_string_contains, method, path, path_regex, PathRegexMatcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/bucket-policy";
pub const BUCKET: &str = "example-bucket";

/// Caller configuration with static credentials and every endpoint on `server`
pub async fn sdk_config(server: &MockServer) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(Credentials::new("AKIDCALLER", "caller-secret", None, None, "test"))
        .region(Region::new("us-east-1"))
        .endpoint_url(server.uri())
        .retry_config(RetryConfig::disabled())
        .load()
        .await
}

/// Bucket-level path-style requests (`GET /bucket/?list-type=2`, `?policy`)
pub fn bucket_root(bucket: &str) -> PathRegexMatcher {
    path_regex(format!("^/{}/?$", bucket))
}

/// Run configuration for `suite` with path-style addressing
pub fn run_config(suite: &str) -> RunConfig {
    let mut config = RunConfig::new(ROLE_ARN, BUCKET);
    config.suites = vec![suite.to_string()];
    config.force_path_style = true;
    config
}

pub fn xml(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("content-type", "text/xml")
        .set_body_string(body)
}

/// S3 REST error document
pub fn s3_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    xml(
        status,
        &format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>{}</Code><Message>{}</Message><RequestId>REQ1</RequestId></Error>",
            code, message
        ),
    )
}

pub fn list_bucket_result(prefix: &str) -> ResponseTemplate {
    xml(
        200,
        &format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Name>{bucket}</Name><Prefix>{prefix}</Prefix><KeyCount>1</KeyCount>\
             <MaxKeys>1000</MaxKeys><IsTruncated>false</IsTruncated>\
             <Contents><Key>{prefix}test.txt</Key><Size>4</Size></Contents>\
             </ListBucketResult>",
            bucket = BUCKET,
            prefix = prefix
        ),
    )
}

/// STS AssumeRole response handing out `access_key_id`
pub fn assume_role_response(access_key_id: &str) -> ResponseTemplate {
    xml(
        200,
        &format!(
            "<AssumeRoleResponse xmlns=\"https://sts.amazonaws.com/doc/2011-06-15/\">\
             <AssumeRoleResult>\
             <Credentials>\
             <AccessKeyId>{}</AccessKeyId>\
             <SecretAccessKey>role-secret</SecretAccessKey>\
             <SessionToken>role-token</SessionToken>\
             <Expiration>2099-01-01T00:00:00Z</Expiration>\
             </Credentials>\
             <AssumedRoleUser>\
             <AssumedRoleId>AROAEXAMPLE:s3_access_test</AssumedRoleId>\
             <Arn>arn:aws:sts::123456789012:assumed-role/example/s3_access_test</Arn>\
             </AssumedRoleUser>\
             </AssumeRoleResult>\
             <ResponseMetadata><RequestId>STS1</RequestId></ResponseMetadata>\
             </AssumeRoleResponse>",
            access_key_id
        ),
    )
}

/// Successful STS AssumeRole for any role
pub async fn mount_assume_role(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("Action=AssumeRole"))
        .respond_with(assume_role_response("ASIAEXAMPLE"))
        .mount(server)
        .await;
}

/// IAM SimulatePrincipalPolicy response with one result per decision
pub fn simulation_result(action: &str, resource: &str, decisions: &[&str]) -> ResponseTemplate {
    let members: String = decisions
        .iter()
        .map(|decision| {
            format!(
                "<member><EvalActionName>{}</EvalActionName>\
                 <EvalResourceName>{}</EvalResourceName>\
                 <EvalDecision>{}</EvalDecision>\
                 <MatchedStatements/><MissingContextValues/></member>",
                action, resource, decision
            )
        })
        .collect();
    xml(
        200,
        &format!(
            "<SimulatePrincipalPolicyResponse xmlns=\"https://iam.amazonaws.com/doc/2010-05-08/\">\
             <SimulatePrincipalPolicyResult>\
             <IsTruncated>false</IsTruncated>\
             <EvaluationResults>{}</EvaluationResults>\
             </SimulatePrincipalPolicyResult>\
             <ResponseMetadata><RequestId>IAM1</RequestId></ResponseMetadata>\
             </SimulatePrincipalPolicyResponse>",
            members
        ),
    )
}

/// Form parameter naming the simulated S3 action, as the SDK encodes it
pub fn action_param(action: &str) -> String {
    format!("ActionNames.member.1=s3%3A{}", action)
}

/// Mount a simulation answer for requests that simulate `s3:{action}`
pub async fn mount_simulation(server: &MockServer, action: &str, decision: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("Action=SimulatePrincipalPolicy"))
        .and(body_string_contains(action_param(action)))
        .respond_with(simulation_result(
            &format!("s3:{}", action),
            "arn:aws:s3:::example-bucket/example.txt",
            &[decision],
        ))
        .mount(server)
        .await;
}
