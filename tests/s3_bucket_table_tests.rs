//! End-to-end tests for the aws_s3_bucket table: the location-rooted
//! dependency graph, regional call routing, per-call absence handling, and
//! branch poisoning when the location fetch fails.

mod common;

use common::{context, context_with_config, CollectingSink, MockProvider};
use quarry_core::config::QuarryConfig;
use quarry_core::constants::operations;
use quarry_core::execution::{ScanStatus, TableScanner};
use quarry_core::provider::{ErrorKind, ProviderError};
use quarry_core::tables::table_aws_s3_bucket;
use serde_json::{json, Value};
use std::sync::Arc;

fn bucket_rows() -> Vec<Value> {
    vec![
        json!({"Name": "bucket-one", "CreationDate": "2019-05-01T00:00:00Z"}),
        json!({"Name": "bucket-two", "CreationDate": "2020-07-04T12:00:00Z"}),
    ]
}

fn bucket_name(params: &Value) -> &str {
    params.get("Bucket").and_then(Value::as_str).unwrap_or("")
}

fn not_configured(operation: &'static str, code: &'static str) -> ProviderError {
    ProviderError::not_configured(operation, code, "not configured")
}

fn scripted_provider() -> MockProvider {
    MockProvider::new()
        .on_list(operations::S3_LIST_BUCKETS, bucket_rows())
        .on_get_value(
            operations::ACCOUNT_METADATA,
            json!({"Partition": "aws", "AccountId": "123456789012"}),
        )
        .on_get(operations::S3_GET_BUCKET_LOCATION, |params| {
            match bucket_name(params) {
                // Legacy API constraint for eu-west-1
                "bucket-one" => Ok(json!({"LocationConstraint": "EU"})),
                // us-east-1 buckets report no constraint at all
                _ => Ok(json!({})),
            }
        })
        .on_get(operations::S3_GET_BUCKET_POLICY_STATUS, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({"PolicyStatus": {"IsPublic": true}})),
                _ => Err(not_configured(
                    operations::S3_GET_BUCKET_POLICY_STATUS,
                    "NoSuchBucketPolicy",
                )),
            }
        })
        .on_get(operations::S3_GET_BUCKET_VERSIONING, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({"Status": "Enabled", "MFADelete": "Disabled"})),
                _ => Ok(json!({})),
            }
        })
        .on_get(operations::S3_GET_BUCKET_ENCRYPTION, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({
                    "ServerSideEncryptionConfiguration": {
                        "Rules": [{"ApplyServerSideEncryptionByDefault": {"SSEAlgorithm": "aws:kms"}}]
                    }
                })),
                _ => Err(not_configured(
                    operations::S3_GET_BUCKET_ENCRYPTION,
                    "ServerSideEncryptionConfigurationNotFoundError",
                )),
            }
        })
        .on_get(operations::S3_GET_PUBLIC_ACCESS_BLOCK, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({
                    "PublicAccessBlockConfiguration": {
                        "BlockPublicAcls": true,
                        "BlockPublicPolicy": true,
                        "IgnorePublicAcls": true,
                        "RestrictPublicBuckets": true,
                    }
                })),
                _ => Err(not_configured(
                    operations::S3_GET_PUBLIC_ACCESS_BLOCK,
                    "NoSuchPublicAccessBlockConfiguration",
                )),
            }
        })
        .on_get_value(
            operations::S3_GET_BUCKET_ACL,
            json!({"Owner": {"DisplayName": "storage"}, "Grants": []}),
        )
        .on_get(operations::S3_GET_BUCKET_LIFECYCLE, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({"Rules": [{"ID": "expire-old", "Status": "Enabled"}]})),
                _ => Err(not_configured(
                    operations::S3_GET_BUCKET_LIFECYCLE,
                    "NoSuchLifecycleConfiguration",
                )),
            }
        })
        .on_get(operations::S3_GET_BUCKET_LOGGING, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({"LoggingEnabled": {"TargetBucket": "logs"}})),
                _ => Ok(json!({})),
            }
        })
        .on_get(operations::S3_GET_BUCKET_POLICY, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({
                    "Policy": "{\"Version\":\"2012-10-17\",\"Statement\":[{\"Action\":[\"s3:GetObject\",\"S3:PutObject\"],\"Resource\":\"arn:aws:s3:::bucket-one/*\"}]}"
                })),
                _ => Err(not_configured(
                    operations::S3_GET_BUCKET_POLICY,
                    "NoSuchBucketPolicy",
                )),
            }
        })
        .on_get(operations::S3_GET_BUCKET_REPLICATION, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({
                    "ReplicationConfiguration": {"Role": "arn:aws:iam::123456789012:role/replication"}
                })),
                _ => Err(not_configured(
                    operations::S3_GET_BUCKET_REPLICATION,
                    "ReplicationConfigurationNotFoundError",
                )),
            }
        })
        .on_get(operations::S3_GET_BUCKET_TAGGING, |params| {
            match bucket_name(params) {
                "bucket-one" => Ok(json!({"TagSet": [{"Key": "env", "Value": "prod"}]})),
                _ => Ok(json!({"TagSet": []})),
            }
        })
        .on_get_error(
            operations::S3_GET_OBJECT_LOCK_CONFIGURATION,
            not_configured(
                operations::S3_GET_OBJECT_LOCK_CONFIGURATION,
                "ObjectLockConfigurationNotFoundError",
            ),
        )
        .on_get_value(
            operations::S3_GET_BUCKET_NOTIFICATION,
            json!({"TopicConfigurations": []}),
        )
}

#[tokio::test]
async fn scan_hydrates_both_buckets() {
    let provider = Arc::new(scripted_provider());
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::unbounded();

    let summary = scanner
        .scan(context(provider.clone()), sink.clone(), None)
        .await
        .unwrap();

    assert_eq!(summary.rows_emitted, 2);
    assert_eq!(summary.status, ScanStatus::Completed);

    let one = sink.row_where("name", &json!("bucket-one")).unwrap();
    assert_eq!(one.get("region"), Some(&json!("eu-west-1")));
    assert_eq!(one.get("arn"), Some(&json!("arn:aws:s3:::bucket-one")));
    assert_eq!(one.get("akas"), Some(&json!(["arn:aws:s3:::bucket-one"])));
    assert_eq!(one.get("bucket_policy_is_public"), Some(&json!(true)));
    assert_eq!(one.get("versioning_enabled"), Some(&json!(true)));
    assert_eq!(one.get("versioning_mfa_delete"), Some(&json!(false)));
    assert_eq!(one.get("block_public_acls"), Some(&json!(true)));
    assert_eq!(
        one.get("lifecycle_rules"),
        Some(&json!([{"ID": "expire-old", "Status": "Enabled"}]))
    );
    assert_eq!(
        one.get("logging"),
        Some(&json!({"TargetBucket": "logs"}))
    );
    assert_eq!(one.get("tags"), Some(&json!({"env": "prod"})));
    assert_eq!(
        one.get("policy_std"),
        Some(&json!({
            "version": "2012-10-17",
            "statement": [{
                "action": ["s3:getobject", "s3:putobject"],
                "resource": ["arn:aws:s3:::bucket-one/*"],
            }]
        }))
    );

    let two = sink.row_where("name", &json!("bucket-two")).unwrap();
    // Null location constraint falls back to us-east-1
    assert_eq!(two.get("region"), Some(&json!("us-east-1")));
    // Absent policy status projects the declared false default
    assert_eq!(two.get("bucket_policy_is_public"), Some(&json!(false)));
    // Versioning never configured: no Status field, null column
    assert_eq!(two.get("versioning_enabled"), Some(&Value::Null));
    // Missing public access block yields the all-false defaults
    assert_eq!(two.get("block_public_acls"), Some(&json!(false)));
    assert_eq!(two.get("restrict_public_buckets"), Some(&json!(false)));
    assert_eq!(two.get("policy"), Some(&Value::Null));
    assert_eq!(two.get("replication"), Some(&Value::Null));
    assert_eq!(two.get("object_lock_configuration"), Some(&Value::Null));
    assert_eq!(two.get("tags"), Some(&json!({})));
}

#[tokio::test]
async fn regional_fetches_run_in_the_buckets_own_region() {
    let provider = Arc::new(scripted_provider());
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::unbounded();

    scanner
        .scan(context(provider.clone()), sink, None)
        .await
        .unwrap();

    let params = provider.get_params(operations::S3_GET_BUCKET_VERSIONING);
    assert_eq!(params.len(), 2);
    assert!(params
        .iter()
        .any(|p| bucket_name(p) == "bucket-one" && p.get("Region") == Some(&json!("eu-west-1"))));
    assert!(params
        .iter()
        .any(|p| bucket_name(p) == "bucket-two" && p.get("Region") == Some(&json!("us-east-1"))));
}

#[tokio::test]
async fn fatal_location_poisons_regional_branches_but_not_the_row() {
    let provider = Arc::new(scripted_provider().on_get_error(
        operations::S3_GET_BUCKET_LOCATION,
        ProviderError::new(
            ErrorKind::Other,
            operations::S3_GET_BUCKET_LOCATION,
            "InternalError",
            "boom",
        ),
    ));
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::unbounded();

    let summary = scanner
        .scan(context(provider.clone()), sink.clone(), None)
        .await
        .unwrap();

    // Rows still emitted with the independent branches intact
    assert_eq!(summary.rows_emitted, 2);
    let one = sink.row_where("name", &json!("bucket-one")).unwrap();
    assert_eq!(one.get("arn"), Some(&json!("arn:aws:s3:::bucket-one")));
    assert_eq!(one.get("region"), Some(&Value::Null));
    assert_eq!(one.get("versioning_enabled"), Some(&Value::Null));
    assert_eq!(one.get("acl"), Some(&Value::Null));

    // Poisoned dependents were skipped, not attempted
    assert_eq!(provider.get_calls(operations::S3_GET_BUCKET_VERSIONING), 0);
    assert_eq!(provider.get_calls(operations::S3_GET_BUCKET_ACL), 0);
}

#[tokio::test]
async fn ignored_location_failure_leaves_dependents_absent_without_calls() {
    let provider = Arc::new(scripted_provider().on_get_error(
        operations::S3_GET_BUCKET_LOCATION,
        ProviderError::new(
            ErrorKind::AccessDenied,
            operations::S3_GET_BUCKET_LOCATION,
            "AccessDenied",
            "denied",
        ),
    ));
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::unbounded();

    let mut config = QuarryConfig::default();
    config.connection.ignore_error_codes = vec!["AccessDenied".to_string()];

    let summary = scanner
        .scan(context_with_config(provider.clone(), config), sink.clone(), None)
        .await
        .unwrap();

    assert_eq!(summary.rows_emitted, 2);
    let one = sink.row_where("name", &json!("bucket-one")).unwrap();
    assert_eq!(one.get("region"), Some(&Value::Null));
    assert_eq!(one.get("versioning_enabled"), Some(&Value::Null));

    // Dependents executed (absent upstream, not poisoned) but declined to
    // call the provider without a region
    assert_eq!(provider.get_calls(operations::S3_GET_BUCKET_VERSIONING), 0);
    assert_eq!(provider.get_calls(operations::S3_GET_BUCKET_ACL), 0);
}

#[tokio::test]
async fn get_filters_the_bucket_list_by_name() {
    let provider = Arc::new(scripted_provider());
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::unbounded();

    let ctx = Arc::new(
        quarry_core::provider::QueryContext::new(provider, QuarryConfig::default())
            .with_qual("name", json!("bucket-two")),
    );

    let summary = scanner.get(ctx, sink.clone(), None).await.unwrap();

    assert_eq!(summary.rows_emitted, 1);
    let row = &sink.rows()[0];
    assert_eq!(row.get("name"), Some(&json!("bucket-two")));
    assert_eq!(row.get("region"), Some(&json!("us-east-1")));
}

#[tokio::test]
async fn sink_capacity_stops_the_scan_early() {
    let provider = Arc::new(scripted_provider());
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::with_capacity(1);

    let summary = scanner
        .scan(context(provider), sink.clone(), None)
        .await
        .unwrap();

    assert_eq!(summary.rows_emitted, 1);
    assert_eq!(summary.status, ScanStatus::LimitReached);
    assert_eq!(sink.rows().len(), 1);
}

#[tokio::test]
async fn cancelled_query_aborts_before_producing_rows() {
    let provider = Arc::new(scripted_provider());
    let scanner = TableScanner::new(Arc::new(table_aws_s3_bucket().build().unwrap()));
    let sink = CollectingSink::unbounded();

    let ctx = context(provider);
    ctx.cancel();

    let summary = scanner.scan(ctx, sink.clone(), None).await.unwrap();

    assert_eq!(summary.rows_emitted, 0);
    assert_eq!(summary.status, ScanStatus::Aborted);
    assert!(sink.rows().is_empty());
}
