//! # aws_s3_bucket
//!
//! S3 buckets with region-aware enrichment. The bucket location resolves
//! first; every configuration fetch depends on it and runs against the
//! bucket's own region. A location that hydrated to absent (ignored error)
//! propagates as absent configuration, never as a failed row.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::constants::{defaults, operations};
use crate::hydration::{HydrateData, HydrateFetch, HydrateSpec};
use crate::projection::{Column, ColumnType, Transform};
use crate::provider::{
    IgnoreConfig, ListFilter, ProviderError, QueryContext, RawRow,
};
use crate::schema::{GetConfig, KeyColumns, ListConfig, ListFetch, TableBuilder, TableDefinition};

use super::common::{policy_to_std, tags_to_map};

/// Table definition for `aws_s3_bucket`.
pub fn table_aws_s3_bucket() -> TableBuilder {
    TableDefinition::builder("aws_s3_bucket", "AWS S3 Bucket")
        .get(GetConfig {
            key_columns: KeyColumns::single("name"),
            ignore: IgnoreConfig::none(),
            fetch: Arc::new(GetS3Bucket),
        })
        .list(ListConfig::new(Arc::new(ListS3Buckets)))
        .hydrate(HydrateSpec::new("account_metadata", Arc::new(GetAccountMetadata)))
        .hydrate(HydrateSpec::new("bucket_location", Arc::new(GetBucketLocation)))
        .hydrate(
            HydrateSpec::new("bucket_arn", Arc::new(GetBucketArn))
                .depends_on(&["account_metadata"]),
        )
        .hydrate(regional(
            "bucket_is_public",
            operations::S3_GET_BUCKET_POLICY_STATUS,
            None,
            // A bucket without a policy has an empty policy status
            AbsentBehavior::Value(empty_document),
        ))
        .hydrate(regional(
            "bucket_versioning",
            operations::S3_GET_BUCKET_VERSIONING,
            None,
            AbsentBehavior::Fatal,
        ))
        .hydrate(regional(
            "bucket_encryption",
            operations::S3_GET_BUCKET_ENCRYPTION,
            None,
            AbsentBehavior::Value(null_document),
        ))
        .hydrate(regional(
            "bucket_public_access_block",
            operations::S3_GET_PUBLIC_ACCESS_BLOCK,
            Some("PublicAccessBlockConfiguration"),
            // Buckets predating the feature report no configuration at all
            AbsentBehavior::Value(default_public_access_block),
        ))
        .hydrate(regional(
            "bucket_acl",
            operations::S3_GET_BUCKET_ACL,
            None,
            AbsentBehavior::Fatal,
        ))
        .hydrate(regional(
            "bucket_lifecycle",
            operations::S3_GET_BUCKET_LIFECYCLE,
            None,
            AbsentBehavior::Value(null_document),
        ))
        .hydrate(regional(
            "bucket_logging",
            operations::S3_GET_BUCKET_LOGGING,
            None,
            AbsentBehavior::Fatal,
        ))
        .hydrate(regional(
            "bucket_policy",
            operations::S3_GET_BUCKET_POLICY,
            None,
            AbsentBehavior::Value(empty_document),
        ))
        .hydrate(regional(
            "bucket_replication",
            operations::S3_GET_BUCKET_REPLICATION,
            None,
            AbsentBehavior::Value(empty_document),
        ))
        .hydrate(regional(
            "bucket_tagging",
            operations::S3_GET_BUCKET_TAGGING,
            None,
            AbsentBehavior::Fatal,
        ))
        .hydrate(regional(
            "object_lock_configuration",
            operations::S3_GET_OBJECT_LOCK_CONFIGURATION,
            None,
            AbsentBehavior::Value(null_document),
        ))
        .hydrate(regional(
            "event_notification_configurations",
            operations::S3_GET_BUCKET_NOTIFICATION,
            None,
            AbsentBehavior::Fatal,
        ))
        .column(Column::new(
            "name",
            ColumnType::String,
            "The user friendly name of the bucket.",
        ))
        .column(
            Column::new("arn", ColumnType::String, "The ARN of the AWS S3 Bucket.")
                .from_hydrate("bucket_arn"),
        )
        .column(Column::new(
            "creation_date",
            ColumnType::Timestamp,
            "The date and time when bucket was created.",
        ))
        .column(
            Column::new(
                "bucket_policy_is_public",
                ColumnType::Bool,
                "The policy status for an Amazon S3 bucket, indicating whether the bucket is public.",
            )
            .from_hydrate_field("bucket_is_public", "PolicyStatus.IsPublic")
            .with_default(json!(false)),
        )
        .column(
            Column::new(
                "versioning_enabled",
                ColumnType::Bool,
                "The versioning state of a bucket.",
            )
            .from_hydrate_field("bucket_versioning", "Status")
            .transform(Transform::NullIfEmptyString)
            .transform(Transform::ToBool),
        )
        .column(
            Column::new(
                "versioning_mfa_delete",
                ColumnType::Bool,
                "The MFA Delete status of the versioning state.",
            )
            .from_hydrate_field("bucket_versioning", "MFADelete")
            .transform(Transform::NullIfEmptyString)
            .transform(Transform::ToBool),
        )
        .column(
            Column::new(
                "block_public_acls",
                ColumnType::Bool,
                "Specifies whether Amazon S3 should block public access control lists (ACLs) for this bucket and objects in this bucket.",
            )
            .from_hydrate_field("bucket_public_access_block", "BlockPublicAcls"),
        )
        .column(
            Column::new(
                "block_public_policy",
                ColumnType::Bool,
                "Specifies whether Amazon S3 should block public bucket policies for this bucket. If TRUE it causes Amazon S3 to reject calls to PUT Bucket policy if the specified bucket policy allows public access.",
            )
            .from_hydrate_field("bucket_public_access_block", "BlockPublicPolicy"),
        )
        .column(
            Column::new(
                "ignore_public_acls",
                ColumnType::Bool,
                "Specifies whether Amazon S3 should ignore public ACLs for this bucket and objects in this bucket. Setting this element to TRUE causes Amazon S3 to ignore all public ACLs on this bucket and objects in this bucket.",
            )
            .from_hydrate_field("bucket_public_access_block", "IgnorePublicAcls"),
        )
        .column(
            Column::new(
                "restrict_public_buckets",
                ColumnType::Bool,
                "Specifies whether Amazon S3 should restrict public bucket policies for this bucket. Setting this element to TRUE restricts access to this bucket to only AWS service principals and authorized users within this account if the bucket has a public policy.",
            )
            .from_hydrate_field("bucket_public_access_block", "RestrictPublicBuckets"),
        )
        .column(
            Column::new(
                "event_notification_configuration",
                ColumnType::Json,
                "A container for specifying the notification configuration of the bucket. If this element is empty, notifications are turned off for the bucket.",
            )
            .from_hydrate("event_notification_configurations"),
        )
        .column(
            Column::new(
                "server_side_encryption_configuration",
                ColumnType::Json,
                "The default encryption configuration for an Amazon S3 bucket.",
            )
            .from_hydrate_field("bucket_encryption", "ServerSideEncryptionConfiguration"),
        )
        .column(
            Column::new(
                "acl",
                ColumnType::Json,
                "The access control list (ACL) of a bucket.",
            )
            .from_hydrate("bucket_acl"),
        )
        .column(
            Column::new(
                "lifecycle_rules",
                ColumnType::Json,
                "The lifecycle configuration information of the bucket.",
            )
            .from_hydrate_field("bucket_lifecycle", "Rules"),
        )
        .column(
            Column::new(
                "logging",
                ColumnType::Json,
                "The logging status of a bucket and the permissions users have to view and modify that status.",
            )
            .from_hydrate_field("bucket_logging", "LoggingEnabled"),
        )
        .column(
            Column::new(
                "object_lock_configuration",
                ColumnType::Json,
                "The specified bucket's object lock configuration.",
            )
            .from_hydrate_field("object_lock_configuration", "ObjectLockConfiguration"),
        )
        .column(
            Column::new(
                "policy",
                ColumnType::Json,
                "The resource IAM access document for the bucket.",
            )
            .from_hydrate_field("bucket_policy", "Policy")
            .transform(Transform::ParseJson),
        )
        .column(
            Column::new(
                "policy_std",
                ColumnType::Json,
                "Contains the policy in a canonical form for easier searching.",
            )
            .from_hydrate_field("bucket_policy", "Policy")
            .transform(Transform::ParseJson)
            .transform(Transform::Apply(policy_to_std)),
        )
        .column(
            Column::new(
                "replication",
                ColumnType::Json,
                "The replication configuration of a bucket.",
            )
            .from_hydrate_field("bucket_replication", "ReplicationConfiguration"),
        )
        .column(
            Column::new(
                "tags_src",
                ColumnType::Json,
                "A list of tags assigned to bucket.",
            )
            .from_hydrate_field("bucket_tagging", "TagSet"),
        )
        .column(
            Column::new("tags", ColumnType::Json, "A map of tags for the resource.")
                .from_hydrate_field("bucket_tagging", "TagSet")
                .transform(Transform::Apply(tags_to_map)),
        )
        .column(
            Column::new("title", ColumnType::String, "Title of the resource.")
                .from_field("Name"),
        )
        .column(
            Column::new("akas", ColumnType::Json, "Array of globally unique identifier strings (also known as) for the resource.")
                .from_hydrate("bucket_arn")
                .transform(Transform::EnsureStringArray),
        )
        .column(
            Column::new(
                "region",
                ColumnType::String,
                "The AWS Region in which the resource is located.",
            )
            .from_hydrate_field("bucket_location", "LocationConstraint"),
        )
}

/// List buckets; the call is not paged and not region-bound.
struct ListS3Buckets;

#[async_trait]
impl ListFetch for ListS3Buckets {
    async fn list(&self, ctx: &QueryContext) -> Result<crate::provider::RowStream, ProviderError> {
        ctx.provider()
            .list(operations::S3_LIST_BUCKETS, &ListFilter::new())
            .await
    }
}

/// There is no provider get call for a single bucket; filter the list
/// result by name instead.
struct GetS3Bucket;

#[async_trait]
impl HydrateFetch for GetS3Bucket {
    async fn fetch(&self, _data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let name = ctx.qual_str("name").unwrap_or_default();

        let mut stream = ctx
            .provider()
            .list(operations::S3_LIST_BUCKETS, &ListFilter::new())
            .await?;

        while let Some(bucket) = stream.next().await {
            let bucket = bucket?;
            if bucket.get("Name").and_then(Value::as_str) == Some(name) {
                return Ok(bucket);
            }
        }

        Ok(Value::Null)
    }
}

/// Partition and account id, shared by ARN composition.
struct GetAccountMetadata;

#[async_trait]
impl HydrateFetch for GetAccountMetadata {
    async fn fetch(&self, _data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        ctx.provider()
            .get(operations::ACCOUNT_METADATA, &json!({}))
            .await
    }
}

/// Resolve the bucket's region, normalizing the provider's quirks: buckets
/// created through older API paths report `EU` for eu-west-1, and buckets
/// in us-east-1 report no constraint at all.
struct GetBucketLocation;

#[async_trait]
impl HydrateFetch for GetBucketLocation {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let bucket = data.row_str("Name").unwrap_or_default();
        let response = ctx
            .provider()
            .get(
                operations::S3_GET_BUCKET_LOCATION,
                &json!({
                    "Bucket": bucket,
                    "Region": ctx.connection().default_region,
                }),
            )
            .await?;

        let constraint = match response.get("LocationConstraint").and_then(Value::as_str) {
            Some("EU") => "eu-west-1".to_string(),
            Some(region) if !region.is_empty() => region.to_string(),
            _ => defaults::FALLBACK_REGION.to_string(),
        };

        Ok(json!({ "LocationConstraint": constraint }))
    }
}

/// Compose the bucket ARN from the connection's partition.
struct GetBucketArn;

#[async_trait]
impl HydrateFetch for GetBucketArn {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let partition = data
            .value("account_metadata")
            .and_then(|metadata| metadata.get("Partition"))
            .and_then(Value::as_str)
            .unwrap_or(&ctx.connection().partition)
            .to_string();
        let name = data.row_str("Name").unwrap_or_default();
        Ok(Value::String(format!("arn:{partition}:s3:::{name}")))
    }
}

/// What a regional fetch yields when the provider classifies the error as
/// an absent optional configuration.
#[derive(Clone, Copy)]
enum AbsentBehavior {
    /// Absence is not expected for this call; the error stands.
    Fatal,
    /// Substitute this value and hydrate successfully.
    Value(fn() -> Value),
}

fn null_document() -> Value {
    Value::Null
}

fn empty_document() -> Value {
    json!({})
}

fn default_public_access_block() -> Value {
    json!({
        "BlockPublicAcls": false,
        "BlockPublicPolicy": false,
        "IgnorePublicAcls": false,
        "RestrictPublicBuckets": false,
    })
}

fn regional(
    name: &str,
    operation: &'static str,
    response_field: Option<&'static str>,
    absent: AbsentBehavior,
) -> HydrateSpec {
    HydrateSpec::new(
        name,
        Arc::new(RegionalBucketFetch {
            operation,
            response_field,
            absent,
        }),
    )
    .depends_on(&["bucket_location"])
}

/// One bucket-configuration fetch executed in the bucket's own region.
///
/// When the location dependency hydrated to absent, the fetch yields no
/// data without calling the provider, mirroring an ignored location error.
struct RegionalBucketFetch {
    operation: &'static str,
    response_field: Option<&'static str>,
    absent: AbsentBehavior,
}

#[async_trait]
impl HydrateFetch for RegionalBucketFetch {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let location = match data.value("bucket_location") {
            Some(location) => location,
            None => return Ok(Value::Null),
        };
        let region = location
            .get("LocationConstraint")
            .and_then(Value::as_str)
            .unwrap_or(defaults::FALLBACK_REGION);
        let bucket = data.row_str("Name").unwrap_or_default();

        let result = ctx
            .provider()
            .get(
                self.operation,
                &json!({ "Bucket": bucket, "Region": region }),
            )
            .await;

        match result {
            Ok(response) => Ok(match self.response_field {
                Some(field) => response.get(field).cloned().unwrap_or(Value::Null),
                None => response,
            }),
            Err(error) if error.kind.is_absence() => match self.absent {
                AbsentBehavior::Value(substitute) => Ok(substitute()),
                AbsentBehavior::Fatal => Err(error),
            },
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_builds_cleanly() {
        let table = table_aws_s3_bucket().build().unwrap();
        assert_eq!(table.name(), "aws_s3_bucket");
        assert_eq!(table.hydrates().len(), 15);
        // Wave 1: account_metadata + bucket_location; wave 2: everything else
        assert_eq!(table.plan().len(), 2);
        assert_eq!(table.plan().wave_of("bucket_location"), Some(0));
        assert_eq!(table.plan().wave_of("bucket_versioning"), Some(1));
        assert_eq!(table.plan().wave_of("bucket_arn"), Some(1));
    }

    #[test]
    fn every_regional_hydrate_depends_on_location() {
        let table = table_aws_s3_bucket().build().unwrap();
        let registry = table.hydrates();
        for name in [
            "bucket_is_public",
            "bucket_versioning",
            "bucket_encryption",
            "bucket_public_access_block",
            "bucket_acl",
            "bucket_lifecycle",
            "bucket_logging",
            "bucket_policy",
            "bucket_replication",
            "bucket_tagging",
            "object_lock_configuration",
            "event_notification_configurations",
        ] {
            let spec = registry.get(name).unwrap();
            assert_eq!(spec.dependencies(), ["bucket_location".to_string()]);
        }
    }

    #[test]
    fn public_access_block_defaults_are_all_false() {
        let block = default_public_access_block();
        for field in [
            "BlockPublicAcls",
            "BlockPublicPolicy",
            "IgnorePublicAcls",
            "RestrictPublicBuckets",
        ] {
            assert_eq!(block.get(field), Some(&json!(false)));
        }
    }
}
