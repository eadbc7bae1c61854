//! # System Constants
//!
//! Provider operation names, error-code strings, and operational defaults
//! shared across the table connectors and the hydration engine.

/// Provider operations invoked by the bundled table connectors.
///
/// Operation names follow the `service:Action` convention of the upstream
/// cloud APIs so a provider implementation can route them without a lookup
/// table of its own.
pub mod operations {
    // IAM
    pub const IAM_LIST_USERS: &str = "iam:ListUsers";
    pub const IAM_GET_USER: &str = "iam:GetUser";
    pub const IAM_GET_LOGIN_PROFILE: &str = "iam:GetLoginProfile";
    pub const IAM_LIST_MFA_DEVICES: &str = "iam:ListMFADevices";
    pub const IAM_LIST_GROUPS_FOR_USER: &str = "iam:ListGroupsForUser";
    pub const IAM_LIST_ATTACHED_USER_POLICIES: &str = "iam:ListAttachedUserPolicies";
    pub const IAM_LIST_USER_POLICIES: &str = "iam:ListUserPolicies";
    pub const IAM_GET_USER_POLICY: &str = "iam:GetUserPolicy";

    // S3
    pub const S3_LIST_BUCKETS: &str = "s3:ListBuckets";
    pub const S3_GET_BUCKET_LOCATION: &str = "s3:GetBucketLocation";
    pub const S3_GET_BUCKET_POLICY_STATUS: &str = "s3:GetBucketPolicyStatus";
    pub const S3_GET_BUCKET_VERSIONING: &str = "s3:GetBucketVersioning";
    pub const S3_GET_BUCKET_ENCRYPTION: &str = "s3:GetBucketEncryption";
    pub const S3_GET_PUBLIC_ACCESS_BLOCK: &str = "s3:GetPublicAccessBlock";
    pub const S3_GET_BUCKET_ACL: &str = "s3:GetBucketAcl";
    pub const S3_GET_BUCKET_LIFECYCLE: &str = "s3:GetBucketLifecycleConfiguration";
    pub const S3_GET_BUCKET_LOGGING: &str = "s3:GetBucketLogging";
    pub const S3_GET_BUCKET_POLICY: &str = "s3:GetBucketPolicy";
    pub const S3_GET_BUCKET_REPLICATION: &str = "s3:GetBucketReplication";
    pub const S3_GET_BUCKET_TAGGING: &str = "s3:GetBucketTagging";
    pub const S3_GET_OBJECT_LOCK_CONFIGURATION: &str = "s3:GetObjectLockConfiguration";
    pub const S3_GET_BUCKET_NOTIFICATION: &str = "s3:GetBucketNotificationConfiguration";

    // CloudTrail
    pub const CLOUDTRAIL_LOOKUP_EVENTS: &str = "cloudtrail:LookupEvents";

    // Account-level metadata (partition, account id) shared by all tables
    pub const ACCOUNT_METADATA: &str = "aws:AccountMetadata";
}

/// Provider error-code strings recognized by the bundled connectors.
///
/// These are the raw wire codes; the engine itself branches on
/// [`crate::provider::ErrorKind`], not on these strings. They survive here
/// for ignore-list configuration and log output.
pub mod error_codes {
    pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";
    pub const VALIDATION_ERROR: &str = "ValidationError";
    pub const INVALID_PARAMETER: &str = "InvalidParameter";
    pub const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";
    pub const NO_SUCH_LIFECYCLE_CONFIGURATION: &str = "NoSuchLifecycleConfiguration";
    pub const NO_SUCH_PUBLIC_ACCESS_BLOCK_CONFIGURATION: &str =
        "NoSuchPublicAccessBlockConfiguration";
    pub const SERVER_SIDE_ENCRYPTION_CONFIGURATION_NOT_FOUND: &str =
        "ServerSideEncryptionConfigurationNotFoundError";
    pub const REPLICATION_CONFIGURATION_NOT_FOUND: &str = "ReplicationConfigurationNotFoundError";
    pub const OBJECT_LOCK_CONFIGURATION_NOT_FOUND: &str = "ObjectLockConfigurationNotFoundError";
}

/// Operational defaults applied when configuration does not override them.
pub mod defaults {
    /// Basic page size for paged list calls, reduced when the query carries
    /// a smaller row limit.
    pub const LIST_PAGE_SIZE: i64 = 1000;

    /// Region assumed for buckets whose location constraint is null.
    pub const FALLBACK_REGION: &str = "us-east-1";

    /// Partition assumed when account metadata does not specify one.
    pub const FALLBACK_PARTITION: &str = "aws";

    /// Upper bound on concurrently running hydrate fetches per row executor.
    pub const MAX_CONCURRENT_FETCHES: usize = 32;

    /// Upper bound on concurrently running sub-fetches in a fan-out batch.
    pub const MAX_CONCURRENT_SUBFETCHES: usize = 16;

    /// Upper bound on rows hydrated concurrently by one table scan.
    pub const MAX_CONCURRENT_ROWS: usize = 8;
}
