//! # aws_iam_user
//!
//! IAM users with per-user enrichment: permissions boundary and tags, login
//! profile, MFA devices, group membership, attached managed policies, and
//! inline policies fetched concurrently per policy name.

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::constants::{error_codes, operations};
use crate::hydration::{fetch_all, HydrateData, HydrateFetch, HydrateSpec};
use crate::projection::{Column, ColumnType, Transform};
use crate::provider::{ErrorKind, IgnoreConfig, ListFilter, ProviderError, QueryContext, RawRow};
use crate::schema::{GetConfig, KeyColumns, ListConfig, ListFetch, TableBuilder, TableDefinition};

use super::common::{policy_to_std, tags_to_map};

/// Table definition for `aws_iam_user`.
pub fn table_aws_iam_user() -> TableBuilder {
    TableDefinition::builder("aws_iam_user", "AWS IAM User")
        .get(GetConfig {
            key_columns: KeyColumns::any(&["name", "arn"]),
            ignore: IgnoreConfig::kinds(&[ErrorKind::NotFound, ErrorKind::InvalidParameter])
                .with_codes([
                    error_codes::VALIDATION_ERROR,
                    error_codes::NO_SUCH_ENTITY,
                    error_codes::INVALID_PARAMETER,
                ]),
            fetch: Arc::new(GetIamUser),
        })
        .list(ListConfig::new(Arc::new(ListIamUsers)).optional_qual("path"))
        .hydrate(HydrateSpec::new("user_detail", Arc::new(GetUserDetail)))
        .hydrate(
            // Users without a console password yield a not-found error here;
            // that is an absent profile, not a failure.
            HydrateSpec::new("login_profile", Arc::new(GetLoginProfile))
                .ignore(IgnoreConfig::kinds(&[ErrorKind::NotFound])),
        )
        .hydrate(HydrateSpec::new("mfa_devices", Arc::new(ListMfaDevices)))
        .hydrate(HydrateSpec::new("groups", Arc::new(ListGroupsForUser)))
        .hydrate(HydrateSpec::new(
            "attached_policy_arns",
            Arc::new(ListAttachedPolicyArns),
        ))
        .hydrate(HydrateSpec::new(
            "inline_policies",
            Arc::new(ListInlinePolicies),
        ))
        .column(
            Column::new(
                "name",
                ColumnType::String,
                "The friendly name identifying the user.",
            )
            .from_field("UserName"),
        )
        .column(Column::new(
            "user_id",
            ColumnType::String,
            "The stable and unique string identifying the user.",
        ))
        .column(Column::new(
            "path",
            ColumnType::String,
            "The path to the user.",
        ))
        .column(Column::new(
            "arn",
            ColumnType::String,
            "The Amazon Resource Name (ARN) that identifies the user.",
        ))
        .column(Column::new(
            "create_date",
            ColumnType::Timestamp,
            "The date and time, when the user was created.",
        ))
        .column(Column::new(
            "password_last_used",
            ColumnType::Timestamp,
            "The date and time, when the user's password was last used to sign in to an AWS website.",
        ))
        .column(
            Column::new(
                "permissions_boundary_arn",
                ColumnType::String,
                "The ARN of the policy used to set the permissions boundary for the user.",
            )
            .from_hydrate_field("user_detail", "PermissionsBoundaryArn"),
        )
        .column(
            Column::new(
                "permissions_boundary_type",
                ColumnType::String,
                "The permissions boundary usage type that indicates what type of IAM resource \
                 is used as the permissions boundary for an entity. This data type can only have \
                 a value of Policy.",
            )
            .from_hydrate_field("user_detail", "PermissionsBoundaryType"),
        )
        .column(
            Column::new("mfa_enabled", ColumnType::Bool, "The MFA status of the user.")
                .from_hydrate_field("mfa_devices", "MFADevices")
                .transform(Transform::Apply(mfa_status)),
        )
        .column(
            Column::new(
                "login_profile",
                ColumnType::Json,
                "Contains the user name and password create date for a user.",
            )
            .from_hydrate("login_profile"),
        )
        .column(
            Column::new(
                "mfa_devices",
                ColumnType::Json,
                "A list of MFA devices attached to the user.",
            )
            .from_hydrate_field("mfa_devices", "MFADevices"),
        )
        .column(
            Column::new(
                "groups",
                ColumnType::Json,
                "A list of groups attached to the user.",
            )
            .from_hydrate_field("groups", "Groups"),
        )
        .column(
            Column::new(
                "inline_policies",
                ColumnType::Json,
                "A list of policy documents that are embedded as inline policies for the user.",
            )
            .from_hydrate("inline_policies"),
        )
        .column(
            Column::new(
                "inline_policies_std",
                ColumnType::Json,
                "Inline policies in canonical form for the user.",
            )
            .from_hydrate("inline_policies")
            .transform(Transform::Apply(inline_policies_to_std)),
        )
        .column(
            Column::new(
                "attached_policy_arns",
                ColumnType::Json,
                "A list of managed policies attached to the user.",
            )
            .from_hydrate("attached_policy_arns"),
        )
        .column(
            Column::new(
                "tags_src",
                ColumnType::Json,
                "A list of tags that are attached to the user.",
            )
            .from_hydrate_field("user_detail", "TagsSrc"),
        )
        .column(
            Column::new("tags", ColumnType::Json, "A map of tags for the resource.")
                .from_hydrate_field("user_detail", "Tags"),
        )
        .column(
            Column::new("title", ColumnType::String, "Title of the resource.")
                .from_field("UserName"),
        )
        .column(
            Column::new("akas", ColumnType::Json, "Array of globally unique identifier strings (also known as) for the resource.")
                .from_field("Arn")
                .transform(Transform::EnsureStringArray),
        )
}

/// List users, pushing down the optional path prefix and a page size
/// reduced by the query limit.
struct ListIamUsers;

#[async_trait]
impl ListFetch for ListIamUsers {
    async fn list(&self, ctx: &QueryContext) -> Result<crate::provider::RowStream, ProviderError> {
        let page_size = ctx.page_size(ctx.connection().list_page_size);
        let mut filter = ListFilter::new().with_page_size(page_size);
        if let Some(path) = ctx.qual_str("path") {
            filter = filter.with_qual("PathPrefix", json!(path));
        }
        ctx.provider()
            .list(operations::IAM_LIST_USERS, &filter)
            .await
    }
}

/// Single-user lookup by name or ARN (user name is the last ARN segment).
struct GetIamUser;

#[async_trait]
impl HydrateFetch for GetIamUser {
    async fn fetch(&self, _data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let name = match ctx.qual_str("arn") {
            Some(arn) if !arn.is_empty() => arn.rsplit('/').next().unwrap_or(arn).to_string(),
            _ => ctx.qual_str("name").unwrap_or_default().to_string(),
        };

        let response = ctx
            .provider()
            .get(operations::IAM_GET_USER, &json!({ "UserName": name }))
            .await?;
        Ok(response.get("User").cloned().unwrap_or(Value::Null))
    }
}

/// Re-fetch the user for attributes the list call omits: tags and the
/// permissions boundary.
struct GetUserDetail;

#[async_trait]
impl HydrateFetch for GetUserDetail {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let user_name = data.row_str("UserName").unwrap_or_default();
        let response = ctx
            .provider()
            .get(operations::IAM_GET_USER, &json!({ "UserName": user_name }))
            .await?;
        let user = response.get("User").cloned().unwrap_or(Value::Null);

        let tags = user.get("Tags").cloned().unwrap_or(Value::Null);
        let boundary_arn = user
            .pointer("/PermissionsBoundary/PermissionsBoundaryArn")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let boundary_type = user
            .pointer("/PermissionsBoundary/PermissionsBoundaryType")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(json!({
            "TagsSrc": tags,
            "Tags": tags_to_map(&tags),
            "PermissionsBoundaryArn": boundary_arn,
            "PermissionsBoundaryType": boundary_type,
        }))
    }
}

struct GetLoginProfile;

#[async_trait]
impl HydrateFetch for GetLoginProfile {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let user_name = data.row_str("UserName").unwrap_or_default();
        let response = ctx
            .provider()
            .get(
                operations::IAM_GET_LOGIN_PROFILE,
                &json!({ "UserName": user_name }),
            )
            .await?;
        Ok(response.get("LoginProfile").cloned().unwrap_or(Value::Null))
    }
}

struct ListMfaDevices;

#[async_trait]
impl HydrateFetch for ListMfaDevices {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let user_name = data.row_str("UserName").unwrap_or_default();
        ctx.provider()
            .get(
                operations::IAM_LIST_MFA_DEVICES,
                &json!({ "UserName": user_name }),
            )
            .await
    }
}

struct ListGroupsForUser;

#[async_trait]
impl HydrateFetch for ListGroupsForUser {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let user_name = data.row_str("UserName").unwrap_or_default();
        ctx.provider()
            .get(
                operations::IAM_LIST_GROUPS_FOR_USER,
                &json!({ "UserName": user_name }),
            )
            .await
    }
}

/// Managed policy attachments, reduced to their ARNs.
struct ListAttachedPolicyArns;

#[async_trait]
impl HydrateFetch for ListAttachedPolicyArns {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let user_name = data.row_str("UserName").unwrap_or_default();
        let response = ctx
            .provider()
            .get(
                operations::IAM_LIST_ATTACHED_USER_POLICIES,
                &json!({ "UserName": user_name }),
            )
            .await?;

        let arns: Vec<Value> = response
            .get("AttachedPolicies")
            .and_then(Value::as_array)
            .map(|policies| {
                policies
                    .iter()
                    .filter_map(|p| p.get("PolicyArn").cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Value::Array(arns))
    }
}

/// Inline policies: list the names, then fetch every document concurrently.
/// Any single failure discards the whole aggregate.
struct ListInlinePolicies;

#[async_trait]
impl HydrateFetch for ListInlinePolicies {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError> {
        let user_name = data.row_str("UserName").unwrap_or_default().to_string();
        let response = ctx
            .provider()
            .get(
                operations::IAM_LIST_USER_POLICIES,
                &json!({ "UserName": user_name.clone() }),
            )
            .await?;

        let policy_names: Vec<String> = response
            .get("PolicyNames")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let provider = ctx.provider_handle();
        let bound = ctx.hydration().max_concurrent_subfetches;

        let policies = fetch_all(policy_names, bound, move |policy_name| {
            let provider = provider.clone();
            let user_name = user_name.clone();
            async move {
                let document = provider
                    .get(
                        operations::IAM_GET_USER_POLICY,
                        &json!({ "UserName": user_name, "PolicyName": policy_name }),
                    )
                    .await?;
                decode_inline_policy(&document)
            }
        })
        .await?;

        Ok(Value::Array(policies))
    }
}

/// Inline policy documents arrive URL-encoded; decode and parse them into
/// `{PolicyName, PolicyDocument}` entries.
fn decode_inline_policy(document: &Value) -> Result<Value, ProviderError> {
    let policy_name = document
        .get("PolicyName")
        .cloned()
        .unwrap_or(Value::Null);
    let encoded = document
        .get("PolicyDocument")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // Query-string unescaping: '+' is a space
    let unescaped = encoded.replace('+', " ");
    let decoded = percent_decode_str(&unescaped)
        .decode_utf8()
        .map_err(|e| {
            ProviderError::new(
                ErrorKind::Other,
                operations::IAM_GET_USER_POLICY,
                "PolicyDocumentDecodeError",
                &e.to_string(),
            )
        })?;

    let parsed: Value = serde_json::from_str(&decoded).map_err(|e| {
        ProviderError::new(
            ErrorKind::Other,
            operations::IAM_GET_USER_POLICY,
            "PolicyDocumentParseError",
            &e.to_string(),
        )
    })?;

    Ok(json!({
        "PolicyName": policy_name,
        "PolicyDocument": parsed,
    }))
}

/// A user has MFA enabled when at least one device is attached.
fn mfa_status(value: &Value) -> Value {
    Value::Bool(value.as_array().is_some_and(|devices| !devices.is_empty()))
}

/// Canonicalize every inline policy document in the aggregate.
fn inline_policies_to_std(value: &Value) -> Value {
    match value {
        Value::Array(policies) => Value::Array(
            policies
                .iter()
                .map(|policy| {
                    let name = policy.get("PolicyName").cloned().unwrap_or(Value::Null);
                    let document = policy
                        .get("PolicyDocument")
                        .map(policy_to_std)
                        .unwrap_or(Value::Null);
                    json!({ "PolicyName": name, "PolicyDocument": document })
                })
                .collect(),
        ),
        _ => Value::Null,
    }
}
