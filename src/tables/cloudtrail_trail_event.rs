//! # aws_cloudtrail_trail_event
//!
//! CloudTrail events looked up from a required start timestamp. The table
//! is list-only and declares no hydrates; every column projects straight
//! off the event row, with the raw event text parsed into a document.

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::json;
use std::sync::Arc;

use crate::constants::operations;
use crate::projection::{Column, ColumnType, Transform};
use crate::provider::{ErrorKind, ListFilter, ProviderError, QueryContext};
use crate::schema::{ListConfig, ListFetch, TableBuilder, TableDefinition};

/// Table definition for `aws_cloudtrail_trail_event`.
pub fn table_aws_cloudtrail_trail_event() -> TableBuilder {
    TableDefinition::builder("aws_cloudtrail_trail_event", "AWS CloudTrail Trail Event")
        .list(ListConfig::new(Arc::new(ListCloudtrailEvents)).require_qual("event_time"))
        .column(Column::new(
            "event_name",
            ColumnType::String,
            "The name of the event.",
        ))
        .column(Column::new(
            "event_id",
            ColumnType::String,
            "The CloudTrail ID of the event.",
        ))
        .column(
            Column::new(
                "user_name",
                ColumnType::String,
                "A user name or role name of the requester that called the API in the event returned.",
            )
            .from_field("Username"),
        )
        .column(Column::new(
            "event_source",
            ColumnType::String,
            "The AWS service that the request was made to.",
        ))
        .column(Column::new(
            "event_time",
            ColumnType::Timestamp,
            "The date and time of the event returned.",
        ))
        .column(Column::new(
            "read_only",
            ColumnType::String,
            "Information about whether the event is a write event or a read event.",
        ))
        .column(
            Column::new(
                "event",
                ColumnType::Json,
                "A JSON object that contains the event returned.",
            )
            .from_field("CloudTrailEvent")
            .transform(Transform::ParseJson),
        )
        .column(Column::new(
            "resources",
            ColumnType::String,
            "A list of resources referenced by the event returned.",
        ))
        .column(
            Column::new("title", ColumnType::String, "Title of the resource.")
                .from_field("EventName"),
        )
}

/// Look up events from the qualified start time. The timestamp qual is
/// required and must parse as RFC 3339; anything else is a query error.
struct ListCloudtrailEvents;

#[async_trait]
impl ListFetch for ListCloudtrailEvents {
    async fn list(&self, ctx: &QueryContext) -> Result<crate::provider::RowStream, ProviderError> {
        let raw_start = ctx.qual_str("event_time").unwrap_or_default();
        let start_time = DateTime::parse_from_rfc3339(raw_start).map_err(|e| {
            ProviderError::new(
                ErrorKind::InvalidParameter,
                operations::CLOUDTRAIL_LOOKUP_EVENTS,
                "InvalidTimestamp",
                &format!("event_time '{raw_start}' is not RFC 3339: {e}"),
            )
        })?;

        let filter = ListFilter::new()
            .with_qual("StartTime", json!(start_time.to_rfc3339()))
            .with_page_size(ctx.page_size(ctx.connection().list_page_size));

        ctx.provider()
            .list(operations::CLOUDTRAIL_LOOKUP_EVENTS, &filter)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_builds_cleanly() {
        let table = table_aws_cloudtrail_trail_event().build().unwrap();
        assert_eq!(table.name(), "aws_cloudtrail_trail_event");
        assert!(table.hydrates().is_empty());
        assert!(table.plan().is_empty());
        assert_eq!(
            table.list_config().unwrap().required_quals,
            vec!["event_time"]
        );
    }
}
