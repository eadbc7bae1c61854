//! # Table Connectors
//!
//! The bundled cloud-resource tables, each expressed as a declarative
//! [`crate::schema::TableBuilder`]: columns, list/get entry points, and the
//! hydrate declarations the engine executes per row.

pub mod cloudtrail_trail_event;
pub mod common;
pub mod iam_user;
pub mod s3_bucket;

pub use cloudtrail_trail_event::table_aws_cloudtrail_trail_event;
pub use iam_user::table_aws_iam_user;
pub use s3_bucket::table_aws_s3_bucket;

use crate::error::Result;
use crate::registry::TableRegistry;

/// Register every bundled table. A table that fails validation is not
/// served and the error is returned.
pub async fn register_all(registry: &TableRegistry) -> Result<()> {
    registry.register(table_aws_iam_user()).await?;
    registry.register(table_aws_s3_bucket()).await?;
    registry.register(table_aws_cloudtrail_trail_event()).await?;
    Ok(())
}
