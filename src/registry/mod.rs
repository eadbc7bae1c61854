//! # Component Registration
//!
//! Registration and discovery for table definitions.

pub mod table_registry;

pub use table_registry::TableRegistry;
