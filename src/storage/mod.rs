mod repository;

pub use repository::*;

/// SQL migration for the listing, account and sale-record schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for buyer feedback
pub const MIGRATION_002_FEEDBACK: &str = include_str!("migrations/002_feedback.sql");
