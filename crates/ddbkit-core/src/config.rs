//! Table configuration.

use std::env;

/// Default table name when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "ddbkit";

/// Settings shared by every call of a [`Table`](crate::table::Table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Name of the single table.
    pub table_name: String,
    /// Query order when the caller does not choose one (default: true).
    pub scan_index_forward: bool,
    /// Query page size when the caller does not choose one; 0 means no limit.
    pub default_page_size: u32,
}

impl TableConfig {
    /// Configuration for `table_name` with default query settings.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("DDBKIT_TABLE_NAME")
                .unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_owned()),
            scan_index_forward: env_bool("DDBKIT_SCAN_INDEX_FORWARD", true),
            default_page_size: env::var("DDBKIT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_owned(),
            scan_index_forward: true,
            default_page_size: 0,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}
