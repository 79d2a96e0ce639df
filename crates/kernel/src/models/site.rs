//! Tenant site record and request inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::{StringOrList, double_option};

/// Tenant site record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,

    /// Caller-chosen tenant identifier; globally unique and immutable.
    pub site_id: String,

    pub name: String,

    pub domain: String,

    pub description: Option<String>,

    /// Secret used by the site's widgets and servers.
    pub api_key: String,

    /// Inactive sites cannot authenticate with their API key.
    pub is_active: bool,

    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,

    /// Exact origins or `*.suffix` wildcards. Always contains `domain`.
    pub allowed_origins: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for registering a site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSite {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub description: Option<String>,
    pub site_id: Option<String>,
    pub allowed_origins: Option<StringOrList>,
}

/// Input for a partial site update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSite {
    pub name: Option<String>,
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub allowed_origins: Option<StringOrList>,
}
