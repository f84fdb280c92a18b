use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::models::admin_log::AdminLog;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogResponse {
    pub id: Uuid,
    pub admin_email: String,
    pub action: String,
    pub target_id: Uuid,
    pub target_type: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminLog> for AdminLogResponse {
    fn from(log: AdminLog) -> Self {
        AdminLogResponse {
            id: log.id,
            admin_email: log.admin_email,
            action: log.action,
            target_id: log.target_id,
            target_type: log.target_type,
            details: log.details,
            created_at: log.created_at,
        }
    }
}
