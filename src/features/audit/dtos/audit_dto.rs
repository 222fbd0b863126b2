use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::audit::models::AuditLogRow;
use crate::features::auth::model::PrincipalKind;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogDto {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_kind: PrincipalKind,
    /// Username of the acting user or admin, if the account still exists
    pub actor_name: Option<String>,
    pub action: String,
    pub file_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogDto {
    fn from(row: AuditLogRow) -> Self {
        Self {
            id: row.id,
            actor_id: row.actor_id,
            actor_kind: row.actor_kind,
            actor_name: row.actor_name,
            action: row.action,
            file_id: row.file_id,
            file_name: row.file_name,
            details: row.details,
            created_at: row.created_at,
        }
    }
}
