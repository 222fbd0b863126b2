use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::audit::dtos::AuditLogDto;
use crate::features::audit::models::{Actor, AuditAction, AuditLogRow};
use crate::shared::types::PaginationQuery;

/// Append-only audit trail
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an action. A failed write is logged and swallowed.
    pub async fn record(
        &self,
        actor: Actor,
        action: AuditAction,
        file_id: Option<Uuid>,
        details: Option<String>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, actor_kind, action, file_id, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(actor.id)
        .bind(actor.kind)
        .bind(action.as_str())
        .bind(file_id)
        .bind(details)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(
                "Failed to write audit entry action={} actor={}: {}",
                action, actor.id, e
            );
        }
    }

    /// Newest entries first, with actor and file names resolved
    pub async fn list(&self, params: &PaginationQuery) -> Result<(Vec<AuditLogDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                l.id,
                l.actor_id,
                l.actor_kind,
                CASE l.actor_kind
                    WHEN 'user' THEN u.username
                    ELSE a.username
                END AS actor_name,
                l.action,
                l.file_id,
                f.file_name,
                l.details,
                l.created_at
            FROM audit_logs l
            LEFT JOIN user_profiles u ON l.actor_kind = 'user' AND u.id = l.actor_id
            LEFT JOIN admins a ON l.actor_kind = 'admin' AND a.id = l.actor_id
            LEFT JOIN files f ON f.id = l.file_id
            ORDER BY l.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}
