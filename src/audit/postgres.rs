use async_trait::async_trait;
use sqlx::PgPool;

use super::{AuditError, AuditRecord, AuditSink};

/// Writes to the `audit_logs` table.
#[derive(Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                user_id,
                action,
                entity_type,
                entity_id,
                old_values,
                new_values,
                ip_address,
                user_agent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.actor_id)
        .bind(record.action.as_str())
        .bind(record.entity_type.as_str())
        .bind(&record.entity_id)
        .bind(&record.old_values)
        .bind(&record.new_values)
        .bind(&record.ip)
        .bind(&record.user_agent)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
