use async_trait::async_trait;
use lineage_db::entities::{audit_log_entries, users};
use sea_orm::prelude::Uuid;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, DbErr, Set};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    TokenRevoked,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::TokenRevoked => "token_revoked",
        }
    }
}

/// Audit sink. Entries are written on the caller's transaction so they commit
/// or roll back together with the token change they describe.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record_event(
        &self,
        tx: &DatabaseTransaction,
        instance_id: Uuid,
        user: &users::Model,
        action: AuditAction,
        meta: Option<serde_json::Value>,
    ) -> Result<(), DbErr>;
}

/// Writes entries to the `audit_log_entries` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLogTable;

#[async_trait]
impl AuditLog for AuditLogTable {
    async fn record_event(
        &self,
        tx: &DatabaseTransaction,
        instance_id: Uuid,
        user: &users::Model,
        action: AuditAction,
        meta: Option<serde_json::Value>,
    ) -> Result<(), DbErr> {
        let model = audit_log_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            instance_id: Set(instance_id),
            user_id: Set(Some(user.id)),
            actor_email: Set(Some(user.email.clone())),
            action: Set(action.as_str().to_string()),
            meta: Set(meta),
            created_at: Set(chrono::Utc::now().into()),
        };

        model.insert(tx).await?;
        Ok(())
    }
}
