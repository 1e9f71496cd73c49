use async_trait::async_trait;
use lineage_db::entities::users;
use sea_orm::prelude::{DateTimeWithTimeZone, Expr};
use sea_orm::{ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter};

/// Last-sign-in bookkeeping owned by the user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn update_last_sign_in_at(
        &self,
        tx: &DatabaseTransaction,
        user: &users::Model,
    ) -> Result<(), DbErr>;
}

/// Updates `users.last_sign_in_at` in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserTable;

#[async_trait]
impl UserDirectory for UserTable {
    async fn update_last_sign_in_at(
        &self,
        tx: &DatabaseTransaction,
        user: &users::Model,
    ) -> Result<(), DbErr> {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        users::Entity::update_many()
            .col_expr(users::Column::LastSignInAt, Expr::value(now))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .exec(tx)
            .await?;
        Ok(())
    }
}
