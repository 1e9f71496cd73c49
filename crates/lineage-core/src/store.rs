//! Row-level access to `refresh_tokens`.
//!
//! Functions here never open transactions; they run on whatever connection
//! or transaction the caller hands in.

use lineage_db::entities::{refresh_tokens, users};
use sea_orm::prelude::{DateTimeWithTimeZone, Expr, Uuid};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::error::{Error, Result};

/// Looks up a token by its opaque string.
pub async fn find_refresh_token<C>(conn: &C, token: &str) -> Result<refresh_tokens::Model>
where
    C: ConnectionTrait,
{
    refresh_tokens::Entity::find()
        .filter(refresh_tokens::Column::Token.eq(token))
        .one(conn)
        .await
        .map_err(Error::persistence("error finding refresh token"))?
        .ok_or(Error::RefreshTokenNotFound)
}

/// Resolves a presented token string to its owner and the token row.
pub async fn find_user_with_refresh_token<C>(
    conn: &C,
    token: &str,
) -> Result<(users::Model, refresh_tokens::Model)>
where
    C: ConnectionTrait,
{
    let token = find_refresh_token(conn, token).await?;
    let user = users::Entity::find_by_id(token.user_id)
        .one(conn)
        .await
        .map_err(Error::persistence("error finding user for refresh token"))?
        .ok_or(Error::RefreshTokenNotFound)?;

    Ok((user, token))
}

/// The non-revoked child of `token`, if it has already been rotated.
pub async fn find_valid_child<C>(
    conn: &C,
    token: &refresh_tokens::Model,
) -> Result<Option<refresh_tokens::Model>>
where
    C: ConnectionTrait,
{
    refresh_tokens::Entity::find()
        .filter(refresh_tokens::Column::InstanceId.eq(token.instance_id))
        .filter(refresh_tokens::Column::Parent.eq(token.token.as_str()))
        .filter(refresh_tokens::Column::Revoked.eq(false))
        .order_by_asc(refresh_tokens::Column::Id)
        .one(conn)
        .await
        .map_err(Error::persistence("error finding valid child token"))
}

/// Inserts a new row and returns the id the store assigned to it.
pub(crate) async fn create<C>(conn: &C, token: refresh_tokens::ActiveModel) -> Result<i64>
where
    C: ConnectionTrait,
{
    let res = refresh_tokens::Entity::insert(token)
        .exec(conn)
        .await
        .map_err(Error::persistence("error creating refresh token"))?;
    Ok(res.last_insert_id)
}

pub(crate) async fn find_by_id<C>(conn: &C, id: i64) -> Result<refresh_tokens::Model>
where
    C: ConnectionTrait,
{
    refresh_tokens::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(Error::persistence("error loading refresh token after create"))?
        .ok_or_else(|| {
            Error::missing_row(
                "error loading refresh token after create",
                format!("refresh token {id}"),
            )
        })
}

/// Sets `revoked` on a single row. Returns the number of rows matched, which is
/// 1 for an existing token whether or not it was already revoked.
pub(crate) async fn mark_revoked<C>(conn: &C, token: &refresh_tokens::Model) -> Result<u64>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let res = refresh_tokens::Entity::update_many()
        .col_expr(refresh_tokens::Column::Revoked, Expr::value(true))
        .col_expr(refresh_tokens::Column::UpdatedAt, Expr::value(now))
        .filter(refresh_tokens::Column::Id.eq(token.id))
        .exec(conn)
        .await
        .map_err(Error::persistence("error revoking refresh token"))?;
    Ok(res.rows_affected)
}

/// Revokes `token` only if it is still valid. Returns 0 when another writer got
/// there first or the row is gone, so at most one caller can rotate a token.
pub(crate) async fn revoke_if_valid<C>(conn: &C, token: &refresh_tokens::Model) -> Result<u64>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let res = refresh_tokens::Entity::update_many()
        .col_expr(refresh_tokens::Column::Revoked, Expr::value(true))
        .col_expr(refresh_tokens::Column::UpdatedAt, Expr::value(now))
        .filter(refresh_tokens::Column::Id.eq(token.id))
        .filter(refresh_tokens::Column::Revoked.eq(false))
        .exec(conn)
        .await
        .map_err(Error::persistence("error revoking refresh token"))?;
    Ok(res.rows_affected)
}

/// Deletes every token of `user_id` within `instance_id`.
///
/// This is a hard delete; no revocation flags or audit entries are written.
pub async fn logout<C>(conn: &C, instance_id: Uuid, user_id: Uuid) -> Result<()>
where
    C: ConnectionTrait,
{
    let res = refresh_tokens::Entity::delete_many()
        .filter(refresh_tokens::Column::InstanceId.eq(instance_id))
        .filter(refresh_tokens::Column::UserId.eq(user_id))
        .exec(conn)
        .await
        .map_err(Error::persistence("error deleting refresh tokens"))?;

    tracing::info!(%instance_id, %user_id, deleted = res.rows_affected, "logged out user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn find_refresh_token_reports_missing_token() {
        let db = testing::setup().await;

        let err = find_refresh_token(&db, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn mark_revoked_is_idempotent() {
        let db = testing::setup().await;
        let user = testing::insert_user(&db, Uuid::new_v4()).await;
        let issued = testing::service()
            .grant_authenticated_user(&db, &user, None)
            .await
            .unwrap();

        assert_eq!(mark_revoked(&db, &issued.token).await.unwrap(), 1);
        assert_eq!(mark_revoked(&db, &issued.token).await.unwrap(), 1);
        assert!(testing::reload(&db, &issued.token).await.revoked);
    }

    #[tokio::test]
    async fn revoke_if_valid_only_matches_once() {
        let db = testing::setup().await;
        let user = testing::insert_user(&db, Uuid::new_v4()).await;
        let token = testing::insert_token(&db, &user, None).await;

        assert_eq!(revoke_if_valid(&db, &token).await.unwrap(), 1);
        assert_eq!(revoke_if_valid(&db, &token).await.unwrap(), 0);
        assert!(testing::reload(&db, &token).await.revoked);

        logout(&db, user.instance_id, user.id).await.unwrap();
        assert_eq!(revoke_if_valid(&db, &token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_valid_child_ignores_revoked_children() {
        let db = testing::setup().await;
        let user = testing::insert_user(&db, Uuid::new_v4()).await;
        let svc = testing::service();

        let root = svc.grant_authenticated_user(&db, &user, None).await.unwrap();
        assert!(find_valid_child(&db, &root.token).await.unwrap().is_none());

        let child = svc
            .grant_refresh_token_swap(&db, &user, &root.token)
            .await
            .unwrap();
        let found = find_valid_child(&db, &root.token).await.unwrap().unwrap();
        assert_eq!(found.id, child.token.id);

        mark_revoked(&db, &child.token).await.unwrap();
        assert!(find_valid_child(&db, &root.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_user_with_refresh_token_returns_owner() {
        let db = testing::setup().await;
        let user = testing::insert_user(&db, Uuid::new_v4()).await;
        let issued = testing::service()
            .grant_authenticated_user(&db, &user, None)
            .await
            .unwrap();

        let (owner, token) = find_user_with_refresh_token(&db, &issued.token.token)
            .await
            .unwrap();
        assert_eq!(owner.id, user.id);
        assert_eq!(token.id, issued.token.id);
    }

    #[tokio::test]
    async fn logout_deletes_only_the_scoped_users_tokens() {
        let db = testing::setup().await;
        let instance_id = Uuid::new_v4();
        let user = testing::insert_user(&db, instance_id).await;
        let other = testing::insert_user(&db, instance_id).await;
        let svc = testing::service();

        let t1 = svc.grant_authenticated_user(&db, &user, None).await.unwrap();
        let t2 = svc
            .grant_refresh_token_swap(&db, &user, &t1.token)
            .await
            .unwrap();
        let kept = svc.grant_authenticated_user(&db, &other, None).await.unwrap();

        // Wrong scope leaves everything in place.
        logout(&db, Uuid::new_v4(), user.id).await.unwrap();
        assert!(find_refresh_token(&db, &t1.token.token).await.is_ok());

        logout(&db, instance_id, user.id).await.unwrap();
        for token in [&t1.token.token, &t2.token.token] {
            let err = find_refresh_token(&db, token).await.unwrap_err();
            assert!(err.is_not_found());
        }
        assert!(find_refresh_token(&db, &kept.token.token).await.is_ok());
    }
}
