use lineage_db::entities::refresh_tokens;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, DbBackend, EntityName, Statement, Value};

use crate::error::{Error, Result};
use crate::store;

/// Revokes every descendant of `token`: children, grandchildren and so on.
///
/// `token` itself is left as it is. The closure is computed and applied in a
/// single statement, so a descendant committed before the statement runs is
/// always included. Finding no descendants is not an error.
pub async fn revoke_token_family<C>(conn: &C, token: &refresh_tokens::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let stmt = revoke_family_statement(conn.get_database_backend(), token);
    let res = conn
        .execute(stmt)
        .await
        .map_err(Error::persistence("error revoking refresh token family"))?;

    tracing::debug!(
        token_id = token.id,
        user_id = %token.user_id,
        rows_affected = res.rows_affected(),
        "revoked refresh token family"
    );
    Ok(())
}

/// The still-valid child of `token`, i.e. proof that `token` was already rotated.
pub async fn get_valid_child_token<C>(
    conn: &C,
    token: &refresh_tokens::Model,
) -> Result<refresh_tokens::Model>
where
    C: ConnectionTrait,
{
    store::find_valid_child(conn, token)
        .await?
        .ok_or(Error::RefreshTokenNotFound)
}

fn revoke_family_statement(backend: DbBackend, token: &refresh_tokens::Model) -> Statement {
    let param = |n: usize| match backend {
        DbBackend::Postgres => format!("${n}"),
        _ => "?".to_string(),
    };
    let table = refresh_tokens::Entity.table_name();

    // UNION (not UNION ALL) keeps the walk finite even if the parent links loop.
    let sql = format!(
        "WITH RECURSIVE token_family AS ( \
            SELECT id, token FROM {table} WHERE parent = {p1} AND instance_id = {p2} \
            UNION \
            SELECT r.id, r.token FROM {table} r INNER JOIN token_family t ON t.token = r.parent \
        ) \
        UPDATE {table} SET revoked = {p3}, updated_at = {p4} \
        WHERE id IN (SELECT id FROM token_family)",
        p1 = param(1),
        p2 = param(2),
        p3 = param(3),
        p4 = param(4),
    );

    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let values: [Value; 4] = [
        token.token.clone().into(),
        token.instance_id.into(),
        true.into(),
        now.into(),
    ];
    Statement::from_sql_and_values(backend, sql, values)
}
