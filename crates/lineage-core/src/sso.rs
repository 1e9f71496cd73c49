use lineage_db::entities::{sso_providers, sso_sessions, users};
use sea_orm::prelude::{DateTimeWithTimeZone, Uuid};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};

use crate::error::{Error, Result};

/// Identity-provider facts that justify issuing the root of a chain.
///
/// Only consulted at root issuance. Rotations copy the resulting session id
/// forward and never look at the window again.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantAuthenticatedConditions {
    pub sso_provider_id: Uuid,
    pub not_before: DateTimeWithTimeZone,
    pub not_after: DateTimeWithTimeZone,
    pub initiated_by_provider: bool,
}

/// SSO session a token chain is bound to, with its provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SsoBinding {
    pub session: sso_sessions::Model,
    pub provider: sso_providers::Model,
}

pub(crate) async fn create_session<C>(
    conn: &C,
    user: &users::Model,
    cond: &GrantAuthenticatedConditions,
) -> Result<sso_sessions::Model>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let model = sso_sessions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        sso_provider_id: Set(cond.sso_provider_id),
        not_before: Set(cond.not_before),
        not_after: Set(cond.not_after),
        idp_initiated: Set(cond.initiated_by_provider),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model
        .insert(conn)
        .await
        .map_err(Error::persistence("error creating SSO session for refresh token"))
}

pub(crate) async fn load_binding<C>(conn: &C, session_id: Uuid) -> Result<SsoBinding>
where
    C: ConnectionTrait,
{
    let (session, provider) = sso_sessions::Entity::find_by_id(session_id)
        .find_also_related(sso_providers::Entity)
        .one(conn)
        .await
        .map_err(Error::persistence(
            "error loading SSO session for refresh token after create",
        ))?
        .ok_or_else(|| {
            Error::missing_row(
                "error loading SSO session for refresh token after create",
                format!("sso session {session_id}"),
            )
        })?;

    let provider = provider.ok_or_else(|| {
        Error::missing_row(
            "error loading SSO provider for refresh token after create",
            format!("sso provider {}", session.sso_provider_id),
        )
    })?;

    Ok(SsoBinding { session, provider })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn session_copies_conditions_verbatim() {
        let db = testing::setup().await;
        let user = testing::insert_user(&db, Uuid::new_v4()).await;
        let provider = testing::insert_provider(&db).await;
        let cond = testing::conditions(provider.id);

        let session = create_session(&db, &user, &cond).await.unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.sso_provider_id, provider.id);
        assert_eq!(session.not_before, cond.not_before);
        assert_eq!(session.not_after, cond.not_after);
        assert!(session.idp_initiated);

        let binding = load_binding(&db, session.id).await.unwrap();
        assert_eq!(binding.session, session);
        assert_eq!(binding.provider.id, provider.id);
    }

    #[tokio::test]
    async fn load_binding_fails_for_unknown_session() {
        let db = testing::setup().await;

        let err = load_binding(&db, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(sso_sessions::Entity::find().count(&db).await.unwrap(), 0);
    }
}
