use std::sync::Arc;

use lineage_db::entities::{refresh_tokens, users};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, DatabaseTransaction, Set, TransactionTrait};

use crate::audit::{AuditAction, AuditLog, AuditLogTable};
use crate::config::RefreshTokenConfig;
use crate::error::{Error, Result};
use crate::family;
use crate::sso::{self, GrantAuthenticatedConditions, SsoBinding};
use crate::store;
use crate::token::{SecureTokenGenerator, TokenGenerator};
use crate::users::{UserDirectory, UserTable};

/// A freshly minted token as stored, with its SSO binding when the chain has one.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token: refresh_tokens::Model,
    pub sso: Option<SsoBinding>,
}

enum Exchange {
    Issued(IssuedToken),
    Reused(refresh_tokens::Model),
}

/// Issues and rotates refresh tokens.
///
/// Holds no state besides its collaborators; every call works against the
/// connection it is given.
#[derive(Clone)]
pub struct RefreshTokenService {
    config: RefreshTokenConfig,
    generator: Arc<dyn TokenGenerator>,
    audit: Arc<dyn AuditLog>,
    users: Arc<dyn UserDirectory>,
}

impl RefreshTokenService {
    pub fn new(config: RefreshTokenConfig) -> Self {
        Self {
            generator: Arc::new(SecureTokenGenerator::new(config.token_bytes)),
            audit: Arc::new(AuditLogTable),
            users: Arc::new(UserTable),
            config,
        }
    }

    pub fn with_token_generator(mut self, generator: impl TokenGenerator + 'static) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn with_audit_log(mut self, audit: impl AuditLog + 'static) -> Self {
        self.audit = Arc::new(audit);
        self
    }

    pub fn with_user_directory(mut self, users: impl UserDirectory + 'static) -> Self {
        self.users = Arc::new(users);
        self
    }

    pub fn config(&self) -> &RefreshTokenConfig {
        &self.config
    }

    /// Mints the root of a new chain at sign-in.
    ///
    /// With `conditions`, an SSO session is created first and the chain is
    /// bound to it for its whole life.
    pub async fn grant_authenticated_user<C>(
        &self,
        conn: &C,
        user: &users::Model,
        conditions: Option<&GrantAuthenticatedConditions>,
    ) -> Result<IssuedToken>
    where
        C: TransactionTrait,
    {
        let tx = conn
            .begin()
            .await
            .map_err(Error::persistence("error starting transaction"))?;
        let result = self.create_refresh_token(&tx, user, None, conditions).await;
        finish(tx, result).await
    }

    /// Revokes `old` and issues its child in one transaction.
    ///
    /// Steps run in order: audit entry, revoke `old`, create the child, update
    /// the user's last sign-in. The child inherits `old`'s SSO session as is;
    /// the session window is not checked again here.
    pub async fn grant_refresh_token_swap<C>(
        &self,
        conn: &C,
        user: &users::Model,
        old: &refresh_tokens::Model,
    ) -> Result<IssuedToken>
    where
        C: TransactionTrait,
    {
        let tx = conn
            .begin()
            .await
            .map_err(Error::persistence("error starting transaction"))?;
        let result = self.swap(&tx, user, old).await;
        finish(tx, result).await
    }

    /// Handles a presented refresh token string end to end.
    ///
    /// Lookup, revocation check and rotation share one transaction, and the old
    /// token is only revoked if it is still valid, so concurrent exchanges of
    /// the same token cannot both mint a child. A token that is already revoked
    /// (or loses that race) counts as reused: the attempt is rolled back and,
    /// with rotation enabled, its descendants are revoked.
    pub async fn exchange_refresh_token<C>(&self, conn: &C, token: &str) -> Result<IssuedToken>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let tx = conn
            .begin()
            .await
            .map_err(Error::persistence("error starting transaction"))?;

        let reused = match self.exchange(&tx, token).await {
            Ok(Exchange::Issued(issued)) => return finish(tx, Ok(issued)).await,
            Ok(Exchange::Reused(reused)) => reused,
            Err(err) => return finish(tx, Err(err)).await,
        };
        tx.rollback()
            .await
            .map_err(Error::persistence("error rolling back transaction"))?;

        tracing::warn!(
            token_id = reused.id,
            user_id = %reused.user_id,
            rotation_enabled = self.config.rotation_enabled,
            "revoked refresh token presented again"
        );
        if self.config.rotation_enabled {
            family::revoke_token_family(conn, &reused).await?;
        }
        Err(Error::RefreshTokenReused)
    }

    async fn exchange(&self, tx: &DatabaseTransaction, token: &str) -> Result<Exchange> {
        let (user, token) = store::find_user_with_refresh_token(tx, token).await?;
        if token.revoked {
            return Ok(Exchange::Reused(token));
        }

        self.record_revocation(tx, &user).await?;

        if store::revoke_if_valid(tx, &token).await? == 0 {
            // Rotated by a concurrent exchange, or deleted by a logout.
            let current = store::find_refresh_token(tx, &token.token).await?;
            return Ok(Exchange::Reused(current));
        }

        self.create_refresh_token(tx, &user, Some(&token), None)
            .await
            .map(Exchange::Issued)
    }

    async fn record_revocation(&self, tx: &DatabaseTransaction, user: &users::Model) -> Result<()> {
        self.audit
            .record_event(tx, user.instance_id, user, AuditAction::TokenRevoked, None)
            .await
            .map_err(Error::persistence("error creating audit log entry"))
    }

    async fn swap(
        &self,
        tx: &DatabaseTransaction,
        user: &users::Model,
        old: &refresh_tokens::Model,
    ) -> Result<IssuedToken> {
        self.record_revocation(tx, user).await?;

        // A concurrent logout may have deleted the row; do not hang a child off it.
        if store::mark_revoked(tx, old).await? == 0 {
            return Err(Error::RefreshTokenNotFound);
        }

        self.create_refresh_token(tx, user, Some(old), None).await
    }

    async fn create_refresh_token(
        &self,
        tx: &DatabaseTransaction,
        user: &users::Model,
        old: Option<&refresh_tokens::Model>,
        conditions: Option<&GrantAuthenticatedConditions>,
    ) -> Result<IssuedToken> {
        let sso_session_id = match (old, conditions) {
            (Some(old), _) => old.sso_session_id,
            (None, Some(cond)) => Some(sso::create_session(tx, user, cond).await?.id),
            (None, None) => None,
        };

        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let id = store::create(
            tx,
            refresh_tokens::ActiveModel {
                instance_id: Set(user.instance_id),
                id: NotSet,
                token: Set(self.generator.generate()),
                parent: Set(old.map(|t| t.token.clone())),
                user_id: Set(user.id),
                sso_session_id: Set(sso_session_id),
                revoked: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
            },
        )
        .await?;

        // Re-read so store-assigned columns are populated.
        let token = store::find_by_id(tx, id).await?;
        let sso = match token.sso_session_id {
            Some(session_id) => Some(sso::load_binding(tx, session_id).await?),
            None => None,
        };

        self.users
            .update_last_sign_in_at(tx, user)
            .await
            .map_err(Error::persistence("error updating user's last_sign_in_at"))?;

        tracing::debug!(
            instance_id = %token.instance_id,
            user_id = %token.user_id,
            token_id = token.id,
            rotated_from = old.map(|t| t.id),
            sso_session_id = ?token.sso_session_id,
            "issued refresh token"
        );

        Ok(IssuedToken { token, sso })
    }
}

impl Default for RefreshTokenService {
    fn default() -> Self {
        Self::new(RefreshTokenConfig::default())
    }
}

/// Commits on success. On failure rolls back and hands the original error back.
async fn finish<T>(tx: DatabaseTransaction, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(Error::persistence("error committing transaction"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(%rollback_err, %err, "failed to roll back transaction");
            }
            Err(err)
        }
    }
}
