//! Fixtures shared by the unit tests: an in-memory SQLite store migrated with
//! the production migrations.

use std::path::PathBuf;

use chrono::TimeZone;
use lineage_db::entities::{refresh_tokens, sso_providers, users};
use lineage_migration::Migrator;
use sea_orm::prelude::{DateTimeWithTimeZone, Uuid};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;

use crate::rotation::RefreshTokenService;
use crate::sso::GrantAuthenticatedConditions;
use crate::{RefreshTokenConfig, TokenGenerator, store};

pub(crate) async fn setup() -> DatabaseConnection {
    // A single connection, so every query sees the same in-memory database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// A file-backed store reachable through two pooled connections, for tests
/// that need requests to really overlap. Remove the returned files when done.
pub(crate) async fn setup_shared() -> (DatabaseConnection, Vec<PathBuf>) {
    let path = std::env::temp_dir().join(format!("lineage-{}.db", Uuid::new_v4()));
    let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    opts.max_connections(2).min_connections(2).sqlx_logging(false);

    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let files = ["", "-wal", "-shm"]
        .iter()
        .map(|suffix| PathBuf::from(format!("{}{suffix}", path.display())))
        .collect();
    (db, files)
}

pub(crate) fn service() -> RefreshTokenService {
    RefreshTokenService::new(RefreshTokenConfig::default())
}

pub(crate) async fn insert_user(db: &DatabaseConnection, instance_id: Uuid) -> users::Model {
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let id = Uuid::new_v4();
    users::ActiveModel {
        instance_id: Set(instance_id),
        id: Set(id),
        email: Set(format!("{id}@example.test")),
        last_sign_in_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}

pub(crate) async fn insert_provider(db: &DatabaseConnection) -> sso_providers::Model {
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    sso_providers::ActiveModel {
        id: Set(Uuid::new_v4()),
        resource_id: Set(Some("okta-test".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}

/// Inserts a valid token directly, bypassing rotation, so tests can build
/// chains whose members are all still unrevoked.
pub(crate) async fn insert_token(
    db: &DatabaseConnection,
    user: &users::Model,
    parent: Option<&refresh_tokens::Model>,
) -> refresh_tokens::Model {
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let id = store::create(
        db,
        refresh_tokens::ActiveModel {
            instance_id: Set(user.instance_id),
            id: sea_orm::ActiveValue::NotSet,
            token: Set(crate::SecureTokenGenerator::new(16).generate()),
            parent: Set(parent.map(|p| p.token.clone())),
            user_id: Set(user.id),
            sso_session_id: Set(parent.and_then(|p| p.sso_session_id)),
            revoked: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        },
    )
    .await
    .unwrap();
    store::find_by_id(db, id).await.unwrap()
}

pub(crate) fn conditions(sso_provider_id: Uuid) -> GrantAuthenticatedConditions {
    GrantAuthenticatedConditions {
        sso_provider_id,
        not_before: chrono::Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap().into(),
        not_after: chrono::Utc.with_ymd_and_hms(2026, 1, 1, 20, 0, 0).unwrap().into(),
        initiated_by_provider: true,
    }
}

pub(crate) async fn reload(
    db: &DatabaseConnection,
    token: &refresh_tokens::Model,
) -> refresh_tokens::Model {
    refresh_tokens::Entity::find_by_id(token.id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

pub(crate) async fn reload_user(db: &DatabaseConnection, user: &users::Model) -> users::Model {
    users::Entity::find_by_id(user.id).one(db).await.unwrap().unwrap()
}
