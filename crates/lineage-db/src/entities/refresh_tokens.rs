use sea_orm::entity::prelude::*;

/// One link of a refresh token chain.
///
/// `parent` holds the token string of the predecessor and is `None` for the
/// root of a chain. `revoked` only ever moves from `false` to `true`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    pub instance_id: Uuid,
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub token: String,
    pub parent: Option<String>,
    pub user_id: Uuid,
    pub sso_session_id: Option<Uuid>,
    pub revoked: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::sso_sessions::Entity",
        from = "Column::SsoSessionId",
        to = "super::sso_sessions::Column::Id"
    )]
    SsoSessions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::sso_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SsoSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_root(&self) -> bool {
        self.parent.as_deref().is_none_or(str::is_empty)
    }
}
