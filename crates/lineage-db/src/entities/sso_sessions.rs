use sea_orm::entity::prelude::*;

/// Identity-provider login that a refresh token chain was issued under.
///
/// Written once when the root token of a chain is minted and never updated
/// afterwards; the validity window belongs to the chain's origin.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sso_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub sso_provider_id: Uuid,
    pub not_before: DateTimeWithTimeZone,
    pub not_after: DateTimeWithTimeZone,
    pub idp_initiated: bool,
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
        belongs_to = "super::sso_providers::Entity",
        from = "Column::SsoProviderId",
        to = "super::sso_providers::Column::Id"
    )]
    SsoProviders,
    #[sea_orm(has_many = "super::refresh_tokens::Entity")]
    RefreshTokens,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::sso_providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SsoProviders.def()
    }
}

impl Related<super::refresh_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
