use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sso_providers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub resource_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sso_sessions::Entity")]
    SsoSessions,
}

impl Related<super::sso_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SsoSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
