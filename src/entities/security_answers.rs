use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "security_answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// One answer row per user, enforced by a unique index.
    #[sea_orm(unique)]
    pub user_id: i32,

    pub question_id: Option<i32>,

    #[sea_orm(column_type = "String(StringLen::N(200))", nullable)]
    pub answer: Option<String>,

    pub saved_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::security_questions::Entity",
        from = "Column::QuestionId",
        to = "super::security_questions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Question,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::security_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
