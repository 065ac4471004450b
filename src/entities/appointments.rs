use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub start_date: DateTimeUtc,

    /// Refreshed on every save.
    pub book_date: DateTimeUtc,

    #[sea_orm(column_type = "String(StringLen::N(200))", nullable)]
    pub msg_text: Option<String>,

    pub user_id: Option<i32>,
}

impl Model {
    /// An appointment is open when nobody owns it and it starts after `now`.
    #[must_use]
    pub fn is_open_for_booking(&self, now: DateTimeUtc) -> bool {
        self.user_id.is_none() && self.start_date > now
    }

    #[must_use]
    pub fn give_message(&self) -> String {
        self.msg_text.clone().unwrap_or_default()
    }
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
