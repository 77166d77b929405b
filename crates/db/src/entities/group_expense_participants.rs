//! `SeaORM` Entity for the group_expense_participants join table.
//!
//! The composite primary key makes a duplicate join a constraint
//! violation at the database level.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "group_expense_participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_expense_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub joined_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group_expenses::Entity",
        from = "Column::GroupExpenseId",
        to = "super::group_expenses::Column::Id"
    )]
    GroupExpenses,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::group_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupExpenses.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
