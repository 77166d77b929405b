//! `SeaORM` entity definitions.

pub mod group_expense_participants;
pub mod group_expenses;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
