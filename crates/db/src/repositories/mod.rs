//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod group_expense;
pub mod payment;

pub use group_expense::{
    CreateGroupExpenseInput, GroupExpenseError, GroupExpenseRepository, JoinedGroup,
    UpdateGroupExpenseInput,
};
pub use payment::{PaymentError, PaymentRepository, RecordPaymentInput};
