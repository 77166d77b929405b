//! Initial schema: users, group expenses, participants, payments, and the
//! personal transactions ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS group_expense_participants CASCADE;
DROP TABLE IF EXISTS group_expenses CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS split_policy;
",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
CREATE TYPE split_policy AS ENUM ('equal', 'percentage');
CREATE TYPE payment_method AS ENUM ('cash', 'bank_transfer', 'gcash', 'paymaya', 'credit_card');

-- Minimal user profiles; credentials live with the auth collaborator
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(64) NOT NULL UNIQUE,
    email VARCHAR(255) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Shared bills
CREATE TABLE group_expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    total_amount NUMERIC(14, 2) NOT NULL,
    participant_count INTEGER NOT NULL,
    split_policy split_policy NOT NULL,
    owner_share NUMERIC(5, 2),
    other_share NUMERIC(5, 2),
    join_code VARCHAR(6) NOT NULL UNIQUE,
    start_date DATE NOT NULL,
    end_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_total_amount_positive CHECK (total_amount > 0),
    CONSTRAINT chk_participant_count CHECK (participant_count >= 2),
    CONSTRAINT chk_owner_share_range CHECK (owner_share IS NULL OR (owner_share >= 0 AND owner_share <= 100)),
    CONSTRAINT chk_other_share_range CHECK (other_share IS NULL OR (other_share >= 0 AND other_share <= 100))
);

-- Owner listing; join-code lookups ride the UNIQUE index
CREATE INDEX idx_group_expenses_owner ON group_expenses(owner_id, created_at DESC);

-- Joined participants; composite PK rejects duplicate joins
CREATE TABLE group_expense_participants (
    group_expense_id UUID NOT NULL REFERENCES group_expenses(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    joined_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (group_expense_id, user_id)
);

CREATE INDEX idx_participants_user ON group_expense_participants(user_id);

-- Append-only payment ledger
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    group_expense_id UUID NOT NULL REFERENCES group_expenses(id) ON DELETE RESTRICT,
    payer_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    amount NUMERIC(14, 2) NOT NULL,
    method payment_method NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_payments_expense ON payments(group_expense_id, created_at);
CREATE INDEX idx_payments_payer ON payments(payer_id);

-- Personal financial ledger (one row appended per group-expense payment)
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    category VARCHAR(64) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transactions_user ON transactions(user_id, created_at DESC);
";
