//! 1.0.0: core entity tables.

use async_trait::async_trait;
use sqlx::PgPool;

use super::Migration;

/// Creates the four entity tables and their indexes.
///
/// Foreign keys use `ON DELETE SET NULL`: deleting a donor must never
/// cascade into transactions, financial records survive.
pub struct CoreTables;

#[async_trait]
impl Migration for CoreTables {
    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "create campaigns, donors, transactions, and subscriptions"
    }

    async fn up(&self, pool: &PgPool) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS campaigns (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'EUR',
                goal DOUBLE PRECISION,
                show_goal BOOLEAN NOT NULL DEFAULT FALSE,
                amount_type TEXT NOT NULL DEFAULT 'open',
                fixed_amounts JSONB,
                minimum_donation DOUBLE PRECISION NOT NULL DEFAULT 1,
                maximum_donation DOUBLE PRECISION,
                donation_type TEXT NOT NULL DEFAULT 'oneoff',
                theme_color TEXT NOT NULL DEFAULT '#ff9f1c',
                welcome_title TEXT,
                welcome_text TEXT,
                show_return_message BOOLEAN NOT NULL DEFAULT FALSE,
                use_custom_return_url BOOLEAN NOT NULL DEFAULT FALSE,
                custom_return_url TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS donors (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL,
                mode TEXT NOT NULL DEFAULT 'test',
                name TEXT,
                business_name TEXT,
                street TEXT,
                postcode TEXT,
                city TEXT,
                country TEXT,
                customer_id TEXT,
                total_donated DOUBLE PRECISION NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_donors_email_mode
             ON donors (email, mode)",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                id BIGSERIAL PRIMARY KEY,
                value DOUBLE PRECISION NOT NULL,
                currency TEXT NOT NULL DEFAULT 'EUR',
                frequency TEXT NOT NULL DEFAULT '1 month',
                years BIGINT,
                status TEXT NOT NULL DEFAULT 'active',
                transaction_id BIGINT,
                donor_id BIGINT REFERENCES donors(id) ON DELETE SET NULL,
                campaign_id BIGINT REFERENCES campaigns(id) ON DELETE SET NULL,
                customer_id TEXT,
                subscription_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transactions (
                id BIGSERIAL PRIMARY KEY,
                value DOUBLE PRECISION NOT NULL,
                currency TEXT NOT NULL DEFAULT 'EUR',
                status TEXT NOT NULL DEFAULT 'open',
                method TEXT,
                mode TEXT NOT NULL DEFAULT 'test',
                sequence_type TEXT NOT NULL DEFAULT 'oneoff',
                donor_id BIGINT REFERENCES donors(id) ON DELETE SET NULL,
                campaign_id BIGINT REFERENCES campaigns(id) ON DELETE SET NULL,
                subscription_id BIGINT REFERENCES subscriptions(id) ON DELETE SET NULL,
                vendor TEXT NOT NULL DEFAULT 'mollie',
                vendor_payment_id TEXT,
                checkout_url TEXT,
                refunds JSONB,
                message TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_transactions_vendor_payment_id
             ON transactions (vendor_payment_id)
             WHERE vendor_payment_id IS NOT NULL",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_campaign_id
             ON transactions (campaign_id)",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_donor_id
             ON transactions (donor_id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
