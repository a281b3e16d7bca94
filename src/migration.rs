//! Schema for the brokers table
//!
//! Idempotent: safe to run on every start.

use active_model::{Database, ModelError};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS corretores (
    id BIGSERIAL PRIMARY KEY,
    cpf VARCHAR(11) NOT NULL UNIQUE,
    creci VARCHAR(15) NOT NULL UNIQUE,
    name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
)
"#;

const TRIGGER_FUNCTION_SQL: &str = r#"
CREATE OR REPLACE FUNCTION corretores_touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ language 'plpgsql';
"#;

const TRIGGER_SQL: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_trigger WHERE tgname = 'corretores_updated_at') THEN
        CREATE TRIGGER corretores_updated_at
        BEFORE UPDATE ON corretores
        FOR EACH ROW
        EXECUTE FUNCTION corretores_touch_updated_at();
    END IF;
END $$
"#;

/// Create the table and its `updated_at` trigger when missing
pub async fn run(db: &Database) -> Result<(), ModelError> {
    for (step, sql) in [
        ("create table", CREATE_TABLE_SQL),
        ("trigger function", TRIGGER_FUNCTION_SQL),
        ("trigger", TRIGGER_SQL),
    ] {
        tracing::debug!(step, "running migration step");
        sqlx::query(sql)
            .execute(db.pool())
            .await
            .map_err(|e| ModelError::query("corretores", "migrate", e))?;
    }

    tracing::info!("corretores schema ready");
    Ok(())
}
