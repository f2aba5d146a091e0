//! Postgres persistence for recovery codes.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};
use uuid::Uuid;

/// Replace the unused recovery codes with a fresh batch, atomically.
///
/// The delete and the inserts share one transaction so a crash can never
/// leave a mix of old and new codes behind. Already-used codes are kept
/// for the retention worker to age out.
///
/// # Errors
/// Returns an error if the transaction fails.
pub(super) async fn replace_recovery_codes(
    pool: &PgPool,
    batch_id: Uuid,
    code_hashes: &[String],
) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin recovery code transaction")?;

    let query = r"
        DELETE FROM admin_recovery_codes
        WHERE used_at IS NULL
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete unused recovery codes")?;

    let query = r"
        INSERT INTO admin_recovery_codes (batch_id, code_hash)
        VALUES ($1, $2)
    ";
    for code_hash in code_hashes {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(batch_id)
            .bind(code_hash)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to insert recovery code hash")?;
    }

    tx.commit()
        .await
        .context("failed to commit recovery code transaction")?;
    Ok(())
}

/// Hashes of all codes that have not been redeemed yet.
///
/// # Errors
/// Returns an error if the query fails.
pub(super) async fn list_unused_code_hashes(pool: &PgPool) -> Result<Vec<String>> {
    let query = r"
        SELECT code_hash
        FROM admin_recovery_codes
        WHERE used_at IS NULL
        ORDER BY id
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list recovery code hashes")?;
    Ok(rows.into_iter().map(|row| row.get("code_hash")).collect())
}

/// Mark a recovery code used, returning whether this call consumed it.
///
/// The `used_at IS NULL` guard makes redemption atomic: two concurrent
/// logins presenting the same code race on this update and exactly one
/// sees a row come back.
///
/// # Errors
/// Returns an error if the update fails.
pub(super) async fn consume_recovery_code(pool: &PgPool, code_hash: &str) -> Result<bool> {
    let query = r"
        UPDATE admin_recovery_codes
        SET used_at = NOW()
        WHERE code_hash = $1
          AND used_at IS NULL
        RETURNING id
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(code_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume recovery code")?;
    Ok(row.is_some())
}

/// Count of codes still available for redemption.
///
/// # Errors
/// Returns an error if the query fails.
pub(super) async fn remaining_count(pool: &PgPool) -> Result<i64> {
    let query = r"
        SELECT COUNT(*) AS remaining
        FROM admin_recovery_codes
        WHERE used_at IS NULL
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count remaining recovery codes")?;
    Ok(row.get("remaining"))
}
