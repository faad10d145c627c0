use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::config::AppConfig;

/// Seed the first admin account. Idempotent: if any admin exists nothing is
/// written, and the unique username constraint guards concurrent startups.
pub async fn ensure_default_admin(db: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let existing: Option<i64> =
        sqlx::query_scalar(r#"SELECT id FROM users WHERE role = 'admin' LIMIT 1"#)
            .fetch_optional(db)
            .await?;
    if existing.is_some() {
        return Ok(());
    }

    let hash = hash_password(&config.admin_password)?;
    let inserted = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES ($1, $2, 'admin')
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(&config.admin_username)
    .bind(&hash)
    .execute(db)
    .await?;

    if inserted.rows_affected() > 0 {
        info!(username = %config.admin_username, "default admin account created");
        if config.admin_password == "admin123" {
            warn!("default admin password in use; set BOOTSTRAP_ADMIN_PASSWORD");
        }
    }
    Ok(())
}
