use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::db::repository;
use crate::error::AppError;

/// On startup, if there are no users, create the shared admin login.
///
/// Nothing is created when `ADMIN_PASSWORD` is unset; login then stays
/// impossible until a user row exists.
pub async fn bootstrap_admin(db: &SqlitePool, cfg: &Config) -> Result<(), AppError> {
    if repository::count_users(db).await? > 0 {
        return Ok(());
    }

    let Some(password) = cfg.admin_password.as_deref() else {
        warn!("no users exist and ADMIN_PASSWORD is not set; admin login is disabled");
        return Ok(());
    };

    let hash = hash_password(password)?;
    repository::insert_user(db, &cfg.admin_username, &hash).await?;

    info!("bootstrapped admin user '{}'", cfg.admin_username);
    Ok(())
}
