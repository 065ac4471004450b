//! User account command handlers

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

pub async fn cmd_user_add(
    config: &Config,
    username: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, Arc::new(config.clone()));

    let user = auth.create_user(username, password, admin).await?;

    println!(
        "Created user {} (id {}){}",
        user.username,
        user.id,
        if user.is_admin { " with admin access" } else { "" }
    );
    Ok(())
}

pub async fn cmd_user_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<50}", "");
    for user in users {
        let role = if user.is_admin { "admin" } else { "member" };
        println!("{:>4}  {:<24} {}", user.id, user.username, role);
    }

    Ok(())
}
