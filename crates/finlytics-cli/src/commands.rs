//! Command implementations for the Finlytics CLI

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use finlytics_core::db::Database;
use finlytics_server::ServerConfig;

/// Open the database, encrypted unless --no-encrypt was passed
pub fn open_db(path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = path
        .to_str()
        .context("Database path is not valid UTF-8")?;

    let db = if no_encrypt {
        Database::new_unencrypted(path_str)?
    } else {
        Database::new(path_str)?
    };
    Ok(db)
}

/// Initialize (create and migrate) the database
pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    info!("Database initialized at {}", db.path());

    if no_encrypt {
        println!("⚠️  Database created WITHOUT encryption (--no-encrypt).");
    } else {
        println!("🔒 Database created with SQLCipher encryption.");
    }
    println!("Database ready: {}", db.path());
    Ok(())
}

/// Start the web server
pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_encrypt: bool,
    static_dir: Option<&Path>,
    cors_origins: Vec<String>,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let static_dir = static_dir.and_then(Path::to_str);
    let config = ServerConfig {
        allowed_origins: cors_origins,
    };

    finlytics_server::serve_with_config(db, host, port, static_dir, config).await
}

/// Show database status
pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let conn = db.conn()?;

    let count = |table: &str| -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    };

    let users = count("users")?;
    let transactions = count("transactions")?;
    let categories = count("categories")?;
    let balances = count("monthly_balances")?;
    let sessions = count("sessions")?;

    let size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let encrypted = db.is_encrypted().unwrap_or(false);

    println!("Database: {}", db.path());
    println!("  Encrypted:        {}", if encrypted { "yes" } else { "no" });
    println!("  Size:             {:.1} KB", size as f64 / 1024.0);
    println!("  Users:            {}", users);
    println!("  Transactions:     {}", transactions);
    println!("  Categories:       {}", categories);
    println!("  Monthly balances: {}", balances);
    println!("  Active sessions:  {}", sessions);

    Ok(())
}
