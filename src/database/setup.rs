use anyhow::{Context, Result};
use rusqlite::Connection;

const TABLES: [&str; 3] = ["match_outcomes", "cooldowns", "ratings"];

/// Creates any missing tables; existing data is kept
pub fn init_database(conn: &Connection) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for (idx, statement) in statements.iter().enumerate() {
        execute_sql(conn, statement)
            .with_context(|| format!("Failed to execute statement {}", idx + 1))?;
    }

    log::info!("Database schema ready");
    Ok(())
}

/// Drops every rating table and recreates the schema
pub fn reset_database(conn: &Connection) -> Result<()> {
    for table in TABLES {
        execute_sql(conn, &format!("DROP TABLE IF EXISTS {}", table))
            .with_context(|| format!("Failed to drop table {}", table))?;
    }

    init_database(conn)?;
    log::info!("Database schema reset successfully");
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute_sql(conn: &Connection, sql: &str) -> Result<()> {
    conn.execute(sql, [])
        .context("Failed to execute SQL statement")
        .map(|_| ())
}
