pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    register_functions(&conn).context("failed to register sql functions")?;
    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// `ci_contains(haystack, needle)`: substring test that ignores letter case
/// for any script, not just ASCII as `LIKE` does. A NULL haystack never
/// matches.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "ci_contains",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: Option<String> = ctx.get(0)?;
            let needle: String = ctx.get(1)?;
            Ok(haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())))
        },
    )
}
