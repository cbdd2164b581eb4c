//! Catalog schema DDL and the `version_cmp` SQL scalar function.

use mport_schema::Version;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS packages (
    name             TEXT PRIMARY KEY,
    version          TEXT NOT NULL,
    origin           TEXT NOT NULL,
    prefix           TEXT NOT NULL,
    automatic        INTEGER NOT NULL DEFAULT 0,
    locked           INTEGER NOT NULL DEFAULT 0,
    status           TEXT NOT NULL DEFAULT 'dirty',
    os_release       TEXT,
    cpe              TEXT,
    categories_csv   TEXT NOT NULL DEFAULT '',
    install_date     TEXT NOT NULL,
    flatsize         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS assets (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    pkg       TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    kind      TEXT NOT NULL,
    data      TEXT NOT NULL,
    checksum  TEXT,
    owner     TEXT,
    grp       TEXT,
    mode      TEXT
);
CREATE INDEX IF NOT EXISTS idx_assets_pkg ON assets(pkg);

CREATE TABLE IF NOT EXISTS depends (
    pkg             TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    depend_name     TEXT NOT NULL,
    depend_version  TEXT NOT NULL,
    depend_origin   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_depends_pkg ON depends(pkg);
CREATE INDEX IF NOT EXISTS idx_depends_name ON depends(depend_name);

CREATE TABLE IF NOT EXISTS conflicts (
    pkg               TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    conflict_name     TEXT NOT NULL,
    conflict_version  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_conflicts_pkg ON conflicts(pkg);

CREATE TABLE IF NOT EXISTS categories (
    pkg       TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    category  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS moved (
    from_name  TEXT PRIMARY KEY,
    to_name    TEXT,
    move_date  TEXT NOT NULL,
    reason     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS log (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    pkg      TEXT NOT NULL,
    version  TEXT NOT NULL,
    instant  TEXT NOT NULL,
    message  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);
";

/// Run schema migrations (idempotent) and register the `version_cmp`
/// scalar function used by upgrade/autoremove queries.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(DDL)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    register_version_cmp(conn)
}

fn register_version_cmp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "version_cmp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a: String = ctx.get(0)?;
            let b: String = ctx.get(1)?;
            let ordering = Version::parse(&a).cmp(&Version::parse(&b));
            Ok(match ordering {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_cmp_is_usable_from_sql() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let result: i64 = conn
            .query_row("SELECT version_cmp('1.2', '1.10')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(result, -1);
    }
}
