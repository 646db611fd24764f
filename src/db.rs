use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait,
    sea_query::{Alias, Query},
};
use tokio::fs;

pub const MIGRATIONS_DIR: &str = "migrations";
const MIGRATIONS_TABLE: &str = "schema_migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(10).sqlx_logging(false);
    let conn = Database::connect(opt).await?;
    Ok(conn)
}

/// Applies `migrations/*.sql` that have not been recorded yet and returns how many ran.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<usize> {
    run_migrations_from(conn, Path::new(MIGRATIONS_DIR)).await
}

/// Each file runs in its own transaction, in file-name order, and is recorded in
/// `schema_migrations` on success.
pub async fn run_migrations_from(conn: &DatabaseConnection, dir: &Path) -> Result<usize> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (name TEXT PRIMARY KEY, applied_at TEXT NOT NULL)"
        ),
    ))
    .await?;
    let applied = applied_migrations(conn).await?;

    let mut applied_now = 0;
    for file in migration_files(dir).await? {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .context("migration file name is not valid UTF-8")?
            .to_string();
        if applied.contains(&name) {
            continue;
        }

        let sql = fs::read_to_string(&file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        let txn = conn.begin().await?;
        for stmt in split_statements(&sql) {
            txn.execute(Statement::from_string(backend, stmt))
                .await
                .with_context(|| format!("applying {name}"))?;
        }
        let record = Query::insert()
            .into_table(Alias::new(MIGRATIONS_TABLE))
            .columns([Alias::new("name"), Alias::new("applied_at")])
            .values_panic([name.clone().into(), Utc::now().to_rfc3339().into()])
            .to_owned();
        txn.execute(backend.build(&record)).await?;
        txn.commit().await?;

        tracing::info!(migration = %name, "migration applied");
        applied_now += 1;
    }

    Ok(applied_now)
}

async fn applied_migrations(conn: &DatabaseConnection) -> Result<HashSet<String>> {
    let query = Query::select()
        .column(Alias::new("name"))
        .from(Alias::new(MIGRATIONS_TABLE))
        .to_owned();
    let rows = conn.query_all(conn.get_database_backend().build(&query)).await?;
    rows.iter()
        .map(|row| row.try_get::<String>("", "name").map_err(Into::into))
        .collect()
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Splits a SQL script on top-level `;`.
///
/// Postgres prepared statements take a single command. Semicolons inside
/// quoted strings, quoted identifiers, dollar-quoted bodies and comments do not
/// end a statement. Comments are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            '\'' | '"' => {
                current.push(c);
                i += 1;
                while i < chars.len() {
                    current.push(chars[i]);
                    if chars[i] == c {
                        // doubled quote is an escaped quote
                        if chars.get(i + 1) == Some(&c) {
                            current.push(c);
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
                continue;
            }
            '$' => {
                if let Some(tag_len) = dollar_tag_len(&chars[i..]) {
                    let tag: String = chars[i..i + tag_len].iter().collect();
                    current.push_str(&tag);
                    i += tag_len;
                    let tag_chars: Vec<char> = tag.chars().collect();
                    while i < chars.len() && !chars[i..].starts_with(&tag_chars) {
                        current.push(chars[i]);
                        i += 1;
                    }
                    if i < chars.len() {
                        current.push_str(&tag);
                        i += tag_len;
                    }
                    continue;
                }
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push(c);
        i += 1;
    }
    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim();
    if !stmt.is_empty() {
        statements.push(format!("{stmt};"));
    }
}

/// Length of a `$tag$` opener at the start of `chars`, if there is one.
fn dollar_tag_len(chars: &[char]) -> Option<usize> {
    let end = chars[1..]
        .iter()
        .position(|c| !(c.is_ascii_alphanumeric() || *c == '_'))?
        + 1;
    (chars.get(end) == Some(&'$')).then_some(end + 1)
}
