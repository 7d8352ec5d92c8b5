//! Live database introspection through Diesel.
//!
//! Backends are compiled in with the `mysql` and `postgres` cargo features.
//! Each introspection makes exactly one connection attempt through the r2d2
//! connection manager, bounded by the configured connect timeout. The
//! connection is owned by the introspection call and dropped on every path.

use diesel::sql_types::{Nullable, Text};
use diesel::QueryableByName;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::schema::RawColumn;
use crate::source::{SchemaSource, SourceError};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_DATABASE: &str = "telemedicina";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Database flavour behind a [`DatabaseSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackend {
    Mysql,
    Postgres,
}

impl DatabaseBackend {
    pub fn scheme(&self) -> &'static str {
        match self {
            DatabaseBackend::Mysql => "mysql",
            DatabaseBackend::Postgres => "postgres",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseBackend::Mysql => 3306,
            DatabaseBackend::Postgres => 5432,
        }
    }

    /// Cargo feature that compiles this backend in
    pub fn feature(&self) -> &'static str {
        self.scheme()
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseBackend::Mysql => f.write_str("MySQL"),
            DatabaseBackend::Postgres => f.write_str("PostgreSQL"),
        }
    }
}

/// Connection parameters for the database source
///
/// `url` wins over the individual parts when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

impl DatabaseConfig {
    /// Read connection parameters from the process environment
    ///
    /// `DATABASE_URL`, `MYSQL_HOST`, `MYSQL_PORT`, `MYSQL_DEV_USER`,
    /// `MYSQL_DEV_PASS` and `MYSQL_DB`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DatabaseConfig::from_env`] with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        DatabaseConfig {
            url: lookup("DATABASE_URL"),
            host: lookup("MYSQL_HOST"),
            port: lookup("MYSQL_PORT").and_then(|p| p.parse().ok()),
            user: lookup("MYSQL_DEV_USER"),
            password: lookup("MYSQL_DEV_PASS"),
            database: lookup("MYSQL_DB"),
            connect_timeout_secs: None,
        }
    }

    /// Fill unset fields from the environment
    pub fn or_env(self, backend: DatabaseBackend) -> Self {
        tracing::debug!(backend = %backend, "filling database settings from environment");
        self.or(Self::from_env())
    }

    /// Fill unset fields from `fallback`; set fields are kept
    pub fn or(self, fallback: DatabaseConfig) -> Self {
        DatabaseConfig {
            url: self.url.or(fallback.url),
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
            database: self.database.or(fallback.database),
            connect_timeout_secs: self.connect_timeout_secs.or(fallback.connect_timeout_secs),
        }
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or(DEFAULT_DATABASE)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Connection URL for `backend`
    pub fn connection_url(&self, backend: DatabaseBackend) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let userinfo = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                escape_userinfo(user),
                escape_userinfo(password)
            ),
            (Some(user), None) => format!("{}@", escape_userinfo(user)),
            _ => String::new(),
        };

        format!(
            "{}://{}{}:{}/{}",
            backend.scheme(),
            userinfo,
            self.host(),
            self.port.unwrap_or_else(|| backend.default_port()),
            self.database()
        )
    }
}

/// Percent-encode characters that would break the userinfo part of a URL
fn escape_userinfo(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' | '@' | ':' | '/' | '?' | '#' => escaped.push_str(&format!("%{:02X}", ch as u32)),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// One row of the column introspection query
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ColumnRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    column_type: String,
    #[diesel(sql_type = Text)]
    nullable: String,
    #[diesel(sql_type = Text)]
    column_key: String,
    #[diesel(sql_type = Nullable<Text>)]
    default_value: Option<String>,
    #[diesel(sql_type = Text)]
    extra: String,
    #[diesel(sql_type = Text)]
    comment: String,
}

impl ColumnRow {
    fn into_raw(self) -> RawColumn {
        RawColumn {
            nullable: self.nullable.eq_ignore_ascii_case("YES"),
            is_primary: self.column_key.contains("PRI"),
            auto_increment: self.extra.to_lowercase().contains("auto_increment"),
            name: self.name,
            native_type: Some(self.column_type),
            type_hint: None,
            default_value: self.default_value,
            comment: self.comment,
        }
    }
}

/// Schema source backed by a live database
#[derive(Debug, Clone)]
pub struct DatabaseSource {
    backend: DatabaseBackend,
    config: DatabaseConfig,
}

impl DatabaseSource {
    pub fn new(backend: DatabaseBackend, config: DatabaseConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn introspect(&self, table: &str) -> Result<Vec<ColumnRow>, SourceError> {
        tracing::info!(
            backend = %self.backend,
            host = self.config.host(),
            database = self.config.database(),
            table,
            "introspecting table"
        );

        match self.backend {
            #[cfg(feature = "mysql")]
            DatabaseBackend::Mysql => backend::mysql_columns(
                &self.config.connection_url(self.backend),
                self.config.connect_timeout(),
                table,
            ),
            #[cfg(feature = "postgres")]
            DatabaseBackend::Postgres => backend::postgres_columns(
                &self.config.connection_url(self.backend),
                self.config.connect_timeout(),
                table,
            ),
            #[allow(unreachable_patterns)]
            other => Err(SourceError::Unsupported(format!(
                "{} support was not compiled in (enable the `{}` feature)",
                other,
                other.feature()
            ))),
        }
    }
}

impl SchemaSource for DatabaseSource {
    fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>, SourceError> {
        let rows = self.introspect(table)?;
        columns_from_rows(table, self.config.database(), rows)
    }
}

/// Convert introspection rows; no rows means the table does not exist
fn columns_from_rows(
    table: &str,
    database: &str,
    rows: Vec<ColumnRow>,
) -> Result<Vec<RawColumn>, SourceError> {
    if rows.is_empty() {
        return Err(SourceError::Query(format!(
            "table '{}' does not exist in database '{}'",
            table, database
        )));
    }

    tracing::debug!(table, columns = rows.len(), "read column metadata");
    Ok(rows.into_iter().map(ColumnRow::into_raw).collect())
}

/// Spell PostgreSQL numeric types the way the type mapper recognises them
///
/// `real` becomes `float` and `numeric` becomes `decimal`; everything else is
/// already matched by name (`integer`, `double precision`, `timestamp`, ...).
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
fn postgres_type_spelling(data_type: &str) -> String {
    if let Some(rest) = data_type.strip_prefix("real") {
        format!("float{}", rest)
    } else if let Some(rest) = data_type.strip_prefix("numeric") {
        format!("decimal{}", rest)
    } else {
        data_type.to_string()
    }
}

#[cfg(any(feature = "mysql", feature = "postgres"))]
mod backend {
    use diesel::prelude::*;
    use diesel::r2d2::{ConnectionManager, R2D2Connection};
    use diesel::sql_types::Text;
    use r2d2::ManageConnection;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::ColumnRow;
    use crate::source::SourceError;

    /// Open one connection, attempting exactly once
    ///
    /// The attempt runs on its own thread so it can be abandoned at `timeout`;
    /// a connection that completes after that is dropped when the send fails.
    pub(super) fn connect<C>(url: &str, timeout: Duration) -> Result<C, SourceError>
    where
        C: R2D2Connection + Send + 'static,
    {
        let manager = ConnectionManager::<C>::new(url);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(manager.connect());
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(SourceError::Connection(e.to_string())),
            Err(_) => Err(SourceError::Connection(format!(
                "no connection within {}s",
                timeout.as_secs_f32()
            ))),
        }
    }

    #[cfg(feature = "mysql")]
    const MYSQL_COLUMNS_QUERY: &str = "\
        SELECT COLUMN_NAME AS name, \
               COLUMN_TYPE AS column_type, \
               IS_NULLABLE AS nullable, \
               COLUMN_KEY AS column_key, \
               COLUMN_DEFAULT AS default_value, \
               EXTRA AS extra, \
               COLUMN_COMMENT AS comment \
        FROM information_schema.COLUMNS \
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
        ORDER BY ORDINAL_POSITION";

    #[cfg(feature = "postgres")]
    const POSTGRES_COLUMNS_QUERY: &str = "\
        SELECT c.column_name::text AS name, \
               CASE WHEN c.character_maximum_length IS NULL THEN c.data_type::text \
                    ELSE c.data_type || '(' || c.character_maximum_length || ')' END AS column_type, \
               c.is_nullable::text AS nullable, \
               CASE WHEN pk.column_name IS NULL THEN '' ELSE 'PRI' END AS column_key, \
               c.column_default::text AS default_value, \
               CASE WHEN c.is_identity = 'YES' OR c.column_default LIKE 'nextval(%' \
                    THEN 'auto_increment' ELSE '' END AS extra, \
               COALESCE(col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, \
                                        c.ordinal_position::int), '') AS comment \
        FROM information_schema.columns c \
        LEFT JOIN ( \
            SELECT kcu.table_schema, kcu.table_name, kcu.column_name \
            FROM information_schema.table_constraints tc \
            JOIN information_schema.key_column_usage kcu \
              ON tc.constraint_name = kcu.constraint_name \
             AND tc.table_schema = kcu.table_schema \
            WHERE tc.constraint_type = 'PRIMARY KEY' \
        ) pk ON pk.table_schema = c.table_schema \
            AND pk.table_name = c.table_name \
            AND pk.column_name = c.column_name \
        WHERE c.table_schema = current_schema() AND c.table_name = $1 \
        ORDER BY c.ordinal_position";

    #[cfg(feature = "mysql")]
    pub(super) fn mysql_columns(
        url: &str,
        timeout: Duration,
        table: &str,
    ) -> Result<Vec<ColumnRow>, SourceError> {
        use diesel::mysql::MysqlConnection;

        let mut conn = connect::<MysqlConnection>(url, timeout)?;

        diesel::sql_query(MYSQL_COLUMNS_QUERY)
            .bind::<Text, _>(table)
            .load::<ColumnRow>(&mut conn)
            .map_err(|e| SourceError::Query(format!("failed to read columns of '{}': {}", table, e)))
    }

    #[cfg(feature = "postgres")]
    pub(super) fn postgres_columns(
        url: &str,
        timeout: Duration,
        table: &str,
    ) -> Result<Vec<ColumnRow>, SourceError> {
        use diesel::pg::PgConnection;

        let mut conn = connect::<PgConnection>(url, timeout)?;

        let rows = diesel::sql_query(POSTGRES_COLUMNS_QUERY)
            .bind::<Text, _>(table)
            .load::<ColumnRow>(&mut conn)
            .map_err(|e| SourceError::Query(format!("failed to read columns of '{}': {}", table, e)))?;

        Ok(rows
            .into_iter()
            .map(|mut row| {
                row.column_type = super::postgres_type_spelling(&row.column_type);
                row
            })
            .collect())
    }
}
