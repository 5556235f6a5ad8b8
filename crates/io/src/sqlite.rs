// Sink backed by the SQLite database the ingestion pipeline produces

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use tracing::debug;

use transit_recon::error::ReconError;
use transit_recon::model::{FieldValue, Row};
use transit_recon::sink::Sink;

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open an existing database read-only. A missing file is an error,
    /// never an empty database.
    pub fn open(path: &Path) -> Result<Self, ReconError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| ReconError::Io(format!("cannot open sink {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "sink opened");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn query(
        &self,
        table: &str,
        sql: &str,
        values: &[&str],
    ) -> Result<Vec<Row>, ReconError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| ReconError::sink(table, e))?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();

        let mut rows = stmt
            .query(params_from_iter(values.iter()))
            .map_err(|e| ReconError::sink(table, e))?;

        let mut out = Vec::new();
        while let Some(r) = rows.next().map_err(|e| ReconError::sink(table, e))? {
            let mut row = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value = r.get_ref(i).map_err(|e| ReconError::sink(table, e))?;
                row.insert(name.clone(), field_value(value));
            }
            out.push(row);
        }
        Ok(out)
    }
}

impl Sink for SqliteSink {
    fn row_count(&self, table: &str) -> Result<u64, ReconError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |r| r.get(0))
            .map_err(|e| ReconError::sink(table, e))?;
        Ok(count.max(0) as u64)
    }

    fn lookup(&self, table: &str, predicate: &[(&str, &str)]) -> Result<Vec<Row>, ReconError> {
        let sql = lookup_sql(table, predicate.iter().map(|(c, _)| *c));
        let values: Vec<&str> = predicate.iter().map(|(_, v)| *v).collect();
        self.query(table, &sql, &values)
    }

    fn table_rows(&self, table: &str) -> Result<Vec<Row>, ReconError> {
        let sql = format!("SELECT * FROM {}", quote_ident(table));
        self.query(table, &sql, &[])
    }
}

/// Double-quote an identifier, doubling embedded quotes. Column names such
/// as `entity.id` are only valid SQL when quoted.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn lookup_sql<'a>(table: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let clauses: Vec<String> = columns
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
        .collect();
    if clauses.is_empty() {
        format!("SELECT * FROM {}", quote_ident(table))
    } else {
        format!(
            "SELECT * FROM {} WHERE {}",
            quote_ident(table),
            clauses.join(" AND ")
        )
    }
}

fn field_value(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(i) => FieldValue::Integer(i),
        ValueRef::Real(f) => FieldValue::Real(f),
        ValueRef::Text(t) => FieldValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => FieldValue::Blob(b.to_vec()),
    }
}
