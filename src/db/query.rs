//! Raw parameterized query escape hatch for administrative and debug use.

use rusqlite::types::ValueRef;
use serde_json::{Map, Value};

use super::Database;
use crate::error::DbResult;

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

impl Database {
    /// Run an arbitrary read query with bound parameters and return the
    /// rows as loosely-typed JSON records keyed by column name.
    ///
    /// Parameters are always bound, never interpolated into the SQL text.
    /// Results are not validated against the schema.
    pub fn execute_query(
        &self,
        sql: &str,
        params: &[String],
    ) -> DbResult<Vec<Map<String, Value>>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Map::new();
            for (i, column) in columns.iter().enumerate() {
                record.insert(column.clone(), json_value(row.get_ref(i)?));
            }
            records.push(record);
        }
        Ok(records)
    }
}
