use crate::error::Result;
use crate::types::{Movie, RatingsTable};
use rusqlite::{params, types::Value, Connection};
use std::path::Path;
use tracing::{info, instrument};

/// SQLite type chosen for a pass-through column after scanning its values.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Destination store. Both tables are written destructive-replace: drop,
/// recreate, insert — no merge, no append.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace the `movies` table with the given rows.
    #[instrument(skip_all, fields(rows = movies.len()))]
    pub fn write_movies(&mut self, movies: &[Movie]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            DROP TABLE IF EXISTS movies;
            CREATE TABLE movies (
                "movieId"    INTEGER,
                "title"      TEXT,
                "genres"     TEXT,
                "year"       REAL,
                "director"   TEXT,
                "plot"       TEXT,
                "box_office" TEXT
            );
            "#,
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO movies (\"movieId\", \"title\", \"genres\", \"year\", \"director\", \"plot\", \"box_office\")
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for movie in movies {
                stmt.execute(params![
                    movie.movie_id,
                    movie.title,
                    movie.genres,
                    movie.year,
                    movie.director,
                    movie.plot,
                    movie.box_office,
                ])?;
            }
        }
        tx.commit()?;
        info!("Wrote {} rows to movies table", movies.len());
        Ok(())
    }

    /// Replace the `ratings` table with the pass-through rows, inferring
    /// each column's affinity from the data the way a dataframe writer
    /// would (INTEGER if every value parses as one, then REAL, else TEXT).
    #[instrument(skip_all, fields(rows = ratings.len()))]
    pub fn write_ratings(&mut self, ratings: &RatingsTable) -> Result<()> {
        let types = infer_column_types(ratings);

        let columns = ratings
            .headers
            .iter()
            .zip(&types)
            .map(|(h, t)| format!("{} {}", quote_ident(h), t.sql_name()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=ratings.headers.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS ratings; CREATE TABLE ratings ({columns});"
        ))?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO ratings VALUES ({placeholders})"))?;
            for row in &ratings.rows {
                let values: Vec<Value> = row
                    .iter()
                    .zip(&types)
                    .map(|(field, ty)| to_sql_value(field, *ty))
                    .collect();
                stmt.execute(rusqlite::params_from_iter(values))?;
            }
        }
        tx.commit()?;
        info!("Wrote {} rows to ratings table", ratings.len());
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Pick the narrowest SQLite affinity every non-empty value in a column
/// fits. Empty cells don't vote; an all-empty column stays TEXT.
fn infer_column_types(table: &RatingsTable) -> Vec<ColumnType> {
    (0..table.headers.len())
        .map(|col| {
            let mut seen = false;
            let mut integer = true;
            let mut real = true;
            for row in &table.rows {
                let field = row.get(col).map(String::as_str).unwrap_or("");
                if field.is_empty() {
                    continue;
                }
                seen = true;
                if field.parse::<i64>().is_err() {
                    integer = false;
                }
                if field.parse::<f64>().is_err() {
                    real = false;
                }
            }
            match (seen, integer, real) {
                (false, _, _) => ColumnType::Text,
                (true, true, _) => ColumnType::Integer,
                (true, false, true) => ColumnType::Real,
                (true, false, false) => ColumnType::Text,
            }
        })
        .collect()
}

fn to_sql_value(field: &str, ty: ColumnType) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    match ty {
        ColumnType::Integer => field
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(field.to_string())),
        ColumnType::Real => field
            .parse::<f64>()
            .map(Value::Real)
            .unwrap_or_else(|_| Value::Text(field.to_string())),
        ColumnType::Text => Value::Text(field.to_string()),
    }
}
