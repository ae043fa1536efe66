//! Row mapping traits and utilities

use crate::error::{FluentError, FluentResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Maps a database row to a Rust value.
///
/// # Example
///
/// ```ignore
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> FluentResult<Self> {
///         Ok(Self {
///             id: row.try_column("id")?,
///             username: row.try_column("username")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> FluentResult<Self>;
}

/// Extension methods for [`Row`] with pgfluent error reporting.
pub trait RowExt {
    /// Get a column by name, mapping failures to [`FluentError::Decode`].
    fn try_column<'a, T>(&'a self, column: &str) -> FluentResult<T>
    where
        T: FromSql<'a>;
}

impl RowExt for Row {
    fn try_column<'a, T>(&'a self, column: &str) -> FluentResult<T>
    where
        T: FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| FluentError::decode(column, e.to_string()))
    }
}
