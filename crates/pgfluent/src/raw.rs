//! Raw parameterized SQL pass-through.

use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

use crate::error::{FluentError, FluentResult};
use crate::executor::Executor;
use crate::qb::ParamList;
use crate::qb::statement::CompiledStatement;
use crate::row::FromRow;

/// A raw SQL statement with `$1..$n` placeholders and bind-order parameters.
///
/// Created by `Db::raw` or `TxScope::raw`; the statement runs against the
/// pool or the active transaction connection respectively.
///
/// # Example
///
/// ```ignore
/// let rows = db
///     .raw("SELECT * FROM users WHERE age > $1 AND active = $2")
///     .bind(18i32)
///     .bind(true)
///     .fetch_all()
///     .await?;
/// ```
pub struct RawQuery<'a> {
    executor: Executor<'a>,
    sql: String,
    params: ParamList,
}

impl<'a> RawQuery<'a> {
    pub(crate) fn new(sql: &str, executor: Executor<'a>) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            params: ParamList::new(),
        }
    }

    /// Bind the next positional parameter.
    pub fn bind<T: ToSql + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.params.push(value);
        self
    }

    fn into_statement(self) -> (Executor<'a>, CompiledStatement) {
        (
            self.executor,
            CompiledStatement {
                sql: self.sql,
                params: self.params,
            },
        )
    }

    /// Run the statement and return all rows.
    pub async fn fetch_all(self) -> FluentResult<Vec<Row>> {
        let (executor, stmt) = self.into_statement();
        executor.query(&stmt).await
    }

    /// Run the statement and return the first row; no row is an error.
    pub async fn fetch_one(self) -> FluentResult<Row> {
        let rows = self.fetch_all().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| FluentError::not_found("Expected one row, got none"))
    }

    /// Run the statement and return the first row, if any.
    pub async fn fetch_opt(self) -> FluentResult<Option<Row>> {
        let rows = self.fetch_all().await?;
        Ok(rows.into_iter().next())
    }

    /// Run the statement and map all rows through [`FromRow`].
    pub async fn fetch_all_as<T: FromRow>(self) -> FluentResult<Vec<T>> {
        let rows = self.fetch_all().await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run the statement and return the affected-row count.
    pub async fn execute(self) -> FluentResult<u64> {
        let (executor, stmt) = self.into_statement();
        executor.execute(&stmt).await
    }
}
