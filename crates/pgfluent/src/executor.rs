//! Statement routing: pool checkout per call, or the active transaction
//! connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

use crate::client::GenericClient;
use crate::error::FluentResult;
use crate::qb::statement::CompiledStatement;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe execution seam for the transaction connection.
///
/// Builders created inside a transaction scope hold a trait object rather
/// than the concrete `Transaction<'_>`, which keeps the builder to a single
/// lifetime parameter.
pub(crate) trait TxClient: Send + Sync {
    fn query<'s>(
        &'s self,
        sql: &'s str,
        params: &'s [&'s (dyn ToSql + Sync)],
    ) -> BoxFuture<'s, FluentResult<Vec<Row>>>;

    fn execute<'s>(
        &'s self,
        sql: &'s str,
        params: &'s [&'s (dyn ToSql + Sync)],
    ) -> BoxFuture<'s, FluentResult<u64>>;
}

impl TxClient for deadpool_postgres::Transaction<'_> {
    fn query<'s>(
        &'s self,
        sql: &'s str,
        params: &'s [&'s (dyn ToSql + Sync)],
    ) -> BoxFuture<'s, FluentResult<Vec<Row>>> {
        Box::pin(GenericClient::query(self, sql, params))
    }

    fn execute<'s>(
        &'s self,
        sql: &'s str,
        params: &'s [&'s (dyn ToSql + Sync)],
    ) -> BoxFuture<'s, FluentResult<u64>> {
        Box::pin(GenericClient::execute(self, sql, params))
    }
}

/// Where a compiled statement runs.
#[derive(Clone, Copy)]
pub(crate) enum Target<'a> {
    /// Check a connection out of the pool per call; released on drop.
    Pool(&'a Pool),
    /// The dedicated connection of an active transaction.
    Tx(&'a dyn TxClient),
}

/// Routes compiled statements to their target and emits the optional
/// diagnostic record before execution.
#[derive(Clone)]
pub(crate) struct Executor<'a> {
    target: Target<'a>,
    log_sql: Arc<AtomicBool>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(target: Target<'a>, log_sql: Arc<AtomicBool>) -> Self {
        Self { target, log_sql }
    }

    pub(crate) async fn query(&self, stmt: &CompiledStatement) -> FluentResult<Vec<Row>> {
        self.log(stmt);
        let refs = stmt.params.as_refs();
        match self.target {
            Target::Pool(pool) => {
                let client = pool.get().await?;
                GenericClient::query(&client, &stmt.sql, &refs).await
            }
            Target::Tx(tx) => tx.query(&stmt.sql, &refs).await,
        }
    }

    pub(crate) async fn execute(&self, stmt: &CompiledStatement) -> FluentResult<u64> {
        self.log(stmt);
        let refs = stmt.params.as_refs();
        match self.target {
            Target::Pool(pool) => {
                let client = pool.get().await?;
                GenericClient::execute(&client, &stmt.sql, &refs).await
            }
            Target::Tx(tx) => tx.execute(&stmt.sql, &refs).await,
        }
    }

    fn log(&self, stmt: &CompiledStatement) {
        if self.log_sql.load(Ordering::Relaxed) {
            tracing::debug!(
                target: "pgfluent.sql",
                sql = %normalize_sql(&stmt.sql),
                params = ?stmt.params,
                "executing statement"
            );
        }
    }
}

/// Collapse runs of whitespace so multi-line SQL logs on one line.
pub(crate) fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        let sql = "SELECT *\n  FROM users\n  WHERE id = $1";
        assert_eq!(normalize_sql(sql), "SELECT * FROM users WHERE id = $1");
    }
}
