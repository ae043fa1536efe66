//! Transaction scoping: one dedicated connection, commit on `Ok`, rollback
//! and re-raise on `Err`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::FluentResult;
use crate::executor::{Executor, Target, TxClient};
use crate::qb::QueryBuilder;
use crate::raw::RawQuery;

/// The boxed future a transaction unit of work returns.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = FluentResult<T>> + Send + 't>>;

/// Handle to an active transaction, passed to the unit of work.
///
/// Builders and raw statements created through the scope all execute on the
/// transaction's dedicated connection. The scope cannot outlive the
/// transaction; commit, rollback, and connection release are handled by the
/// coordinator on every exit path.
///
/// # Example
///
/// ```ignore
/// let id = db
///     .transaction(|tx| {
///         Box::pin(async move {
///             let id = tx
///                 .table("accounts")
///                 .insert(&Record::new().set("owner", "alice"))
///                 .await?;
///             tx.table("audit_log")
///                 .insert(&Record::new().set("account_id", id))
///                 .await?;
///             Ok(id)
///         })
///     })
///     .await?;
/// ```
pub struct TxScope<'t> {
    tx: &'t dyn TxClient,
    log_sql: Arc<AtomicBool>,
}

impl<'t> TxScope<'t> {
    pub(crate) fn new(tx: &'t dyn TxClient, log_sql: Arc<AtomicBool>) -> Self {
        Self { tx, log_sql }
    }

    /// Create a builder for `table` bound to the transaction connection.
    pub fn table(&self, table: &str) -> QueryBuilder<'t> {
        QueryBuilder::new(
            table,
            Executor::new(Target::Tx(self.tx), self.log_sql.clone()),
        )
    }

    /// Create a raw statement bound to the transaction connection.
    pub fn raw(&self, sql: &str) -> RawQuery<'t> {
        RawQuery::new(sql, Executor::new(Target::Tx(self.tx), self.log_sql.clone()))
    }
}
