//! Postgres database clients.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
///
/// Every operation runs in a [`connection::Pooled`] connection checked out
/// for its duration only.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to check connections out from.
    pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn new(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Checks a [`connection::Pooled`] connection out of the pool.
    ///
    /// # Errors
    ///
    /// If the pool fails to provide a connection.
    pub(crate) async fn checkout(
        &self,
    ) -> Result<connection::Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.checkout()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.checkout()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.checkout()
            .await
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Transactional Postgres database client.
///
/// Clones share the same [`connection::Transaction`].
#[derive(Clone, Debug)]
pub struct Tx(Arc<RwLock<Option<connection::Transaction>>>);

impl Tx {
    /// Begins a new transaction in a connection checked out by the provided
    /// [`NonTx`] client.
    ///
    /// # Errors
    ///
    /// If failed to check out a connection or to begin the transaction.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.checkout().await.map_err(tracerr::wrap!())?;
        let tx = connection::Transaction::begin(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self(Arc::new(RwLock::new(Some(tx)))))
    }

    /// Returns the [`connection::Transaction`] of this [`Tx`] client, unless
    /// it has been committed.
    async fn transaction(
        &self,
    ) -> Result<
        RwLockReadGuard<'_, connection::Transaction>,
        Traced<database::Error>,
    > {
        RwLockReadGuard::try_map(self.0.read().await, Option::as_ref)
            .map_err(|_| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)
    }

    /// Commits this [`Tx`] client.
    ///
    /// Committing an already committed [`Tx`] client is a no-op.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self.0.write().await.take();
        if let Some(tx) = tx {
            tx.commit().await.map_err(tracerr::wrap!())
        } else {
            Ok(())
        }
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.transaction()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.transaction()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.transaction()
            .await
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
