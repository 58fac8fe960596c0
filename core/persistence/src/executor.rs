use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use dotenv::dotenv;
use r2d2::{CustomizeConnection, Pool, PooledConnection};
use std::env;
use std::io;

pub type InnerConnType = SqliteConnection;
pub type ConnType = PooledConnection<ConnectionManager<InnerConnType>>;
pub type PoolType = Pool<ConnectionManager<InnerConnType>>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database connection error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Database query error: {0}")]
    Diesel(#[from] diesel::result::Error),
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] tokio::task::JoinError),
}

/// Gives a DAO struct access to the connection pool held by [`DbExecutor`].
pub trait AsDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self;
}

/// Applied to every pooled connection. The busy timeout makes concurrent
/// writers queue on the SQLite write lock instead of failing fast, so a
/// losing writer observes the winner's committed state.
#[derive(Clone, Copy, Debug)]
struct ConnectionInit;

impl CustomizeConnection<InnerConnType, diesel::r2d2::Error> for ConnectionInit {
    fn on_acquire(&self, conn: &mut InnerConnType) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 15000; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA journal_mode = WAL; \
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

#[derive(Clone)]
pub struct DbExecutor {
    pub pool: PoolType,
}

impl DbExecutor {
    pub fn new<S: Into<String>>(database_url: S) -> Result<Self, Error> {
        let database_url = database_url.into();
        log::debug!("Connecting to database: {}", database_url);

        let manager = ConnectionManager::new(database_url);
        let pool = Pool::builder()
            .connection_customizer(Box::new(ConnectionInit))
            .build(manager)?;
        Ok(DbExecutor { pool })
    }

    pub fn from_env() -> Result<Self, Error> {
        dotenv().ok();
        let database_url = env::var_os("DATABASE_URL").unwrap_or_default();
        Self::new(database_url.to_string_lossy())
    }

    /// Named in-memory database with a shared cache, so that all pooled
    /// connections see the same data. Intended for tests.
    pub fn in_memory(name: &str) -> Result<Self, Error> {
        Self::new(format!("file:{}?mode=memory&cache=shared", name))
    }

    pub fn conn(&self) -> Result<ConnType, Error> {
        Ok(self.pool.get()?)
    }

    pub fn as_dao<'a, T: AsDao<'a>>(&'a self) -> T {
        AsDao::as_dao(&self.pool)
    }

    pub fn apply_migration<
        T: FnOnce(&ConnType, &mut dyn io::Write) -> Result<(), diesel_migrations::RunMigrationsError>,
    >(
        &self,
        migration: T,
    ) -> anyhow::Result<()> {
        let conn = self.conn()?;
        migration(&conn, &mut io::stdout())?;
        Ok(())
    }

    pub async fn with_transaction<R: Send + 'static, Error, F>(&self, f: F) -> Result<R, Error>
    where
        Error: Send + 'static + From<self::Error> + From<diesel::result::Error>,
        F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
    {
        do_with_transaction(&self.pool, f).await
    }
}

async fn do_with_connection<R: Send + 'static, Error, F>(pool: &PoolType, f: F) -> Result<R, Error>
where
    Error: Send + 'static + From<self::Error>,
    F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
{
    let pool = pool.clone();
    match tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(self::Error::Pool)?;
        f(&conn)
    })
    .await
    {
        Ok(result) => result,
        Err(join_err) => Err(self::Error::RuntimeError(join_err).into()),
    }
}

/// Runs the closure on the blocking thread pool, wrapped in a single SQL
/// transaction. Any error returned from the closure rolls the whole unit back.
pub async fn do_with_transaction<R: Send + 'static, Error, F>(
    pool: &PoolType,
    f: F,
) -> Result<R, Error>
where
    Error: Send + 'static + From<self::Error> + From<diesel::result::Error>,
    F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
{
    use diesel::Connection;
    do_with_connection(pool, move |conn| conn.transaction(|| f(conn))).await
}

/// Like [`do_with_transaction`], but for read-only access.
///
/// The closure still runs inside a transaction so that multi-statement reads
/// observe a consistent snapshot.
pub async fn readonly_transaction<R: Send + 'static, Error, F>(
    pool: &PoolType,
    f: F,
) -> Result<R, Error>
where
    Error: Send + 'static + From<self::Error> + From<diesel::result::Error>,
    F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
{
    use diesel::Connection;
    do_with_connection(pool, move |conn| conn.transaction(|| f(conn))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::dsl::sql;
    use diesel::sql_types::BigInt;
    use diesel::RunQueryDsl;

    fn row_count(conn: &ConnType) -> i64 {
        diesel::select(sql::<BigInt>("(SELECT COUNT(*) FROM t)"))
            .get_result(conn)
            .unwrap()
    }

    #[tokio::test]
    async fn test_failed_transaction_rolls_back() {
        let db = DbExecutor::in_memory("executor-rollback").unwrap();
        db.conn()
            .unwrap()
            .batch_execute("CREATE TABLE t (x INTEGER);")
            .unwrap();

        let result: Result<(), Error> = do_with_transaction(&db.pool, |conn| {
            conn.batch_execute("INSERT INTO t (x) VALUES (1);")?;
            Err(Error::Diesel(diesel::result::Error::RollbackTransaction))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(row_count(&db.conn().unwrap()), 0);

        let inserted: Result<(), Error> = do_with_transaction(&db.pool, |conn| {
            conn.batch_execute("INSERT INTO t (x) VALUES (1);")?;
            Ok(())
        })
        .await;
        assert!(inserted.is_ok());
        assert_eq!(row_count(&db.conn().unwrap()), 1);
    }
}
