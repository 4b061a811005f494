//! Blocking access to the database.
//!
//! [`Session`] owns a small Tokio runtime and a single cached connection.
//! Every operation drives its future to completion with `block_on`, so the
//! caller resumes exactly once, after the driver has finished (for selects:
//! after the last row has been read or the query has failed).

use sea_orm::{
    ConnAcquireErr, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr,
    FromQueryResult, Statement, StatementBuilder,
    sea_query::{
        DeleteStatement, InsertStatement, IntoTableRef, SelectStatement, Table,
        TableCreateStatement, TableDropStatement, UpdateStatement,
    },
};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::{DbError, DbResult, QueryKind},
    models::Row,
    pool::PoolBuilder,
};

/// A statement the session can run, tagged with what it is for error reporting.
pub trait Query: StatementBuilder {
    fn kind(&self) -> QueryKind;
}

impl Query for InsertStatement {
    fn kind(&self) -> QueryKind {
        QueryKind::Insert
    }
}

impl Query for UpdateStatement {
    fn kind(&self) -> QueryKind {
        QueryKind::Update
    }
}

impl Query for DeleteStatement {
    fn kind(&self) -> QueryKind {
        QueryKind::Delete
    }
}

impl Query for TableCreateStatement {
    fn kind(&self) -> QueryKind {
        QueryKind::CreateTable
    }
}

impl Query for TableDropStatement {
    fn kind(&self) -> QueryKind {
        QueryKind::DropTable
    }
}

pub struct Session {
    runtime: Runtime,
    /// Absent when the session was opened on an existing connection.
    pools: Option<PoolBuilder>,
    connection: Option<DatabaseConnection>,
}

impl Session {
    /// Lazy: the connection file is read on first use.
    pub fn new(settings: &Settings) -> DbResult<Self> {
        let pools = PoolBuilder::new(
            settings.connection_file.clone(),
            settings.charset.clone(),
            settings.selector,
        );
        Ok(Self { runtime: runtime()?, pools: Some(pools), connection: None })
    }

    pub fn open(options: ConnectOptions) -> DbResult<Self> {
        let runtime = runtime()?;
        let conn = runtime.block_on(Database::connect(options)).map_err(DbError::Connect)?;
        Ok(Self::attach(runtime, conn))
    }

    #[cfg(test)]
    pub fn with_connection(conn: DatabaseConnection) -> DbResult<Self> {
        Ok(Self::attach(runtime()?, conn))
    }

    fn attach(runtime: Runtime, conn: DatabaseConnection) -> Self {
        Self { runtime, pools: None, connection: Some(conn) }
    }

    /// Returns the session's connection, establishing it on first call.
    /// A failed attempt caches nothing; the next call tries again.
    pub fn get_connection(&mut self) -> DbResult<&DatabaseConnection> {
        self.ready().map(|(_, conn)| conn)
    }

    pub fn create_table(&mut self, table: &TableCreateStatement) -> DbResult<()> {
        self.execute(table).map(|_| ())
    }

    pub fn drop_table<T: IntoTableRef>(&mut self, table: T) -> DbResult<u64> {
        self.execute(&Table::drop().table(table).if_exists().to_owned())
    }

    /// Runs a DDL or DML statement and returns the number of affected rows.
    pub fn execute<Q: Query>(&mut self, query: &Q) -> DbResult<u64> {
        let kind = query.kind();
        let (runtime, conn) = self.ready()?;
        let stmt = conn.get_database_backend().build(query);
        exec(runtime, conn, stmt, kind)
    }

    /// Runs literal SQL. Errors are named after the statement's first keyword.
    #[allow(dead_code)] // for statements the query builders don't cover
    pub fn execute_raw(&mut self, sql: &str) -> DbResult<u64> {
        let kind = QueryKind::raw(sql);
        let (runtime, conn) = self.ready()?;
        let stmt = Statement::from_string(conn.get_database_backend(), sql.to_string());
        exec(runtime, conn, stmt, kind)
    }

    /// Reads every row of `query`, then hands them to `on_rows`.
    ///
    /// `on_rows` is called once per successful query, with an empty `Vec`
    /// when nothing matched. It is not called when the query fails.
    pub fn execute_select<R>(
        &mut self,
        query: &SelectStatement,
        on_rows: impl FnOnce(Vec<Row>) -> R,
    ) -> DbResult<R> {
        let (runtime, conn) = self.ready()?;
        let stmt = conn.get_database_backend().build(query);

        let rows = runtime
            .block_on(async {
                let results = conn.query_all(stmt).await?;
                results
                    .iter()
                    .map(|res| Row::from_query_result(res, ""))
                    .collect::<Result<Vec<_>, DbErr>>()
            })
            .map_err(DbError::query(QueryKind::Select))?;

        debug!(rows = rows.len(), "select finished");
        Ok(on_rows(rows))
    }

    /// Connects if needed, then lends out the runtime and the connection together.
    fn ready(&mut self) -> DbResult<(&Runtime, &DatabaseConnection)> {
        let conn = match self.connection.take() {
            Some(conn) => conn,
            None => connect(&self.runtime, self.pools.as_mut())?,
        };
        Ok((&self.runtime, &*self.connection.insert(conn)))
    }
}

fn connect(runtime: &Runtime, pools: Option<&mut PoolBuilder>) -> DbResult<DatabaseConnection> {
    // An attached connection is never dropped, so this only guards a closed one.
    let pools = pools.ok_or(DbError::Connect(DbErr::ConnectionAcquire(
        ConnAcquireErr::ConnectionClosed,
    )))?;
    let pool = pools.build()?.clone();
    debug!(
        pool = %pool,
        strategy = ?pool.strategy(),
        file = %pools.connection_file().display(),
        "connecting to database"
    );
    let conn = runtime.block_on(pool.connect()).inspect_err(|err| {
        warn!(error = %err, "failed to connect to database");
    })?;
    info!("connected to database");
    Ok(conn)
}

fn exec(
    runtime: &Runtime,
    conn: &DatabaseConnection,
    stmt: Statement,
    kind: QueryKind,
) -> DbResult<u64> {
    let result = runtime.block_on(conn.execute(stmt)).map_err(DbError::query(kind.clone()))?;
    debug!(kind = %kind, rows_affected = result.rows_affected(), "statement executed");
    Ok(result.rows_affected())
}

fn runtime() -> DbResult<Runtime> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("filme-db")
        .enable_all()
        .build()?;
    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use serde_json::Value as JsonValue;

    use super::*;
    use crate::{
        entities::elenco,
        pool::{PoolStrategy, StrategySelector},
        schema,
    };

    fn credit(ator: &str, titulo: &str, ano: i32) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("ator", Value::from(ator)),
            ("titulo", Value::from(titulo)),
            ("ano", Value::from(ano)),
        ])
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult { last_insert_id: 0, rows_affected }
    }

    fn unreachable_settings(dir: &tempfile::TempDir) -> Settings {
        Settings {
            database_url: None,
            connection_file: dir.path().join("connection.json"),
            charset: None,
            selector: StrategySelector::Fixed(PoolStrategy::Url),
            reset: false,
        }
    }

    fn select_credits() -> SelectStatement {
        sea_orm::sea_query::Query::select()
            .column(elenco::Column::Ator)
            .from(elenco::Entity)
            .to_owned()
    }

    #[test]
    fn connection_is_reused() {
        let conn = MockDatabase::new(DatabaseBackend::MySql).into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        let first: *const DatabaseConnection = session.get_connection().unwrap();
        let second: *const DatabaseConnection = session.get_connection().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn attached_session_has_no_pool_builder() {
        let conn = MockDatabase::new(DatabaseBackend::MySql).into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        assert!(session.pools.is_none());
        assert!(session.get_connection().is_ok());
    }

    #[test]
    fn statements_and_selects_share_the_connection() {
        let conn = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([exec_result(1)])
            .append_query_results([vec![credit("Ana", "Filme B", 2023)]])
            .into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        assert_eq!(session.execute(&crate::driver::delete_cast_member(4)).unwrap(), 1);
        let rows = session.execute_select(&select_credits(), |rows| rows).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_by_name("titulo"), Some(&JsonValue::from("Filme B")));
    }

    #[test]
    fn execute_reports_rows_affected() {
        let conn = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([exec_result(0), exec_result(3)])
            .into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        session.create_table(&schema::create_filme()).unwrap();
        assert_eq!(session.execute_raw("DELETE FROM filme").unwrap(), 3);
    }

    #[test]
    fn failed_statement_names_its_kind() {
        let conn = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_errors([DbErr::Custom("table exists".into())])
            .into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        let err = session.create_table(&schema::create_elenco()).unwrap_err();
        assert!(matches!(err, DbError::Query { kind: QueryKind::CreateTable, .. }));
        assert!(!err.is_no_connection());
    }

    #[test]
    fn select_delivers_every_row_once() {
        let conn = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![
                credit("Felipe Santos", "Filme A", 2023),
                credit("Ana", "Filme B", 2023),
                credit("Maria", "Filme C", 2023),
            ]])
            .into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        let mut calls = 0;
        let rows = session
            .execute_select(&select_credits(), |rows| {
                calls += 1;
                rows
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].get_by_name("ator"), Some(&JsonValue::from("Ana")));
        assert_eq!(rows[2].get_by_name("ano"), Some(&JsonValue::from(2023)));
    }

    #[test]
    fn empty_select_still_continues() {
        let conn = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        let mut seen = None;
        session.execute_select(&select_credits(), |rows| seen = Some(rows.len())).unwrap();
        assert_eq!(seen, Some(0));
    }

    #[test]
    fn failed_select_skips_continuation() {
        let conn = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_errors([DbErr::Custom("lost connection".into())])
            .into_connection();
        let mut session = Session::with_connection(conn).unwrap();

        let mut called = false;
        let err = session.execute_select(&select_credits(), |_| called = true).unwrap_err();
        assert!(matches!(err, DbError::Query { kind: QueryKind::Select, .. }));
        assert!(!called);
    }

    #[test]
    fn missing_config_means_no_connection_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(&unreachable_settings(&dir)).unwrap();

        assert!(session.get_connection().unwrap_err().is_pool_unavailable());
        assert!(session.create_table(&schema::create_filme()).unwrap_err().is_no_connection());
        assert!(session.drop_table(elenco::Entity).unwrap_err().is_no_connection());
        assert!(session.execute_raw("SELECT 1").unwrap_err().is_no_connection());

        let mut called = false;
        let err = session.execute_select(&select_credits(), |_| called = true).unwrap_err();
        assert!(err.is_no_connection());
        assert!(!called);
    }
}
