//! SQL Server executor over a single TDS connection.
//!
//! - One `tiberius` client, owned for the run and closed once at the end
//! - Connect timeout covers TCP connect plus login
//! - Every statement runs under the request timeout
//! - Parameterless statements go out as plain batches so `USE` persists
//! - Optional throttle delay before each statement
//! - Server errors keep the server's message text

use super::{Executor, QueryParam, ROWS_AFFECTED, Row, coercion::coerce};
use crate::config::{ConnectionConfig, Credentials};
use crate::{ProbeError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::time::Duration;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, QueryItem, QueryStream};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// SQL Server executor with one owned connection.
pub struct MssqlExecutor {
    client: Client<Compat<TcpStream>>,
    request_timeout: Duration,
    throttle: Option<Duration>,
    statements: u64,
}

impl MssqlExecutor {
    /// Opens the connection.
    ///
    /// # Security
    ///
    /// - Credentials are consumed by the login handshake and not retained
    /// - Errors carry the server address, never the login
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Connection`] if the configuration is invalid,
    /// the TCP connect or login fails, or the connect timeout elapses
    pub async fn connect(config: &ConnectionConfig, credentials: &Credentials) -> Result<Self> {
        config.validate()?;
        let tiberius_config = build_config(config, credentials);
        let address = config.address();

        let connect = async {
            let tcp = TcpStream::connect(tiberius_config.get_addr())
                .await
                .map_err(|e| {
                    ProbeError::connection_failed(format!("TCP connect to {address} failed"), e)
                })?;

            tcp.set_nodelay(true)
                .map_err(|e| ProbeError::connection_failed("Failed to configure socket", e))?;

            Client::connect(tiberius_config.clone(), tcp.compat_write())
                .await
                .map_err(|e| ProbeError::connection_failed(format!("Login to {address} failed"), e))
        };

        let timeout = config.connect_timeout;
        let client = tokio::time::timeout(timeout, connect).await.map_err(|e| {
            ProbeError::connection_failed(
                format!("Connect to {address} timed out after {timeout:?}"),
                e,
            )
        })??;

        debug!("Connected to {}", config);

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
            throttle: config.throttle,
            statements: 0,
        })
    }

    /// Number of statements sent so far.
    pub fn statements_executed(&self) -> u64 {
        self.statements
    }

    /// Closes the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not acknowledge the close
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| ProbeError::connection_failed("Failed to close connection", e))
    }

    async fn before_statement(&mut self, sql: &str, params: &[QueryParam]) {
        if let Some(delay) = self.throttle {
            tokio::time::sleep(delay).await;
        }
        self.statements = self.statements.saturating_add(1);
        debug!(
            statement = self.statements,
            params = ?params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "{}",
            sql.trim()
        );
    }
}

fn build_config(config: &ConnectionConfig, credentials: &Credentials) -> Config {
    let mut tiberius_config = Config::new();
    tiberius_config.host(&config.server);
    tiberius_config.port(config.port);
    tiberius_config.application_name("dbprobe");
    tiberius_config.authentication(AuthMethod::sql_server(
        credentials.username(),
        credentials.password().unwrap_or(""),
    ));

    if let Some(database) = &config.database {
        tiberius_config.database(database);
    }

    if config.encrypt {
        tiberius_config.encryption(EncryptionLevel::Required);
    } else {
        tiberius_config.encryption(EncryptionLevel::Off);
    }

    if config.trust_server_certificate {
        tiberius_config.trust_cert();
    }

    tiberius_config
}

/// How a statement travels to the server.
enum Dispatch<'a> {
    /// A plain SQL batch; session state it sets, such as `USE`, outlives it
    Batch(&'a str),
    /// An `sp_executesql` call; session state it sets is reverted on return
    Rpc(Query<'a>),
}

fn dispatch<'a>(sql: &'a str, params: &'a [QueryParam]) -> Dispatch<'a> {
    if params.is_empty() {
        return Dispatch::Batch(sql);
    }

    let mut query = Query::new(sql);
    for param in params {
        query.bind(param.value.as_str());
    }
    Dispatch::Rpc(query)
}

/// Appends a `rowsAffected` result set to a batch.
fn with_row_count(sql: &str) -> String {
    format!(
        "{};\nSELECT @@ROWCOUNT AS {}",
        sql.trim().trim_end_matches(';'),
        crate::sql::quote_identifier(ROWS_AFFECTED)
    )
}

async fn collect_rows(mut stream: QueryStream<'_>) -> tiberius::Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(item) = stream.try_next().await? {
        if let QueryItem::Row(row) = item {
            rows.push(convert_row(row));
        }
    }
    Ok(rows)
}

/// Keeps the server's own text for server-side errors.
fn driver_error(error: tiberius::error::Error) -> ProbeError {
    let message = match &error {
        tiberius::error::Error::Server(token) => token.message().to_string(),
        other => other.to_string(),
    };
    ProbeError::query_failed(message, error)
}

fn timed_out(timeout: Duration, error: tokio::time::error::Elapsed) -> ProbeError {
    ProbeError::query_failed(format!("Request timed out after {:?}", timeout), error)
}

fn convert_row(row: tiberius::Row) -> Row {
    let labels: Vec<String> = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let mut converted = Row::new();
    for (label, data) in labels.into_iter().zip(row) {
        converted.push(label, coerce(data));
    }
    converted
}

#[async_trait]
impl Executor for MssqlExecutor {
    async fn query(&mut self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        self.before_statement(sql, params).await;
        let timeout = self.request_timeout;
        let client = &mut self.client;

        let work = async move {
            let stream = match dispatch(sql, params) {
                Dispatch::Batch(batch) => client.simple_query(batch).await?,
                Dispatch::Rpc(query) => query.query(client).await?,
            };
            collect_rows(stream).await
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|e| timed_out(timeout, e))?
            .map_err(driver_error)
    }

    async fn execute(&mut self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        self.before_statement(sql, params).await;
        let timeout = self.request_timeout;
        let client = &mut self.client;

        let work = async move {
            match dispatch(sql, params) {
                Dispatch::Batch(batch) => {
                    let stream = client.simple_query(with_row_count(batch)).await?;
                    let rows = collect_rows(stream).await?;
                    Ok::<_, tiberius::error::Error>(
                        rows.into_iter()
                            .rev()
                            .find(|row| row.get(ROWS_AFFECTED).is_some())
                            .unwrap_or_else(|| Row::rows_affected(0)),
                    )
                }
                Dispatch::Rpc(query) => {
                    let result = query.execute(client).await?;
                    Ok(Row::rows_affected(result.total()))
                }
            }
        };

        let row = tokio::time::timeout(timeout, work)
            .await
            .map_err(|e| timed_out(timeout, e))?
            .map_err(driver_error)?;

        Ok(vec![row])
    }
}
