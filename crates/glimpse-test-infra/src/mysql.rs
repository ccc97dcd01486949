use crate::{Result, TestInfraError};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    image_tag: String,
    #[builder(default = "glimpse".to_string(), setter(into))]
    database: String,
    #[builder(default = "glimpse".to_string(), setter(into))]
    username: String,
    #[builder(default = "glimpse".to_string(), setter(into))]
    password: String,
    /// How many times [`MySqlServer::pool`] tries to connect.
    #[builder(default = 20)]
    connect_attempts: u32,
    #[builder(default = Duration::from_millis(500))]
    connect_backoff: Duration,
}

/// Test fixture for a disposable MySQL server.
///
/// The container is stopped when the fixture is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts a MySQL container suitable for integration tests.
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", config.image_tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Opens a pool, retrying while the server finishes its startup.
    ///
    /// MySQL logs "ready for connections" once for the temporary init
    /// server and once for the real one, so the first attempts may fail.
    pub async fn pool(&self, max_connections: u32) -> Result<sqlx::MySqlPool> {
        let url = self.database_url().await?;
        let mut last_error = None;

        for _ in 0..self.config.connect_attempts {
            match sqlx::mysql::MySqlPoolOptions::new()
                .max_connections(max_connections)
                .connect(&url)
                .await
            {
                Ok(pool) => return Ok(pool),
                Err(err) => {
                    last_error = Some(err);
                    tokio::time::sleep(self.config.connect_backoff).await;
                }
            }
        }

        Err(TestInfraError::Connect(
            last_error.map_or_else(|| "no attempts made".to_string(), |e| e.to_string()),
        ))
    }
}
