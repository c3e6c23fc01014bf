use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mongodb::{Client, Database as MongoDatabase, options::ClientOptions};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

use crate::config::{AppConfig, StorageBackend};
use crate::entity::Products;
use crate::storage::{InMemoryProductStore, MongoProductStore, PgProductStore, ProductStore};

pub const DEFAULT_MONGO_DATABASE: &str = "catalog";

/// Build the product store selected by the connection string. Only
/// configuration problems fail here; an unreachable server is reported later
/// by `ping` or by the first request.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn ProductStore>> {
    let store: Arc<dyn ProductStore> = match config.backend {
        StorageBackend::MongoDb => {
            let db = connect_mongo(&config.database_url, config.database_name.as_deref()).await?;
            Arc::new(MongoProductStore::new(&db))
        }
        StorageBackend::Postgres => {
            let conn = create_orm_conn(&config.database_url).await?;
            Arc::new(PgProductStore::new(conn))
        }
        StorageBackend::Memory => Arc::new(InMemoryProductStore::new()),
    };
    Ok(store)
}

/// Create a MongoDB handle. The driver connects in the background and
/// reconnects on demand.
pub async fn connect_mongo(url: &str, database: Option<&str>) -> Result<MongoDatabase> {
    let mut options = ClientOptions::parse(url).await?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.connect_timeout = Some(Duration::from_secs(10));
    options.server_selection_timeout = Some(Duration::from_secs(30));

    let name = database
        .map(str::to_owned)
        .or_else(|| options.default_database.clone())
        .unwrap_or_else(|| DEFAULT_MONGO_DATABASE.to_string());

    let client = Client::with_options(options)?;
    tracing::debug!(database = %name, "mongodb client created");
    Ok(client.database(&name))
}

/// Create a lazily connected SeaORM pool.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .connect_lazy(true)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Create the `products` table when it does not exist yet.
pub async fn ensure_schema(conn: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(Products);
    statement.if_not_exists();

    conn.execute(backend.build(&statement)).await?;
    tracing::debug!("products table ensured");
    Ok(())
}
