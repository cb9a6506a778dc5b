//! Datasets: one Neo4j database per dataset.
//!
//! A dataset is addressed by a generated 10-letter lowercase `name_hash`
//! (the database name) and carries the human-readable `name_by_user` in an
//! alias node stored inside the dataset itself.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grisera_graph::{escape_identifier, GraphClient, GraphError};
use neo4rs::query;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Database that holds server metadata. Never listed as a dataset.
pub const SYSTEM_DATABASE: &str = "system";

/// Label of the node holding a dataset's aliases.
pub const ALIAS_LABEL: &str = "Alias";

pub const HASH_LENGTH: usize = 10;

const MAX_HASH_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name_hash: String,
    pub name_by_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Administrative operations on the database server.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn create_database(&self, name: &str) -> Result<()>;

    /// Write the alias entries of `dataset` into its own database.
    async fn write_aliases(&self, dataset: &Dataset) -> Result<()>;

    /// Read the aliases of `name`. `None` when the database does not exist.
    async fn read_aliases(&self, name: &str) -> Result<Option<Dataset>>;

    /// Names of every database on the server, `system` included.
    async fn list_databases(&self) -> Result<Vec<String>>;

    async fn drop_database(&self, name: &str) -> Result<()>;
}

/// Random lowercase name for a new dataset database.
pub fn generate_name_hash() -> String {
    let mut rng = rand::rng();
    (0..HASH_LENGTH)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

pub struct DatasetService<D> {
    store: D,
}

impl<D: DatasetStore> DatasetService<D> {
    pub fn new(store: D) -> Self {
        Self { store }
    }

    /// Create a database under a fresh hash and record its aliases.
    pub async fn create(&self, name_by_user: &str) -> Result<Dataset> {
        if name_by_user.trim().is_empty() {
            return Err(ServiceError::Validation(
                "dataset name must not be empty".to_string(),
            ));
        }

        let existing = self.store.list_databases().await?;
        let name_hash = (0..MAX_HASH_ATTEMPTS)
            .map(|_| generate_name_hash())
            .find(|hash| !existing.contains(hash))
            .ok_or_else(|| {
                ServiceError::Validation("could not generate an unused dataset name".to_string())
            })?;

        self.store.create_database(&name_hash).await?;

        let dataset = Dataset {
            name_hash,
            name_by_user: name_by_user.to_string(),
            created_at: Some(Utc::now()),
        };
        self.store.write_aliases(&dataset).await?;

        tracing::info!(name_hash = %dataset.name_hash, name_by_user, "Dataset created");
        Ok(dataset)
    }

    pub async fn get(&self, name_hash: &str) -> Result<Dataset> {
        self.store
            .read_aliases(name_hash)
            .await?
            .ok_or_else(|| dataset_not_found(name_hash))
    }

    /// Every dataset name, without the system database.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = self.store.list_databases().await?;
        names.retain(|name| name != SYSTEM_DATABASE);
        Ok(names)
    }

    /// Drop a dataset and return what it held before.
    pub async fn delete(&self, name_hash: &str) -> Result<Dataset> {
        let snapshot = self.get(name_hash).await?;
        self.store.drop_database(name_hash).await?;
        tracing::info!(name_hash, "Dataset deleted");
        Ok(snapshot)
    }
}

fn dataset_not_found(name_hash: &str) -> ServiceError {
    ServiceError::NotFound {
        id: name_hash.to_string(),
        message: "Dataset not found".to_string(),
    }
}

// ── Neo4j ────────────────────────────────────────────────────────

pub struct Neo4jDatasetStore {
    client: GraphClient,
}

impl Neo4jDatasetStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    async fn database_exists(&self, name: &str) -> Result<bool> {
        let q = query("SHOW DATABASES YIELD name WHERE name = $name RETURN name").param("name", name);
        Ok(self.client.query_one_on(SYSTEM_DATABASE, q).await?.is_some())
    }
}

#[async_trait]
impl DatasetStore for Neo4jDatasetStore {
    async fn create_database(&self, name: &str) -> Result<()> {
        let cypher = format!("CREATE DATABASE {} IF NOT EXISTS WAIT", escape_identifier(name));
        self.client.run_on(SYSTEM_DATABASE, query(&cypher)).await?;
        Ok(())
    }

    async fn write_aliases(&self, dataset: &Dataset) -> Result<()> {
        let cypher = format!(
            "CREATE (a:{} {{name_hash: $name_hash, name_by_user: $name_by_user, created_at: $created_at}})",
            escape_identifier(ALIAS_LABEL)
        );
        let q = query(&cypher)
            .param("name_hash", dataset.name_hash.as_str())
            .param("name_by_user", dataset.name_by_user.as_str())
            .param("created_at", dataset.created_at.map(|t| t.to_rfc3339()));

        self.client.run_on(&dataset.name_hash, q).await?;
        Ok(())
    }

    async fn read_aliases(&self, name: &str) -> Result<Option<Dataset>> {
        if !self.database_exists(name).await? {
            return Ok(None);
        }

        let cypher = format!(
            "MATCH (a:{}) RETURN a.name_by_user AS name_by_user, a.created_at AS created_at LIMIT 1",
            escape_identifier(ALIAS_LABEL)
        );
        let row = self.client.query_one_on(name, query(&cypher)).await?;

        // A database created outside this service has no alias node.
        let (name_by_user, created_at) = match row {
            Some(row) => {
                let name_by_user: String = row.get("name_by_user").unwrap_or_default();
                let created_at: Option<String> = row.get("created_at").unwrap_or(None);
                let created_at = created_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|t| t.with_timezone(&Utc));
                (name_by_user, created_at)
            }
            None => (String::new(), None),
        };

        Ok(Some(Dataset {
            name_hash: name.to_string(),
            name_by_user,
            created_at,
        }))
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        let rows = self
            .client
            .query_rows_on(SYSTEM_DATABASE, query("SHOW DATABASES YIELD name RETURN name"))
            .await?;

        rows.into_iter()
            .map(|row| {
                row.get::<String>("name").map_err(|e| {
                    ServiceError::Store(GraphError::Serialization(format!(
                        "Failed to read database name: {e}"
                    )))
                })
            })
            .collect()
    }

    async fn drop_database(&self, name: &str) -> Result<()> {
        let cypher = format!("DROP DATABASE {} IF EXISTS WAIT", escape_identifier(name));
        self.client.run_on(SYSTEM_DATABASE, query(&cypher)).await?;
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────────

/// Server stand-in holding database names and their alias entries.
///
/// Starts with the `system` and `neo4j` databases, neither carrying aliases.
pub struct MemoryDatasetStore {
    databases: Mutex<BTreeMap<String, Option<Dataset>>>,
}

impl Default for MemoryDatasetStore {
    fn default() -> Self {
        let databases = [SYSTEM_DATABASE, "neo4j"]
            .into_iter()
            .map(|name| (name.to_string(), None))
            .collect();
        Self {
            databases: Mutex::new(databases),
        }
    }
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn databases(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Option<Dataset>>> {
        self.databases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DatasetStore for MemoryDatasetStore {
    async fn create_database(&self, name: &str) -> Result<()> {
        self.databases().entry(name.to_string()).or_insert(None);
        Ok(())
    }

    async fn write_aliases(&self, dataset: &Dataset) -> Result<()> {
        match self.databases().get_mut(&dataset.name_hash) {
            Some(slot) => {
                *slot = Some(dataset.clone());
                Ok(())
            }
            None => Err(GraphError::Rejected {
                operation: "write_aliases".to_string(),
                reason: format!("database {} does not exist", dataset.name_hash),
            }
            .into()),
        }
    }

    async fn read_aliases(&self, name: &str) -> Result<Option<Dataset>> {
        Ok(self.databases().get(name).map(|aliases| {
            aliases.clone().unwrap_or_else(|| Dataset {
                name_hash: name.to_string(),
                name_by_user: String::new(),
                created_at: None,
            })
        }))
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.databases().keys().cloned().collect())
    }

    async fn drop_database(&self, name: &str) -> Result<()> {
        self.databases().remove(name);
        Ok(())
    }
}
