//! CLI entry point for the GRISERA graph services.
//!
//! Entity and time-series input is read as JSON from stdin; every result is
//! written as JSON to stdout. Exit status 4 means not found, 22 means the
//! input was rejected.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use grisera_core::{GriseraConfig, NodeId, Properties};
use grisera_graph::{GraphClient, GraphConfig, Neo4jStore};
use grisera_service::timeseries::TimeSeries;
use grisera_service::{
    registry, seed_dictionaries, DatasetService, EntityMapper, Neo4jDatasetStore,
    Neo4jTimeSeriesStore, ServiceError, TimeSeriesService, TimeWindow,
};

const EXIT_NOT_FOUND: u8 = 4;
const EXIT_INVALID: u8 = 22;

#[derive(Parser)]
#[command(name = "grisera")]
#[command(about = "Entity graph services for GRISERA datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Dataset database to work on (default: `default_database` from config).
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Config file prefix (default: grisera).
    #[arg(short, long, default_value = "grisera", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Create, read, update, and delete entities.
    Entity {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage datasets (one database each).
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },
    /// Store and read time-series signal values.
    Series {
        #[command(subcommand)]
        action: SeriesAction,
    },
    /// Create missing channel, modality, and life activity nodes.
    Seed,
    /// Print the entity type registry.
    Types,
}

#[derive(Subcommand)]
enum EntityAction {
    /// Create an entity from a JSON object on stdin.
    Create { entity_type: String },
    Get { entity_type: String, id: i64 },
    List { entity_type: String },
    /// Replace all properties with the JSON object on stdin.
    Update { entity_type: String, id: i64 },
    /// Add relations named by the JSON object on stdin.
    Relationships { entity_type: String, id: i64 },
    Delete { entity_type: String, id: i64 },
}

#[derive(Subcommand)]
enum DatasetAction {
    Create { name_by_user: String },
    Get { name_hash: String },
    List,
    Delete { name_hash: String },
}

#[derive(Subcommand)]
enum SeriesAction {
    /// Save a time series read as JSON from stdin.
    Save,
    Get {
        id: i64,
        /// Earliest timestamp to include.
        #[arg(long)]
        from: Option<i64>,
        /// Latest timestamp to include.
        #[arg(long)]
        to: Option<i64>,
    },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

/// A store failure while creating an entity. Reported like rejected input.
#[derive(Debug, thiserror::Error)]
#[error("Entity could not be created: {0}")]
struct CreationFailed(#[source] ServiceError);

fn creation_error(error: ServiceError) -> anyhow::Error {
    match error {
        ServiceError::Store(_) => CreationFailed(error).into(),
        other => other.into(),
    }
}

fn exit_status(error: &anyhow::Error) -> u8 {
    if error.is::<CreationFailed>() || error.is::<serde_json::Error>() {
        return EXIT_INVALID;
    }
    match error.downcast_ref::<ServiceError>() {
        Some(ServiceError::NotFound { .. }) => EXIT_NOT_FOUND,
        Some(
            ServiceError::Validation(_)
            | ServiceError::UnknownEntityType(_)
            | ServiceError::Core(_),
        ) => EXIT_INVALID,
        _ => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GriseraConfig::load(&cli.config)?;
    let database = cli
        .database
        .unwrap_or_else(|| config.default_database.clone());

    match cli.command {
        Command::Types => print_json(&registry::ENTITY_TYPES),
        Command::Entity { action } => {
            let graph = connect(&config).await?;
            let mapper = EntityMapper::new(Neo4jStore::new(graph, database));
            run_entity(&mapper, action).await
        }
        Command::Dataset { action } => {
            let service = DatasetService::new(Neo4jDatasetStore::new(connect(&config).await?));
            match action {
                DatasetAction::Create { name_by_user } => {
                    print_json(&service.create(&name_by_user).await?)
                }
                DatasetAction::Get { name_hash } => print_json(&service.get(&name_hash).await?),
                DatasetAction::List => print_json(&service.list().await?),
                DatasetAction::Delete { name_hash } => {
                    print_json(&service.delete(&name_hash).await?)
                }
            }
        }
        Command::Series { action } => {
            let graph = connect(&config).await?;
            let service = TimeSeriesService::new(Neo4jTimeSeriesStore::new(graph, database));
            match action {
                SeriesAction::Save => {
                    let input = std::io::read_to_string(std::io::stdin())?;
                    let series: TimeSeries = serde_json::from_str(&input)?;
                    print_json(&service.save(&series).await?)
                }
                SeriesAction::Get { id, from, to } => {
                    let window = TimeWindow { from, to };
                    print_json(&service.get(NodeId(id), window).await?)
                }
                SeriesAction::Delete { id } => print_json(&service.delete(NodeId(id)).await?),
            }
        }
        Command::Seed => {
            let graph = connect(&config).await?;
            let mapper = EntityMapper::new(Neo4jStore::new(graph, database));
            print_json(&seed_dictionaries(&mapper, &config.seed).await?)
        }
    }
}

async fn connect(config: &GriseraConfig) -> anyhow::Result<GraphClient> {
    Ok(GraphClient::connect(&GraphConfig::from(&config.neo4j)).await?)
}

async fn run_entity(mapper: &EntityMapper<Neo4jStore>, action: EntityAction) -> anyhow::Result<()> {
    match action {
        EntityAction::Create { entity_type } => {
            let entity_type = registry::lookup(&entity_type)?;
            let input = read_properties()?;
            let created = mapper
                .create(entity_type, input)
                .await
                .map_err(creation_error)?;
            print_json(&created)
        }
        EntityAction::Get { entity_type, id } => {
            let entity_type = registry::lookup(&entity_type)?;
            print_json(&mapper.get(entity_type, NodeId(id)).await?)
        }
        EntityAction::List { entity_type } => {
            let entity_type = registry::lookup(&entity_type)?;
            print_json(&mapper.get_all(entity_type).await?)
        }
        EntityAction::Update { entity_type, id } => {
            let entity_type = registry::lookup(&entity_type)?;
            let input = read_properties()?;
            print_json(&mapper.update(entity_type, NodeId(id), input).await?)
        }
        EntityAction::Relationships { entity_type, id } => {
            let entity_type = registry::lookup(&entity_type)?;
            let input = read_properties()?;
            print_json(&mapper.update_relationships(entity_type, NodeId(id), input).await?)
        }
        EntityAction::Delete { entity_type, id } => {
            let entity_type = registry::lookup(&entity_type)?;
            print_json(&mapper.delete(entity_type, NodeId(id)).await?)
        }
    }
}

fn read_properties() -> anyhow::Result<Properties> {
    let input = std::io::read_to_string(std::io::stdin())?;
    let json: serde_json::Value = serde_json::from_str(&input)?;
    Properties::from_json(&json).map_err(|e| ServiceError::from(e).into())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
