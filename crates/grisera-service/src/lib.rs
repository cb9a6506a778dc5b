//! grisera-service: Entity services for the GRISERA graph backend.
//!
//! A single table-driven [`EntityMapper`] stores every GRISERA entity type
//! as a labeled node with scalar properties and named edges. Alongside it
//! live the dataset (one database per dataset), time-series, and dictionary
//! seeding services.

pub mod dataset;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod seed;
pub mod timeseries;

pub use dataset::{Dataset, DatasetService, DatasetStore, MemoryDatasetStore, Neo4jDatasetStore};
pub use error::ServiceError;
pub use mapper::EntityMapper;
pub use registry::{EntityType, RelationSpec, ENTITY_TYPES};
pub use seed::{seed_dictionaries, SeedReport};
pub use timeseries::{
    MemoryTimeSeriesStore, Neo4jTimeSeriesStore, TimeSeries, TimeSeriesService, TimeSeriesStore,
    TimeWindow,
};
