//! Dictionary seeding.
//!
//! Channels, modalities and life activities are closed vocabularies that
//! other entities point at. Seeding creates whichever values are missing and
//! leaves existing nodes alone, so it can run on every startup.

use std::collections::HashSet;

use grisera_core::config::SeedSettings;
use grisera_core::Properties;
use grisera_graph::GraphStore;
use serde::Serialize;

use crate::error::Result;
use crate::mapper::EntityMapper;
use crate::registry::{EntityType, CHANNEL, LIFE_ACTIVITY, MODALITY};

/// Values created for one dictionary type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub channels: Vec<String>,
    pub modalities: Vec<String>,
    pub life_activities: Vec<String>,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.channels.len() + self.modalities.len() + self.life_activities.len()
    }
}

/// Create every configured dictionary value that is not yet present.
pub async fn seed_dictionaries<S: GraphStore>(
    mapper: &EntityMapper<S>,
    settings: &SeedSettings,
) -> Result<SeedReport> {
    let report = SeedReport {
        channels: seed_values(mapper, &CHANNEL, "type", &settings.channels).await?,
        modalities: seed_values(mapper, &MODALITY, "modality", &settings.modalities).await?,
        life_activities: seed_values(
            mapper,
            &LIFE_ACTIVITY,
            "life_activity",
            &settings.life_activities,
        )
        .await?,
    };

    tracing::info!(created = report.total(), "Dictionary seeding finished");
    Ok(report)
}

async fn seed_values<S: GraphStore>(
    mapper: &EntityMapper<S>,
    entity_type: &EntityType,
    key: &str,
    values: &[String],
) -> Result<Vec<String>> {
    let mut present: HashSet<String> = mapper
        .get_all(entity_type)
        .await?
        .into_iter()
        .filter_map(|entity| entity.properties.get(key).map(ToString::to_string))
        .collect();

    let mut created = Vec::new();
    for value in values {
        // insert() also dedups repeated values in the configured list
        if !present.insert(value.clone()) {
            continue;
        }
        mapper
            .create(entity_type, Properties::new().with(key, value.as_str()))
            .await?;
        created.push(value.clone());
    }

    if !created.is_empty() {
        tracing::debug!(label = entity_type.label, created = created.len(), "Seeded dictionary values");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grisera_graph::{MemoryGraphStore, StoreOp};

    fn settings() -> SeedSettings {
        SeedSettings {
            channels: vec!["EEG".to_string(), "ECG".to_string()],
            modalities: vec!["speech".to_string()],
            life_activities: vec!["sleep".to_string(), "sleep".to_string()],
        }
    }

    #[tokio::test]
    async fn test_seed_creates_missing_values() {
        let mapper = EntityMapper::new(MemoryGraphStore::new());
        let report = seed_dictionaries(&mapper, &settings()).await.unwrap();

        assert_eq!(report.channels, vec!["EEG", "ECG"]);
        assert_eq!(report.modalities, vec!["speech"]);
        assert_eq!(report.life_activities, vec!["sleep"]);

        let channels = mapper.get_all(&CHANNEL).await.unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(
            channels[0].properties,
            Properties::new().with("type", "EEG")
        );
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let mapper = EntityMapper::new(MemoryGraphStore::new());
        seed_dictionaries(&mapper, &settings()).await.unwrap();
        mapper.store().clear_journal();

        let report = seed_dictionaries(&mapper, &settings()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(mapper.store().journal().is_empty());
    }

    #[tokio::test]
    async fn test_seed_skips_values_already_present() {
        let store = MemoryGraphStore::new();
        store.insert_node(&["Channel"], Properties::new().with("type", "EEG"));
        let mapper = EntityMapper::new(store);

        let report = seed_dictionaries(&mapper, &settings()).await.unwrap();
        assert_eq!(report.channels, vec!["ECG"]);

        let channel_creates = mapper
            .store()
            .journal()
            .iter()
            .filter(|op| matches!(op, StoreOp::CreateNode { label } if label == "Channel"))
            .count();
        assert_eq!(channel_creates, 1);
    }
}
