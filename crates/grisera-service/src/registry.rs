//! Static table of GRISERA entity types.
//!
//! Each entry names the graph label, the resource name used by the CLI, and
//! the relation fields an input may carry. The mapper is driven entirely by
//! this table.

use grisera_core::{NodeId, Properties};
use serde::Serialize;

use crate::error::{Result, ServiceError};

/// An optional reference from one entity type to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationSpec {
    /// Input property holding the target id, e.g. `participation_id`.
    pub field: &'static str,
    /// Relationship type written to the graph, e.g. `hasParticipation`.
    pub name: &'static str,
    /// Label of the entity the field must point at.
    pub target: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityType {
    pub label: &'static str,
    pub resource: &'static str,
    pub relations: &'static [RelationSpec],
}

/// A relation field resolved from an input property set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationTarget {
    pub spec: RelationSpec,
    pub target: NodeId,
}

impl EntityType {
    /// Split an input property set into scalar properties and relation
    /// targets.
    ///
    /// Relation fields are always removed from the returned properties. A
    /// field whose value is not an id is dropped like an absent one.
    pub fn split_relations(&self, mut properties: Properties) -> (Properties, Vec<RelationTarget>) {
        let mut targets = Vec::new();
        for spec in self.relations {
            if let Some(value) = properties.remove(spec.field) {
                match value.as_node_id() {
                    Some(target) => targets.push(RelationTarget {
                        spec: *spec,
                        target,
                    }),
                    None => {
                        tracing::warn!(field = spec.field, %value, "Ignoring non-id relation value");
                    }
                }
            }
        }
        (properties, targets)
    }
}

macro_rules! rel {
    ($field:literal, $name:literal, $target:literal $(,)?) => {
        RelationSpec {
            field: $field,
            name: $name,
            target: $target,
        }
    };
}

macro_rules! entity {
    ($label:literal, $resource:literal, [$($relation:expr),* $(,)?] $(,)?) => {
        EntityType {
            label: $label,
            resource: $resource,
            relations: &[$($relation),*],
        }
    };
}

pub const ACTIVITY: EntityType = entity!("Activity", "activity", []);
pub const ACTIVITY_EXECUTION: EntityType = entity!(
    "Activity Execution",
    "activity_execution",
    [rel!("activity_id", "hasActivity", "Activity")],
);
pub const APPEARANCE: EntityType = entity!("Appearance", "appearance", []);
pub const CHANNEL: EntityType = entity!("Channel", "channel", []);
pub const LIFE_ACTIVITY: EntityType = entity!("Life Activity", "life_activity", []);
pub const MEASURE: EntityType = entity!(
    "Measure",
    "measure",
    [rel!("measure_name_id", "hasMeasureName", "Measure Name")],
);
pub const MEASURE_NAME: EntityType = entity!("Measure Name", "measure_name", []);
pub const MODALITY: EntityType = entity!("Modality", "modality", []);
pub const OBSERVABLE_INFORMATION: EntityType = entity!(
    "Observable Information",
    "observable_information",
    [
        rel!("modality_id", "hasModality", "Modality"),
        rel!("life_activity_id", "hasLifeActivity", "Life Activity"),
        rel!("recording_id", "hasRecording", "Recording"),
    ],
);
pub const PARTICIPANT: EntityType = entity!("Participant", "participant", []);
pub const PARTICIPANT_STATE: EntityType = entity!(
    "Participant State",
    "participant_state",
    [
        rel!("participant_id", "hasParticipant", "Participant"),
        rel!("personality_id", "hasPersonality", "Personality"),
        rel!("appearance_id", "hasAppearance", "Appearance"),
    ],
);
pub const PARTICIPATION: EntityType = entity!(
    "Participation",
    "participation",
    [
        rel!(
            "activity_execution_id",
            "hasActivityExecution",
            "Activity Execution",
        ),
        rel!(
            "participant_state_id",
            "hasParticipantState",
            "Participant State",
        ),
    ],
);
pub const PERSONALITY: EntityType = entity!("Personality", "personality", []);
pub const RECORDING: EntityType = entity!(
    "Recording",
    "recording",
    [
        rel!("participation_id", "hasParticipation", "Participation"),
        rel!(
            "registered_channel_id",
            "hasRegisteredChannel",
            "Registered Channel",
        ),
    ],
);
pub const REGISTERED_CHANNEL: EntityType = entity!(
    "Registered Channel",
    "registered_channel",
    [
        rel!("channel_id", "hasChannel", "Channel"),
        rel!("registered_data_id", "hasRegisteredData", "Registered Data"),
    ],
);
pub const REGISTERED_DATA: EntityType = entity!("Registered Data", "registered_data", []);
pub const TIME_SERIES: EntityType = entity!(
    "Time Series",
    "time_series",
    [
        rel!("measure_id", "hasMeasure", "Measure"),
        rel!(
            "observable_information_id",
            "hasObservableInformation",
            "Observable Information",
        ),
    ],
);

/// Every registered entity type.
pub const ENTITY_TYPES: &[EntityType] = &[
    ACTIVITY,
    ACTIVITY_EXECUTION,
    APPEARANCE,
    CHANNEL,
    LIFE_ACTIVITY,
    MEASURE,
    MEASURE_NAME,
    MODALITY,
    OBSERVABLE_INFORMATION,
    PARTICIPANT,
    PARTICIPANT_STATE,
    PARTICIPATION,
    PERSONALITY,
    RECORDING,
    REGISTERED_CHANNEL,
    REGISTERED_DATA,
    TIME_SERIES,
];

pub fn by_label(label: &str) -> Result<&'static EntityType> {
    ENTITY_TYPES
        .iter()
        .find(|t| t.label == label)
        .ok_or_else(|| ServiceError::UnknownEntityType(label.to_string()))
}

/// Look up a type by resource name (`registered_channel`) or label
/// (`Registered Channel`).
pub fn lookup(name: &str) -> Result<&'static EntityType> {
    ENTITY_TYPES
        .iter()
        .find(|t| t.resource == name || t.label == name)
        .ok_or_else(|| ServiceError::UnknownEntityType(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grisera_core::PropertyValue;

    #[test]
    fn test_every_relation_target_is_registered() {
        for entity_type in ENTITY_TYPES {
            for spec in entity_type.relations {
                assert!(
                    by_label(spec.target).is_ok(),
                    "{} -> {} is not a registered label",
                    entity_type.label,
                    spec.target
                );
            }
        }
    }

    #[test]
    fn test_labels_and_resources_are_unique() {
        for (i, a) in ENTITY_TYPES.iter().enumerate() {
            for b in &ENTITY_TYPES[i + 1..] {
                assert_ne!(a.label, b.label);
                assert_ne!(a.resource, b.resource);
            }
        }
    }

    #[test]
    fn test_lookup_by_resource_or_label() {
        assert_eq!(lookup("registered_channel").unwrap().label, "Registered Channel");
        assert_eq!(lookup("Registered Channel").unwrap().resource, "registered_channel");
        assert!(matches!(
            lookup("spaceship"),
            Err(ServiceError::UnknownEntityType(_))
        ));
    }

    #[test]
    fn test_split_relations() {
        let input = Properties::new()
            .with("name", "r1")
            .with("participation_id", 7)
            .with("registered_channel_id", "not-an-id");

        let (props, targets) = RECORDING.split_relations(input);

        assert_eq!(props, Properties::new().with("name", "r1"));
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].spec.name, "hasParticipation");
        assert_eq!(targets[0].target, NodeId(7));
    }

    #[test]
    fn test_split_relations_keeps_unrelated_id_like_fields() {
        let input = Properties::new().with("participation_id", PropertyValue::Int(3));
        let (props, targets) = CHANNEL.split_relations(input);
        assert!(targets.is_empty());
        assert!(props.contains_key("participation_id"));
    }
}
