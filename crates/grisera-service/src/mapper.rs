//! Generic entity-to-graph mapper.
//!
//! Translates typed entities to node/edge/property writes and reads nodes
//! plus their incident edges back into [`DomainEntity`] values. One mapper
//! serves every entity type in the registry.
//!
//! Multi-step operations issue independent store calls with no transaction
//! around them. A failure between steps leaves whatever was already written
//! (for example an allocated node without properties after a failed
//! property write).

use grisera_core::{BasicEntity, DomainEntity, NodeId, Properties, RelationInformation};
use grisera_graph::GraphStore;

use crate::error::{Result, ServiceError};
use crate::registry::{self, EntityType, RelationTarget};

/// CRUD over any [`GraphStore`], driven by [`EntityType`] descriptors.
pub struct EntityMapper<S> {
    store: S,
}

impl<S: GraphStore> EntityMapper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an entity from an input property set.
    ///
    /// Relation fields named by `entity_type` become edges to existing
    /// targets; targets that cannot be found are skipped. The result is
    /// re-read from the store.
    pub async fn create(&self, entity_type: &EntityType, input: Properties) -> Result<DomainEntity> {
        let (properties, targets) = entity_type.split_relations(input);

        let id = self.store.create_node(entity_type.label).await?;
        tracing::debug!(label = entity_type.label, %id, "Node allocated");

        self.link_targets(id, &targets).await?;
        self.store.create_properties(id, &properties).await?;

        tracing::info!(
            label = entity_type.label,
            %id,
            properties = properties.len(),
            "Entity created"
        );
        self.get(entity_type, id).await
    }

    /// Fetch an entity with its outgoing and incoming relations.
    ///
    /// A node whose first label is not `entity_type.label` is reported as
    /// not found.
    pub async fn get(&self, entity_type: &EntityType, id: NodeId) -> Result<DomainEntity> {
        let node = self
            .store
            .get_node(id)
            .await?
            .ok_or_else(|| ServiceError::node_not_found(id))?;

        if node.primary_label() != Some(entity_type.label) {
            tracing::debug!(
                expected = entity_type.label,
                found = ?node.labels,
                %id,
                "Label mismatch"
            );
            return Err(ServiceError::node_not_found(id));
        }

        let mut relations = Vec::new();
        let mut reversed_relations = Vec::new();
        for rel in self.store.get_node_relationships(id).await? {
            if rel.start_node == id {
                relations.push(RelationInformation {
                    second_node_id: rel.end_node,
                    name: rel.name,
                    relation_id: rel.id,
                });
            } else {
                reversed_relations.push(RelationInformation {
                    second_node_id: rel.start_node,
                    name: rel.name,
                    relation_id: rel.id,
                });
            }
        }

        Ok(DomainEntity {
            id,
            label: entity_type.label.to_string(),
            properties: node.properties,
            relations,
            reversed_relations,
        })
    }

    /// List every entity of a type, without relations, in store order.
    pub async fn get_all(&self, entity_type: &EntityType) -> Result<Vec<BasicEntity>> {
        let nodes = self.store.get_nodes(entity_type.label).await?;
        Ok(nodes
            .into_iter()
            .map(|node| BasicEntity {
                id: node.id,
                properties: node.properties,
            })
            .collect())
    }

    /// Replace all scalar properties of an entity.
    ///
    /// Keys missing from `input` are gone afterwards. Relation fields in
    /// `input` are ignored; relations are left as they were.
    pub async fn update(
        &self,
        entity_type: &EntityType,
        id: NodeId,
        input: Properties,
    ) -> Result<DomainEntity> {
        let current = self.get(entity_type, id).await?;
        let (properties, ignored) = entity_type.split_relations(input);
        if !ignored.is_empty() {
            tracing::debug!(%id, ignored = ignored.len(), "Relation fields ignored on update");
        }

        self.store.delete_node_properties(id).await?;
        self.store.create_properties(id, &properties).await?;

        tracing::info!(label = entity_type.label, %id, "Entity updated");
        Ok(DomainEntity {
            id,
            label: current.label,
            properties,
            relations: current.relations,
            reversed_relations: current.reversed_relations,
        })
    }

    /// Add edges for every resolvable relation field in `input`.
    ///
    /// Existing edges are never removed, so repeating a call with the same
    /// target adds a second edge of the same name.
    pub async fn update_relationships(
        &self,
        entity_type: &EntityType,
        id: NodeId,
        input: Properties,
    ) -> Result<DomainEntity> {
        self.get(entity_type, id).await?;
        let (_, targets) = entity_type.split_relations(input);

        self.link_targets(id, &targets).await?;
        self.get(entity_type, id).await
    }

    /// Delete an entity and return what it looked like beforehand.
    pub async fn delete(&self, entity_type: &EntityType, id: NodeId) -> Result<DomainEntity> {
        let snapshot = self.get(entity_type, id).await?;
        self.store.delete_node(id).await?;

        tracing::info!(label = entity_type.label, %id, "Entity deleted");
        Ok(snapshot)
    }

    /// Write `source -[name]-> target` for every target that exists with the
    /// expected label. Missing targets are skipped; store failures are not.
    async fn link_targets(&self, source: NodeId, targets: &[RelationTarget]) -> Result<usize> {
        let mut linked = 0;
        for relation in targets {
            let target_type = registry::by_label(relation.spec.target)?;
            match self.get(target_type, relation.target).await {
                Ok(_) => {
                    self.store
                        .create_relationship(source, relation.target, relation.spec.name)
                        .await?;
                    linked += 1;
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        %source,
                        target = %relation.target,
                        relation = relation.spec.name,
                        "Relation target not found, skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(linked)
    }
}
