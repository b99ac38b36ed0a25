//! Semantic Registry Implementation
//!
//! Read-only snapshot of loaded entities, plus the registry-wide indexes the
//! validators need (known identifiers, physical tables).

use crate::error::{GuardError, Result};
use crate::semantic::entity::Entity;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// In-memory semantic registry
#[derive(Debug, Clone, Default)]
pub struct SemanticRegistry {
    entities: BTreeMap<String, Entity>,
    known_identifiers: HashSet<String>,
    tables: BTreeSet<String>,
}

impl SemanticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self> {
        let mut registry = Self::new();
        for entity in entities {
            registry.register_entity(entity)?;
        }
        Ok(registry)
    }

    pub fn register_entity(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(entity.name()) {
            return Err(GuardError::Registry(format!(
                "Entity '{}' registered twice",
                entity.name()
            )));
        }

        for ident in entity.identifier_names() {
            self.known_identifiers.insert(ident.to_string());
            self.known_identifiers.insert(ident.to_lowercase());
        }
        self.tables.insert(entity.table().to_string());
        self.entities.insert(entity.name().to_string(), entity);
        Ok(())
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    /// Physical table names across all entities
    pub fn tables(&self) -> &BTreeSet<String> {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Exact or lowercased token is an entity, table, field or alias name
    pub fn is_known_identifier(&self, token: &str) -> bool {
        self.known_identifiers.contains(token)
            || self.known_identifiers.contains(&token.to_lowercase())
    }

    pub fn has_time_dimensions(&self) -> bool {
        self.entities.values().any(Entity::has_time_dimensions)
    }

    /// Every canonical field name and alias, used for suggestions
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.entities
            .values()
            .flat_map(|e| e.identifier_names().skip(2))
            .collect()
    }
}
