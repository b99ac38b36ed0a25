//! Semantic Registry Loader
//!
//! Loads a registry snapshot from the JSON catalog written by the schema loader.

use crate::error::{GuardError, Result};
use crate::semantic::entity::{Entity, FieldDefinition};
use crate::semantic::registry::SemanticRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// JSON representation of an entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityJson {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub dimensions: Vec<FieldDefinition>,
    #[serde(default)]
    pub time_dimensions: Vec<FieldDefinition>,
    #[serde(default)]
    pub measures: Vec<FieldDefinition>,
}

/// Semantic registry JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticRegistryJson {
    pub entities: Vec<EntityJson>,
}

/// Load semantic registry from JSON
pub fn load_from_json(json_str: &str) -> Result<Arc<SemanticRegistry>> {
    let registry_json: SemanticRegistryJson = serde_json::from_str(json_str)
        .map_err(|e| GuardError::Registry(format!("Failed to parse semantic registry JSON: {}", e)))?;

    let mut registry = SemanticRegistry::new();
    for entity_json in registry_json.entities {
        if entity_json.name.trim().is_empty() {
            return Err(GuardError::Registry("Entity with empty name".to_string()));
        }
        let entity = Entity::new(
            entity_json.name,
            entity_json.table,
            entity_json.dimensions,
            entity_json.time_dimensions,
            entity_json.measures,
        )?;
        registry.register_entity(entity)?;
    }

    info!(
        entities = registry.len(),
        tables = registry.tables().len(),
        "Loaded semantic registry"
    );
    Ok(Arc::new(registry))
}

/// Load semantic registry from file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Arc<SemanticRegistry>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        GuardError::Registry(format!(
            "Failed to read semantic registry file {}: {}",
            path.display(),
            e
        ))
    })?;
    load_from_json(&contents)
}
