//! Semantic Entity Definition
//!
//! A logical table with its dimensions, time dimensions, measures and aliases.
//! Lookup indexes are derived once in `Entity::new` and are read-only after.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A named field on an entity, with optional alternate names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// Entity loaded from the schema registry
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    table: String,
    dimensions: Vec<FieldDefinition>,
    time_dimensions: Vec<FieldDefinition>,
    measures: Vec<FieldDefinition>,
    dimension_index: HashSet<String>,
    time_dimension_index: HashSet<String>,
    measure_index: HashSet<String>,
    /// alias -> canonical field name
    alias_index: HashMap<String, String>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        dimensions: Vec<FieldDefinition>,
        time_dimensions: Vec<FieldDefinition>,
        measures: Vec<FieldDefinition>,
    ) -> Result<Self> {
        let name = name.into();
        let table = table.into();

        let dimension_index = dimensions.iter().map(|d| d.name.clone()).collect();
        let time_dimension_index = time_dimensions.iter().map(|d| d.name.clone()).collect();
        let measure_index = measures.iter().map(|m| m.name.clone()).collect();

        let mut alias_index: HashMap<String, String> = HashMap::new();
        for field in dimensions.iter().chain(&time_dimensions).chain(&measures) {
            for alias in &field.aliases {
                match alias_index.get(alias) {
                    Some(existing) if existing != &field.name => {
                        return Err(GuardError::Registry(format!(
                            "Alias '{}' on entity '{}' maps to both '{}' and '{}'",
                            alias, name, existing, field.name
                        )));
                    }
                    Some(_) => {}
                    None => {
                        alias_index.insert(alias.clone(), field.name.clone());
                    }
                }
            }
        }

        Ok(Self {
            name,
            table,
            dimensions,
            time_dimensions,
            measures,
            dimension_index,
            time_dimension_index,
            measure_index,
            alias_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn dimensions(&self) -> &[FieldDefinition] {
        &self.dimensions
    }

    pub fn time_dimensions(&self) -> &[FieldDefinition] {
        &self.time_dimensions
    }

    pub fn measures(&self) -> &[FieldDefinition] {
        &self.measures
    }

    pub fn has_time_dimensions(&self) -> bool {
        !self.time_dimensions.is_empty()
    }

    /// Canonical field name for a registered alias
    pub fn canonical_name(&self, alias: &str) -> Option<&str> {
        self.alias_index.get(alias).map(String::as_str)
    }

    /// True if `field` names a dimension or time dimension, directly or by alias
    pub fn resolves_dimension(&self, field: &str) -> bool {
        if self.is_dimension_name(field) {
            return true;
        }
        self.canonical_name(field)
            .map_or(false, |canonical| self.is_dimension_name(canonical))
    }

    /// True if `field` names a measure, directly or by alias
    pub fn resolves_measure(&self, field: &str) -> bool {
        if self.measure_index.contains(field) {
            return true;
        }
        self.canonical_name(field)
            .map_or(false, |canonical| self.measure_index.contains(canonical))
    }

    /// Every name a query may use for this entity: entity, table, fields and aliases
    pub fn identifier_names(&self) -> impl Iterator<Item = &str> {
        let fields = self
            .dimensions
            .iter()
            .chain(&self.time_dimensions)
            .chain(&self.measures);

        [self.name.as_str(), self.table.as_str()]
            .into_iter()
            .chain(fields.flat_map(|f| {
                std::iter::once(f.name.as_str()).chain(f.aliases.iter().map(String::as_str))
            }))
    }

    fn is_dimension_name(&self, field: &str) -> bool {
        self.dimension_index.contains(field) || self.time_dimension_index.contains(field)
    }
}
