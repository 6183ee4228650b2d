//! Inventory model factory.
//!
//! Maps registry names to constructors. Built-in models are registered up
//! front; callers may register more at runtime.

use crate::inventory::ModelInfo;
use crate::{avellaneda_stoikov, glft, simple, InventoryModel};
use crate::{AvellanedaStoikovModel, GlftModel, SimpleModel};
use asymlp_core::{Config, Error, Result};
use std::collections::BTreeMap;
use tracing::info;

/// Builds a model from configuration.
pub type ModelConstructor = fn(&Config) -> Box<dyn InventoryModel>;

/// The models shipped with this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    Simple,
    AvellanedaStoikov,
    Glft,
}

impl BuiltinModel {
    pub const ALL: [BuiltinModel; 3] = [
        BuiltinModel::Simple,
        BuiltinModel::AvellanedaStoikov,
        BuiltinModel::Glft,
    ];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinModel::Simple => simple::NAME,
            BuiltinModel::AvellanedaStoikov => avellaneda_stoikov::NAME,
            BuiltinModel::Glft => glft::NAME,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BuiltinModel::Simple => "Simple inventory-based range adjustment",
            BuiltinModel::AvellanedaStoikov => {
                "Avellaneda-Stoikov market making model with volatility-adjusted spreads"
            }
            BuiltinModel::Glft => {
                "Gueant-Lehalle-Fernandez-Tapia model with execution costs and inventory constraints"
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn build(self, config: &Config) -> Box<dyn InventoryModel> {
        match self {
            BuiltinModel::Simple => Box::new(SimpleModel::new(config)),
            BuiltinModel::AvellanedaStoikov => Box::new(AvellanedaStoikovModel::new(config)),
            BuiltinModel::Glft => Box::new(GlftModel::new(config)),
        }
    }
}

#[derive(Clone)]
struct Registration {
    description: String,
    constructor: ModelConstructor,
}

/// Name-keyed model registry.
#[derive(Clone)]
pub struct ModelFactory {
    registry: BTreeMap<String, Registration>,
}

impl Default for ModelFactory {
    fn default() -> Self {
        Self::with_builtin_models()
    }
}

impl ModelFactory {
    /// Empty registry.
    pub fn empty() -> Self {
        Self {
            registry: BTreeMap::new(),
        }
    }

    /// Registry holding every [`BuiltinModel`].
    pub fn with_builtin_models() -> Self {
        let mut factory = Self::empty();
        factory.register(
            BuiltinModel::Simple.name(),
            BuiltinModel::Simple.description(),
            |c| BuiltinModel::Simple.build(c),
        );
        factory.register(
            BuiltinModel::AvellanedaStoikov.name(),
            BuiltinModel::AvellanedaStoikov.description(),
            |c| BuiltinModel::AvellanedaStoikov.build(c),
        );
        factory.register(
            BuiltinModel::Glft.name(),
            BuiltinModel::Glft.description(),
            |c| BuiltinModel::Glft.build(c),
        );
        factory
    }

    /// Add or replace a model under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        constructor: ModelConstructor,
    ) {
        let name = name.into();
        info!(model = %name, "Registered inventory model");
        self.registry.insert(
            name,
            Registration {
                description: description.into(),
                constructor,
            },
        );
    }

    /// Build the model registered under `name`.
    pub fn create(&self, name: &str, config: &Config) -> Result<Box<dyn InventoryModel>> {
        let registration = self
            .registry
            .get(name)
            .ok_or_else(|| Error::unknown_model(name, self.names()))?;
        info!(model = name, "Created inventory model");
        Ok((registration.constructor)(config))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    /// `(name, description)` for every registered model.
    pub fn available_models(&self) -> Vec<(String, String)> {
        self.registry
            .iter()
            .map(|(name, r)| (name.clone(), r.description.clone()))
            .collect()
    }

    /// Info for a model built with default configuration.
    pub fn model_info(&self, name: &str) -> Result<ModelInfo> {
        Ok(self.create(name, &Config::default())?.model_info())
    }
}
