//! Controller registry.
//!
//! The registry maps lowercase type names to factories and lazily builds at
//! most one controller per type. It is an ordinary value: build one at
//! startup and hand it to whatever needs controllers.
//!
//! # Example
//!
//! ```rust,ignore
//! use liaison_controller::{ControllerRegistry, ControllerSettings, UserController};
//!
//! let registry = ControllerRegistry::standard(ControllerSettings::default(), services);
//! let users = registry.typed::<UserController>("user")?;
//! let me = users.get_current_user().await?;
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

use crate::controller::Controller;
use crate::controllers::{
    ChannelController, FileController, MessageController, NotificationController, UserController,
};
use crate::error::RegistryError;
use crate::pipeline::{ControllerInfo, ControllerMetrics};
use crate::services::Services;
use crate::settings::ControllerSettings;

/// Version reported in [`ControllerMetadata`].
pub const METADATA_VERSION: &str = "1.0.0";

/// Capabilities every controller reports.
pub const CAPABILITIES: [&str; 3] = ["execute", "track", "monitor"];

#[derive(Clone)]
struct Entry {
    controller: Arc<dyn Controller>,
    any: Arc<dyn Any + Send + Sync>,
}

impl Entry {
    fn new<C: Controller>(controller: C) -> Self {
        let controller = Arc::new(controller);
        Self {
            controller: controller.clone(),
            any: controller,
        }
    }
}

type Factory = Arc<dyn Fn(&ControllerSettings, &Services) -> Entry + Send + Sync>;

/// Descriptive metadata of a built controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerMetadata {
    /// Controller name, e.g. `UserController`.
    pub name: String,
    /// Metadata version.
    pub version: String,
    /// One-line description.
    pub description: String,
    /// Other controller types this one needs.
    pub dependencies: Vec<String>,
    /// What the controller supports.
    pub capabilities: Vec<String>,
}

/// Per-controller report of [`ControllerRegistry::controller_stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerStats {
    /// State snapshot.
    pub info: ControllerInfo,
    /// Operation counters.
    pub metrics: ControllerMetrics,
    /// Whether the controller is initialized.
    pub is_active: bool,
}

/// Summary of [`ControllerRegistry::factory_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryInfo {
    /// Controllers built.
    pub total_controllers: usize,
    /// Built controllers that are initialized.
    pub active_controllers: usize,
    /// Type names of the built controllers.
    pub controller_types: Vec<String>,
}

/// Builds and owns controllers by type name.
pub struct ControllerRegistry {
    settings: ControllerSettings,
    services: Services,
    factories: BTreeMap<String, Factory>,
    controllers: RwLock<BTreeMap<String, Entry>>,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("settings", &self.settings)
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("controllers", &self.controllers.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ControllerRegistry {
    /// Creates a registry without factories.
    pub fn new(settings: ControllerSettings, services: Services) -> Self {
        Self {
            settings,
            services,
            factories: BTreeMap::new(),
            controllers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a registry with the five standard controllers:
    /// `user`, `channel`, `message`, `file` and `notification`.
    pub fn standard(settings: ControllerSettings, services: Services) -> Self {
        Self::new(settings, services)
            .with_factory("user", UserController::new)
            .with_factory("channel", ChannelController::new)
            .with_factory("message", MessageController::new)
            .with_factory("file", FileController::new)
            .with_factory("notification", NotificationController::new)
    }

    /// Registers a factory under `type_name`, replacing any previous one.
    pub fn register_factory<C, F>(&mut self, type_name: &str, factory: F)
    where
        C: Controller,
        F: Fn(&ControllerSettings, &Services) -> C + Send + Sync + 'static,
    {
        self.factories.insert(
            type_name.to_lowercase(),
            Arc::new(move |settings: &ControllerSettings, services: &Services| {
                Entry::new(factory(settings, services))
            }),
        );
    }

    /// Builder form of [`Self::register_factory`].
    #[must_use]
    pub fn with_factory<C, F>(mut self, type_name: &str, factory: F) -> Self
    where
        C: Controller,
        F: Fn(&ControllerSettings, &Services) -> C + Send + Sync + 'static,
    {
        self.register_factory(type_name, factory);
        self
    }

    /// Returns the registered type names.
    pub fn registered_types(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Returns the settings controllers are built with.
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    fn entry(&self, type_name: &str) -> Result<Entry, RegistryError> {
        let key = type_name.to_lowercase();
        if let Some(entry) = self.controllers.read().get(&key) {
            return Ok(entry.clone());
        }

        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;

        let mut controllers = self.controllers.write();
        let entry = controllers
            .entry(key)
            .or_insert_with_key(|key| {
                let entry = factory(&self.settings, &self.services);
                tracing::info!(
                    type_name = %key,
                    controller = entry.controller.name(),
                    "controller created"
                );
                entry
            })
            .clone();
        Ok(entry)
    }

    /// Returns the controller of `type_name`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownType`] if no factory is registered.
    pub fn create_controller(&self, type_name: &str) -> Result<Arc<dyn Controller>, RegistryError> {
        self.entry(type_name).map(|entry| entry.controller)
    }

    /// Like [`Self::create_controller`], returning the concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownType`] for unregistered names and
    /// [`RegistryError::TypeMismatch`] if the controller is not a `C`.
    pub fn typed<C: Controller>(&self, type_name: &str) -> Result<Arc<C>, RegistryError> {
        self.entry(type_name)?
            .any
            .downcast::<C>()
            .map_err(|_| RegistryError::TypeMismatch {
                type_name: type_name.to_lowercase(),
                expected: std::any::type_name::<C>(),
            })
    }

    /// Returns an already built controller.
    pub fn get_controller(&self, type_name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers
            .read()
            .get(&type_name.to_lowercase())
            .map(|entry| Arc::clone(&entry.controller))
    }

    /// Returns every built controller by type name.
    pub fn controllers(&self) -> BTreeMap<String, Arc<dyn Controller>> {
        self.controllers
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), Arc::clone(&entry.controller)))
            .collect()
    }

    /// Cleans up and drops a controller. Returns whether one was built.
    pub async fn remove_controller(&self, type_name: &str) -> bool {
        let removed = self.controllers.write().remove(&type_name.to_lowercase());
        match removed {
            Some(entry) => {
                entry.controller.cleanup().await;
                tracing::info!(type_name = %type_name.to_lowercase(), "controller removed");
                true
            }
            None => false,
        }
    }

    /// Initializes every built controller concurrently.
    pub async fn initialize_all_controllers(&self) {
        let controllers = self.controllers();
        join_all(controllers.values().map(|controller| controller.initialize())).await;
        tracing::info!(count = controllers.len(), "controllers initialized");
    }

    /// Cleans up every built controller concurrently, then drops them all.
    pub async fn cleanup_all_controllers(&self) {
        let entries = std::mem::take(&mut *self.controllers.write());
        join_all(entries.values().map(|entry| entry.controller.cleanup())).await;
        tracing::info!(count = entries.len(), "controllers cleaned up");
    }

    /// Returns info and counters of every built controller.
    pub fn controller_stats(&self) -> BTreeMap<String, ControllerStats> {
        self.controllers()
            .into_iter()
            .map(|(key, controller)| {
                let stats = ControllerStats {
                    info: controller.info(),
                    metrics: controller.metrics(),
                    is_active: controller.is_active(),
                };
                (key, stats)
            })
            .collect()
    }

    /// Summarizes the built controllers.
    pub fn factory_info(&self) -> FactoryInfo {
        let controllers = self.controllers();
        FactoryInfo {
            total_controllers: controllers.len(),
            active_controllers: controllers.values().filter(|c| c.is_active()).count(),
            controller_types: controllers.into_keys().collect(),
        }
    }

    /// Returns metadata for an already built controller.
    pub fn controller_metadata(&self, type_name: &str) -> Option<ControllerMetadata> {
        let controller = self.get_controller(type_name)?;
        let name = controller.name().to_string();
        Some(ControllerMetadata {
            description: format!("{name} controller"),
            name,
            version: METADATA_VERSION.to_string(),
            dependencies: Vec::new(),
            capabilities: CAPABILITIES.iter().map(ToString::to_string).collect(),
        })
    }

    /// Serializes [`Self::controller_stats`] for a debug monitor.
    pub fn stats_json(&self) -> serde_json::Value {
        json!({
            "factory": self.factory_info(),
            "controllers": self.controller_stats(),
        })
    }
}
