//! Static engine registry: maps a stable engine id to a factory.

use crate::config::Config;
use crate::engine::{deepl, google, TranslationEngine};
use crate::error::{MtError, MtResult};
use crate::http::HttpClient;
use std::sync::OnceLock;
use tracing::info;

/// Builds an engine from configuration.
pub type EngineFactory = fn(&Config, HttpClient) -> MtResult<Box<dyn TranslationEngine>>;

/// A registered engine.
#[derive(Clone)]
pub struct EngineDescriptor {
    /// Identifier used in configuration (`MT_ENGINE`)
    pub id: &'static str,

    /// Human-readable provider name
    pub label: &'static str,

    /// Fixed identifier, hashed into the language catalog cache key
    pub uuid: &'static str,

    factory: EngineFactory,
}

impl std::fmt::Debug for EngineDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("uuid", &self.uuid)
            .finish()
    }
}

pub struct EngineRegistry {
    engines: Vec<EngineDescriptor>,
}

static REGISTRY: OnceLock<EngineRegistry> = OnceLock::new();

impl EngineRegistry {
    /// The process-wide registry, built on first use.
    pub fn get() -> &'static EngineRegistry {
        REGISTRY.get_or_init(|| EngineRegistry {
            engines: default_engines(),
        })
    }

    pub fn get_by_id(&self, id: &str) -> Option<&EngineDescriptor> {
        self.engines.iter().find(|engine| engine.id == id)
    }

    pub fn list_all(&self) -> &[EngineDescriptor] {
        &self.engines
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.engines.iter().map(|engine| engine.id).collect()
    }

    /// Instantiate the engine registered under `id`.
    ///
    /// # Returns
    /// * `Err(MtError::UnknownEngine)` if nothing is registered under `id`
    /// * `Err(MtError::Config)` if the engine's credentials are missing
    pub fn create(
        &self,
        id: &str,
        config: &Config,
        http: HttpClient,
    ) -> MtResult<Box<dyn TranslationEngine>> {
        let descriptor = self
            .get_by_id(id)
            .ok_or_else(|| MtError::UnknownEngine {
                id: id.to_string(),
                registered: self.ids(),
            })?;

        let engine = (descriptor.factory)(config, http)?;
        info!("Using translation engine: {}", descriptor.label);
        Ok(engine)
    }
}

fn default_engines() -> Vec<EngineDescriptor> {
    vec![
        EngineDescriptor {
            id: deepl::ENGINE_ID,
            label: deepl::ENGINE_LABEL,
            uuid: deepl::ENGINE_UUID,
            factory: |config, http| Ok(Box::new(deepl::DeepLEngine::new(&config.deepl, http)?)),
        },
        EngineDescriptor {
            id: google::ENGINE_ID,
            label: google::ENGINE_LABEL,
            uuid: google::ENGINE_UUID,
            factory: |config, http| {
                Ok(Box::new(google::GoogleCloudTranslationEngine::new(
                    &config.google,
                    http,
                )?))
            },
        },
    ]
}
