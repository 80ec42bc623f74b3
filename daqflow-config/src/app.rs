use crate::ModuleGraph;
use serde::{Deserialize, Serialize};
use serde_loader::Json5Path;

/// A module graph running in one process on a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub graph: ModuleGraph,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Application {
    pub fn new(graph: ModuleGraph, host: impl Into<String>) -> Self {
        Self {
            graph,
            host: host.into(),
        }
    }
}

/// The serialized form of an [Application].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub graph: GraphSource,
    #[serde(default = "default_host")]
    pub host: String,
}

/// A module graph written inline or included from a JSON5 file.
///
/// Relative paths are resolved against the including file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphSource {
    File(Json5Path<ModuleGraph>),
    Inline(ModuleGraph),
}

impl GraphSource {
    pub fn take(self) -> ModuleGraph {
        match self {
            Self::File(file) => file.take(),
            Self::Inline(graph) => graph,
        }
    }
}

impl From<AppConfig> for Application {
    fn from(config: AppConfig) -> Self {
        Self {
            graph: config.graph.take(),
            host: config.host,
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
