use crate::{AppConfig, AppConnection, Application, EndpointRef, Ident, IntoIdent, ModuleGraph, Options};
use anyhow::{ensure, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_loader::Json5Path;
use serde_semver::SemverReq;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, SemverReq)]
#[version("0.1.0")]
pub struct Version;

/// The serialized/deserialized system configuration.
///
/// The configuration consists of these components.
/// - `apps`: The applications, each with a host and a module graph
///   written inline or included from another JSON5 file.
/// - `connections`: Connections from `app.endpoint` outputs to one
///   receiver or a set of subscribers.
/// - `network_endpoints`: Optional transport addresses per connection.
///   They are generated when absent.
/// - `app_start_order`: Optional application start order. It is
///   computed from the connections when absent.
/// - `options`: Optional generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Format version
    pub version: Version,
    pub apps: IndexMap<Ident, AppConfig>,
    #[serde(default)]
    pub connections: IndexMap<EndpointRef, AppConnection>,
    pub network_endpoints: Option<IndexMap<EndpointRef, String>>,
    pub app_start_order: Option<Vec<Ident>>,
    #[serde(default)]
    pub options: Options,
}

impl SystemConfig {
    /// Open a system configuration file in JSON5 format.
    pub fn open<F>(file: F) -> Result<Self>
    where
        F: AsRef<Path>,
    {
        let file = file.as_ref();
        Json5Path::open_and_take(file)
            .with_context(|| format!("unable to load '{}'", file.display()))
    }

    /// Build the in-memory system and check the module graphs.
    pub fn into_system(self) -> Result<System> {
        let apps: IndexMap<Ident, Application> = self
            .apps
            .into_iter()
            .map(|(name, app)| (name, Application::from(app)))
            .collect();

        apps.iter().try_for_each(|(name, app)| {
            app.graph
                .check()
                .with_context(|| format!("invalid module graph in application '{}'", name))
        })?;

        if let Some(order) = &self.app_start_order {
            order.iter().try_for_each(|name| {
                ensure!(
                    apps.contains_key(name),
                    "'{}' in app_start_order is not a declared application",
                    name
                );
                Ok(())
            })?;
        }

        Ok(System {
            apps,
            connections: self.connections,
            network_endpoints: self.network_endpoints,
            app_start_order: self.app_start_order,
            bridged: false,
        })
    }
}

/// A full system of applications and the connections between them.
///
/// `connections` maps the upstream endpoint of each connection to its
/// downstream endpoint(s). `network_endpoints` and `app_start_order` are
/// filled in by the generator unless given explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct System {
    pub apps: IndexMap<Ident, Application>,
    pub connections: IndexMap<EndpointRef, AppConnection>,
    pub network_endpoints: Option<IndexMap<EndpointRef, String>>,
    pub app_start_order: Option<Vec<Ident>>,
    bridged: bool,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a system from a JSON5 configuration file.
    pub fn open<F>(file: F) -> Result<Self>
    where
        F: AsRef<Path>,
    {
        SystemConfig::open(file)?.into_system()
    }

    pub fn add_app(&mut self, name: impl IntoIdent, graph: ModuleGraph, host: impl Into<String>) {
        self.apps
            .insert(name.into_ident(), Application::new(graph, host));
    }

    /// Add a connection sourced at the output endpoint `from`.
    pub fn connect(&mut self, from: EndpointRef, connection: AppConnection) {
        self.connections.insert(from, connection);
    }

    /// Whether network bridge modules were already added.
    pub fn is_bridged(&self) -> bool {
        self.bridged
    }

    /// Record that network bridge modules were added.
    pub fn mark_bridged(&mut self) {
        self.bridged = true;
    }
}
