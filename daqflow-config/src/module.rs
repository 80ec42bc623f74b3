use crate::{Connection, Ident, IntoIdent};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An individual module within a graph.
///
/// The plugin name and the configuration are opaque to the generator.
/// `connections` maps each output port to the connection leaving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub plugin: String,
    #[serde(default)]
    pub conf: Value,
    #[serde(default)]
    pub connections: IndexMap<Ident, Connection>,
}

impl Module {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            conf: Value::Null,
            connections: IndexMap::new(),
        }
    }

    pub fn with_conf(mut self, conf: impl Into<Value>) -> Self {
        self.conf = conf.into();
        self
    }

    /// Attach a connection to the output port `port`, replacing any
    /// previous connection of that port.
    pub fn connect(mut self, port: impl IntoIdent, connection: Connection) -> Self {
        self.connections.insert(port.into_ident(), connection);
        self
    }
}
