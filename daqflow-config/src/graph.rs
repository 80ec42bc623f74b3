use crate::{
    Connection, Destination, Direction, Endpoint, Ident, IntoIdent, IntoPortRef, Module,
};
use anyhow::{ensure, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A set of modules and the connections between them.
///
/// Each module knows its outgoing connections to other modules in the
/// same graph. Connections to other graphs, which may live in a
/// different application, go through `endpoints`. The endpoint name is
/// the public name of the connection, while its internal port may be
/// changed without affecting other applications.
///
/// The graph is valid if
/// - every `module.port` destination refers to a declared module,
/// - every endpoint destination refers to a declared endpoint, and
/// - every endpoint refers to a declared module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleGraph {
    #[serde(default)]
    pub modules: IndexMap<Ident, Module>,
    #[serde(default)]
    pub endpoints: IndexMap<Ident, Endpoint>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_names(&self) -> impl Iterator<Item = &Ident> {
        self.modules.keys()
    }

    pub fn module(&self, name: &Ident) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Insert a module. A module with the same name is replaced.
    pub fn add_module(&mut self, name: impl IntoIdent, module: Module) -> &mut Module {
        let name = name.into_ident();
        self.modules.insert(name.clone(), module);
        &mut self.modules[&name]
    }

    /// Connect the output port `from` to `to`.
    ///
    /// It panics if the source module is not declared.
    pub fn add_connection(&mut self, from: impl IntoPortRef, to: impl Into<Destination>) {
        let from = from.into_port_ref();
        let module = self
            .modules
            .get_mut(&from.module)
            .unwrap_or_else(|| panic!("module '{}' is not declared", from.module));
        module.connections.insert(from.port, Connection::new(to));
    }

    /// Declare a public endpoint mapped to an internal port.
    pub fn add_endpoint(
        &mut self,
        external: impl IntoIdent,
        internal: impl IntoPortRef,
        direction: Direction,
    ) {
        let endpoint = Endpoint {
            internal: internal.into_port_ref(),
            direction,
        };
        self.endpoints.insert(external.into_ident(), endpoint);
    }

    /// List endpoint names, optionally only those of one direction.
    pub fn endpoint_names(&self, direction: Option<Direction>) -> Vec<&Ident> {
        self.endpoints
            .iter()
            .filter(|(_, ep)| direction.map_or(true, |dir| ep.direction == dir))
            .map(|(name, _)| name)
            .collect()
    }

    /// Check the references within the graph.
    pub fn check(&self) -> Result<()> {
        self.modules.iter().try_for_each(|(name, module)| {
            module.connections.iter().try_for_each(|(port, conn)| {
                match &conn.to {
                    Destination::Port(to) => ensure!(
                        self.modules.contains_key(&to.module),
                        "connection '{}.{}' refers to undeclared module '{}'",
                        name,
                        port,
                        to.module
                    ),
                    Destination::Endpoint(ep) => ensure!(
                        self.endpoints.contains_key(ep),
                        "connection '{}.{}' refers to undeclared endpoint '{}'",
                        name,
                        port,
                        ep
                    ),
                }
                Ok(())
            })
        })?;

        self.endpoints.iter().try_for_each(|(name, ep)| {
            ensure!(
                self.modules.contains_key(&ep.internal.module),
                "endpoint '{}' refers to undeclared module '{}'",
                name,
                ep.internal.module
            );
            Ok(())
        })?;

        Ok(())
    }
}
