//! Dependency graphs between modules and between applications.

use crate::error::Error;
use daqflow_config::{Destination, Ident, ModuleGraph, System};
use indexmap::IndexMap;
use log::debug;

/// Maps each entity to the entities connected downstream of it.
///
/// Every entity is a key, including those without downstream
/// connections.
pub type Deps = IndexMap<Ident, Vec<Ident>>;

/// Produce the dependencies between the modules of a graph.
///
/// A dependency is any connection between two modules, except for
/// connections with `toposort` disabled. Those still carry data but are
/// left out here, which allows cycles in the data flow.
pub fn module_deps(graph: &ModuleGraph) -> Result<Deps, Error> {
    let mut deps = Deps::with_capacity(graph.modules.len());

    for (name, module) in &graph.modules {
        let mut downstream = vec![];

        for (port, conn) in &module.connections {
            if !conn.toposort {
                continue;
            }

            let to = match &conn.to {
                Destination::Port(to) => to,
                Destination::Endpoint(ep) => {
                    return Err(Error::unresolved_endpoint(
                        ep,
                        format!("connection '{}.{}' is not resolved to a module port", name, port),
                    ));
                }
            };

            if !graph.modules.contains_key(&to.module) {
                return Err(Error::module_not_found(&to.module));
            }

            if !downstream.contains(&to.module) {
                downstream.push(to.module.clone());
            }
        }

        deps.insert(name.clone(), downstream);
    }

    debug!("inter-module dependencies are {:?}", deps);
    Ok(deps)
}

/// Produce the dependencies between the applications of a system.
///
/// The result is analogous to [module_deps]: each application maps to
/// the applications that receive data from it. An application sending
/// to itself adds no dependency.
pub fn app_deps(system: &System) -> Result<Deps, Error> {
    let mut deps: Deps = system
        .apps
        .keys()
        .map(|name| (name.clone(), vec![]))
        .collect();

    for (from, conn) in &system.connections {
        let downstream = deps.get_mut(&from.app).ok_or_else(|| {
            Error::unresolved_endpoint(from, format!("application '{}' is not declared", from.app))
        })?;

        for to in conn.destination_iter() {
            if !system.apps.contains_key(&to.app) {
                return Err(Error::unresolved_endpoint(
                    to,
                    format!("application '{}' is not declared", to.app),
                ));
            }

            if to.app != from.app && !downstream.contains(&to.app) {
                downstream.push(to.app.clone());
            }
        }
    }

    debug!("inter-application dependencies are {:?}", deps);
    Ok(deps)
}
