//! Topological sorting and cycle detection for start/stop ordering.

use crate::{deps::Deps, error::Error};
use daqflow_config::Ident;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use std::collections::VecDeque;

/// Sort a dependency mapping with Kahn's algorithm.
///
/// The returned order is a start order: every entity comes after all
/// entities connected downstream of it, so consumers are running before
/// their producers emit data. The stop order is its reverse.
///
/// Entities without remaining dependencies are taken first-in first-out,
/// starting with the declaration order of `deps`. Newly freed entities
/// are queued in declaration order. Targets that are not keys of `deps`
/// are treated as entities without dependencies.
///
/// It fails with [Error::CycleDetected] if some dependencies are left
/// after no more entities can be scheduled.
pub fn toposort(deps: &Deps) -> Result<Vec<Ident>, Error> {
    // remaining dependencies of each entity
    let mut remaining: IndexMap<&Ident, IndexSet<&Ident>> = deps
        .iter()
        .map(|(name, downstream)| (name, downstream.iter().collect()))
        .collect();
    for target in deps.values().flatten() {
        remaining.entry(target).or_default();
    }

    // reverse edges: entity -> entities that depend on it
    let mut dependents: IndexMap<&Ident, Vec<&Ident>> = IndexMap::new();
    for (&name, downstream) in &remaining {
        for &target in downstream {
            dependents.entry(target).or_default().push(name);
        }
    }

    let mut ready: VecDeque<&Ident> = remaining
        .iter()
        .filter(|(_, downstream)| downstream.is_empty())
        .map(|(&name, _)| name)
        .collect();
    let mut order = Vec::with_capacity(remaining.len());

    while let Some(name) = ready.pop_front() {
        order.push(name.clone());

        let Some(users) = dependents.get(name) else {
            continue;
        };
        for &user in users {
            let downstream = &mut remaining[user];
            downstream.shift_remove(name);
            if downstream.is_empty() {
                ready.push_back(user);
            }
        }
    }

    if order.len() < remaining.len() {
        let residual: IndexMap<Ident, Vec<Ident>> = remaining
            .into_iter()
            .filter(|(_, downstream)| !downstream.is_empty())
            .map(|(name, downstream)| (name.clone(), downstream.into_iter().cloned().collect()))
            .collect();
        return Err(Error::CycleDetected { residual });
    }

    debug!("inferred start order is {:?}", order);
    Ok(order)
}
