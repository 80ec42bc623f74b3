//! Queue inference from the connections of a module graph.

use crate::error::Error;
use daqflow_config::{Destination, Direction, FanIn, Ident, ModuleGraph, PortRef};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::Serialize;

/// A queue to be declared in an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueueSpec {
    pub inst: String,
    pub kind: String,
    pub capacity: usize,
}

/// Attachment of a queue to a port of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueueInfo {
    /// The port name.
    pub name: Ident,
    /// The queue instance name.
    pub inst: String,
    pub dir: Direction,
}

/// The queues of a module graph and their attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Queues {
    pub specs: Vec<QueueSpec>,
    /// The queue attachments of every module, in module declaration order.
    pub attachments: IndexMap<Ident, Vec<QueueInfo>>,
}

impl Queues {
    pub fn attachments_of(&self, module: &Ident) -> &[QueueInfo] {
        self.attachments
            .get(module)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Infer the queues needed by the connections between modules.
///
/// Each connection `m.p -> n.q` gets a queue named `mp_to_nq`, attached
/// as output `p` of `m` and input `q` of `n`. A name already taken gets
/// a numeric suffix. A port bound to a queue
/// may not be bound again in the opposite direction. When several
/// connections converge on one input port, `fan_in` decides whether they
/// get distinct queues or share the first one.
///
/// All destinations must be resolved to module ports.
pub fn make_queues(graph: &ModuleGraph, fan_in: FanIn) -> Result<Queues, Error> {
    let mut specs = vec![];
    let mut names = IndexSet::new();
    let mut attachments: IndexMap<Ident, Vec<QueueInfo>> = graph
        .module_names()
        .map(|name| (name.clone(), vec![]))
        .collect();
    // port -> (direction, queue instance)
    let mut bindings: IndexMap<PortRef, (Direction, String)> = IndexMap::new();

    for (name, module) in &graph.modules {
        for (port, conn) in &module.connections {
            let to = match &conn.to {
                Destination::Port(to) => to,
                Destination::Endpoint(ep) => {
                    return Err(Error::unresolved_endpoint(
                        ep,
                        format!(
                            "connection '{}.{}' must be resolved before queues are inferred",
                            name, port
                        ),
                    ));
                }
            };
            if !graph.modules.contains_key(&to.module) {
                return Err(Error::module_not_found(&to.module));
            }
            let from = PortRef::new(name.clone(), port.clone());
            if from == *to {
                return Err(Error::duplicate_queue_binding(
                    &from,
                    format!("{}_to_{}", from.undotted(), to.undotted()),
                ));
            }

            if let Some((_, inst)) = bindings.get(&from) {
                return Err(Error::duplicate_queue_binding(&from, inst));
            }

            let shared = match bindings.get(to) {
                Some((Direction::Output, inst)) => {
                    return Err(Error::duplicate_queue_binding(to, inst));
                }
                Some((Direction::Input, inst)) if fan_in == FanIn::Shared => Some(inst.clone()),
                _ => None,
            };

            let inst = match shared {
                Some(inst) => {
                    debug!("reuse queue {} for {} -> {}", inst, from, to);
                    inst
                }
                None => {
                    let inst = unique_name(
                        &names,
                        format!("{}_to_{}", from.undotted(), to.undotted()),
                    );
                    names.insert(inst.clone());

                    debug!(
                        "create {}({}) queue with name {} connecting {} to {}",
                        conn.queue_kind, conn.queue_capacity, inst, from, to
                    );
                    specs.push(QueueSpec {
                        inst: inst.clone(),
                        kind: conn.queue_kind.clone(),
                        capacity: conn.queue_capacity,
                    });

                    debug!("add input queue to module {}: inst={}, name={}", to.module, inst, to.port);
                    attachments[&to.module].push(QueueInfo {
                        name: to.port.clone(),
                        inst: inst.clone(),
                        dir: Direction::Input,
                    });
                    bindings
                        .entry(to.clone())
                        .or_insert_with(|| (Direction::Input, inst.clone()));

                    inst
                }
            };

            debug!("add output queue to module {}: inst={}, name={}", name, inst, port);
            attachments[name].push(QueueInfo {
                name: port.clone(),
                inst: inst.clone(),
                dir: Direction::Output,
            });
            bindings.insert(from, (Direction::Output, inst));
        }
    }

    Ok(Queues { specs, attachments })
}

/// Append `_1`, `_2`, ... to `base` until it is not taken.
///
/// Dropping the dots may map unrelated connections, e.g. `ab.c -> x.yz`
/// and `a.bc -> xy.z`, onto the same name.
fn unique_name(names: &IndexSet<String>, base: String) -> String {
    if !names.contains(&base) {
        return base;
    }
    (1..)
        .map(|suffix| format!("{}_{}", base, suffix))
        .find(|name| !names.contains(name))
        .unwrap_or(base)
}
