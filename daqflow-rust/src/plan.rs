//! Command plans of applications and of the whole system.

use crate::{
    deps::{app_deps, module_deps},
    error::Error,
    queues::{make_queues, QueueInfo, QueueSpec},
    toposort::toposort,
};
use daqflow_config::{Ident, ModuleGraph, Options, System};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::{
    fmt,
    fmt::Display,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// The commands of a plan, in the order an operator issues them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Conf,
    Start,
    Stop,
    Pause,
    Resume,
    Scrap,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Self::Init,
        Self::Conf,
        Self::Start,
        Self::Stop,
        Self::Pause,
        Self::Resume,
        Self::Scrap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Conf => "conf",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Scrap => "scrap",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// The declarations of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Init {
    pub queues: Vec<QueueSpec>,
    pub modules: Vec<ModuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSpec {
    pub inst: Ident,
    pub plugin: String,
    pub queues: Vec<QueueInfo>,
}

/// A command payload addressed to one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressedCommand {
    pub module: Ident,
    pub data: Value,
}

/// The command plan of one application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppPlan {
    pub init: Init,
    /// Module configurations in module declaration order.
    pub conf: IndexMap<Ident, Value>,
    pub start: Vec<Ident>,
    pub stop: Vec<Ident>,
    pub pause: Vec<AddressedCommand>,
    pub resume: Vec<AddressedCommand>,
    pub scrap: Vec<Ident>,
}

/// Supplies the payloads of the optional `pause` and `resume` commands.
///
/// The generator itself leaves both commands empty.
pub trait PhaseExtension {
    fn pause(&self, _app: &Ident, _graph: &ModuleGraph) -> Vec<AddressedCommand> {
        vec![]
    }

    fn resume(&self, _app: &Ident, _graph: &ModuleGraph) -> Vec<AddressedCommand> {
        vec![]
    }
}

/// The extension producing empty `pause` and `resume` commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtension;

impl PhaseExtension for NoExtension {}

/// Build the command plan of an application from its module graph.
///
/// The queues are inferred from the connections between modules, as are
/// the start and stop orders of the modules. All endpoint references
/// must be resolved.
pub fn make_app_plan<E>(
    app: &Ident,
    graph: &ModuleGraph,
    options: &Options,
    extension: &E,
) -> Result<AppPlan, Error>
where
    E: PhaseExtension + ?Sized,
{
    let deps = module_deps(graph)?;
    let start = toposort(&deps)?;
    let stop: Vec<_> = start.iter().rev().cloned().collect();
    debug!("module start order of {} is {:?}", app, start);
    debug!("module stop order of {} is {:?}", app, stop);

    let queues = make_queues(graph, options.fan_in)?;

    let modules = graph
        .modules
        .iter()
        .map(|(name, module)| ModuleSpec {
            inst: name.clone(),
            plugin: module.plugin.clone(),
            queues: queues.attachments_of(name).to_vec(),
        })
        .collect();
    let conf = graph
        .modules
        .iter()
        .map(|(name, module)| (name.clone(), module.conf.clone()))
        .collect();

    Ok(AppPlan {
        init: Init {
            queues: queues.specs,
            modules,
        },
        conf,
        pause: extension.pause(app, graph),
        resume: extension.resume(app, graph),
        scrap: stop.clone(),
        start,
        stop,
    })
}

/// A system command: the per-application plan each application receives
/// and, for ordered commands, the application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemCommand {
    pub apps: IndexMap<Ident, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<Ident>>,
}

/// The deployment of applications to hosts, read by the process launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub apps: IndexMap<Ident, AppDeployment>,
    /// Host label to host name.
    pub hosts: IndexMap<String, String>,
    pub response_listener: ResponseListener,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppDeployment {
    pub exec: String,
    /// The label of the host in [Deployment::hosts].
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseListener {
    pub port: u16,
}

/// The command plan of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemPlan {
    pub commands: IndexMap<Phase, SystemCommand>,
    pub boot: Deployment,
}

impl SystemPlan {
    pub fn command(&self, phase: Phase) -> &SystemCommand {
        &self.commands[&phase]
    }
}

/// Build the system command plan.
///
/// The application start order is taken from the system when given,
/// in which case it must list every application exactly once. Otherwise it is inferred from the connections between applications
/// and stored in the system.
pub fn make_system_plan(system: &mut System, options: &Options) -> Result<SystemPlan, Error> {
    let start_order = match &system.app_start_order {
        Some(order) => {
            check_app_order(system, order)?;
            order.clone()
        }
        None => {
            let deps = app_deps(system)?;
            let order = toposort(&deps)?;
            system.app_start_order = Some(order.clone());
            order
        }
    };
    let stop_order: Vec<_> = start_order.iter().rev().cloned().collect();
    debug!("application start order is {:?}", start_order);

    let commands = Phase::ALL
        .into_iter()
        .map(|phase| {
            let apps = system
                .apps
                .keys()
                .map(|name| {
                    let plan = format!("{}/{}_{}", options.plan_dir, name, phase);
                    (name.clone(), plan)
                })
                .collect();
            let order = match phase {
                Phase::Start => Some(start_order.clone()),
                Phase::Stop | Phase::Scrap => Some(stop_order.clone()),
                _ => None,
            };
            (phase, SystemCommand { apps, order })
        })
        .collect();

    let boot = make_deployment(system, options)?;

    Ok(SystemPlan { commands, boot })
}

/// Check that a given start order lists every application exactly once.
fn check_app_order(system: &System, order: &[Ident]) -> Result<(), Error> {
    let mut seen = IndexSet::new();
    for name in order {
        if !system.apps.contains_key(name) {
            return Err(Error::invalid_app_order(format!(
                "`{}` is not a declared application",
                name
            )));
        }
        if !seen.insert(name) {
            return Err(Error::invalid_app_order(format!(
                "`{}` is listed more than once",
                name
            )));
        }
    }
    let missing: Vec<_> = system
        .apps
        .keys()
        .filter(|name| !seen.contains(name))
        .map(Ident::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(Error::invalid_app_order(format!(
            "missing applications {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn make_deployment(system: &System, options: &Options) -> Result<Deployment, Error> {
    let apps: IndexMap<_, _> = system
        .apps
        .keys()
        .enumerate()
        .map(|(index, name)| -> Result<_, Error> {
            let port = u16::try_from(index)
                .ok()
                .and_then(|index| options.first_app_port.checked_add(index))
                .ok_or_else(|| Error::PortRangeExhausted {
                    host: format!("host_{}", name),
                })?;
            let deployment = AppDeployment {
                exec: options.exec.clone(),
                host: format!("host_{}", name),
                port,
            };
            Ok((name.clone(), deployment))
        })
        .collect::<Result<_, _>>()?;
    let hosts = system
        .apps
        .iter()
        .map(|(name, app)| (format!("host_{}", name), app.host.clone()))
        .collect();

    Ok(Deployment {
        apps,
        hosts,
        response_listener: ResponseListener {
            port: options.response_listener_port,
        },
    })
}

impl AppPlan {
    /// Save the queue wiring to a GraphViz DOT file.
    pub fn save_dot_file<F>(&self, file: F) -> Result<(), Error>
    where
        F: AsRef<Path>,
    {
        let mut writer = BufWriter::new(File::create(file)?);
        self.render_dot(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Render the queue wiring in GraphViz DOT format.
    pub fn render_dot<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        dot::render(self, writer)
    }
}

mod graphviz {
    use super::*;
    use daqflow_config::Direction;
    use dot::{Edges, GraphWalk, Id, LabelText, Labeller, Nodes};
    use itertools::chain;
    use std::borrow::Cow;

    #[derive(Clone)]
    pub(crate) enum Node<'a> {
        Module(&'a ModuleSpec),
        Queue(&'a QueueSpec),
    }

    #[derive(Clone)]
    pub(crate) struct Edge<'a> {
        source: Node<'a>,
        target: Node<'a>,
        port: &'a Ident,
    }

    fn sanitize(prefix: &str, name: &str) -> String {
        format!("{}_{}", prefix, name.replace('-', "_"))
    }

    impl<'a> Labeller<'a, Node<'a>, Edge<'a>> for AppPlan {
        fn graph_id(&'a self) -> Id<'a> {
            Id::new("app_plan").unwrap()
        }

        fn node_id(&'a self, node: &Node<'a>) -> Id<'a> {
            let id = match node {
                Node::Module(module) => sanitize("m", module.inst.as_str()),
                Node::Queue(queue) => sanitize("q", &queue.inst),
            };
            Id::new(id).unwrap()
        }

        fn node_label(&'a self, node: &Node<'a>) -> LabelText<'a> {
            let label = match node {
                Node::Module(module) => format!("{}\n{}", module.inst, module.plugin),
                Node::Queue(queue) => format!("{}\n{}({})", queue.inst, queue.kind, queue.capacity),
            };
            LabelText::LabelStr(label.into())
        }

        fn node_shape(&'a self, node: &Node<'a>) -> Option<LabelText<'a>> {
            let shape = match node {
                Node::Module(_) => "box",
                Node::Queue(_) => "hexagon",
            };
            Some(LabelText::LabelStr(shape.into()))
        }

        fn edge_label(&'a self, edge: &Edge<'a>) -> LabelText<'a> {
            LabelText::LabelStr(edge.port.as_str().into())
        }
    }

    impl<'a> GraphWalk<'a, Node<'a>, Edge<'a>> for AppPlan {
        fn nodes(&'a self) -> Nodes<'a, Node<'a>> {
            let modules = self.init.modules.iter().map(Node::Module);
            let queues = self.init.queues.iter().map(Node::Queue);
            let nodes: Vec<_> = chain!(modules, queues).collect();
            Cow::Owned(nodes)
        }

        fn edges(&'a self) -> Edges<'a, Edge<'a>> {
            let queues: IndexMap<&str, &QueueSpec> = self
                .init
                .queues
                .iter()
                .map(|queue| (queue.inst.as_str(), queue))
                .collect();

            let edges: Vec<_> = self
                .init
                .modules
                .iter()
                .flat_map(|module| {
                    let queues = &queues;
                    module.queues.iter().filter_map(move |info| {
                        let queue = Node::Queue(queues.get(info.inst.as_str()).copied()?);
                        let module = Node::Module(module);
                        let (source, target) = match info.dir {
                            Direction::Output => (module, queue),
                            Direction::Input => (queue, module),
                        };
                        Some(Edge {
                            source,
                            target,
                            port: &info.name,
                        })
                    })
                })
                .collect();

            Cow::Owned(edges)
        }

        fn source(&'a self, edge: &Edge<'a>) -> Node<'a> {
            edge.source.clone()
        }

        fn target(&'a self, edge: &Edge<'a>) -> Node<'a> {
            edge.target.clone()
        }
    }
}
