//! Network bridges for connections between applications.
//!
//! Each connection between applications is carried by a pair of bridge
//! modules. A `QueueToNetwork` module in the upstream application reads
//! the local queue of the output endpoint and forwards messages to a
//! transport address. A `NetworkToQueue` module in each downstream
//! application listens on that address and writes into the local queue
//! of the input endpoint. After bridging, every connection in the
//! system is local to one application.

use crate::error::{Error, Warning};
use daqflow_config::{
    AppConnection, Connection, Destination, Direction, EndpointRef, Ident, IntoIdent as _, Module,
    ModuleGraph, Options, PortRef, System,
};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use serde::Serialize;

pub const EGRESS_PLUGIN: &str = "QueueToNetwork";
pub const INGRESS_PLUGIN: &str = "NetworkToQueue";

/// Port of an egress bridge reading the local queue.
pub const EGRESS_INPUT: &str = "input";
/// Port of an ingress bridge writing the local queue.
pub const INGRESS_OUTPUT: &str = "output";

/// Configuration of a `QueueToNetwork` bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EgressConf {
    pub msg_type: String,
    pub msg_module_name: String,
    pub sender_config: SenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderConfig {
    pub ipm_plugin_type: String,
    pub address: String,
    pub topic: String,
    pub stype: String,
}

/// Configuration of a `NetworkToQueue` bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressConf {
    pub msg_type: String,
    pub msg_module_name: String,
    pub receiver_config: ReceiverConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiverConfig {
    pub ipm_plugin_type: String,
    pub address: String,
    pub subscriptions: Vec<String>,
}

/// Look up the internal port of an endpoint of an application.
pub fn resolve_endpoint<'a>(
    system: &'a System,
    endpoint: &EndpointRef,
    direction: Direction,
) -> Result<&'a PortRef, Error> {
    let app = system.apps.get(&endpoint.app).ok_or_else(|| {
        Error::unresolved_endpoint(
            endpoint,
            format!("application '{}' is not declared", endpoint.app),
        )
    })?;
    let ep = app.graph.endpoints.get(&endpoint.endpoint).ok_or_else(|| {
        Error::unresolved_endpoint(endpoint, "the endpoint is not declared")
    })?;
    if ep.direction != direction {
        return Err(Error::wrong_direction(endpoint, direction, ep.direction));
    }

    debug!("endpoint {} resolves to {}", endpoint, ep.internal);
    Ok(&ep.internal)
}

/// Check that every connection starts at an output endpoint and ends at
/// input endpoints of declared applications.
pub fn check_connections(system: &System) -> Result<(), Error> {
    for (from, conn) in &system.connections {
        resolve_endpoint(system, from, Direction::Output)?;
        for to in conn.destination_iter() {
            resolve_endpoint(system, to, Direction::Input)?;
        }
    }
    Ok(())
}

/// Assign a transport address to each connection.
///
/// The address is `tcp://host:port`, where `host` is the host of the
/// upstream application and `port` starts at `first_transport_port`,
/// increasing by one for each connection on that host. `localhost` is
/// replaced by the loopback address.
pub fn assign_network_endpoints(
    system: &System,
    options: &Options,
) -> Result<IndexMap<EndpointRef, String>, Error> {
    let mut endpoints = IndexMap::with_capacity(system.connections.len());
    let mut host_ports: IndexMap<&str, u16> = IndexMap::new();

    for from in system.connections.keys() {
        let app = system.apps.get(&from.app).ok_or_else(|| {
            Error::unresolved_endpoint(from, format!("application '{}' is not declared", from.app))
        })?;
        let host = if app.host == "localhost" {
            options.loopback_address.as_str()
        } else {
            app.host.as_str()
        };

        let count = host_ports.entry(host).or_insert(0);
        let port = options
            .first_transport_port
            .checked_add(*count)
            .ok_or_else(|| Error::PortRangeExhausted { host: host.into() })?;
        *count += 1;

        let address = format!("tcp://{}:{}", host, port);
        debug!("assigned endpoint {} for connection {}", address, from);
        endpoints.insert(from.clone(), address);
    }

    Ok(endpoints)
}

/// Rewrite connections to input endpoints of the graph into connections
/// to the internal ports of those endpoints.
///
/// Connections to output endpoints are left as they are. They are bound
/// to egress bridges by [add_network].
pub fn resolve_local_endpoints(graph: &mut ModuleGraph) {
    let inputs: IndexMap<Ident, PortRef> = graph
        .endpoints
        .iter()
        .filter(|(_, ep)| ep.direction == Direction::Input)
        .map(|(name, ep)| (name.clone(), ep.internal.clone()))
        .collect();

    graph
        .modules
        .values_mut()
        .flat_map(|module| module.connections.values_mut())
        .for_each(|conn| {
            let Destination::Endpoint(ep) = &conn.to else {
                return;
            };
            if let Some(internal) = inputs.get(ep) {
                conn.to = Destination::Port(internal.clone());
            }
        });
}

/// Add the bridge modules needed by the connections between
/// applications, modifying the module graphs of the system in place.
///
/// Transport addresses are taken from `network_endpoints` when the
/// system provides them, otherwise they are assigned and stored. The
/// system is left untouched on error. The function does nothing when the
/// system is already bridged.
///
/// Endpoints that no connection refers to are reported as warnings.
pub fn add_network(system: &mut System, options: &Options) -> Result<Vec<Warning>, Error> {
    if system.is_bridged() {
        debug!("network bridges were already added");
        return Ok(vec![]);
    }

    check_connections(system)?;

    let endpoints = match &system.network_endpoints {
        Some(endpoints) => {
            if let Some(from) = system
                .connections
                .keys()
                .find(|from| !endpoints.contains_key(*from))
            {
                return Err(Error::transport_not_assigned(from));
            }
            endpoints.clone()
        }
        None => assign_network_endpoints(system, options)?,
    };

    let mut warnings = vec![];
    let mut graphs = IndexMap::with_capacity(system.apps.len());

    for app_name in system.apps.keys() {
        info!("add network bridges to application {}", app_name);
        let (graph, unconnected) = bridge_app(system, app_name, &endpoints, options)?;

        for endpoint in unconnected {
            warn!(
                "endpoint {} of application {} is not connected to anything",
                endpoint, app_name
            );
            warnings.push(Warning::UnconnectedEndpoint {
                app: app_name.clone(),
                endpoint,
            });
        }
        graphs.insert(app_name.clone(), graph);
    }

    for (app_name, graph) in graphs {
        system.apps[&app_name].graph = graph;
    }
    system.network_endpoints = Some(endpoints);
    system.mark_bridged();

    Ok(warnings)
}

/// Build the bridged graph of one application and list its unconnected
/// endpoints.
fn bridge_app(
    system: &System,
    app_name: &Ident,
    endpoints: &IndexMap<EndpointRef, String>,
    options: &Options,
) -> Result<(ModuleGraph, Vec<Ident>), Error> {
    let app = &system.apps[app_name];
    let mut graph = app.graph.clone();
    let mut unconnected: IndexSet<Ident> = graph.endpoints.keys().cloned().collect();
    // output endpoint name -> input port of its egress bridge
    let mut egress: IndexMap<Ident, PortRef> = IndexMap::new();
    let mut bridges: Vec<(Ident, Module)> = vec![];

    for (from, conn) in &system.connections {
        let address = &endpoints[from];

        if from.app == *app_name {
            unconnected.shift_remove(&from.endpoint);

            let name = from.bridge_name();
            let ipm_plugin_type = if conn.is_publisher() {
                "ZmqPublisher"
            } else {
                "ZmqSender"
            };
            let conf = EgressConf {
                msg_type: conn.msg_type().into(),
                msg_module_name: conn.msg_module_name().into(),
                sender_config: SenderConfig {
                    ipm_plugin_type: ipm_plugin_type.into(),
                    address: address.clone(),
                    topic: options.topic.clone(),
                    stype: options.serialization.clone(),
                },
            };

            debug!(
                "add {} named {} connected to {} in app {}",
                EGRESS_PLUGIN, name, from.endpoint, app_name
            );
            egress.insert(
                from.endpoint.clone(),
                PortRef::new(name.clone(), EGRESS_INPUT.into_ident()),
            );
            bridges.push((name, Module::new(EGRESS_PLUGIN).with_conf(to_value(&conf)?)));
        }

        for to in conn.destination_iter() {
            if to.app != *app_name {
                continue;
            }
            unconnected.shift_remove(&to.endpoint);

            let internal = resolve_endpoint(system, to, Direction::Input)?;
            let name = to.bridge_name();
            let ipm_plugin_type = match conn {
                AppConnection::Publisher(_) => "ZmqSubscriber",
                AppConnection::Sender(_) => "ZmqReceiver",
            };
            let conf = IngressConf {
                msg_type: conn.msg_type().into(),
                msg_module_name: conn.msg_module_name().into(),
                receiver_config: ReceiverConfig {
                    ipm_plugin_type: ipm_plugin_type.into(),
                    address: address.clone(),
                    subscriptions: vec![options.topic.clone()],
                },
            };

            debug!(
                "add {} named {} connected to {} in app {}",
                INGRESS_PLUGIN, name, internal, app_name
            );
            let module = Module::new(INGRESS_PLUGIN)
                .with_conf(to_value(&conf)?)
                .connect(INGRESS_OUTPUT, Connection::to_port(internal));
            bridges.push((name, module));
        }
    }

    for (name, module) in bridges {
        if graph.modules.contains_key(&name) {
            return Err(Error::duplicate_module(app_name, &name));
        }
        graph.modules.insert(name, module);
    }

    // point connections at output endpoints to the egress bridges
    graph
        .modules
        .values_mut()
        .flat_map(|module| module.connections.values_mut())
        .for_each(|conn| {
            let Destination::Endpoint(ep) = &conn.to else {
                return;
            };
            if let Some(bridge) = egress.get(ep) {
                conn.to = Destination::Port(bridge.clone());
            }
        });
    resolve_local_endpoints(&mut graph);

    // output endpoints without a system connection are left unwired
    let idle: IndexSet<&Ident> = graph
        .endpoints
        .iter()
        .filter(|(name, ep)| ep.direction == Direction::Output && !egress.contains_key(*name))
        .map(|(name, _)| name)
        .collect();
    let mut dropped: Vec<PortRef> = vec![];
    for (name, module) in &mut graph.modules {
        module.connections.retain(|port, conn| match &conn.to {
            Destination::Endpoint(ep) if idle.contains(ep) => {
                dropped.push(PortRef::new(name.clone(), port.clone()));
                false
            }
            _ => true,
        });
    }
    for port in dropped {
        debug!("leave {} unwired in app {}", port, app_name);
    }

    // bind the internal port of each bridged output endpoint
    for (endpoint, bridge) in &egress {
        let internal = graph.endpoints[endpoint].internal.clone();
        let module = graph
            .modules
            .get_mut(&internal.module)
            .ok_or_else(|| Error::module_not_found(&internal.module))?;

        let bound = module
            .connections
            .get(&internal.port)
            .map(|conn| conn.to.as_port() == Some(bridge));
        match bound {
            None => {
                module
                    .connections
                    .insert(internal.port.clone(), Connection::to_port(bridge));
            }
            Some(true) => {}
            Some(false) => return Err(Error::port_already_connected(app_name, &internal)),
        }
    }

    Ok((graph, unconnected.into_iter().collect()))
}

fn to_value<T: Serialize>(conf: &T) -> Result<serde_json::Value, Error> {
    serde_json::to_value(conf).map_err(|err| Error::Other(err.into()))
}
