use anyhow::Result;
use daqflow::{
    add_network, assign_network_endpoints, resolve_endpoint, Error, Generator, Warning,
    EGRESS_PLUGIN, INGRESS_PLUGIN,
};
use daqflow_config::{
    AppConnection, Connection, Destination, Direction, EndpointRef, IntoIdent, IntoPortRef, Module,
    ModuleGraph, Options, System,
};
use indexmap::IndexMap;

fn producer_graph() -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    graph.add_module(
        "tpm",
        Module::new("TriggerPrimitiveMaker").connect("tpset_sink", Connection::to_endpoint("tpsets_out")),
    );
    graph.add_endpoint("tpsets_out", "tpm.tpset_sink", Direction::Output);
    graph
}

fn consumer_graph() -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    graph.add_module("tps_sink", Module::new("TPSetSink"));
    graph.add_endpoint("tpsets_in", "tps_sink.tpset_source", Direction::Input);
    graph
}

fn fan_out_system() -> System {
    let mut system = System::new();
    system.add_app("producer", producer_graph(), "localhost");
    system.add_app("consumer1", consumer_graph(), "localhost");
    system.add_app("consumer2", consumer_graph(), "localhost");
    system.connect(
        EndpointRef::new("producer", "tpsets_out"),
        AppConnection::publisher(
            "dunedaq::trigger::TPSet",
            "TPSetNQ",
            [
                EndpointRef::new("consumer1", "tpsets_in"),
                EndpointRef::new("consumer2", "tpsets_in"),
            ],
        ),
    );
    system
}

#[test]
fn fan_out_test() -> Result<()> {
    let mut system = fan_out_system();
    let warnings = add_network(&mut system, &Options::default())?;
    assert!(warnings.is_empty());
    assert!(system.is_bridged());

    let address = "tcp://127.0.0.1:12345";
    let from = EndpointRef::new("producer", "tpsets_out");
    assert_eq!(system.network_endpoints.as_ref().unwrap()[&from], address);

    // one egress bridge in the producer
    let producer = &system.apps["producer"].graph;
    let egress = &producer.modules["producer_tpsets_out"];
    assert_eq!(egress.plugin, EGRESS_PLUGIN);
    assert_eq!(egress.conf["sender_config"]["ipm_plugin_type"], "ZmqPublisher");
    assert_eq!(egress.conf["sender_config"]["address"], address);
    assert_eq!(egress.conf["sender_config"]["topic"], "foo");
    assert_eq!(egress.conf["sender_config"]["stype"], "msgpack");
    assert_eq!(egress.conf["msg_module_name"], "TPSetNQ");
    assert_eq!(
        producer.modules["tpm"].connections["tpset_sink"].to,
        Destination::port("producer_tpsets_out.input")
    );

    // one ingress bridge in each consumer, all on the same address
    for app in ["consumer1", "consumer2"] {
        let graph = &system.apps[app].graph;
        let name = format!("{}_tpsets_in", app);
        let ingress = &graph.modules[name.as_str()];
        assert_eq!(ingress.plugin, INGRESS_PLUGIN);
        assert_eq!(ingress.conf["receiver_config"]["ipm_plugin_type"], "ZmqSubscriber");
        assert_eq!(ingress.conf["receiver_config"]["address"], address);
        assert_eq!(ingress.conf["receiver_config"]["subscriptions"][0], "foo");
        assert_eq!(
            ingress.connections["output"].to,
            Destination::port("tps_sink.tpset_source")
        );
    }

    let bridges = system
        .apps
        .values()
        .flat_map(|app| app.graph.modules.values())
        .filter(|module| module.plugin == EGRESS_PLUGIN || module.plugin == INGRESS_PLUGIN)
        .count();
    assert_eq!(bridges, 3);

    Ok(())
}

#[test]
fn sender_test() -> Result<()> {
    let mut system = System::new();
    // the output port is not connected yet and is bound to the bridge
    let mut graph = ModuleGraph::new();
    graph.add_module("tpm", Module::new("TriggerPrimitiveMaker"));
    graph.add_endpoint("tpsets_out", "tpm.tpset_sink", Direction::Output);
    system.add_app("producer", graph, "daq-01");
    system.add_app("consumer", consumer_graph(), "daq-02");
    system.connect(
        EndpointRef::new("producer", "tpsets_out"),
        AppConnection::sender(
            "dunedaq::trigger::TPSet",
            "TPSetNQ",
            EndpointRef::new("consumer", "tpsets_in"),
        ),
    );

    add_network(&mut system, &Options::default())?;

    let producer = &system.apps["producer"].graph;
    assert_eq!(
        producer.modules["tpm"].connections["tpset_sink"].to,
        Destination::port("producer_tpsets_out.input")
    );
    let egress = &producer.modules["producer_tpsets_out"];
    assert_eq!(egress.conf["sender_config"]["ipm_plugin_type"], "ZmqSender");
    assert_eq!(egress.conf["sender_config"]["address"], "tcp://daq-01:12345");

    let ingress = &system.apps["consumer"].graph.modules["consumer_tpsets_in"];
    assert_eq!(ingress.conf["receiver_config"]["ipm_plugin_type"], "ZmqReceiver");
    Ok(())
}

#[test]
fn address_per_host_test() -> Result<()> {
    let mut system = System::new();
    let mut graph = producer_graph();
    graph.add_module("aux", Module::new("Aux"));
    graph.add_endpoint("aux_out", "aux.output", Direction::Output);
    system.add_app("a", graph, "localhost");
    system.add_app("b", producer_graph(), "daq-02");
    system.add_app("c", consumer_graph(), "daq-03");

    let mut sink = consumer_graph();
    sink.add_endpoint("aux_in", "tps_sink.aux_source", Direction::Input);
    system.add_app("d", sink, "daq-03");

    system.connect(
        EndpointRef::new("a", "tpsets_out"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("c", "tpsets_in")),
    );
    system.connect(
        EndpointRef::new("b", "tpsets_out"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("d", "tpsets_in")),
    );
    system.connect(
        EndpointRef::new("a", "aux_out"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("d", "aux_in")),
    );

    let options = Options {
        first_transport_port: 20000,
        ..Options::default()
    };
    let endpoints = assign_network_endpoints(&system, &options)?;
    let addresses: Vec<_> = endpoints.values().map(String::as_str).collect();
    assert_eq!(
        addresses,
        [
            "tcp://127.0.0.1:20000",
            "tcp://daq-02:20000",
            "tcp://127.0.0.1:20001",
        ]
    );
    Ok(())
}

#[test]
fn precomputed_endpoints_test() -> Result<()> {
    let mut system = fan_out_system();
    let from = EndpointRef::new("producer", "tpsets_out");
    let precomputed: IndexMap<_, _> = [(from, "tcp://10.0.0.1:5000".to_string())]
        .into_iter()
        .collect();
    system.network_endpoints = Some(precomputed.clone());

    add_network(&mut system, &Options::default())?;
    assert_eq!(system.network_endpoints, Some(precomputed));

    let ingress = &system.apps["consumer1"].graph.modules["consumer1_tpsets_in"];
    assert_eq!(ingress.conf["receiver_config"]["address"], "tcp://10.0.0.1:5000");
    Ok(())
}

#[test]
fn missing_transport_test() -> Result<()> {
    let mut system = fan_out_system();
    system.network_endpoints = Some(IndexMap::new());
    let before = system.clone();

    let result = add_network(&mut system, &Options::default());
    assert!(matches!(result, Err(Error::TransportNotAssigned { .. })));
    assert_eq!(system, before);
    Ok(())
}

#[test]
fn bridge_once_test() -> Result<()> {
    let mut system = fan_out_system();
    add_network(&mut system, &Options::default())?;
    let bridged = system.clone();

    let warnings = add_network(&mut system, &Options::default())?;
    assert!(warnings.is_empty());
    assert_eq!(system, bridged);
    Ok(())
}

#[test]
fn unconnected_endpoint_test() -> Result<()> {
    let mut system = fan_out_system();
    let graph = &mut system.apps["consumer2"].graph;
    graph.add_endpoint("spare_in", "tps_sink.spare_source", Direction::Input);

    let warnings = add_network(&mut system, &Options::default())?;
    assert_eq!(
        warnings,
        [Warning::UnconnectedEndpoint {
            app: "consumer2".into_ident(),
            endpoint: "spare_in".into_ident(),
        }]
    );
    Ok(())
}

#[test]
fn resolve_endpoint_test() -> Result<()> {
    let system = fan_out_system();

    let port = resolve_endpoint(
        &system,
        &EndpointRef::new("consumer1", "tpsets_in"),
        Direction::Input,
    )?;
    assert_eq!(*port, "tps_sink.tpset_source".into_port_ref());

    let wrong_direction = resolve_endpoint(
        &system,
        &EndpointRef::new("consumer1", "tpsets_in"),
        Direction::Output,
    );
    assert!(matches!(wrong_direction, Err(Error::UnresolvedEndpoint { .. })));

    let unknown_app = resolve_endpoint(
        &system,
        &EndpointRef::new("ghost", "tpsets_in"),
        Direction::Input,
    );
    assert!(matches!(unknown_app, Err(Error::UnresolvedEndpoint { .. })));
    Ok(())
}

#[test]
fn undeclared_receiver_test() -> Result<()> {
    let mut system = fan_out_system();
    system.connect(
        EndpointRef::new("producer", "tpsets_out"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("consumer1", "missing_in")),
    );
    let before = system.clone();

    let result = add_network(&mut system, &Options::default());
    assert!(matches!(result, Err(Error::UnresolvedEndpoint { .. })));
    assert_eq!(system, before);
    Ok(())
}

#[test]
fn occupied_port_test() -> Result<()> {
    let mut system = fan_out_system();
    let graph = &mut system.apps["producer"].graph;
    graph.add_module("other", Module::new("Other"));
    graph.add_connection("tpm.tpset_sink", Destination::port("other.input"));

    let result = add_network(&mut system, &Options::default());
    assert!(matches!(result, Err(Error::PortAlreadyConnected { .. })));
    Ok(())
}

#[test]
fn bridge_name_collision_test() -> Result<()> {
    let mut system = fan_out_system();
    let graph = &mut system.apps["consumer1"].graph;
    graph.add_module("consumer1_tpsets_in", Module::new("Existing"));

    let result = add_network(&mut system, &Options::default());
    assert!(matches!(result, Err(Error::DuplicateModule { .. })));
    Ok(())
}

#[test]
fn unconnected_output_endpoint_test() -> Result<()> {
    let mut graph = ModuleGraph::new();
    graph.add_module(
        "src",
        Module::new("Source").connect("out", Connection::to_endpoint("spare_out")),
    );
    graph.add_endpoint("spare_out", "src.out", Direction::Output);
    let mut system = System::new();
    system.add_app("solo", graph, "localhost");

    let generated = Generator::new(Options::default()).generate(&mut system)?;
    assert_eq!(
        generated.warnings,
        [Warning::UnconnectedEndpoint {
            app: "solo".into_ident(),
            endpoint: "spare_out".into_ident(),
        }]
    );

    // the port is left unwired and no bridge is added
    let graph = &system.apps["solo"].graph;
    assert!(graph.modules["src"].connections.is_empty());
    assert_eq!(graph.modules.len(), 1);
    assert!(generated.app("solo").unwrap().init.queues.is_empty());
    Ok(())
}

#[test]
fn underscored_app_names_test() -> Result<()> {
    let mut upstream = ModuleGraph::new();
    upstream.add_module("src", Module::new("Source"));
    upstream.add_endpoint("c", "src.output", Direction::Output);

    let mut downstream = ModuleGraph::new();
    downstream.add_module("dst", Module::new("Sink"));
    downstream.add_endpoint("b_c", "dst.input", Direction::Input);

    let mut system = System::new();
    system.add_app("a_b", upstream, "localhost");
    system.add_app("a", downstream, "localhost");
    system.connect(
        EndpointRef::new("a_b", "c"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("a", "b_c")),
    );

    add_network(&mut system, &Options::default())?;
    assert!(system.apps["a_b"].graph.modules.contains_key("a_b_c"));
    assert!(system.apps["a"].graph.modules.contains_key("a_b_c"));
    Ok(())
}
