use anyhow::Result;
use daqflow::{
    make_app_plan, make_system_plan, AddressedCommand, Error, NoExtension, Phase, PhaseExtension,
};
use daqflow_config::{
    AppConnection, Connection, Direction, EndpointRef, Ident, IntoIdent, Module, ModuleGraph,
    Options, System,
};
use serde_json::json;
use std::fs;

fn names(order: &[Ident]) -> Vec<&str> {
    order.iter().map(Ident::as_str).collect()
}

fn chain_graph() -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    graph.add_module(
        "a",
        Module::new("Source")
            .with_conf(json!({ "rate": 10 }))
            .connect("output", Connection::to_port("b.input")),
    );
    graph.add_module("b", Module::new("Filter").connect("output", Connection::to_port("c.input")));
    graph.add_module("c", Module::new("Sink"));
    graph
}

#[test]
fn chain_plan_test() -> Result<()> {
    let app = "app".into_ident();
    let plan = make_app_plan(&app, &chain_graph(), &Options::default(), &NoExtension)?;

    assert_eq!(names(&plan.start), ["c", "b", "a"]);
    assert_eq!(names(&plan.stop), ["a", "b", "c"]);
    assert_eq!(plan.scrap, plan.stop);
    assert!(plan.pause.is_empty());
    assert!(plan.resume.is_empty());

    let queues: Vec<_> = plan.init.queues.iter().map(|q| q.inst.as_str()).collect();
    assert_eq!(queues, ["aoutput_to_binput", "boutput_to_cinput"]);

    let modules: Vec<_> = plan.init.modules.iter().map(|m| m.inst.as_str()).collect();
    assert_eq!(modules, ["a", "b", "c"]);
    assert_eq!(plan.init.modules[1].plugin, "Filter");
    assert_eq!(plan.init.modules[1].queues.len(), 2);

    let conf: Vec<_> = plan.conf.keys().map(Ident::as_str).collect();
    assert_eq!(conf, ["a", "b", "c"]);
    assert_eq!(plan.conf["a"], json!({ "rate": 10 }));

    Ok(())
}

#[test]
fn exempt_cycle_test() -> Result<()> {
    let app = "app".into_ident();
    let mut graph = ModuleGraph::new();
    graph.add_module("a", Module::new("A").connect("output", Connection::to_port("b.input")));
    graph.add_module("b", Module::new("B").connect("output", Connection::to_port("a.input")));

    let result = make_app_plan(&app, &graph, &Options::default(), &NoExtension);
    assert!(matches!(result, Err(Error::CycleDetected { .. })));

    let conn = &mut graph.modules["b"].connections["output"];
    conn.toposort = false;

    let plan = make_app_plan(&app, &graph, &Options::default(), &NoExtension)?;
    assert_eq!(names(&plan.start), ["b", "a"]);
    assert_eq!(plan.init.queues.len(), 2);
    Ok(())
}

struct Drain;

impl PhaseExtension for Drain {
    fn pause(&self, _app: &Ident, graph: &ModuleGraph) -> Vec<AddressedCommand> {
        graph
            .module_names()
            .map(|name| AddressedCommand {
                module: name.clone(),
                data: json!({ "drain": true }),
            })
            .collect()
    }
}

#[test]
fn extension_test() -> Result<()> {
    let app = "app".into_ident();
    let plan = make_app_plan(&app, &chain_graph(), &Options::default(), &Drain)?;
    assert_eq!(plan.pause.len(), 3);
    assert_eq!(plan.pause[0].data, json!({ "drain": true }));
    assert!(plan.resume.is_empty());
    Ok(())
}

fn two_app_system() -> System {
    let mut producer = ModuleGraph::new();
    producer.add_module("src", Module::new("Source"));
    producer.add_endpoint("out", "src.output", Direction::Output);

    let mut consumer = ModuleGraph::new();
    consumer.add_module("dst", Module::new("Sink"));
    consumer.add_endpoint("in", "dst.input", Direction::Input);

    let mut system = System::new();
    system.add_app("producer", producer, "daq-01");
    system.add_app("consumer", consumer, "daq-02");
    system.connect(
        EndpointRef::new("producer", "out"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("consumer", "in")),
    );
    system
}

#[test]
fn system_plan_test() -> Result<()> {
    let mut system = two_app_system();
    let options = Options::default();
    let plan = make_system_plan(&mut system, &options)?;

    assert_eq!(plan.commands.len(), Phase::ALL.len());
    let order = |phase| plan.command(phase).order.as_deref().map(names);
    assert_eq!(order(Phase::Start), Some(vec!["consumer", "producer"]));
    assert_eq!(order(Phase::Stop), Some(vec!["producer", "consumer"]));
    assert_eq!(order(Phase::Scrap), Some(vec!["producer", "consumer"]));
    assert_eq!(order(Phase::Init), None);
    assert_eq!(order(Phase::Conf), None);

    let conf = plan.command(Phase::Conf);
    assert_eq!(conf.apps["producer"], "data/producer_conf");
    assert_eq!(conf.apps["consumer"], "data/consumer_conf");

    // the computed order is kept in the system
    let stored = system.app_start_order.as_deref().map(names);
    assert_eq!(stored, Some(vec!["consumer", "producer"]));

    let boot = &plan.boot;
    assert_eq!(boot.apps["producer"].exec, "daq_application");
    assert_eq!(boot.apps["producer"].host, "host_producer");
    assert_eq!(boot.apps["producer"].port, 3333);
    assert_eq!(boot.apps["consumer"].port, 3334);
    assert_eq!(boot.hosts["host_producer"], "daq-01");
    assert_eq!(boot.hosts["host_consumer"], "daq-02");
    assert_eq!(boot.response_listener.port, 56789);

    Ok(())
}

#[test]
fn given_app_order_test() -> Result<()> {
    let mut system = two_app_system();
    system.app_start_order = Some(vec!["producer".into_ident(), "consumer".into_ident()]);

    let plan = make_system_plan(&mut system, &Options::default())?;
    let start = plan.command(Phase::Start).order.as_deref().map(names);
    assert_eq!(start, Some(vec!["producer", "consumer"]));
    Ok(())
}

#[test]
fn app_cycle_test() -> Result<()> {
    let mut system = two_app_system();
    let graph = &mut system.apps["consumer"].graph;
    graph.add_endpoint("back", "dst.output", Direction::Output);
    let graph = &mut system.apps["producer"].graph;
    graph.add_endpoint("back_in", "src.input", Direction::Input);
    system.connect(
        EndpointRef::new("consumer", "back"),
        AppConnection::sender("T", "TNQ", EndpointRef::new("producer", "back_in")),
    );

    let result = make_system_plan(&mut system, &Options::default());
    assert!(matches!(result, Err(Error::CycleDetected { .. })));
    assert!(system.app_start_order.is_none());
    Ok(())
}

#[test]
fn dot_test() -> Result<()> {
    let app = "app".into_ident();
    let plan = make_app_plan(&app, &chain_graph(), &Options::default(), &NoExtension)?;

    let mut rendered = vec![];
    plan.render_dot(&mut rendered)?;
    let rendered = String::from_utf8(rendered)?;
    assert!(rendered.contains("m_a"));
    assert!(rendered.contains("q_aoutput_to_binput"));
    assert!(rendered.contains("hexagon"));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("app.dot");
    plan.save_dot_file(&path)?;
    assert_eq!(fs::read_to_string(&path)?, rendered);
    Ok(())
}

#[test]
fn invalid_app_order_test() -> Result<()> {
    let cases: [&[&str]; 3] = [
        &["producer", "consumer", "ghost"],
        &["producer"],
        &["producer", "consumer", "producer"],
    ];
    for order in cases {
        let mut system = two_app_system();
        let order = order.iter().copied().map(IntoIdent::into_ident).collect();
        system.app_start_order = Some(order);
        let result = make_system_plan(&mut system, &Options::default());
        assert!(matches!(result, Err(Error::InvalidAppOrder { .. })));
    }
    Ok(())
}
