use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// Parameters of the plan generator.
///
/// Every field has a default, so the `options` table in a system
/// configuration may list only the values to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Options {
    /// The first port number of the transport addresses on each host.
    #[derivative(Default(value = "12345"))]
    pub first_transport_port: u16,
    /// The address replacing `localhost` in transport addresses.
    #[derivative(Default(value = "\"127.0.0.1\".into()"))]
    pub loopback_address: String,
    /// How several connections into one input port are wired.
    pub fan_in: FanIn,
    /// The command port of the first application in the deployment.
    #[derivative(Default(value = "3333"))]
    pub first_app_port: u16,
    #[derivative(Default(value = "56789"))]
    pub response_listener_port: u16,
    /// The executable profile launched for every application.
    #[derivative(Default(value = "\"daq_application\".into()"))]
    pub exec: String,
    /// The topic published and subscribed by network bridges.
    #[derivative(Default(value = "\"foo\".into()"))]
    pub topic: String,
    /// The serialization name handed to egress bridges.
    #[derivative(Default(value = "\"msgpack\".into()"))]
    pub serialization: String,
    /// The directory prefix of per-application plan references.
    #[derivative(Default(value = "\"data\".into()"))]
    pub plan_dir: String,
}

/// Wiring policy for connections converging onto one input port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanIn {
    /// Each connection gets its own queue.
    #[default]
    Distinct,
    /// Later connections reuse the queue of the first one.
    Shared,
}
