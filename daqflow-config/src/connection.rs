use crate::{ident::Ident, port::PortRef, IntoIdent, IntoPortRef};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, fmt::Display, str::FromStr};

/// The downstream end of a [Connection].
///
/// It is written as `module.port` for a port in the same graph, or as a
/// bare endpoint name for a public endpoint of the graph that is not
/// resolved yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    Port(PortRef),
    Endpoint(Ident),
}

impl Destination {
    /// Create a destination referring to a module port.
    pub fn port(port: impl IntoPortRef) -> Self {
        Self::Port(port.into_port_ref())
    }

    /// Create a destination referring to a public endpoint.
    pub fn endpoint(name: impl IntoIdent) -> Self {
        Self::Endpoint(name.into_ident())
    }

    pub fn as_port(&self) -> Option<&PortRef> {
        match self {
            Self::Port(port) => Some(port),
            Self::Endpoint(_) => None,
        }
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let dest = if text.contains('.') {
            Self::Port(text.parse()?)
        } else {
            Self::Endpoint(text.parse()?)
        };
        Ok(dest)
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Port(port) => port.fmt(f),
            Self::Endpoint(name) => name.fmt(f),
        }
    }
}

impl From<PortRef> for Destination {
    fn from(port: PortRef) -> Self {
        Self::Port(port)
    }
}

impl Serialize for Destination {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'a> Deserialize<'a> for Destination {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

/// An outgoing link from an output port of a module.
///
/// The queue parameters are only used to declare the inferred queue.
/// When `toposort` is false, the link is still wired with a queue but it
/// does not take part in start/stop ordering. It is used to break cycles
/// in the data flow, e.g. a token return path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConnectionRepr")]
pub struct Connection {
    pub to: Destination,
    pub queue_kind: String,
    pub queue_capacity: usize,
    pub toposort: bool,
}

impl Connection {
    pub fn new(to: impl Into<Destination>) -> Self {
        Self {
            to: to.into(),
            queue_kind: default_queue_kind(),
            queue_capacity: default_queue_capacity(),
            toposort: default_toposort(),
        }
    }

    /// Create a connection to a module port.
    pub fn to_port(port: impl IntoPortRef) -> Self {
        Self::new(Destination::port(port))
    }

    /// Create a connection to an endpoint of the same graph.
    pub fn to_endpoint(name: impl IntoIdent) -> Self {
        Self::new(Destination::endpoint(name))
    }

    /// Exclude the connection from start/stop ordering.
    pub fn without_toposort(mut self) -> Self {
        self.toposort = false;
        self
    }

    pub fn with_queue(mut self, kind: impl Into<String>, capacity: usize) -> Self {
        self.queue_kind = kind.into();
        self.queue_capacity = capacity;
        self
    }
}

/// Accepts both the short form `"module.port"` and the full table form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConnectionRepr {
    Short(Destination),
    Full {
        to: Destination,
        #[serde(default = "default_queue_kind")]
        queue_kind: String,
        #[serde(default = "default_queue_capacity")]
        queue_capacity: usize,
        #[serde(default = "default_toposort")]
        toposort: bool,
    },
}

impl From<ConnectionRepr> for Connection {
    fn from(repr: ConnectionRepr) -> Self {
        match repr {
            ConnectionRepr::Short(to) => Connection::new(to),
            ConnectionRepr::Full {
                to,
                queue_kind,
                queue_capacity,
                toposort,
            } => Connection {
                to,
                queue_kind,
                queue_capacity,
                toposort,
            },
        }
    }
}

fn default_queue_kind() -> String {
    "FollyMPMCQueue".into()
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_toposort() -> bool {
    true
}
