use crate::{port::split_pair, Direction, Ident, IntoIdent, PortRef};
use anyhow::Result;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, fmt::Display, str::FromStr};

/// A public, directional alias of a module port.
///
/// Connections between graphs refer to the endpoint name, so that the
/// internal module and port can change without affecting other
/// applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub internal: PortRef,
    pub direction: Direction,
}

/// Reference to an endpoint of an application, written as `app.endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointRef {
    pub app: Ident,
    pub endpoint: Ident,
}

impl EndpointRef {
    pub fn new(app: impl IntoIdent, endpoint: impl IntoIdent) -> Self {
        Self {
            app: app.into_ident(),
            endpoint: endpoint.into_ident(),
        }
    }

    /// The name given to the bridge module serving this endpoint,
    /// e.g. `producer_out` for `producer.out`.
    pub fn bridge_name(&self) -> Ident {
        self.app.join(&self.endpoint)
    }
}

impl FromStr for EndpointRef {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (app, endpoint) = split_pair(text)?;
        Ok(Self { app, endpoint })
    }
}

impl Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.endpoint)
    }
}

impl Serialize for EndpointRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'a> Deserialize<'a> for EndpointRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
