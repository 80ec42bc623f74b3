use crate::ident::Ident;
use anyhow::Result;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, fmt::Display, str::FromStr};

/// Reference to a port of a module, written as `module.port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub module: Ident,
    pub port: Ident,
}

impl PortRef {
    pub fn new(module: Ident, port: Ident) -> Self {
        Self { module, port }
    }

    /// The dotted name with the dot removed, e.g. `tpmoutput` for
    /// `tpm.output`. Used to build queue instance names.
    pub fn undotted(&self) -> String {
        format!("{}{}", self.module, self.port)
    }
}

/// Split `owner.name` into exactly two identifiers.
pub(crate) fn split_pair(text: &str) -> Result<(Ident, Ident), String> {
    let (owner, name) = text
        .split_once('.')
        .ok_or_else(|| format!("expect 'owner.name', but get '{}'", text))?;
    let owner = Ident::from_str(owner)?;
    let name = Ident::from_str(name)?;
    Ok((owner, name))
}

impl FromStr for PortRef {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (module, port) = split_pair(text)?;
        Ok(Self { module, port })
    }
}

impl Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.port)
    }
}

impl Serialize for PortRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'a> Deserialize<'a> for PortRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
