use anyhow::Result;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    borrow::{Borrow, Cow},
    fmt,
    fmt::Display,
    str::FromStr,
};

/// Identifier that consists of ASCII alphanumeric and '-', '_' characters.
///
/// Module, port, endpoint and application names are identifiers. The
/// '.' character is reserved as the separator of [PortRef](crate::PortRef)
/// and [EndpointRef](crate::EndpointRef).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    /// Create an identifier from a string.
    pub fn new<'a, S>(name: S) -> Option<Self>
    where
        S: Into<Cow<'a, str>>,
    {
        let name = name.into().into_owned();
        let ok = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_".contains(c));
        ok.then_some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Join two identifiers with an underscore, e.g. `app` and `out`
    /// become `app_out`.
    pub fn join(&self, other: &Ident) -> Ident {
        Self(format!("{}_{}", self.0, other.0))
    }
}

impl FromStr for Ident {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ident::new(name).ok_or_else(|| format!("invalid name '{}'", name))
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Ident {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'a> Deserialize<'a> for Ident {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        let name = String::deserialize(deserializer)?;
        Ident::new(&name).ok_or_else(|| D::Error::custom(format!("invalid name '{}'", name)))
    }
}
