use crate::EndpointRef;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A connection from an output endpoint of one application to input
/// endpoints of other applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppConnection {
    /// Point-to-point connection to exactly one receiver.
    Sender(Sender),
    /// Fan-out connection to a set of subscribers.
    Publisher(Publisher),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub msg_type: String,
    pub msg_module_name: String,
    pub receiver: EndpointRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub msg_type: String,
    pub msg_module_name: String,
    pub subscribers: IndexSet<EndpointRef>,
}

impl AppConnection {
    pub fn sender(
        msg_type: impl Into<String>,
        msg_module_name: impl Into<String>,
        receiver: EndpointRef,
    ) -> Self {
        Self::Sender(Sender {
            msg_type: msg_type.into(),
            msg_module_name: msg_module_name.into(),
            receiver,
        })
    }

    pub fn publisher<I>(msg_type: impl Into<String>, msg_module_name: impl Into<String>, subscribers: I) -> Self
    where
        I: IntoIterator<Item = EndpointRef>,
    {
        Self::Publisher(Publisher {
            msg_type: msg_type.into(),
            msg_module_name: msg_module_name.into(),
            subscribers: subscribers.into_iter().collect(),
        })
    }

    /// Iterate over the downstream endpoints.
    pub fn destination_iter(&self) -> impl Iterator<Item = &EndpointRef> {
        let (receiver, subscribers) = match self {
            Self::Sender(sender) => (Some(&sender.receiver), None),
            Self::Publisher(publisher) => (None, Some(&publisher.subscribers)),
        };
        receiver.into_iter().chain(subscribers.into_iter().flatten())
    }

    pub fn msg_type(&self) -> &str {
        match self {
            Self::Sender(sender) => &sender.msg_type,
            Self::Publisher(publisher) => &publisher.msg_type,
        }
    }

    pub fn msg_module_name(&self) -> &str {
        match self {
            Self::Sender(sender) => &sender.msg_module_name,
            Self::Publisher(publisher) => &publisher.msg_module_name,
        }
    }

    pub fn is_publisher(&self) -> bool {
        matches!(self, Self::Publisher(_))
    }
}
