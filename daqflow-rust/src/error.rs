use daqflow_config::{Direction, EndpointRef, Ident, IntoIdent, PortRef};
use indexmap::IndexMap;
use itertools::Itertools as _;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dependency cycle detected among {}", .residual.keys().join(", "))]
    CycleDetected {
        /// The nodes that still depend on others after all schedulable
        /// nodes were removed, with their remaining dependencies.
        residual: IndexMap<Ident, Vec<Ident>>,
    },
    #[error("unresolved endpoint `{endpoint}`: {reason}")]
    UnresolvedEndpoint { endpoint: String, reason: String },
    #[error("port `{port}` is bound to queue `{queue}` in an incompatible way")]
    DuplicateQueueBinding { port: PortRef, queue: String },
    #[error("module `{module}` not found")]
    ModuleNotFound { module: Ident },
    #[error("module `{module}` already exists in application `{app}`")]
    DuplicateModule { app: Ident, module: Ident },
    #[error("port `{port}` of application `{app}` is already connected elsewhere")]
    PortAlreadyConnected { app: Ident, port: PortRef },
    #[error("no transport address is assigned to connection `{connection}`")]
    TransportNotAssigned { connection: EndpointRef },
    #[error("invalid application start order: {reason}")]
    InvalidAppOrder { reason: String },
    #[error("no transport port left on host `{host}`")]
    PortRangeExhausted { host: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("internal error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn unresolved_endpoint(endpoint: impl ToString, reason: impl ToString) -> Self {
        Self::UnresolvedEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn wrong_direction(endpoint: &EndpointRef, expect: Direction, found: Direction) -> Self {
        Self::unresolved_endpoint(
            endpoint,
            format!("expect an {} endpoint, but it is declared as {}", expect, found),
        )
    }

    pub fn duplicate_queue_binding(port: &PortRef, queue: impl Into<String>) -> Self {
        Self::DuplicateQueueBinding {
            port: port.clone(),
            queue: queue.into(),
        }
    }

    pub fn module_not_found(module: impl IntoIdent) -> Self {
        Self::ModuleNotFound {
            module: module.into_ident(),
        }
    }

    pub fn duplicate_module(app: impl IntoIdent, module: impl IntoIdent) -> Self {
        Self::DuplicateModule {
            app: app.into_ident(),
            module: module.into_ident(),
        }
    }

    pub fn port_already_connected(app: impl IntoIdent, port: &PortRef) -> Self {
        Self::PortAlreadyConnected {
            app: app.into_ident(),
            port: port.clone(),
        }
    }

    pub fn invalid_app_order(reason: impl ToString) -> Self {
        Self::InvalidAppOrder {
            reason: reason.to_string(),
        }
    }

    pub fn transport_not_assigned(connection: &EndpointRef) -> Self {
        Self::TransportNotAssigned {
            connection: connection.clone(),
        }
    }
}

/// Non-fatal findings reported alongside a generated plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("endpoint `{endpoint}` of application `{app}` is not connected to anything")]
    UnconnectedEndpoint { app: Ident, endpoint: Ident },
}
