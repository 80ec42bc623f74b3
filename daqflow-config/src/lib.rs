mod app;
mod app_connection;
mod connection;
mod direction;
mod endpoint;
mod graph;
mod ident;
mod into_ident;
mod into_port;
mod module;
mod options;
mod port;
mod system;

pub use app::*;
pub use app_connection::*;
pub use connection::*;
pub use direction::*;
pub use endpoint::*;
pub use graph::*;
pub use ident::*;
pub use into_ident::*;
pub use into_port::*;
pub use module::*;
pub use options::*;
pub use port::PortRef;
pub use system::*;
