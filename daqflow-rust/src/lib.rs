//! Command plan generation for distributed data acquisition systems.
//!
//! A system consists of *applications* running on hosts. Each
//! application hosts a graph of *modules* connected by local queues.
//! Applications exchange messages through *endpoints*, which are bridged
//! over the network. The crate infers the queues, the network bridges and
//! the start and stop orders, and emits the command plans of every
//! application and of the whole system.
//!
//! # System Configuration Format
//!
//! The system configuration file is written in JSON5 format. See
//! [daqflow_config] for the complete format.
//!
//! ```json5
//! {
//!     // The version number is mandatory.
//!     "version": "0.1.0",
//!
//!     // The applications and their module graphs.
//!     "apps": {
//!         "producer": {
//!             "host": "localhost",
//!             "graph": {
//!                 "modules": {
//!                     "tpm": {
//!                         "plugin": "TriggerPrimitiveMaker",
//!                         "connections": { "tpset_sink": "tpsets_out" },
//!                     },
//!                 },
//!                 "endpoints": {
//!                     "tpsets_out": { "internal": "tpm.tpset_sink", "direction": "output" },
//!                 },
//!             },
//!         },
//!         // Graphs can be included from other files.
//!         "consumer": { "graph": "graphs/consumer.json5" },
//!     },
//!
//!     // Connections between application endpoints.
//!     "connections": {
//!         "producer.tpsets_out": {
//!             "type": "publisher",
//!             "msg_type": "dunedaq::trigger::TPSet",
//!             "msg_module_name": "TPSetNQ",
//!             "subscribers": ["consumer.tpsets_in"],
//!         },
//!     },
//! }
//! ```
//!
//! # Usage
//!
//! The code example loads a system and generates its plans.
//!
//! ```no_run
//! use daqflow::{Generator, Phase};
//! use daqflow_config::SystemConfig;
//!
//! let file = concat!(env!("CARGO_MANIFEST_DIR"), "/../daqflow-config/config-examples/pubsub.json5");
//! let config = SystemConfig::open(file)?;
//! let options = config.options.clone();
//! let mut system = config.into_system()?;
//!
//! let generated = Generator::new(options).generate(&mut system)?;
//! let start = generated.system.command(Phase::Start);
//! println!("{:?}", start.order);
//! # anyhow::Ok(())
//! ```

mod deps;
mod error;
mod generator;
mod network;
mod plan;
mod queues;
mod toposort;

pub use deps::*;
pub use error::{Error, Warning};
pub use generator::*;
pub use network::*;
pub use plan::*;
pub use queues::*;
pub use toposort::*;
