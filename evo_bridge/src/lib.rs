//! # EVO State Bridge
//!
//! Relays the state of the control process to remote observers and their
//! commands back to it.
//!
//! At startup the control process prints a mapping block describing its
//! state struct, then keeps the struct up to date in a shared memory
//! region. The bridge parses the mapping into a [`Layout`](layout::Layout),
//! polls the region, decodes every changed snapshot into a
//! [`StateTree`](decode::StateTree) and pushes it, together with the
//! process output and its own status, to every connected observer.
//!
//! ## Modules
//!
//! - [`mapping`] / [`layout`] - mapping protocol and its parsed form
//! - [`decode`] - snapshot to state tree
//! - [`bridge`] - state machine, replay and fan-out
//! - [`registry`] - per-observer event queues
//! - [`command`] - command channel to the control process
//! - [`input`] - control process output pump
//! - [`server`] - WebSocket observer endpoint
//! - [`service`] - runtime wiring

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod command;
pub mod decode;
pub mod error;
pub mod event;
pub mod fd;
pub mod input;
pub mod layout;
pub mod log_buffer;
pub mod mapping;
pub mod registry;
pub mod server;
pub mod service;

pub use bridge::{Bridge, BridgeSettings, PollOutcome};
pub use command::{CommandChannel, CommandPump, CommandQueue};
pub use decode::{FieldValue, StateNode, StateTree, decode};
pub use error::{BridgeError, BridgeResult};
pub use event::{BridgeEvent, BridgeStatus};
pub use layout::{FieldDescriptor, Layout, TypeTag};
pub use mapping::{MappingError, MappingOutcome, MappingParser, parse_mapping, validate_layout};
pub use registry::{SubscriberId, Subscription};
