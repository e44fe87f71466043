pub mod client;
pub mod memory;
pub mod registry;
pub mod types;

pub use client::ChainClient;
pub use memory::{MemoryChain, MemoryRegistry};
pub use registry::StakeRegistry;
pub use types::{NewTaskEvent, RespondCall, TaskCreatedReceipt, TxReceipt};
