pub mod api;
pub mod config;
pub mod logging;
pub mod node;
pub mod publisher;
pub mod responder;

pub use config::AggregatorConfig;
pub use node::{AggregatorNode, NodeHandles};
pub use publisher::TaskPublisher;
pub use responder::OnChainResponder;
