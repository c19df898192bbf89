//! The generic MCTS search: tree node ([`Node`]), single-threaded driver
//! ([`SearchController`]), and the supervised worker-thread wrapper
//! ([`ThreadedEngine`]) that clients actually construct.

mod controller;
mod node;
mod threaded;

pub use controller::SearchController;
pub use node::Node;
pub use threaded::ThreadedEngine;
