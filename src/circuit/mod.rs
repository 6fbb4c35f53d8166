//! Circuit graph assembly
//!
//! Takes a resolved circuit record plus assembled node and edge templates,
//! instantiates the circuit's node map, and validates every edge endpoint
//! against the instantiated nodes, producing the flattened graph handed to
//! the numerical engine.

pub mod builder;
pub mod graph;

pub use builder::{build, CircuitError};
pub use graph::{CircuitEdge, CircuitGraph, CircuitNode, VariableRef};
