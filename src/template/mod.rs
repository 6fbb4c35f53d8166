//! Template records, storage, and inheritance resolution
//!
//! Templates are declarative records describing operators (equations plus
//! typed variables), nodes and edges (operator chains), and circuits (node
//! maps plus edge lists). Records derive from one another by single
//! inheritance; a chain terminates in one of the four primitive kinds.
//!
//! # Example
//!
//! ```text
//! [templates.Op_exc]
//! base = "Op_base"          # overlay onto resolved parent
//! [templates.Op_exc.variables]
//! tau = 2.0                 # overrides the parent's tau
//! ```

pub mod record;
pub mod resolver;

pub use record::{
    BaseRef, RawEdge, RawTemplate, RawValue, RawVariable, TemplateError, TemplateKind,
    TemplateStore,
};
pub use resolver::TemplateResolver;
