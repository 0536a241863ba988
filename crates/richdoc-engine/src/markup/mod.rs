//! Markup serialization boundary.
//!
//! The document's external representation is an HTML fragment. Parsing is
//! tolerant (hosts hand us pasted and persisted markup of varying
//! quality); serialization is canonical. The two are render-equivalent
//! inverses, not byte-identical ones.

pub mod parse;
pub mod serialize;

pub use parse::parse_fragment;
pub use serialize::serialize_fragment;
