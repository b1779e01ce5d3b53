//! Concrete AST adapters, gated behind Cargo features so the core pipeline
//! never depends on a specific parser (see `ast::Resolver`).

#[cfg(feature = "rust-frontend")]
pub mod rust;
