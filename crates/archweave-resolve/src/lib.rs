//! Name resolution for archweave.
//!
//! Merges the syntax trees of every source file into one
//! [`ArchitectureModel`](archweave_core::ArchitectureModel) and binds every
//! reference (port types, part usage definitions, connection endpoints) to
//! the declaration it names.
//!
//! Names are looked up in the nearest enclosing package first, then in
//! packages further out, then in imported packages, and finally at the root.

mod resolver;
mod scope;

pub use resolver::{resolve, Resolution, Resolver};
