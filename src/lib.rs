#![doc(html_root_url = "https://docs.rs/xylem-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Incrementally aligns a live tree with repeated descriptions of its desired shape.
//!
//! Descriptions are streamed as instructions ([`Reconciler::element_open`], [`Reconciler::text`], [`Reconciler::element_close`], …)
//! and matched against the existing nodes as they arrive, so no intermediate tree is built.
//! Only nodes and attributes that actually changed are written.
//!
//! The tree itself is provided through the [`Host`] trait. [`WebHost`] patches the browser DOM, [`MemoryTree`] is a plain in-memory tree.
//!
//! # Logging
//!
//! This crate logs through [`tracing`]. Text and attribute values are only included in messages with the `"dangerous-logging"` feature.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod align;
mod attributes;
mod context;
mod error;
mod host;
mod key_index;
mod load;
mod logging;
pub mod memory;
mod patch;
mod record;
mod temp_map;
mod walk;
pub mod web;

pub use align::SVG_NAMESPACE;
pub use attributes::{apply_attribute, apply_property, apply_style, apply_typed, Mutator, Mutators, Value};
pub use context::{Created, Deleted, Notifications};
pub use error::Error;
pub use host::Host;
pub use memory::MemoryTree;
pub use patch::{Config, Outer, Reconciler};
pub use record::RecordKey;
pub use web::WebHost;

/// The node kind of text nodes.
pub const TEXT: &str = "#text";
