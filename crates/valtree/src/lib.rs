//! # valtree
//!
//! One interface for hierarchical data, whatever holds it.
//!
//! A [`Compound`] is a whole tree: a directory on disk, a parsed YAML or
//! JSON document, an overlay stacking several trees, or the empty tree.
//! An [`Attribute`] is a reference-counted handle to one node of it.
//! Nodes are looked up with dotted paths and ordered variant tags
//! (`port@prod` is preferred over `port` when `prod` is asked for), and
//! values are fetched with conversion into the requested type.
//!
//! ## Design
//!
//! Backends only describe nodes as plain values ([`backend::Backend`]).
//! The compound wrapper interns those nodes so that equal nodes share one
//! id and one reference count, and every live [`Attribute`] accounts for
//! exactly one reference.
//!
//! Traversal is push-based: a [`ValueTreeVisitor`] receives nesting and
//! value events, either from a live tree ([`Compound::visit`]) or from
//! chunked input ([`traverse_json_stream`], [`traverse_yaml_stream`]).
//! An [`ObjectBuilder`] is the path-keyed dual of a visitor.
//!
//! ## Example
//!
//! ```rust
//! use valtree::from_yaml_text;
//!
//! let tree = from_yaml_text("a:\n  b: 1\n  b@prod: 2\n");
//! assert_eq!(tree.get::<i32>("a.b", &["prod"]), Some(2));
//! assert_eq!(tree.get::<i32>("a.b", &[]), Some(1));
//! assert!(tree.find_path(&"a.c".into(), &[]).is_none());
//! ```

pub mod backend;
pub mod builder;
pub mod compound;
pub mod convert;
pub mod deserialize;
pub mod error;
pub mod interner;
pub mod json_stream;
pub mod kind;
pub mod path;
pub mod resolve;
pub mod stream;
mod traverse;
pub mod values;
pub mod visitor;
pub mod yaml_stream;

pub use backend::{empty, filesystem, json, overlay, yaml};

pub use backend::empty::empty;
pub use backend::filesystem::from_filesystem_path;
pub use backend::json::from_json_text;
pub use backend::overlay::{Overlay, make_overlay};
pub use backend::yaml::from_yaml_text;
pub use backend::{Backend, InternedCompound, make_compound};
pub use builder::{BuildingVisitor, ObjectBuilder, make_building_visitor};
pub use compound::{Attribute, AttributeNav, Compound, CompoundImpl};
pub use convert::FromText;
pub use deserialize::DeserializingBuilder;
pub use error::{Error, Result, StreamError};
pub use interner::{NodeId, NodeInterner};
pub use json_stream::{build_from_json_stream, traverse_json_stream};
pub use kind::ValueKind;
pub use path::TreePath;
pub use resolve::{Navigate, resolve};
pub use stream::{StreamInput, StreamParser, with_stream_input};
pub use values::{FetchValue, ValueSpan, Values};
pub use visitor::{
    CombinedVisitor, PrintingVisitor, ValueTreeVisitor, make_combined_visitor,
    make_printing_visitor,
};
pub use yaml_stream::traverse_yaml_stream;
