//! Pretty Element - XML element trees for device-management API bodies
//!
//! This crate provides the element type used to build request bodies and
//! read response bodies:
//! - An owned, ordered element tree with text/tail content
//! - Named child access (`get_child`, indexing, and the `child!` macro)
//! - Cache-aware pretty printing, also used by `Display`
//! - XML parsing and serialization
//! - Adoption of foreign element-like trees through `TreeFragment`

pub mod config;
pub mod element;
pub mod error;
pub mod fragment;
pub mod render;
pub mod xml;

pub use config::{ConfigError, RenderOptions};
pub use element::{Element, Iter};
pub use error::ElementError;
pub use fragment::TreeFragment;
pub use render::{render, render_with};
pub use xml::{XmlError, MAX_DEPTH};
