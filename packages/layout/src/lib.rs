//! Print layout for newspaper booking forms.
//!
//! A rendered ad is the publisher's blank PDF template with the ad text
//! placed on the publisher's grid, form fields written into their boxes and
//! option marks crossed, all driven by per-publisher coordinate tables.

pub mod annotations;
pub mod canvas;
pub mod engine;
pub mod error;
pub mod font;
pub mod format;
pub mod grid;
pub mod publisher;
pub mod script;
pub mod template;

pub use annotations::{AdFlags, AnnotationTable, MarkCondition, MarkKind, resolve_color_mark};
pub use engine::{AdSnapshot, LayoutEngine};
pub use error::LayoutError;
pub use publisher::{PublisherProfile, PublisherRegistry, Resolved};
pub use template::{FilesystemTemplateStore, TemplateStore};
