//! Tab state: registry, classification and grouping

pub mod classifier;
pub mod grouping;
pub mod registry;
pub mod url;

pub use classifier::{classified, classify, TabStats};
pub use grouping::{group_by_category, TabGroup};
pub use registry::TabRegistry;
