pub mod attributes;

pub use attributes::{AttributeError, ProductAttributes};
