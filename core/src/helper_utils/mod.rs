pub mod xml;

pub use xml::{MarkupNode, fragment_to_markup, parse_markup, replace_fragment_markup};
