pub mod document;
pub mod markers;
pub mod position;
pub mod read;
pub mod walker;
pub mod write;

pub use document::{ChangeWriter, DetachedViewport, Editor, Viewport};
pub use markers::{Highlight, Marker, MarkerGroup, MarkerStore, TagHandle};
pub use position::{NodePath, Position, Range, ResolvedPosition, ResolvedRange, create_position};
pub use read::get_doc_content;
pub use walker::{TextChunk, TextRun, WalkItem, walk};
pub use write::replace_range_content;
