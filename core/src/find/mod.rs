pub mod command;
pub mod matcher;
pub mod occurrences;
pub mod panel;
pub mod request;
pub mod session;
pub mod status;

pub use command::FindReplace;
pub use matcher::{find_indices, find_matches};
pub use occurrences::{Occurrence, OccurrenceIndex, OccurrenceInfo};
pub use panel::{Field, FindReplacePanel, Keystroke};
pub use request::{
    ExecuteOptions, FindRequest, FindResult, Outcome, ReplaceAllRequest, ReplaceRequest, Request,
};
pub use session::{SearchKey, SearchSession};
