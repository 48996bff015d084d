pub mod accumulator;
pub mod error;
pub mod query;
pub mod session;
pub mod transcript;

pub use accumulator::AnswerAccumulator;
pub use error::{ClientError, Result};
pub use query::Query;
pub use session::{AskSession, QueryHandle, SessionConfig};
pub use transcript::{Entry, EntryId, Speaker, Transcript};
