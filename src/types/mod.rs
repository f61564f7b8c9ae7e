//! Public types for the Switchyard API.

mod envelope;
mod options;
mod result;

pub use envelope::{Operation, RequestEnvelope};
pub use options::RequestOptions;
pub use result::{AnswerResult, CanonicalResult, KeywordResult, Signals, TextResult};
