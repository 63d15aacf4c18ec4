pub mod answer;
pub mod chain;
pub mod deadline;
pub mod submission;

pub use answer::AnswerValue;
pub use chain::{ChainReport, ChainRequest, ChainState, Credentials, StepRecord};
pub use deadline::Deadline;
pub use submission::{SubmissionResponse, SubmissionResult};
