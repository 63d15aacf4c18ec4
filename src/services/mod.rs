pub mod answer_engine;
pub mod artifact;
pub mod classifier;
pub mod decoder;
pub mod fetcher;
pub mod submission;

pub use answer_engine::AnswerEngine;
pub use artifact::{ArtifactFetcher, ArtifactKind, DataArtifact, Table};
pub use classifier::{ReferenceClassifier, References};
pub use decoder::PayloadDecoder;
pub use fetcher::{ChromiumFetcher, ContentFetcher};
pub use submission::SubmissionClient;
