// file: src/query/mod.rs
// description: retrieval-augmented query handling

pub mod generator;
pub mod orchestrator;
pub mod retriever;

pub use generator::AnswerGenerator;
pub use orchestrator::{QueryOrchestrator, QueryOutcome};
pub use retriever::Retriever;
