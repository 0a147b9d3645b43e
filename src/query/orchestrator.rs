// file: src/query/orchestrator.rs
// description: drives a question through retrieval and generation under a time budget

use crate::error::{PipelineError, Result};
use crate::query::generator::AnswerGenerator;
use crate::query::retriever::Retriever;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Lifecycle of a single query. Terminal states are `Responded` and
/// `Failed`; every query reaches exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Received,
    Retrieving,
    Generating,
    Responded,
    Failed,
}

impl QueryPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryPhase::Received => "received",
            QueryPhase::Retrieving => "retrieving",
            QueryPhase::Generating => "generating",
            QueryPhase::Responded => "responded",
            QueryPhase::Failed => "failed",
        }
    }
}

/// Final result of an orchestrated query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<String>,
    pub elapsed_ms: u64,
}

/// Runs the retrieve-then-generate pipeline for one question, enforcing
/// a wall-clock budget across both phases. Whatever budget retrieval
/// consumes is no longer available to generation.
pub struct QueryOrchestrator {
    retriever: Retriever,
    generator: AnswerGenerator,
    budget: Duration,
}

impl QueryOrchestrator {
    pub fn new(retriever: Retriever, generator: AnswerGenerator, budget_secs: u64) -> Self {
        Self {
            retriever,
            generator,
            budget: Duration::from_secs(budget_secs),
        }
    }

    pub async fn run(&self, question: &str, customer_data: Option<&str>) -> Result<QueryOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::Validation(
                "Question must not be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let mut phase = QueryPhase::Received;
        debug!("Query {}: {}", phase.as_str(), question);

        phase = QueryPhase::Retrieving;
        let hits = match timeout(self.remaining(started)?, self.retriever.retrieve(question)).await
        {
            Ok(result) => result.inspect_err(|e| self.log_failure(phase, e))?,
            Err(_) => return Err(self.timed_out(phase, started)),
        };

        phase = QueryPhase::Generating;
        let answer = match timeout(
            self.remaining(started)?,
            self.generator.answer(question, &hits, customer_data),
        )
        .await
        {
            Ok(result) => result.inspect_err(|e| self.log_failure(phase, e))?,
            Err(_) => return Err(self.timed_out(phase, started)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Query responded in {}ms with {} sources",
            elapsed_ms,
            answer.sources.len()
        );

        Ok(QueryOutcome {
            answer: answer.text,
            sources: answer.sources,
            elapsed_ms,
        })
    }

    fn remaining(&self, started: Instant) -> Result<Duration> {
        self.budget
            .checked_sub(started.elapsed())
            .filter(|d| !d.is_zero())
            .ok_or_else(|| PipelineError::Timeout {
                phase: "budget".to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            })
    }

    fn timed_out(&self, phase: QueryPhase, started: Instant) -> PipelineError {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        warn!("Query timed out during {} after {}ms", phase.as_str(), elapsed_ms);
        PipelineError::Timeout {
            phase: phase.as_str().to_string(),
            elapsed_ms,
        }
    }

    fn log_failure(&self, phase: QueryPhase, error: &PipelineError) {
        warn!("Query failed during {}: {}", phase.as_str(), error);
    }
}
