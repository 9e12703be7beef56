use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::MarkupError;
use crate::exchange_rate::RateSource;
use crate::markup::{self, ConversionRequest, MarkupResult};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Fetching,
    Succeeded(MarkupResult),
    Failed(MarkupError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Fetching => "fetching",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }
}

/// Runs one calculation at a time against a rate source.
///
/// `calculate` moves Idle/Succeeded/Failed into Fetching; completion of the
/// fetch moves Fetching into Succeeded or Failed. A call made while Fetching
/// is refused with [`MarkupError::Busy`] and does not disturb the in-flight
/// calculation. There is no cancellation: the fetch runs on its own task, so
/// dropping the caller's future still lets it finish and record its outcome.
pub struct CalculationSession<S> {
    source: Arc<S>,
    state: Arc<Mutex<SessionState>>,
}

impl<S: RateSource + 'static> CalculationSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(SessionState::Idle)),
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        matches!(*lock(&self.state), SessionState::Fetching)
    }

    pub async fn calculate(&self, request: &ConversionRequest) -> Result<MarkupResult, MarkupError> {
        {
            let mut state = lock(&self.state);
            if matches!(*state, SessionState::Fetching) {
                log::warn!("calculation refused, another one is in flight");
                return Err(MarkupError::Busy);
            }
            *state = SessionState::Fetching;
        }

        let completion = Completion {
            state: Arc::clone(&self.state),
            recorded: false,
        };
        let source = Arc::clone(&self.source);
        let request = request.clone();
        let task = tokio::spawn(async move {
            let outcome = source
                .latest_rate(request.from_currency(), request.to_currency())
                .await
                .and_then(|quote| markup::compute(&request, &quote));
            completion.record(&outcome);
            outcome
        });

        task.await.unwrap_or_else(|e| {
            Err(MarkupError::computation(format!(
                "calculation task failed: {}",
                e
            )))
        })
    }
}

/// Writes the final state of one calculation, or `Failed` if the task ends
/// without reaching it.
struct Completion {
    state: Arc<Mutex<SessionState>>,
    recorded: bool,
}

impl Completion {
    fn record(mut self, outcome: &Result<MarkupResult, MarkupError>) {
        *lock(&self.state) = match outcome {
            Ok(result) => SessionState::Succeeded(result.clone()),
            Err(e) => SessionState::Failed(e.clone()),
        };
        self.recorded = true;
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.recorded {
            *lock(&self.state) = SessionState::Failed(MarkupError::computation(
                "calculation ended without an outcome",
            ));
        }
    }
}

// Every write replaces the whole state, so a poisoned value is still whole.
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
