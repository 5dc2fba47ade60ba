//! Runs one evaluation pass off the calling thread.
//!
//! The worker sends exactly one message on its completion channel whether
//! the pass succeeds, fails or panics. Callers see the outcome only through
//! [`EvaluationHandle::wait`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, TryRecvError, sync_channel};

use tracing::{info, warn};

use crate::ctx::EvalRequest;
use crate::engine::{EvalInputs, EvaluationOutcome, evaluate};
use crate::error::{EngineError, EngineResult};
use crate::rules::RuleTable;

pub struct EvaluationHandle {
    done: Receiver<EngineResult<EvaluationOutcome>>,
}

impl EvaluationHandle {
    /// Blocks until the pass has finished.
    pub fn wait(self) -> EngineResult<EvaluationOutcome> {
        self.done
            .recv()
            .unwrap_or_else(|_| Err(EngineError::Aborted("worker exited without a result".into())))
    }

    /// Non-blocking poll; `None` while the pass is still running.
    pub fn try_wait(&self) -> Option<EngineResult<EvaluationOutcome>> {
        match self.done.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EngineError::Aborted(
                "worker exited without a result".into(),
            ))),
        }
    }
}

pub fn spawn_evaluation(
    request: EvalRequest,
    inputs: EvalInputs,
    rules: RuleTable,
) -> EvaluationHandle {
    let (tx, rx) = sync_channel(1);
    rayon::spawn(move || {
        info!("background evaluation started");
        let result = catch_unwind(AssertUnwindSafe(|| evaluate(&request, &inputs, &rules)))
            .unwrap_or_else(|panic| {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panic".to_string());
                Err(EngineError::Aborted(reason))
            });
        match &result {
            Ok(_) => info!("background evaluation finished"),
            Err(err) => warn!(error = %err, "background evaluation failed"),
        }
        // The receiver may already be gone; nothing is waiting then.
        let _ = tx.send(result);
    });
    EvaluationHandle { done: rx }
}
