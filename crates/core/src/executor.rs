//! Plan execution: performs planned operations one by one in plan order.
//!
//! A failing operation is recorded and the run continues with the next one.
//! In dry-run mode nothing is touched and every operation is only logged.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::PlacementMode;
use crate::placer::{Placer, PlannedOperation};

/// An operation that was attempted and failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedOperation {
    pub action: PlacementMode,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// What execution did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub copies_performed: usize,
    pub moves_performed: usize,
    pub failures: Vec<FailedOperation>,
}

impl ExecutionOutcome {
    pub fn performed(&self) -> usize {
        self.copies_performed + self.moves_performed
    }
}

/// Drives a [`Placer`] over a plan.
pub struct PlanExecutor<'a, P: Placer + ?Sized> {
    placer: &'a P,
}

impl<'a, P: Placer + ?Sized> PlanExecutor<'a, P> {
    pub fn new(placer: &'a P) -> Self {
        Self { placer }
    }

    /// Executes `operations` when `apply` is set; otherwise only logs them.
    pub async fn execute(&self, operations: &[PlannedOperation], apply: bool) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::default();

        if !apply {
            for op in operations {
                info!(
                    "[dry-run] {} {} -> {}",
                    op.action,
                    op.source.display(),
                    op.destination.display()
                );
            }
            return outcome;
        }

        info!(
            "Executing {} operations with placer '{}'",
            operations.len(),
            self.placer.name()
        );

        for (index, op) in operations.iter().enumerate() {
            debug!(
                "[{}/{}] {} {} -> {}",
                index + 1,
                operations.len(),
                op.action,
                op.source.display(),
                op.destination.display()
            );

            match self.placer.place(op).await {
                Ok(placed) => {
                    match op.action {
                        PlacementMode::Copy => outcome.copies_performed += 1,
                        PlacementMode::Move => outcome.moves_performed += 1,
                    }
                    debug!(
                        "Placed {} ({} bytes)",
                        placed.destination.display(),
                        placed.size_bytes
                    );
                }
                Err(e) if e.is_destination_race() => {
                    warn!(
                        "Skipped {} {}: {} appeared after planning and was left untouched",
                        op.action,
                        op.source.display(),
                        op.destination.display()
                    );
                    outcome.failures.push(FailedOperation {
                        action: op.action,
                        source: op.source.clone(),
                        destination: op.destination.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to {} {} -> {}: {}",
                        op.action,
                        op.source.display(),
                        op.destination.display(),
                        e
                    );
                    outcome.failures.push(FailedOperation {
                        action: op.action,
                        source: op.source.clone(),
                        destination: op.destination.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Execution finished: {} copied, {} moved, {} failed",
            outcome.copies_performed,
            outcome.moves_performed,
            outcome.failures.len()
        );
        outcome
    }
}
