use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::services::plate_lookup::{PlateLookup, VehicleLookup};
use crate::utils::plate::{is_lookup_ready, normalize_plate};

/// Result of a lookup that survived the quiet period.
#[derive(Debug)]
pub struct LookupOutcome {
    pub plate: String,
    pub result: AppResult<PlateLookup>,
}

/// Delays plate lookups until typing pauses for `delay`. Only the latest input
/// of each pause is looked up, and only when it is long enough.
pub struct PlateDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl PlateDebouncer {
    pub fn spawn<L>(lookup: Arc<L>, delay: Duration) -> (Self, mpsc::UnboundedReceiver<LookupOutcome>)
    where
        L: VehicleLookup + ?Sized + 'static,
    {
        let (input, mut inputs) = mpsc::unbounded_channel::<String>();
        let (results, outcomes) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut pending: Option<String> = None;
            loop {
                if pending.is_none() {
                    match inputs.recv().await {
                        Some(plate) => pending = Some(plate),
                        None => break,
                    }
                    continue;
                }

                tokio::select! {
                    next = inputs.recv() => match next {
                        Some(plate) => pending = Some(plate),
                        None => break,
                    },
                    _ = tokio::time::sleep(delay) => {
                        let Some(plate) = pending.take() else { continue };
                        if !is_lookup_ready(&plate) {
                            continue;
                        }
                        tracing::debug!(plate = %plate, "plate lookup");
                        let result = lookup.lookup(&plate).await;
                        if results.send(LookupOutcome { plate, result }).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        (Self { input, task }, outcomes)
    }

    /// Record a keystroke. The plate is normalized before it is queued.
    pub fn push(&self, raw: &str) {
        // The task only stops once this sender is dropped.
        let _ = self.input.send(normalize_plate(raw));
    }
}

impl Drop for PlateDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
