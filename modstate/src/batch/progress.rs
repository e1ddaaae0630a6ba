use tracing::{error, info};

use crate::types::EntityId;

/// Message reported after each chunk.
pub fn progress_message(progress: usize, total: usize) -> String {
    format!("Processed {progress} of {total} entities.")
}

/// Final summary of a batch.
///
/// Only successfully reconciled entities are counted, failures are visible in the logs.
pub fn finished_message(success: bool, processed: usize) -> String {
    if !success {
        return "Finished with an error.".to_string();
    }

    match processed {
        1 => "One entity processed.".to_string(),
        count => format!("{count} entities processed."),
    }
}

/// Reports the end of a batch and returns the summary shown to the operator.
///
/// `success` is the driver's verdict on the run as a whole, `results` the ids collected in
/// [`crate::batch::BatchContext::results`].
pub fn on_finished(success: bool, results: &[EntityId]) -> String {
    let message = finished_message(success, results.len());

    if success {
        info!(processed = results.len(), "{message}");
    } else {
        error!(processed = results.len(), "{message}");
    }

    message
}
