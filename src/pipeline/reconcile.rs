//! Reconciliation of returned predictions against requested items
//!
//! Nothing but the echoed `item_id` ties a prediction back to its product,
//! so every batch response is checked against the IDs that were sent.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::model::{HazmatInputItem, HazmatLabeledItem, HazmatPrediction};

/// The ID set of a batch response differs from the ID set requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "requested predictions for {requested:?} but only got {returned:?} - missing {missing:?}"
)]
pub struct MismatchedPredictionsError {
    pub requested: BTreeSet<String>,
    pub returned: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

impl MismatchedPredictionsError {
    pub fn new(requested: BTreeSet<String>, returned: BTreeSet<String>) -> Self {
        let missing = requested.difference(&returned).cloned().collect();
        Self {
            requested,
            returned,
            missing,
        }
    }
}

/// How to treat a batch response whose ID set differs from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Fail the run; continuing would risk silently mislabeled data.
    Strict,
    /// Keep the matched pairs and re-queue whatever the model dropped.
    #[default]
    Lenient,
}

/// Result of reconciling one batch.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Matched (input, prediction) pairs, ready to write.
    pub resolved: Vec<HazmatLabeledItem>,
    /// Sent items the model did not answer; they go back into the pool.
    pub to_requeue: Vec<HazmatInputItem>,
}

/// Match returned predictions to the items that were sent, by item ID.
pub fn reconcile(
    sent: Vec<HazmatInputItem>,
    received: Vec<HazmatPrediction>,
    policy: MismatchPolicy,
) -> Result<Reconciliation, MismatchedPredictionsError> {
    let sent_ids: BTreeSet<String> = sent.iter().map(|item| item.item_id.clone()).collect();
    let received_ids: BTreeSet<String> = received.iter().map(|p| p.item_id.clone()).collect();

    if policy == MismatchPolicy::Strict && sent_ids != received_ids {
        return Err(MismatchedPredictionsError::new(sent_ids, received_ids));
    }

    for unrequested in received_ids.difference(&sent_ids) {
        tracing::warn!(
            item_id = %unrequested,
            "Model returned a prediction for an item that was not requested, discarding"
        );
    }

    let mut by_id: HashMap<String, HazmatPrediction> = received
        .into_iter()
        .map(|p| (p.item_id.clone(), p))
        .collect();

    let mut reconciliation = Reconciliation::default();
    for item in sent {
        match by_id.remove(&item.item_id) {
            Some(prediction) => {
                match HazmatLabeledItem::from_input_and_prediction(&item, prediction) {
                    Ok(labeled) => reconciliation.resolved.push(labeled),
                    Err(_) => reconciliation.to_requeue.push(item),
                }
            }
            None => reconciliation.to_requeue.push(item),
        }
    }

    Ok(reconciliation)
}
