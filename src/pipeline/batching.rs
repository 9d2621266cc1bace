//! Token-budget-aware batch extraction
//!
//! Item text length varies wildly (empty description vs. multi-paragraph),
//! so a fixed batch size is unsafe against a hard context-window ceiling.
//! Oversized candidate batches are halved until they fit, converging in
//! O(log batch_size) steps.

use thiserror::Error;

use crate::model::HazmatInputItem;
use crate::pipeline::pool::WorkPool;
use crate::util::tokens::{estimate_token_count, ApproximationMode};

/// A single item's rendered prompt exceeds the token budget on its own.
///
/// Halving cannot help further; the item is handed back so the caller can
/// decide to skip it or raise the budget.
#[derive(Debug, Error)]
#[error(
    "batch of 1 item ({}) estimated at {estimated_tokens} tokens exceeds the budget of {max_tokens} and cannot be reduced further",
    .item.item_id
)]
pub struct BatchTooLargeError {
    pub item: HazmatInputItem,
    pub estimated_tokens: usize,
    pub max_tokens: usize,
}

/// Extract a batch from the pool whose rendered prompt fits the budget.
///
/// Pops up to `max_batch_size` items, then halves the candidate batch
/// (returning the surplus half to the pool) until the overestimated token
/// count of `render(batch)` is at most `max_tokens`.
pub fn extract_batch<F>(
    pool: &mut WorkPool,
    max_batch_size: usize,
    max_tokens: usize,
    render: F,
) -> Result<Vec<HazmatInputItem>, BatchTooLargeError>
where
    F: Fn(&[HazmatInputItem]) -> String,
{
    let mut batch = pool.pop_many(max_batch_size);
    if batch.is_empty() {
        return Ok(batch);
    }

    loop {
        let prompt = render(&batch);
        let estimated_tokens = estimate_token_count(&prompt, ApproximationMode::Overestimate);
        if estimated_tokens <= max_tokens {
            return Ok(batch);
        }

        if batch.len() == 1 {
            let item = batch.remove(0);
            return Err(BatchTooLargeError {
                item,
                estimated_tokens,
                max_tokens,
            });
        }

        tracing::warn!(
            estimated_tokens = estimated_tokens,
            max_tokens = max_tokens,
            batch_len = batch.len(),
            "Estimated token count exceeds budget, halving batch"
        );

        let keep_from = batch.len() / 2;
        let returned: Vec<_> = batch.drain(..keep_from).collect();
        pool.extend(returned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::tokens::{estimate_token_count, ApproximationMode};

    fn item(id: &str, description_len: usize) -> HazmatInputItem {
        HazmatInputItem {
            item_id: id.to_string(),
            name: format!("Product {id}"),
            domain_id: "MLB-TOOLS".to_string(),
            family_name: "Family".to_string(),
            permalink: None,
            description: Some("d".repeat(description_len)),
            short_description: None,
            keywords: None,
            attributes: Vec::new(),
            main_features: Vec::new(),
        }
    }

    /// Render proportional to total description length, like a real prompt.
    fn render(items: &[HazmatInputItem]) -> String {
        items
            .iter()
            .map(|i| i.description.clone().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_batch_fits_budget_or_errors() {
        let items: Vec<_> = (0..10).map(|i| item(&format!("MLB{i}"), 100)).collect();
        let mut pool = WorkPool::new(items);

        let batch = extract_batch(&mut pool, 10, 10_000, render).unwrap();
        let estimated = estimate_token_count(&render(&batch), ApproximationMode::Overestimate);
        assert!(estimated <= 10_000);
        assert_eq!(batch.len(), 10);
    }

    #[test]
    fn test_oversized_batch_is_halved_and_surplus_returned() {
        // Each item renders to ~200 chars -> ~67 tokens overestimated.
        // Ten items blow a 400-token budget; halves go back to the pool.
        let items: Vec<_> = (0..10).map(|i| item(&format!("MLB{i}"), 200)).collect();
        let mut pool = WorkPool::new(items);

        let batch = extract_batch(&mut pool, 10, 400, render).unwrap();
        let estimated = estimate_token_count(&render(&batch), ApproximationMode::Overestimate);
        assert!(estimated <= 400);
        assert!(batch.len() < 10);
        assert_eq!(batch.len() + pool.len(), 10);
    }

    #[test]
    fn test_singleton_over_budget_fails_loudly() {
        let mut pool = WorkPool::new(vec![item("MLB-BIG", 5000)]);

        let err = extract_batch(&mut pool, 10, 100, render).unwrap_err();
        assert_eq!(err.item.item_id, "MLB-BIG");
        assert!(err.estimated_tokens > err.max_tokens);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_one_fat_item_among_thin_ones() {
        // Nine thin items plus one fat one; the fat item alone still fits,
        // but the full batch of ten does not.
        let mut items: Vec<_> = (0..9).map(|i| item(&format!("MLB{i}"), 30)).collect();
        items.push(item("MLB-FAT", 900));
        let mut pool = WorkPool::new(items);

        // Budget of 350 tokens: full batch renders ~1170 chars -> 390 tokens.
        let batch = extract_batch(&mut pool, 10, 350, render).unwrap();
        let estimated = estimate_token_count(&render(&batch), ApproximationMode::Overestimate);
        assert!(estimated <= 350);
        assert!(batch.len() <= 9);
        assert_eq!(batch.len() + pool.len(), 10);
    }

    #[test]
    fn test_empty_pool_yields_empty_batch() {
        let mut pool = WorkPool::default();
        let batch = extract_batch(&mut pool, 10, 100, render).unwrap();
        assert!(batch.is_empty());
    }
}
