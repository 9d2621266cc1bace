//! Batch classification pipeline
//!
//! The driver pulls token-budgeted batches from the work pool, dispatches
//! them to the classification agent, reconciles returned predictions by
//! item ID, writes resolved records incrementally, and re-queues anything
//! the model dropped or failed.

pub mod batching;
pub mod driver;
pub mod invoker;
pub mod pool;
pub mod reconcile;
pub mod sink;

pub use batching::BatchTooLargeError;
pub use driver::{BatchDriver, DriverConfig, DriverError, RunReport};
pub use invoker::{BatchOutcome, ClassificationInvoker};
pub use pool::WorkPool;
pub use reconcile::{MismatchPolicy, MismatchedPredictionsError, Reconciliation};
pub use sink::{OnExistingOutput, OutputSink, SinkError};
