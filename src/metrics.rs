//! Scoped ambient metrics collection.
//!
//! A pipeline run enters a metrics scope once via [`with_metrics_scope`];
//! every stage wrapper ([`run_local_stage`], [`run_llm_stage`]) appends its
//! own duration to the active scope via [`record`]. The scope is a
//! `tokio::task_local`, so it survives suspension at `.await` points inside
//! the scope (needed for stages 7 and 8, which call out to an LLM) without
//! being threaded through every function signature. Code that runs outside
//! any scope (for example a stage exercised directly in a unit test) simply
//! records nothing.

use std::cell::RefCell;
use std::future::Future;

use crate::models::{NodeMetrics, NodeType};

tokio::task_local! {
    static METRICS: RefCell<Vec<NodeMetrics>>;
}

/// Run `body` with a fresh metrics scope active, returning its result
/// together with every metric recorded during its execution.
pub async fn with_metrics_scope<F, Fut, T>(body: F) -> (T, Vec<NodeMetrics>)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let cell = RefCell::new(Vec::new());
    METRICS
        .scope(cell, async {
            let result = body().await;
            let collected = METRICS.with(|m| m.borrow().clone());
            (result, collected)
        })
        .await
}

fn record(node_name: &str, node_type: NodeType, duration_ms: u64) {
    let _ = METRICS.try_with(|m| {
        m.borrow_mut().push(NodeMetrics {
            node_name: node_name.to_string(),
            node_type,
            duration_ms,
        });
    });
}

/// Run a synchronous local stage, timing it and recording the result under
/// `node_name` if a metrics scope is active.
pub fn run_local_stage<T>(node_name: &str, f: impl FnOnce() -> T) -> T {
    let start = std::time::Instant::now();
    let result = f();
    record(node_name, NodeType::Local, start.elapsed().as_millis() as u64);
    result
}

/// Run an async LLM-backed stage, timing it and recording the result under
/// `node_name` if a metrics scope is active.
pub async fn run_llm_stage<Fut, T>(node_name: &str, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let start = std::time::Instant::now();
    let result = fut.await;
    record(node_name, NodeType::Llm, start.elapsed().as_millis() as u64);
    result
}
