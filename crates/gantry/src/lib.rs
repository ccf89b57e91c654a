//! Dynamic task-dependency executor
//!
//! This crate is the scheduling core of a build pipeline: it drives a
//! directed acyclic graph of tasks to completion across a bounded worker
//! pool, discovering newly runnable tasks as their prerequisites complete
//! and aborting cleanly on the first failure. The core is domain-agnostic:
//! it knows nothing about what a task *does*. Callers supply opaque task
//! values and a [`WorkerFactory`] that turns runnable values into executable
//! workers.
//!
//! # Overview
//!
//! - [`TaskGraph`] holds outstanding tasks and their prerequisite edges as
//!   two reciprocal adjacency maps, mutated in place as tasks succeed.
//! - [`Worker`] / [`WorkerFactory`] are the seams to caller-supplied task
//!   logic; a worker reports a [`TaskOutcome`] echoing its task value.
//! - [`Executor`] owns the driver loop: submit the free frontier, await one
//!   completion with a bounded wait, remove the completed node, recompute
//!   the frontier, repeat until quiescence or first failure.
//!
//! # Failure model
//!
//! A worker returning an unsuccessful outcome abandons the run: nothing new
//! is submitted, in-flight workers drain, and the first failure's message
//! lands in the [`RunResult`]. A worker panic is folded into the same shape.
//! A [`TaskError`] is the exception: it is re-raised from [`Executor::run`]
//! unchanged so task-level faults keep their identity for the caller.
//!
//! Cycles are caller errors: a cyclic graph never reaches quiescence. Run
//! [`TaskGraph::validate`] after construction if the input is untrusted.

mod config;
mod error;
mod executor;
mod graph;
mod worker;

// Re-export error types at crate root
pub use error::{ExecutorError, Result, TaskError};

// Re-export the graph
pub use graph::{GraphError, Node, TaskGraph};

// Re-export the worker seams
pub use worker::{TaskOutcome, Worker, WorkerFactory};

// Re-export the executor
pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS, ExecutorConfig};
pub use executor::{Executor, RunResult};
