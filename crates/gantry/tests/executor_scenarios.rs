//! End-to-end executor scenarios
//!
//! Each test builds a small graph, drives it with a recording factory, and
//! asserts on the aggregate result plus the observed submission order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gantry::{
    Executor, ExecutorConfig, ExecutorError, TaskError, TaskGraph, TaskOutcome, Worker,
    WorkerFactory,
};

type Task = &'static str;

/// Factory that records every worker invocation and fails the named tasks
/// with the message `"boom"`.
struct RecordingFactory {
    log: Arc<Mutex<Vec<Task>>>,
    fail: &'static [Task],
}

impl RecordingFactory {
    fn new() -> (Self, Arc<Mutex<Vec<Task>>>) {
        Self::failing(&[])
    }

    fn failing(fail: &'static [Task]) -> (Self, Arc<Mutex<Vec<Task>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let factory = Self {
            log: Arc::clone(&log),
            fail,
        };
        (factory, log)
    }
}

impl WorkerFactory<Task> for RecordingFactory {
    fn create_workers(&self, tasks: &[Task]) -> Vec<Box<dyn Worker<Task>>> {
        tasks
            .iter()
            .map(|&task| {
                let log = Arc::clone(&self.log);
                let fail = self.fail.contains(&task);
                Box::new(move || {
                    log.lock().unwrap().push(task);
                    if fail {
                        Ok(TaskOutcome::failed(task, "boom"))
                    } else {
                        Ok(TaskOutcome::ok(task))
                    }
                }) as Box<dyn Worker<Task>>
            })
            .collect()
    }
}

fn position(log: &[Task], task: Task) -> usize {
    log.iter()
        .position(|&t| t == task)
        .unwrap_or_else(|| panic!("task {task:?} never ran"))
}

/// `a` depends on `b`; `b` depends on `c` and `d`; `e` is isolated.
fn branching_graph() -> TaskGraph<Task> {
    let mut graph = TaskGraph::new();
    graph.add_edge("a", "b");
    graph.add_edge("b", "c");
    graph.add_edge("b", "d");
    graph.add_node("e");
    graph
}

#[tokio::test]
async fn test_linear_chain_completes_bottom_up() {
    let mut graph = TaskGraph::new();
    graph.add_edge("a", "b");
    graph.add_edge("b", "c");

    let (factory, log) = RecordingFactory::new();
    let result = Executor::new(&mut graph, factory).run().await.unwrap();

    assert!(result.success);
    assert!(result.error_message.is_none());
    assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
    assert!(graph.is_empty());
}

#[tokio::test]
async fn test_diamond_respects_both_branches() {
    let mut graph = TaskGraph::new();
    graph.add_edge("a", "b");
    graph.add_edge("a", "c");
    graph.add_edge("b", "d");
    graph.add_edge("c", "d");

    let (factory, log) = RecordingFactory::new();
    let result = Executor::new(&mut graph, factory).run().await.unwrap();

    assert!(result.success);
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0], "d");
    assert_eq!(log[3], "a");
    // b and c run between d and a, in either order
    assert!(position(&log, "b") > position(&log, "d"));
    assert!(position(&log, "c") > position(&log, "d"));
    assert!(graph.is_empty());
}

#[tokio::test]
async fn test_isolated_node_runs_alongside_chain() {
    let mut graph = branching_graph();
    let initial_free = graph.free_nodes();
    assert_eq!(initial_free, ["c", "d", "e"].into_iter().collect());

    let (factory, log) = RecordingFactory::new();
    let result = Executor::new(&mut graph, factory).run().await.unwrap();

    assert!(result.success);
    let mut ran = result.tasks_run.clone();
    ran.sort_unstable();
    assert_eq!(ran, vec!["a", "b", "c", "d", "e"]);

    // Every task is submitted exactly once
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 5);

    // Dependents start only after their prerequisites completed
    assert!(position(&log, "b") > position(&log, "c"));
    assert!(position(&log, "b") > position(&log, "d"));
    assert!(position(&log, "a") > position(&log, "b"));
    assert!(graph.is_empty());
}

#[tokio::test]
async fn test_failure_aborts_dependents() {
    let mut graph = branching_graph();

    let (factory, log) = RecordingFactory::failing(&["c"]);
    let result = Executor::new(&mut graph, factory).run().await.unwrap();

    assert!(!result.success);
    assert_eq!(result.error_message.as_deref(), Some("boom"));

    // c, d, e were submitted in the first cycle; b and a must never run
    let mut ran = result.tasks_run.clone();
    ran.sort_unstable();
    assert_eq!(ran, vec!["c", "d", "e"]);
    let log = log.lock().unwrap();
    assert!(!log.contains(&"b"));
    assert!(!log.contains(&"a"));

    // The failing node and its transitive dependents stay in the graph
    assert!(graph.contains(&"c"));
    assert!(graph.contains(&"b"));
    assert!(graph.contains(&"a"));
}

#[tokio::test]
async fn test_fanout_failure_blocks_root() {
    let mut graph = TaskGraph::new();
    graph.add_edge("a", "b");
    graph.add_edge("a", "c");

    let (factory, log) = RecordingFactory::failing(&["b"]);
    let result = Executor::new(&mut graph, factory).run().await.unwrap();

    assert!(!result.success);
    let mut ran = result.tasks_run.clone();
    ran.sort_unstable();
    assert_eq!(ran, vec!["b", "c"]);
    assert!(!log.lock().unwrap().contains(&"a"));
    assert!(graph.contains(&"a"));
}

#[tokio::test]
async fn test_empty_graph_succeeds_immediately() {
    let mut graph: TaskGraph<Task> = TaskGraph::new();

    let (factory, log) = RecordingFactory::new();
    let result = Executor::new(&mut graph, factory).run().await.unwrap();

    assert!(result.success);
    assert!(result.tasks_run.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

/// Factory whose workers panic instead of reporting an outcome.
struct PanickingFactory;

impl WorkerFactory<Task> for PanickingFactory {
    fn create_workers(&self, tasks: &[Task]) -> Vec<Box<dyn Worker<Task>>> {
        tasks
            .iter()
            .map(|&task| {
                Box::new(move || -> Result<TaskOutcome<Task>, TaskError> {
                    panic!("worker exploded for {task}")
                }) as Box<dyn Worker<Task>>
            })
            .collect()
    }
}

#[tokio::test]
async fn test_worker_panic_becomes_synthetic_failure() {
    let mut graph = TaskGraph::new();
    graph.add_node("x");

    let result = Executor::new(&mut graph, PanickingFactory)
        .run()
        .await
        .unwrap();

    assert!(!result.success);
    let message = result.error_message.expect("panic must carry a message");
    assert!(message.contains("panicked"), "unexpected message: {message}");
}

/// Factory whose workers raise a domain fault.
struct FaultingFactory;

impl WorkerFactory<Task> for FaultingFactory {
    fn create_workers(&self, tasks: &[Task]) -> Vec<Box<dyn Worker<Task>>> {
        tasks
            .iter()
            .map(|&_task| {
                Box::new(|| -> Result<TaskOutcome<Task>, TaskError> {
                    Err(TaskError::new("manifest missing"))
                }) as Box<dyn Worker<Task>>
            })
            .collect()
    }
}

#[tokio::test]
async fn test_task_error_propagates_unchanged() {
    let mut graph = TaskGraph::new();
    graph.add_node("x");

    let result = Executor::new(&mut graph, FaultingFactory).run().await;

    let err = result.expect_err("domain fault must surface as Err");
    assert!(matches!(err, ExecutorError::Task(_)));
    assert_eq!(err.to_string(), "manifest missing");
}

/// Factory whose workers track how many of them execute concurrently.
struct GaugeFactory {
    current: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

impl WorkerFactory<u32> for GaugeFactory {
    fn create_workers(&self, tasks: &[u32]) -> Vec<Box<dyn Worker<u32>>> {
        tasks
            .iter()
            .map(|&task| {
                let current = Arc::clone(&self.current);
                let max = Arc::clone(&self.max);
                Box::new(move || {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(25));
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(TaskOutcome::ok(task))
                }) as Box<dyn Worker<u32>>
            })
            .collect()
    }
}

#[tokio::test]
async fn test_pool_width_bounds_concurrency() {
    let mut graph = TaskGraph::new();
    for task in 0..8u32 {
        graph.add_node(task);
    }

    let max = Arc::new(AtomicUsize::new(0));
    let factory = GaugeFactory {
        current: Arc::new(AtomicUsize::new(0)),
        max: Arc::clone(&max),
    };

    let config = ExecutorConfig::new().with_workers(2);
    let result = Executor::with_config(&mut graph, factory, config)
        .run()
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.tasks_run.len(), 8);
    assert!(max.load(Ordering::SeqCst) <= 2);
}

/// Factory whose single worker outlasts several completion waits.
struct SlowFactory;

impl WorkerFactory<Task> for SlowFactory {
    fn create_workers(&self, tasks: &[Task]) -> Vec<Box<dyn Worker<Task>>> {
        tasks
            .iter()
            .map(|&task| {
                Box::new(move || {
                    std::thread::sleep(Duration::from_millis(120));
                    Ok(TaskOutcome::ok(task))
                }) as Box<dyn Worker<Task>>
            })
            .collect()
    }
}

#[tokio::test]
async fn test_completion_timeout_is_not_a_failure() {
    let mut graph = TaskGraph::new();
    graph.add_node("slow");

    let config = ExecutorConfig::new().with_poll_interval(Duration::from_millis(25));
    let result = Executor::with_config(&mut graph, SlowFactory, config)
        .run()
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.tasks_run, vec!["slow"]);
}
