//! Admission Properties
//!
//! Black-box checks of the queue's sizing, ordering and outcome guarantees.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskgate_core::{AdmissionQueue, Batcher, QueueError, TaskError};
use taskgate_integration_tests::{delayed, failing, never, ActiveProbe, TestError};

#[test]
fn test_fresh_queue_sizes() {
    for capacity in [1, 2, 4, 7, 64] {
        let queue = AdmissionQueue::new(capacity).unwrap();
        assert_eq!(queue.active_size(), 0);
        assert_eq!(queue.waiting_size(), 0);
        assert_eq!(queue.max_size(), capacity);
    }
}

#[test]
fn test_zero_capacity_rejected() {
    let result = AdmissionQueue::new(0);
    assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
}

/// Sizes update immediately even though no task has finished
#[tokio::test]
async fn test_active_overflows_into_waiting() {
    const QUEUE_MAX: usize = 4;
    const TEST_COUNT: usize = 800;

    let queue = AdmissionQueue::new(QUEUE_MAX).unwrap();
    let mut submissions = Vec::with_capacity(TEST_COUNT);

    for i in 0..TEST_COUNT {
        submissions.push(queue.submit(never::<()>).unwrap());

        assert_eq!(queue.active_size(), QUEUE_MAX.min(i + 1));
        assert_eq!(queue.waiting_size(), (i + 1).saturating_sub(QUEUE_MAX));
    }
}

#[tokio::test]
async fn test_fewer_tasks_than_capacity_all_active() {
    let queue = AdmissionQueue::new(8).unwrap();
    let _pending: Vec<_> = (0..5).map(|_| queue.submit(never::<u8>).unwrap()).collect();

    assert_eq!(queue.active_size(), 5);
    assert_eq!(queue.waiting_size(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overflow_eventually_clears_out() {
    const QUEUE_MAX: usize = 4;
    const TEST_COUNT: usize = 600;

    let queue = AdmissionQueue::new(QUEUE_MAX).unwrap();
    let probe = ActiveProbe::default();

    let submissions: Vec<_> = (0..TEST_COUNT)
        .map(|i| {
            let queue_in_task = queue.clone();
            let probe = probe.clone();
            queue
                .submit(move || async move {
                    probe.observe(&queue_in_task);
                    delayed(Duration::from_millis(2), i).await
                })
                .unwrap()
        })
        .collect();

    let results = futures::future::join_all(submissions).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result, Ok(i));
    }
    assert!(probe.peak() <= QUEUE_MAX, "peak {} exceeded capacity", probe.peak());
    assert!(probe.peak() >= 1);
    assert_eq!(queue.active_size(), 0);
    assert_eq!(queue.waiting_size(), 0);
}

#[tokio::test]
async fn test_failure_is_returned_to_caller() {
    let queue = AdmissionQueue::new(4).unwrap();

    let result = queue.submit(|| failing::<bool>("Error")).unwrap().await;

    assert_eq!(result, Err(TaskError::Failed("Error".to_string())));
    assert_eq!(result.unwrap_err().into_failure(), Some("Error".to_string()));
}

#[tokio::test]
async fn test_queue_does_not_stop_on_error() {
    let queue = AdmissionQueue::new(1).unwrap();

    let first = queue
        .submit(|| delayed(Duration::from_millis(20), "first"))
        .unwrap();
    let broken = queue.submit(|| failing::<&str>("Error")).unwrap();
    let test = queue
        .submit(|| delayed(Duration::from_millis(20), "test"))
        .unwrap();
    let library = queue
        .submit(|| delayed(Duration::from_millis(20), "library"))
        .unwrap();
    assert_eq!(queue.waiting_size(), 3);

    assert_eq!(first.await, Ok("first"));
    assert!(broken.await.unwrap_err().is_failed());
    assert_eq!(test.await, Ok("test"));
    assert_eq!(library.await, Ok("library"));

    // Submissions after the failure run normally too
    let later = queue.submit(|| delayed(Duration::ZERO, 5u8)).unwrap();
    assert_eq!(later.await, Ok(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_serial_queue_admits_in_submission_order() {
    let queue = Batcher::serial_queue();
    let started = Arc::new(Mutex::new(Vec::new()));

    let submissions: Vec<_> = (0..20)
        .map(|i| {
            let started = Arc::clone(&started);
            queue
                .submit(move || {
                    started.lock().unwrap().push(i);
                    delayed(Duration::from_millis(1), i)
                })
                .unwrap()
        })
        .collect();

    for result in futures::future::join_all(submissions).await {
        assert!(result.is_ok());
    }
    assert_eq!(*started.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_completion_order_is_unconstrained() {
    let queue = Batcher::eager_queue(Some(2)).unwrap();
    let finished = Arc::new(Mutex::new(Vec::new()));

    let slow_log = Arc::clone(&finished);
    let slow = queue
        .submit(move || async move {
            let out = delayed(Duration::from_millis(50), "slow").await;
            slow_log.lock().unwrap().push("slow");
            out
        })
        .unwrap();
    let fast_log = Arc::clone(&finished);
    let fast = queue
        .submit(move || async move {
            let out = delayed(Duration::from_millis(1), "fast").await;
            fast_log.lock().unwrap().push("fast");
            out
        })
        .unwrap();

    let (slow, fast) = tokio::join!(slow, fast);
    assert_eq!(slow, Ok("slow"));
    assert_eq!(fast, Ok("fast"));
    assert_eq!(*finished.lock().unwrap(), vec!["fast", "slow"]);
}

#[tokio::test]
async fn test_eager_queue_default_runs_four_at_once() {
    let queue = Batcher::eager_queue(None).unwrap();
    let _pending: Vec<_> = (0..6)
        .map(|_| queue.submit(never::<TestError>).unwrap())
        .collect();

    assert_eq!(queue.active_size(), 4);
    assert_eq!(queue.waiting_size(), 2);
}
