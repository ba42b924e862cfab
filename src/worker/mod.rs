//! Bounded background task queue
//!
//! Long operations run on a fixed set of named worker threads fed through a
//! bounded channel. Workers report back through [`TaskEvent`]s that the frame
//! loop drains at the top of every tick, so whole suggestion lists are handed
//! over in one message and the render thread never sees a partial list.
//!
//! Every submitted job gets its own progress `f32` shared through an atomic,
//! and cancellation is one process-wide flag that both workers and the frame
//! loop poll.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

use crate::detect::Detector;
use crate::domain::Suggestion;

/// Cooperative cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fraction in `[0, 1]` written by a worker and read by the progress dialog
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle(Arc<AtomicU32>);

impl ProgressHandle {
    pub fn set(&self, value: f32) {
        self.0
            .store(value.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Record that `done` of `total` items are finished
    pub fn step(&self, done: usize, total: usize) {
        if total > 0 {
            self.set(done as f32 / total as f32);
        }
    }
}

/// What kind of job produced a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    LoadDetector,
    Detection,
    Export,
    RemoveSimilar,
}

/// Messages from workers to the render thread
pub enum TaskEvent {
    /// Complete suggestion list for one path, replacing any previous list
    Suggestions {
        path: PathBuf,
        suggestions: Vec<Suggestion>,
    },
    /// A detector finished loading and is ready for use
    DetectorLoaded {
        index: usize,
        detector: Arc<dyn Detector>,
    },
    /// These paths need no more cropping; ends the final square check
    Settled { paths: Vec<PathBuf>, summary: String },
    /// The job ran to completion (possibly skipping items)
    Finished { kind: TaskKind, summary: String },
    /// The job could not run at all
    Failed { kind: TaskKind, message: String },
}

impl std::fmt::Debug for TaskEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskEvent::Suggestions { path, suggestions } => f
                .debug_struct("Suggestions")
                .field("path", path)
                .field("count", &suggestions.len())
                .finish(),
            TaskEvent::DetectorLoaded { index, detector } => f
                .debug_struct("DetectorLoaded")
                .field("index", index)
                .field("name", &detector.name())
                .finish(),
            TaskEvent::Settled { paths, summary } => f
                .debug_struct("Settled")
                .field("count", &paths.len())
                .field("summary", summary)
                .finish(),
            TaskEvent::Finished { kind, summary } => f
                .debug_struct("Finished")
                .field("kind", kind)
                .field("summary", summary)
                .finish(),
            TaskEvent::Failed { kind, message } => f
                .debug_struct("Failed")
                .field("kind", kind)
                .field("message", message)
                .finish(),
        }
    }
}

/// Handed to every job
pub struct TaskContext {
    pub progress: ProgressHandle,
    pub cancel: CancelToken,
    events: Sender<TaskEvent>,
}

impl TaskContext {
    pub fn publish(&self, event: TaskEvent) {
        if self.events.send(event).is_err() {
            log::debug!("Task event dropped, receiver is gone");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct Job {
    run: Box<dyn FnOnce(&TaskContext) + Send + 'static>,
    progress: ProgressHandle,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("too many background tasks are queued")]
    Busy,
    #[error("the task queue has shut down")]
    Closed,
}

pub struct TaskQueue {
    jobs: Option<Sender<Job>>,
    events: Receiver<TaskEvent>,
    cancel: CancelToken,
    workers: Vec<JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawn `threads` workers sharing a queue of `capacity` pending jobs
    pub fn new(threads: usize, capacity: usize, cancel: CancelToken) -> Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(capacity.max(1));
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        let mut workers = Vec::new();
        for i in 0..threads.max(1) {
            let jobs = job_rx.clone();
            let cancel = cancel.clone();
            let events = event_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("squarecrop-worker-{i}"))
                .spawn(move || {
                    for job in jobs.iter() {
                        let ctx = TaskContext {
                            progress: job.progress,
                            cancel: cancel.clone(),
                            events: events.clone(),
                        };
                        (job.run)(&ctx);
                    }
                })
                .with_context(|| format!("Failed to spawn worker thread {i}"))?;
            workers.push(handle);
        }

        Ok(Self {
            jobs: Some(job_tx),
            events: event_rx,
            cancel,
            workers,
        })
    }

    /// Queue a job; refused with [`TaskError::Busy`] when the queue is full
    ///
    /// The returned handle follows this job's progress only.
    pub fn submit(
        &self,
        job: impl FnOnce(&TaskContext) + Send + 'static,
    ) -> Result<ProgressHandle, TaskError> {
        let Some(jobs) = &self.jobs else {
            return Err(TaskError::Closed);
        };
        let progress = ProgressHandle::default();
        let job = Job {
            run: Box::new(job),
            progress: progress.clone(),
        };
        match jobs.try_send(job) {
            Ok(()) => Ok(progress),
            Err(TrySendError::Full(_)) => Err(TaskError::Busy),
            Err(TrySendError::Disconnected(_)) => Err(TaskError::Closed),
        }
    }

    /// Everything workers published since the last call
    pub fn drain_events(&self) -> Vec<TaskEvent> {
        self.events.try_iter().collect()
    }

    /// Raise the cancel flag, stop accepting jobs and join the workers
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.jobs = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SuggestionMap;
    use std::time::Duration;

    #[test]
    fn test_progress_round_trips_through_bits() {
        let p = ProgressHandle::default();
        assert_eq!(p.get(), 0.0);
        p.step(1, 4);
        assert_eq!(p.get(), 0.25);
        p.set(7.0);
        assert_eq!(p.get(), 1.0);
    }

    #[test]
    fn test_full_queue_is_busy() {
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        let queue = TaskQueue::new(1, 1, CancelToken::default()).unwrap();
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(1);

        // Occupy the only worker until the gate opens
        queue
            .submit(move |_| {
                let _ = started_tx.send(());
                let _ = gate_rx.recv();
            })
            .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        queue.submit(|_| {}).unwrap();
        assert!(matches!(queue.submit(|_| {}), Err(TaskError::Busy)));
        gate_tx.send(()).unwrap();
    }

    #[test]
    fn test_shutdown_cancels_and_refuses() {
        let cancel = CancelToken::default();
        let mut queue = TaskQueue::new(2, 2, cancel.clone()).unwrap();
        queue.shutdown();
        assert!(cancel.is_cancelled());
        assert!(matches!(queue.submit(|_| {}), Err(TaskError::Closed)));
    }

    #[test]
    fn test_workers_publish_events() {
        let queue = TaskQueue::new(1, 4, CancelToken::default()).unwrap();
        let progress = queue
            .submit(|ctx| {
                ctx.progress.set(1.0);
                ctx.publish(TaskEvent::Finished {
                    kind: TaskKind::Export,
                    summary: "done".into(),
                });
            })
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && std::time::Instant::now() < deadline {
            events = queue.drain_events();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(
            events.as_slice(),
            [TaskEvent::Finished { kind: TaskKind::Export, .. }]
        ));
        assert_eq!(progress.get(), 1.0);
    }

    #[test]
    fn test_each_job_has_its_own_progress() {
        let queue = TaskQueue::new(2, 4, CancelToken::default()).unwrap();
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);

        let slow = queue
            .submit(move |ctx| {
                ctx.progress.set(0.5);
                let _ = gate_rx.recv();
                ctx.progress.set(1.0);
            })
            .unwrap();
        let fast = queue
            .submit(move |ctx| {
                ctx.progress.set(1.0);
                let _ = done_tx.send(());
            })
            .unwrap();

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(fast.get(), 1.0);
        assert!(slow.get() < 1.0);
        gate_tx.send(()).unwrap();
    }

    #[test]
    fn test_reader_never_sees_partial_list() {
        const LEN: usize = 32;
        let queue = TaskQueue::new(2, 4, CancelToken::default()).unwrap();
        let path = PathBuf::from("p.jpg");
        for worker in 0..2 {
            let path = path.clone();
            queue
                .submit(move |ctx| {
                    for round in 0..200 {
                        let value = (worker * 1000 + round) as f32;
                        let list = vec![Suggestion::new([value; 4]); LEN];
                        ctx.publish(TaskEvent::Suggestions {
                            path: path.clone(),
                            suggestions: list,
                        });
                    }
                })
                .unwrap();
        }

        let mut map = SuggestionMap::new();
        let mut seen = 0;
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while seen < 400 && std::time::Instant::now() < deadline {
            for event in queue.drain_events() {
                if let TaskEvent::Suggestions { path, suggestions } = event {
                    map.insert(path, suggestions);
                    seen += 1;
                }
                let current = &map[&path];
                assert_eq!(current.len(), LEN);
                assert!(current.iter().all(|s| s.bounds == current[0].bounds));
            }
        }
        assert_eq!(seen, 400);
    }
}
