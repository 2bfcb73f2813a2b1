// THEORY:
// The parallel pipeline spreads work that is independent across many inputs:
// building tables for a stream of frames, and running many box searches over
// one finished table. A single table build is a strictly ordered sweep (or the
// rayon two-sweep variant), so parallelism here is across frames and across
// boxes, never inside one descent.
//
// Frames go through a round-robin dispatcher to a fixed set of worker tasks.
// Each worker owns a `SaliencePipeline` and does the CPU-bound build on the
// blocking pool, replying through a oneshot channel. Box searches share the
// table through an `Arc`; a finished table is read-only, so no locking is
// needed, and a semaphore caps how many searches run at once.

use crate::core_modules::descent::DescentOutcome;
use crate::core_modules::matrix::matrix::Matrix;
use crate::core_modules::summed_area_table::SummedAreaTable;
use crate::error::{SatError, SatResult};
use crate::pipeline::{SalienceConfig, SaliencePipeline, SearchRequest};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;

pub struct FrameBuffer {
    pub frame_id: u64,
    pub samples: Matrix<u8>,
    pub timestamp: Instant,
}

#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub frame_id: u64,
    pub table: Arc<SummedAreaTable>,
    /// Time from submission to the finished table.
    pub elapsed: Duration,
}

struct FrameTask {
    frame_buffer: FrameBuffer,
    result_sender: oneshot::Sender<SatResult<FrameAnalysis>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    pipeline: SaliencePipeline,
    search_permits: Arc<Semaphore>,
    frame_counter: AtomicU64,
}

impl WorkerPool {
    /// Spawns the dispatcher and `config.workers` workers. Must be called from
    /// inside a tokio runtime.
    pub fn new(config: SalienceConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        // Spawn dispatcher
        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task.result_sender.send(Err(SatError::WorkerUnavailable));
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        // Spawn workers
        let mut workers = Vec::with_capacity(worker_count);
        for mut worker_receiver in worker_receivers {
            let pipeline = SaliencePipeline::new(config.clone());
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let analysis = Self::process_frame_worker(&pipeline, task.frame_buffer).await;
                    let _ = task.result_sender.send(analysis);
                }
            });
            workers.push(worker);
        }

        tracing::debug!(workers = worker_count, "worker pool started");

        Self {
            task_sender,
            dispatcher,
            workers,
            pipeline: SaliencePipeline::new(config),
            search_permits: Arc::new(Semaphore::new(worker_count)),
            frame_counter: AtomicU64::new(0),
        }
    }

    async fn process_frame_worker(
        pipeline: &SaliencePipeline,
        frame_buffer: FrameBuffer,
    ) -> SatResult<FrameAnalysis> {
        let pipeline = pipeline.clone();
        let FrameBuffer {
            frame_id,
            samples,
            timestamp,
        } = frame_buffer;

        let table = tokio::task::spawn_blocking(move || pipeline.build_table(&samples))
            .await
            .map_err(|_| SatError::WorkerUnavailable)??;

        Ok(FrameAnalysis {
            frame_id,
            table: Arc::new(table),
            elapsed: timestamp.elapsed(),
        })
    }

    /// Builds the table for one frame on the next worker in line.
    pub async fn process_frame(&self, samples: Matrix<u8>) -> SatResult<FrameAnalysis> {
        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let (result_sender, result_receiver) = oneshot::channel();

        let task = FrameTask {
            frame_buffer: FrameBuffer {
                frame_id,
                samples,
                timestamp: Instant::now(),
            },
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| SatError::WorkerUnavailable)?;

        result_receiver.await.map_err(|_| SatError::WorkerUnavailable)?
    }

    /// Builds tables for every frame concurrently. Results keep the input order.
    pub async fn process_frames(&self, frames: Vec<Matrix<u8>>) -> Vec<SatResult<FrameAnalysis>> {
        join_all(frames.into_iter().map(|samples| self.process_frame(samples))).await
    }

    /// Runs one descent per request, at most `workers` at a time. Each request
    /// keeps its own direction preset, step size and iteration count.
    /// Outcomes keep the order of `requests`; the first failure is returned.
    pub async fn minimise_regions<R>(
        &self,
        sat: Arc<SummedAreaTable>,
        requests: &[R],
    ) -> SatResult<Vec<DescentOutcome>>
    where
        R: Into<SearchRequest> + Copy,
    {
        let searches = requests.iter().map(|&request| {
            let request: SearchRequest = request.into();
            let sat = Arc::clone(&sat);
            let pipeline = self.pipeline.clone();
            let permits = Arc::clone(&self.search_permits);
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| SatError::WorkerUnavailable)?;
                tokio::task::spawn_blocking(move || pipeline.minimise(&sat, request))
                    .await
                    .map_err(|_| SatError::WorkerUnavailable)?
            }
        });

        join_all(searches).await.into_iter().collect()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting frames and waits for the workers to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
        tracing::debug!("worker pool stopped");
    }
}
