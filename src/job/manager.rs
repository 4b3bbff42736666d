//! Background job manager and session lifecycle.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::analysis::aggregator::{Aggregator, AnalysisConfig, AnalysisSummary};
use crate::analysis::model::AttentionModel;
use crate::assets::image::ImageSource;
use crate::detect::landmarks::LandmarkDetector;
use crate::encode::sink::SinkFactory;
use crate::foundation::error::{MorphError, MorphResult};
use crate::job::progress::{ProgressBoard, ProgressObserver, Snapshot, Stage};
use crate::morph::orchestrator::{MorphConfig, MorphRequest, Orchestrator};
use crate::morph::sequencer::MorphMode;

/// Unique identifier of one submitted job.
///
/// Time-derived with a process-local counter, so identifiers generated in the
/// same millisecond stay distinct. Uniqueness across callers that mint their
/// own identifiers is the caller's responsibility.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionId(String);

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

impl SessionId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{millis}-{seq}"))
    }

    /// Wrap a caller-supplied identifier.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inputs of one job submission.
#[derive(Clone, Debug)]
pub struct JobRequest {
    /// Reference to the first source image.
    pub image_a: String,
    /// Reference to the second source image.
    pub image_b: String,
    /// Directory the two output videos are written into.
    pub out_dir: PathBuf,
}

/// Terminal payload of a successful job.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct JobResult {
    /// Path of the encoded morph video.
    pub morph_video: PathBuf,
    /// Path of the encoded attention overlay video.
    pub gradcam_video: PathBuf,
    /// Number of frames produced.
    pub num_frames: usize,
    /// Synthesis mode the job selected.
    pub morph_type: MorphMode,
    /// Cross-frame attention statistics and samples.
    pub analysis: AnalysisSummary,
}

/// Collaborators and configuration shared by all workers.
pub struct JobContext {
    /// Image source resolver.
    pub resolver: Box<dyn ImageSource>,
    /// Correspondence provider.
    pub detector: Box<dyn LandmarkDetector>,
    /// Classifier + saliency collaborator (typically a
    /// [`crate::analysis::LazyModel`] handle).
    pub model: Box<dyn AttentionModel>,
    /// Factory for the per-video encoder sinks.
    pub sinks: Box<dyn SinkFactory>,
    /// Morph geometry and timing.
    pub morph: MorphConfig,
    /// Analysis sampling parameters.
    pub analysis: AnalysisConfig,
}

/// Worker pool sizing.
#[derive(Clone, Copy, Debug)]
pub struct PoolOpts {
    /// Number of worker threads.
    pub workers: usize,
    /// Bounded queue depth for accepted-but-not-started jobs.
    pub queue_depth: usize,
}

impl Default for PoolOpts {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_depth: 8,
        }
    }
}

struct QueuedJob {
    session: SessionId,
    request: JobRequest,
}

/// Runs morph jobs on a bounded worker pool and publishes progress snapshots.
///
/// `submit` returns as soon as the job is recorded and enqueued; observers
/// poll the [`ProgressBoard`] by session identifier until they see a terminal
/// snapshot. There is no cancellation: an abandoned identifier's job still
/// runs to completion or failure. Dropping the manager stops accepting work
/// and joins the workers after they drain the queue.
pub struct JobManager {
    board: Arc<ProgressBoard>,
    tx: Option<SyncSender<QueuedJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl JobManager {
    /// Start a worker pool over the given collaborators.
    pub fn new(context: JobContext, opts: PoolOpts) -> Self {
        let board = Arc::new(ProgressBoard::new());
        let context = Arc::new(context);
        let (tx, rx) = sync_channel::<QueuedJob>(opts.queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..opts.workers.max(1))
            .map(|i| {
                let rx = Arc::clone(&rx);
                let board = Arc::clone(&board);
                let context = Arc::clone(&context);
                std::thread::Builder::new()
                    .name(format!("morph-worker-{i}"))
                    .spawn(move || worker_loop(&rx, &board, &context))
                    .expect("failed to spawn morph worker thread")
            })
            .collect();

        Self {
            board,
            tx: Some(tx),
            workers,
        }
    }

    /// Shared handle to the progress board for polling observers.
    pub fn board(&self) -> Arc<ProgressBoard> {
        Arc::clone(&self.board)
    }

    /// Read the latest snapshot for `session`.
    pub fn poll(&self, session: &SessionId) -> Option<Arc<Snapshot>> {
        self.board.get(session.as_str())
    }

    /// Record and enqueue a job; returns once the job is accepted.
    ///
    /// Fails when the bounded queue is full or the pool is shutting down; a
    /// rejected job leaves no snapshot behind.
    pub fn submit(&self, session: &SessionId, request: JobRequest) -> MorphResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| MorphError::validation("job manager is shut down"))?;

        self.board
            .put(session.as_str(), Snapshot::running(0, 100, Stage::Loading));

        let queued = QueuedJob {
            session: session.clone(),
            request,
        };
        tx.try_send(queued).map_err(|e| {
            // Roll the acceptance record back so pollers do not wait on a job
            // that never runs.
            match &e {
                TrySendError::Full(job) | TrySendError::Disconnected(job) => {
                    self.board.put(
                        job.session.as_str(),
                        Snapshot::failed("job was not accepted"),
                    );
                }
            }
            match e {
                TrySendError::Full(_) => MorphError::validation("job queue is full"),
                TrySendError::Disconnected(_) => {
                    MorphError::validation("job manager is shut down")
                }
            }
        })?;
        tracing::info!(session = %session, "job accepted");
        Ok(())
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        drop(self.tx.take());
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(rx: &Mutex<Receiver<QueuedJob>>, board: &ProgressBoard, context: &JobContext) {
    loop {
        let job = {
            let guard = match rx.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.recv()
        };
        let Ok(job) = job else {
            // Channel closed: manager dropped, queue drained.
            return;
        };
        run_job(board, context, &job);
    }
}

/// Execute one job end to end and write its terminal snapshot last.
fn run_job(board: &ProgressBoard, context: &JobContext, job: &QueuedJob) {
    tracing::info!(session = %job.session, "job started");
    let progress = BoardProgress {
        board,
        session: job.session.as_str(),
    };

    let result = execute(context, &job.request, &job.session, &progress);
    match result {
        Ok(result) => {
            tracing::info!(session = %job.session, "job complete");
            board.put(job.session.as_str(), Snapshot::complete(result));
        }
        Err(e) => {
            tracing::warn!(session = %job.session, error = %e, "job failed");
            board.put(job.session.as_str(), Snapshot::failed(e.to_string()));
        }
    }
}

fn execute(
    context: &JobContext,
    request: &JobRequest,
    session: &SessionId,
    progress: &dyn ProgressObserver,
) -> MorphResult<JobResult> {
    let morph_video = request.out_dir.join(format!("{session}_morph.mp4"));
    let gradcam_video = request.out_dir.join(format!("{session}_gradcam.mp4"));

    let orchestrator = Orchestrator::new(
        context.resolver.as_ref(),
        context.detector.as_ref(),
        context.morph,
    );
    let mut morph_sink = context.sinks.create(&morph_video);
    let outcome = orchestrator.run(
        &MorphRequest {
            image_a: request.image_a.clone(),
            image_b: request.image_b.clone(),
            video_out: morph_video.clone(),
        },
        morph_sink.as_mut(),
        progress,
    )?;

    let aggregator = Aggregator::new(context.model.as_ref(), context.analysis);
    let mut overlay_sink = context.sinks.create(&gradcam_video);
    let analysis = aggregator.analyze(
        &outcome.frames,
        context.morph.fps,
        overlay_sink.as_mut(),
        progress,
    )?;

    Ok(JobResult {
        morph_video,
        gradcam_video,
        num_frames: outcome.frame_count,
        morph_type: outcome.mode,
        analysis,
    })
}

struct BoardProgress<'a> {
    board: &'a ProgressBoard,
    session: &'a str,
}

impl ProgressObserver for BoardProgress<'_> {
    fn report(&self, current: u64, total: u64, stage: Stage) {
        self.board
            .put(self.session, Snapshot::running(current, total, stage));
    }
}
