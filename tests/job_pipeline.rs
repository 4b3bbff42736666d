//! Background job lifecycle over the public API: submit, poll, terminal
//! snapshot, result payload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use facemorph::analysis::{AttentionMap, Prediction};
use facemorph::encode::DiscardSinkFactory;
use facemorph::{
    AnalysisConfig, AttentionModel, FrameRgb, FrameSize, Fps, ImageSource, JobContext, JobManager,
    JobRequest, MorphConfig, MorphError, MorphMode, MorphResult, NoLandmarks, Point2, PointSet,
    PoolOpts, SessionId, Snapshot, Stage, StaticLandmarks,
};

struct TwoToneSource;

impl ImageSource for TwoToneSource {
    fn load(&self, reference: &str, size: FrameSize) -> MorphResult<FrameRgb> {
        let rgb = match reference {
            "a" => [200u8, 30, 30],
            "b" => [30u8, 30, 200],
            other => return Err(MorphError::load(format!("cannot resolve '{other}'"))),
        };
        let mut data = Vec::with_capacity(size.pixel_count() * 3);
        for _ in 0..size.pixel_count() {
            data.extend_from_slice(&rgb);
        }
        FrameRgb::from_raw(size, data)
    }
}

/// Predicts from the red channel so class changes track the blend.
struct RedThresholdModel;

impl AttentionModel for RedThresholdModel {
    fn classify(&self, frame: &FrameRgb) -> MorphResult<Prediction> {
        let red = frame.data[0];
        let (class_id, class_name) = if red >= 115 {
            (1, "warm")
        } else {
            (2, "cool")
        };
        Ok(Prediction {
            class_id,
            class_name: class_name.into(),
            confidence: 0.8,
        })
    }

    fn attention_map(&self, _frame: &FrameRgb, _class_id: usize) -> MorphResult<AttentionMap> {
        AttentionMap::new(4, 4, vec![0.5; 16])
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn manager_with(detector: Box<dyn facemorph::LandmarkDetector>, morph: MorphConfig) -> JobManager {
    init_tracing();
    JobManager::new(
        JobContext {
            resolver: Box::new(TwoToneSource),
            detector,
            model: Box::new(RedThresholdModel),
            sinks: Box::new(DiscardSinkFactory),
            morph,
            analysis: AnalysisConfig::default(),
        },
        PoolOpts::default(),
    )
}

fn wait_terminal(manager: &JobManager, session: &SessionId) -> Arc<Snapshot> {
    for _ in 0..3000 {
        if let Some(snapshot) = manager.poll(session) {
            if snapshot.stage.is_terminal() {
                return snapshot;
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("job did not reach a terminal snapshot in time");
}

fn request() -> JobRequest {
    JobRequest {
        image_a: "a".into(),
        image_b: "b".into(),
        out_dir: PathBuf::from("/tmp/facemorph-tests"),
    }
}

#[test]
fn default_scale_job_completes_with_five_detail_samples() {
    let manager = manager_with(Box::new(NoLandmarks), MorphConfig::default());
    let session = SessionId::generate();
    manager.submit(&session, request()).unwrap();

    let terminal = wait_terminal(&manager, &session);
    assert_eq!(terminal.stage, Stage::Complete);

    let result = terminal.result.as_ref().unwrap();
    assert_eq!(result.num_frames, 120);
    assert_eq!(result.morph_type, MorphMode::SimpleBlend);

    let indices: Vec<usize> = result
        .analysis
        .detailed_frames
        .iter()
        .map(|s| s.frame_index)
        .collect();
    assert_eq!(indices, vec![0, 30, 60, 89, 119]);

    let alphas: Vec<f32> = result
        .analysis
        .detailed_frames
        .iter()
        .map(|s| s.alpha)
        .collect();
    assert_eq!(alphas[0], 0.0);
    assert_eq!(alphas[4], 1.0);
    assert!(alphas.windows(2).all(|w| w[0] < w[1]));

    // The blend crosses the red threshold mid-sequence.
    assert_eq!(
        result.analysis.unique_classes,
        vec!["warm".to_string(), "cool".to_string()]
    );
    assert_eq!(result.analysis.num_class_changes, 2);

    let session_str = session.to_string();
    assert!(result
        .morph_video
        .to_string_lossy()
        .ends_with(&format!("{session_str}_morph.mp4")));
    assert!(result
        .gradcam_video
        .to_string_lossy()
        .ends_with(&format!("{session_str}_gradcam.mp4")));
}

#[test]
fn landmark_job_reports_face_warp_mode() {
    let landmarks = StaticLandmarks::repeating(PointSet::new(vec![
        Point2::new(8.0, 8.0),
        Point2::new(22.0, 10.0),
        Point2::new(15.0, 24.0),
    ]));
    let manager = manager_with(
        Box::new(landmarks),
        MorphConfig {
            size: FrameSize::new(32, 32).unwrap(),
            total_frames: 10,
            fps: Fps::new(30, 1).unwrap(),
        },
    );
    let session = SessionId::generate();
    manager.submit(&session, request()).unwrap();

    let terminal = wait_terminal(&manager, &session);
    assert_eq!(terminal.stage, Stage::Complete);
    let result = terminal.result.as_ref().unwrap();
    assert_eq!(result.morph_type, MorphMode::FaceLandmarkWarp);
    assert_eq!(result.num_frames, 10);
}

#[test]
fn unresolvable_reference_ends_in_error_naming_it() {
    let manager = manager_with(
        Box::new(NoLandmarks),
        MorphConfig {
            size: FrameSize::new(16, 16).unwrap(),
            total_frames: 4,
            fps: Fps::new(30, 1).unwrap(),
        },
    );
    let session = SessionId::generate();
    manager
        .submit(
            &session,
            JobRequest {
                image_a: "nope.png".into(),
                ..request()
            },
        )
        .unwrap();

    let terminal = wait_terminal(&manager, &session);
    assert_eq!(terminal.stage, Stage::Error);
    assert!(terminal.error.as_ref().unwrap().contains("nope.png"));
    assert!(terminal.result.is_none());
}

#[test]
fn polled_progress_never_regresses_across_snapshots() {
    let manager = manager_with(
        Box::new(NoLandmarks),
        MorphConfig {
            size: FrameSize::new(64, 64).unwrap(),
            total_frames: 40,
            fps: Fps::new(30, 1).unwrap(),
        },
    );
    let session = SessionId::generate();
    manager.submit(&session, request()).unwrap();

    let mut seen: Vec<(Stage, u64)> = Vec::new();
    for _ in 0..30_000 {
        let Some(snapshot) = manager.poll(&session) else {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        };
        if let Some(&(last_stage, last_current)) = seen.last() {
            if last_stage == snapshot.stage {
                assert!(
                    snapshot.current >= last_current,
                    "progress regressed within {:?}",
                    snapshot.stage
                );
            }
        }
        seen.push((snapshot.stage, snapshot.current));
        if snapshot.stage.is_terminal() {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(seen.last().unwrap().0, Stage::Complete);
}
