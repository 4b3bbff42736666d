use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use facemorph::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use facemorph::job::progress::{ProgressObserver, Stage};
use facemorph::morph::sequencer::{synthesize_frame, MorphPlan};
use facemorph::{
    FileImageSource, FrameSize, Fps, ImageSource, LandmarkDetector, MorphConfig, MorphRequest,
    NoLandmarks, Orchestrator, Point2, PointSet, StaticLandmarks,
};

#[derive(Parser, Debug)]
#[command(name = "facemorph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a full morph video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single morph frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// First source image path.
    #[arg(long)]
    image_a: PathBuf,

    /// Second source image path.
    #[arg(long)]
    image_b: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    geometry: GeometryArgs,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// First source image path.
    #[arg(long)]
    image_a: PathBuf,

    /// Second source image path.
    #[arg(long)]
    image_b: PathBuf,

    /// Interpolation parameter in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    t: f32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    geometry: GeometryArgs,
}

#[derive(Parser, Debug)]
struct GeometryArgs {
    /// Number of frames in the sequence.
    #[arg(long, default_value_t = 120)]
    frames: usize,

    /// Output frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Base frame width in pixels.
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Base frame height in pixels.
    #[arg(long, default_value_t = 320)]
    height: u32,

    /// Landmark JSON for image A ([[x, y], ...], detector output).
    #[arg(long)]
    landmarks_a: Option<PathBuf>,

    /// Landmark JSON for image B, same ordering as image A's.
    #[arg(long)]
    landmarks_b: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn config_of(geometry: &GeometryArgs) -> anyhow::Result<MorphConfig> {
    Ok(MorphConfig {
        size: FrameSize::new(geometry.width, geometry.height)?,
        total_frames: geometry.frames,
        fps: Fps::new(geometry.fps, 1)?,
    })
}

fn detector_of(geometry: &GeometryArgs) -> anyhow::Result<Box<dyn LandmarkDetector>> {
    match (&geometry.landmarks_a, &geometry.landmarks_b) {
        (Some(a), Some(b)) => Ok(Box::new(StaticLandmarks::new(vec![
            Some(read_landmarks(a)?),
            Some(read_landmarks(b)?),
        ]))),
        (None, None) => Ok(Box::new(NoLandmarks)),
        _ => anyhow::bail!("provide landmark files for both images or neither"),
    }
}

fn read_landmarks(path: &Path) -> anyhow::Result<PointSet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read landmarks '{}'", path.display()))?;
    let pairs: Vec<(f32, f32)> =
        serde_json::from_str(&raw).with_context(|| "parse landmark JSON")?;
    Ok(PointSet::new(
        pairs.into_iter().map(|(x, y)| Point2::new(x, y)).collect(),
    ))
}

/// Prints stage transitions and coarse morph progress to the terminal.
struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn report(&self, current: u64, total: u64, stage: Stage) {
        match stage {
            Stage::Morph if current % 20 == 0 || current == total => {
                println!("  morph frame {current}/{total}");
            }
            Stage::Loading if current == 0 => println!("  loading images..."),
            Stage::Detecting if current == 0 => println!("  detecting correspondence..."),
            Stage::Encoding if current == 0 => println!("  encoding video..."),
            _ => {}
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = config_of(&args.geometry)?;
    let detector = detector_of(&args.geometry)?;
    let resolver = FileImageSource;

    let orchestrator = Orchestrator::new(&resolver, detector.as_ref(), config);
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&args.out));
    let outcome = orchestrator.run(
        &MorphRequest {
            image_a: args.image_a.display().to_string(),
            image_b: args.image_b.display().to_string(),
            video_out: args.out.clone(),
        },
        &mut sink,
        &ConsoleProgress,
    )?;

    println!(
        "wrote {} ({} frames, mode {:?})",
        outcome.video_path.display(),
        outcome.frame_count,
        outcome.mode
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = config_of(&args.geometry)?;
    let detector = detector_of(&args.geometry)?;
    let resolver = FileImageSource;

    let frame_a = resolver.load(&args.image_a.display().to_string(), config.size)?;
    let frame_b = resolver.load(&args.image_b.display().to_string(), config.size)?;

    let plan = match (detector.detect(&frame_a), detector.detect(&frame_b)) {
        (Some(a), Some(b)) => {
            let points_a = a.with_boundary(config.size);
            let points_b = b.with_boundary(config.size);
            let averaged = PointSet::midpoint(&points_a, &points_b)?;
            let triangles = facemorph::geometry::delaunay(&averaged)?;
            MorphPlan::FaceWarp {
                points_a,
                points_b,
                triangles,
            }
        }
        _ => MorphPlan::SimpleBlend,
    };

    let frame = synthesize_frame(&frame_a, &frame_b, &plan, args.t.clamp(0.0, 1.0))?;
    let buffer = image::RgbImage::from_raw(frame.width, frame.height, frame.data)
        .ok_or_else(|| anyhow::anyhow!("frame buffer did not match its dimensions"))?;
    buffer
        .save(&args.out)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}
