//! cam-access binary for listing cameras and opening a capture session.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use cam_access::config::Config;
use cam_access::device::{FourCC, V4l2Platform};
use cam_access::{get_cameras, CaptureSession, FacingMode, VideoTrack};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// List and open V4L2 cameras.
#[derive(Parser, Debug)]
#[command(name = "cam-access")]
#[command(version, about = "List and open V4L2 cameras", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available cameras
    List {
        /// Facing mode preference (environment or user)
        #[arg(long)]
        facing: Option<FacingMode>,
    },
    /// Open a camera and hold it until the timeout elapses or Ctrl-C
    Start {
        /// Device id as printed by `list` (default: first camera)
        #[arg(long)]
        device: Option<String>,

        /// Facing mode preference (environment or user)
        #[arg(long)]
        facing: Option<FacingMode>,

        /// Seconds to hold the session (default: until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Args::parse()).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load(args.config.as_deref())?;
    init_logging(&config.logging.level);

    let mut platform = V4l2Platform::new();
    if let Some(code) = &config.camera.pixel_format {
        platform = platform.with_fourcc(code.parse::<FourCC>()?);
    }

    match args.command {
        Command::List { facing } => {
            list(&platform, facing.unwrap_or(config.camera.facing_mode)).await
        }
        Command::Start {
            device,
            facing,
            seconds,
        } => {
            let device = device.or(config.camera.device);
            let facing_mode = facing.unwrap_or(config.camera.facing_mode);
            start(&platform, device.as_deref(), facing_mode, seconds).await
        }
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn list(platform: &V4l2Platform, facing_mode: FacingMode) -> Result<(), Box<dyn Error>> {
    let cameras = get_cameras(platform, facing_mode).await?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    for (index, camera) in cameras.iter().enumerate() {
        println!(
            "[{index}] {} ({})",
            camera.name().unwrap_or("<unnamed>"),
            camera.id()
        );
    }
    Ok(())
}

async fn start(
    platform: &V4l2Platform,
    device: Option<&str>,
    facing_mode: FacingMode,
    seconds: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let mut cameras = get_cameras(platform, facing_mode).await?;

    let index = match device {
        Some(id) => cameras
            .iter()
            .position(|camera| camera.id().as_str() == id)
            .ok_or_else(|| {
                format!("Camera '{id}' not found. Run 'list' to see available cameras")
            })?,
        None => 0,
    };
    let camera = cameras.get_mut(index).ok_or("No cameras found")?;

    let session = camera.start().await?;
    for track in session.video_tracks() {
        let settings = track.settings();
        println!(
            "Started {}: {}x{} {}",
            track.label(),
            settings.width,
            settings.height,
            track.fourcc()
        );
    }

    match seconds {
        Some(secs) => {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(secs)) => {}
                result = tokio::signal::ctrl_c() => result?,
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    camera.stop();
    println!("Stopped {}", camera.id());
    Ok(())
}
