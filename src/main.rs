//! Pan/tilt face tracker: keeps a servo-mounted camera pointed at a face.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use pan_tilt_tracker::{
    config::{Config, EXAMPLE_CONFIG},
    detection::{
        synthetic::{SyntheticSource, SyntheticTarget},
        FrameSource, ObjectDetector,
    },
    servo::{DryRunServo, MaestroServo, ServoBackend, ServoSink},
    supervisor::Tracker,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Haar cascade XML for face detection
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Track a synthetic face instead of using the camera
    #[arg(short, long)]
    simulate: bool,

    /// Servo output (dry-run, maestro)
    #[arg(long)]
    servo: Option<String>,

    /// Serial port of the servo controller
    #[arg(short, long)]
    port: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Pan/Tilt Tracker");

    let config = load_config(&args)?;
    config.validate().context("Invalid configuration")?;

    let sink: Box<dyn ServoSink> = match config.servo.backend {
        ServoBackend::DryRun => Box::new(DryRunServo::new()),
        ServoBackend::Maestro => Box::new(
            MaestroServo::open(&config.servo, config.pan.range(), config.tilt.range())
                .context("Failed to open servo controller")?,
        ),
    };

    if args.simulate {
        let source = SyntheticSource::new(config.camera.width, config.camera.height, Duration::from_millis(33));
        let target = SyntheticTarget::new(Duration::from_secs(12), 0.6, 0.15);
        return run(config, source, target, sink).await;
    }

    run_camera(config, sink).await
}

#[cfg(feature = "opencv")]
async fn run_camera(config: Config, sink: Box<dyn ServoSink>) -> Result<()> {
    use pan_tilt_tracker::detection::{camera::CameraSource, haar::HaarCascadeDetector};

    let detector = HaarCascadeDetector::new(&config.detection).context("Failed to load face detector")?;
    let source = CameraSource::open(&config.camera).context("Failed to open camera")?;
    run(config, source, detector, sink).await
}

#[cfg(not(feature = "opencv"))]
async fn run_camera(_config: Config, _sink: Box<dyn ServoSink>) -> Result<()> {
    bail!("Built without camera support; rebuild with `--features opencv` or pass --simulate")
}

/// Merge the optional config file with command line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(index) = args.cam {
        config.camera.index = index;
    }
    if let Some(cascade) = &args.cascade {
        config.detection.cascade = cascade.clone();
    }
    if let Some(servo) = &args.servo {
        config.servo.backend = match servo.as_str() {
            "dry-run" | "dry_run" | "none" => ServoBackend::DryRun,
            "maestro" => ServoBackend::Maestro,
            other => bail!("Unknown servo output: {other}"),
        };
    }
    if let Some(port) = &args.port {
        config.servo.port = port.clone();
    }

    Ok(config)
}

/// Start the workers, wait for SIGINT or SIGTERM, then shut down cleanly
async fn run<S, D>(config: Config, source: S, detector: D, sink: Box<dyn ServoSink>) -> Result<()>
where
    S: FrameSource + 'static,
    D: ObjectDetector<S::Frame> + 'static,
{
    let handle = Tracker::new(config, source, detector, sink)?.start()?;

    wait_for_signal().await;
    handle.request_shutdown();

    tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("Shutdown task failed")??;

    info!("Servos parked, exiting");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Interrupt received"),
                _ = terminate.recv() => info!("Termination signal received"),
            }
        }
        Err(e) => {
            warn!("Cannot listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("Interrupt received");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Interrupt received");
}
