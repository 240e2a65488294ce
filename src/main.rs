use anyhow::Result;
use clap::Parser;
use pinchvol::app::{ControlContext, ControlLoop};
use pinchvol::camera::opener_for;
use pinchvol::detector::provider_for;
use pinchvol::display::display_for;
use pinchvol::sink::sink_for;
use pinchvol::{OutOfRangePolicy, PinchvolConfig};
use std::io::IsTerminal;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "pinchvol")]
#[command(about = "Control system volume by pinching thumb and index finger in front of a camera")]
#[command(version)]
#[command(long_about = "Reads camera frames, obtains hand landmarks from an external pose \
estimator, measures the distance between thumb tip and index tip and maps it onto the \
volume range of an audio endpoint. Press q or Esc to quit.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pinchvol.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the loop")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", help = "Write logs to a file in addition to stderr")]
    log_file: Option<String>,

    /// Stop after this many iterations
    #[arg(long, value_name = "N", help = "Stop after N loop iterations")]
    frames: Option<u64>,

    /// Override the out-of-range policy
    #[arg(long, value_name = "POLICY", help = "Out-of-range policy: clamp or reject")]
    policy: Option<OutOfRangePolicy>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", PinchvolConfig::default().to_toml()?);
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting pinchvol v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match PinchvolConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("✗ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(frames) = args.frames {
        config.control.max_iterations = Some(frames);
    }
    if let Some(policy) = args.policy {
        config.mapping.policy = policy;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let exit_code = match run(&config).await {
        Ok(code) => code,
        Err(e) => {
            error!("pinchvol failed to start: {}", e);
            1
        }
    };

    info!("pinchvol exited with code: {}", exit_code);
    drop(log_guard);
    std::process::exit(exit_code);
}

/// Build the collaborators and drive the control loop to completion
async fn run(config: &PinchvolConfig) -> pinchvol::Result<i32> {
    let opener = opener_for(&config.camera)?;
    let sink = sink_for(&config.sink)?;
    let provider = provider_for(&config.detector)?;
    let display = display_for(&config.display);

    let context = ControlContext {
        opener,
        provider,
        sink,
        display,
    };

    let mut control = ControlLoop::new(config, context)?;
    control.set_keyboard_enabled(config.control.keyboard && std::io::stdin().is_terminal());
    control.run().await
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pinchvol={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}
