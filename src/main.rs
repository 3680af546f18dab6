use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use gesturecam::{open_source, GestureCamConfig, GestureRunner, SourceKind, StopReason};

#[derive(Parser, Debug)]
#[command(name = "gesturecam")]
#[command(about = "Arms up/down gesture detection from a fixed camera")]
#[command(version)]
#[command(long_about = "Detects a person standing in front of a fixed camera by subtracting \
an empty-scene background frame, splits the silhouette into arms and torso from a column \
intensity profile, and reports whether each arm is raised.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gesturecam.toml", help = "Path to TOML configuration file")]
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

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without processing frames")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - build the detector from the background frame and stop
    #[arg(long, help = "Capture the background and build the detector, then exit")]
    dry_run: bool,

    /// Read frames from a directory of images instead of the configured source
    #[arg(long, value_name = "DIR", conflicts_with = "synthetic")]
    input: Option<String>,

    /// Use the built-in synthetic figure as frame source
    #[arg(long)]
    synthetic: bool,

    /// Directory for annotated masks and detection records
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Stop after this many analyzed frames
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting gesturecam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match GestureCamConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, &args);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let source = open_source(&config.source).map_err(|e| {
        error!("Failed to open frame source: {}", e);
        e
    })?;

    let mut runner = GestureRunner::new(config, source).map_err(|e| {
        error!("Failed to create runner: {}", e);
        e
    })?;

    if args.dry_run {
        runner.initialize().map_err(|e| {
            error!("Failed to initialize detector: {}", e);
            e
        })?;
        info!("Dry run mode - detector built but no frames analyzed");
        println!("✓ Dry run completed successfully - detector initialized");
        return Ok(());
    }

    let reason = runner.run().map_err(|e| {
        error!("Detection stopped with an error: {}", e);
        e
    })?;

    let stats = runner.stats();
    info!(
        "Processed {} frames ({:.0}% moving), {} gestures recognized",
        stats.frames_processed,
        stats.motion_ratio() * 100.0,
        stats.gestures
    );

    if reason == StopReason::UserQuit {
        info!("Stopped by user");
    }

    Ok(())
}

fn apply_overrides(config: &mut GestureCamConfig, args: &Args) {
    if let Some(input) = &args.input {
        config.source.kind = SourceKind::Images;
        config.source.directory = Some(input.clone());
    }
    if args.synthetic {
        config.source.kind = SourceKind::Synthetic;
    }
    if let Some(output) = &args.output {
        config.output.directory = Some(output.clone());
    }
    if let Some(max_frames) = args.max_frames {
        config.runner.max_frames = Some(max_frames);
    }
}

fn init_logging(args: &Args) -> Result<()> {
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
        .unwrap_or_else(|_| EnvFilter::new(format!("gesturecam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# gesturecam configuration file");
    println!("# Every option with its default value");
    println!();
    println!("{}", GestureCamConfig::default().to_toml()?);
    Ok(())
}
