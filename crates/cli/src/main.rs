use hairpiece_core::{
    ads,
    config::Config,
    init,
    GeneratedImage,
    Hairpiece,
    LoadingState,
};
use anyhow::{Context, Result};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hairstyle to try on, e.g. "short platinum bob"
    #[arg(trailing_var_arg = true)]
    description: Vec<String>,

    /// Photo to edit
    #[arg(short, long)]
    photo: PathBuf,

    /// Override the model defined in .env
    #[arg(short, long)]
    model: Option<String>,

    /// Where to write the edited photo (default: next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON summary instead of plain text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    let args = Args::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose {
            "hairpiece=debug,hairpiece_core=debug"
        } else {
            "hairpiece=info,hairpiece_core=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    // Load config and override model if specified via CLI
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(m) = args.model {
        config.model_name = m;
    }
    let model_name = config.model_name.clone();

    // If the description was empty, ask now
    let mut description = args.description.join(" ");
    if description.trim().is_empty() {
        print!("Describe your hairstyle: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        description = input.trim().to_string();
    }

    let app = Hairpiece::with_config(config).context("Failed to initialize Hairpiece")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.magenta} {msg}")?
    );
    spinner.set_message(status_line(app.loading_state(), &model_name));
    spinner.enable_steady_tick(Duration::from_millis(100));

    // Keep the spinner text in sync with the overlay state
    let mut state = app.subscribe();
    let watcher = spinner.clone();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow_and_update();
            watcher.set_message(status_line(current, &model_name));
        }
    });

    // Enter skips the placeholder. A plain thread, so a pending read never
    // holds up runtime shutdown.
    std::thread::spawn(|| {
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_ok() {
            ads::skip_placeholder();
        }
    });

    debug!(photo = %args.photo.display(), "Starting generation");
    let result = app.generate(&args.photo, &description).await;
    spinner.finish_and_clear();

    let report = result.context("Hairstyle generation failed")?;
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.photo, &report.image));
    report
        .image
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    debug!(output = %output.display(), gate = ?report.gate, "Edited photo written");
    if args.json {
        println!("{}", report.summary_json(output.to_str())?);
    } else {
        println!("Saved your new look to {}", output.display());
    }

    Ok(())
}

fn status_line(state: LoadingState, model_name: &str) -> String {
    if state.showing_ad {
        "Please wait... (press Enter to skip)".to_string()
    } else {
        format!("Generating with {}...", model_name)
    }
}

/// `photos/me.jpg` -> `photos/me-hairpiece.png`
fn default_output_path(photo: &Path, image: &GeneratedImage) -> PathBuf {
    let stem = photo
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    photo.with_file_name(format!("{}-hairpiece.{}", stem, image.extension()))
}
