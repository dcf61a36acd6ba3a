//! CLI binary for billsight.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, renders the session's progress, and prints results.

use anyhow::{Context, Result};
use billsight::{
    analyze, AnalysisConfig, AnalysisProgressCallback, BillRecord, CollageOutcome,
    ProgressCallback, VisualKind, VisualizationResult,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner for the extraction phase, then per-visual
/// log lines as the two image calls resolve in whatever order they finish.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> std::sync::Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        std::sync::Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, file_name: &str) {
        self.bar.set_prefix("Analyzing");
        self.bar.set_message(format!("{file_name} — looking for savings opportunities…"));
    }

    fn on_record_extracted(&self, record: &BillRecord) {
        self.bar.println(format!(
            "  {} Extracted account {}  {}",
            green("✓"),
            record.account_number,
            dim(&format!("({} statement)", record.bill_month)),
        ));
        self.bar.set_prefix("Visualizing");
        self.bar.set_message("persona + collage…");
    }

    fn on_analysis_error(&self, message: String) {
        self.bar.println(format!("  {} {}", red("✗"), red(&message)));
    }

    fn on_visual_ready(&self, kind: VisualKind) {
        self.bar.println(format!("  {} {kind} image ready", green("✓")));
    }

    fn on_visual_fallback(&self, kind: VisualKind) {
        self.bar.println(format!(
            "  {} {kind} unavailable — using reference photo",
            cyan("⚠")
        ));
    }

    fn on_visual_unavailable(&self, kind: VisualKind) {
        self.bar
            .println(format!("  {} {kind} image not produced", dim("·")));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a bill (prints the extracted record as JSON)
  billsight march-bill.pdf

  # Save the persona and collage images next to the record
  billsight march-bill.pdf -o out/

  # Collage over your own reference photo
  billsight --reference-image hero.jpg march-bill.pdf -o out/

  # Structured output for scripting
  billsight --json march-bill.pdf > analysis.json

  # Extraction only, no image generation
  billsight --no-visuals march-bill.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY             Gemini API key (required)
  BILLSIGHT_MODEL            Override the extraction model
  BILLSIGHT_IMAGE_MODEL      Override the image-generation model
  BILLSIGHT_REFERENCE_IMAGE  Default collage reference (URL or path)

SETUP:
  1. Get an API key:  https://ai.google.dev/
  2. Export it:       export GEMINI_API_KEY=AIza...
  3. Analyse:         billsight march-bill.pdf
"#;

/// Extract structured data and AI visualizations from a utility-bill PDF.
#[derive(Parser, Debug)]
#[command(
    name = "billsight",
    version,
    about = "Extract structured data and AI visualizations from utility-bill PDFs",
    long_about = "Upload a utility-bill PDF to Gemini and get back a validated structured \
record (amounts, account identifiers, year-over-year usage comparison) plus two generated \
visualizations: a persona illustration and an energy-saving-tip collage.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the bill PDF.
    input: PathBuf,

    /// Write visualization images (and record.json) into this directory.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Extraction model ID.
    #[arg(long, env = "BILLSIGHT_MODEL")]
    model: Option<String>,

    /// Image-generation model ID.
    #[arg(long, env = "BILLSIGHT_IMAGE_MODEL")]
    image_model: Option<String>,

    /// Reference photo for the collage: URL or local path.
    #[arg(long, env = "BILLSIGHT_REFERENCE_IMAGE")]
    reference_image: Option<String>,

    /// Skip the persona and collage image calls.
    #[arg(long)]
    no_visuals: bool,

    /// Output the full analysis (record, visuals, stats) as JSON.
    #[arg(long)]
    json: bool,

    /// Per-service-call timeout in seconds.
    #[arg(long, default_value_t = 60)]
    api_timeout: u64,

    /// Reference-image download timeout in seconds.
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,

    /// Extraction sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.1)]
    temperature: f32,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the record itself.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // progress lines carry everything the user needs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let mut builder = AnalysisConfig::builder()
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .fetch_timeout_secs(cli.fetch_timeout)
        .generate_visuals(!cli.no_visuals);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.extraction_model(model);
    }
    if let Some(ref model) = cli.image_model {
        builder = builder.image_model(model);
    }
    if let Some(ref reference) = cli.reference_image {
        builder = builder.reference_image(reference);
    }
    if let Some(ref cb) = progress {
        builder = builder.progress_callback(cb.clone() as ProgressCallback);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let result = analyze(&cli.input, &config).await;

    if let Some(ref cb) = progress {
        cb.finish();
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            std::process::exit(1);
        }
    };

    // ── Render results ───────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if !cli.quiet {
        print_summary(&output.record, &output.file_name);
    }

    // Raw-record inspection panel: the record itself, pretty-printed.
    let record_json =
        serde_json::to_string_pretty(&output.record).context("Failed to serialise record")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(record_json.as_bytes())
        .and_then(|_| handle.write_all(b"\n"))
        .context("Failed to write to stdout")?;
    drop(handle);

    // ── Save visuals (the download action) ───────────────────────────────
    if let Some(ref dir) = cli.output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        tokio::fs::write(dir.join("record.json"), &record_json)
            .await
            .context("Failed to write record.json")?;

        if let Some(ref persona) = output.persona {
            save_visual(dir, "persona", persona).await?;
        }
        match &output.collage {
            CollageOutcome::Generated { result } => {
                save_visual(dir, "collage", result).await?;
            }
            CollageOutcome::Fallback { reference } => {
                // No generated collage; keep the reference photo so the
                // caller still has something to show.
                let decoded = base64_decode(&reference.data)
                    .context("Reference image is not valid base64")?;
                let path = dir.join(&reference.file_name);
                tokio::fs::write(&path, decoded)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("   {} {}", dim("saved"), path.display());
            }
            CollageOutcome::Skipped => {}
        }

        if !cli.quiet {
            eprintln!(
                "{} results written to {}",
                green("✔"),
                bold(&dir.display().to_string())
            );
        }
    }

    if !cli.quiet {
        eprintln!(
            "   {}",
            dim(&format!(
                "extraction {}ms · visuals {}ms · total {}ms",
                output.stats.extraction_duration_ms,
                output.stats.visuals_duration_ms,
                output.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// Human summary card printed above the raw JSON.
fn print_summary(record: &BillRecord, file_name: &str) {
    eprintln!(
        "{} {}  {}",
        green("✔"),
        bold(file_name),
        dim(&format!("account {}", record.account_number)),
    );
    eprintln!("   {}", record.customer_name);
    eprintln!(
        "   Amount due {}  {}",
        bold(&format!("${:.2}", record.amount_due)),
        dim(&format!("by {}", record.due_date)),
    );
    eprintln!(
        "   Supply ${:.2} · Delivery ${:.2} · price to compare ${:.4}/kWh",
        record.supply_charges, record.delivery_charges, record.price_to_compare
    );

    let comparison = &record.monthly_comparison;
    if let Some(change) = comparison.usage_change_percent() {
        let arrow = if change < 0.0 { green("▼") } else { red("▲") };
        eprintln!(
            "   {} usage: {} kWh vs {} kWh in {}  {} {:+.1}%",
            comparison.month,
            comparison.usage_current,
            comparison.usage_previous,
            comparison.label_previous_year,
            arrow,
            change,
        );
    }

    eprintln!("   {} — {}", cyan(&record.persona_title), record.persona_description);
    eprintln!("   {} {}", dim("tip:"), record.energy_tip_sentence);
    eprintln!();
}

async fn save_visual(dir: &Path, stem: &str, visual: &VisualizationResult) -> Result<()> {
    let bytes = visual
        .decode()
        .with_context(|| format!("{stem} image is not valid base64"))?;
    let path = dir.join(format!("{stem}.{}", visual.extension()));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("   {} {}", dim("saved"), path.display());
    Ok(())
}

fn base64_decode(data: &str) -> Result<Vec<u8>> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    Ok(STANDARD.decode(data)?)
}
