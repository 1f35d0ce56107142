//! CLI for slide text extraction, AI-content detection, and deck modification.

mod workflow;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deck_core::{ContentRewriter, RgbColor, StyleConfig};
use deck_detector::{detect_presentation, modify_presentation, DetectorRegistry, ModifyOptions};
use deck_pptx::PptxReader;
use deck_server::Settings;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Detect AI-written slide content and rewrite or restyle PowerPoint decks.
#[derive(Parser, Debug)]
#[command(name = "deck-tool")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text of every slide
    Extract {
        /// Input .pptx file
        input: PathBuf,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Classify slides of a deck, or free text, as AI-generated or human
    Detect {
        /// Input .pptx file
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Text to classify instead of a file (repeatable)
        #[arg(short, long)]
        text: Vec<String>,

        /// Detector model (default: HF_MODEL_NAME)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Rewrite AI-detected slides and/or restyle all text
    Modify {
        /// Input .pptx file
        input: PathBuf,

        /// Output .pptx file
        #[arg(short, long)]
        output: PathBuf,

        /// Skip detection and rewriting
        #[arg(long)]
        no_replace: bool,

        /// Font applied to every run
        #[arg(long)]
        font: Option<String>,

        /// Font size in points applied to every run (8-72)
        #[arg(long)]
        size: Option<u32>,

        /// Text color as hex, e.g. "#1F2937"
        #[arg(long)]
        color: Option<String>,

        /// Minimum AI confidence for a slide to be rewritten
        #[arg(long, default_value = "0.7")]
        threshold: f64,

        /// Detector model (default: HF_MODEL_NAME)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Apply the rule-based rewriter to text
    Rewrite {
        text: String,

        /// Append a note that the text was simplified
        #[arg(long)]
        note: bool,
    },

    /// Generate an n8n workflow that calls the API
    Workflow {
        /// Base URL of the API
        #[arg(long, default_value = "http://localhost:8000")]
        api_url: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Confidence threshold written into "modify" nodes
        #[arg(long, default_value = "0.7")]
        confidence: f64,

        /// Workflow template to fill in; without one a simple
        /// detection-only workflow is generated
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Extract { input, json } => extract(&input, json),
        Command::Detect { input, text, model } => detect(input.as_deref(), &text, model.as_deref()),
        Command::Modify {
            input,
            output,
            no_replace,
            font,
            size,
            color,
            threshold,
            model,
        } => {
            let color = color
                .as_deref()
                .map(RgbColor::from_hex)
                .transpose()
                .context("Invalid --color")?;
            let options = ModifyOptions {
                replace_ai_content: !no_replace,
                confidence_threshold: threshold,
                model,
                style: StyleConfig::new(font, size, color)?,
            };
            modify(&input, &output, &options)
        }
        Command::Rewrite { text, note } => {
            let rewriter = ContentRewriter::new();
            if note {
                println!("{}", rewriter.rewrite_with_note(&text));
            } else {
                println!("{}", rewriter.rewrite(&text));
            }
            Ok(())
        }
        Command::Workflow {
            api_url,
            output,
            confidence,
            template,
        } => generate_workflow(&api_url, output.as_deref(), confidence, template.as_deref()),
    }
}

#[derive(Serialize)]
struct Extraction {
    file: String,
    info: deck_core::PresentationInfo,
    slides: Vec<deck_core::SlideText>,
}

fn extract(input: &Path, json: bool) -> Result<()> {
    let reader = PptxReader::new();
    let slides = reader
        .read_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let info = reader.info(input)?;

    if json {
        let extraction = Extraction {
            file: input.display().to_string(),
            info,
            slides,
        };
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    println!("{} ({} slides)", input.display(), info.total_slides);
    for slide in &slides {
        println!();
        println!("--- Slide {} ({} shapes) ---", slide.slide_number, slide.shape_count);
        if !slide.text.is_empty() {
            println!("{}", slide.text);
        }
    }
    Ok(())
}

fn registry() -> Result<DetectorRegistry> {
    let settings = Settings::load().context("Failed to load settings")?;
    Ok(settings.detector_registry())
}

fn detect(input: Option<&Path>, texts: &[String], model: Option<&str>) -> Result<()> {
    let detectors = registry()?;
    let detector = detectors.get(model).context("Failed to load detector")?;
    log::info!("Using detector model {}", detector.model_name());

    let output = match input {
        Some(path) => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown.pptx");
            serde_json::to_string_pretty(&detect_presentation(&detector, path, file_name)?)?
        }
        None => serde_json::to_string_pretty(&detector.detect_batch(texts)?)?,
    };

    println!("{}", output);
    Ok(())
}

fn modify(input: &Path, output: &Path, options: &ModifyOptions) -> Result<()> {
    if input == output {
        bail!("Output must differ from input: {}", input.display());
    }

    log::info!("Modifying {} -> {}", input.display(), output.display());
    let detectors = registry()?;
    let summary = modify_presentation(&detectors, &ContentRewriter::new(), input, output, options)
        .with_context(|| format!("Failed to modify {}", input.display()))?;

    eprintln!(
        "Rewrote {}/{} AI-detected slides, styled {} runs",
        summary.replacements_applied, summary.replacements_planned, summary.runs_styled
    );
    eprintln!("Written to: {}", output.display());
    Ok(())
}

fn generate_workflow(
    api_url: &str,
    output: Option<&Path>,
    confidence: f64,
    template: Option<&Path>,
) -> Result<()> {
    let workflow = match template {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let template = serde_json::from_str(&content)
                .with_context(|| format!("Invalid workflow JSON in {}", path.display()))?;
            workflow::apply_template(template, api_url, confidence)
        }
        None => workflow::simple_detection_workflow(api_url),
    };
    let json = serde_json::to_string_pretty(&workflow)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Workflow saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
