use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use invscan::orientation::{self, read_orientation_tag};
use invscan::render::RasterSurface;
use invscan::tools::{batch_limit_from_env, dataset_iter, dataset_root_from_env, expected_payload, luma_stats};
use invscan::utils::grayscale::rgba_to_luma;
use invscan::{CancelToken, OrientationStrategy, RawImage, ScanConfig, ScanError, ScanReport, Scanner};
use rayon::prelude::*;

const EXIT_MATCH: u8 = 0;
const EXIT_NO_CODE: u8 = 1;
const EXIT_INPUT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "invscan", version, about = "Decode inventory labels from photos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a single photo
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// JSON scan configuration (defaults to INVSCAN_* environment)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Write every attempted candidate frame as PNG into this directory
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Show orientation metadata and canonical dimensions
    Orientation {
        #[arg(long)]
        image: PathBuf,
    },
    /// Scan every photo under a directory in parallel
    Batch {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(invscan::debug::default_log_filter()),
    )
    .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Scan {
            image,
            config,
            json,
            dump,
        } => scan_cmd(&image, config.as_deref(), json, dump.as_deref()),
        Command::Orientation { image } => orientation_cmd(&image),
        Command::Batch {
            root,
            limit,
            config,
        } => batch_cmd(root, limit, config.as_deref()),
    };
    ExitCode::from(code)
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig, String> {
    let Some(path) = path else {
        return Ok(ScanConfig::from_env());
    };
    let json = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    ScanConfig::from_json_str(&json).map_err(|e| format!("{}: {e}", path.display()))
}

fn build_scanner(config: Option<&Path>) -> Result<Scanner, String> {
    let config = load_config(config)?;
    Scanner::new(config).map_err(|e| e.to_string())
}

fn scan_cmd(image: &Path, config: Option<&Path>, json: bool, dump: Option<&Path>) -> u8 {
    let scanner = match build_scanner(config) {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return EXIT_INPUT_ERROR;
        }
    };
    let raw = match RawImage::from_path(image) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", image.display());
            return EXIT_INPUT_ERROR;
        }
    };

    let report = match scanner.scan(&raw, &CancelToken::new()) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Failed to scan {}: {err}", image.display());
            return EXIT_INPUT_ERROR;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("Cannot serialize report: {err}"),
        }
    } else {
        print_report(image, &report);
    }

    if let Some(dir) = dump {
        if let Err(err) = dump_frames(&scanner, &raw, &report, dir) {
            eprintln!("Failed to dump frames: {err}");
        }
    }

    if report.outcome.is_match() {
        EXIT_MATCH
    } else {
        EXIT_NO_CODE
    }
}

fn print_report(image: &Path, report: &ScanReport) {
    println!(
        "Image: {} ({}x{}, orientation {} via {:?})",
        image.display(),
        report.canonical_width,
        report.canonical_height,
        report.orientation.tag(),
        report.orientation_source
    );
    println!(
        "Tried {} frame(s) in {:.1}ms",
        report.attempts.len(),
        report.elapsed.as_secs_f64() * 1000.0
    );
    match report.outcome.result() {
        Some(result) => println!(
            "Decoded via {} at {}: {}",
            result.engine, result.candidate, result.text
        ),
        None => println!("No code found ({:?}). Retake the photo closer, sharper or better lit.", report.outcome),
    }
}

fn dump_frames(
    scanner: &Scanner,
    raw: &RawImage,
    report: &ScanReport,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let canonical = orientation::normalize(raw, scanner.config().orientation)?;
    let options = scanner.config().render_options();
    let mut surface = RasterSurface::new();
    for (i, &key) in report.attempts.iter().enumerate() {
        let frame = surface.render(&canonical, key, &options)?;
        let Some(image) = frame.to_rgba_image() else {
            continue;
        };
        let path = dir.join(format!("{i:02}_{key}.png"));
        image.save(&path)?;
    }
    println!("Wrote {} frame(s) to {}", report.attempts.len(), dir.display());
    Ok(())
}

fn orientation_cmd(image: &Path) -> u8 {
    let raw = match RawImage::from_path(image) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", image.display());
            return EXIT_INPUT_ERROR;
        }
    };

    match read_orientation_tag(raw.bytes()) {
        Some(tag) => println!("JPEG EXIF orientation tag: {tag}"),
        None => println!("JPEG EXIF orientation tag: absent"),
    }

    for strategy in [OrientationStrategy::Native, OrientationStrategy::ExifOnly] {
        match orientation::normalize(&raw, strategy) {
            Ok(canonical) => {
                let (sw, sh) = canonical.stored_dimensions();
                let luma = rgba_to_luma(
                    canonical.image().as_raw(),
                    canonical.width() as usize,
                    canonical.height() as usize,
                );
                let stats = luma_stats(&luma);
                println!(
                    "{strategy:?}: orientation {} via {:?}, stored {sw}x{sh} -> canonical {}x{}, luma {}-{} avg {}",
                    canonical.orientation().tag(),
                    canonical.source(),
                    canonical.width(),
                    canonical.height(),
                    stats.min,
                    stats.max,
                    stats.avg
                );
            }
            Err(err) => {
                eprintln!("{strategy:?}: {err}");
                return EXIT_INPUT_ERROR;
            }
        }
    }
    EXIT_MATCH
}

struct BatchLine {
    path: PathBuf,
    outcome: Result<ScanReport, ScanError>,
    expected: Option<String>,
}

fn batch_cmd(root: Option<PathBuf>, limit: Option<usize>, config: Option<&Path>) -> u8 {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let limit = limit.or_else(batch_limit_from_env);
    if !root.exists() {
        eprintln!("Dataset root not found: {}", root.display());
        return EXIT_INPUT_ERROR;
    }
    let scanner = match build_scanner(config) {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return EXIT_INPUT_ERROR;
        }
    };

    let images: Vec<PathBuf> = dataset_iter(&root, limit).collect();
    if images.is_empty() {
        println!("No images found under {}", root.display());
        return EXIT_NO_CODE;
    }

    let start = Instant::now();
    let cancel = CancelToken::new();
    let lines: Vec<BatchLine> = images
        .par_iter()
        .map_init(RasterSurface::new, |surface, path| BatchLine {
            path: path.clone(),
            outcome: RawImage::from_path(path)
                .and_then(|raw| scanner.scan_with_surface(&raw, &cancel, surface)),
            expected: expected_payload(path),
        })
        .collect();
    let elapsed = start.elapsed();

    let mut matched = 0usize;
    let mut checked = 0usize;
    let mut correct = 0usize;
    for line in &lines {
        let shown = line.path.strip_prefix(&root).unwrap_or(line.path.as_path()).display();
        match &line.outcome {
            Ok(report) => {
                let text = report.text();
                if text.is_some() {
                    matched += 1;
                }
                if let Some(expected) = &line.expected {
                    checked += 1;
                    if text == Some(expected.as_str()) {
                        correct += 1;
                    }
                }
                match report.outcome.result() {
                    Some(result) => println!("  {shown}: {} ({})", result.text, result.engine),
                    None => println!("  {shown}: {:?}", report.outcome),
                }
            }
            Err(err) => println!("  {shown}: error: {err}"),
        }
    }

    let rate = matched as f64 / lines.len() as f64 * 100.0;
    println!(
        "\nMatched {matched}/{} ({rate:.1}%) in {:.2}s",
        lines.len(),
        elapsed.as_secs_f64()
    );
    if checked > 0 {
        println!("Payload accuracy: {correct}/{checked}");
    }
    EXIT_MATCH
}
