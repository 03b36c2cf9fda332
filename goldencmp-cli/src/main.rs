use clap::Parser;
use goldencmp::{
    BatchReport, CompareConfig, Comparer, ComparisonResult, ComparisonType, Policy,
    DEFAULT_OUTPUT_DIR,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

/// Exit code for errors that stop the run before any comparison.
const EXIT_SETUP_ERROR: u8 = 255;
/// Failure counts above this value are reported as this value.
const MAX_FAILURE_EXIT: usize = 250;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compare rendered images against golden references",
    after_help = "Examples:\n  goldencmp-cli rendered.png golden.png\n  goldencmp-cli rendered.png golden.png --type web_vs_desktop\n  goldencmp-cli --batch renders/ goldens/ --output results/"
)]
struct Cli {
    /// Path to the rendered image.
    rendered: Option<PathBuf>,
    /// Path to the golden reference image.
    golden: Option<PathBuf>,
    /// Comparison type: desktop or web_vs_desktop [default: desktop].
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_comparison_type)]
    comparison_type: Option<ComparisonType>,
    /// Output directory for artifacts [default: comparison_output].
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Batch compare two directories, pairing files by name.
    #[arg(
        long,
        num_args = 2,
        value_names = ["RENDERED_DIR", "GOLDEN_DIR"],
        conflicts_with_all = ["rendered", "golden"]
    )]
    batch: Option<Vec<PathBuf>>,
    /// Save results to a JSON file.
    #[arg(long, value_name = "FILE")]
    json_output: Option<PathBuf>,
    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
    /// Optional JSON configuration file; command-line flags take precedence.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Compare batch pairs in parallel.
    #[arg(long)]
    parallel: bool,
    /// Print the JSON schema of the configuration file and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example configuration file and exit.
    #[arg(long)]
    print_example: bool,
    /// Report span timings for profiling.
    #[arg(long)]
    trace: bool,
}

fn parse_comparison_type(value: &str) -> Result<ComparisonType, String> {
    value.parse()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PolicyOverride {
    ssim_min: Option<f64>,
    max_channel_diff: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    comparison_type: Option<ComparisonType>,
    output_dir: Option<PathBuf>,
    json_output: Option<PathBuf>,
    parallel: bool,
    policy: PolicyOverride,
}

/// Effective settings after merging the config file and command line.
#[derive(Debug)]
struct Settings {
    compare: CompareConfig,
    json_output: Option<PathBuf>,
}

fn resolve_settings(cli: &Cli, file: FileConfig) -> Result<Settings, String> {
    let comparison_type = cli
        .comparison_type
        .or(file.comparison_type)
        .unwrap_or_default();
    let builtin = comparison_type.policy();
    let ssim_min = file.policy.ssim_min.unwrap_or(builtin.ssim_min());
    if !(0.0..=1.0).contains(&ssim_min) {
        return Err(format!("policy.ssim_min must be within [0, 1], got {ssim_min}"));
    }
    let max_channel_diff = file.policy.max_channel_diff.or(builtin.max_channel_diff());

    let output_dir = cli
        .output
        .clone()
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    Ok(Settings {
        compare: CompareConfig {
            policy: Policy::new(comparison_type, ssim_min, max_channel_diff),
            output_dir,
            parallel: cli.parallel || file.parallel,
        },
        json_output: cli.json_output.clone().or(file.json_output),
    })
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(FileConfig::default()),
    }
}

fn init_tracing(verbose: bool, trace: bool) -> Result<(), Box<dyn std::error::Error>> {
    let directive = if verbose || trace {
        "goldencmp=info"
    } else {
        "goldencmp=warn"
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_target(false)
        .with_writer(std::io::stderr);
    let builder = if trace {
        builder.with_span_events(FmtSpan::CLOSE)
    } else {
        builder
    };
    builder.init();
    Ok(())
}

fn failure_exit_code(failed: usize) -> u8 {
    failed.min(MAX_FAILURE_EXIT) as u8
}

fn status_label(result: &ComparisonResult) -> &'static str {
    if result.passed() {
        "PASS"
    } else {
        "FAIL"
    }
}

fn print_batch_result(result: &ComparisonResult, verbose: bool) {
    let metrics = result.metrics();
    println!("Comparing: {}", result.filename());
    println!(
        "  {} - SSIM: {:.6}, Max Δ: {}, Threshold: {}",
        status_label(result),
        metrics.ssim,
        metrics.max_channel_diff,
        result.threshold_used()
    );
    if let Some(err) = result.error() {
        println!("    Error: {err}");
    }
    if verbose && !result.passed() {
        println!("    MSE: {:.2}", metrics.mse);
        println!("    RMSE (norm): {:.6}", metrics.rmse_normalized);
        if let Some(paths) = result.artifact_paths() {
            println!("    Diff: {}", paths.diff.display());
            println!("    Heatmap: {}", paths.heatmap.display());
        }
    }
}

fn print_single_result(result: &ComparisonResult, verbose: bool) {
    let metrics = result.metrics();
    println!("{}", status_label(result));
    if let Some(err) = result.error() {
        println!("Error: {err}");
    }
    println!("SSIM: {:.6}", metrics.ssim);
    println!("Max Channel Diff: {}", metrics.max_channel_diff);
    println!("Threshold: {}", result.threshold_used());
    if verbose {
        println!("MSE: {:.2}", metrics.mse);
        println!("RMSE (normalized): {:.6}", metrics.rmse_normalized);
    }
    if let Some(paths) = result.artifact_paths() {
        println!("Diff image: {}", paths.diff.display());
        println!("Heatmap: {}", paths.heatmap.display());
    }
}

fn run(cli: &Cli) -> Result<u8, Box<dyn std::error::Error>> {
    let file = load_file_config(cli.config.as_deref())?;
    let settings = resolve_settings(cli, file)?;
    let comparer = Comparer::default().with_config(settings.compare);

    let report = match (&cli.batch, &cli.rendered, &cli.golden) {
        (Some(dirs), _, _) => {
            let (rendered_dir, golden_dir) = match dirs.as_slice() {
                [rendered_dir, golden_dir] => (rendered_dir, golden_dir),
                _ => return Err("--batch expects RENDERED_DIR and GOLDEN_DIR".into()),
            };
            let report = comparer.compare_batch(rendered_dir, golden_dir)?;
            for result in report.results() {
                print_batch_result(result, cli.verbose);
            }
            println!(
                "\nSummary: {}/{} comparisons passed",
                report.passed(),
                report.total()
            );
            if let Some(rate) = report.pass_rate() {
                println!("Pass rate: {:.1}%", rate * 100.0);
            }
            report
        }
        (None, Some(rendered), Some(golden)) => {
            println!("Comparing {} vs {}", rendered.display(), golden.display());
            let result = comparer.compare(rendered, golden);
            print_single_result(&result, cli.verbose);
            BatchReport::single(result)
        }
        _ => return Err("must provide either an image pair or --batch directories".into()),
    };

    if let Some(path) = &settings.json_output {
        report.write_json(path)?;
        println!("Results saved to: {}", path.display());
    }

    tracing::info!(
        total = report.total(),
        failed = report.failed(),
        skipped = report.skipped().len(),
        "run complete"
    );
    Ok(failure_exit_code(report.failed()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return ExitCode::SUCCESS;
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return ExitCode::SUCCESS;
    }

    if let Err(err) = init_tracing(cli.verbose, cli.trace) {
        eprintln!("Error: {err}");
        return ExitCode::from(EXIT_SETUP_ERROR);
    }

    ExitCode::from(exit_code(run(&cli)))
}

/// Maps the outcome of `run` to the process exit code, reporting setup errors.
fn exit_code(outcome: Result<u8, Box<dyn std::error::Error>>) -> u8 {
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            EXIT_SETUP_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        exit_code, failure_exit_code, resolve_settings, run, Cli, FileConfig, EXAMPLE_JSON,
        EXIT_SETUP_ERROR,
    };
    use clap::Parser;
    use goldencmp::ComparisonType;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn write_pattern(path: &Path, invert: bool) {
        let img = image::RgbImage::from_fn(16, 16, |x, y| {
            let v = (((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8;
            let v = if invert { 255 - v } else { v };
            image::Rgb([v, v.wrapping_add(64), v.wrapping_add(128)])
        });
        img.save(path).unwrap();
    }

    fn arg(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn failure_count_saturates() {
        assert_eq!(failure_exit_code(0), 0);
        assert_eq!(failure_exit_code(3), 3);
        assert_eq!(failure_exit_code(10_000), 250);
    }

    #[test]
    fn example_config_parses() {
        let file: FileConfig = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert_eq!(file.comparison_type, Some(ComparisonType::Desktop));
        assert!(file.parallel);
    }

    #[test]
    fn command_line_overrides_config_file() {
        let cli = Cli::parse_from([
            "goldencmp-cli",
            "a.png",
            "b.png",
            "--type",
            "web_vs_desktop",
            "--output",
            "cli_out",
        ]);
        let file: FileConfig = serde_json::from_str(
            r#"{"comparison_type": "desktop", "output_dir": "file_out", "policy": {"ssim_min": 0.98}}"#,
        )
        .unwrap();
        let settings = resolve_settings(&cli, file).unwrap();
        let policy = settings.compare.policy;
        assert_eq!(policy.kind(), ComparisonType::WebVsDesktop);
        assert_eq!(policy.ssim_min(), 0.98);
        assert_eq!(policy.max_channel_diff(), None);
        assert_eq!(settings.compare.output_dir, PathBuf::from("cli_out"));
    }

    #[test]
    fn defaults_match_desktop_policy() {
        let cli = Cli::parse_from(["goldencmp-cli", "--batch", "renders", "goldens"]);
        let settings = resolve_settings(&cli, FileConfig::default()).unwrap();
        assert_eq!(settings.compare.policy, ComparisonType::Desktop.policy());
        assert_eq!(settings.compare.output_dir, PathBuf::from("comparison_output"));
        assert!(settings.json_output.is_none());
    }

    #[test]
    fn rejects_out_of_range_ssim_override() {
        let cli = Cli::parse_from(["goldencmp-cli", "a.png", "b.png"]);
        let file: FileConfig = serde_json::from_str(r#"{"policy": {"ssim_min": 1.5}}"#).unwrap();
        assert!(resolve_settings(&cli, file).is_err());
    }

    #[test]
    fn missing_batch_directory_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let golden = dir.path().join("goldens");
        fs::create_dir_all(&golden).unwrap();
        let out = dir.path().join("out");

        let cli = Cli::parse_from([
            "goldencmp-cli",
            "--batch",
            arg(&missing),
            arg(&golden),
            "--output",
            arg(&out),
        ]);
        let outcome = run(&cli);
        assert!(outcome.is_err());
        assert_eq!(exit_code(outcome), EXIT_SETUP_ERROR);
        assert_eq!(EXIT_SETUP_ERROR, 255);
    }

    #[test]
    fn batch_exit_code_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let rendered = dir.path().join("renders");
        let golden = dir.path().join("goldens");
        fs::create_dir_all(&rendered).unwrap();
        fs::create_dir_all(&golden).unwrap();
        write_pattern(&rendered.join("same.png"), false);
        write_pattern(&golden.join("same.png"), false);
        write_pattern(&rendered.join("broken.png"), true);
        write_pattern(&golden.join("broken.png"), false);
        write_pattern(&rendered.join("extra.png"), true);

        let out = dir.path().join("out");
        let json = dir.path().join("report.json");
        let cli = Cli::parse_from([
            "goldencmp-cli",
            "--batch",
            arg(&rendered),
            arg(&golden),
            "--output",
            arg(&out),
            "--json-output",
            arg(&json),
        ]);
        let outcome = run(&cli);
        assert_eq!(outcome.as_ref().ok(), Some(&1));
        assert_eq!(exit_code(outcome), 1);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(report["total_comparisons"], 2);
        assert_eq!(report["passed_comparisons"], 1);
        assert!(out.is_dir());
    }

    #[test]
    fn passing_single_pair_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write_pattern(&path, false);
        let out = dir.path().join("out");

        let cli = Cli::parse_from([
            "goldencmp-cli",
            arg(&path),
            arg(&path),
            "--output",
            arg(&out),
        ]);
        assert_eq!(exit_code(run(&cli)), 0);
        assert!(!out.exists());
    }
}
