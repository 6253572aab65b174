use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sleepgrid::{
    CompositorOpts, GridParams, LayoutParams, MonthPolicy, PosterOpts, SleepGridConfig,
    grid::artifact,
    ingest::timestamp::parse_date,
    pipeline::{self, RenderOutput, RenderParams, RunOpts},
};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "configs/huckleberry.yaml";
const DEFAULT_BUCKETS: &str = "local/buckets.csv";
const DEFAULT_IMAGE: &str = "local/heatmap.png";

#[derive(Parser, Debug)]
#[command(name = "sleepgrid", version, about = "Baby sleep, feeding and medication heatmaps")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an export and render the heatmap in one go.
    Run(RunArgs),
    /// Parse an export into the bucketed CSV.
    Parse(ParseArgs),
    /// Render a bucketed CSV.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Hour (0-23) at which each day column starts.
    #[arg(long, default_value_t = 7)]
    day_start_hour: u32,

    /// Bucket width in minutes; must divide 1440.
    #[arg(long, default_value_t = 5)]
    bucket_minutes: u32,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    /// First day of life, YYYY-MM-DD.
    #[arg(long, value_parser = parse_day_zero)]
    day_zero: NaiveDate,

    /// Day of month that starts a new month of age.
    #[arg(long, default_value_t = 1)]
    birthday_day: u32,

    /// Show at most this many months.
    #[arg(long, default_value_t = 24)]
    max_months: u32,

    /// Integer upscale of the output image.
    #[arg(long, default_value_t = 3)]
    scale: u32,

    /// Paint rows in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Also write section labels as JSON.
    #[arg(long)]
    labels_json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Tracker export CSV.
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long, default_value = DEFAULT_IMAGE)]
    out: PathBuf,

    /// Configuration file (YAML or JSON).
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Keep the bucketed CSV at this path.
    #[arg(long)]
    save_buckets: Option<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// Tracker export CSV.
    input: PathBuf,

    /// Output bucketed CSV.
    #[arg(short, long, default_value = DEFAULT_BUCKETS)]
    out: PathBuf,

    /// Configuration file (YAML or JSON).
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(flatten)]
    grid: GridArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Bucketed CSV written by `parse`.
    #[arg(default_value = DEFAULT_BUCKETS)]
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long, default_value = DEFAULT_IMAGE)]
    out: PathBuf,

    /// Configuration file (YAML or JSON).
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Hour (0-23) the bucketed CSV's days start at.
    #[arg(long, default_value_t = 7)]
    day_start_hour: u32,

    #[command(flatten)]
    layout: LayoutArgs,
}

fn parse_day_zero(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got '{s}'"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Parse(args) => cmd_parse(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn require_input(path: &Path, hint: &str) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("input file not found: {}\n{hint}", path.display());
    }
    Ok(())
}

fn render_params(layout: &LayoutArgs, day_start_hour: u32) -> anyhow::Result<RenderParams> {
    Ok(RenderParams {
        day_zero: layout.day_zero,
        policy: MonthPolicy::new(layout.birthday_day, layout.max_months)?,
        day_start_hour,
        layout: LayoutParams::default(),
        compositor: CompositorOpts {
            parallel: layout.parallel,
        },
    })
}

fn render_output(layout: &LayoutArgs, out: PathBuf) -> RenderOutput {
    RenderOutput {
        image: out,
        labels_json: layout.labels_json.clone(),
        poster: PosterOpts {
            scale: layout.scale,
            ..PosterOpts::default()
        },
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    require_input(
        &args.input,
        "To get started, export your tracker data as CSV and run: \
         sleepgrid run <export.csv> --day-zero YYYY-MM-DD",
    )?;
    let cfg = SleepGridConfig::load_or_default(Some(&args.config))?;

    let opts = RunOpts {
        input: args.input,
        bucket_minutes: args.grid.bucket_minutes,
        save_buckets: args.save_buckets,
        render: render_params(&args.layout, args.grid.day_start_hour)?,
        output: render_output(&args.layout, args.out),
    };
    let (parsed, heatmap) = pipeline::run(&cfg, &opts)?;

    eprintln!(
        "wrote {} ({} events, {} days shown)",
        opts.output.image.display(),
        parsed.report.events(),
        heatmap.layout.displayed_days()
    );
    if let Some(path) = &opts.save_buckets {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_parse(args: ParseArgs) -> anyhow::Result<()> {
    require_input(
        &args.input,
        "Put your export in local/ and run: sleepgrid parse local/<export.csv>",
    )?;
    let cfg = SleepGridConfig::load_or_default(Some(&args.config))?;
    let params = GridParams::new(args.grid.day_start_hour, args.grid.bucket_minutes)?;

    let parsed = pipeline::parse_events(&args.input, &cfg, params)?;
    artifact::save_csv(&parsed.outcome.grid, &args.out)
        .with_context(|| format!("save buckets '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} (day zero {})",
        args.out.display(),
        parsed.outcome.day_zero
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    require_input(&args.input, "First run: sleepgrid parse <export.csv>")?;
    let cfg = SleepGridConfig::load_or_default(Some(&args.config))?;

    let grid = artifact::load_csv(&args.input)?;
    let params = render_params(&args.layout, args.day_start_hour)?;
    let output = render_output(&args.layout, args.out);
    pipeline::render_to_files(&grid, &cfg.palette(), &params, &output)?;

    eprintln!("wrote {}", output.image.display());
    Ok(())
}
