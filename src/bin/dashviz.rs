use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dashviz::{
    ChartKind, Client, Config, Dashboard, FetchEvent, FileSource, FilterField, FilterState,
    Query, Source,
};
use dashviz::{stats, storage, viz};
use log::info;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    name = "dashviz",
    version,
    about = "Query the dashboard backend and render bar, line or scatter charts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate filters and print the request URL without fetching.
    Query(QueryArgs),
    /// Fetch (or read) data, render the chart to SVG, optionally export and summarize.
    Render(RenderArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Bar,
    Line,
    Scatter,
}

impl From<KindArg> for ChartKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Bar => ChartKind::Bar,
            KindArg::Line => ChartKind::Line,
            KindArg::Scatter => ChartKind::Scatter,
        }
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Chart kind.
    #[arg(short, long, value_enum)]
    kind: KindArg,
    /// Lower bound (intensity for bar, relevance for scatter).
    #[arg(long, allow_hyphen_values = true)]
    min: Option<String>,
    /// Upper bound (intensity for bar, relevance for scatter).
    #[arg(long, allow_hyphen_values = true)]
    max: Option<String>,
    /// Start year (line).
    #[arg(long)]
    start: Option<String>,
    /// Request the whole collection and skip filter validation.
    #[arg(long, default_value_t = false)]
    unfiltered: bool,
    /// Backend root URL (overrides config and environment).
    #[arg(long)]
    base_url: Option<String>,
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// Read records from a JSON array file instead of the backend.
    #[arg(long)]
    input: Option<PathBuf>,
    /// SVG output path.
    #[arg(long)]
    out: PathBuf,
    /// Export plot points (.csv or .json).
    #[arg(long)]
    data_out: Option<PathBuf>,
    /// Print summary statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn load_config(args: &FilterArgs) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    Ok(config)
}

fn apply_filters(state: &mut FilterState, args: &FilterArgs) {
    let kind = ChartKind::from(args.kind);
    let (min, max) = match kind {
        ChartKind::Scatter => (FilterField::MinRelevance, FilterField::MaxRelevance),
        _ => (FilterField::MinIntensity, FilterField::MaxIntensity),
    };
    if let Some(v) = &args.min {
        state.set(min, v.as_str());
    }
    if let Some(v) = &args.max {
        state.set(max, v.as_str());
    }
    if let Some(v) = &args.start {
        state.set(FilterField::StartYear, v.as_str());
    }
}

fn build_query(args: &FilterArgs) -> Result<Query> {
    let kind = ChartKind::from(args.kind);
    if args.unfiltered {
        return Ok(Query::unfiltered(kind));
    }
    let mut state = FilterState::new();
    apply_filters(&mut state, args);
    Ok(state.commit(kind)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Query(args) => cmd_query(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_query(args: QueryArgs) -> Result<()> {
    let config = load_config(&args.filters)?;
    let query = build_query(&args.filters)?;
    println!("{}", query.url(&config.base_url));
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let config = load_config(&args.filters)?;
    match args.input.clone() {
        Some(path) => run_render(FileSource::new(path), &config, &args),
        None => run_render(Client::from_config(&config), &config, &args),
    }
}

fn run_render<S: Source>(source: S, config: &Config, args: &RenderArgs) -> Result<()> {
    let kind = ChartKind::from(args.filters.kind);
    let query = build_query(&args.filters)?;
    info!("requesting {}", query.url(&config.base_url));

    let mut dash = Dashboard::new(source, config);
    dash.select(Some(kind));
    apply_filters(dash.filters_mut(), &args.filters);
    dash.request(query, Instant::now());

    // Room for the debounce window plus every retry of a slow request.
    let budget = config.debounce() + Duration::from_secs(config.timeout_secs.max(1) * 4);
    let events = dash.run_until_idle(budget);
    for ev in events {
        if let FetchEvent::Failed { error, .. } = ev {
            bail!(error);
        }
    }
    if dash.cache().revision(kind) == 0 {
        bail!("{kind}: no data received");
    }

    viz::save_svg(dash.surface(), &args.out)?;
    eprintln!(
        "Wrote {} chart ({} marks) to {}",
        kind,
        dash.surface().mark_count(),
        args.out.display()
    );

    let Some(chart) = dash.current_chart() else {
        return Ok(());
    };

    if let Some(path) = args.data_out.as_ref() {
        let fmt = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(chart.points(), path)?,
            "json" => storage::save_json(chart.points(), path)?,
            other => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", chart.points().len(), path.display());
    }

    if args.stats {
        for s in stats::summarize(chart.points()) {
            println!(
                "{} • {}  count={} missing={}  min={} max={} mean={} median={}",
                kind,
                s.dimension,
                s.count,
                s.missing,
                fmt_opt(s.min),
                fmt_opt(s.max),
                fmt_opt(s.mean),
                fmt_opt(s.median)
            );
        }
    }
    Ok(())
}
