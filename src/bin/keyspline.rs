use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use keyspline::{BackendKind, CompileOptions, CompiledScene, Overrides, Scene};

#[derive(Parser, Debug)]
#[command(name = "keyspline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample scene channels across positions.
    Sample(SampleArgs),
    /// Print a summary of a scene document.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Number of evenly spaced samples across the range.
    #[arg(long, default_value_t = 11, conflicts_with = "at")]
    samples: usize,

    /// Explicit query positions (repeatable or comma-separated).
    #[arg(long = "at", value_delimiter = ',')]
    at: Vec<f64>,

    /// Sampling window `LO,HI` (defaults to the scene's declared range).
    #[arg(long, value_parser = parse_range)]
    range: Option<[f64; 2]>,

    /// Restrict output to one channel (qualified `spline.channel`).
    #[arg(long)]
    channel: Option<String>,

    /// Only emit channels the scene publishes, under their public names.
    #[arg(long, conflicts_with = "channel")]
    published: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write output to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Sample positions on the rayon thread pool.
    #[arg(long)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Csv,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Sample(args) => cmd_sample(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn parse_range(s: &str) -> Result<[f64; 2], String> {
    let (lo, hi) = s.split_once(',').ok_or_else(|| "expected LO,HI".to_owned())?;
    let lo: f64 = lo.trim().parse().map_err(|e| format!("bad LO: {e}"))?;
    let hi: f64 = hi.trim().parse().map_err(|e| format!("bad HI: {e}"))?;
    if lo >= hi {
        return Err("LO must be less than HI".to_owned());
    }
    Ok([lo, hi])
}

fn load_scene(path: &Path, parallel: bool) -> anyhow::Result<CompiledScene> {
    let scene =
        Scene::from_path(path).with_context(|| format!("load scene '{}'", path.display()))?;
    let options = CompileOptions {
        backend: if parallel { BackendKind::Parallel } else { BackendKind::Scalar },
        ..Default::default()
    };
    let compiled = scene
        .compile(options)
        .with_context(|| format!("compile scene '{}'", path.display()))?;
    Ok(compiled)
}

fn sample_positions(args: &SampleArgs, scene: &CompiledScene) -> anyhow::Result<Vec<f64>> {
    if !args.at.is_empty() {
        return Ok(args.at.clone());
    }
    anyhow::ensure!(args.samples >= 1, "--samples must be at least 1");
    let [lo, hi] = args.range.unwrap_or_else(|| scene.range());
    if args.samples == 1 {
        return Ok(vec![lo]);
    }
    let step = (hi - lo) / (args.samples - 1) as f64;
    Ok((0..args.samples).map(|i| lo + step * i as f64).collect())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.in_path, args.parallel)?;
    let positions = sample_positions(&args, &scene)?;

    // One column per emitted channel, one row per position.
    let (columns, rows) = if let Some(channel) = &args.channel {
        let values = scene.sample_bulk(channel, &positions)?;
        (vec![channel.clone()], values.into_iter().map(|v| vec![v]).collect())
    } else if args.published {
        collect_rows(&positions, |p| scene.published_at(p))?
    } else {
        let overrides = Overrides::new();
        collect_rows(&positions, |p| scene.query_all(p, &overrides))?
    };

    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(path)
                .with_context(|| format!("create output '{}'", path.display()))?;
            let mut w = BufWriter::new(f);
            render(args.format, &mut w, &positions, &columns, &rows)?;
            w.flush()?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            render(args.format, &mut w, &positions, &columns, &rows)?;
        }
    }
    Ok(())
}

fn collect_rows(
    positions: &[f64],
    mut eval: impl FnMut(f64) -> keyspline::KeysplineResult<BTreeMap<String, f64>>,
) -> anyhow::Result<(Vec<String>, Vec<Vec<f64>>)> {
    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(positions.len());
    for &p in positions {
        let map = eval(p)?;
        if columns.is_empty() {
            columns = map.keys().cloned().collect();
        }
        rows.push(map.into_values().collect());
    }
    Ok((columns, rows))
}

fn render(
    format: Format,
    w: &mut impl Write,
    positions: &[f64],
    columns: &[String],
    rows: &[Vec<f64>],
) -> anyhow::Result<()> {
    match format {
        Format::Text => {
            for (p, row) in positions.iter().zip(rows) {
                write!(w, "{p}")?;
                for (name, value) in columns.iter().zip(row) {
                    write!(w, "  {name}={value}")?;
                }
                writeln!(w)?;
            }
        }
        Format::Csv => {
            write!(w, "position")?;
            for name in columns {
                write!(w, ",{name}")?;
            }
            writeln!(w)?;
            for (p, row) in positions.iter().zip(rows) {
                write!(w, "{p}")?;
                for value in row {
                    write!(w, ",{value}")?;
                }
                writeln!(w)?;
            }
        }
        Format::Json => {
            let mut channels = BTreeMap::new();
            for (i, name) in columns.iter().enumerate() {
                let series: Vec<f64> = rows.iter().map(|r| r[i]).collect();
                channels.insert(name.clone(), series);
            }
            let doc = serde_json::json!({
                "positions": positions,
                "channels": channels,
            });
            serde_json::to_writer_pretty(&mut *w, &doc)?;
            writeln!(w)?;
        }
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.in_path, false)?;

    println!("name:      {}", scene.name().unwrap_or("(unnamed)"));
    if let Some(version) = scene.version() {
        println!("version:   {version}");
    }
    let [lo, hi] = scene.range();
    println!("range:     [{lo}, {hi}]");
    println!("seed:      {}", scene.seed());

    let variables: Vec<&str> = scene.variable_names().collect();
    if !variables.is_empty() {
        println!("variables: {}", variables.join(", "));
    }

    println!("channels:");
    for ch in scene.channels() {
        println!("  {}  [{}]  {} keyframe(s)", ch.name, ch.algorithm, ch.keyframes);
    }

    let published: Vec<&str> = scene.published_names().collect();
    if !published.is_empty() {
        println!("published: {}", published.join(", "));
    }
    Ok(())
}
