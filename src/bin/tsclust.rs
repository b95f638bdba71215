//! tsclust - Time-Series Clustering Explorer CLI
//!
//! Command-line interface for querying a clustering database.

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use tsclust::config::SessionConfig;
use tsclust::diversity::diversity_rank;
use tsclust::error::{Result, TsclustError};
use tsclust::export::{write_matrix, Delimiter};
use tsclust::normalize::View;
use tsclust::progress::Progress;
use tsclust::session::{RowFilter, Session};
use tsclust::synthetic::{generate_synthetic, SyntheticConfig};

/// CLI-friendly normalisation enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliView {
    /// Abundances as stored
    Raw,
    /// Divided by dataset-wide sample totals
    ByColumn,
    /// Each series scaled to sum to one
    ByRow,
    /// By-column, then by-row
    Double,
}

impl From<CliView> for View {
    fn from(view: CliView) -> Self {
        match view {
            CliView::Raw => View::Raw,
            CliView::ByColumn => View::ByColumn,
            CliView::ByRow => View::ByRow,
            CliView::Double => View::Double,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Time-Series Clustering Explorer
#[derive(Parser)]
#[command(name = "tsclust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that opens a database.
#[derive(Args)]
struct DatabaseArgs {
    /// Path to the clustering database (.h5 or .json)
    database: PathBuf,

    /// Session configuration YAML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Elements per chunked read (overrides the configuration)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dimensions, sparsity and the epsilon sweep of a database
    Info {
        #[command(flatten)]
        db: DatabaseArgs,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Select an epsilon and summarise its clusters
    Select {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Epsilon value on the sweep grid
        #[arg(short, long)]
        epsilon: f64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Count clusters for every epsilon
    Sweep {
        #[command(flatten)]
        db: DatabaseArgs,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a normalised view of a sequence subset
    Normalize {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Normalisation to write
        #[arg(short, long, value_enum, default_value = "raw")]
        view: CliView,

        /// Epsilon for --cluster
        #[arg(short, long)]
        epsilon: Option<f64>,

        /// Time-series cluster label (requires --epsilon)
        #[arg(long, requires = "epsilon")]
        cluster: Option<i64>,

        /// Phylogenetic cluster label
        #[arg(long, conflicts_with = "cluster")]
        phylo: Option<i64>,

        /// Case-insensitive taxonomy substring
        #[arg(long, conflicts_with_all = ["cluster", "phylo"])]
        taxon: Option<String>,

        /// Output path (.csv or .tsv); standard output when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Simpson diversity per taxonomic rank and cluster
    Diversity {
        #[command(flatten)]
        db: DatabaseArgs,

        #[arg(short, long)]
        epsilon: f64,

        /// Single rank level from 2 (phylum) to 7 (species)
        #[arg(short, long)]
        level: Option<usize>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the members of one cluster
    Export {
        #[command(flatten)]
        db: DatabaseArgs,

        #[arg(short, long)]
        epsilon: f64,

        /// Time-series cluster label
        #[arg(short, long)]
        cluster: i64,

        /// Append the raw time series
        #[arg(long)]
        wide: bool,

        /// Output path (.csv or .tsv)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a synthetic database as JSON
    Synth {
        /// Output path for the database
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "500")]
        sequences: usize,

        #[arg(long, default_value = "60")]
        samples: usize,

        #[arg(long, default_value = "20")]
        steps: usize,

        /// Proportion of zero abundances
        #[arg(long, default_value = "0.5")]
        sparsity: f64,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Generate an example session configuration
    ExampleConfig {
        /// Output path for the example YAML
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Progress reporting on a terminal bar.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
        bar.set_style(style);
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn start(&self, stage: &str, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, n: u64) {
        self.bar.inc(n);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { db, format } => cmd_info(&db, format),
        Commands::Select {
            db,
            epsilon,
            format,
        } => cmd_select(&db, epsilon, format),
        Commands::Sweep { db, format } => cmd_sweep(&db, format),
        Commands::Normalize {
            db,
            view,
            epsilon,
            cluster,
            phylo,
            taxon,
            output,
        } => cmd_normalize(&db, view.into(), epsilon, cluster, phylo, taxon, output.as_deref()),
        Commands::Diversity {
            db,
            epsilon,
            level,
            format,
        } => cmd_diversity(&db, epsilon, level, format),
        Commands::Export {
            db,
            epsilon,
            cluster,
            wide,
            output,
        } => cmd_export(&db, epsilon, cluster, wide, &output),
        Commands::Synth {
            output,
            sequences,
            samples,
            steps,
            sparsity,
            seed,
        } => cmd_synth(&output, sequences, samples, steps, sparsity, seed),
        Commands::ExampleConfig { output } => cmd_example_config(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_session(args: &DatabaseArgs) -> Result<(Session, BarProgress)> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_path(path)?,
        None => SessionConfig::default(),
    };
    if let Some(chunk_size) = args.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    let progress = BarProgress::new(args.quiet);

    eprintln!("Loading database from {:?}...", args.database);
    let session = Session::open_with(&args.database, config, &progress)?;
    eprintln!(
        "Loaded {} sequences x {} samples",
        session.abundance().n_sequences(),
        session.abundance().n_samples()
    );
    Ok((session, progress))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_info(args: &DatabaseArgs, format: OutputFormat) -> Result<()> {
    let (session, _) = open_session(args)?;
    let profile = session.profile();
    match format {
        OutputFormat::Json => print_json(&profile)?,
        OutputFormat::Text => print!("{}", profile),
    }
    Ok(())
}

fn cmd_select(args: &DatabaseArgs, epsilon: f64, format: OutputFormat) -> Result<()> {
    let (session, _) = open_session(args)?;
    let labels = session.select_epsilon(epsilon)?;
    let summaries = session.cluster_summaries()?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "epsilon": labels.epsilon,
            "row": labels.row,
            "clusters": summaries,
        }))?,
        OutputFormat::Text => {
            println!(
                "Epsilon {} (row {}): {} clusters{}",
                labels.epsilon,
                labels.row,
                labels.clusters().len(),
                if labels.has_noise() { " plus noise" } else { "" }
            );
            println!("{:>8}  {:>8}  {:>14}", "label", "size", "abundance");
            for s in &summaries {
                println!("{:>8}  {:>8}  {:>14.1}", s.label, s.size, s.abundance);
            }
        }
    }
    Ok(())
}

fn cmd_sweep(args: &DatabaseArgs, format: OutputFormat) -> Result<()> {
    let (session, progress) = open_session(args)?;
    eprintln!("Counting clusters for {} epsilon values...", session.sweep().n_steps);
    let points = session.sweep_points(&progress)?;

    match format {
        OutputFormat::Json => print_json(points.as_ref())?,
        OutputFormat::Text => {
            println!("{:>12}  {:>8}  {:>6}", "epsilon", "clusters", "noise");
            for p in points.iter() {
                println!(
                    "{:>12.6}  {:>8}  {:>6}",
                    p.epsilon,
                    p.clusters,
                    if p.has_noise { "yes" } else { "no" }
                );
            }
        }
    }
    Ok(())
}

fn cmd_normalize(
    args: &DatabaseArgs,
    view: View,
    epsilon: Option<f64>,
    cluster: Option<i64>,
    phylo: Option<i64>,
    taxon: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let (session, _) = open_session(args)?;
    if let Some(eps) = epsilon {
        session.select_epsilon(eps)?;
    }
    let filter = match (cluster, phylo, taxon) {
        (Some(label), _, _) => RowFilter::TimeCluster(label),
        (_, Some(label), _) => RowFilter::PhyloCluster(label),
        (_, _, Some(text)) => RowFilter::TaxonContains(text),
        _ => RowFilter::All,
    };
    info!("Normalising subset {:?} as {}", filter, view);

    let result = session.normalize_subset(&filter)?;
    eprintln!("Selected {} sequences", result.n_rows());
    let ids: Vec<&str> = result
        .rows
        .iter()
        .filter_map(|&i| session.sequences().get(i).map(|r| r.id.as_str()))
        .collect();

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_matrix(file, Delimiter::from_path(path), &ids, session.time(), result.view(view))?;
            eprintln!("Wrote {} view to {:?}", view, path);
        }
        None => {
            let stdout = std::io::stdout();
            write_matrix(stdout.lock(), Delimiter::Tsv, &ids, session.time(), result.view(view))?;
        }
    }
    Ok(())
}

fn cmd_diversity(
    args: &DatabaseArgs,
    epsilon: f64,
    level: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let (session, _) = open_session(args)?;
    let levels = match level {
        Some(level) => vec![session.diversity_at_rank(epsilon, diversity_rank(level)?)?],
        None => session.diversity_by_level(epsilon)?.levels.clone(),
    };

    match format {
        OutputFormat::Json => print_json(&levels)?,
        OutputFormat::Text => {
            for level in &levels {
                println!("{} ({} clusters)", level.rank, level.clusters.len());
                for c in &level.clusters {
                    println!(
                        "  cluster {:>6}  simpson {:.4}  classified {}",
                        c.cluster, c.simpson, c.n_classified
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_export(args: &DatabaseArgs, epsilon: f64, cluster: i64, wide: bool, output: &Path) -> Result<()> {
    let (session, _) = open_session(args)?;
    session.select_epsilon(epsilon)?;

    let table = session.cluster_table(cluster)?;
    if table.is_empty() {
        return Err(TsclustError::InvalidParameter(format!(
            "cluster {} has no members at epsilon {}",
            cluster, epsilon
        )));
    }
    let n_rows = table.len();
    if wide {
        session.wide_table(cluster)?.to_path(output)?;
    } else {
        table.to_path(output)?;
    }

    eprintln!("Wrote {} sequences to {:?}", n_rows, output);
    Ok(())
}

fn cmd_synth(
    output: &Path,
    sequences: usize,
    samples: usize,
    steps: usize,
    sparsity: f64,
    seed: u64,
) -> Result<()> {
    let config = SyntheticConfig::default()
        .with_dimensions(sequences, samples)
        .with_sparsity(sparsity)
        .with_sweep(0.01, 0.01, steps)
        .with_seed(seed);
    let layout = SessionConfig::default().layout;

    eprintln!(
        "Generating {} sequences x {} samples with {} epsilon values...",
        sequences, samples, steps
    );
    let store = generate_synthetic(&config, &layout)?;
    store.to_json_file(output)?;
    eprintln!("Wrote synthetic database to {:?}", output);
    Ok(())
}

fn cmd_example_config(output: &Path) -> Result<()> {
    let yaml = SessionConfig::default().to_yaml()?;
    let mut file = std::fs::File::create(output)?;
    file.write_all(yaml.as_bytes())?;
    eprintln!("Wrote example configuration to {:?}", output);
    Ok(())
}
