// Card Resolver CLI
// stdout carries JSON only; logs and warnings go to stderr

use anyhow::{bail, Result};
use card_resolver::{
    extract, run_bulk, search_patterns, BulkQuery, ExecutorSearch, Filter, MatchFlags,
    MatchMode, Projection, QueryOptions, RenderStyle, ReplacementResolver, SearchConfig, SortSpec,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "card-resolver", version)]
#[command(about = "Search cards and resolve card references in text", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding cards-all.tsv / detail-all.tsv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter query, one JSON object per line
    Search {
        /// e.g. '{"name": "青眼の白龍"}'
        filter: String,

        /// Comma-separated columns
        #[arg(long)]
        cols: Option<String>,

        /// exact | partial (partial: name only)
        #[arg(long, default_value = "exact")]
        mode: MatchMode,

        /// field[:asc|desc]
        #[arg(long)]
        sort: Option<SortSpec>,

        /// Maximum results
        #[arg(long)]
        max: Option<usize>,

        /// Do not fall back to the ruby reading for names
        #[arg(long)]
        no_ruby: bool,

        /// Treat `*` literally
        #[arg(long)]
        no_wild: bool,

        /// Compare names without normalization
        #[arg(long)]
        no_modify: bool,

        /// Typo-tolerant name matching
        #[arg(long)]
        fuzzy: bool,

        #[arg(long)]
        no_auto_ruby: bool,

        #[arg(long)]
        no_auto_pend: bool,

        #[arg(long)]
        no_auto_supply: bool,
    },
    /// List references in text with their search results
    Extract { text: String },
    /// Rewrite references in text to {{name|id}}
    Replace {
        text: String,

        /// Render single matches as 《name》
        #[arg(long)]
        exact_brackets: bool,
    },
    /// Run a JSON array of queries
    Bulk { queries: String },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let mut config = SearchConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    info!("data directory: {}", config.data_dir.display());

    let store = config.store();

    match cli.command {
        Commands::Search {
            filter,
            cols,
            mode,
            sort,
            max,
            no_ruby,
            no_wild,
            no_modify,
            fuzzy,
            no_auto_ruby,
            no_auto_pend,
            no_auto_supply,
        } => {
            let filter: Filter = filter.parse()?;
            if filter.is_empty() {
                bail!("filter must name at least one field");
            }

            let mut options = QueryOptions::default()
                .with_mode(mode)
                .with_flags(MatchFlags {
                    normalize: !no_modify,
                    allow_wildcard: !no_wild && mode != MatchMode::Partial,
                    fuzzy,
                })
                .with_include_ruby(!no_ruby)
                .with_max(Some(max.unwrap_or(config.default_max)));
            if let Some(sort) = sort {
                options = options.with_sort(sort);
            }

            let projection = match cols {
                Some(cols) => Projection::columns(Projection::parse_columns(&cols)?),
                None => Projection::all(),
            }
            .with_auto_ruby(!no_auto_ruby)
            .with_auto_pendulum(!no_auto_pend)
            .with_auto_supplement(!no_auto_supply);

            let rows = config.executor(&store).run(&filter, &options, &projection)?;
            for row in &rows.rows {
                println!("{}", serde_json::to_string(row)?);
            }
            if rows.truncated {
                eprintln!(
                    "⚠️  Showing {} of {} results (raise --max to see more)",
                    rows.rows.len(),
                    rows.total_matches
                );
            }
        }
        Commands::Extract { text } => {
            let search = ExecutorSearch::new(config.executor(&store));
            let patterns = extract(&text);
            let matches = search_patterns(&patterns, &search)?;
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        Commands::Replace { text, exact_brackets } => {
            let style = if exact_brackets {
                RenderStyle::ExactName
            } else {
                RenderStyle::IdQualified
            };
            let search = ExecutorSearch::new(config.executor(&store));
            let report = ReplacementResolver::new()
                .with_style(style)
                .resolve_text(&text, &search)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Bulk { queries } => {
            let queries = BulkQuery::parse_list(&queries)?;
            let results = run_bulk(&config.executor(&store), &queries, config.default_max)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
