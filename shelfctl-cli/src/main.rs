//! shelfctl CLI - Many-to-many relation loading demonstrations
//!
//! This is the main entry point for the shelfctl command-line tool, which
//! runs a handful of query demonstrations against a seeded PostgreSQL book
//! catalog:
//! - Raw SQL round-trip (`ping`)
//! - Single-row fetch by primary key (`get`)
//! - `IN`-clause filtering (`filter`)
//! - Lazy, joined, and select-in relation loading (`list --strategy`)
//!
//! Run with `RUST_LOG=info,sqlx::query=debug` (the default) to see every SQL
//! statement sqlx issues, which is the point of the exercise.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shelfctl_core::{seed, BookWithAuthors, Settings};
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "shelfctl",
    author,
    version,
    about = "Relation-loading strategy demos against a PostgreSQL book catalog",
    long_about = "Exercises lazy (N+1), joined, and batched select-in loading of a \
                  many-to-many book/author relationship, plus basic query patterns. \
                  Every SQL statement is logged so the strategies can be compared."
)]
struct Cli {
    /// Print rows as pretty JSON instead of debug lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the m2m schema if needed and (re)seed the demonstration rows
    InitDb,
    /// Execute raw `SELECT 1` against the database
    Ping,
    /// Fetch exactly one book by ID
    Get(GetArgs),
    /// Fetch books whose IDs appear in an IN clause
    Filter(FilterArgs),
    /// Load all books with their authors using a chosen strategy
    List(ListArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct GetArgs {
    /// Book ID to fetch (defaults to seeded book 1)
    #[arg(long)]
    id: Option<Uuid>,
}

#[derive(Parser, Debug)]
struct FilterArgs {
    /// Book IDs for the IN clause (repeatable; defaults to both seeded books)
    #[arg(long = "id")]
    ids: Vec<Uuid>,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Loading strategy for the authors relation
    #[arg(long, value_enum, default_value = "lazy")]
    strategy: Strategy,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// One authors query per book (N+1)
    Lazy,
    /// Single LEFT OUTER JOIN query
    Joined,
    /// Books query plus one batched IN query
    SelectIn,
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=debug")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().ok();
    let cli = Cli::parse();

    // Completions need no database
    if let Commands::Completions(args) = &cli.command {
        return run_completions(args);
    }

    shelfctl_core::load_dotenv();
    let settings = Settings::from_env().context("failed to read database settings")?;
    let pool = shelfctl_core::connect(&settings)
        .await
        .context("failed to connect to postgres")?;

    match cli.command {
        Commands::InitDb => run_init_db(&pool).await?,
        Commands::Ping => run_ping(&pool).await?,
        Commands::Get(args) => run_get(&pool, args, cli.json).await?,
        Commands::Filter(args) => run_filter(&pool, args, cli.json).await?,
        Commands::List(args) => run_list(&pool, args, cli.json).await?,
        Commands::Completions(_) => unreachable!("handled before connecting"),
    }
    Ok(())
}

async fn run_init_db(pool: &PgPool) -> Result<()> {
    shelfctl_core::init_db(pool)
        .await
        .context("failed to initialize database")?;
    Ok(())
}

async fn run_ping(pool: &PgPool) -> Result<()> {
    let value = shelfctl_core::ping(pool).await.context("ping failed")?;
    println!("{}", value);
    Ok(())
}

async fn run_get(pool: &PgPool, args: GetArgs, json: bool) -> Result<()> {
    let id = args.id.unwrap_or(seed::BOOK_1_ID);
    info!("fetching single book {}", id);

    let book = shelfctl_core::fetch_book(pool, id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&book)?);
    } else {
        println!("{:?}", book);
    }
    Ok(())
}

async fn run_filter(pool: &PgPool, args: FilterArgs, json: bool) -> Result<()> {
    let ids = if args.ids.is_empty() {
        vec![seed::BOOK_1_ID, seed::BOOK_2_ID]
    } else {
        args.ids
    };
    info!("filtering books with IN clause over {} ids", ids.len());

    let books = shelfctl_core::filter_books(pool, &ids)
        .await
        .context("failed to filter books")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
    } else {
        for book in books {
            println!("{:?}", book);
        }
    }
    Ok(())
}

async fn run_list(pool: &PgPool, args: ListArgs, json: bool) -> Result<()> {
    info!("loading books with authors (strategy: {:?})", args.strategy);

    let entries = match args.strategy {
        Strategy::Lazy => shelfctl_core::load_lazy(pool).await,
        Strategy::Joined => shelfctl_core::load_joined(pool).await,
        Strategy::SelectIn => shelfctl_core::load_selectin(pool).await,
    }
    .context("failed to load books with authors")?;

    print_entries(&entries, json)?;
    Ok(())
}

fn print_entries(entries: &[BookWithAuthors], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    for entry in entries {
        println!("{:?}", entry.book);
    }
    for entry in entries {
        println!("{}: {:?}", entry.book.book_id, entry.authors);
    }
    Ok(())
}

fn run_completions(args: &CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
