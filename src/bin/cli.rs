//! betterread CLI
//!
//! Local entry point for discovery, search, availability lookup, and
//! onboarding against the configured backend and library catalogue.

use std::path::PathBuf;
use std::sync::Arc;

use betterread::{
    error::Result,
    limiter::RateLimiter,
    models::{Book, Config},
    pipeline::{self, Aggregator},
    services::{
        self, BackendClient, CatalogueClient, CoverResolver, IdentityProvider, LocalIdentity,
    },
};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use rand::seq::SliceRandom;

/// betterread - book discovery with live library availability
#[derive(Parser, Debug)]
#[command(
    name = "betterread",
    version,
    about = "Book discovery and reading-list client"
)]
struct Cli {
    /// Path to state directory containing config and user files
    #[arg(short, long, default_value = "state")]
    state_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a random selection of books with covers and availability
    Discover {
        /// How many books to display
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Search the backend collection by title
    Search {
        /// Title query (matched against title and author)
        query: String,
    },

    /// Recommend books similar to the ones already rated
    Recommend {
        /// How many recommendations to display
        #[arg(long, default_value_t = 10)]
        count: usize,
    },

    /// Show details for one book: cover, description, shelf locations
    Book {
        /// Book ISBN
        isbn: String,

        /// Title to search the catalogue with (defaults to backend lookup)
        #[arg(long)]
        title: Option<String>,
    },

    /// Complete onboarding with the given starting books
    Onboard {
        /// ISBNs of books already read
        #[arg(required = true)]
        isbns: Vec<String>,
    },

    /// Validate configuration files
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Shared service handles built from one config.
struct Services {
    backend: BackendClient,
    covers: Arc<CoverResolver>,
    catalogue: Arc<CatalogueClient>,
}

fn build_services(config: &Config) -> Result<Services> {
    let client = services::create_client(&config.client)?;
    let limiter = RateLimiter::new(&config.limiter);
    Ok(Services {
        backend: BackendClient::new(Arc::new(config.backend.clone()), client.clone()),
        covers: Arc::new(CoverResolver::new(
            Arc::new(config.covers.clone()),
            client.clone(),
        )),
        catalogue: Arc::new(CatalogueClient::new(
            Arc::new(config.catalogue.clone()),
            client,
            limiter,
        )),
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.state_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::info!("Loaded configuration from {}", cli.state_dir.display());

    match cli.command {
        Command::Discover { count } => {
            let services = build_services(&config)?;

            let mut books = services.backend.get_books(1000).await;
            if books.is_empty() {
                log::warn!("Backend returned no books");
                return Ok(());
            }
            books.shuffle(&mut rand::thread_rng());
            books.truncate(count);

            render_book_list(&services, books).await;
        }

        Command::Search { query } => {
            let services = build_services(&config)?;
            let books = services.backend.search_books(&query).await;

            if books.is_empty() {
                println!("No books matched '{query}'.");
                return Ok(());
            }
            for book in &books {
                let year = book.year_of_publication.as_deref().unwrap_or("unknown");
                println!(
                    "{} by {} ({year})\n    isbn: {}  cover: {}",
                    book.title,
                    book.author,
                    book.isbn,
                    services.covers.medium_cover_url(&book.isbn)
                );
            }
        }

        Command::Recommend { count } => {
            let services = build_services(&config)?;
            let identity = LocalIdentity::new(&cli.state_dir);

            let user_id = match identity.fetch_attributes().await {
                Ok(attributes) => attributes.sub,
                Err(error) => {
                    log::warn!("No identity on file ({error}), using local-user");
                    "local-user".to_string()
                }
            };

            let mut books = pipeline::recommended_books(&services.backend, &user_id).await;
            if books.is_empty() {
                println!("No recommendations yet. Rate some books first (see 'onboard').");
                return Ok(());
            }
            books.truncate(count);

            render_book_list(&services, books).await;
        }

        Command::Book { isbn, title } => {
            let services = build_services(&config)?;

            let title = match title {
                Some(title) => Some(title),
                None => services.backend.find_by_isbn(&isbn).await.map(|b| b.title),
            };

            let cover = services.covers.resolve(&isbn).await;
            println!("Cover: {}", cover.as_deref().unwrap_or("(none found)"));

            let description = services.covers.description(&isbn).await;
            println!("\n{description}\n");

            let Some(title) = title else {
                log::warn!("No title known for {isbn}; skipping catalogue lookup");
                return Ok(());
            };

            let records = match services.catalogue.search_title(&title).await {
                Some(record) => services.catalogue.get_availability(&record.brn).await,
                None => Vec::new(),
            };
            let status = betterread::models::AvailabilityStatus::classify(&records);
            println!("Availability: {status}");

            if !records.is_empty() {
                let codes: Vec<String> =
                    records.iter().map(|r| r.location.code.clone()).collect();
                let branches = services.catalogue.get_branches(&codes).await;
                for record in &records {
                    let image = branches
                        .iter()
                        .find(|b| b.branch_code == record.location.code)
                        .and_then(|b| b.main_image.as_deref())
                        .unwrap_or("-");
                    println!(
                        "    {} [{:?}] {image}",
                        record.location.name, record.status
                    );
                }
            }
        }

        Command::Onboard { isbns } => {
            let services = build_services(&config)?;
            let identity = LocalIdentity::new(&cli.state_dir);

            if !pipeline::needs_onboarding(&identity).await {
                log::info!("Onboarding already complete");
                return Ok(());
            }

            let mut books = Vec::new();
            for isbn in &isbns {
                match services.backend.find_by_isbn(isbn).await {
                    Some(book) => books.push(book),
                    None => books.push(Book {
                        isbn: isbn.clone(),
                        title: String::new(),
                        author: String::new(),
                        year_of_publication: None,
                        publisher: None,
                    }),
                }
            }

            pipeline::run_onboarding(&identity, &services.backend, &books).await?;
            log::info!("Onboarding complete!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    log::info!("Done!");

    Ok(())
}

/// Run the aggregator over `books`, printing each snapshot as it lands.
async fn render_book_list(services: &Services, books: Vec<Book>) {
    let ordered: Vec<Book> = books.clone();
    let aggregator = Aggregator::new(
        Arc::clone(&services.covers),
        Arc::clone(&services.catalogue),
    );

    let mut snapshots = Box::pin(aggregator.aggregate(books));
    while let Some(snapshot) = snapshots.next().await {
        if !snapshot.complete {
            log::info!(
                "Resolved {}/{} book(s)...",
                snapshot.availability.len(),
                ordered.len()
            );
            continue;
        }

        for book in &ordered {
            let cover = snapshot
                .covers
                .get(&book.isbn)
                .and_then(|c| c.as_deref())
                .unwrap_or("(no cover)");
            let status = snapshot
                .availability
                .get(&book.isbn)
                .map(|s| s.to_string())
                .unwrap_or_default();
            println!(
                "{} by {}\n    {status}  cover: {cover}",
                book.title, book.author
            );
        }
    }
}
