//! `tome`: the Enchanted Tome catalog server and its maintenance commands.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `TOME_*` environment variables, opens the SQLite store and runs the
//! selected subcommand. With no subcommand the HTTP server starts.
//!
//! # Granting the first admin
//!
//! The user must sign in once so that a record exists, then:
//!
//! ```text
//! tome grant-admin <subject-id>
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tome_core::{
  catalog::{self, CatalogQuery, PriceBracket, SortKey},
  store::CatalogStore,
};
use tome_server::{ServerConfig, jwks::JwksVerifier, seed};
use tome_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Enchanted Tome catalog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Insert the sample catalog if the store has no books.
  Seed,
  /// Give a user administrative privilege.
  GrantAdmin {
    /// The user's identity-provider subject id.
    user_id: String,
  },
  /// Take administrative privilege away from a user.
  RevokeAdmin { user_id: String },
  /// Print the catalog through the storefront's filter and sort pipeline.
  Books {
    #[arg(long)]
    text:     Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// One of under10, 10to25, 25to50, over50.
    #[arg(long, default_value = "all")]
    price:    String,
    /// One of title, author, price-low, price-high, newest.
    #[arg(long, default_value = "title")]
    sort:     String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TOME"))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::Seed => {
      let inserted = seed::seed_if_empty(&store)
        .await
        .context("failed to seed catalog")?;
      println!("inserted {inserted} books");
      Ok(())
    }
    Command::GrantAdmin { user_id } => set_admin(&store, &user_id, true).await,
    Command::RevokeAdmin { user_id } => set_admin(&store, &user_id, false).await,
    Command::Books { text, category, price, sort } => {
      let query = CatalogQuery {
        text,
        category,
        price: PriceBracket::parse_lenient(&price),
        sort: SortKey::parse_lenient(&sort),
      };
      print_books(&store, &query).await
    }
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let audience = server_cfg
    .auth_audience
    .as_deref()
    .context("auth_audience must be set to serve (TOME_AUTH_AUDIENCE)")?;
  let issuer = server_cfg.issuer().unwrap_or_default();

  // Keys must be reachable before any request can be authenticated.
  let verifier = JwksVerifier::new(&server_cfg.auth_jwks_uri, &issuer, audience);
  verifier
    .refresh()
    .await
    .with_context(|| format!("failed to fetch JWKS from {}", server_cfg.auth_jwks_uri))?;

  if server_cfg.seed_sample_books {
    seed::seed_if_empty(&store)
      .await
      .context("failed to seed catalog")?;
  }

  let app = tome_server::router(
    Arc::new(store),
    Arc::new(verifier),
    server_cfg.static_dir.as_deref(),
  );
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn set_admin(
  store: &SqliteStore,
  user_id: &str,
  is_admin: bool,
) -> anyhow::Result<()> {
  let user = store
    .set_admin(user_id, is_admin)
    .await
    .context("failed to update user")?
    .with_context(|| {
      format!("no user with id {user_id:?}; they must sign in once first")
    })?;

  let email = user.email.as_deref().unwrap_or("-");
  println!("{} ({email}) is_admin = {}", user.id, user.is_admin);
  Ok(())
}

async fn print_books(store: &SqliteStore, query: &CatalogQuery) -> anyhow::Result<()> {
  let books = store.list_books().await.context("failed to list books")?;
  let page = catalog::query(&books, query);

  println!(
    "{} of {} books (price: {}, sort: {}, {} active filters)",
    page.results.len(),
    page.total,
    query.price.as_str(),
    query.sort.as_str(),
    page.active_filters,
  );
  for book in &page.results {
    let stock = if book.in_stock { "" } else { "  [out of stock]" };
    println!(
      "{}  {:>8.2}  {:<16}  {} by {}{stock}",
      book.id, book.price, book.category, book.title, book.author
    );
  }
  println!("categories: {}", page.facet_categories.join(", "));
  Ok(())
}
