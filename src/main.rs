//! Vibes Collection - command line tracker
//!
//! Reads and edits a collection from the terminal and optionally serves the
//! read-only web API.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vibes_collection::error::CollectionError;
use vibes_collection::profile::{ensure_profile, update_username};
use vibes_collection::{
    format_price, Catalog, CollectionStats, Deck, Identity, ImportPayload, InventoryStore,
    OwnershipStatus, PriceTable, Result, Session, SqliteBackend,
};
use vibes_common::Variant;

/// Vibes card collection tracker
#[derive(Parser, Debug)]
#[command(name = "vibes_collection")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the shared SQLite database (collections, profiles, prices)
    #[arg(short, long, default_value_t = default_path("collection.db"))]
    database: String,

    /// Path to the on-device store used when not signed in
    #[arg(long, default_value_t = default_path("local.db"))]
    local_store: String,

    /// Act as this signed-in user id (default: anonymous, device-local collection)
    #[arg(short, long)]
    user: Option<String>,

    /// Email of the signed-in user, used to pick the initial username
    #[arg(long, requires = "user")]
    email: Option<String>,

    /// Card catalog JSON (default: bundled catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Collection(CollectionCommand),
    /// Cost of building a deck from a deck JSON file
    DeckCost {
        path: PathBuf,
        #[arg(long, default_value_t = Variant::Normal)]
        variant: Variant,
    },
    /// Search the catalog by card name
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Change the signed-in user's username
    Username { name: String },
    /// Serve the web API
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

/// Commands that open the session's collection
#[derive(Subcommand, Debug)]
enum CollectionCommand {
    /// Show completion statistics
    Stats,
    /// Show owned copies and prices of one card
    Show { card_id: String },
    /// Add or remove copies of a variant
    Adjust {
        card_id: String,
        variant: Variant,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Set the owned count of a variant
    Set {
        card_id: String,
        variant: Variant,
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Write the collection as a versioned export
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the collection with an export or bare inventory file
    Import { path: PathBuf },
    /// Remove every card from the collection
    Reset,
    /// Market value of the collection
    Value,
}

/// Returns a path under the data dir: ~/.local/share/vibes_collection/<file>
fn default_path(file: &str) -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vibes_collection")
        .join(file)
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let remote = SqliteBackend::open(Path::new(&args.database))?;
    let catalog = Catalog::load_or_empty(args.catalog.as_deref());
    log::debug!("Catalog has {} cards", catalog.len());

    let session = match &args.user {
        Some(user_id) => {
            let mut identity = Identity::new(user_id.clone());
            identity.email = args.email.clone();
            let profile = ensure_profile(&remote, &identity)?;
            log::info!("Signed in as {} ({})", profile.username, user_id);
            Session::Identified(identity)
        }
        None => Session::Anonymous,
    };

    match args.command {
        Command::Serve { port } => {
            vibes_collection::web::serve(remote, Arc::new(catalog), port).await
        }
        Command::Search { query, limit } => {
            for card in catalog.search(&query, limit) {
                println!("{:<8} {:<24} {} {}", card.id, card.name, card.color, card.rarity);
            }
            Ok(())
        }
        Command::Username { name } => {
            let user_id = session.user_id().ok_or(CollectionError::NotSignedIn)?;
            let username = update_username(&remote, user_id, &name)?;
            println!("Username set to {}", username);
            Ok(())
        }
        Command::DeckCost { path, variant } => {
            let deck: Deck = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            let cost = PriceTable::load(&remote).cost_of(&deck, variant);
            println!(
                "{} ({} cards, {}): {}",
                deck.name,
                deck.total_cards(),
                variant.label(),
                format_price(Some(cost.total))
            );
            if !cost.missing.is_empty() {
                println!("No price for: {}", cost.missing.join(", "));
            }
            Ok(())
        }
        Command::Collection(command) => {
            let local = SqliteBackend::open(Path::new(&args.local_store))?;
            let mut store =
                InventoryStore::open(session, Arc::new(local), Arc::new(remote.clone()));
            let result = run_collection(command, &mut store, &catalog, &remote);
            store.close();
            result
        }
    }
}

fn run_collection(
    command: CollectionCommand,
    store: &mut InventoryStore,
    catalog: &Catalog,
    remote: &SqliteBackend,
) -> Result<()> {
    match command {
        CollectionCommand::Stats => {
            let stats = CollectionStats::compute(catalog, store.inventory());
            println!(
                "Unique cards:  {}/{} ({:.1}%)",
                stats.unique_cards_owned,
                stats.total_in_set,
                stats.unique_percent()
            );
            println!("Total copies:  {}", stats.total_cards_owned);
            println!(
                "Playsets:      {}/{} ({:.1}%)",
                stats.playset_complete_count,
                stats.total_in_set,
                stats.playset_percent()
            );
            println!(
                "Master sets:   {}/{} ({:.1}%)",
                stats.master_complete_count,
                stats.total_in_set,
                stats.master_percent()
            );
        }
        CollectionCommand::Show { card_id } => {
            let card = catalog
                .get(&card_id)
                .ok_or_else(|| CollectionError::CardNotFound(card_id.clone()))?;
            let counts = store.variants_of(&card_id);
            let prices = PriceTable::load(remote);
            println!("{} - {} ({}, {})", card.id, card.name, card.color, card.rarity);
            for (variant, count) in counts.iter() {
                println!(
                    "  {:<7} {:>2}  {}",
                    variant.label(),
                    count,
                    format_price(prices.get_price(&card_id, variant))
                );
            }
            println!("  Status: {:?}", OwnershipStatus::of(&counts));
        }
        CollectionCommand::Adjust {
            card_id,
            variant,
            delta,
        } => {
            warn_if_unknown(catalog, &card_id);
            let count = store.adjust(&card_id, variant, delta);
            println!("{} {}: {}", card_id, variant.label(), count);
        }
        CollectionCommand::Set {
            card_id,
            variant,
            count,
        } => {
            warn_if_unknown(catalog, &card_id);
            let count = store.set_count(&card_id, variant, count);
            println!("{} {}: {}", card_id, variant.label(), count);
        }
        CollectionCommand::Export { output } => {
            let json = serde_json::to_string_pretty(&store.export_snapshot())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("Exported collection to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        CollectionCommand::Import { path } => {
            let payload = ImportPayload::parse(&std::fs::read_to_string(&path)?)?;
            store.import(payload);
            println!("Imported {} cards", store.inventory().len());
        }
        CollectionCommand::Reset => {
            store.reset();
            println!("Collection cleared");
        }
        CollectionCommand::Value => {
            let value = PriceTable::load(remote).value_of(store.inventory());
            println!("Total: {}", format_price(Some(value.total)));
            for variant in Variant::ALL {
                println!(
                    "  {:<7} {}",
                    variant.label(),
                    format_price(Some(value.breakdown.get(variant)))
                );
            }
            if value.missing_prices > 0 {
                println!(
                    "{} of {} copies have no price",
                    value.missing_prices, value.card_count
                );
            }
        }
    }
    Ok(())
}

fn warn_if_unknown(catalog: &Catalog, card_id: &str) {
    if !catalog.contains(card_id) {
        log::warn!("{} is not in the catalog", card_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_delta() {
        let args = Args::try_parse_from([
            "vibes_collection",
            "adjust",
            "fw-001",
            "foil",
            "-1",
        ])
        .unwrap();
        match args.command {
            Command::Collection(CollectionCommand::Adjust { variant, delta, .. }) => {
                assert_eq!(variant, Variant::Foil);
                assert_eq!(delta, -1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn email_requires_user() {
        assert!(Args::try_parse_from(["vibes_collection", "--email", "a@b.c", "stats"]).is_err());
    }

    #[tokio::test]
    async fn missing_catalog_file_still_runs_command() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("collection.db");
        let local_store = dir.path().join("local.db");
        let missing = dir.path().join("missing.json");
        let args = Args::try_parse_from([
            "vibes_collection",
            "--database",
            database.to_str().unwrap(),
            "--local-store",
            local_store.to_str().unwrap(),
            "--catalog",
            missing.to_str().unwrap(),
            "stats",
        ])
        .unwrap();

        run(args).await.unwrap();
        assert!(local_store.exists());
    }

    #[test]
    fn default_paths_live_under_app_dir() {
        assert!(default_path("local.db").contains("vibes_collection"));
    }
}
