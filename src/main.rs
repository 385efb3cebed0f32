use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use shoecart_rs::{
    init_observability,
    models::{ProductId, UpdateProductAmount},
    observability::Metrics,
    repositories::{CartRepository, FileCartRepository, HttpCatalogRepository},
    services::RecordingNotifier,
    Cart, CartStore, CartUpdate, Config, LoadOptions,
};

#[derive(Parser, Debug)]
#[command(name = "shoecart", version, about = "Shopping cart backed by the storefront catalog")]
struct Cli {
    /// Print the Prometheus metrics collected during the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the stored cart
    Show,
    /// Add one unit of a product
    Add { product_id: ProductId },
    /// Remove a product from the cart
    Remove { product_id: ProductId },
    /// Set the quantity of a product already in the cart
    Update {
        product_id: ProductId,
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Empty the stored cart
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::from_environment().context("Failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Catalog: {}", config.catalog.catalog_base_url);
    info!(
        "Storage: {} ({})",
        config.storage.storage_path.display(),
        config.storage.storage_key
    );

    let metrics = Arc::new(Metrics::new()?);
    let repository = Arc::new(FileCartRepository::from_config(&config.storage));

    if let Command::Clear = cli.command {
        repository
            .clear_cart()
            .await
            .context("Failed to clear cart")?;
        print_cart(&Cart::new());
        return Ok(ExitCode::SUCCESS);
    }

    let catalog = Arc::new(
        HttpCatalogRepository::new(&config.catalog)
            .context("Failed to build catalog client")?
            .with_metrics(metrics.clone()),
    );
    let notifier = Arc::new(RecordingNotifier::new());

    let store = CartStore::load(
        catalog,
        repository,
        notifier.clone(),
        LoadOptions::from(&config.storage),
    )
    .await
    .context("Failed to load cart")?
    .with_metrics(metrics.clone());

    let update = match cli.command {
        Command::Show | Command::Clear => CartUpdate::Unchanged,
        Command::Add { product_id } => store.add_product(product_id).await,
        Command::Remove { product_id } => store.remove_product(product_id).await,
        Command::Update { product_id, amount } => {
            store
                .update_product_amount(UpdateProductAmount { product_id, amount })
                .await
        }
    };
    info!(?update, "Command finished");

    let notifications = notifier.take();
    for message in &notifications {
        eprintln!("{}", message);
    }

    print_cart(&store.cart());

    if cli.metrics {
        print!("{}", metrics.encode()?);
    }

    if notifications.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    println!("{:>6}  {:<40}  {:>6}  {:>10}", "ID", "PRODUCT", "AMOUNT", "TOTAL");
    for item in cart {
        println!(
            "{:>6}  {:<40}  {:>6}  {:>10}",
            item.id(),
            truncate(&item.product.title, 40),
            item.amount,
            item.total_price().round_dp(2)
        );
    }
    println!(
        "{:>6}  {:<40}  {:>6}  {:>10}",
        "",
        "SUBTOTAL",
        cart.total_items(),
        cart.subtotal().round_dp(2)
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(3)).collect();
    shortened.push_str("...");
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_with_negative_amount() {
        let cli = Cli::try_parse_from(["shoecart", "update", "3", "-1"]).unwrap();

        match cli.command {
            Command::Update { product_id, amount } => {
                assert_eq!(product_id, 3);
                assert_eq!(amount, -1);
            }
            other => panic!("Expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_metrics_flag_is_global() {
        let cli = Cli::try_parse_from(["shoecart", "add", "1", "--metrics"]).unwrap();

        assert!(cli.metrics);
        assert!(matches!(cli.command, Command::Add { product_id: 1 }));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Tênis", 40), "Tênis");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
