//! Basket Trainer CLI
//!
//! Trains association rules from a transaction CSV and writes the model
//! snapshot plus its `.hash` file.

use anyhow::{Context, Result};
use basket_core::{snapshot, TrainingParams};
use basket_trainer::{train_model_from_csv, TrainingConfig, DEFAULT_FALLBACK_MIN_SUPPORT};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "basket-train")]
#[command(author = "Basket Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Market basket association-rule trainer", long_about = None)]
struct Args {
    /// Input CSV with TransactionID,SKU,ProductName columns
    #[arg(short, long, default_value = "data/transactions.csv")]
    input: PathBuf,

    /// Output model file; the hash is written next to it
    #[arg(short, long, default_value = "models/recommender_model.json")]
    output: PathBuf,

    /// Minimum support ratio for frequent itemsets
    #[arg(long, default_value = "0.05")]
    min_support: f64,

    /// Minimum rule confidence
    #[arg(long, default_value = "0.3")]
    min_confidence: f64,

    /// Minimum rule lift
    #[arg(long, default_value = "1.0")]
    min_lift: f64,

    /// Support retried when no pair is frequent
    #[arg(long, default_value_t = DEFAULT_FALLBACK_MIN_SUPPORT)]
    fallback_support: f64,

    /// Never retry with the fallback support
    #[arg(long)]
    no_fallback: bool,

    /// Largest itemset size to mine
    #[arg(long)]
    max_len: Option<usize>,

    /// Count supports on a single thread
    #[arg(long)]
    sequential: bool,

    /// SKUs of a demo cart to print recommendations for (comma separated or repeated)
    #[arg(long, value_delimiter = ',', action = clap::ArgAction::Append)]
    cart: Vec<String>,

    /// Recommendations shown for the demo cart
    #[arg(long, default_value = "5")]
    top_n: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Basket Trainer v{}", env!("CARGO_PKG_VERSION"));

    let config = TrainingConfig {
        params: TrainingParams::new(args.min_support, args.min_confidence, args.min_lift),
        fallback_min_support: (!args.no_fallback).then_some(args.fallback_support),
        max_itemset_len: args.max_len,
        parallel: !args.sequential,
    };

    info!("Training configuration:");
    info!("  Min support: {}", config.params.min_support);
    info!("  Min confidence: {}", config.params.min_confidence);
    info!("  Min lift: {}", config.params.min_lift);
    info!("  Fallback support: {:?}", config.fallback_min_support);
    info!("  Max itemset length: {:?}", config.max_itemset_len);

    info!("Loading transactions from: {}", args.input.display());
    let (model, report) =
        train_model_from_csv(&args.input, config).context("Failed to train model")?;

    info!("Training complete!");
    info!("  Transactions: {}", report.transaction_count);
    info!("  Products: {}", report.product_count);
    info!("  Frequent itemsets: {}", report.itemset_count);
    info!("  Rules: {}", report.rule_count);
    if report.used_fallback {
        info!("  Fallback support used: {}", report.effective_min_support);
    }
    info!("  Model hash: {}", model.hash());

    let blob = model.to_blob().context("Failed to serialize model")?;
    let file_hash =
        snapshot::write_file(&args.output, &blob).context("Failed to write model file")?;
    info!("  Model: {}", args.output.display());
    info!(
        "  Hash: {} ({})",
        snapshot::hash_path(&args.output).display(),
        file_hash
    );

    if !args.cart.is_empty() {
        println!("\nRecommendations for cart {:?}:", args.cart);
        let recs = model.recommend(&args.cart, args.top_n);
        if recs.is_empty() {
            println!("  (no matching rules)");
        }
        for rec in recs {
            println!(
                "  - {} ({}): confidence={:.2}%, lift={:.2}",
                rec.display_name,
                rec.item_id,
                rec.confidence * 100.0,
                rec.lift
            );
        }
    }

    Ok(())
}
