//! Integration tests for the basket trainer
//!
//! Trains from CSV files on disk and checks the persisted model reloads
//! to the same rules and hash.

use anyhow::Result;
use basket_core::{snapshot, DataError, Model};
use basket_trainer::{train_model_from_csv, TrainerError, TrainingConfig};
use std::io::Write;
use tempfile::NamedTempFile;

/// Camera shop transactions: bodies sell with bags, lenses with filters
fn create_transaction_file() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "TransactionID,SKU,ProductName")?;

    let baskets: [&[(&str, &str)]; 8] = [
        &[("D7050", "Nikon D7050"), ("PG9914", "Camera Bag")],
        &[("D7050", "Nikon D7050"), ("PG9914", "Camera Bag")],
        &[("D7050", "Nikon D7050"), ("PG9914", "Camera Bag"), ("SD64", "SD Card 64GB")],
        &[("L50", "50mm Lens"), ("UVF", "UV Filter")],
        &[("L50", "50mm Lens"), ("UVF", "UV Filter")],
        &[("L50", "50mm Lens"), ("UVF", "UV Filter")],
        &[("D7050", "Nikon D7050")],
        &[("SD64", "SD Card 64GB")],
    ];
    for (i, basket) in baskets.iter().enumerate() {
        for (sku, name) in basket.iter() {
            writeln!(file, "{},{},{}", 1000 + i, sku, name)?;
        }
    }

    file.flush()?;
    Ok(file)
}

#[test]
fn test_train_save_and_reload() -> Result<()> {
    let file = create_transaction_file()?;
    let (model, report) = train_model_from_csv(file.path(), TrainingConfig::default())?;

    assert_eq!(report.transaction_count, 8);
    assert_eq!(report.product_count, 5);
    assert!(report.rule_count > 0);

    let recs = model.recommend(&["D7050"], 5);
    assert_eq!(recs[0].item_id.as_str(), "PG9914");
    assert_eq!(recs[0].display_name, "Camera Bag");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("models").join("recommender_model.json");
    snapshot::write_file(&path, &model.to_blob()?)?;
    assert!(snapshot::hash_path(&path).exists());

    let reloaded = Model::from_snapshot(snapshot::read_file(&path)?);
    assert_eq!(reloaded.hash(), model.hash());
    assert_eq!(reloaded.rules(), model.rules());
    assert_eq!(reloaded.recommend(&["L50"], 5), model.recommend(&["L50"], 5));

    Ok(())
}

#[test]
fn test_deterministic_training() -> Result<()> {
    let file = create_transaction_file()?;

    let (model1, _) = train_model_from_csv(file.path(), TrainingConfig::default())?;
    let (model2, _) = train_model_from_csv(file.path(), TrainingConfig::default())?;

    assert_eq!(model1.hash(), model2.hash());
    assert_eq!(model1.rules(), model2.rules());
    Ok(())
}

#[test]
fn test_blank_field_names_row() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "TransactionID,SKU,ProductName")?;
    writeln!(file, "1,D7050,Nikon D7050")?;
    writeln!(file, "1, ,Camera Bag")?;
    file.flush()?;

    let err = train_model_from_csv(file.path(), TrainingConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TrainerError::Dataset(DataError::MissingField { row: 2, field: "item_id" })
    ));
    Ok(())
}
