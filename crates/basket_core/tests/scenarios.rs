use basket_core::{
    generate_rules, load, snapshot, BasketError, DataError, ItemId, Miner, Model, ModelHandle,
    RawRow, TrainingError, TrainingParams,
};

fn scenario_rows() -> Vec<RawRow> {
    let baskets: [(&str, &[&str]); 5] = [
        ("T1", &["A", "B"]),
        ("T2", &["A", "B"]),
        ("T3", &["A", "C"]),
        ("T4", &["B", "C"]),
        ("T5", &["A", "B", "C"]),
    ];
    let names = |id: &str| match id {
        "A" => "Camera",
        "B" => "Camera Bag",
        _ => "Memory Card",
    };
    baskets
        .iter()
        .flat_map(|(tx, items)| items.iter().map(move |id| RawRow::new(*tx, *id, names(*id))))
        .collect()
}

fn ids(items: &[&str]) -> Vec<ItemId> {
    items.iter().map(|&s| ItemId::from(s)).collect()
}

#[test]
fn scenario_corpus_end_to_end() -> anyhow::Result<()> {
    let (transactions, catalog) = load(scenario_rows())?;
    assert_eq!(transactions.len(), 5);
    assert_eq!(catalog.len(), 3);

    let itemsets = Miner::new(0.4).mine(&transactions)?;
    let expected = [
        (&["A"][..], 0.8),
        (&["B"][..], 0.8),
        (&["C"][..], 0.6),
        (&["A", "B"][..], 0.6),
        (&["A", "C"][..], 0.4),
        (&["B", "C"][..], 0.4),
    ];
    assert_eq!(itemsets.len(), expected.len());
    for (items, support) in expected {
        let found = itemsets.support_of(&ids(items)).expect("itemset present");
        assert!((found - support).abs() < 1e-12, "{:?}", items);
    }
    assert!(itemsets.get(&ids(&["A", "B", "C"])).is_none());

    let params = TrainingParams::new(0.4, 0.3, 0.0);
    let rules = generate_rules(&itemsets, params.min_confidence, params.min_lift)?;
    let model = Model::new(params, catalog, rules)?;
    let handle = ModelHandle::new(model);

    let recs = handle.recommend(&["A"], 5);
    let recommended: Vec<&str> = recs.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(recommended, vec!["B", "C"]);
    assert_eq!(recs[0].display_name, "Camera Bag");
    assert!((recs[0].confidence - 0.75).abs() < 1e-12);
    assert!((recs[0].lift - 0.9375).abs() < 1e-12);

    let recs = handle.recommend(&["C"], 5);
    assert!((recs[0].confidence - 2.0 / 3.0).abs() < 1e-12);
    assert!((recs[0].lift - 0.8333).abs() < 1e-4);

    Ok(())
}

#[test]
fn default_lift_threshold_removes_every_scenario_rule() -> anyhow::Result<()> {
    let (transactions, _) = load(scenario_rows())?;
    let itemsets = Miner::new(0.4).mine(&transactions)?;
    let params = TrainingParams::default();

    assert!(generate_rules(&itemsets, params.min_confidence, params.min_lift)?.is_empty());
    Ok(())
}

#[test]
fn saved_model_reloads_with_same_hash() -> anyhow::Result<()> {
    let (transactions, catalog) = load(scenario_rows())?;
    let itemsets = Miner::new(0.4).mine(&transactions)?;
    let params = TrainingParams::new(0.4, 0.3, 0.0);
    let model = Model::new(params, catalog, generate_rules(&itemsets, 0.3, 0.0)?)?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("recommender_model.json");
    snapshot::write_file(&path, &model.to_blob()?)?;

    let reloaded = Model::from_snapshot(snapshot::read_file(&path)?);
    assert_eq!(reloaded.hash(), model.hash());
    assert_eq!(reloaded.recommend(&["A"], 5), model.recommend(&["A"], 5));
    Ok(())
}

#[test]
fn errors_convert_into_umbrella() {
    let err: BasketError = load(Vec::<RawRow>::new()).unwrap_err().into();
    assert!(matches!(err, BasketError::Data(DataError::Empty)));

    let (transactions, _) = load(scenario_rows()).unwrap();
    let err: BasketError = Miner::new(0.0).mine(&transactions).unwrap_err().into();
    assert!(matches!(
        err,
        BasketError::Training(TrainingError::InvalidThreshold { name: "min_support", .. })
    ));
}
