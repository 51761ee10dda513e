use rust_decimal_macros::dec;
use std::path::PathBuf;
use surebet_arbitrage::{MarketStatus, OddsSnapshot, OddsTable, SurebetScanner};
use surebet_core::{ConfigLoader, MarketTranslations, SportCatalog};

fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn load_demo_snapshot(translations: &MarketTranslations) -> OddsSnapshot {
    let mut snapshot = OddsSnapshot::new();
    for name in ["betfair", "bwin", "ladbrokes"] {
        let path = demos().join("snapshot").join(format!("{name}.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        let mut table = OddsTable::from_json(&text).unwrap();
        let bookmaker = table.bookmaker.clone();
        table.rename_markets(|label| {
            translations
                .to_standard_market(label, &bookmaker)
                .to_string()
        });
        snapshot.insert(table);
    }
    snapshot
}

#[test]
fn test_demo_football_scan() {
    let config = ConfigLoader::load(demos().join("Surebet.toml")).unwrap();
    let catalog = SportCatalog::load(demos().join("taxonomy/sports_and_markets.json")).unwrap();
    let translations =
        MarketTranslations::load(demos().join("taxonomy/market_translations.json")).unwrap();

    let sport = config.sport.clone().unwrap();
    let markets = catalog.markets(&sport).unwrap();
    let snapshot = load_demo_snapshot(&translations);

    let scanner = SurebetScanner::new(config).unwrap();
    let book = scanner.scan(&markets, &snapshot);

    assert_eq!(book.len(), 2);
    assert_eq!(book.get("btts").unwrap().status, MarketStatus::NoSurebets);

    let win = book.get("win").unwrap();
    assert_eq!(win.status, MarketStatus::SurebetsFound);
    assert_eq!(win.plan_count(), 1);

    let plan = win
        .plan("Betfair-Ladbrokes-bwin", "Arsenal v Tottenham")
        .unwrap();
    assert_eq!(plan.staked(), dec!(100));
    assert!(plan.is_safe());
}
