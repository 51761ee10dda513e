//! Loading odds snapshots and taxonomy files from disk.
//!
//! A snapshot directory holds one JSON odds table per bookmaker, as written
//! by the scrapers at the end of a cycle. A taxonomy directory holds the
//! sports catalogue and the per-bookmaker market translations.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use surebet_arbitrage::{OddsSnapshot, OddsTable};
use surebet_core::{MarketTranslations, SportCatalog};
use tracing::{debug, warn};

/// Sports catalogue file name inside a taxonomy directory.
pub const SPORTS_FILE: &str = "sports_and_markets.json";

/// Market translations file name inside a taxonomy directory.
pub const TRANSLATIONS_FILE: &str = "market_translations.json";

/// Sports catalogue plus market translations.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub catalog: SportCatalog,
    pub translations: MarketTranslations,
}

impl Taxonomy {
    /// Loads both taxonomy files; missing translations mean every bookmaker
    /// already uses the standard market names.
    pub fn load(dir: &Path) -> Result<Self> {
        let catalog = SportCatalog::load(dir.join(SPORTS_FILE))?;

        let translations_path = dir.join(TRANSLATIONS_FILE);
        let translations = if translations_path.exists() {
            MarketTranslations::load(&translations_path)?
        } else {
            debug!(path = %translations_path.display(), "No market translations");
            MarketTranslations::default()
        };

        Ok(Self {
            catalog,
            translations,
        })
    }
}

/// Loads every `*.json` odds table in `dir`.
///
/// A file that cannot be parsed stands for a failed scrape and becomes an
/// empty table named after the file. Market labels are mapped to standard
/// names when translations are given.
pub fn load_snapshot(dir: &Path, translations: Option<&MarketTranslations>) -> Result<OddsSnapshot> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read snapshot directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut snapshot = OddsSnapshot::new();

    for path in paths {
        let mut table = match read_table(&path) {
            Ok(table) => table,
            Err(e) => {
                let bookmaker = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                warn!(
                    bookmaker = %bookmaker,
                    path = %path.display(),
                    error = %e,
                    "Unreadable odds table, treating as empty"
                );
                OddsTable::new(bookmaker)
            }
        };

        if let Some(translations) = translations {
            let bookmaker = table.bookmaker.clone();
            table.rename_markets(|label| {
                translations
                    .to_standard_market(label, &bookmaker)
                    .to_string()
            });
        }

        debug!(
            bookmaker = %table.bookmaker,
            rows = table.rows.len(),
            "Loaded odds table"
        );
        snapshot.insert(table);
    }

    Ok(snapshot)
}

fn read_table(path: &Path) -> Result<OddsTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    OddsTable::from_json(&text).with_context(|| format!("invalid odds table {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BETFAIR: &str = r#"{
        "bookmaker": "Betfair",
        "rows": [
            { "competitors": "Arsenal v Tottenham", "markets": { "Match Odds": "2.1\n3.4\n3.2" } }
        ]
    }"#;

    #[test]
    fn test_load_snapshot_reads_json_tables() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("betfair.json"), BETFAIR).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let snapshot = load_snapshot(dir.path(), None).unwrap();

        assert_eq!(snapshot.len(), 1);
        let table = snapshot.get("Betfair").unwrap();
        assert_eq!(table.rows[0].cell("Match Odds"), Some("2.1\n3.4\n3.2"));
    }

    #[test]
    fn test_load_snapshot_translates_markets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("betfair.json"), BETFAIR).unwrap();
        let translations =
            MarketTranslations::from_json(r#"{ "Betfair": { "win": "Match Odds" } }"#).unwrap();

        let snapshot = load_snapshot(dir.path(), Some(&translations)).unwrap();

        let table = snapshot.get("Betfair").unwrap();
        assert_eq!(table.rows[0].cell("win"), Some("2.1\n3.4\n3.2"));
    }

    #[test]
    fn test_load_snapshot_broken_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bwin.json"), "{ not json").unwrap();

        let snapshot = load_snapshot(dir.path(), None).unwrap();

        assert!(snapshot.get("bwin").unwrap().is_empty());
    }

    #[test]
    fn test_load_snapshot_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("absent"), None).is_err());
    }

    #[test]
    fn test_taxonomy_without_translations() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SPORTS_FILE),
            r#"{ "Tennis": { "two-way": ["win"], "three-way": [], "win-bet-is-three-way": false } }"#,
        )
        .unwrap();

        let taxonomy = Taxonomy::load(dir.path()).unwrap();

        assert_eq!(taxonomy.catalog.markets("Tennis").unwrap().len(), 1);
        assert_eq!(taxonomy.translations.to_site_market("win", "Betfair"), "win");
    }
}
