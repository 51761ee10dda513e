//! Cross-bookmaker surebet detection and stake allocation.
//!
//! Bookmakers price the same event independently. When the best odds for
//! every outcome, taken from different bookmakers, have implied
//! probabilities summing to less than one, backing all outcomes guarantees a
//! profit:
//!
//! ```text
//! Betfair:  Arsenal v Tottenham           home 2.10   away 1.80
//! bwin:     Arsenal - Tottenham Hotspur   home 1.70   away 2.20
//!
//! Back home @ 2.10 on Betfair, away @ 2.20 on bwin
//!   1/2.10 + 1/2.20 = 0.9307 < 1
//!   Total stake 100, rounded to 5:  50 + 50
//!   Profit: 5.00% if home wins, 10.00% if away wins
//! ```
//!
//! # Modules
//!
//! - [`types`]: Odds tables, candidates, assignments and bet plans
//! - [`odds`]: Normalize raw odds cells into decimal odds
//! - [`similarity`]: Token-set label similarity
//! - [`matcher`]: Match the same event across bookmakers
//! - [`candidates`]: Join bookmaker combinations into candidates
//! - [`detector`]: Enumerate outcome assignments and test for arbitrage
//! - [`stakes`]: Split, round and repair stakes
//! - [`aggregator`]: Collect plans per market, combo and event
//! - [`scanner`]: Run the whole pipeline per market
//!
//! # Example
//!
//! ```ignore
//! use surebet_arbitrage::{OddsSnapshot, SurebetScanner};
//! use surebet_core::{MarketSpec, ScanConfig};
//!
//! let scanner = SurebetScanner::new(ScanConfig::default())?;
//! let book = scanner.scan(&[MarketSpec::three_way("win")], &snapshot);
//!
//! for report in book.reports() {
//!     for plan in report.plans() {
//!         println!("{} {}: {}", report.market, plan.combo, plan.event.identity());
//!     }
//! }
//! ```
//!
//! The engine only recommends stakes. It never contacts a bookmaker.

pub mod aggregator;
pub mod candidates;
pub mod detector;
pub mod error;
pub mod matcher;
pub mod odds;
pub mod scanner;
pub mod similarity;
pub mod stakes;
pub mod types;

pub use aggregator::{ComboPlans, MarketReport, MarketStatus, SurebetBook};
pub use candidates::{combinations, CandidateBuilder, NormalizedTables};
pub use detector::{implied_probability_sum, is_arbitrage_possible, permutations, ArbitrageDetector};
pub use error::{Result, SurebetError};
pub use matcher::{ChainMatch, EntityMatcher, LabelMatch};
pub use odds::{parse_token, OddsNormalizer};
pub use scanner::SurebetScanner;
pub use similarity::{token_set_ratio, SimilarityScorer, TokenSetRatio};
pub use stakes::{Allocation, StakeAllocator, StakeLeg};
pub use types::{
    Assignment, BetLeg, BetPlan, Candidate, ComboKey, EventMember, MatchedEventGroup,
    NormalizedRow, OddsRow, OddsSnapshot, OddsTable,
};
