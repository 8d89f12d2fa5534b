//! Alpha scan: find trend-following candidates in a loaded universe.
//!
//! Pipeline per scan:
//! 1. Circuit breakers (market cap, dollar volume)
//! 2. 12-1 momentum per symbol, ranked, top fraction kept
//! 3. Indicators on the shortlisted symbols
//! 4. Technical filters (above the long average, not overbought)
//! 5. Setup classification; symbols without a setup are dropped
//!
//! Candidates come back sorted by setup confidence, highest first. Serial and
//! parallel scans return identical reports.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use momentum_core::domain::PriceSeries;
use momentum_core::filters::FilterVerdict;
use momentum_core::indicators::IndicatorSet;
use momentum_core::momentum::{rank, score, top_percentile, MomentumScore};
use momentum_core::setup::{classify_latest, Setup};

use crate::config::ScanConfig;
use crate::data_loader::LoadedUniverse;
use crate::universe::Exclusion;

/// A shortlisted symbol with a detected setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaCandidate {
    pub symbol: String,
    pub momentum_score: f64,
    pub setup: Setup,
    pub confidence: f64,
    pub latest_price: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
    /// Date of the bar the setup was detected on.
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedSymbol {
    pub symbol: String,
    pub exclusion: Exclusion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSymbol {
    pub symbol: String,
    pub verdict: FilterVerdict,
}

/// Full outcome of one Alpha scan, including everything that was dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlphaReport {
    /// Latest bar date across the scanned universe.
    pub as_of: Option<NaiveDate>,
    pub universe_size: usize,
    pub excluded: Vec<ExcludedSymbol>,
    /// Symbols too young for the momentum lookback.
    pub insufficient_history: Vec<String>,
    /// Every scored symbol, best first.
    pub ranked: Vec<MomentumScore>,
    /// Symbols kept by the top-fraction cut.
    pub shortlisted: Vec<String>,
    pub filtered: Vec<FilteredSymbol>,
    /// Shortlisted symbols that passed the filters but matched no setup.
    pub no_setup: Vec<String>,
    pub candidates: Vec<AlphaCandidate>,
}

enum Screen {
    Candidate(AlphaCandidate),
    Filtered(FilterVerdict),
    NoSetup,
}

/// Runs Alpha scans with a fixed configuration.
pub struct AlphaScanner {
    config: ScanConfig,
    parallel: bool,
}

impl AlphaScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: config.clone(),
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn scan(&self, universe: &LoadedUniverse) -> AlphaReport {
        info!(symbols = universe.len(), "alpha scan started");
        let mut report = AlphaReport {
            as_of: universe.series.iter().filter_map(|s| s.last_date()).max(),
            universe_size: universe.len(),
            ..AlphaReport::default()
        };

        let (eligible, excluded) = self.config.universe.apply(&universe.series, &universe.info);
        report.excluded = excluded
            .into_iter()
            .map(|(symbol, exclusion)| ExcludedSymbol { symbol, exclusion })
            .collect();

        let momentum = &self.config.momentum;
        let score_one = |s: &&PriceSeries| score(s, momentum.lookback_months, momentum.skip_months);
        let scores: Vec<MomentumScore> = if self.parallel {
            eligible.par_iter().map(score_one).collect()
        } else {
            eligible.iter().map(score_one).collect()
        };

        let (sufficient, insufficient): (Vec<_>, Vec<_>) =
            scores.into_iter().partition(|s| s.sufficient_history);
        for s in &insufficient {
            warn!(
                symbol = %s.symbol,
                months = s.months_available,
                required = momentum.lookback_months + momentum.skip_months,
                "insufficient history for momentum, excluded from ranking"
            );
        }
        report.insufficient_history = insufficient.into_iter().map(|s| s.symbol).collect();

        report.ranked = rank(sufficient);
        let top = top_percentile(&report.ranked, momentum.top_fraction);
        report.shortlisted = top.iter().map(|s| s.symbol.clone()).collect();
        info!(
            ranked = report.ranked.len(),
            shortlisted = top.len(),
            "momentum ranking done"
        );

        let by_symbol: HashMap<&str, &PriceSeries> =
            eligible.iter().map(|s| (s.symbol(), *s)).collect();
        let screen_one = |m: &MomentumScore| {
            let outcome = by_symbol
                .get(m.symbol.as_str())
                .map_or(Screen::NoSetup, |series| self.screen(series, m));
            (m.symbol.clone(), outcome)
        };
        let screened: Vec<(String, Screen)> = if self.parallel {
            top.par_iter().map(screen_one).collect()
        } else {
            top.iter().map(screen_one).collect()
        };

        for (symbol, outcome) in screened {
            match outcome {
                Screen::Candidate(c) => report.candidates.push(c),
                Screen::Filtered(verdict) => report.filtered.push(FilteredSymbol { symbol, verdict }),
                Screen::NoSetup => report.no_setup.push(symbol),
            }
        }

        report
            .candidates
            .sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        info!(candidates = report.candidates.len(), "alpha scan complete");
        report
    }

    fn screen(&self, series: &PriceSeries, momentum: &MomentumScore) -> Screen {
        let indicators = IndicatorSet::compute(series, &self.config.indicators);
        let (Some(snapshot), Some(last)) = (indicators.latest(), series.last()) else {
            return Screen::Filtered(FilterVerdict::InsufficientData);
        };

        let verdict = self.config.filters.evaluate(last.close, &snapshot);
        if !verdict.passed() {
            debug!(symbol = series.symbol(), ?verdict, "failed technical filters");
            return Screen::Filtered(verdict);
        }

        let setup = classify_latest(series.bars(), &indicators, &self.config.setup);
        if setup.is_none() {
            debug!(symbol = series.symbol(), "no setup");
            return Screen::NoSetup;
        }
        debug!(symbol = series.symbol(), %setup, confidence = setup.confidence(), "setup detected");

        Screen::Candidate(AlphaCandidate {
            symbol: series.symbol().to_string(),
            momentum_score: momentum.score,
            setup,
            confidence: setup.confidence(),
            latest_price: last.close,
            sma_short: snapshot.sma_short,
            sma_long: snapshot.sma_long,
            rsi: snapshot.rsi,
            date: last.date,
        })
    }
}
