//! Quality gate: fixed-threshold checks over simulated trade and risk
//! statistics, rolled up into a verdict ("vibe").
//!
//! Every check always runs so the suggestion list is exhaustive. A failing
//! drawdown or sample-size check rejects outright; any other failure makes
//! the verdict conditional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::risk::DrawdownStats;
use crate::simulator::TradeStats;

/// Individual gate checks, in declared evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Drawdown,
    WinRate,
    SampleSize,
    ProfitFactor,
}

impl Check {
    pub const ALL: [Check; 4] = [
        Check::Drawdown,
        Check::WinRate,
        Check::SampleSize,
        Check::ProfitFactor,
    ];

    /// Failing this check rejects the candidate regardless of the others.
    pub fn is_disqualifying(&self) -> bool {
        matches!(self, Check::Drawdown | Check::SampleSize)
    }

    /// Remediation hint attached when this check fails.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Check::Drawdown => "Drawdown too deep: tighten the stop loss (e.g. 10% to 7%).",
            Check::WinRate => {
                "Win rate too low: require a stronger setup or lower the RSI ceiling before entry."
            }
            Check::SampleSize => "Too few trades: extend the backtest period to 5+ years.",
            Check::ProfitFactor => {
                "Profit factor too low: raise the profit target (e.g. 20% to 25%)."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Check::Drawdown => "drawdown",
            Check::WinRate => "win_rate",
            Check::SampleSize => "sample_size",
            Check::ProfitFactor => "profit_factor",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate verdict. Ordered by severity: `Approved < Conditional < Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vibe {
    Approved,
    Conditional,
    Rejected,
}

impl Vibe {
    pub fn label(&self) -> &'static str {
        match self {
            Vibe::Approved => "APPROVED",
            Vibe::Conditional => "CONDITIONAL",
            Vibe::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds; drawdown in percent, win rate as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    pub max_drawdown_pct: f64,
    pub min_win_rate: f64,
    pub min_trades: usize,
    pub min_profit_factor: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            max_drawdown_pct: 15.0,
            min_win_rate: 0.60,
            min_trades: 5,
            min_profit_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub observed: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaVerdict {
    pub vibe: Vibe,
    pub checks: BTreeMap<Check, CheckOutcome>,
    /// One entry per failing check, in declared check order.
    pub suggestions: Vec<String>,
}

impl QaVerdict {
    pub fn passed(&self, check: Check) -> bool {
        self.checks.get(&check).is_some_and(|o| o.passed)
    }

    pub fn failed_checks(&self) -> Vec<Check> {
        Check::ALL
            .into_iter()
            .filter(|c| !self.passed(*c))
            .collect()
    }
}

impl GateThresholds {
    /// Run one check. NaN observations fail.
    pub fn check(&self, check: Check, stats: &TradeStats, drawdown: &DrawdownStats) -> CheckOutcome {
        let (observed, threshold, passed) = match check {
            Check::Drawdown => {
                let dd = drawdown.max_drawdown_pct.abs();
                (dd, self.max_drawdown_pct, dd <= self.max_drawdown_pct)
            }
            Check::WinRate => (
                stats.win_rate,
                self.min_win_rate,
                stats.win_rate >= self.min_win_rate,
            ),
            Check::SampleSize => (
                stats.trade_count as f64,
                self.min_trades as f64,
                stats.trade_count >= self.min_trades,
            ),
            Check::ProfitFactor => (
                stats.profit_factor,
                self.min_profit_factor,
                stats.profit_factor >= self.min_profit_factor,
            ),
        };
        CheckOutcome {
            passed,
            observed,
            threshold,
        }
    }
}

/// Evaluate all checks and derive the verdict.
pub fn evaluate(
    stats: &TradeStats,
    drawdown: &DrawdownStats,
    thresholds: &GateThresholds,
) -> QaVerdict {
    let checks: BTreeMap<Check, CheckOutcome> = Check::ALL
        .iter()
        .map(|&c| (c, thresholds.check(c, stats, drawdown)))
        .collect();

    let failed: Vec<Check> = Check::ALL
        .into_iter()
        .filter(|c| !checks[c].passed)
        .collect();

    let vibe = if failed.is_empty() {
        Vibe::Approved
    } else if failed.iter().any(Check::is_disqualifying) {
        Vibe::Rejected
    } else {
        Vibe::Conditional
    };

    let suggestions = failed.iter().map(|c| c.suggestion().to_string()).collect();

    QaVerdict {
        vibe,
        checks,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(win_rate: f64, trade_count: usize, profit_factor: f64) -> TradeStats {
        TradeStats {
            trade_count,
            win_rate,
            profit_factor,
            ..TradeStats::default()
        }
    }

    fn dd(max_drawdown_pct: f64) -> DrawdownStats {
        DrawdownStats {
            max_drawdown_pct,
            ..DrawdownStats::default()
        }
    }

    #[test]
    fn all_pass_is_approved() {
        let v = evaluate(&stats(0.65, 10, 2.0), &dd(10.0), &GateThresholds::default());
        assert_eq!(v.vibe, Vibe::Approved);
        assert!(v.suggestions.is_empty());
        assert_eq!(v.checks.len(), 4);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let v = evaluate(&stats(0.60, 5, 1.5), &dd(15.0), &GateThresholds::default());
        assert_eq!(v.vibe, Vibe::Approved);
    }

    #[test]
    fn soft_failures_are_conditional() {
        let v = evaluate(&stats(0.40, 10, 1.2), &dd(10.0), &GateThresholds::default());
        assert_eq!(v.vibe, Vibe::Conditional);
        assert_eq!(v.failed_checks(), vec![Check::WinRate, Check::ProfitFactor]);
        assert_eq!(
            v.suggestions,
            vec![
                Check::WinRate.suggestion().to_string(),
                Check::ProfitFactor.suggestion().to_string()
            ]
        );
    }

    #[test]
    fn deep_drawdown_rejects() {
        let v = evaluate(&stats(0.90, 20, 5.0), &dd(15.01), &GateThresholds::default());
        assert_eq!(v.vibe, Vibe::Rejected);
        assert_eq!(v.failed_checks(), vec![Check::Drawdown]);
    }

    #[test]
    fn small_sample_rejects() {
        let v = evaluate(&stats(1.0, 4, 100.0), &dd(0.0), &GateThresholds::default());
        assert_eq!(v.vibe, Vibe::Rejected);
        assert_eq!(v.suggestions.len(), 1);
    }

    #[test]
    fn every_failure_contributes_a_suggestion() {
        let v = evaluate(&TradeStats::default(), &dd(40.0), &GateThresholds::default());
        assert_eq!(v.vibe, Vibe::Rejected);
        assert_eq!(v.suggestions.len(), 4);
        assert_eq!(v.suggestions[0], Check::Drawdown.suggestion());
    }

    #[test]
    fn nan_drawdown_fails() {
        let v = evaluate(&stats(0.7, 10, 2.0), &dd(f64::NAN), &GateThresholds::default());
        assert!(!v.passed(Check::Drawdown));
        assert_eq!(v.vibe, Vibe::Rejected);
    }

    #[test]
    fn vibe_severity_order() {
        assert!(Vibe::Approved < Vibe::Conditional);
        assert!(Vibe::Conditional < Vibe::Rejected);
        assert_eq!(Vibe::Rejected.to_string(), "REJECTED");
    }

    #[test]
    fn outcome_records_observed_and_threshold() {
        let v = evaluate(&stats(0.5, 7, 1.8), &dd(12.5), &GateThresholds::default());
        let wr = v.checks[&Check::WinRate];
        assert!(!wr.passed);
        assert_eq!(wr.observed, 0.5);
        assert_eq!(wr.threshold, 0.60);
        assert_eq!(v.checks[&Check::SampleSize].observed, 7.0);
    }
}
