//! Trade simulator: a two-state (Flat/Long) machine replayed bar by bar.
//!
//! Entries fill at the open of the bar after the entry signal, never at the
//! signal bar's close. While long, every bar from the fill bar on is
//! checked in a fixed order: stop, then target, then signal reversal. A position still open
//! when the data runs out is closed at the final close, so every entry
//! yields exactly one [`Trade`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, ExitReason, PriceSeries, Trade};
use crate::indicators::IndicatorSet;
use crate::signal::{Signal, SignalRule};

/// Profit factor reported when there are winners but no losers.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Protective exits and account size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Stop distance below entry, as a fraction (0.10 = 10%).
    pub stop_loss_pct: f64,
    /// Target distance above entry, as a fraction.
    pub take_profit_pct: f64,
    pub initial_capital: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.10,
            take_profit_pct: 0.20,
            initial_capital: 10_000.0,
        }
    }
}

/// An open long position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
}

impl OpenPosition {
    fn close(&self, index: usize, date: NaiveDate, price: f64, reason: ExitReason) -> Trade {
        Trade::close(
            self.entry_index,
            self.entry_date,
            self.entry_price,
            index,
            date,
            price,
            reason,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long(OpenPosition),
}

/// Everything the transition needs to know about the current bar.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar: &'a Bar,
    pub index: usize,
    /// Entry rule fired on the previous bar.
    pub entry_signal: bool,
    /// Exit rule fired on this bar.
    pub exit_signal: bool,
}

/// Pure state transition for one bar.
///
/// A fill and an exit can happen on the same bar: the entry price is the
/// open, so the stop, target and exit signal already apply to that bar's
/// range and close.
pub fn step(
    state: PositionState,
    ctx: &BarContext<'_>,
    config: &SimulatorConfig,
) -> (PositionState, Option<Trade>) {
    let bar = ctx.bar;
    let pos = match state {
        PositionState::Flat if ctx.entry_signal => {
            let entry_price = bar.open;
            OpenPosition {
                entry_index: ctx.index,
                entry_date: bar.date,
                entry_price,
                stop_price: entry_price * (1.0 - config.stop_loss_pct),
                target_price: entry_price * (1.0 + config.take_profit_pct),
            }
        }
        PositionState::Flat => return (PositionState::Flat, None),
        PositionState::Long(pos) => pos,
    };

    let exit = if bar.low <= pos.stop_price {
        Some((pos.stop_price, ExitReason::StopLoss))
    } else if bar.high >= pos.target_price {
        Some((pos.target_price, ExitReason::TakeProfit))
    } else if ctx.exit_signal {
        Some((bar.close, ExitReason::SignalReversal))
    } else {
        None
    };
    match exit {
        Some((price, reason)) => (
            PositionState::Flat,
            Some(pos.close(ctx.index, bar.date, price, reason)),
        ),
        None => (PositionState::Long(pos), None),
    }
}

/// Force-close a position left open at the end of data.
pub fn finish(state: PositionState, last: &Bar, last_index: usize) -> Option<Trade> {
    match state {
        PositionState::Flat => None,
        PositionState::Long(pos) => Some(pos.close(
            last_index,
            last.date,
            last.close,
            ExitReason::EndOfData,
        )),
    }
}

/// Account value at the close of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Output of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    /// Entry signals emitted by the rule, taken or not.
    pub signal_count: usize,
    pub bar_count: usize,
}

impl BacktestResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |p| p.equity)
    }

    /// Total return of the account as a fraction.
    pub fn total_return(&self) -> f64 {
        if self.initial_capital <= 0.0 {
            return 0.0;
        }
        self.final_equity() / self.initial_capital - 1.0
    }
}

/// Replay `series` under `rule`.
///
/// The rule is not consulted before its `warmup_bars`. The account is fully invested while long and in cash while flat.
pub fn simulate(
    series: &PriceSeries,
    indicators: &IndicatorSet,
    rule: &dyn SignalRule,
    config: &SimulatorConfig,
) -> BacktestResult {
    let bars = series.bars();
    let warmup = rule.warmup_bars();
    let signals: Vec<Option<Signal>> = (0..bars.len())
        .map(|i| {
            if i < warmup {
                None
            } else {
                rule.evaluate(bars, i, indicators)
            }
        })
        .collect();
    let signal_count = signals
        .iter()
        .filter(|s| matches!(s, Some(Signal::Enter)))
        .count();

    let mut state = PositionState::Flat;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut cash = config.initial_capital;

    for (index, bar) in bars.iter().enumerate() {
        let ctx = BarContext {
            bar,
            index,
            entry_signal: index > 0 && signals[index - 1] == Some(Signal::Enter),
            exit_signal: signals[index] == Some(Signal::Exit),
        };
        let (next, closed) = step(state, &ctx, config);
        if let Some(trade) = closed {
            cash *= trade.exit_price / trade.entry_price;
            trades.push(trade);
        }
        let equity = match next {
            PositionState::Long(pos) => cash * bar.close / pos.entry_price,
            PositionState::Flat => cash,
        };
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity,
        });
        state = next;
    }

    if let Some((last_index, last)) = bars.iter().enumerate().last() {
        if let Some(trade) = finish(state, last, last_index) {
            trades.push(trade);
        }
    }

    BacktestResult {
        symbol: series.symbol().to_string(),
        trades,
        equity_curve,
        initial_capital: config.initial_capital,
        signal_count,
        bar_count: bars.len(),
    }
}

/// Summary statistics over closed trades. Returns are fractions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeStats {
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winners / total, as a fraction.
    pub win_rate: f64,
    /// Gross profit over gross loss. [`PROFIT_FACTOR_CAP`] when there are
    /// winners and no losers, 0 when there are no winners.
    pub profit_factor: f64,
    pub average_return: f64,
    pub avg_win: f64,
    /// Mean of losing returns (negative).
    pub avg_loss: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_return: f64,
}

/// Aggregate a trade list. An empty list yields all zeros.
pub fn analyze_trades(trades: &[Trade]) -> TradeStats {
    if trades.is_empty() {
        return TradeStats::default();
    }

    let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();
    let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();

    let gross_profit: f64 = wins.iter().sum();
    let gross_loss: f64 = losses.iter().map(|r| r.abs()).sum();
    let profit_factor = if gross_loss < 1e-12 {
        if gross_profit > 0.0 {
            PROFIT_FACTOR_CAP
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    };

    let net_return: f64 = returns.iter().sum();
    TradeStats {
        trade_count: trades.len(),
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        win_rate: wins.len() as f64 / trades.len() as f64,
        profit_factor,
        average_return: net_return / trades.len() as f64,
        avg_win: mean(&wins),
        avg_loss: mean(&losses),
        gross_profit,
        gross_loss,
        net_return,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
