//! A completed simulated round-trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a simulated position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    SignalReversal,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
            Self::SignalReversal => "signal_reversal",
            Self::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A long round-trip trade: entry → exit.
///
/// Created once by the simulator when a position closes; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    /// Return as a fraction of entry price (0.05 = +5%).
    pub return_pct: f64,
}

impl Trade {
    /// Build a trade, deriving `return_pct` from the two prices.
    pub fn close(
        entry_index: usize,
        entry_date: NaiveDate,
        entry_price: f64,
        exit_index: usize,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let return_pct = if entry_price > 0.0 {
            (exit_price - entry_price) / entry_price
        } else {
            0.0
        };
        Self {
            entry_index,
            entry_date,
            entry_price,
            exit_index,
            exit_date,
            exit_price,
            exit_reason,
            return_pct,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.return_pct < 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }
}
