//! Momentum Core: indicators, momentum scoring, setup detection, trade
//! simulation, risk analysis and the quality gate.
//!
//! Everything here is a pure function of its inputs:
//! - Domain types (bars, validated price series, trades)
//! - Indicator engine (SMA, Wilder RSI, volume average)
//! - 12-1 momentum scorer with ranking and top-fraction selection
//! - Setup classifier with fixed detector priority
//! - Flat/Long trade simulator driven by a signal rule
//! - Drawdown and volatility statistics
//! - Fixed-threshold quality gate
//!
//! No I/O, logging or configuration files live in this crate.

pub mod domain;
pub mod filters;
pub mod gate;
pub mod indicators;
pub mod momentum;
pub mod risk;
pub mod setup;
pub mod signal;
pub mod simulator;
