//! Scenario tests: hand-computed expectations through the public API.

use chrono::{Duration, NaiveDate};

use momentum_core::domain::{Bar, ExitReason, PriceSeries};
use momentum_core::gate::{evaluate, Check, GateThresholds, Vibe};
use momentum_core::indicators::{moving_average, IndicatorConfig, IndicatorSet};
use momentum_core::risk::DrawdownStats;
use momentum_core::setup::{classify, Setup, SetupConfig};
use momentum_core::signal::{MaCrossover, PredicateRule};
use momentum_core::simulator::{analyze_trades, simulate, SimulatorConfig};

fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(i as i64),
        open,
        high,
        low,
        close,
        volume: 1_000,
    }
}

fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
    (0..n).map(|i| bar(i, price, price, price, price)).collect()
}

#[test]
fn flat_series_long_average_is_exact() {
    let series = PriceSeries::new("FLAT", flat_bars(5, 100.0)).unwrap();
    let sma = moving_average(&series, 3);
    assert_eq!(sma[2], 100.0);
}

#[test]
fn stop_hit_before_target_exits_at_stop() {
    // Signal on bar 0, fill at bar 1 open = 100. Stop 98, target 105.
    let bars = vec![
        bar(0, 99.0, 100.0, 98.5, 99.5),
        bar(1, 100.0, 101.0, 99.0, 100.5),
        bar(2, 100.5, 102.0, 99.5, 101.0),
        bar(3, 101.0, 101.5, 97.0, 97.5),
        bar(4, 97.5, 106.0, 97.0, 105.5),
    ];
    let series = PriceSeries::new("STOP", bars).unwrap();
    let rule = PredicateRule::new("bar0", |_, i, _| i == 0, |_, _, _| false);
    let config = SimulatorConfig {
        stop_loss_pct: 0.02,
        take_profit_pct: 0.05,
        initial_capital: 10_000.0,
    };
    let result = simulate(&series, &IndicatorSet::default(), &rule, &config);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, 100.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert!((trade.exit_price - 98.0).abs() < 1e-9);
    assert_eq!(trade.exit_index, 3);
    assert!((result.final_equity() - 9_800.0).abs() < 1e-6);
}

#[test]
fn stop_breached_on_fill_bar_exits_same_bar() {
    // Signal on bar 0, fill at bar 1 open = 100, stop 90. Bar 1 trades down
    // to 80 and the exit rule fires on its close.
    let bars = vec![
        bar(0, 99.0, 100.0, 98.5, 99.5),
        bar(1, 100.0, 100.5, 80.0, 85.0),
        bar(2, 85.0, 96.0, 84.5, 95.0),
        bar(3, 95.0, 96.0, 94.5, 95.5),
    ];
    let series = PriceSeries::new("GAP", bars).unwrap();
    let rule = PredicateRule::new("bar0", |_, i, _| i == 0, |_, i, _| i == 1);
    let config = SimulatorConfig {
        stop_loss_pct: 0.10,
        take_profit_pct: 0.20,
        initial_capital: 10_000.0,
    };
    let result = simulate(&series, &IndicatorSet::default(), &rule, &config);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_index, 1);
    assert_eq!(trade.exit_index, 1);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert!((trade.exit_price - 90.0).abs() < 1e-9);
    // Flat in cash from the fill bar on.
    assert!((result.equity_curve[1].equity - 9_000.0).abs() < 1e-6);
    assert!((result.final_equity() - 9_000.0).abs() < 1e-6);
}

#[test]
fn staircase_beats_bounce_by_priority() {
    let bars = vec![
        bar(0, 100.0, 100.0, 100.0, 100.0),
        bar(1, 100.0, 100.0, 99.0, 99.0),
        bar(2, 99.0, 102.0, 99.0, 102.0),
    ];
    let indicators = IndicatorSet {
        sma_short: vec![100.5, 100.5, 101.0],
        sma_long: vec![100.0, 100.0, 100.0],
        rsi: vec![50.0; 3],
        volume_avg: vec![1_000.0; 3],
    };
    let setup = classify(&bars, &indicators, 2, &SetupConfig::default());
    assert!(matches!(setup, Setup::GoldenStaircase { .. }));

    let wide = IndicatorSet {
        sma_short: vec![105.0],
        sma_long: vec![100.0],
        rsi: vec![50.0],
        volume_avg: vec![1_000.0],
    };
    let setup = classify(&[bar(0, 110.0, 110.0, 110.0, 110.0)], &wide, 0, &SetupConfig::default());
    assert!(matches!(setup, Setup::GoldenStaircase { .. }));
    assert!(setup.confidence() > 0.0);
}

#[test]
fn drawdown_peak_trough_recovery() {
    let curve = [100.0, 92.0, 85.0, 90.0, 96.0, 100.0, 103.0];
    let stats = DrawdownStats::from_curve(&curve);
    assert_eq!(stats.max_drawdown_pct, 15.0);
    assert_eq!(stats.recovery_time_days, Some(3));
}

#[test]
fn empty_trade_list_is_all_zero() {
    let stats = analyze_trades(&[]);
    assert_eq!(stats.trade_count, 0);
    assert_eq!(stats.win_rate, 0.0);
    assert_eq!(stats.profit_factor, 0.0);
}

/// Oscillating trend: averages cross several times, every position closes.
#[test]
fn crossover_pipeline_end_to_end() {
    let bars: Vec<Bar> = (0..400)
        .map(|i| {
            let close = 100.0 + 20.0 * (i as f64 / 25.0).sin() + i as f64 * 0.05;
            let open = close - 0.2;
            bar(i, open, close + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    let series = PriceSeries::new("WAVE", bars).unwrap();
    let config = IndicatorConfig {
        short_window: 5,
        long_window: 20,
        rsi_window: 14,
        volume_window: 20,
    };
    let indicators = IndicatorSet::compute(&series, &config);
    let sim = SimulatorConfig::default();
    let result = simulate(&series, &indicators, &MaCrossover::new(5, 20), &sim);

    assert!(result.signal_count >= 2, "expected several golden crosses");
    assert!(!result.trades.is_empty());
    for trade in &result.trades {
        assert!(trade.exit_index >= trade.entry_index);
        // Entries fill at the open of the bar after the signal.
        assert_eq!(trade.entry_price, series.bars()[trade.entry_index].open);
    }

    let stats = analyze_trades(&result.trades);
    let drawdown = DrawdownStats::from_curve(&result.equity_values());
    let verdict = evaluate(&stats, &drawdown, &GateThresholds::default());
    assert_eq!(verdict.checks.len(), Check::ALL.len());
    assert_eq!(verdict.vibe == Vibe::Approved, verdict.suggestions.is_empty());
}
