//! Plain-text summaries for the terminal.

use momentum_core::gate::Vibe;

use crate::alpha::AlphaReport;
use crate::pipeline::ScanReport;
use crate::qa::QaReport;

/// Percentage of reports that were not rejected. 0.0 for an empty slice.
pub fn pass_rate(reports: &[QaReport]) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    let passed = reports.iter().filter(|r| r.vibe() != Vibe::Rejected).count();
    passed as f64 * 100.0 / reports.len() as f64
}

/// Alpha candidates as a table, best first.
pub fn render_alpha(alpha: &AlphaReport) -> String {
    let mut out = String::with_capacity(1024);
    let as_of = alpha
        .as_of
        .map_or_else(|| "n/a".to_string(), |d| d.to_string());
    out.push_str(&format!("ALPHA SCAN (as of {as_of})\n"));
    out.push_str(&format!(
        "  universe {} | excluded {} | short history {} | ranked {} | shortlisted {} | candidates {}\n",
        alpha.universe_size,
        alpha.excluded.len(),
        alpha.insufficient_history.len(),
        alpha.ranked.len(),
        alpha.shortlisted.len(),
        alpha.candidates.len()
    ));
    if alpha.candidates.is_empty() {
        out.push_str("  no candidates\n");
        return out;
    }

    out.push_str(&format!(
        "  {:<8} {:>9} {:<22} {:>6} {:>10} {:>6}\n",
        "symbol", "momentum", "setup", "conf", "price", "rsi"
    ));
    for c in &alpha.candidates {
        out.push_str(&format!(
            "  {:<8} {:>8.1}% {:<22} {:>6.2} {:>10.2} {:>6.1}\n",
            c.symbol,
            c.momentum_score * 100.0,
            c.setup.name(),
            c.confidence,
            c.latest_price,
            c.rsi
        ));
    }
    out
}

/// `SYMBOL: Setup (WR 62.0%)`, or `SYMBOL (WR 62.0%)` outside a scan.
fn headline(r: &QaReport) -> String {
    let win = r.stats.win_rate * 100.0;
    match &r.candidate {
        Some(c) => format!("{}: {} (WR {win:.1}%)", r.symbol, c.setup.name()),
        None => format!("{} (WR {win:.1}%)", r.symbol),
    }
}

/// QA outcome summary: totals per vibe, pass rate, approved and rejected lists.
pub fn render_summary(reports: &[QaReport]) -> String {
    let count = |vibe: Vibe| reports.iter().filter(|r| r.vibe() == vibe).count();
    let mut out = String::with_capacity(1024);

    out.push_str("QA VALIDATION REPORT\n");
    out.push_str(&format!("  evaluated:   {}\n", reports.len()));
    out.push_str(&format!("  approved:    {}\n", count(Vibe::Approved)));
    out.push_str(&format!("  conditional: {}\n", count(Vibe::Conditional)));
    out.push_str(&format!("  rejected:    {}\n", count(Vibe::Rejected)));
    out.push_str(&format!("  pass rate:   {:.1}%\n", pass_rate(reports)));

    for (title, vibe) in [
        ("Approved", Vibe::Approved),
        ("Conditional", Vibe::Conditional),
    ] {
        let group: Vec<&QaReport> = reports.iter().filter(|r| r.vibe() == vibe).collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{title}:\n"));
        for r in group {
            out.push_str(&format!("  {}\n", headline(r)));
            let momentum = r
                .candidate
                .map_or_else(String::new, |c| format!("momentum {:+.1}% | ", c.momentum_score * 100.0));
            out.push_str(&format!(
                "    {momentum}trades {} | pf {:.2} | max dd {:.1}% | return {:+.1}%\n",
                r.stats.trade_count,
                r.stats.profit_factor,
                r.drawdown.max_drawdown_pct,
                r.total_return * 100.0
            ));
        }
    }

    let rejected: Vec<&QaReport> = reports
        .iter()
        .filter(|r| r.vibe() == Vibe::Rejected)
        .collect();
    if !rejected.is_empty() {
        out.push_str("\nRejected:\n");
        for r in rejected {
            let reason = r
                .verdict
                .suggestions
                .first()
                .map_or("", String::as_str);
            out.push_str(&format!("  {:<8} {reason}\n", r.symbol));
        }
    }
    out
}

/// Alpha table followed by the QA summary.
pub fn render_scan(report: &ScanReport) -> String {
    let mut out = render_alpha(&report.alpha);
    if !report.load_failures.is_empty() {
        out.push_str(&format!("  failed to load: {}\n", report.load_failures.len()));
    }
    out.push('\n');
    out.push_str(&render_summary(&report.qa));
    out
}
