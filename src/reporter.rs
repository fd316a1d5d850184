use std::collections::BTreeMap;

use colored::Colorize;
use prettytable::{Table, row};

use crate::catalog::DenialCategory;
use crate::pipeline::RunReport;
use crate::summary::DenialSummary;

/// Realized rates within this distance of their target are shown as on target.
const TOLERANCE: f64 = 0.02;

/// Prints the end-of-run summary: files written, denial rate and reason mix.
pub fn print_run_report(report: &RunReport, targets: &BTreeMap<DenialCategory, f64>) {
    println!("\n{}", "--- Generated tables ---".bold());
    tables_table(report).printstd();

    let realized = report.summary.denial_rate();
    println!(
        "\n{} {} (target {:.2}%)",
        "Denial rate:".bold(),
        paint(
            format!("{:.2}%", realized * 100.0),
            realized,
            report.target_denial_rate
        ),
        report.target_denial_rate * 100.0
    );

    println!("\n{}", "--- Denial reasons ---".bold());
    categories_table(&report.summary, targets).printstd();
    println!("Finished in {:.1}s", report.elapsed.as_secs_f64());
}

pub fn print_verification(scanned: &DenialSummary) {
    println!(
        "{} {} claims re-read, {} denied",
        "Verified:".green().bold(),
        scanned.total,
        scanned.denied
    );
}

fn tables_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Table", "Rows", "Files"]);
    for written in &report.tables {
        let files = written
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(row![written.name, r->written.rows, files]);
    }
    table
}

fn categories_table(summary: &DenialSummary, targets: &BTreeMap<DenialCategory, f64>) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Category", "Denials", "Share", "Target"]);
    for (category, share) in summary.category_shares() {
        let count = summary.by_category.get(&category).copied().unwrap_or(0);
        let target = targets.get(&category).copied().unwrap_or(0.0);
        table.add_row(row![
            category,
            r->count,
            r->format!("{:.1}%", share * 100.0),
            r->format!("{:.1}%", target * 100.0)
        ]);
    }
    table
}

fn paint(text: String, realized: f64, target: f64) -> colored::ColoredString {
    if (realized - target).abs() <= TOLERANCE {
        text.green()
    } else {
        text.yellow()
    }
}
