//! Console presentation of a completed scan.

use crate::core::error::Result;
use crate::core::session::SessionOutcome;
use crate::ui::cli::OutputFormat;

/// Print a session outcome in the requested format.
pub fn print_outcome(outcome: &SessionOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.bundle)?);
        }
        OutputFormat::Text => print_text(outcome),
    }
    Ok(())
}

fn print_text(outcome: &SessionOutcome) {
    let bundle = &outcome.bundle;

    println!();
    println!("Scan completed ({})", bundle.computer_name);
    println!("=====================================");
    println!("Risk score:        {}/99 ({})", bundle.risk_score, bundle.risk_level);
    println!("Suspicious files:  {}", bundle.scanned_files.len());
    println!("Recycle entries:   {}", bundle.recycle_entries.len());
    println!(
        "Accounts:          {} ({} banned)",
        bundle.accounts.len(),
        bundle.banned_account_count()
    );

    if !bundle.detected_signatures.is_empty() {
        println!();
        println!("Known signatures detected:");
        for m in &bundle.detected_signatures {
            println!("  {} - {} ({})", m.signature_name, m.file_name, m.matched_on);
        }
    }

    if !bundle.views.most_suspicious.is_empty() {
        println!();
        println!("Most suspicious files:");
        for digest in &bundle.views.most_suspicious {
            let when = digest
                .timestamp
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            println!("  {} ({})", digest.file_name, when);
        }
    }

    println!();
    println!("Reports:");
    println!("  {}", outcome.suspicious_report_path.display());
    println!("  {}", outcome.recycle_report_path.display());

    match &outcome.delivery {
        Some(report) if report.all_succeeded() => {
            println!("Delivery:          all evidence kinds sent");
        }
        Some(report) => {
            println!("Delivery:          FAILED for {:?}", report.failed_kinds());
            for kind in &report.kinds {
                if let Some(err) = &kind.error {
                    println!("  {}: {} ({}/{} chunks sent)", kind.kind, err, kind.chunks_sent, kind.chunks_total);
                }
            }
        }
        None => {
            println!("Delivery:          disabled");
        }
    }
}
