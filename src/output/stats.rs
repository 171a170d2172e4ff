//! Human-readable run summary

use crate::output::aggregator::ResultSet;

/// Prints the run summary to stdout
///
/// # Arguments
///
/// * `result` - The finished result set
pub fn print_summary(result: &ResultSet) {
    let summary = &result.summary;

    println!("=== Resolution Summary ===\n");

    println!("Overview:");
    println!("  Submitted: {}", summary.submitted);
    println!("  Resolved: {}", summary.resolved);
    println!("  Unresolved: {}", summary.unresolved);
    println!("  Failed: {}", summary.failed);
    if summary.duplicates > 0 {
        println!("  Duplicate records dropped: {}", summary.duplicates);
    }
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    if !result.failures.is_empty() {
        println!("Failures ({}):", result.failures.len());
        for failure in result.failures.iter().take(20) {
            println!(
                "  - {} ({} attempt(s)): {}",
                failure.identifier, failure.attempts, failure.error
            );
        }
        if result.failures.len() > 20 {
            println!("  ... and {} more", result.failures.len() - 20);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} identifiers resolved)",
        summary.success_rate(),
        summary.resolved,
        summary.submitted
    );
}
