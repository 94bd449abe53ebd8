//! Colored console output for slotbreach.
//!
//! Color scheme: blue+bold headers, cyan values, green success,
//! yellow warnings, red failures, dimmed secondary text.

use alloy_primitives::Address;
use colored::Colorize;
use std::ops::Range;

use crate::exploit::{AttackReport, Extraction};
use crate::layout::{SlotLayout, SlotPlacement};
use crate::onchain::StoredValue;

// ── Helpers ────────────────────────────────────────────────────────

/// Format a byte window as `[start, end)`.
pub fn format_range(range: &Range<usize>) -> String {
    format!("[{}, {})", range.start, range.end)
}

/// Format a placement as `slot 5 @ 0..16`.
pub fn format_placement(placement: &SlotPlacement) -> String {
    let range = placement.byte_range();
    format!("slot {} @ {}..{}", placement.slot, range.start, range.end)
}

/// Yes/no rendering of a lock flag.
fn format_lock(locked: bool) -> colored::ColoredString {
    if locked {
        "locked".yellow()
    } else {
        "unlocked".green()
    }
}

// ── Layout ─────────────────────────────────────────────────────────

/// Print every selector of the layout with its slot, offset and width.
pub fn print_layout(layout: &SlotLayout) {
    println!();
    println!("{}", "=== Storage layout ===".blue().bold());
    println!("  Packing order: {}", format!("{:?}", layout.order).cyan());
    println!(
        "  {:<16} {:>6} {:>7} {:>6}  {}",
        "field".dimmed(),
        "slot".dimmed(),
        "offset".dimmed(),
        "width".dimmed(),
        "visibility".dimmed()
    );
    for field in layout.fields() {
        for (selector, placement) in field.selectors().into_iter().zip(&field.placements) {
            println!(
                "  {:<16} {:>6} {:>7} {:>6}  {}",
                selector.cyan(),
                placement.slot.to_string(),
                placement.offset,
                placement.width,
                field.visibility.to_string().dimmed()
            );
        }
    }
    println!("  Slots used: {}", layout.slot_count().to_string().cyan());
}

// ── Storage reads ──────────────────────────────────────────────────

/// Print a single value read from storage.
pub fn print_extraction(target: &Address, extraction: &Extraction) {
    println!();
    println!("{}", "Storage read:".blue().bold());
    println!("  {} {}", "Contract:".dimmed(), format!("{target}").cyan());
    println!("  {} {}", "Field:   ".dimmed(), extraction.field.cyan());
    println!(
        "  {} {}",
        "Location:".dimmed(),
        format_placement(&extraction.placement).cyan()
    );
    println!("  {} {}", "Word:    ".dimmed(), extraction.word.to_string().dimmed());
    println!(
        "  {} {} {}",
        "Value:   ".dimmed(),
        extraction.value.to_string().green().bold(),
        format!("bytes {}", format_range(&extraction.absolute_range)).dimmed()
    );
}

/// Print every value of a storage dump.
pub fn print_dump(target: &Address, values: &[StoredValue]) {
    println!();
    println!(
        "{} {}",
        "Storage of".blue().bold(),
        format!("{target}").cyan()
    );
    for stored in values {
        println!(
            "  {:<16} {:<22} {}",
            stored.selector.cyan(),
            format_placement(&stored.placement).dimmed(),
            stored.value
        );
    }
}

// ── Attack ─────────────────────────────────────────────────────────

/// Print the outcome of a successful attack.
pub fn print_report(report: &AttackReport) {
    println!();
    println!("{}", "=== Target unlocked ===".green().bold());
    println!("  {} {}", "Target:  ".dimmed(), format!("{}", report.target).cyan());
    println!("  {} {}", "Attacker:".dimmed(), format!("{}", report.attacker).cyan());
    println!("  {} {}", "Via:     ".dimmed(), report.unlocker.cyan());
    println!(
        "  {} {} from {}",
        "Key:     ".dimmed(),
        report.extraction.value.to_string().green(),
        format_placement(&report.extraction.placement).dimmed()
    );
    println!("  {} {}", "Tx:      ".dimmed(), format!("{}", report.tx_hash).dimmed());
    println!(
        "  {} {} -> {}",
        "Lock:    ".dimmed(),
        format_lock(report.lock_before),
        format_lock(report.lock_after)
    );
}

/// Print a failed attack.
pub fn print_attack_failed(target: &Address, reason: &str) {
    println!();
    println!(
        "  {} {} {}",
        "FAILED".red().bold(),
        format!("{target}").cyan(),
        reason
    );
}

// ── Demo ───────────────────────────────────────────────────────────

/// Print the deployment step of the demo.
pub fn print_deployed(name: &str, address: &Address, by: &Address) {
    println!(
        "  {} {} at {} by {}",
        "DEPLOYED".green().bold(),
        name.cyan(),
        format!("{address}").cyan(),
        format!("{by}").dimmed()
    );
}

/// Print the private values the target was constructed with.
pub fn print_secret(index: usize, value: &str) {
    println!("    {} {}", format!("data[{index}]").dimmed(), value.dimmed());
}

/// Print a generic informational message.
pub fn print_info(msg: &str) {
    println!("  {} {}", "INFO".blue().bold(), msg);
}

/// Print a warning.
pub fn print_warning(msg: &str) {
    println!("  {} {}", "WARNING:".yellow().bold(), msg);
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_format_range() {
        assert_eq!(format_range(&(0..16)), "[0, 16)");
    }

    #[test]
    fn test_format_placement() {
        let placement = SlotPlacement { slot: U256::from(5), offset: 0, width: 32 };
        assert_eq!(format_placement(&placement), "slot 5 @ 0..32");
        let placement = SlotPlacement { slot: U256::from(2), offset: 2, width: 2 };
        assert_eq!(format_placement(&placement), "slot 2 @ 2..4");
    }

    #[test]
    fn test_print_functions_do_not_panic() {
        let layout = SlotLayout::privacy();
        print_layout(&layout);
        print_attack_failed(&Address::ZERO, "nope");
        print_deployed("Privacy", &Address::ZERO, &Address::ZERO);
        print_secret(2, "0x00");
        print_info("info");
        print_warning("warn");
    }
}
