//! Human-readable run report.
//!
//! Printed to stdout, separate from the structured log stream. Content
//! mirrors what an operator needs to audit a run: pool context, configured
//! criteria, the outcome, and the discarded-index list.

use crate::config::RaffleCriteria;
use crate::types::{Epoch, PoolMetadata, PoolSummary, RaffleResult};

/// Lovelace per ADA.
pub const LOVELACE: u64 = 1_000_000;

/// Format a lovelace amount as ADA with thousands separators, two decimals.
pub fn format_ada(lovelace: u64) -> String {
    let whole = lovelace / LOVELACE;
    let fraction = (lovelace % LOVELACE) / 10_000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{grouped}.{fraction:02} ₳")
}

/// Print the pool header: identity, metadata, and aggregate figures.
pub fn print_pool_header(
    pool_id: &str,
    summary: &PoolSummary,
    metadata: &PoolMetadata,
    epoch: Epoch,
) {
    println!();
    println!("pool id:         {pool_id}");
    println!("ticker:          {}", metadata.ticker.as_deref().unwrap_or("-"));
    println!("name:            {}", metadata.name.as_deref().unwrap_or("-"));
    println!("homepage:        {}", metadata.homepage.as_deref().unwrap_or("-"));
    println!("latest epoch:    {}", epoch.epoch);
    println!("live delegators: {}", summary.live_delegators);
    println!("live stake:      {}", format_ada(summary.live_stake));
    println!("active stake:    {}", format_ada(summary.active_stake));
}

/// Print the configured criteria.
pub fn print_criteria(criteria: &RaffleCriteria) {
    match criteria.min_stake {
        Some(min) => println!("min stake:       {}", format_ada(min)),
        None => println!("min stake:       none"),
    }
    match criteria.min_epochs {
        Some(min) => println!("min epochs:      {min}"),
        None => println!("min epochs:      none"),
    }
    if criteria.excluded.is_empty() {
        println!("excluded:        none");
    } else {
        let mut excluded: Vec<&str> = criteria.excluded.iter().map(String::as_str).collect();
        excluded.sort_unstable();
        println!("excluded:        {}", excluded.join(", "));
    }
}

/// Print the terminal outcome and the discard audit.
pub fn print_outcome(result: &RaffleResult) {
    println!();
    match &result.winner {
        Some(winner) => {
            println!("selected stake:  {}", winner.delegator.stake_address);
            println!(
                "active stake:    {} since epoch {}",
                format_ada(winner.detail.controlled_amount),
                winner.detail.active_epoch
            );
            if !winner.related_addresses.is_empty() {
                println!();
                println!("associated addresses:");
                for address in &winner.related_addresses {
                    println!("  {address}");
                }
            }
        }
        None => println!("no valid stake addresses found"),
    }

    println!();
    let discarded: Vec<String> = result.discarded.iter().map(|i| i.to_string()).collect();
    println!("discarded [{}]: {}", discarded.len(), discarded.join(", "));
    for attempt in &result.attempts {
        println!(
            "  [{}] {} ({})",
            attempt.index,
            attempt.stake_address,
            attempt.reason.as_str()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ada_groups_thousands() {
        assert_eq!(format_ada(0), "0.00 ₳");
        assert_eq!(format_ada(1_000_000), "1.00 ₳");
        assert_eq!(format_ada(1_234_567_890_000), "1,234,567.89 ₳");
        assert_eq!(format_ada(999_999), "0.99 ₳");
    }

    #[test]
    fn format_ada_truncates_to_two_decimals() {
        // 1.239999 ADA renders as 1.23, not 1.24
        assert_eq!(format_ada(1_239_999), "1.23 ₳");
    }
}
