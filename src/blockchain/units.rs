//! Wei/ether/gwei conversions for display and configuration.

use alloy::primitives::utils::{format_units, UnitsError};
use alloy::primitives::{I256, U256};

/// Format a wei amount as whole ether, without trailing zeros ("2.5", "0.0").
pub fn format_ether(wei: U256) -> String {
    trim_decimal(alloy::primitives::utils::format_ether(wei))
}

/// Format a signed wei delta with an explicit sign ("+1.5", "-0.000021").
pub fn format_ether_signed(delta: I256) -> String {
    let sign = if delta.is_negative() { '-' } else { '+' };
    format!("{}{}", sign, format_ether(delta.unsigned_abs()))
}

/// Format a wei gas price in gwei.
pub fn format_gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei")
        .map(trim_decimal)
        .unwrap_or_else(|_| format!("{} wei", wei))
}

/// Parse a decimal ether string into wei.
pub fn parse_ether(eth: &str) -> Result<U256, UnitsError> {
    alloy::primitives::utils::parse_ether(eth.trim())
}

/// Convert whole gwei to wei.
pub fn gwei_to_wei(gwei: u64) -> u128 {
    gwei as u128 * 1_000_000_000
}

fn trim_decimal(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}
