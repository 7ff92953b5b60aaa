//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use rust_decimal::Decimal;

/// Output format for transaction listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an upstream amount for display
///
/// Upstream amounts are positive for outflows, so they are shown negated:
/// money in is positive, money out is negative.
pub fn format_amount(amount: Decimal) -> Cell {
    let rounded = amount.round_dp(2);
    let display = if rounded.is_zero() {
        Decimal::ZERO
    } else {
        -rounded
    };
    let text = format!("{:.2}", display);
    if display < Decimal::ZERO {
        Cell::new(text).fg(Color::Red)
    } else {
        Cell::new(text).fg(Color::Green)
    }
}
