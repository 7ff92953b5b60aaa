//! Transactions command - merged, date-sorted transactions across institutions

use anyhow::Result;
use coinpurse_core::Transaction;
use comfy_table::Cell;
use serde::Serialize;

use super::{connect, ConnectionArgs};
use crate::output::{self, OutputFormat};

/// Flat row for CSV export
#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    institution: &'a str,
    name: &'a str,
    merchant_name: &'a str,
    amount: String,
    category: String,
    city: &'a str,
    region: &'a str,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            date: tx.date.to_string(),
            institution: &tx.institution,
            name: &tx.name,
            merchant_name: tx.merchant_name.as_deref().unwrap_or(""),
            amount: tx.amount.to_string(),
            category: tx.category.join(" > "),
            city: tx.location.city.as_deref().unwrap_or(""),
            region: tx.location.region.as_deref().unwrap_or(""),
        }
    }
}

pub fn run(
    args: &ConnectionArgs,
    since: &str,
    format: OutputFormat,
    concurrent: bool,
) -> Result<()> {
    let aggregator = connect(args, concurrent)?;
    let transactions = aggregator.get_transactions(since)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&transactions)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for tx in &transactions {
                writer.serialize(CsvRow::from(tx))?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if transactions.is_empty() {
                output::warning(&format!("No transactions since {}.", since));
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Date", "Institution", "Description", "Category", "Amount"]);
            for tx in &transactions {
                table.add_row(vec![
                    Cell::new(tx.date),
                    Cell::new(&tx.institution),
                    Cell::new(tx.display_name()),
                    Cell::new(tx.leaf_category().unwrap_or("")),
                    output::format_amount(tx.amount),
                ]);
            }
            println!("{table}");
            output::info(&format!("{} transactions", transactions.len()));
        }
    }

    Ok(())
}
