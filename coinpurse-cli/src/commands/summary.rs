//! Summary command - per-institution totals

use anyhow::Result;
use coinpurse_core::summarize;
use comfy_table::Cell;

use super::{connect, ConnectionArgs};
use crate::output;

pub fn run(args: &ConnectionArgs, since: &str, json: bool) -> Result<()> {
    let aggregator = connect(args, false)?;
    let transactions = aggregator.get_transactions(since)?;
    let summaries = summarize(&transactions);

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        output::warning(&format!("No transactions since {}.", since));
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Institution", "Transactions", "First", "Last", "Net"]);
    for s in &summaries {
        table.add_row(vec![
            Cell::new(&s.institution),
            Cell::new(s.transaction_count),
            Cell::new(s.first_date),
            Cell::new(s.last_date),
            output::format_amount(s.total_amount),
        ]);
    }
    println!("{table}");

    Ok(())
}
