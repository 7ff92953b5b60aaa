//! Institutions command - resolve access tokens to institution names

use std::collections::HashMap;

use anyhow::Result;
use coinpurse_core::OperationResult;

use super::{connect, ConnectionArgs};
use crate::output;

pub fn run(args: &ConnectionArgs, json: bool) -> Result<()> {
    let aggregator = connect(args, false)?;
    let names: Vec<String> = aggregator
        .institutions()
        .into_iter()
        .map(String::from)
        .collect();

    if json {
        let mut context = HashMap::new();
        context.insert("count".to_string(), serde_json::json!(names.len()));
        let result = OperationResult::ok_with_context(names, context);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if names.is_empty() {
        output::warning("No institutions resolved.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["#", "Institution"]);
    for (i, name) in names.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), name.clone()]);
    }
    println!("{table}");

    Ok(())
}
