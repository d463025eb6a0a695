//! Output formatting helpers for the CLI.

use stockbook_core::{Field, Record};

/// Print records one per line, or as a JSON array.
pub fn print_records(records: &[Record], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    for record in records {
        println!("{}", record);
    }
    Ok(())
}

pub fn header_line(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| field.name())
        .collect::<Vec<_>>()
        .join(",")
}
