use stockbook_core::{Field, Source, StoreError, TransactionKind};

use crate::app::AppContext;
use crate::cli::SearchArgs;
use crate::output::{header_line, print_records};

pub fn handle_sources(ctx: &AppContext) -> anyhow::Result<()> {
    for source in ctx.store.sources() {
        println!("{}", source);
    }
    Ok(())
}

pub fn handle_headers(ctx: &AppContext, source: Source) -> anyhow::Result<()> {
    let headers = ctx.store.headers(source)?;
    println!("{}", header_line(&headers));
    Ok(())
}

pub fn handle_list(ctx: &AppContext, source: Source, json: bool) -> anyhow::Result<()> {
    let records = ctx.store.read_all(source)?;
    print_records(&records, json)
}

pub fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let records = ctx.store.search(args.source, args.field, &args.value)?;
    if records.is_empty() && !args.json && !ctx.quiet {
        eprintln!("No matching records.");
        return Ok(());
    }
    print_records(&records, args.json)
}

pub fn handle_add(
    ctx: &mut AppContext,
    description: &str,
    unit_price: &str,
    qty_in_stock: &str,
) -> anyhow::Result<()> {
    let values = vec![
        description.to_string(),
        unit_price.to_string(),
        qty_in_stock.to_string(),
    ];
    let added = ctx
        .store
        .add_record(&values, Source::Items, TransactionKind::Added)?;
    if !added {
        return Err(anyhow::anyhow!("Nothing to add"));
    }

    if !ctx.quiet {
        match ctx.store.ids()?.last() {
            Some(id) => println!("Added item {}", id),
            None => println!("Added item"),
        }
    }
    Ok(())
}

pub fn handle_update(
    ctx: &mut AppContext,
    id: &str,
    field: Field,
    value: &str,
) -> anyhow::Result<()> {
    ctx.store.update_record(id, field, value)?;
    if !ctx.quiet {
        println!("Updated {} of item {}", field, id);
    }
    Ok(())
}

pub fn handle_delete(ctx: &mut AppContext, id: &str) -> anyhow::Result<()> {
    match ctx.store.delete_record(id) {
        Ok(()) => {
            if !ctx.quiet {
                println!("Deleted item {}", id);
            }
            Ok(())
        }
        Err(StoreError::NotFound(id)) => Err(anyhow::anyhow!("No item with id {}", id)),
        Err(err) => Err(err.into()),
    }
}

pub fn handle_next_id(ctx: &AppContext) -> anyhow::Result<()> {
    println!("{}", ctx.store.generate_id()?);
    Ok(())
}

pub fn handle_ids(ctx: &AppContext) -> anyhow::Result<()> {
    for id in ctx.store.ids()? {
        println!("{}", id);
    }
    Ok(())
}
