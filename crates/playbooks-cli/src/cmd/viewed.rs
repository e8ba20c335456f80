use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use playbooks_core::{paths, viewed::ViewedDb};
use std::path::Path;

#[derive(Subcommand)]
pub enum ViewedSubcommand {
    /// List channels whose welcome message has been delivered
    List,
}

pub fn run(root: &Path, subcmd: ViewedSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ViewedSubcommand::List => list(root, json),
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let db = ViewedDb::open(&paths::viewed_db_path(root))
        .context("failed to open viewed database")?;
    let records = db.list()?;

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No channels viewed yet.");
        return Ok(());
    }
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.channel_id.clone(),
                r.viewed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ]
        })
        .collect();
    print_table(&["CHANNEL", "VIEWED AT"], rows);
    Ok(())
}
