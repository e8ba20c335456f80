use anyhow::Context;
use playbooks_core::{config::Config, io, paths, viewed::ViewedDb};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing Playbooks automation in: {}", root.display());

    let dir = paths::playbooks_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    let db_path = paths::viewed_db_path(root);
    let existed = db_path.exists();
    ViewedDb::open(&db_path).context("failed to open viewed database")?;
    if existed {
        println!("  exists:  {}", paths::VIEWED_DB_FILE);
    } else {
        println!("  created: {}", paths::VIEWED_DB_FILE);
    }

    Ok(())
}
