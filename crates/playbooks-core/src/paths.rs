use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PLAYBOOKS_DIR: &str = ".playbooks";
pub const CONFIG_FILE: &str = ".playbooks/config.yaml";
pub const VIEWED_DB_FILE: &str = ".playbooks/viewed.db";

/// Root of the Playbooks plugin REST API on a chat server.
pub const API_PATH: &str = "/plugins/playbooks/api/v0";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn playbooks_dir(root: &Path) -> PathBuf {
    root.join(PLAYBOOKS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn viewed_db_path(root: &Path) -> PathBuf {
    root.join(VIEWED_DB_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.playbooks/config.yaml")
        );
        assert_eq!(
            viewed_db_path(root),
            PathBuf::from("/tmp/proj/.playbooks/viewed.db")
        );
        assert_eq!(playbooks_dir(root), PathBuf::from("/tmp/proj/.playbooks"));
    }
}
