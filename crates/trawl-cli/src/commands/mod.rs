//! Subcommand implementations.

pub mod clear;
pub mod index;
pub mod open;
pub mod ops;
pub mod restore;
pub mod saved;
pub mod search;
pub mod status;

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::path::{Path, PathBuf};
    use trawl_core::Config;

    /// Config that keeps every file inside `dir`.
    pub fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.general.index_path = Some(dir.join("index.json"));
        config.general.catalog_path = Some(dir.join("catalog.json"));
        config
    }

    /// A small tree: `<dir>/tree/{alpha.txt, beta.md, sub/gamma.txt}`,
    /// returned with its links resolved.
    pub fn tree(dir: &Path) -> PathBuf {
        let root = fs::canonicalize(dir).unwrap().join("tree");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("alpha.txt"), b"a").unwrap();
        fs::write(root.join("beta.md"), b"b").unwrap();
        fs::write(root.join("sub/gamma.txt"), b"c").unwrap();
        root
    }
}
