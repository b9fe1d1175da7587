use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use tracing::debug;

/// Read-only access to the project tree that holds integrated components.
///
/// Probes go through this so they can be exercised against fixture trees.
pub trait ProjectView: Send + Sync {
    fn root(&self) -> &Utf8Path;

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String>;

    fn exists(&self, rel: &Utf8Path) -> bool;

    /// Paths relative to `root` matching a glob pattern, sorted.
    fn glob(&self, pattern: &str) -> anyhow::Result<Vec<Utf8PathBuf>>;
}

/// File-system backed `ProjectView`.
#[derive(Debug, Clone)]
pub struct FsProjectView {
    root: Utf8PathBuf,
}

impl FsProjectView {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

impl ProjectView for FsProjectView {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String> {
        let abs = self.abs(rel);
        fs::read_to_string(&abs).with_context(|| format!("read {}", abs))
    }

    fn exists(&self, rel: &Utf8Path) -> bool {
        self.abs(rel).exists()
    }

    fn glob(&self, pattern: &str) -> anyhow::Result<Vec<Utf8PathBuf>> {
        let root = glob::Pattern::escape(self.root.as_str());
        let full = format!("{}/{}", root.trim_end_matches('/'), pattern);

        debug!(pattern = %full, "scanning project");

        let mut out = Vec::new();
        for entry in glob(&full).with_context(|| format!("glob {}", pattern))? {
            let path = entry.map_err(|e| anyhow::anyhow!("glob error: {e}"))?;
            let path = Utf8PathBuf::from_path_buf(path)
                .map_err(|p| anyhow::anyhow!("non-utf8 path: {}", p.display()))?;
            let rel = path
                .strip_prefix(&self.root)
                .map(Utf8Path::to_path_buf)
                .unwrap_or(path);
            out.push(rel);
        }

        // Deterministic order matters.
        out.sort();
        Ok(out)
    }
}
