use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::io;

// Thread-local override used only in tests to avoid process-global env races.
thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Name of the probe file written by [`Layout::prepare`].
const WRITE_PROBE: &str = ".prdforge_write_probe";

/// Resolve prdforge home:
/// 1) thread-local override (tests use this)
/// 2) env `PRDFORGE_HOME`
/// 3) default ".prdforge"
#[must_use]
pub fn prdforge_home() -> Utf8PathBuf {
    if let Some(tl) = THREAD_HOME.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("PRDFORGE_HOME") {
        return Utf8PathBuf::from(p);
    }
    Utf8PathBuf::from(".prdforge")
}

/// mkdir -p; treat `AlreadyExists` as success (removes TOCTTOU races)
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Directory layout under a prdforge home.
///
/// ```text
/// <home>/
///   inputs/    operator-supplied material
///   outputs/   <id>.json, <id>_phase<N>_<ts>.md, <id>_FINAL_<ts>.md
///   prompts/   <template-name>.txt
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at [`prdforge_home()`].
    #[must_use]
    pub fn from_home() -> Self {
        Self::new(prdforge_home())
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[must_use]
    pub fn inputs_dir(&self) -> Utf8PathBuf {
        self.root.join("inputs")
    }

    #[must_use]
    pub fn outputs_dir(&self) -> Utf8PathBuf {
        self.root.join("outputs")
    }

    #[must_use]
    pub fn prompts_dir(&self) -> Utf8PathBuf {
        self.root.join("prompts")
    }

    /// Returns `<home>/outputs/<id>.json`
    #[must_use]
    pub fn project_file(&self, project_id: &str) -> Utf8PathBuf {
        self.outputs_dir().join(format!("{project_id}.json"))
    }

    /// Returns `<home>/outputs/<id>_phase<N>_<stamp>.md`
    #[must_use]
    pub fn phase_snapshot_file(&self, project_id: &str, phase: u32, stamp: &str) -> Utf8PathBuf {
        self.outputs_dir()
            .join(format!("{project_id}_phase{phase}_{stamp}.md"))
    }

    /// Returns `<home>/outputs/<id>_FINAL_<stamp>.md`
    #[must_use]
    pub fn final_document_file(&self, project_id: &str, stamp: &str) -> Utf8PathBuf {
        self.outputs_dir()
            .join(format!("{project_id}_FINAL_{stamp}.md"))
    }

    /// Returns `<home>/prompts/<name>.txt`
    #[must_use]
    pub fn prompt_file(&self, name: &str) -> Utf8PathBuf {
        self.prompts_dir().join(format!("{name}.txt"))
    }

    /// Create `inputs/`, `outputs/` and `prompts/`, then verify each is writable.
    pub fn prepare(&self) -> io::Result<()> {
        for dir in [self.inputs_dir(), self.outputs_dir(), self.prompts_dir()] {
            ensure_dir_all(&dir)?;
            probe_writable(&dir)?;
        }
        Ok(())
    }
}

fn probe_writable(dir: &Utf8Path) -> io::Result<()> {
    let probe = dir.join(WRITE_PROBE);
    std::fs::write(&probe, b"ok").map_err(|e| {
        io::Error::new(e.kind(), format!("directory {dir} is not writable: {e}"))
    })?;
    std::fs::remove_file(&probe)
}

/// RAII guard for isolated home that clears thread-local state on drop
#[cfg(any(test, feature = "test-utils"))]
pub struct HomeGuard {
    inner: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl HomeGuard {
    /// UTF-8 path of the isolated home.
    #[must_use]
    pub fn utf8_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.inner.path().to_path_buf())
            .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for HomeGuard {
    fn drop(&mut self) {
        THREAD_HOME.with(|tl| *tl.borrow_mut() = None);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl std::ops::Deref for HomeGuard {
    type Target = tempfile::TempDir;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Test helper: give this thread a unique home under the system temp dir.
///
/// Hold the `HomeGuard` for the test's duration so the directory stays alive.
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(not(test), allow(dead_code))]
#[must_use]
pub fn with_isolated_home() -> HomeGuard {
    let td = tempfile::TempDir::new().expect("create temp home");
    let guard = HomeGuard { inner: td };
    let p = guard.utf8_path();
    THREAD_HOME.with(|tl| *tl.borrow_mut() = Some(p));
    guard
}
