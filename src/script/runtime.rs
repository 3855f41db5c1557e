//! Process-scoped script runtime and cache directory
//!
//! Both are created lazily on first use and then shared for the life of the
//! process. Reads go through [`ArcSwapOption`] without locking; construction
//! is serialised on a single init lock with a second check under the lock, and
//! an instance is only published once it is fully built.

use super::environment::Environment;
use super::engine::RhaiRuntime;
use crate::error::ScriptError;
use arc_swap::ArcSwapOption;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const CACHE_DIR_PREFIX: &str = "gateway-rhai-script-cache-";

/// Scratch directory holding scripts compiled from inline source
#[derive(Debug)]
pub struct CacheDir {
    dir: TempDir,
}

impl CacheDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Owner of the lazily constructed runtime and cache directory
pub struct RuntimeManager {
    init_lock: Mutex<()>,
    cache_dir: ArcSwapOption<CacheDir>,
    runtime: ArcSwapOption<RhaiRuntime>,
}

impl RuntimeManager {
    /// A manager with nothing initialised yet
    pub fn new() -> Self {
        Self {
            init_lock: Mutex::new(()),
            cache_dir: ArcSwapOption::empty(),
            runtime: ArcSwapOption::empty(),
        }
    }

    /// The manager shared by the whole process
    pub fn global() -> Arc<RuntimeManager> {
        static GLOBAL: OnceLock<Arc<RuntimeManager>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(RuntimeManager::new()))
            .clone()
    }

    /// The cache directory, created on first call
    pub fn cache_dir(&self) -> Result<Arc<CacheDir>, ScriptError> {
        if let Some(dir) = self.cache_dir.load_full() {
            return Ok(dir);
        }

        let _guard = self.lock();
        if let Some(dir) = self.cache_dir.load_full() {
            return Ok(dir);
        }

        let dir = tempfile::Builder::new()
            .prefix(CACHE_DIR_PREFIX)
            .tempdir()?;
        info!(path = %dir.path().display(), "Created script cache directory");

        let dir = Arc::new(CacheDir { dir });
        self.cache_dir.store(Some(Arc::clone(&dir)));
        Ok(dir)
    }

    /// The script runtime, built and bootstrapped on first call.
    ///
    /// The first successful caller's environment determines the script search
    /// path for the rest of the process.
    pub fn runtime(&self, env: &dyn Environment) -> Result<Arc<RhaiRuntime>, ScriptError> {
        if let Some(runtime) = self.runtime.load_full() {
            return Ok(runtime);
        }

        let _guard = self.lock();
        if let Some(runtime) = self.runtime.load_full() {
            return Ok(runtime);
        }

        let runtime = Arc::new(RhaiRuntime::bootstrap(env)?);
        info!(
            script_dir = %runtime.script_dir().display(),
            "Script runtime initialized"
        );

        self.runtime.store(Some(Arc::clone(&runtime)));
        Ok(runtime)
    }

    pub fn is_runtime_initialized(&self) -> bool {
        self.runtime.load().is_some()
    }

    pub fn is_cache_dir_initialized(&self) -> bool {
        self.cache_dir.load().is_some()
    }

    /// Best-effort removal of the cache directory, meant for process exit
    pub fn cleanup(&self) {
        let _guard = self.lock();
        let Some(dir) = self.cache_dir.swap(None) else {
            return;
        };

        let path = dir.path().to_path_buf();
        match std::fs::remove_dir_all(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed script cache directory"),
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove script cache directory"
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so a poisoned lock is still usable.
        self.init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RuntimeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::DefaultEnvironment;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_nothing_initialized_up_front() {
        let manager = RuntimeManager::new();
        assert!(!manager.is_runtime_initialized());
        assert!(!manager.is_cache_dir_initialized());
    }

    #[test]
    fn test_cache_dir_created_once() {
        let manager = RuntimeManager::new();

        let first = manager.cache_dir().unwrap();
        let second = manager.cache_dir().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.path().is_dir());
        assert!(first
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(CACHE_DIR_PREFIX));

        manager.cleanup();
    }

    #[test]
    fn test_concurrent_first_use_constructs_once() {
        const THREADS: usize = 8;

        let base = TempDir::new().unwrap();
        let env = DefaultEnvironment::new(base.path());
        let manager = RuntimeManager::new();
        let barrier = Barrier::new(THREADS);

        let (runtimes, dirs): (Vec<_>, Vec<_>) = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        let runtime = manager.runtime(&env).unwrap();
                        let dir = manager.cache_dir().unwrap();
                        (runtime, dir)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).unzip()
        });

        assert!(runtimes.iter().all(|r| Arc::ptr_eq(r, &runtimes[0])));
        assert!(dirs.iter().all(|d| Arc::ptr_eq(d, &dirs[0])));

        manager.cleanup();
    }

    #[test]
    fn test_cleanup_removes_directory() {
        let manager = RuntimeManager::new();
        let path = manager.cache_dir().unwrap().path().to_path_buf();
        assert!(path.exists());

        manager.cleanup();

        assert!(!path.exists());
        assert!(!manager.is_cache_dir_initialized());
        // A second cleanup is a no-op.
        manager.cleanup();
    }
}
