use std::path::{Path, PathBuf};

/// Where the gateway finds its per-language script directories
pub trait Environment: Send + Sync {
    fn base_directory(&self) -> &Path;

    /// Search path for scripts written in `language`
    fn script_directory(&self, language: &str) -> PathBuf {
        self.base_directory().join("scripts").join(language)
    }
}

/// Environment rooted at a single base directory
#[derive(Debug, Clone)]
pub struct DefaultEnvironment {
    base_dir: PathBuf,
}

impl DefaultEnvironment {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `~/.gateway`, or `./.gateway` when no home directory is known
    pub fn from_home() -> Self {
        Self::new(default_base_dir())
    }
}

impl Environment for DefaultEnvironment {
    fn base_directory(&self) -> &Path {
        &self.base_dir
    }
}

pub(crate) fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".gateway"))
        .unwrap_or_else(|| PathBuf::from(".gateway"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_directory_layout() {
        let env = DefaultEnvironment::new("/srv/gateway");
        assert_eq!(
            env.script_directory("rhai"),
            PathBuf::from("/srv/gateway/scripts/rhai")
        );
    }
}
