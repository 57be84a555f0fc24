use std::path::{Path, PathBuf};

/// Every file location the tools read or write, derived once from the
/// workspace root and passed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    root: PathBuf,
    data: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let data = root.join("data");
        Self { root, data }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    /// Persistent browser profile.
    pub fn profile_dir(&self) -> PathBuf {
        self.data.join("profile")
    }

    pub fn capture_dir(&self) -> PathBuf {
        self.data.join("captured")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.data.join("debug")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data.join("media")
    }

    pub fn learned_dir(&self) -> PathBuf {
        self.data.join("learned")
    }

    pub fn kb_file(&self) -> PathBuf {
        self.data.join("knowledge").join("x_lessons.md")
    }

    pub fn batch_notes_dir(&self) -> PathBuf {
        self.data.join("batch-notes")
    }

    pub fn action_plans_dir(&self) -> PathBuf {
        self.data.join("action-plans")
    }

    pub fn structure_dir(&self) -> PathBuf {
        self.data.join("structure")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data.join("templates")
    }

    pub fn queue_file(&self) -> PathBuf {
        self.data.join("queue.md")
    }

    pub fn seeds_file(&self) -> PathBuf {
        self.data.join("seeds.md")
    }

    pub fn generator_config(&self) -> PathBuf {
        self.data.join("sources.ron")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data.join("xops.log")
    }

    pub fn capture_json(&self, status_id: &str) -> PathBuf {
        self.capture_dir().join(format!("{status_id}.json"))
    }

    pub fn capture_markdown(&self, status_id: &str) -> PathBuf {
        self.capture_dir().join(format!("{status_id}.md"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_data_dir() {
        let paths = WorkspacePaths::new("/ws");
        assert_eq!(paths.capture_json("42"), PathBuf::from("/ws/data/captured/42.json"));
        assert_eq!(
            paths.kb_file(),
            PathBuf::from("/ws/data/knowledge/x_lessons.md")
        );
        assert_eq!(paths.queue_file(), PathBuf::from("/ws/data/queue.md"));
    }
}
