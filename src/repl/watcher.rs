use crossbeam_channel::Sender;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Watches source files and forwards change events to a channel.
/// notify runs its own background thread.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
}

impl FileWatcher {
    pub fn new(tx: Sender<notify::Result<Event>>) -> notify::Result<Self> {
        let watcher = notify::recommended_watcher(move |res| {
            // the receiver is gone once the REPL has exited
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher,
            watched: Vec::new(),
        })
    }

    /// Start watching `path`. Watching the same path twice is a no-op.
    pub fn watch<P: AsRef<Path>>(&mut self, path: P) -> notify::Result<()> {
        let path = path.as_ref();
        if self.is_watching(path) {
            return Ok(());
        }
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched.push(path.to_path_buf());
        Ok(())
    }

    pub fn unwatch<P: AsRef<Path>>(&mut self, path: P) -> notify::Result<()> {
        let path = path.as_ref();
        self.watcher.unwatch(path)?;
        self.watched.retain(|p| p != path);
        Ok(())
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched.iter().any(|p| p == path)
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

/// Only writes and creations trigger a reload.
pub fn is_reload(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn test_reload_events() {
        assert!(is_reload(&Event::new(EventKind::Modify(ModifyKind::Any))));
        assert!(is_reload(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(!is_reload(&Event::new(EventKind::Access(AccessKind::Any))));
    }

    #[test]
    fn test_watch_is_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.is");
        std::fs::write(&file, "sine(440)").unwrap();

        let (tx, _rx) = unbounded();
        let mut watcher = FileWatcher::new(tx).unwrap();
        watcher.watch(&file).unwrap();
        watcher.watch(&file).unwrap();
        assert_eq!(watcher.watched(), &[file.clone()]);

        watcher.unwatch(&file).unwrap();
        assert!(!watcher.is_watching(&file));
    }
}
