//! Image selection: file handles, preview URIs and the pick/drop intake.

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use shared::domain::SelectionId;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ClientError;

/// Raw image content chosen by the user. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    mime_type: Option<String>,
    bytes: Arc<[u8]>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_raw()
            .map(str::to_string);
        Self {
            name,
            mime_type,
            bytes: Arc::from(bytes),
        }
    }

    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Renderable reference to a selected image. Not `Clone`; disposed of only
/// through [`PreviewStore::release`], which consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewUri(String);

impl PreviewUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait PreviewStore: Send + Sync {
    fn create(&self, file: &FileHandle) -> PreviewUri;
    fn release(&self, uri: PreviewUri);
}

/// In-process stand-in for browser object URLs (`blob:` references).
#[derive(Debug, Default)]
pub struct ObjectUrlStore {
    live: Mutex<HashSet<String>>,
    released: AtomicUsize,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or_default()
    }

    pub fn is_live(&self, uri: &str) -> bool {
        self.live
            .lock()
            .map(|live| live.contains(uri))
            .unwrap_or(false)
    }

    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl PreviewStore for ObjectUrlStore {
    fn create(&self, file: &FileHandle) -> PreviewUri {
        let uri = format!("blob:leafscan/{}", Uuid::new_v4());
        if let Ok(mut live) = self.live.lock() {
            live.insert(uri.clone());
        }
        debug!(%uri, file = file.name(), bytes = file.len(), "preview created");
        PreviewUri(uri)
    }

    fn release(&self, uri: PreviewUri) {
        let removed = self
            .live
            .lock()
            .map(|mut live| live.remove(uri.as_str()))
            .unwrap_or(false);
        if removed {
            self.released.fetch_add(1, Ordering::SeqCst);
            debug!(uri = %uri.as_str(), "preview released");
        } else {
            warn!(uri = %uri.as_str(), "released a preview this store does not own");
        }
    }
}

/// The active image: its identity, content and preview.
#[derive(Debug)]
pub struct Selection {
    id: SelectionId,
    file: FileHandle,
    preview: PreviewUri,
}

impl Selection {
    pub fn id(&self) -> SelectionId {
        self.id
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    pub fn preview(&self) -> &PreviewUri {
        &self.preview
    }
}

/// Parsed `accept` attribute, e.g. `image/*` or `image/png,.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptFilter {
    patterns: Vec<String>,
}

impl AcceptFilter {
    pub fn parse(raw: &str) -> Self {
        let patterns = raw
            .split(',')
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, file: &FileHandle) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let mime = file.mime_type().map(str::to_ascii_lowercase);
        let name = file.name().to_ascii_lowercase();
        self.patterns.iter().any(|pattern| {
            if pattern.starts_with('.') {
                name.ends_with(pattern.as_str())
            } else if let Some(prefix) = pattern.strip_suffix("/*") {
                mime.as_deref()
                    .and_then(|m| m.split('/').next())
                    .is_some_and(|top| top == prefix)
            } else {
                mime.as_deref() == Some(pattern.as_str())
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
}

/// Turns pick and drop events into selections. The accept filter is a hint
/// only: a mismatching file is logged and still accepted.
pub struct SelectionManager {
    store: Arc<dyn PreviewStore>,
    accept: AcceptFilter,
    next_id: u64,
    drag_active: bool,
}

impl SelectionManager {
    pub fn new(store: Arc<dyn PreviewStore>, accept: AcceptFilter) -> Self {
        Self {
            store,
            accept,
            next_id: 1,
            drag_active: false,
        }
    }

    /// `None` means the picker was dismissed.
    pub fn select_from_input(&mut self, file: Option<FileHandle>) -> Option<Selection> {
        let Some(file) = file else {
            debug!("file picker dismissed without a file");
            return None;
        };
        Some(self.accept_file(file))
    }

    /// Only the first dropped file is used.
    pub fn select_from_drop(&mut self, files: Vec<FileHandle>) -> Option<Selection> {
        self.drag_active = false;
        let Some(file) = files.into_iter().next() else {
            debug!("drop carried no files");
            return None;
        };
        Some(self.accept_file(file))
    }

    pub fn drag(&mut self, event: DragEvent) {
        self.drag_active = matches!(event, DragEvent::Enter | DragEvent::Over);
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn release(&self, selection: Selection) {
        debug!(selection_id = %selection.id, "releasing selection");
        self.store.release(selection.preview);
    }

    fn accept_file(&mut self, file: FileHandle) -> Selection {
        if !self.accept.matches(&file) {
            warn!(
                file = file.name(),
                mime_type = file.mime_type().unwrap_or("unknown"),
                "file does not match accept filter; submitting anyway"
            );
        }
        let id = SelectionId(self.next_id);
        self.next_id += 1;
        let preview = self.store.create(&file);
        info!(selection_id = %id, file = file.name(), bytes = file.len(), "selection accepted");
        Selection { id, file, preview }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (SelectionManager, Arc<ObjectUrlStore>) {
        let store = Arc::new(ObjectUrlStore::new());
        (
            SelectionManager::new(store.clone(), AcceptFilter::parse("image/*")),
            store,
        )
    }

    #[test]
    fn guesses_mime_type_from_name() {
        assert_eq!(FileHandle::new("leaf1.jpg", vec![1]).mime_type(), Some("image/jpeg"));
        assert_eq!(FileHandle::new("blob", vec![1]).mime_type(), None);
    }

    #[test]
    fn accept_filter_matches_wildcards_extensions_and_exact_types() {
        let images = AcceptFilter::parse("image/*");
        assert!(images.matches(&FileHandle::new("a.png", vec![])));
        assert!(!images.matches(&FileHandle::new("notes.txt", vec![])));
        assert!(!images.matches(&FileHandle::new("noext", vec![])));

        let mixed = AcceptFilter::parse(" image/png , .JPG ");
        assert!(mixed.matches(&FileHandle::new("a.png", vec![])));
        assert!(mixed.matches(&FileHandle::new("LEAF.jpg", vec![])));
        assert!(!mixed.matches(&FileHandle::new("a.gif", vec![])));

        assert!(AcceptFilter::parse("").matches(&FileHandle::new("anything", vec![])));
    }

    #[test]
    fn dismissed_picker_and_empty_drop_select_nothing() {
        let (mut manager, store) = manager();
        assert!(manager.select_from_input(None).is_none());
        assert!(manager.select_from_drop(Vec::new()).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn each_accept_gets_a_fresh_id_and_live_preview() {
        let (mut manager, store) = manager();
        let first = manager
            .select_from_input(Some(FileHandle::new("a.png", vec![1, 2])))
            .expect("selection");
        let second = manager
            .select_from_drop(vec![
                FileHandle::new("b.png", vec![3]),
                FileHandle::new("c.png", vec![4]),
            ])
            .expect("selection");

        assert_ne!(first.id(), second.id());
        assert_eq!(second.file().name(), "b.png");
        assert!(store.is_live(first.preview().as_str()));
        assert!(store.is_live(second.preview().as_str()));

        manager.release(first);
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.released_count(), 1);
    }

    #[test]
    fn non_image_file_is_still_accepted() {
        let (mut manager, _) = manager();
        let selection = manager.select_from_input(Some(FileHandle::new("report.pdf", vec![0])));
        assert!(selection.is_some());
    }

    #[test]
    fn drag_flag_follows_enter_over_leave_and_drop() {
        let (mut manager, _) = manager();
        manager.drag(DragEvent::Enter);
        assert!(manager.drag_active());
        manager.drag(DragEvent::Leave);
        assert!(!manager.drag_active());
        manager.drag(DragEvent::Over);
        assert!(manager.drag_active());
        let _ = manager.select_from_drop(Vec::new());
        assert!(!manager.drag_active());
    }

    #[tokio::test]
    async fn loads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("leaf1.jpg");
        std::fs::write(&path, b"jpeg-bytes").expect("write");

        let file = FileHandle::load(&path).await.expect("load");
        assert_eq!(file.name(), "leaf1.jpg");
        assert_eq!(file.bytes(), b"jpeg-bytes");

        let err = FileHandle::load(&dir.path().join("missing.jpg"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, ClientError::Read { .. }));
    }
}
