//! In-memory metadata store
//!
//! Reference `MetadataStore` backed by per-namespace `BTreeMap`s keyed by
//! normalized path string. Each trait operation takes the lock exactly
//! once, which is what makes the mutations atomic.

use crate::models::{DirRecord, DirectoryListing, Entry, FileRecord};
use crate::store::MetadataStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use stratus_core::chunk::FileManifest;
use stratus_core::error::{Result, StratusError};
use stratus_core::path::VirtualPath;
use tracing::debug;
use uuid::Uuid;

/// One user's path tree
struct Namespace {
    dirs: BTreeMap<String, DirRecord>,
    files: BTreeMap<String, FileRecord>,
}

impl Namespace {
    fn new() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert("/".to_string(), DirRecord::new(VirtualPath::root()));
        Self {
            dirs,
            files: BTreeMap::new(),
        }
    }

    fn entry_at(&self, path: &VirtualPath) -> Option<Entry> {
        if let Some(dir) = self.dirs.get(path.as_str()) {
            return Some(Entry::Directory(dir.clone()));
        }
        self.files
            .get(path.as_str())
            .map(|f| Entry::File(f.clone()))
    }

    /// Create any missing directories above `path`
    fn ensure_parents(&mut self, path: &VirtualPath) -> Result<()> {
        for ancestor in path.ancestors().into_iter().rev() {
            if self.files.contains_key(ancestor.as_str()) {
                return Err(StratusError::FileConflict(ancestor.as_str().to_string()));
            }
            self.dirs
                .entry(ancestor.as_str().to_string())
                .or_insert_with(|| DirRecord::new(ancestor.clone()));
        }
        Ok(())
    }

    fn has_children(&self, path: &VirtualPath) -> bool {
        let prefix = child_prefix(path);
        self.dirs.range(prefix.clone()..).next().is_some_and(|(k, _)| k.starts_with(&prefix))
            || self
                .files
                .range(prefix.clone()..)
                .next()
                .is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

/// Prefix every strict descendant key of `path` starts with
fn child_prefix(path: &VirtualPath) -> String {
    if path.is_root() {
        "/".to_string()
    } else {
        format!("{}/", path.as_str())
    }
}

/// True if `key` names an immediate child of `path`
fn is_immediate_child(path: &VirtualPath, key: &str) -> bool {
    let prefix = child_prefix(path);
    match key.strip_prefix(&prefix) {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

/// In-memory `MetadataStore`, primarily for tests and embedded use
pub struct MemoryMetadataStore {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn resolve(&self, namespace: &str, path: &VirtualPath) -> Result<Option<Entry>> {
        {
            let namespaces = self.namespaces.read();
            if let Some(ns) = namespaces.get(namespace) {
                return Ok(ns.entry_at(path));
            }
        }
        if !path.is_root() {
            return Ok(None);
        }

        // An untouched namespace still has its root; materialize it so
        // repeated resolves return the same record.
        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .entry(namespace.to_string())
            .or_insert_with(Namespace::new);
        Ok(ns.entry_at(path))
    }

    async fn create_file(
        &self,
        namespace: &str,
        path: &VirtualPath,
        manifest: FileManifest,
    ) -> Result<FileRecord> {
        if path.is_root() {
            return Err(StratusError::FileConflict("/".to_string()));
        }

        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .entry(namespace.to_string())
            .or_insert_with(Namespace::new);

        if ns.dirs.contains_key(path.as_str()) {
            return Err(StratusError::FileConflict(path.as_str().to_string()));
        }
        ns.ensure_parents(path)?;

        let mut record = FileRecord::from_manifest(path.clone(), manifest);
        if let Some(previous) = ns.files.get(path.as_str()) {
            record.created_at = previous.created_at;
        }
        ns.files.insert(path.as_str().to_string(), record.clone());

        debug!(namespace, path = %path, size = record.size, chunks = record.chunk_count(), "File committed");
        Ok(record)
    }

    async fn create_dir(&self, namespace: &str, path: &VirtualPath) -> Result<DirRecord> {
        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .entry(namespace.to_string())
            .or_insert_with(Namespace::new);

        if let Some(existing) = ns.dirs.get(path.as_str()) {
            return Ok(existing.clone());
        }
        if ns.files.contains_key(path.as_str()) {
            return Err(StratusError::FileConflict(path.as_str().to_string()));
        }
        ns.ensure_parents(path)?;

        let record = DirRecord::new(path.clone());
        ns.dirs.insert(path.as_str().to_string(), record.clone());
        debug!(namespace, path = %path, "Directory created");
        Ok(record)
    }

    async fn delete_entry(&self, namespace: &str, path: &VirtualPath) -> Result<Entry> {
        if path.is_root() {
            return Err(StratusError::InvalidPath(
                "cannot delete the root directory".to_string(),
            ));
        }

        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .get_mut(namespace)
            .ok_or_else(|| StratusError::PathNotFound(path.as_str().to_string()))?;

        if let Some(file) = ns.files.remove(path.as_str()) {
            debug!(namespace, path = %path, "File entry deleted");
            return Ok(Entry::File(file));
        }

        if ns.dirs.contains_key(path.as_str()) {
            if ns.has_children(path) {
                return Err(StratusError::DirectoryNotEmpty(path.as_str().to_string()));
            }
            // Checked present above
            let dir = ns
                .dirs
                .remove(path.as_str())
                .ok_or_else(|| StratusError::Internal("directory vanished under lock".to_string()))?;
            debug!(namespace, path = %path, "Directory deleted");
            return Ok(Entry::Directory(dir));
        }

        Err(StratusError::PathNotFound(path.as_str().to_string()))
    }

    async fn move_entry(
        &self,
        namespace: &str,
        src: &VirtualPath,
        dst: &VirtualPath,
    ) -> Result<Entry> {
        if src.is_root() {
            return Err(StratusError::InvalidPath(
                "cannot move the root directory".to_string(),
            ));
        }

        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .get_mut(namespace)
            .ok_or_else(|| StratusError::PathNotFound(src.as_str().to_string()))?;

        let source = ns
            .entry_at(src)
            .ok_or_else(|| StratusError::PathNotFound(src.as_str().to_string()))?;
        let target = resolve_destination(ns, &source, src, dst)?;
        if target == *src {
            return Ok(source);
        }

        check_destination_free(ns, &target)?;
        ns.ensure_parents(&target)?;

        let now = Utc::now();
        match source {
            Entry::File(_) => {
                // Present: resolved under the same lock
                let mut file = ns
                    .files
                    .remove(src.as_str())
                    .ok_or_else(|| StratusError::Internal("file vanished under lock".to_string()))?;
                file.path = target.clone();
                file.updated_at = now;
                ns.files.insert(target.as_str().to_string(), file.clone());
                debug!(namespace, src = %src, dst = %target, "File moved");
                Ok(Entry::File(file))
            }
            Entry::Directory(_) => {
                let moved = rekey_subtree(ns, src, &target, |file| {
                    file.updated_at = now;
                });
                debug!(namespace, src = %src, dst = %target, entries = moved, "Directory moved");
                let dir = ns
                    .dirs
                    .get(target.as_str())
                    .cloned()
                    .ok_or_else(|| StratusError::Internal("moved directory missing".to_string()))?;
                Ok(Entry::Directory(dir))
            }
        }
    }

    async fn copy_entry(
        &self,
        namespace: &str,
        src: &VirtualPath,
        dst: &VirtualPath,
    ) -> Result<Entry> {
        if src.is_root() {
            return Err(StratusError::InvalidPath(
                "cannot copy the root directory".to_string(),
            ));
        }

        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .get_mut(namespace)
            .ok_or_else(|| StratusError::PathNotFound(src.as_str().to_string()))?;

        let source = ns
            .entry_at(src)
            .ok_or_else(|| StratusError::PathNotFound(src.as_str().to_string()))?;
        let target = resolve_destination(ns, &source, src, dst)?;
        if target == *src {
            return Err(StratusError::InvalidPath(
                "copy source and destination are the same".to_string(),
            ));
        }

        check_destination_free(ns, &target)?;
        ns.ensure_parents(&target)?;

        match source {
            Entry::File(file) => {
                let copy = copy_file_record(&file, target.clone());
                ns.files.insert(target.as_str().to_string(), copy.clone());
                debug!(namespace, src = %src, dst = %target, "File copied");
                Ok(Entry::File(copy))
            }
            Entry::Directory(_) => {
                let src_prefix = child_prefix(src);
                let descendants: Vec<FileRecord> = ns
                    .files
                    .range(src_prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(&src_prefix))
                    .map(|(_, f)| f.clone())
                    .collect();
                let descendant_dirs: Vec<String> = ns
                    .dirs
                    .range(src_prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(&src_prefix))
                    .map(|(k, _)| k.clone())
                    .collect();

                let root_copy = DirRecord::new(target.clone());
                ns.dirs
                    .insert(target.as_str().to_string(), root_copy.clone());
                for key in descendant_dirs {
                    let new_path = remap_path(&key, src, &target)?;
                    ns.dirs
                        .insert(new_path.as_str().to_string(), DirRecord::new(new_path));
                }
                for file in descendants {
                    let new_path = remap_path(file.path.as_str(), src, &target)?;
                    let copy = copy_file_record(&file, new_path.clone());
                    ns.files.insert(new_path.as_str().to_string(), copy);
                }

                debug!(namespace, src = %src, dst = %target, "Directory copied");
                Ok(Entry::Directory(root_copy))
            }
        }
    }

    async fn list_children(
        &self,
        namespace: &str,
        path: &VirtualPath,
    ) -> Result<DirectoryListing> {
        let namespaces = self.namespaces.read();
        let ns = match namespaces.get(namespace) {
            Some(ns) => ns,
            None if path.is_root() => return Ok(DirectoryListing::default()),
            None => {
                return Err(StratusError::DirectoryNotFound(path.as_str().to_string()))
            }
        };

        if !ns.dirs.contains_key(path.as_str()) {
            return Err(StratusError::DirectoryNotFound(path.as_str().to_string()));
        }

        let prefix = child_prefix(path);
        let dirs = ns
            .dirs
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| is_immediate_child(path, k))
            .map(|(_, d)| d.clone())
            .collect();
        let files = ns
            .files
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| is_immediate_child(path, k))
            .map(|(_, f)| f.clone())
            .collect();

        Ok(DirectoryListing { dirs, files })
    }
}

/// Final destination of a move or copy
///
/// An existing directory at `dst` means the source keeps its name beneath
/// it. Also rejects moving a directory into its own subtree.
fn resolve_destination(
    ns: &Namespace,
    source: &Entry,
    src: &VirtualPath,
    dst: &VirtualPath,
) -> Result<VirtualPath> {
    let target = if ns.dirs.contains_key(dst.as_str()) {
        match src.name() {
            Some(name) => dst.join(name)?,
            None => dst.clone(),
        }
    } else {
        dst.clone()
    };

    if source.is_directory() && target.starts_with(src) && target != *src {
        return Err(StratusError::InvalidPath(format!(
            "cannot place {} inside its own subtree at {}",
            src, target
        )));
    }
    Ok(target)
}

fn check_destination_free(ns: &Namespace, target: &VirtualPath) -> Result<()> {
    if ns.files.contains_key(target.as_str()) {
        return Err(StratusError::FileConflict(target.as_str().to_string()));
    }
    if ns.dirs.contains_key(target.as_str()) {
        return Err(StratusError::DirectoryConflict(target.as_str().to_string()));
    }
    Ok(())
}

/// Rewrite a descendant path from the `src` subtree into `dst`
fn remap_path(key: &str, src: &VirtualPath, dst: &VirtualPath) -> Result<VirtualPath> {
    let suffix = key
        .strip_prefix(src.as_str())
        .ok_or_else(|| StratusError::Internal(format!("{key} is not under {src}")))?;
    VirtualPath::parse(&format!("{}{}", dst.as_str(), suffix))
}

/// Move every entry under `src` (inclusive) to the matching path under
/// `dst`, returning the number of entries rekeyed
fn rekey_subtree(
    ns: &mut Namespace,
    src: &VirtualPath,
    dst: &VirtualPath,
    mut touch_file: impl FnMut(&mut FileRecord),
) -> usize {
    let src_prefix = child_prefix(src);
    let mut moved = 0;

    let dir_keys: Vec<String> = std::iter::once(src.as_str().to_string())
        .chain(
            ns.dirs
                .range(src_prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&src_prefix))
                .map(|(k, _)| k.clone()),
        )
        .collect();
    for key in dir_keys {
        if let Some(mut dir) = ns.dirs.remove(&key) {
            if let Ok(new_path) = remap_path(&key, src, dst) {
                dir.path = new_path.clone();
                ns.dirs.insert(new_path.as_str().to_string(), dir);
                moved += 1;
            }
        }
    }

    let file_keys: Vec<String> = ns
        .files
        .range(src_prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&src_prefix))
        .map(|(k, _)| k.clone())
        .collect();
    for key in file_keys {
        if let Some(mut file) = ns.files.remove(&key) {
            if let Ok(new_path) = remap_path(&key, src, dst) {
                file.path = new_path.clone();
                touch_file(&mut file);
                ns.files.insert(new_path.as_str().to_string(), file);
                moved += 1;
            }
        }
    }

    moved
}

/// File copy sharing the source's chunk records
fn copy_file_record(source: &FileRecord, path: VirtualPath) -> FileRecord {
    let now = Utc::now();
    FileRecord {
        id: Uuid::new_v4(),
        path,
        size: source.size,
        md5: source.md5.clone(),
        content_hash: source.content_hash,
        chunks: source.chunks.clone(),
        created_at: now,
        updated_at: now,
    }
}
