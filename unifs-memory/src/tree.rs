//! The in-memory tree behind one `mem://` filesystem instance.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;
use unifs_core::{MountIdentity, Result, UnifsError, VirtualPath};

/// What a path names inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
enum Node {
    Directory,
    File(Bytes),
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self {
            Node::Directory => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        }
    }
}

type Key = Vec<String>;

#[derive(Debug)]
struct TreeState {
    released: bool,
    nodes: BTreeMap<Key, Node>,
}

/// A flat map from normalized absolute segment lists to nodes.
///
/// The root (the empty key) always exists and is a directory. Once
/// [`release`](Self::release) has run every operation fails with
/// [`UnifsError::Closed`]; the check happens under the same lock as the
/// operation itself.
#[derive(Debug)]
pub struct MemoryTree {
    identity: MountIdentity,
    read_only: bool,
    state: RwLock<TreeState>,
}

fn key_of(path: &VirtualPath) -> Key {
    path.to_absolute().normalize().segments().to_vec()
}

fn render(path: &VirtualPath) -> String {
    path.to_absolute().normalize().to_string()
}

impl MemoryTree {
    pub fn new(identity: MountIdentity, read_only: bool) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(Key::new(), Node::Directory);
        Self {
            identity,
            read_only,
            state: RwLock::new(TreeState {
                released: false,
                nodes,
            }),
        }
    }

    pub fn identity(&self) -> &MountIdentity {
        &self.identity
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_released(&self) -> bool {
        self.state.read().released
    }

    /// Number of entries, including the root.
    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Drops everything but the root and rejects all later operations.
    pub fn release(&self) {
        let mut state = self.state.write();
        state.released = true;
        state.nodes.retain(|key, _| key.is_empty());
    }

    fn live<'a>(&self, state: &'a TreeState) -> Result<&'a BTreeMap<Key, Node>> {
        if state.released {
            return Err(UnifsError::Closed {
                identity: self.identity.clone(),
            });
        }
        Ok(&state.nodes)
    }

    fn live_mut<'a>(&self, state: &'a mut TreeState) -> Result<&'a mut BTreeMap<Key, Node>> {
        if state.released {
            return Err(UnifsError::Closed {
                identity: self.identity.clone(),
            });
        }
        Ok(&mut state.nodes)
    }

    pub fn kind(&self, path: &VirtualPath) -> Result<Option<EntryKind>> {
        let state = self.state.read();
        Ok(self.live(&state)?.get(&key_of(path)).map(Node::kind))
    }

    fn check_parent(nodes: &BTreeMap<Key, Node>, key: &[String], path: &VirtualPath) -> Result<()> {
        let parent = &key[..key.len().saturating_sub(1)];
        match nodes.get(parent) {
            Some(Node::Directory) => Ok(()),
            Some(Node::File(_)) => Err(UnifsError::NotADirectory {
                path: render(path),
            }),
            None => Err(UnifsError::NoSuchPath {
                path: render(path),
            }),
        }
    }

    pub fn create_dir(&self, path: &VirtualPath) -> Result<()> {
        let key = key_of(path);
        let mut state = self.state.write();
        let nodes = self.live_mut(&mut state)?;
        if nodes.contains_key(&key) {
            return Err(UnifsError::PathExists { path: render(path) });
        }
        Self::check_parent(nodes, &key, path)?;
        nodes.insert(key, Node::Directory);
        Ok(())
    }

    /// Creates `path` and any missing ancestors.
    pub fn create_dir_all(&self, path: &VirtualPath) -> Result<()> {
        let key = key_of(path);
        let mut state = self.state.write();
        let nodes = self.live_mut(&mut state)?;
        for depth in 1..=key.len() {
            let prefix = &key[..depth];
            match nodes.get(prefix) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => {
                    return Err(UnifsError::NotADirectory {
                        path: format!("/{}", prefix.join("/")),
                    });
                }
                None => {
                    nodes.insert(prefix.to_vec(), Node::Directory);
                }
            }
        }
        Ok(())
    }

    /// Creates or replaces the file at `path`.
    pub fn write(&self, path: &VirtualPath, data: Bytes) -> Result<()> {
        let key = key_of(path);
        let mut state = self.state.write();
        let nodes = self.live_mut(&mut state)?;
        if matches!(nodes.get(&key), Some(Node::Directory)) {
            return Err(UnifsError::IsADirectory { path: render(path) });
        }
        Self::check_parent(nodes, &key, path)?;
        nodes.insert(key, Node::File(data));
        Ok(())
    }

    pub fn read(&self, path: &VirtualPath) -> Result<Bytes> {
        let state = self.state.read();
        match self.live(&state)?.get(&key_of(path)) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Directory) => Err(UnifsError::IsADirectory { path: render(path) }),
            None => Err(UnifsError::NoSuchPath { path: render(path) }),
        }
    }

    /// Direct children of the directory at `path`, in name order.
    pub fn list(&self, path: &VirtualPath) -> Result<Vec<VirtualPath>> {
        let key = key_of(path);
        let state = self.state.read();
        let nodes = self.live(&state)?;
        match nodes.get(&key) {
            Some(Node::Directory) => {}
            Some(Node::File(_)) => return Err(UnifsError::NotADirectory { path: render(path) }),
            None => return Err(UnifsError::NoSuchPath { path: render(path) }),
        }

        let dir = path.to_absolute().normalize();
        Ok(nodes
            .range(key.clone()..)
            .skip(1)
            .take_while(|(k, _)| k.starts_with(&key))
            .filter(|(k, _)| k.len() == key.len() + 1)
            .map(|(k, _)| dir.resolve_str(&k[key.len()]))
            .collect())
    }

    /// Removes a file or an empty directory.
    pub fn remove(&self, path: &VirtualPath) -> Result<()> {
        let key = key_of(path);
        if key.is_empty() {
            return Err(UnifsError::InvalidArgument("cannot remove the root".to_string()));
        }

        let mut state = self.state.write();
        let nodes = self.live_mut(&mut state)?;
        match nodes.get(&key) {
            None => return Err(UnifsError::NoSuchPath { path: render(path) }),
            Some(Node::Directory) => {
                let has_children = nodes
                    .range(key.clone()..)
                    .nth(1)
                    .is_some_and(|(k, _)| k.starts_with(&key));
                if has_children {
                    return Err(UnifsError::DirectoryNotEmpty { path: render(path) });
                }
            }
            Some(Node::File(_)) => {}
        }
        nodes.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident() -> MountIdentity {
        MountIdentity::new("mem://t").unwrap()
    }

    fn p(text: &str) -> VirtualPath {
        VirtualPath::parse(&ident(), text)
    }

    fn tree() -> MemoryTree {
        MemoryTree::new(ident(), false)
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree = tree();
        assert_eq!(tree.kind(&p("/")).unwrap(), Some(EntryKind::Directory));
        assert!(tree.is_empty());
        assert!(tree.list(&p("/")).unwrap().is_empty());
    }

    #[test]
    fn test_write_requires_parent() {
        let tree = tree();
        let err = tree.write(&p("/a/b"), Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, UnifsError::NoSuchPath { .. }));

        tree.create_dir(&p("/a")).unwrap();
        tree.write(&p("/a/b"), Bytes::from_static(b"x")).unwrap();
        assert_eq!(tree.read(&p("/a/b")).unwrap(), Bytes::from_static(b"x"));
    }

    #[test]
    fn test_relative_and_dotted_paths_are_normalized() {
        let tree = tree();
        tree.create_dir_all(&p("a/b")).unwrap();
        tree.write(&p("/a/./b/../b/f"), Bytes::from_static(b"1")).unwrap();
        assert_eq!(tree.kind(&p("/a/b/f")).unwrap(), Some(EntryKind::File));
    }

    #[test]
    fn test_create_dir_all_through_file_fails() {
        let tree = tree();
        tree.write(&p("/f"), Bytes::new()).unwrap();
        let err = tree.create_dir_all(&p("/f/g")).unwrap_err();
        assert!(matches!(err, UnifsError::NotADirectory { .. }));
        assert!(matches!(tree.create_dir(&p("/f")), Err(UnifsError::PathExists { .. })));
    }

    #[test]
    fn test_list_only_direct_children() {
        let tree = tree();
        tree.create_dir_all(&p("/a/b/c")).unwrap();
        tree.write(&p("/a/z"), Bytes::new()).unwrap();
        tree.create_dir(&p("/ab")).unwrap();

        let names: Vec<String> = tree.list(&p("/a")).unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["/a/b", "/a/z"]);
        assert!(matches!(tree.list(&p("/a/z")), Err(UnifsError::NotADirectory { .. })));
    }

    #[test]
    fn test_remove() {
        let tree = tree();
        tree.create_dir_all(&p("/a/b")).unwrap();
        assert!(matches!(tree.remove(&p("/a")), Err(UnifsError::DirectoryNotEmpty { .. })));
        tree.remove(&p("/a/b")).unwrap();
        tree.remove(&p("/a")).unwrap();
        assert!(matches!(tree.remove(&p("/a")), Err(UnifsError::NoSuchPath { .. })));
        assert!(tree.remove(&p("/")).is_err());
    }

    #[test]
    fn test_release_keeps_root_and_rejects_use() {
        let tree = tree();
        tree.create_dir_all(&p("/a/b")).unwrap();
        tree.release();

        assert!(tree.is_released());
        assert_eq!(tree.len(), 1);
        assert!(matches!(tree.kind(&p("/")), Err(UnifsError::Closed { .. })));
        assert!(matches!(
            tree.write(&p("/f"), Bytes::new()),
            Err(UnifsError::Closed { .. })
        ));
        assert!(matches!(tree.create_dir(&p("/d")), Err(UnifsError::Closed { .. })));
        assert!(matches!(tree.list(&p("/")), Err(UnifsError::Closed { .. })));
        assert!(matches!(tree.read(&p("/a")), Err(UnifsError::Closed { .. })));
        assert_eq!(tree.len(), 1);
    }
}
