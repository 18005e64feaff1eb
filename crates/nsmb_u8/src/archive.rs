//! In-memory representation of a U8 archive
//!

use indexmap::IndexMap;

use crate::error::{Error, FileNotFoundError, Result};

/// A single entry of the archive tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A directory, with its children in insertion order
    Directory(IndexMap<String, Node>),

    /// A file and its contents
    File(Vec<u8>),
}

impl Node {
    fn empty_directory() -> Self {
        Node::Directory(IndexMap::new())
    }
}

/// U8 archive
///
/// The archive exclusively owns the contents of every file it holds. Entries are addressed by
/// `/`-separated paths relative to the archive root and keep the order they were inserted in.
///
/// ```
/// # fn doit() -> nsmb_u8::error::Result<()>
/// # {
/// use nsmb_u8::U8Archive;
///
/// let mut arc = U8Archive::new();
/// arc.set("course", None)?;
/// arc.set("course/course1.bin", Some(vec![0x00, 0x01]))?;
///
/// let bytes = arc.to_bytes()?;
/// let parsed = U8Archive::from_bytes(&bytes)?;
/// assert_eq!(parsed.get("course/course1.bin")?, Some(&[0x00, 0x01][..]));
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct U8Archive {
    pub(crate) root: IndexMap<String, Node>,
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return Err(Error::InvalidPath(path.to_owned()));
    }
    Ok(parts)
}

impl U8Archive {
    /// Creates an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files contained in this archive, directories excluded
    pub fn len(&self) -> usize {
        self.file_names().count()
    }

    /// Whether this archive contains no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct access to the top level entries
    pub fn root(&self) -> &IndexMap<String, Node> {
        &self.root
    }

    fn node(&self, path: &str) -> Option<&Node> {
        let parts = split_path(path).ok()?;
        let (last, parents) = parts.split_last()?;

        let mut dir = &self.root;
        for part in parents {
            match dir.get(*part)? {
                Node::Directory(children) => dir = children,
                Node::File(_) => return None,
            }
        }
        dir.get(*last)
    }

    /// Whether an entry exists at the given path
    pub fn contains(&self, path: &str) -> bool {
        self.node(path).is_some()
    }

    /// Get the contents of an entry
    ///
    /// Returns `Some` with the data for a file and `None` for a directory.
    pub fn get(&self, path: &str) -> Result<Option<&[u8]>> {
        match self.node(path) {
            Some(Node::File(data)) => Ok(Some(data.as_slice())),
            Some(Node::Directory(_)) => Ok(None),
            None => Err(Error::FileNotFound(FileNotFoundError::Name(
                path.to_owned(),
            ))),
        }
    }

    /// Insert or replace an entry
    ///
    /// A `None` value creates a directory marker, it never removes anything. Missing parent
    /// directories are created along the way. Replacing an entry keeps its position.
    pub fn set(&mut self, path: &str, data: Option<Vec<u8>>) -> Result<()> {
        let parts = split_path(path)?;
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| Error::InvalidPath(path.to_owned()))?;

        let mut dir = &mut self.root;
        for part in parents {
            let entry = dir
                .entry((*part).to_owned())
                .or_insert_with(Node::empty_directory);
            dir = match entry {
                Node::Directory(children) => children,
                Node::File(_) => return Err(Error::NotADirectory(path.to_owned())),
            };
        }

        match data {
            Some(data) => {
                dir.insert((*last).to_owned(), Node::File(data));
            }
            None => {
                let existing = dir.get(*last);
                if !matches!(existing, Some(Node::Directory(_))) {
                    dir.insert((*last).to_owned(), Node::empty_directory());
                }
            }
        }

        Ok(())
    }

    /// Remove an entry, and all of its children if it is a directory
    pub fn remove(&mut self, path: &str) -> Result<Node> {
        let not_found = || Error::FileNotFound(FileNotFoundError::Name(path.to_owned()));

        let parts = split_path(path)?;
        let (last, parents) = parts.split_last().ok_or_else(not_found)?;

        let mut dir = &mut self.root;
        for part in parents {
            dir = match dir.get_mut(*part) {
                Some(Node::Directory(children)) => children,
                _ => return Err(not_found()),
            };
        }
        dir.shift_remove(*last).ok_or_else(not_found)
    }

    /// Returns every entry in archive order as `(path, contents)`, where directories have no
    /// contents.
    pub fn entries(&self) -> impl Iterator<Item = (String, Option<&[u8]>)> {
        let mut out = Vec::new();
        collect_entries(&self.root, "", &mut out);
        out.into_iter()
    }

    /// Returns an iterator over the full paths of all files in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = String> + '_ {
        self.entries()
            .filter_map(|(name, data)| data.map(|_| name))
    }
}

fn collect_entries<'a>(
    dir: &'a IndexMap<String, Node>,
    prefix: &str,
    out: &mut Vec<(String, Option<&'a [u8]>)>,
) {
    for (name, node) in dir {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        match node {
            Node::File(data) => out.push((path, Some(data.as_slice()))),
            Node::Directory(children) => {
                out.push((path.clone(), None));
                collect_entries(children, &path, out);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::U8Archive;

    #[test]
    fn set_creates_parents() -> Result<()> {
        let mut arc = U8Archive::new();
        arc.set("a/b/c.bin", Some(vec![1, 2, 3]))?;

        assert_eq!(arc.get("a")?, None);
        assert_eq!(arc.get("a/b")?, None);
        assert_eq!(arc.get("a/b/c.bin")?, Some(&[1u8, 2, 3][..]));
        assert_eq!(arc.len(), 1);

        Ok(())
    }

    #[test]
    fn set_none_is_directory_marker() -> Result<()> {
        let mut arc = U8Archive::new();
        arc.set("course/course1.bin", Some(vec![9]))?;
        arc.set("course", None)?;

        assert_eq!(arc.get("course/course1.bin")?, Some(&[9u8][..]));

        Ok(())
    }

    #[test]
    fn replace_keeps_order() -> Result<()> {
        let mut arc = U8Archive::new();
        arc.set("one", Some(vec![1]))?;
        arc.set("two", Some(vec![2]))?;
        arc.set("one", Some(vec![3]))?;

        let names: Vec<String> = arc.file_names().collect();
        assert_eq!(names, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(arc.get("one")?, Some(&[3u8][..]));

        Ok(())
    }

    #[test]
    fn get_missing_fails() {
        let arc = U8Archive::new();
        assert!(matches!(arc.get("missing"), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn lookup_is_case_sensitive() -> Result<()> {
        let mut arc = U8Archive::new();
        arc.set("Course/a", Some(vec![]))?;

        assert!(arc.contains("Course/a"));
        assert!(!arc.contains("course/a"));

        Ok(())
    }

    #[test]
    fn file_cannot_hold_children() -> Result<()> {
        let mut arc = U8Archive::new();
        arc.set("a", Some(vec![]))?;

        assert!(matches!(
            arc.set("a/b", Some(vec![])),
            Err(Error::NotADirectory(_))
        ));

        Ok(())
    }

    #[test]
    fn remove_entry() -> Result<()> {
        let mut arc = U8Archive::new();
        arc.set("a/b", Some(vec![1]))?;
        arc.set("a/c", Some(vec![2]))?;
        arc.remove("a/b")?;

        assert!(!arc.contains("a/b"));
        assert!(arc.contains("a/c"));
        assert!(arc.remove("a/b").is_err());

        Ok(())
    }

    #[test]
    fn empty_path_rejected() {
        let mut arc = U8Archive::new();
        assert!(matches!(arc.set("/", None), Err(Error::InvalidPath(_))));
    }
}
