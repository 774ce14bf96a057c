//! Lineage: the route from a seed to every visited URL, as first discovered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// URL -> ordered URLs leading to it from a seed (ending with the URL itself).
pub type PathMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default)]
pub struct LineageTracker {
    paths: Mutex<PathMap>,
}

impl LineageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn paths(&self) -> MutexGuard<'_, PathMap> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `path` for `url` unless one is already recorded. Returns
    /// whether this call was the first writer.
    pub fn record_path(&self, url: &str, path: &[String]) -> bool {
        let mut paths = self.paths();
        if paths.contains_key(url) {
            return false;
        }
        paths.insert(url.to_string(), path.to_vec());
        true
    }

    pub fn path_of(&self, url: &str) -> Option<Vec<String>> {
        self.paths().get(url).cloned()
    }

    pub fn snapshot(&self) -> PathMap {
        self.paths().clone()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineageError {
    #[error("no root: no recorded path has length 1")]
    NoRoot,

    #[error("ambiguous root: {0} paths have length 1")]
    MultipleRoots(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageNode {
    pub url: String,
    pub children: Vec<LineageNode>,
}

impl LineageNode {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            children: Vec::new(),
        }
    }

    fn child_mut(&mut self, url: &str) -> &mut LineageNode {
        let idx = match self.children.iter().position(|c| c.url == url) {
            Some(idx) => idx,
            None => {
                self.children.push(LineageNode::new(url));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(LineageNode::size).sum::<usize>()
    }

    pub fn find(&self, url: &str) -> Option<&LineageNode> {
        if self.url == url {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(url))
    }

    /// Renders the subtree with box-drawing branches, one URL per line.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.url);
        for (i, child) in self.children.iter().enumerate() {
            child.render_into(&mut out, "", i == self.children.len() - 1);
        }
        out
    }

    fn render_into(&self, out: &mut String, prefix: &str, is_last: bool) {
        let branch = if is_last { "└── " } else { "├── " };
        out.push_str(&format!("{}{}{}\n", prefix, branch, self.url));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        for (i, child) in self.children.iter().enumerate() {
            child.render_into(out, &child_prefix, i == self.children.len() - 1);
        }
    }
}

/// Builds a rooted tree from recorded lineage.
///
/// The root is the single URL whose path has length 1. Paths that do not
/// start at that root are left out. Missing or ambiguous roots leave the
/// tree unavailable.
pub fn reconstruct_tree(path_map: &PathMap) -> Result<LineageNode, LineageError> {
    let roots: Vec<&String> = path_map
        .iter()
        .filter(|(_, path)| path.len() == 1)
        .map(|(url, _)| url)
        .collect();

    let root_url = match roots.as_slice() {
        [] => return Err(LineageError::NoRoot),
        [root] => *root,
        many => return Err(LineageError::MultipleRoots(many.len())),
    };

    let mut ordered: Vec<&Vec<String>> = path_map.values().filter(|p| p.len() > 1).collect();
    ordered.sort_by_key(|p| p.len());

    let mut root = LineageNode::new(root_url);
    for path in ordered {
        if path.first() != Some(root_url) {
            continue;
        }
        let mut node = &mut root;
        for url in &path[1..] {
            node = node.child_mut(url);
        }
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_first_writer_wins() {
        let tracker = LineageTracker::new();
        assert!(tracker.record_path("d", &path(&["a", "b", "d"])));
        assert!(!tracker.record_path("d", &path(&["a", "c", "d"])));
        assert_eq!(tracker.path_of("d"), Some(path(&["a", "b", "d"])));
    }

    #[test]
    fn test_diamond_keeps_first_discovery() {
        let tracker = LineageTracker::new();
        tracker.record_path("a", &path(&["a"]));
        tracker.record_path("b", &path(&["a", "b"]));
        tracker.record_path("c", &path(&["a", "c"]));
        tracker.record_path("d", &path(&["a", "c", "d"]));
        tracker.record_path("d", &path(&["a", "b", "d"]));

        let tree = reconstruct_tree(&tracker.snapshot()).unwrap();
        let c = tree.find("c").unwrap();
        assert_eq!(c.children.len(), 1);
        assert!(tree.find("b").unwrap().children.is_empty());
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_intermediate_nodes_are_created() {
        let mut map = PathMap::new();
        map.insert("a".into(), path(&["a"]));
        map.insert("z".into(), path(&["a", "x", "y", "z"]));

        let tree = reconstruct_tree(&map).unwrap();
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.children[0].url, "x");
        assert_eq!(tree.children[0].children[0].children[0].url, "z");
    }

    #[test]
    fn test_missing_root_is_unavailable() {
        let mut map = PathMap::new();
        map.insert("b".into(), path(&["a", "b"]));
        assert_eq!(reconstruct_tree(&map), Err(LineageError::NoRoot));
        assert_eq!(reconstruct_tree(&PathMap::new()), Err(LineageError::NoRoot));
    }

    #[test]
    fn test_multiple_roots_is_unavailable() {
        let mut map = PathMap::new();
        map.insert("a".into(), path(&["a"]));
        map.insert("b".into(), path(&["b"]));
        assert_eq!(reconstruct_tree(&map), Err(LineageError::MultipleRoots(2)));
    }

    #[test]
    fn test_render_draws_branches() {
        let mut map = PathMap::new();
        map.insert("a".into(), path(&["a"]));
        map.insert("b".into(), path(&["a", "b"]));
        map.insert("c".into(), path(&["a", "c"]));
        map.insert("d".into(), path(&["a", "b", "d"]));

        let rendered = reconstruct_tree(&map).unwrap().render();
        assert_eq!(rendered, "a\n├── b\n│   └── d\n└── c\n");
    }
}
