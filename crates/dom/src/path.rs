//! Structural element paths.
//!
//! A path names an element by tag and 1-based position among same-tag
//! siblings at every level, starting either at the document root
//! (`/html[1]/body[1]/p[2]`) or at an element with a unique identifier
//! (`id("main")/p[1]`). The string form is what gets persisted.
//!
//! Highlight wrappers are transparent to paths: their children are counted
//! as children of the wrapper's parent, so wrapping text never shifts the
//! positions of the elements around it.
//!
//! Paths are positional, not identity-based. A resolved path is only a hint
//! and callers must validate the text it points at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParsePathError;
use crate::node::NodeId;
use crate::tree::DocumentTree;

/// One level of a structural path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub tag: String,
    /// 1-based position among same-tag siblings.
    pub index: usize,
}

impl PathStep {
    pub fn new(tag: impl Into<String>, index: usize) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            index,
        }
    }
}

/// Where a path starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathRoot {
    Document,
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralPath {
    root: PathRoot,
    steps: Vec<PathStep>,
}

impl StructuralPath {
    /// A path rooted at the document element. `steps[0]` names the root itself.
    pub fn from_document(steps: Vec<PathStep>) -> Self {
        Self {
            root: PathRoot::Document,
            steps,
        }
    }

    /// A path rooted at the element carrying `id`.
    pub fn from_id(id: impl Into<String>, steps: Vec<PathStep>) -> Self {
        Self {
            root: PathRoot::Id(id.into()),
            steps,
        }
    }

    pub fn root(&self) -> &PathRoot {
        &self.root
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Identifiers that can be written inside `id("...")` without escaping.
    pub fn is_addressable_id(id: &str) -> bool {
        !id.is_empty() && !id.contains('"')
    }

    /// Walk the path in `tree`. Returns `None` when any level is missing.
    pub fn resolve<T: DocumentTree + ?Sized>(&self, tree: &T) -> Option<NodeId> {
        let (mut current, remaining) = match &self.root {
            PathRoot::Id(id) => (tree.element_by_id(id)?, self.steps.as_slice()),
            PathRoot::Document => {
                let (first, rest) = self.steps.split_first()?;
                let root = tree.root();
                let tag = tree.tag_name(root)?;
                if first.index != 1 || !tag.eq_ignore_ascii_case(&first.tag) {
                    return None;
                }
                (root, rest)
            }
        };

        for step in remaining {
            current = tree
                .addressable_children(current)
                .into_iter()
                .filter(|child| {
                    tree.tag_name(*child)
                        .is_some_and(|tag| tag.eq_ignore_ascii_case(&step.tag))
                })
                .nth(step.index.checked_sub(1)?)?;
        }
        Some(current)
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let PathRoot::Id(id) = &self.root {
            write!(f, "id(\"{id}\")")?;
        }
        for step in &self.steps {
            write!(f, "/{}[{}]", step.tag, step.index)?;
        }
        Ok(())
    }
}

impl FromStr for StructuralPath {
    type Err = ParsePathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParsePathError::Empty);
        }

        let (root, rest) = if let Some(after) = raw.strip_prefix("id(\"") {
            let close = after
                .find("\")")
                .ok_or_else(|| ParsePathError::BadIdentifier(raw.to_string()))?;
            let id = &after[..close];
            if !Self::is_addressable_id(id) {
                return Err(ParsePathError::BadIdentifier(raw.to_string()));
            }
            (PathRoot::Id(id.to_string()), &after[close + 2..])
        } else if raw.starts_with('/') {
            (PathRoot::Document, raw)
        } else {
            return Err(ParsePathError::MissingRoot(raw.to_string()));
        };

        if !rest.is_empty() && !rest.starts_with('/') {
            return Err(ParsePathError::MissingRoot(raw.to_string()));
        }

        let steps = rest
            .split('/')
            .skip(1)
            .map(parse_step)
            .collect::<Result<Vec<_>, _>>()?;

        if matches!(root, PathRoot::Document) && steps.is_empty() {
            return Err(ParsePathError::Empty);
        }
        Ok(Self { root, steps })
    }
}

fn parse_step(raw: &str) -> Result<PathStep, ParsePathError> {
    let bad = || ParsePathError::BadStep(raw.to_string());
    let open = raw.find('[').ok_or_else(bad)?;
    let index_part = raw[open + 1..].strip_suffix(']').ok_or_else(bad)?;
    let tag = &raw[..open];
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_') {
        return Err(bad());
    }
    let index: usize = index_part.parse().map_err(|_| bad())?;
    if index == 0 {
        return Err(bad());
    }
    Ok(PathStep::new(tag, index))
}

impl Serialize for StructuralPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StructuralPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for raw in [
            "/html[1]/body[1]/div[2]/p[3]",
            "id(\"main\")",
            "id(\"main\")/section[1]/p[2]",
        ] {
            let path: StructuralPath = raw.parse().unwrap();
            assert_eq!(path.to_string(), raw);
        }
    }

    #[test]
    fn parse_lowercases_tags() {
        let path: StructuralPath = "/HTML[1]/BODY[1]".parse().unwrap();
        assert_eq!(path.steps()[1], PathStep::new("body", 1));
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!("".parse::<StructuralPath>(), Err(ParsePathError::Empty));
        assert_eq!("/".parse::<StructuralPath>(), Err(ParsePathError::BadStep(String::new())));
        assert!(matches!(
            "html[1]".parse::<StructuralPath>(),
            Err(ParsePathError::MissingRoot(_))
        ));
        assert!(matches!(
            "/p[0]".parse::<StructuralPath>(),
            Err(ParsePathError::BadStep(_))
        ));
        assert!(matches!(
            "/p[x]".parse::<StructuralPath>(),
            Err(ParsePathError::BadStep(_))
        ));
        assert!(matches!(
            "id(\"main\"".parse::<StructuralPath>(),
            Err(ParsePathError::BadIdentifier(_))
        ));
        assert!(matches!(
            "id(\"main\")p[1]".parse::<StructuralPath>(),
            Err(ParsePathError::MissingRoot(_))
        ));
    }

    #[test]
    fn serializes_as_plain_string() {
        let path = StructuralPath::from_id("intro", vec![PathStep::new("p", 2)]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"id(\\\"intro\\\")/p[2]\"");
        let back: StructuralPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
