//! Traversal paths
//!
//! A [`Path`] locates a node from the document root as an ordered list of
//! field names and array indices. Paths drive two things: zone
//! classification (see [`crate::zone`]) and key synthesis (see [`crate::key`]).
//! Segments are stored raw; sanitizing happens only when a key is built.

use std::fmt;

/// One step from a parent node to a child node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object field name, unsanitized
    Field(String),
    /// Array element position
    Index(usize),
}

impl Segment {
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Segment::Field(name) => Some(name),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(idx) => Some(*idx),
            Segment::Field(_) => None,
        }
    }

    /// A field segment whose name is all digits behaves like an index for
    /// classification purposes.
    pub fn is_numeric(&self) -> bool {
        match self {
            Segment::Index(_) => true,
            Segment::Field(name) => !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Immutable location of a node. Extending a path returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a dotted path; all-digit parts become indices.
    ///
    /// Only used to spell paths in tests and configuration, never for keys.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        let segments = dotted
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(idx) => Segment::Index(idx),
                Err(_) => Segment::Field(part.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn child_field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Self { segments }
    }

    pub fn child_index(&self, idx: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(idx));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path without its last segment (the root stays the root).
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Field names only, numeric segments discarded.
    pub fn named_segments(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter(|s| !s.is_numeric())
            .filter_map(Segment::as_field)
            .collect()
    }

    /// True if the trailing field names equal `names`, ignoring indices.
    pub fn ends_with(&self, names: &[&str]) -> bool {
        let named = self.named_segments();
        named.len() >= names.len() && named[named.len() - names.len()..] == *names
    }

    /// True if any field segment equals `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s.as_field() == Some(name))
    }

    /// True if `first` is immediately followed by `second` once numeric
    /// segments are discarded.
    pub fn contains_adjacent(&self, first: &str, second: &str) -> bool {
        self.named_segments()
            .windows(2)
            .any(|pair| pair[0] == first && pair[1] == second)
    }

    /// True if field `name` is immediately followed by a numeric segment.
    pub fn contains_indexed(&self, name: &str) -> bool {
        self.last_indexed(name).is_some()
    }

    /// Position of the last `name` field that is directly followed by an
    /// index, together with that index.
    pub fn last_indexed(&self, name: &str) -> Option<(usize, usize)> {
        self.segments
            .windows(2)
            .enumerate()
            .rev()
            .find_map(|(pos, pair)| match (&pair[0], &pair[1]) {
                (Segment::Field(field), Segment::Index(idx)) if field == name => Some((pos, *idx)),
                _ => None,
            })
    }

    /// Prefix containing the first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
