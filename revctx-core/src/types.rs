use std::collections::BTreeMap;
use std::fmt;

use git2::Oid;

/// Pseudo-path addressing the rendered commit message of a revision.
pub const COMMIT_MSG: &str = "/COMMIT_MSG";

/// Pseudo-path addressing the rendered list of commits brought in by a merge.
pub const MERGE_LIST: &str = "/MERGE_LIST";

/// The stored span of a range comment.
///
/// Both line numbers are inclusive and 1-based, as the comment model stores
/// them. Character offsets are carried through from storage; context
/// resolution works on whole lines and ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommentRange {
    pub start_line: u32,
    pub start_char: u32,
    pub end_line: u32,
    pub end_char: u32,
}

impl CommentRange {
    /// A range covering whole lines `start_line..=end_line`.
    pub fn lines(start_line: u32, end_line: u32) -> Self {
        Self { start_line, start_char: 0, end_line, end_char: 0 }
    }
}

/// A review comment anchored to a commit.
///
/// `file_path` is either a path in the commit's tree or one of the
/// [`COMMIT_MSG`] / [`MERGE_LIST`] pseudo-paths. A comment with neither a
/// `range` nor a positive `line_number` is a file-level comment and has no
/// context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment {
    pub id: String,           // UUID v4 text
    pub commit_id: Oid,
    pub file_path: String,
    pub line_number: Option<u32>,
    pub range: Option<CommentRange>,
    pub body: String,
}

impl Comment {
    /// Creates a file-level comment with a fresh id and an empty body.
    pub fn new(commit_id: Oid, file_path: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            commit_id,
            file_path: file_path.into(),
            line_number: None,
            range: None,
            body: String::new(),
        }
    }

    pub fn on_line(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }

    /// Anchors the comment to `start..=end`. The line number is set to the
    /// last line, matching how range comments are stored.
    pub fn on_range(mut self, start: u32, end: u32) -> Self {
        self.range = Some(CommentRange::lines(start, end));
        self.line_number = Some(end);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// A parsed commit, owned and detached from the store that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: Oid,
    pub tree: Oid,
    /// Full commit message, subject first.
    pub message: String,
    /// Parent ids in commit order; the first parent is index 0.
    pub parents: Vec<Oid>,
}

impl Revision {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Lines surrounding a comment, keyed by absolute 1-based line number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    lines: BTreeMap<u32, String>,
}

impl Context {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, line: u32) -> Option<&str> {
        self.lines.get(&line).map(String::as_str)
    }

    /// Iterates `(line_number, text)` pairs in ascending line order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines.iter().map(|(n, text)| (*n, text.as_str()))
    }

    pub fn line_numbers(&self) -> Vec<u32> {
        self.lines.keys().copied().collect()
    }
}

impl FromIterator<(u32, String)> for Context {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        Self { lines: iter.into_iter().collect() }
    }
}

/// Abbreviates an object id the way review UIs display it.
pub(crate) fn abbreviate(id: Oid) -> String {
    let mut hex = id.to_string();
    hex.truncate(8);
    hex
}

/// Formats `id` as its 8-character abbreviation.
pub struct Short(pub Oid);

impl fmt::Display for Short {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&abbreviate(self.0))
    }
}

/// A review session for one repository.
///
/// Sessions are keyed by UUID v4 text. The first comment on a repository
/// creates its session; later runs resume the most recent one.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,           // UUID v4 text
    pub repo_path: String,
    pub created_at: i64,      // Unix timestamp seconds
    pub updated_at: i64,      // Unix timestamp seconds
}
