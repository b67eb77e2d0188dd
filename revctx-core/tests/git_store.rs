//! Context resolution against real repositories built with git2.

use std::collections::BTreeMap;
use std::path::Path;

use git2::{Commit, Oid, Repository, Signature, Time};
use revctx_core::{
    Comment, ContextError, ContextLoader, GitStore, ParallelContextLoader, RevisionStore,
    StoreError, StoreSource, COMMIT_MSG, MERGE_LIST,
};

fn write_tree(repo: &Repository, files: &[(&str, &str)]) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    let mut dirs: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
    for (path, text) in files {
        match path.split_once('/') {
            Some((dir, rest)) => dirs.entry(dir).or_default().push((rest, *text)),
            None => {
                let blob = repo.blob(text.as_bytes()).unwrap();
                builder.insert(*path, blob, 0o100644).unwrap();
            }
        }
    }
    for (dir, entries) in dirs {
        let sub = write_tree(repo, &entries);
        builder.insert(dir, sub, 0o040000).unwrap();
    }
    builder.write().unwrap()
}

/// Commits `files` on top of `parents`. `time` orders commits in revwalks.
fn commit(repo: &Repository, time: i64, message: &str, parents: &[Oid], files: &[(&str, &str)]) -> Oid {
    let tree = repo.find_tree(write_tree(repo, files)).unwrap();
    let sig = Signature::new("Reviewer", "reviewer@example.com", &Time::new(time, 0)).unwrap();
    let parents: Vec<Commit<'_>> = parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
    let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
    repo.commit(None, &sig, &sig, message, &tree, &parent_refs).unwrap()
}

fn point_main_at(repo: &Repository, id: Oid) {
    repo.reference("refs/heads/main", id, true, "test").unwrap();
    repo.set_head("refs/heads/main").unwrap();
}

struct Fixture {
    dir: tempfile::TempDir,
    base: Oid,
    mainline: Oid,
    topic_one: Oid,
    topic_two: Oid,
    merge: Oid,
}

impl Fixture {
    fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// base ── mainline ──────────── merge
///    └── topic one ── topic two ──┘
fn history() -> Fixture {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    let base = commit(&repo, 1_700_000_000, "Base\n", &[], &[
        ("a.txt", "line1\nline2\nline3\nline4\nline5\n"),
        ("src/lib.rs", "pub fn lib() {}\r\n// windows\r\n"),
    ]);
    let mainline = commit(&repo, 1_700_000_100, "Mainline work\n", &[base], &[
        ("a.txt", "line1\nline2\nline3\nline4\nline5\nline6\n"),
        ("src/lib.rs", "pub fn lib() {}\r\n// windows\r\n"),
    ]);
    let topic_one = commit(&repo, 1_700_000_200, "Topic one\n\nLonger body.\n", &[base], &[
        ("a.txt", "line1\nline2\nline3\nline4\nline5\n"),
        ("topic.txt", "one\n"),
    ]);
    let topic_two = commit(&repo, 1_700_000_300, "Topic two\n", &[topic_one], &[
        ("a.txt", "line1\nline2\nline3\nline4\nline5\n"),
        ("topic.txt", "one\ntwo\n"),
    ]);
    let merge = commit(&repo, 1_700_000_400, "Merge topic\n\nDetails\n", &[mainline, topic_two], &[
        ("a.txt", "line1\nline2\nline3\nline4\nline5\nline6\n"),
        ("topic.txt", "one\ntwo\n"),
    ]);
    point_main_at(&repo, merge);

    Fixture { dir, base, mainline, topic_one, topic_two, merge }
}

fn git_loader(path: &Path) -> ContextLoader<StoreSource<GitStore>> {
    ContextLoader::new(StoreSource::new(GitStore::open(path).unwrap()))
}

#[test]
fn file_range_from_a_git_tree() {
    let fx = history();
    let comment = Comment::new(fx.base, "a.txt").on_range(2, 3);

    let contexts = git_loader(fx.path()).get_context([&comment]).unwrap();

    let lines: Vec<_> = contexts[&comment].iter().collect();
    assert_eq!(lines, vec![(2, "line2"), (3, "line3")]);
}

#[test]
fn nested_path_is_resolved_and_crlf_is_stripped() {
    let fx = history();
    let comment = Comment::new(fx.base, "src/lib.rs").on_range(1, 2);

    let contexts = git_loader(fx.path()).get_context([&comment]).unwrap();

    let lines: Vec<_> = contexts[&comment].iter().collect();
    assert_eq!(lines, vec![(1, "pub fn lib() {}"), (2, "// windows")]);
}

#[test]
fn directories_and_missing_paths_have_no_context() {
    let fx = history();
    let dir = Comment::new(fx.base, "src").on_line(1);
    let missing = Comment::new(fx.base, "topic.txt").on_line(1);

    let contexts = git_loader(fx.path()).get_context([&dir, &missing]).unwrap();

    assert!(contexts[&dir].is_empty());
    assert!(contexts[&missing].is_empty());
}

#[test]
fn malformed_paths_are_missing_without_failing_the_batch() {
    let fx = history();
    let paths = ["", "/a.txt", "./a.txt", "src/../a.txt", "src//lib.rs", "a.txt/", "/PATCHSET_LEVEL"];
    let odd: Vec<Comment> = paths
        .into_iter()
        .map(|path| Comment::new(fx.base, path).on_line(1))
        .collect();
    let sibling = Comment::new(fx.base, "a.txt").on_line(1);

    let contexts = git_loader(fx.path()).get_context(odd.iter().chain([&sibling])).unwrap();

    for comment in &odd {
        assert!(contexts[comment].is_empty(), "{:?} should have no context", comment.file_path);
    }
    assert_eq!(contexts[&sibling].get(1), Some("line1"));
}

#[test]
fn same_path_differs_between_commits() {
    let fx = history();
    let old = Comment::new(fx.base, "a.txt").on_line(6);
    let new = Comment::new(fx.mainline, "a.txt").on_line(6);

    let ok = git_loader(fx.path()).get_context([&new]).unwrap();
    assert_eq!(ok[&new].get(6), Some("line6"));

    let err = git_loader(fx.path()).get_context([&old, &new]).unwrap_err();
    assert!(matches!(err, ContextError::InvalidRange { line_count: 5, .. }));
}

#[test]
fn commit_message_of_a_git_commit() {
    let fx = history();
    let comment = Comment::new(fx.merge, COMMIT_MSG).on_range(1, 3);

    let contexts = git_loader(fx.path()).get_context([&comment]).unwrap();

    let lines: Vec<_> = contexts[&comment].iter().collect();
    assert_eq!(lines, vec![(1, "Merge topic"), (2, ""), (3, "Details")]);
}

#[test]
fn merge_list_of_a_git_merge() {
    let fx = history();
    let comment = Comment::new(fx.merge, MERGE_LIST).on_range(1, 4);

    let contexts = git_loader(fx.path()).get_context([&comment]).unwrap();

    let short = |id: Oid| id.to_string()[..8].to_owned();
    let lines: Vec<_> = contexts[&comment].iter().map(|(_, t)| t.to_owned()).collect();
    assert_eq!(
        lines,
        vec![
            "Merge List:".to_owned(),
            String::new(),
            format!("* {} Topic two", short(fx.topic_two)),
            format!("* {} Topic one", short(fx.topic_one)),
        ]
    );
}

#[test]
fn merged_commits_exclude_the_first_parent_history() {
    let fx = history();
    let store = GitStore::open(fx.path()).unwrap();
    let merge = store.parse_revision(fx.merge).unwrap();

    let ids: Vec<Oid> = store.merged_commits(&merge, 1).unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![fx.topic_two, fx.topic_one]);

    let ids: Vec<Oid> = store.merged_commits(&merge, 2).unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![fx.mainline]);
}

#[test]
fn revision_specs_resolve_to_commits() {
    let fx = history();
    let store = GitStore::open(fx.path()).unwrap();

    assert_eq!(store.resolve_spec("HEAD").unwrap(), fx.merge);
    assert_eq!(store.resolve_spec("main^1").unwrap(), fx.mainline);
    assert_eq!(store.resolve_spec("main^2").unwrap(), fx.topic_two);
    assert_eq!(store.resolve_spec(&fx.base.to_string()).unwrap(), fx.base);
    assert!(store.resolve_spec("no-such-branch").is_err());
}

#[test]
fn unknown_commit_is_reported_by_id() {
    let fx = history();
    let bogus = Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
    let comment = Comment::new(bogus, "a.txt").on_line(1);

    let err = git_loader(fx.path()).get_context([&comment]).unwrap_err();

    assert!(matches!(err, ContextError::Storage(StoreError::RevisionNotFound(id)) if id == bogus));
}

#[test]
fn parallel_loader_opens_a_repository_per_worker() {
    let fx = history();
    let mut comments = Vec::new();
    for id in [fx.base, fx.mainline, fx.topic_one, fx.topic_two, fx.merge] {
        comments.push(Comment::new(id, "a.txt").on_range(1, 5));
        comments.push(Comment::new(id, COMMIT_MSG).on_line(1));
        comments.push(Comment::new(id, "topic.txt").on_line(1));
        comments.push(Comment::new(id, "a.txt"));
    }
    comments.push(Comment::new(fx.merge, MERGE_LIST).on_line(3));

    let sequential = git_loader(fx.path()).get_context(&comments).unwrap();
    let parallel = ParallelContextLoader::new(|| GitStore::open(fx.path()).map(StoreSource::new))
        .workers(4)
        .get_context(&comments)
        .unwrap();

    assert_eq!(parallel.len(), comments.len());
    assert_eq!(parallel, sequential);
}

#[test]
fn parallel_loader_reports_unopenable_repository() {
    let dir = tempfile::TempDir::new().unwrap();
    let id = Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
    let comments = vec![Comment::new(id, "a.txt").on_line(1)];

    let result = ParallelContextLoader::new(|| GitStore::open(dir.path()).map(StoreSource::new))
        .get_context(&comments);

    assert!(matches!(result, Err(ContextError::Storage(StoreError::Git(_)))));
}
