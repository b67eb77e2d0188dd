use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revctx_core::Comment;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository holding the reviewed commits
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// SQLite database with stored comments (overrides `db_path` in the config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a comment on a commit and print its id
    Add {
        /// Commit the comment is anchored to (`HEAD`, a branch, a hex id)
        rev: String,
        /// File path, `/COMMIT_MSG` or `/MERGE_LIST`
        path: String,
        /// Comment text
        body: String,
        #[command(flatten)]
        anchor: AnchorArgs,
    },
    /// Print the context of every comment stored for the repository
    Show {
        /// Extra lines shown before and after each comment's lines
        #[arg(long)]
        padding: Option<u32>,
        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the context of a comment without storing it
    Context {
        rev: String,
        path: String,
        #[command(flatten)]
        anchor: AnchorArgs,
        #[arg(long)]
        padding: Option<u32>,
    },
}

/// Where a comment points. Omitting both makes a file-level comment.
#[derive(clap::Args, Debug, Clone, Copy)]
#[group(multiple = false)]
pub struct AnchorArgs {
    /// Single line the comment refers to
    #[arg(long)]
    pub line: Option<u32>,

    /// Inclusive line span `START:END`
    #[arg(long, value_parser = parse_span)]
    pub range: Option<(u32, u32)>,
}

impl AnchorArgs {
    pub fn apply(self, comment: Comment) -> Comment {
        match (self.range, self.line) {
            (Some((start, end)), _) => comment.on_range(start, end),
            (None, Some(line)) => comment.on_line(line),
            (None, None) => comment,
        }
    }
}

fn parse_span(s: &str) -> Result<(u32, u32), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got `{s}`"))?;
    let start: u32 = start.trim().parse().map_err(|e| format!("bad start line: {e}"))?;
    let end: u32 = end.trim().parse().map_err(|e| format!("bad end line: {e}"))?;
    if start == 0 || end < start {
        return Err(format!("`{s}` is not a span of 1-based lines"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Oid;

    fn comment() -> Comment {
        Comment::new(Oid::from_str("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3").unwrap(), "a.txt")
    }

    #[test]
    fn spans_are_one_based_and_ordered() {
        assert_eq!(parse_span("3:7"), Ok((3, 7)));
        assert_eq!(parse_span(" 4 : 4 "), Ok((4, 4)));
        assert!(parse_span("0:2").is_err());
        assert!(parse_span("5:4").is_err());
        assert!(parse_span("5").is_err());
        assert!(parse_span("a:b").is_err());
    }

    #[test]
    fn range_anchor_takes_precedence_over_line() {
        let both = AnchorArgs { line: Some(9), range: Some((2, 4)) };
        let anchored = both.apply(comment());
        assert_eq!(anchored.range.map(|r| (r.start_line, r.end_line)), Some((2, 4)));
        assert_eq!(anchored.line_number, Some(4));

        let line = AnchorArgs { line: Some(9), range: None }.apply(comment());
        assert_eq!((line.range, line.line_number), (None, Some(9)));

        let none = AnchorArgs { line: None, range: None }.apply(comment());
        assert_eq!((none.range, none.line_number), (None, None));
    }

    #[test]
    fn line_and_range_flags_conflict() {
        let base = ["revctx", "context", "HEAD", "a.txt"];

        let parsed = Args::try_parse_from(base.into_iter().chain(["--line", "1", "--range", "1:2"]));
        assert!(parsed.is_err());

        let parsed = Args::try_parse_from(base.into_iter().chain(["--range", "1:2"])).unwrap();
        match parsed.command {
            Command::Context { anchor, .. } => assert_eq!(anchor.range, Some((1, 2))),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
