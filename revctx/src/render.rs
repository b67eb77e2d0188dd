//! Plain-text output of resolved comment contexts.

use std::io::{self, Write};

use revctx_core::{Comment, Context, ContextMap, Short};

/// `:N` for a line comment, `:S-E` for a range comment, nothing otherwise.
pub fn anchor_label(comment: &Comment) -> String {
    match (comment.range, comment.line_number) {
        (Some(r), _) => format!(":{}-{}", r.start_line, r.end_line),
        (None, Some(n)) if n > 0 => format!(":{n}"),
        _ => String::new(),
    }
}

/// Writes one comment: a header line, its body, then its numbered context.
pub fn write_comment(out: &mut impl Write, comment: &Comment, context: &Context) -> io::Result<()> {
    writeln!(
        out,
        "{} {}{}  [{}]",
        Short(comment.commit_id),
        comment.file_path,
        anchor_label(comment),
        comment.id
    )?;
    if !comment.body.is_empty() {
        for line in comment.body.lines() {
            writeln!(out, "  > {line}")?;
        }
    }
    if context.is_empty() {
        writeln!(out, "    (no context)")?;
    }
    for (n, text) in context.iter() {
        writeln!(out, "{n:>6} | {text}")?;
    }
    writeln!(out)
}

/// Writes every comment in input order.
pub fn write_all(out: &mut impl Write, comments: &[Comment], contexts: &ContextMap<'_>) -> io::Result<()> {
    let empty = Context::empty();
    for comment in comments {
        let context = contexts.get(comment).unwrap_or(&empty);
        write_comment(out, comment, context)?;
    }
    Ok(())
}
