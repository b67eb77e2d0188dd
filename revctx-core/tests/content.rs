//! Line splitting, range resolution and slicing.

use git2::Oid;
use revctx_core::source::{render_merge_list, short_message};
use revctx_core::{
    assemble, assemble_padded, range, Comment, Content, ContentClass, ContextError, Range,
    Revision, COMMIT_MSG, MERGE_LIST,
};

fn oid() -> Oid {
    Oid::from_str("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3").unwrap()
}

#[test]
fn trailing_newline_does_not_add_a_line() {
    assert_eq!(Content::from_text("a\nb\n").line_count(), 2);
    assert_eq!(Content::from_text("a\nb").line_count(), 2);
    assert_eq!(Content::from_text("").line_count(), 0);
    assert_eq!(Content::from_text("\n").line_count(), 1);
}

#[test]
fn blank_lines_are_kept() {
    let content = Content::from_text("a\n\n\nb\n");
    assert_eq!(content.line_count(), 4);
    assert_eq!(content.line(2), Some(""));
    assert_eq!(content.line(4), Some("b"));
}

#[test]
fn lines_are_one_based() {
    let content = Content::from_text("first\nsecond\n");
    assert_eq!(content.line(0), None);
    assert_eq!(content.line(1), Some("first"));
    assert_eq!(content.line(3), None);
}

#[test]
fn invalid_utf8_is_replaced_not_rejected() {
    let content = Content::from_bytes(b"ok\n\xff\xfe bad\n");
    assert_eq!(content.line(1), Some("ok"));
    assert!(content.line(2).unwrap().ends_with(" bad"));
}

#[test]
fn explicit_range_wins_and_becomes_half_open() {
    let comment = Comment::new(oid(), "a.txt").on_range(3, 7);
    assert_eq!(range::resolve(&comment), Some(Range::new(3, 8)));

    let single = Comment::new(oid(), "a.txt").on_line(9);
    assert_eq!(range::resolve(&single), Some(Range::new(9, 10)));
}

#[test]
fn file_level_comments_have_no_range() {
    assert_eq!(range::resolve(&Comment::new(oid(), "a.txt")), None);
    assert_eq!(range::resolve(&Comment::new(oid(), "a.txt").on_line(0)), None);
}

#[test]
fn assemble_boundaries() {
    let content = Content::from_text("1\n2\n3\n");

    assert_eq!(assemble(&content, Range::new(1, 4)).unwrap().len(), 3);
    assert_eq!(assemble(&content, Range::new(3, 4)).unwrap().get(3), Some("3"));

    for bad in [Range::new(0, 2), Range::new(2, 5), Range::new(2, 2), Range::new(3, 2)] {
        match assemble(&content, bad) {
            Err(ContextError::InvalidRange { range, line_count }) => {
                assert_eq!(range, bad);
                assert_eq!(line_count, 3);
            }
            other => panic!("{bad} should be invalid, got {other:?}"),
        }
    }
}

#[test]
fn invalid_range_message_names_the_line_count() {
    let err = assemble(&Content::from_text("only\n"), Range::new(1, 3)).unwrap_err();
    assert_eq!(err.to_string(), "invalid comment range [1, 3): text only contains 1 lines");
}

#[test]
fn padding_is_clamped_to_the_content() {
    let content = Content::from_text("1\n2\n3\n4\n5\n");

    let ctx = assemble_padded(&content, Range::new(3, 4), 1).unwrap();
    assert_eq!(ctx.line_numbers(), vec![2, 3, 4]);

    let ctx = assemble_padded(&content, Range::new(4, 6), 10).unwrap();
    assert_eq!(ctx.line_numbers(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn paths_select_content_classes() {
    assert_eq!(ContentClass::for_path(COMMIT_MSG), ContentClass::CommitMessage);
    assert_eq!(ContentClass::for_path(MERGE_LIST), ContentClass::MergeList { parent: 1 });
    assert_eq!(ContentClass::for_path("COMMIT_MSG"), ContentClass::File("COMMIT_MSG".to_owned()));
}

#[test]
fn short_message_folds_the_first_paragraph() {
    assert_eq!(short_message("Subject\n\nBody"), "Subject");
    assert_eq!(short_message("Wrapped\nsubject line\n\nBody"), "Wrapped subject line");
    assert_eq!(short_message("\n  Leading blank\n"), "Leading blank");
}

#[test]
fn merge_list_document_shape() {
    let merged = vec![Revision {
        id: oid(),
        tree: oid(),
        message: "Add feature\n\nDetails".to_owned(),
        parents: Vec::new(),
    }];

    let doc = render_merge_list(&merged);

    assert_eq!(doc, "Merge List:\n\n* a94a8fe5 Add feature\n");
    assert_eq!(Content::from_text(&doc).line_count(), 3);
}
