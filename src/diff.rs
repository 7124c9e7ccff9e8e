//! Minimal line-level patch between two snapshots.
//!
//! Lines are split on `\n` (a trailing newline yields a trailing empty line).
//! The edit script is a shortest one (Myers), so the unchanged lines form a
//! longest common subsequence of both sides. Output is a `--- old` /
//! `+++ new` header followed by one `-line` or `+line` per change, in
//! document order. Within each run of changes all deletions precede the
//! insertions. No context lines, no hunk headers.

use similar::{Algorithm, ChangeTag, TextDiff};

pub const OLD_HEADER: &str = "--- old";
pub const NEW_HEADER: &str = "+++ new";

pub fn unified(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(&old_lines, &new_lines);

    let mut patch = format!("{OLD_HEADER}\n{NEW_HEADER}\n");
    let mut deleted: Vec<&str> = Vec::new();
    let mut inserted: Vec<&str> = Vec::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => deleted.push(change.value()),
            ChangeTag::Insert => inserted.push(change.value()),
            ChangeTag::Equal => flush(&mut patch, &mut deleted, &mut inserted),
        }
    }
    flush(&mut patch, &mut deleted, &mut inserted);

    patch
}

fn flush(patch: &mut String, deleted: &mut Vec<&str>, inserted: &mut Vec<&str>) {
    for line in deleted.drain(..) {
        patch.push('-');
        patch.push_str(line);
        patch.push('\n');
    }
    for line in inserted.drain(..) {
        patch.push('+');
        patch.push_str(line);
        patch.push('\n');
    }
}

/// Count of `(deleted, inserted)` lines in a patch produced by [`unified`].
pub fn change_counts(patch: &str) -> (usize, usize) {
    patch
        .lines()
        .skip(2)
        .fold((0, 0), |(del, ins), line| match line.as_bytes().first() {
            Some(b'-') => (del + 1, ins),
            Some(b'+') => (del, ins + 1),
            _ => (del, ins),
        })
}
