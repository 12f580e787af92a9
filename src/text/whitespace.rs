//! White space collapsing.
//!
//! Produces a per-character collapse mask for one of the
//! `text-space-collapse` modes and rewrites collapsible segment breaks and
//! tabs to plain spaces in place.

use crate::style::SpaceCollapse;

/// Characters taking part in white space runs.
pub fn is_collapsible_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Compute the collapse mask for `text` under `mode`.
///
/// In a run of two or more space-class characters:
/// - `Collapse` / `Discard`: every character but the first collapses.
/// - `Preserve`: nothing collapses.
/// - `PreserveBreaks`: every character except line feeds collapses.
/// - `PreserveSpaces`: every line feed collapses.
///
/// Line feeds and tabs that stay are rewritten to spaces where the mode
/// doesn't preserve them.
pub fn collapse_spaces(text: &mut [char], mode: SpaceCollapse) -> Vec<bool> {
    let mut collapse = vec![false; text.len()];
    let mut i = 0;
    while i < text.len() {
        if !is_collapsible_space(text[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < text.len() && is_collapsible_space(text[i]) {
            i += 1;
        }
        if i - start >= 2 {
            for k in start..i {
                collapse[k] = match mode {
                    SpaceCollapse::Collapse | SpaceCollapse::Discard => k > start,
                    SpaceCollapse::Preserve => false,
                    SpaceCollapse::PreserveBreaks => text[k] != '\n',
                    SpaceCollapse::PreserveSpaces => text[k] == '\n',
                };
            }
        }
        for k in start..i {
            if collapse[k] {
                continue;
            }
            let rewrite = match (text[k], mode) {
                ('\n', SpaceCollapse::Collapse | SpaceCollapse::Discard | SpaceCollapse::PreserveSpaces) => true,
                ('\t', SpaceCollapse::Collapse | SpaceCollapse::Discard | SpaceCollapse::PreserveBreaks) => true,
                _ => false,
            };
            if rewrite {
                text[k] = ' ';
            }
        }
    }
    collapse
}

/// Whether a single space or line feed at a line edge collapses.
pub fn collapse_last_space(c: char, mode: SpaceCollapse) -> bool {
    if c == '\n' {
        return true;
    }
    if !is_collapsible_space(c) {
        return false;
    }
    match mode {
        SpaceCollapse::Collapse | SpaceCollapse::Discard | SpaceCollapse::PreserveBreaks => true,
        SpaceCollapse::Preserve | SpaceCollapse::PreserveSpaces => false,
    }
}

/// Whether a preserved trailing space hangs past the line end instead of
/// wrapping. Returns `(hangs, force)`: forced hanging applies unless the
/// space is followed by a forced break.
pub fn hang_last_space(
    c: char,
    mode: SpaceCollapse,
    wraps: bool,
    followed_by_forced_break: bool,
) -> (bool, bool) {
    if !is_collapsible_space(c) || c == '\n' {
        return (false, false);
    }
    let preserved = matches!(mode, SpaceCollapse::Preserve | SpaceCollapse::PreserveSpaces);
    if preserved && wraps {
        (true, !followed_by_forced_break)
    } else {
        (false, false)
    }
}
