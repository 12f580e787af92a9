//! # BiDi Text Support
//!
//! Implements UAX#9 (Unicode Bidirectional Algorithm) for mixed LTR/RTL text.
//! Uses `unicode-bidi` for analysis.
//!
//! Levels are resolved once for the whole buffer. The shaper splits its
//! runs wherever the level parity changes, and the visual order (L2) is
//! derived from the same levels.

use crate::style::Direction;
use unicode_bidi::{BidiInfo, Level};

/// Resolve the embedding level of every character.
///
/// Explicit embedding, override and isolate controls in `text` are honoured.
pub fn resolve_levels(text: &[char], direction: Direction) -> Vec<Level> {
    let base = match direction {
        Direction::Ltr => Level::ltr(),
        Direction::Rtl => Level::rtl(),
    };
    if text.is_empty() {
        return vec![];
    }
    if is_pure_ltr(text, direction) {
        return vec![base; text.len()];
    }

    let s: String = text.iter().collect();
    let bidi_info = BidiInfo::new(&s, Some(base));
    // The levels array is indexed by byte position.
    s.char_indices()
        .map(|(byte_idx, _)| bidi_info.levels.get(byte_idx).copied().unwrap_or(base))
        .collect()
}

/// Check if text is purely LTR (no RTL characters at all).
/// This is a fast path to skip BiDi processing for the common case.
pub fn is_pure_ltr(text: &[char], direction: Direction) -> bool {
    if matches!(direction, Direction::Rtl) {
        return false;
    }
    !text.iter().copied().any(is_rtl_char)
}

/// Check if a character has an RTL BiDi class (R, AL, or AN) or is an RTL
/// control.
fn is_rtl_char(ch: char) -> bool {
    matches!(ch,
        '\u{0590}'..='\u{05FF}' |  // Hebrew
        '\u{0600}'..='\u{06FF}' |  // Arabic
        '\u{0700}'..='\u{074F}' |  // Syriac
        '\u{0750}'..='\u{077F}' |  // Arabic Supplement
        '\u{0780}'..='\u{07BF}' |  // Thaana
        '\u{07C0}'..='\u{07FF}' |  // NKo
        '\u{0800}'..='\u{083F}' |  // Samaritan
        '\u{0840}'..='\u{085F}' |  // Mandaic
        '\u{08A0}'..='\u{08FF}' |  // Arabic Extended-A
        '\u{FB1D}'..='\u{FB4F}' |  // Hebrew Presentation Forms
        '\u{FB50}'..='\u{FDFF}' |  // Arabic Presentation Forms-A
        '\u{FE70}'..='\u{FEFF}' |  // Arabic Presentation Forms-B
        '\u{10800}'..='\u{10FFF}' | // Various RTL scripts
        '\u{1E800}'..='\u{1EEFF}' | // More RTL
        '\u{200F}' |               // RTL Mark
        '\u{202B}' |               // RTL Embedding
        '\u{202E}' |               // RTL Override
        '\u{2067}' |               // RTL Isolate
        '\u{2068}'                  // First strong isolate
    )
}

/// Visual order of the characters on one line.
///
/// `levels` are the logical-order levels of the line; the result maps visual
/// position to logical index.
pub fn visual_order(levels: &[Level]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    if levels.is_empty() {
        return order;
    }

    // L2: from the highest level down to the lowest odd level, reverse
    // every run at that level or higher.
    let min_level = levels.iter().copied().min().unwrap_or(Level::ltr());
    let max_level = levels.iter().copied().max().unwrap_or(Level::ltr());
    if !max_level.is_rtl() && max_level.number() == 0 {
        return order;
    }
    let min_odd = if min_level.is_rtl() {
        min_level.number()
    } else {
        min_level.number() + 1
    };

    let mut current = max_level.number();
    while current >= min_odd {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]].number() >= current {
                let start = i;
                while i < order.len() && levels[order[i]].number() >= current {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        if current == 0 {
            break;
        }
        current -= 1;
    }
    order
}
