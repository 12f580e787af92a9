//! # Break Classification
//!
//! Line break opportunities (UAX#14 via `unicode-linebreak`), word and
//! grapheme boundaries (UAX#29 via `unicode-segmentation`), justification
//! opportunities and hanging punctuation.
//!
//! All results are indexed by char and describe the position *after* that
//! character.

use crate::style::{HangingPunctuation, LineBreak, ResolvedStyle, WordBreak};
use serde::Serialize;
use std::ops::Range;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_script::{Script, UnicodeScript};
use unicode_segmentation::UnicodeSegmentation;

/// Break opportunity after a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BreakType {
    #[default]
    NoBreak,
    SoftBreak,
    HardBreak,
}

/// What happens to a character sitting at a line edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LineEdgeBehaviour {
    #[default]
    NoChange,
    Collapse,
    /// Always hangs outside the line box.
    ForceHang,
    /// Hangs only when it wouldn't otherwise fit.
    ConditionallyHang,
}

/// Coarse language buckets with distinct break tailoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LangBucket {
    Ja,
    Ko,
    Zh,
    #[default]
    Other,
}

impl LangBucket {
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return LangBucket::Other;
        };
        let primary = tag.split(['-', '_']).next().unwrap_or(tag).to_lowercase();
        match primary.as_str() {
            "ja" => LangBucket::Ja,
            "ko" => LangBucket::Ko,
            "zh" => LangBucket::Zh,
            _ => LangBucket::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakSettings {
    pub line_break: LineBreak,
    pub word_break: WordBreak,
    pub lang: LangBucket,
}

impl BreakSettings {
    pub fn from_style(style: &ResolvedStyle) -> Self {
        Self {
            line_break: style.line_break,
            word_break: style.word_break,
            lang: LangBucket::from_tag(style.lang.as_deref()),
        }
    }
}

/// Characters that force a line break.
pub fn is_hard_break_char(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Copy of `text` with forced breaks replaced by spaces, for bidi analysis
/// and shaping.
pub fn replace_hard_breaks(text: &[char]) -> Vec<char> {
    text.iter()
        .map(|&c| if is_hard_break_char(c) { ' ' } else { c })
        .collect()
}

/// Small kana and the prolonged sound mark (UAX#14 class CJ).
fn is_conditional_japanese_starter(c: char) -> bool {
    matches!(c,
        'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' | 'っ' | 'ゃ' | 'ゅ' | 'ょ' | 'ゎ' | 'ゕ' | 'ゖ' |
        'ァ' | 'ィ' | 'ゥ' | 'ェ' | 'ォ' | 'ッ' | 'ャ' | 'ュ' | 'ョ' | 'ヮ' | 'ヵ' | 'ヶ' |
        'ー' | '\u{31F0}'..='\u{31FF}' | '\u{FF67}'..='\u{FF70}'
    )
}

fn is_iteration_mark(c: char) -> bool {
    matches!(c, '々' | '〻' | 'ゝ' | 'ゞ' | 'ヽ' | 'ヾ')
}

fn is_hangul(c: char) -> bool {
    c.script() == Script::Hangul
}

fn is_cjk(c: char) -> bool {
    matches!(
        c.script(),
        Script::Han | Script::Hiragana | Script::Katakana | Script::Bopomofo
    )
}

/// Line break opportunities after each character.
///
/// The break at the very end of the text counts only if the last character
/// is itself a forced break.
pub fn line_breaks(text: &[char], settings: &BreakSettings) -> Vec<BreakType> {
    let count = text.len();
    let mut result = vec![BreakType::NoBreak; count];
    if count == 0 {
        return result;
    }
    let s: String = text.iter().collect();
    let byte_to_char = byte_to_char_map(&s);

    for (byte_offset, opp) in linebreaks(&s) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx == 0 {
            continue;
        }
        let i = char_idx - 1;
        if char_idx == count && !is_hard_break_char(text[i]) {
            continue;
        }
        result[i] = match opp {
            BreakOpportunity::Mandatory => BreakType::HardBreak,
            BreakOpportunity::Allowed => BreakType::SoftBreak,
        };
    }

    tailor(text, &mut result, settings);
    result
}

fn tailor(text: &[char], result: &mut [BreakType], settings: &BreakSettings) {
    let cj_lang = matches!(settings.lang, LangBucket::Ja | LangBucket::Zh);
    for i in 0..text.len().saturating_sub(1) {
        if result[i] == BreakType::HardBreak {
            continue;
        }
        let (c, next) = (text[i], text[i + 1]);
        if settings.line_break == LineBreak::Anywhere {
            result[i] = BreakType::SoftBreak;
            continue;
        }
        if settings.lang == LangBucket::Ko
            && settings.word_break == WordBreak::Normal
            && is_hangul(c)
            && is_hangul(next)
        {
            // Korean breaks between words, not between syllables.
            result[i] = BreakType::NoBreak;
            continue;
        }
        match settings.word_break {
            WordBreak::BreakAll if c.is_alphanumeric() && next.is_alphanumeric() => {
                result[i] = BreakType::SoftBreak;
            }
            WordBreak::KeepAll if c.is_alphabetic() && next.is_alphabetic() => {
                result[i] = BreakType::NoBreak;
                continue;
            }
            _ => {}
        }
        let relaxed = matches!(
            settings.line_break,
            LineBreak::Auto | LineBreak::Normal | LineBreak::Loose
        );
        if relaxed && cj_lang && is_cjk(c) && is_conditional_japanese_starter(next) {
            result[i] = BreakType::SoftBreak;
        }
        if settings.line_break == LineBreak::Loose && is_cjk(c) && is_iteration_mark(next) {
            result[i] = BreakType::SoftBreak;
        }
    }
}

/// Re-classify `range` with its own settings and one character of left
/// context, then patch the result in. The break after the last character of
/// the range depends on what follows it and keeps the global decision.
pub fn patch_line_breaks(
    text: &[char],
    breaks: &mut [BreakType],
    range: Range<usize>,
    settings: &BreakSettings,
) {
    debug_assert_eq!(text.len(), breaks.len());
    if range.is_empty() || range.end > text.len() {
        return;
    }
    let context_start = range.start.saturating_sub(1);
    let local = line_breaks(&text[context_start..range.end], settings);
    for i in range.start..range.end - 1 {
        breaks[i] = local[i - context_start];
    }
}

/// Whether a UAX#29 word boundary follows each character.
pub fn word_boundaries(text: &[char]) -> Vec<bool> {
    let s: String = text.iter().collect();
    let byte_to_char = byte_to_char_map(&s);
    let mut result = vec![false; text.len()];
    for (start, word) in s.split_word_bound_indices() {
        let end = byte_to_char[start + word.len()];
        if end > 0 {
            result[end - 1] = true;
        }
    }
    result
}

/// Whether an extended grapheme cluster boundary follows each character.
pub fn grapheme_boundaries(text: &[char]) -> Vec<bool> {
    let s: String = text.iter().collect();
    let byte_to_char = byte_to_char_map(&s);
    let mut result = vec![false; text.len()];
    for (start, g) in s.grapheme_indices(true) {
        let end = byte_to_char[start + g.len()];
        if end > 0 {
            result[end - 1] = true;
        }
    }
    result
}

/// Word separators, which take `word-spacing` and justification slack.
pub fn is_word_separator(c: char) -> bool {
    matches!(
        c,
        ' ' | '\u{A0}' | '\u{1361}' | '\u{10100}' | '\u{10101}' | '\u{1039F}' | '\u{1091F}'
    )
}

/// Justification opportunities as `(before, after)` per character.
///
/// Word separators take slack after themselves; CJK characters take it on
/// both sides.
pub fn justification_opportunities(text: &[char]) -> Vec<(bool, bool)> {
    text.iter()
        .map(|&c| {
            if is_word_separator(c) {
                (false, true)
            } else if is_cjk(c) {
                (true, true)
            } else {
                (false, false)
            }
        })
        .collect()
}

fn is_opening_punctuation(c: char) -> bool {
    matches!(
        c,
        '(' | '[' | '{' | '«' | '‹' | '‘' | '“' | '„' | '‚' | '"' | '\''
            | '「' | '『' | '（' | '【' | '〔' | '〈' | '《' | '［' | '｛' | '｢'
    )
}

fn is_closing_punctuation(c: char) -> bool {
    matches!(
        c,
        ')' | ']' | '}' | '»' | '›' | '’' | '”' | '"' | '\''
            | '」' | '』' | '）' | '】' | '〕' | '〉' | '》' | '］' | '｝' | '｣'
    )
}

fn is_stop_or_comma(c: char) -> bool {
    matches!(
        c,
        ',' | '.' | '\u{060C}' | '\u{06D4}' | '、' | '。' | '，' | '．'
            | '\u{FE50}' | '\u{FE51}' | '\u{FE52}' | '\u{FF61}' | '\u{FF64}'
    )
}

/// Line edge behaviour from `hanging-punctuation`, as `(start, end)`.
pub fn hanging_behaviour(c: char, hp: HangingPunctuation) -> (LineEdgeBehaviour, LineEdgeBehaviour) {
    let start = if hp.first && is_opening_punctuation(c) {
        LineEdgeBehaviour::ForceHang
    } else {
        LineEdgeBehaviour::NoChange
    };
    let end = if hp.last && is_closing_punctuation(c) {
        LineEdgeBehaviour::ForceHang
    } else if hp.force_end && is_stop_or_comma(c) {
        LineEdgeBehaviour::ForceHang
    } else if hp.allow_end && is_stop_or_comma(c) {
        LineEdgeBehaviour::ConditionallyHang
    } else {
        LineEdgeBehaviour::NoChange
    };
    (start, end)
}

fn byte_to_char_map(text: &str) -> Vec<usize> {
    let mut map = vec![0usize; text.len() + 1];
    let mut char_idx = 0;
    for (byte_idx, _) in text.char_indices() {
        map[byte_idx] = char_idx;
        char_idx += 1;
    }
    map[text.len()] = char_idx;
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_breaks_after_spaces() {
        let text = chars("Hello World");
        let breaks = line_breaks(&text, &BreakSettings::default());
        assert_eq!(breaks.len(), 11);
        assert_eq!(breaks[5], BreakType::SoftBreak);
        assert_eq!(breaks[10], BreakType::NoBreak);
        assert_eq!(breaks.iter().filter(|b| **b != BreakType::NoBreak).count(), 1);
    }

    #[test]
    fn test_hard_break_on_newline() {
        let text = chars("a\nb\n");
        let breaks = line_breaks(&text, &BreakSettings::default());
        assert_eq!(breaks[1], BreakType::HardBreak);
        assert_eq!(breaks[3], BreakType::HardBreak);
    }

    #[test]
    fn test_anywhere_and_keep_all() {
        let text = chars("abc def");
        let anywhere = BreakSettings {
            line_break: LineBreak::Anywhere,
            ..Default::default()
        };
        assert!(line_breaks(&text, &anywhere)[..6].iter().all(|b| *b == BreakType::SoftBreak));

        let cjk = chars("漢字漢字");
        let normal = line_breaks(&cjk, &BreakSettings::default());
        assert_eq!(normal[0], BreakType::SoftBreak);
        let keep = BreakSettings {
            word_break: WordBreak::KeepAll,
            ..Default::default()
        };
        assert_eq!(line_breaks(&cjk, &keep)[0], BreakType::NoBreak);
    }

    #[test]
    fn test_break_all_splits_words() {
        let text = chars("word");
        let settings = BreakSettings {
            word_break: WordBreak::BreakAll,
            ..Default::default()
        };
        assert_eq!(line_breaks(&text, &settings)[1], BreakType::SoftBreak);
    }

    #[test]
    fn test_korean_keeps_syllables_together() {
        let text = chars("한국어 문장");
        let korean = BreakSettings {
            lang: LangBucket::Ko,
            ..Default::default()
        };
        let breaks = line_breaks(&text, &korean);
        assert_eq!(breaks[0], BreakType::NoBreak);
        assert_eq!(breaks[1], BreakType::NoBreak);
        assert_eq!(breaks[3], BreakType::SoftBreak);
        assert_eq!(line_breaks(&text, &BreakSettings::default())[0], BreakType::SoftBreak);

        let break_all = BreakSettings {
            word_break: WordBreak::BreakAll,
            ..korean
        };
        assert_eq!(line_breaks(&text, &break_all)[0], BreakType::SoftBreak);
    }

    #[test]
    fn test_small_kana_tailoring() {
        let text = chars("漢ッ");
        let strict = BreakSettings {
            line_break: LineBreak::Strict,
            lang: LangBucket::Ja,
            ..Default::default()
        };
        assert_eq!(line_breaks(&text, &strict)[0], BreakType::NoBreak);
        let normal = BreakSettings {
            lang: LangBucket::Ja,
            ..Default::default()
        };
        assert_eq!(line_breaks(&text, &normal)[0], BreakType::SoftBreak);
    }

    #[test]
    fn test_patch_keeps_outside_decisions() {
        let text = chars("aa bb cc");
        let mut breaks = line_breaks(&text, &BreakSettings::default());
        let before = breaks.clone();
        let anywhere = BreakSettings {
            line_break: LineBreak::Anywhere,
            ..Default::default()
        };
        patch_line_breaks(&text, &mut breaks, 3..5, &anywhere);
        assert_eq!(breaks[3], BreakType::SoftBreak);
        // Last char of the range keeps the global decision.
        assert_eq!(breaks[4], before[4]);
        assert_eq!(&breaks[..3], &before[..3]);
        assert_eq!(&breaks[5..], &before[5..]);
    }

    #[test]
    fn test_word_and_grapheme_boundaries() {
        let text = chars("ab cd");
        let words = word_boundaries(&text);
        assert_eq!(words, vec![false, true, true, false, true]);

        let combining = chars("e\u{301}x");
        let graphemes = grapheme_boundaries(&combining);
        assert_eq!(graphemes, vec![false, true, true]);
    }

    #[test]
    fn test_justification_opportunities() {
        let ops = justification_opportunities(&chars("a b漢"));
        assert_eq!(ops[1], (false, true));
        assert_eq!(ops[0], (false, false));
        assert_eq!(ops[3], (true, true));
    }

    #[test]
    fn test_hanging_behaviour() {
        let hp = HangingPunctuation {
            first: true,
            allow_end: true,
            ..Default::default()
        };
        assert_eq!(hanging_behaviour('“', hp).0, LineEdgeBehaviour::ForceHang);
        assert_eq!(hanging_behaviour('。', hp).1, LineEdgeBehaviour::ConditionallyHang);
        assert_eq!(hanging_behaviour('a', hp), (LineEdgeBehaviour::NoChange, LineEdgeBehaviour::NoChange));
    }

    #[test]
    fn test_lang_bucket() {
        assert_eq!(LangBucket::from_tag(Some("ja-JP")), LangBucket::Ja);
        assert_eq!(LangBucket::from_tag(Some("zh_Hant")), LangBucket::Zh);
        assert_eq!(LangBucket::from_tag(Some("en")), LangBucket::Other);
        assert_eq!(LangBucket::from_tag(None), LangBucket::Other);
    }

    #[test]
    fn test_replace_hard_breaks() {
        assert_eq!(replace_hard_breaks(&chars("a\nb\u{2028}")), chars("a b "));
    }
}
