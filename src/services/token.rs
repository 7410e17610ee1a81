use unicode_general_category::{get_general_category, GeneralCategory};

use crate::model::token::Token;

/// Whether `c` can be part of a translatable token.
///
/// Only characters above the Latin-1 range qualify, so ASCII identifiers and
/// keywords never trigger a lookup.
pub fn is_token_char(c: char) -> bool {
    if (c as u32) <= 0xFF || c.is_whitespace() {
        return false;
    }

    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
            | GeneralCategory::MathSymbol
            | GeneralCategory::CurrencySymbol
            | GeneralCategory::ModifierSymbol
            | GeneralCategory::OtherSymbol
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

/// Finds the token surrounding `caret` in `line`.
///
/// `caret` is a char offset and is clamped to the line length. Returns an
/// empty token at the caret when neither neighbour qualifies.
pub fn extract_token(line: &str, caret: usize) -> Token {
    let chars: Vec<char> = line.chars().collect();
    let caret = caret.min(chars.len());

    let head = chars[..caret]
        .iter()
        .rev()
        .take_while(|c| is_token_char(**c))
        .count();
    let tail = chars[caret..]
        .iter()
        .take_while(|c| is_token_char(**c))
        .count();

    let length = head + tail;
    if length == 0 {
        return Token::empty(caret);
    }

    let start = caret - head;
    Token {
        text: chars[start..start + length].iter().collect(),
        start,
        length,
    }
}

/// Re-derives a session span after edits: `start` stays fixed, the span runs
/// to the caret plus any token characters still to its right.
///
/// Returns `None` once the caret has left the span (before `start`, or past
/// the end of the line).
pub fn span_from(line: &str, start: usize, caret: usize) -> Option<Token> {
    let chars: Vec<char> = line.chars().collect();
    if caret < start || caret > chars.len() {
        return None;
    }

    let tail = chars[caret..]
        .iter()
        .take_while(|c| is_token_char(**c))
        .count();
    let end = caret + tail;

    Some(Token {
        text: chars[start..end].iter().collect(),
        start,
        length: end - start,
    })
}

/// The text between `start` and the caret, the part the user has typed so far.
pub fn typed_text(line: &str, start: usize, caret: usize) -> String {
    line.chars()
        .skip(start)
        .take(caret.saturating_sub(start))
        .collect()
}
