use serde_json::Value;

use crate::error::FetchError;
use crate::model::translation::TranslationEntry;

/// Parses a `translate_a/t` body into headline + dictionary entries.
///
/// Layout: `[ [[src, tgt, ..], ..], [ [_, _, [[word, [syn, ..]], ..]], .. ], .. ]`.
/// Element 0 yields one headline entry from its first group; each
/// alternative group contributes its index-2 candidates in order. A group
/// without index 2 falls back to index 1 when that holds `[word, [syn, ..]]`
/// candidates (the compact layout).
pub fn parse_response(body: &str) -> Result<Vec<TranslationEntry>, FetchError> {
    let root: Value = serde_json::from_str(body.trim())
        .map_err(|e| FetchError::Parse(format!("invalid json: {e}")))?;

    let root = root
        .as_array()
        .ok_or_else(|| FetchError::Parse("response is not an array".into()))?;

    let headline = root
        .first()
        .and_then(|v| v.get(0))
        .ok_or_else(|| FetchError::Parse("missing headline group".into()))?;

    let source = headline
        .get(0)
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::Parse("headline source is not a string".into()))?;
    let target = headline
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::Parse("headline target is not a string".into()))?;

    let mut entries = vec![TranslationEntry::new(source, target)];

    let groups = match root.get(1) {
        None | Some(Value::Null) => return Ok(entries),
        Some(Value::Array(groups)) => groups,
        Some(_) => return Err(FetchError::Parse("alternatives are not an array".into())),
    };

    for group in groups {
        if let Some(candidates) = group.get(2).and_then(Value::as_array) {
            for (i, candidate) in candidates.iter().enumerate() {
                entries.push(parse_candidate(candidate).ok_or_else(|| {
                    FetchError::Parse(format!("invalid alternative candidate at index {i}"))
                })?);
            }
        } else if let Some(compact) = compact_candidates(group) {
            entries.extend(compact);
        }
    }

    Ok(entries)
}

// Index 1 only counts as a candidate list when every element parses; in the
// full layout it holds plain synonym strings.
fn compact_candidates(group: &Value) -> Option<Vec<TranslationEntry>> {
    let list = group.get(1)?.as_array()?;
    if list.is_empty() {
        return None;
    }
    list.iter().map(parse_candidate).collect()
}

fn parse_candidate(candidate: &Value) -> Option<TranslationEntry> {
    let word = candidate.get(0)?.as_str()?;
    let synonyms = candidate.get(1)?.as_array()?;

    let joined = synonyms
        .iter()
        .map(|s| match s {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    Some(TranslationEntry::new(word, joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headline_comes_first_then_alternatives_in_order() {
        let body = r#"[[["今日","today","Kyō",""]],[["noun",["today"],[["今日",["today","this day"],null,0.8],["本日",["today"],null,0.1]],"今日",1]],"ja"]"#;

        let entries = parse_response(body).unwrap();

        assert_eq!(
            entries,
            vec![
                TranslationEntry::new("今日", "today"),
                TranslationEntry::new("今日", "today, this day"),
                TranslationEntry::new("本日", "today"),
            ]
        );
    }

    #[test]
    fn duplicates_across_groups_are_preserved() {
        let body = r#"[[["行く","go"]],[[null,null,[["行く",["go"]]]],[null,null,[["行く",["go"]]]]]]"#;

        let entries = parse_response(body).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], entries[2]);
    }

    #[test]
    fn missing_or_null_alternatives_give_headline_only() {
        let expected = vec![TranslationEntry::new("猫", "cat")];

        assert_eq!(parse_response(r#"[[["猫","cat"]]]"#).unwrap(), expected);
        assert_eq!(parse_response(r#"[[["猫","cat"]],null,"ja"]"#).unwrap(), expected);
    }

    #[test]
    fn groups_without_candidates_are_skipped() {
        let body = r#"[[["猫","cat"]],[["noun",["cat"]],[null,null,[["猫",["cat","puss"]]]]]]"#;

        let entries = parse_response(body).unwrap();
        assert_eq!(entries[1], TranslationEntry::new("猫", "cat, puss"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn compact_groups_read_candidates_from_index_one() {
        let body = r#"[[["今日","today"]],[[null,[["今日",["today","this day"]]]]]]"#;

        assert_eq!(
            parse_response(body).unwrap(),
            vec![
                TranslationEntry::new("今日", "today"),
                TranslationEntry::new("今日", "today, this day"),
            ]
        );
    }

    #[test]
    fn synonym_lists_at_index_one_are_not_candidates() {
        let body = r#"[[["猫","cat"]],[["noun",["cat","puss"]],[null,[]]]]"#;

        assert_eq!(
            parse_response(body).unwrap(),
            vec![TranslationEntry::new("猫", "cat")]
        );
    }

    #[test]
    fn non_string_synonyms_render_as_json() {
        let body = r#"[[["一","one"]],[[null,null,[["一",["one",1]]]]]]"#;

        let entries = parse_response(body).unwrap();
        assert_eq!(entries[1].target, "one, 1");
    }

    #[test]
    fn malformed_bodies_are_parse_errors() {
        let cases = [
            "",
            "<html>captcha</html>",
            "{}",
            "[]",
            "[[]]",
            r#"[[[1,"x"]]]"#,
            r#"[[["a","b"]],{"x":1}]"#,
            r#"[[["a","b"]],[[null,null,[[1,["x"]]]]]]"#,
            r#"[[["a","b"]],[[null,null,[["a","x"]]]]]"#,
        ];

        for body in cases {
            match parse_response(body) {
                Err(FetchError::Parse(_)) => {}
                other => panic!("{body:?} gave {other:?}"),
            }
        }
    }
}
