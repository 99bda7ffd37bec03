//! Content-hash extractor (spec §4.12): an optional, stricter fingerprint
//! over the *visible* content of a PDF, resilient to raster-only edits that
//! would not change the byte-exact `H(d)`.
//!
//! Pipeline: extract the text layer of up to 20 pages → normalize → tokenize
//! into a canonical bag-of-tokens payload → canonicalize (§4.11) → hash.

use std::collections::BTreeMap;

use justifai_canonical::canonicalize_to_string;
use justifai_errors::Error;
use justifai_hash::{keccak256, to_hex};
use lopdf::content::Content;
use lopdf::{Document, Object};
use unicode_normalization::UnicodeNormalization;

const MAX_PAGES: usize = 20;
const SCHEMA_VERSION: &str = "content-hash-v1";
/// Punctuation runs longer than this are noise (table rules, underlines)
/// and are dropped rather than tokenized.
const MAX_PUNCT_RUN: usize = 3;

/// Extract the text layer of up to [`MAX_PAGES`] pages from a parsed PDF,
/// by walking each page's content stream operations and collecting the
/// operands of `Tj`/`TJ` text-showing operators.
pub fn extract_text_layer(doc: &Document) -> Result<String, Error> {
    let pages = doc.get_pages();
    let mut page_ids: Vec<_> = pages.into_iter().collect();
    page_ids.sort_by_key(|(number, _)| *number);
    page_ids.truncate(MAX_PAGES);

    let mut text = String::new();
    for (_, page_id) in page_ids {
        let content_bytes = doc
            .get_page_content(page_id)
            .map_err(|e| Error::pdf(format!("failed to read page content: {e}")))?;
        let content = Content::decode(&content_bytes)
            .map_err(|e| Error::pdf(format!("failed to decode content stream: {e}")))?;

        for operation in content.operations {
            match operation.operator.as_str() {
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operation.operands.first() {
                        push_decoded(&mut text, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operation.operands.first() {
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                push_decoded(&mut text, bytes);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        text.push('\n');
    }
    Ok(text)
}

fn push_decoded(out: &mut String, bytes: &[u8]) {
    out.push_str(&String::from_utf8_lossy(bytes));
    out.push(' ');
}

/// Normalize per §4.12 step 2: NFKC, lowercase, unify smart quotes/dashes
/// and all Unicode whitespace to plain ASCII space.
pub fn normalize(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    let mut out = String::with_capacity(nfkc.len());
    for ch in nfkc.chars() {
        let mapped = match ch {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            c if c.is_whitespace() => ' ',
            c => c,
        };
        out.extend(mapped.to_lowercase());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word,
    Punct,
}

fn classify(c: char) -> Option<TokenKind> {
    if c.is_alphanumeric() {
        Some(TokenKind::Word)
    } else if matches!(c, '.' | ',' | '-' | '/') {
        Some(TokenKind::Punct)
    } else {
        None
    }
}

/// Tokenize per the grammar `[L|N]+ | [.,-/]+`: runs of letters/numbers are
/// word tokens, runs of `.,-/ ` are punctuation tokens, anything else is a
/// separator. Long punctuation runs (table rules, underlines) are dropped.
/// Single-character word tokens that appear consecutively (fragmented OCR
/// text, e.g. `"w o r d"`) are merged back into one word.
pub fn tokenize(normalized: &str) -> Vec<String> {
    let mut raw: Vec<(TokenKind, String)> = Vec::new();
    let mut current_kind: Option<TokenKind> = None;
    let mut current = String::new();

    for c in normalized.chars() {
        match classify(c) {
            Some(kind) if Some(&kind) == current_kind.as_ref() => current.push(c),
            Some(kind) => {
                if let Some(k) = current_kind.take() {
                    raw.push((k, std::mem::take(&mut current)));
                }
                current_kind = Some(kind);
                current.push(c);
            }
            None => {
                if let Some(k) = current_kind.take() {
                    raw.push((k, std::mem::take(&mut current)));
                }
            }
        }
    }
    if let Some(k) = current_kind {
        raw.push((k, current));
    }

    let filtered: Vec<(TokenKind, String)> = raw
        .into_iter()
        .filter(|(kind, tok)| !(*kind == TokenKind::Punct && tok.chars().count() > MAX_PUNCT_RUN))
        .collect();

    merge_fragmented_words(filtered)
}

fn merge_fragmented_words(tokens: Vec<(TokenKind, String)>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut run: Vec<String> = Vec::new();

    fn flush_run(out: &mut Vec<String>, run: &mut Vec<String>) {
        if run.is_empty() {
            return;
        }
        if run.len() > 1 {
            out.push(run.concat());
        } else {
            out.push(run[0].clone());
        }
        run.clear();
    }

    for (kind, tok) in tokens {
        let is_single_char_word = kind == TokenKind::Word && tok.chars().count() == 1;
        if is_single_char_word {
            run.push(tok);
        } else {
            flush_run(&mut out, &mut run);
            out.push(tok);
        }
    }
    flush_run(&mut out, &mut run);
    out
}

#[derive(Debug, Clone, serde::Serialize)]
struct ContentPayload {
    v: u8,
    counts: BTreeMap<String, u64>,
    #[serde(rename = "tokenCount")]
    token_count: u64,
}

/// Build the canonical token-bag payload and hash it (§4.12 step 3).
pub fn data_hash_from_tokens(tokens: &[String]) -> Result<String, Error> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    let payload = ContentPayload {
        v: 1,
        counts,
        token_count: tokens.len() as u64,
    };
    let value = serde_json::to_value(&payload).map_err(|e| Error::validation(e.to_string()))?;
    let canonical = canonicalize_to_string(&value, SCHEMA_VERSION)?;
    Ok(to_hex(&keccak256(canonical.as_bytes())))
}

/// End-to-end: parsed PDF → `dataHash`.
pub fn compute_data_hash(doc: &Document) -> Result<String, Error> {
    let text = extract_text_layer(doc)?;
    let normalized = normalize(&text);
    let tokens = tokenize(&normalized);
    data_hash_from_tokens(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unifies_smart_quotes_and_dashes() {
        let input = "\u{201C}Hello\u{201D}\u{2014}World\u{2019}s";
        let normalized = normalize(input);
        assert_eq!(normalized, "\"hello\"-world's");
    }

    #[test]
    fn tokenize_splits_words_and_punctuation() {
        let tokens = tokenize("hello, world.");
        assert_eq!(tokens, vec!["hello", ",", "world", "."]);
    }

    #[test]
    fn tokenize_drops_long_punctuation_runs() {
        let tokens = tokenize("before ---- after");
        assert_eq!(tokens, vec!["before", "after"]);
    }

    #[test]
    fn tokenize_merges_fragmented_single_char_words() {
        let tokens = tokenize("w o r d really");
        assert_eq!(tokens, vec!["word", "really"]);
    }

    #[test]
    fn data_hash_is_deterministic_for_equivalent_token_order() {
        let a = data_hash_from_tokens(&["alpha".into(), "beta".into(), "alpha".into()]).unwrap();
        let b = data_hash_from_tokens(&["beta".into(), "alpha".into(), "alpha".into()]).unwrap();
        assert_eq!(a, b, "counts payload is order-independent after canonicalization");
    }

    #[test]
    fn data_hash_changes_when_tokens_differ() {
        let a = data_hash_from_tokens(&["alpha".into()]).unwrap();
        let b = data_hash_from_tokens(&["beta".into()]).unwrap();
        assert_ne!(a, b);
    }
}
