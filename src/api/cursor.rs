//! Opaque page cursors and slice pagination.
//!
//! A cursor is standard base64 over the JSON object `{"page":n}`. Callers
//! must treat it as opaque; the server is free to change the encoding.

use base64::Engine;
use serde::Serialize;
use serde_json::Value;

use crate::models::Page;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Serialize)]
struct CursorBody {
    page: usize,
}

/// Encode a zero-based page number as a cursor token.
pub fn encode(page: usize) -> String {
    // Serializing a single integer field cannot fail.
    let json = serde_json::to_vec(&CursorBody { page }).unwrap_or_default();
    base64::engine::general_purpose::STANDARD.encode(json)
}

/// Decode a cursor token back to its page number.
///
/// Only a JSON object with a non-negative integer `page` decodes to that
/// page; anything else decodes to page 0.
pub fn decode(token: &str) -> usize {
    base64::engine::general_purpose::STANDARD
        .decode(token.trim())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .and_then(|body| body.as_object()?.get("page")?.as_u64())
        .and_then(|page| usize::try_from(page).ok())
        .unwrap_or(0)
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn page_size(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Cut one page out of an already filtered and sorted list.
///
/// `next_cursor` is set iff `(page + 1) * limit < items.len()`.
pub fn paginate<T>(items: Vec<T>, cursor: Option<&str>, limit: Option<usize>) -> Page<T> {
    let page = cursor.map_or(0, decode);
    let limit = page_size(limit);
    let total = items.len();

    let start = page.saturating_mul(limit);
    let end = start.saturating_add(limit);
    let next_cursor = (end < total).then(|| encode(page + 1));

    let items = items.into_iter().skip(start).take(limit).collect();
    Page { items, next_cursor }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_inverts_encode() {
        for page in [0usize, 1, 2, 19, 1_000, u32::MAX as usize, usize::MAX] {
            assert_eq!(decode(&encode(page)), page, "page {}", page);
        }
    }

    #[test]
    fn test_encode_is_base64_json() {
        // {"page":1}
        assert_eq!(encode(1), "eyJwYWdlIjoxfQ==");
    }

    #[test]
    fn test_malformed_tokens_decode_to_zero() {
        let engine = base64::engine::general_purpose::STANDARD;
        let cases = [
            String::new(),
            "not base64!!".to_string(),
            engine.encode("not json"),
            engine.encode(r#"{"offset":3}"#),
            engine.encode(r#"{"page":-1}"#),
            engine.encode(r#"{"page":1.5}"#),
            engine.encode(r#"[1]"#),
            engine.encode(r#"{"page":"2"}"#),
            engine.encode("3"),
        ];
        for token in &cases {
            assert_eq!(decode(token), 0, "token {:?}", token);
        }
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let engine = base64::engine::general_purpose::STANDARD;
        assert_eq!(decode(&engine.encode(r#"{"page":4,"sort":"recent"}"#)), 4);
        assert_eq!(decode(&engine.encode(r#"{"page":[1]}"#)), 0);
    }

    #[test]
    fn test_paginate_sets_cursor_until_last_page() {
        let items: Vec<u32> = (0..45).collect();

        let first = paginate(items.clone(), None, Some(20));
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.items[0], 0);
        let cursor = first.next_cursor.expect("first page has more");

        let second = paginate(items.clone(), Some(&cursor), Some(20));
        assert_eq!(second.items[0], 20);
        let cursor = second.next_cursor.expect("second page has more");

        let third = paginate(items, Some(&cursor), Some(20));
        assert_eq!(third.items, (40..45).collect::<Vec<_>>());
        assert!(third.next_cursor.is_none());
    }

    #[test]
    fn test_paginate_exact_multiple_has_no_trailing_cursor() {
        let page = paginate((0..20).collect::<Vec<u32>>(), None, Some(10));
        assert!(page.next_cursor.is_some());
        let last = paginate((0..20).collect::<Vec<u32>>(), Some(&encode(1)), Some(10));
        assert_eq!(last.items.len(), 10);
        assert!(last.next_cursor.is_none());
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], Some(&encode(usize::MAX)), Some(50));
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_page_size_clamps() {
        assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(500)), MAX_PAGE_SIZE);
    }
}
