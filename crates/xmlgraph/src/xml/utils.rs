//! Utility functions and constants for XML serialization/deserialization.
//!
//! This module holds the fixed element and attribute names used for
//! collections and the text classification rules shared by the writer and
//! the reader.

/// Element name of every collection and dictionary item.
pub const ITEM_ELEMENT: &str = "Item";

/// Attribute of a dictionary item that holds the entry's key.
pub const KEY_ATTRIBUTE: &str = "name";

/// Converts a Rust boolean to its string representation for XML.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// Path segment for the collection item at `index`.
pub fn item_name(index: usize) -> String {
    format!("{}[{}]", ITEM_ELEMENT, index)
}

/// Checks if character data must be written as a CDATA section.
///
/// Markup characters and whitespace-only content would otherwise be escaped
/// or dropped on the way back in.
pub fn needs_cdata(text: &str) -> bool {
    text.contains(['<', '>', '&']) || is_whitespace_only(text)
}

/// Checks if `text` is non-empty and consists of XML whitespace only.
pub fn is_whitespace_only(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
}

/// Checks if an attribute is a namespace declaration.
pub fn is_namespace_declaration(key: &[u8]) -> bool {
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_to_string() {
        assert_eq!(bool_to_string(true), "true");
        assert_eq!(bool_to_string(false), "false");
    }

    #[test]
    fn test_item_name() {
        assert_eq!(item_name(0), "Item[0]");
        assert_eq!(item_name(12), "Item[12]");
    }

    #[test]
    fn test_needs_cdata() {
        assert!(needs_cdata("a < b"));
        assert!(needs_cdata("<b>bold</b>"));
        assert!(needs_cdata("fish & chips"));
        assert!(needs_cdata("   "));
        assert!(needs_cdata("\n\t"));
        assert!(!needs_cdata(""));
        assert!(!needs_cdata("plain text"));
        assert!(!needs_cdata(" padded "));
    }

    #[test]
    fn test_is_namespace_declaration() {
        assert!(is_namespace_declaration(b"xmlns"));
        assert!(is_namespace_declaration(b"xmlns:o"));
        assert!(!is_namespace_declaration(b"xmlnsx"));
        assert!(!is_namespace_declaration(b"id"));
    }
}
