//! Paginated and list responses.

use serde::{Deserialize, Serialize};

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub results: Vec<T>,
    /// URL of the next page, absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Whether the server reported a further page.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// A collection the server may return paginated or as a plain array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listed<T> {
    Page(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listed<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Page(page) => page.results,
            Self::Plain(items) => items,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_accepts_both_shapes() {
        let plain: Listed<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(plain.into_vec(), vec![1, 2]);

        let paged: Listed<u32> =
            serde_json::from_str(r#"{"results": [3], "next": null}"#).unwrap();
        assert_eq!(paged.into_vec(), vec![3]);
    }

    #[test]
    fn test_has_more_follows_next() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"results": [], "next": "https://x/?page=2"}"#).unwrap();
        assert!(page.has_more());
        let page: Page<u32> = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(!page.has_more());
    }
}
