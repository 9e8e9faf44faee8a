//! Query string parameters

use serde::Deserialize;

/// `?page=N`, 1-based. Anything unparseable means the first page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn test_page_parsing() {
        assert_eq!(query(None).page(), 1);
        assert_eq!(query(Some("3")).page(), 3);
        assert_eq!(query(Some(" 2 ")).page(), 2);
        assert_eq!(query(Some("last")).page(), 1);
        assert_eq!(query(Some("-1")).page(), 1);
    }
}
