//! Compiled page themes

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::config::Theme;
use crate::gallery::{GalleryPage, ResolvedImageEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

/// Everything a theme needs to draw one gallery page
#[derive(Debug, Clone)]
pub struct GalleryView {
    pub images: Vec<ResolvedImageEntry>,
    pub page: usize,
    pub total_pages: usize,
    pub total_images: usize,
    pub pages: Vec<PageLink>,
    /// 0 when there is no previous page
    pub previous: usize,
    /// 0 when there is no next page
    pub next: usize,
}

impl From<GalleryPage> for GalleryView {
    fn from(page: GalleryPage) -> Self {
        let pages = (1..=page.total_pages)
            .map(|number| PageLink {
                number,
                current: number == page.page,
            })
            .collect();
        let next = if page.page < page.total_pages {
            page.page + 1
        } else {
            0
        };

        Self {
            images: page.images,
            previous: page.page.saturating_sub(1),
            next,
            page: page.page,
            total_pages: page.total_pages,
            total_images: page.total_images,
            pages,
        }
    }
}

impl GalleryView {
    pub fn paginated(&self) -> bool {
        self.total_pages > 1
    }
}

#[derive(Template)]
#[template(path = "default.html")]
pub struct DefaultTheme {
    pub view: GalleryView,
}

#[derive(Template)]
#[template(path = "minimal.html")]
pub struct MinimalTheme {
    pub view: GalleryView,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub status: u16,
    pub reason: String,
    pub message: String,
}

pub fn render_gallery(theme: Theme, view: GalleryView) -> Result<String, askama::Error> {
    match theme {
        Theme::Default => DefaultTheme { view }.render(),
        Theme::Minimal => MinimalTheme { view }.render(),
    }
}

/// HTML error page; degrades to plain text if the template itself fails
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let page = ErrorPage {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error").to_string(),
        message: message.to_string(),
    };
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Failed to render error page: {}", e);
            (status, message.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: usize, total_pages: usize) -> GalleryPage {
        GalleryPage {
            images: vec![ResolvedImageEntry {
                name: "a<b>.jpg".to_string(),
                thumbnail: "/public/cache/200x200-a%3Cb%3E.jpg".to_string(),
                url: "/public/gallery-images/a%3Cb%3E.jpg".to_string(),
            }],
            page,
            total_pages,
            total_images: 1,
        }
    }

    #[test]
    fn test_view_navigation() {
        let view = GalleryView::from(page(2, 3));
        assert_eq!((view.previous, view.next), (1, 3));
        assert!(view.pages[1].current);
        assert!(view.paginated());

        let single = GalleryView::from(page(1, 1));
        assert_eq!((single.previous, single.next), (0, 0));
        assert!(!single.paginated());
    }

    #[test]
    fn test_themes_render_and_escape() {
        for theme in [Theme::Default, Theme::Minimal] {
            let html = render_gallery(theme, GalleryView::from(page(1, 2))).unwrap();
            assert!(html.contains("/public/cache/200x200-a%3Cb%3E.jpg"));
            assert!(html.contains("a&lt;b&gt;.jpg"));
            assert!(html.contains("?page=2"));
        }
    }

    #[test]
    fn test_error_page() {
        let response = error_response(StatusCode::INTERNAL_SERVER_ERROR, "gallery missing");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
