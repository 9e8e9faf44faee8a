//! Gallery directory enumeration, ordering and pagination

use std::cmp::Ordering;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use crate::config::{Config, SortKey};
use crate::errors::{ListingError, ListingResult};

/// One file in the gallery directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    pub name: String,
    pub size: u64,
    #[serde(skip)]
    pub modified: SystemTime,
}

/// Enumerate the gallery directory.
///
/// Only regular files directly inside `dir` are returned (symlinks are
/// followed). Subdirectories and names that are not valid UTF-8 are skipped.
pub async fn list_source_images(dir: &Path) -> ListingResult<Vec<SourceImage>> {
    let unreadable = |source| ListingError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut images = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let Ok(name) = entry.file_name().into_string() else {
            debug!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };

        let metadata = match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Skipping {}: {}", name, e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        images.push(SourceImage {
            name,
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    Ok(images)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Pagination applies only when the gallery holds more images than this
    pub threshold: usize,
    pub per_page: usize,
}

/// A window of the sorted listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingOptions {
    pub sort_by: SortKey,
    pub reverse: bool,
    pub pagination: Option<Pagination>,
}

impl ListingOptions {
    pub fn from_config(config: &Config) -> Self {
        let basic = &config.basic_settings;
        let advanced = &config.advanced_settings;
        let pagination = (basic.enable_pagination && advanced.images_per_page > 0).then_some(
            Pagination {
                threshold: basic.paginator_threshold,
                per_page: advanced.images_per_page,
            },
        );

        Self {
            sort_by: advanced.images_sort_by,
            reverse: advanced.reverse_sort,
            pagination,
        }
    }

    /// Order in place. Ties fall back to the name so the order is stable
    /// across requests.
    pub fn sort(&self, images: &mut [SourceImage]) {
        let by_name = |a: &SourceImage, b: &SourceImage| a.name.cmp(&b.name);
        images.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortKey::Name => Ordering::Equal,
                SortKey::Modified => a.modified.cmp(&b.modified),
                SortKey::Size => a.size.cmp(&b.size),
            };
            ordering.then_with(|| by_name(a, b))
        });
        if self.reverse {
            images.reverse();
        }
    }

    /// Window for the 1-based `page`, clamped into range. Without pagination,
    /// or below the threshold, everything is on page 1.
    pub fn paginate(&self, total: usize, page: usize) -> PageWindow {
        let per_page = match self.pagination {
            Some(pagination) if total > pagination.threshold => pagination.per_page,
            _ => {
                return PageWindow {
                    page: 1,
                    total_pages: 1,
                    start: 0,
                    end: total,
                };
            }
        };

        let total_pages = total.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);
        let start = (page - 1) * per_page;
        PageWindow {
            page,
            total_pages,
            start,
            end: (start + per_page).min(total),
        }
    }
}
