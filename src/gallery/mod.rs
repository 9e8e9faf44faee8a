//! Gallery listing and thumbnail resolution
//!
//! A request for a gallery page lists the gallery directory, orders and slices
//! it, and resolves every image on the page through the thumbnail cache. Each
//! entry carries a public URL for the thumbnail, which is the original image
//! when no thumbnail could be produced.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::ListingResult;
use crate::thumbnail::ThumbnailCache;

pub mod listing;

pub use listing::{ListingOptions, PageWindow, Pagination, SourceImage, list_source_images};

pub const PUBLIC_MOUNT: &str = "/public";
pub const GALLERY_MOUNT: &str = "/gallery";
pub const THUMBNAIL_MOUNT: &str = "/thumbnails";

/// One rendered gallery item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImageEntry {
    pub name: String,
    /// Public URL of the thumbnail, or of the original on fallback
    pub thumbnail: String,
    /// Public URL of the original
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryPage {
    pub images: Vec<ResolvedImageEntry>,
    pub page: usize,
    pub total_pages: usize,
    pub total_images: usize,
}

/// URL prefixes under which directories are served.
///
/// The public root is always mounted. The gallery and cache directories get
/// their own mounts only when they live outside the public root.
#[derive(Debug, Clone)]
pub struct PublicMounts {
    mounts: Vec<(&'static str, PathBuf)>,
}

impl PublicMounts {
    pub fn from_config(config: &Config) -> Self {
        let storage = &config.storage;
        let mut mounts = vec![(PUBLIC_MOUNT, storage.public_dir.clone())];
        for (prefix, dir) in [
            (GALLERY_MOUNT, &storage.gallery_dir),
            (THUMBNAIL_MOUNT, &storage.cache_dir),
        ] {
            if !is_below(dir, &storage.public_dir) {
                mounts.push((prefix, dir.clone()));
            }
        }
        // most specific directory wins
        mounts.sort_by_key(|(_, dir)| std::cmp::Reverse(dir.components().count()));
        Self { mounts }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        self.mounts.iter().map(|(prefix, dir)| (*prefix, dir.as_path()))
    }

    /// Public URL for a file below one of the mounts
    pub fn url_for(&self, path: &Path) -> Option<String> {
        let (prefix, relative) = self
            .mounts
            .iter()
            .find_map(|(prefix, dir)| Some((*prefix, path.strip_prefix(dir).ok()?)))?;

        let mut url = prefix.to_string();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return None;
            };
            url.push('/');
            url.push_str(&urlencoding::encode(part.to_str()?));
        }
        Some(url)
    }
}

/// `dir` is reachable from `root` through plain components only, so files in
/// it get URLs under the root's mount
fn is_below(dir: &Path, root: &Path) -> bool {
    dir.strip_prefix(root).is_ok_and(|relative| {
        relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    })
}

/// Builds gallery pages from the listing and the thumbnail cache
#[derive(Debug, Clone)]
pub struct GalleryService {
    cache: ThumbnailCache,
    options: ListingOptions,
    mounts: PublicMounts,
}

impl GalleryService {
    pub fn new(cache: ThumbnailCache, options: ListingOptions, mounts: PublicMounts) -> Self {
        Self {
            cache,
            options,
            mounts,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ThumbnailCache::from_config(config),
            ListingOptions::from_config(config),
            PublicMounts::from_config(config),
        )
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    pub fn mounts(&self) -> &PublicMounts {
        &self.mounts
    }

    /// List, order and slice the gallery, then resolve every image on the
    /// requested page in listing order
    pub async fn page(&self, page: usize) -> ListingResult<GalleryPage> {
        let mut images = list_source_images(self.cache.source_dir()).await?;
        self.options.sort(&mut images);

        let window = self.options.paginate(images.len(), page);
        debug!(
            "Listing page {}/{} ({} images total)",
            window.page,
            window.total_pages,
            images.len()
        );

        let mut entries = Vec::with_capacity(window.end - window.start);
        for image in &images[window.start..window.end] {
            if let Some(entry) = self.resolve_entry(&image.name).await {
                entries.push(entry);
            }
        }

        Ok(GalleryPage {
            images: entries,
            page: window.page,
            total_pages: window.total_pages,
            total_images: images.len(),
        })
    }

    async fn resolve_entry(&self, name: &str) -> Option<ResolvedImageEntry> {
        let source = self.cache.source_path(name);
        let Some(url) = self.mounts.url_for(&source) else {
            warn!("No public URL for {}, skipping", source.display());
            return None;
        };

        let thumbnail_path = self.cache.resolve(name).await;
        let thumbnail = self
            .mounts
            .url_for(&thumbnail_path)
            .unwrap_or_else(|| url.clone());

        Some(ResolvedImageEntry {
            name: name.to_string(),
            thumbnail,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(public: &str, gallery: &str, cache: &str) -> Config {
        let mut config = Config::default();
        config.storage.public_dir = PathBuf::from(public);
        config.storage.gallery_dir = PathBuf::from(gallery);
        config.storage.cache_dir = PathBuf::from(cache);
        config
    }

    #[test]
    fn test_default_layout_uses_public_mount_only() {
        let mounts = PublicMounts::from_config(&Config::default());
        assert_eq!(mounts.iter().count(), 1);
        assert_eq!(
            mounts.url_for(Path::new("public/cache/200x200-a b.jpg")),
            Some("/public/cache/200x200-a%20b.jpg".to_string())
        );
        assert_eq!(
            mounts.url_for(Path::new("public/gallery-images/a.jpg")),
            Some("/public/gallery-images/a.jpg".to_string())
        );
    }

    #[test]
    fn test_outside_directories_get_their_own_mounts() {
        let mounts = PublicMounts::from_config(&config_with("www", "/srv/photos", "/var/cache/thumbs"));
        assert_eq!(mounts.iter().count(), 3);
        assert_eq!(
            mounts.url_for(Path::new("/srv/photos/x.png")),
            Some("/gallery/x.png".to_string())
        );
        assert_eq!(
            mounts.url_for(Path::new("/var/cache/thumbs/10x10-x.png")),
            Some("/thumbnails/10x10-x.png".to_string())
        );
    }

    #[test]
    fn test_parent_components_get_their_own_mount() {
        let mounts = PublicMounts::from_config(&config_with(
            "srv/public",
            "srv/public/../photos",
            "srv/public/cache/../../thumbs",
        ));
        assert_eq!(mounts.iter().count(), 3);
        assert_eq!(
            mounts.url_for(Path::new("srv/public/../photos/x.png")),
            Some("/gallery/x.png".to_string())
        );
        assert_eq!(
            mounts.url_for(Path::new("srv/public/cache/../../thumbs/10x10-x.png")),
            Some("/thumbnails/10x10-x.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_gallery_outside_public_via_parent_dir_renders_every_image() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        let gallery = public.join("..").join("photos");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::create_dir_all(&gallery).unwrap();
        std::fs::write(gallery.join("x.png"), b"not an image").unwrap();

        let mut config = Config::default();
        config.storage.public_dir = public.clone();
        config.storage.gallery_dir = gallery;
        config.storage.cache_dir = public.join("cache");

        let page = GalleryService::from_config(&config).page(1).await.unwrap();
        assert_eq!(page.total_images, 1);
        assert_eq!(page.images.len(), 1);
        assert_eq!(page.images[0].url, "/gallery/x.png");
        assert_eq!(page.images[0].thumbnail, "/gallery/x.png");
    }

    #[test]
    fn test_unmounted_or_escaping_paths_have_no_url() {
        let mounts = PublicMounts::from_config(&Config::default());
        assert_eq!(mounts.url_for(Path::new("/etc/passwd")), None);
        assert_eq!(mounts.url_for(Path::new("public/gallery-images/../../x")), None);
    }
}
