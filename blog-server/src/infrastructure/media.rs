use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

const IMAGES_DIR: &str = "posts_images";
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Post images stored on the local filesystem under `root`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

pub fn image_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

impl MediaStorage {
    pub fn new(root: PathBuf, url: String) -> Self {
        Self { root, url }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Copies an uploaded file into the media root and returns its relative path.
    pub async fn save_image(
        &self,
        source: &Path,
        original_filename: &str,
    ) -> Result<String, std::io::Error> {
        let extension = image_extension(original_filename)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let relative = format!("{}/{}{}", IMAGES_DIR, Uuid::new_v4(), extension);

        fs::create_dir_all(self.root.join(IMAGES_DIR)).await?;
        fs::copy(source, self.root.join(&relative)).await?;

        info!(image = %relative, "image stored");
        Ok(relative)
    }

    /// Removes a stored image. A file that is already gone is not an error.
    pub async fn delete_image(&self, relative: &str) -> Result<(), std::io::Error> {
        let path = self.resolve(relative);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(image = %relative, "image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(image = %relative, "image already missing");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        let file_name = Path::new(relative)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        self.root.join(IMAGES_DIR).join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn only_image_extensions_are_kept() {
        assert_eq!(image_extension("photo.JPG"), Some("jpg".into()));
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("noext"), None);
    }

    #[tokio::test]
    async fn save_then_delete_image() {
        let root = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(root.path().to_path_buf(), "/media".into());
        let mut upload = tempfile::NamedTempFile::new().unwrap();
        upload.write_all(b"\x89PNG").unwrap();

        let relative = storage.save_image(upload.path(), "cat.png").await.unwrap();

        assert!(relative.starts_with("posts_images/"));
        assert!(relative.ends_with(".png"));
        assert!(root.path().join(&relative).exists());

        storage.delete_image(&relative).await.unwrap();
        assert!(!root.path().join(&relative).exists());
        storage.delete_image(&relative).await.unwrap();
    }

    #[test]
    fn resolve_stays_inside_images_dir() {
        let storage = MediaStorage::new(PathBuf::from("/srv/media"), "/media".into());
        assert_eq!(
            storage.resolve("posts_images/../../etc/passwd"),
            PathBuf::from("/srv/media/posts_images/passwd")
        );
    }
}
