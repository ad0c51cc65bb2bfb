//! Filesystem artifact store.
//!
//! Encodes rasters as PNG and writes them under a base directory.
//! References returned to the pipeline are paths relative to that
//! directory, so the layout can move without invalidating them.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};

use fabula_core::types::RunId;

use crate::capability::{ArtifactRef, ArtifactStore, ProviderError};

/// [`ArtifactStore`] writing PNG files under a base directory.
pub struct FsArtifactStore {
    base_dir: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `base_dir`. The directory is created
    /// on first write, not here.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn store_image(
        &self,
        run_id: RunId,
        kind: &str,
        image: &RgbaImage,
    ) -> Result<ArtifactRef, ProviderError> {
        let filename = format!("{kind}_{run_id}.png");

        // Encode on this task; PNG encoding of a 1024x768 canvas is
        // cheap relative to the remote generation that precedes it.
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| ProviderError::Storage(format!("PNG encoding failed: {e}")))?;

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| ProviderError::Storage(format!("Cannot create artifact dir: {e}")))?;

        let path = self.base_dir.join(&filename);
        tokio::fs::write(&path, encoded)
            .await
            .map_err(|e| ProviderError::Storage(format!("Cannot write {}: {e}", path.display())))?;

        Ok(filename)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_png_and_returns_relative_reference() {
        let dir = std::env::temp_dir().join(format!("fabula-store-{}", uuid::Uuid::new_v4()));
        let store = FsArtifactStore::new(&dir);
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]));
        let run_id = uuid::Uuid::new_v4();

        let reference = store.store_image(run_id, "character", &image).await.unwrap();

        assert_eq!(reference, format!("character_{run_id}.png"));
        let bytes = tokio::fs::read(dir.join(&reference)).await.unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
