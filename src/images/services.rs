use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::ALLOWED_EXTENSIONS,
    error::AppError,
    storage::ContentStore,
    users::{
        dto::ImageUpload,
        validation::{allowed_extension, file_extension},
    },
};

/// Shrinks `img` to fit in a `max` x `max` box, keeping its aspect ratio.
/// Images already inside the box are returned untouched.
pub fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    if img.width() <= max && img.height() <= max {
        return img;
    }
    img.thumbnail(max, max)
}

fn decode_resize_encode(body: &[u8], ext: &str, max: u32) -> Result<Bytes, AppError> {
    let img = image::load_from_memory(body).map_err(|e| AppError::ImageDecode(e.to_string()))?;
    let format = ImageFormat::from_extension(ext)
        .ok_or_else(|| anyhow::anyhow!("no encoder for extension {ext}"))?;
    let img = fit_within(img, max);
    // JPEG has no alpha channel; GIF only takes 8-bit RGBA
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img,
    };
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .with_context(|| format!("encode {ext} image"))?;
    Ok(Bytes::from(out.into_inner()))
}

/// Stores an uploaded image under a fresh `<uuid>.<ext>` name and returns
/// that name. Returns `None` when nothing was uploaded or the extension is
/// not accepted. Nothing is written if the upload does not decode.
pub async fn store_image(
    store: &dyn ContentStore,
    upload: Option<ImageUpload>,
    max_dimension: u32,
) -> Result<Option<String>, AppError> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    if !allowed_extension(&upload.filename, ALLOWED_EXTENSIONS) {
        warn!(filename = %upload.filename, "image extension not allowed; ignoring upload");
        return Ok(None);
    }
    let Some(ext) = file_extension(&upload.filename) else {
        return Ok(None);
    };

    let key = format!("{}.{}", Uuid::new_v4(), ext);
    let encoded =
        tokio::task::spawn_blocking(move || decode_resize_encode(&upload.body, &ext, max_dimension))
            .await
            .context("image worker panicked")??;

    store
        .put_object(&key, encoded)
        .await
        .with_context(|| format!("put_object {}", key))?;
    debug!(%key, "image stored");
    Ok(Some(key))
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::state::fakes::MemoryContentStore;
    use image::{GenericImageView, ImageBuffer, Luma, Rgb, Rgba};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Bytes {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            width,
            height,
            Rgba([200, 40, 40, 255]),
        ));
        let img = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
            _ => img,
        };
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        Bytes::from(out.into_inner())
    }

    fn upload(filename: &str, body: Bytes) -> Option<ImageUpload> {
        Some(ImageUpload {
            filename: filename.into(),
            body,
        })
    }

    #[test]
    fn fit_within_downscales_preserving_aspect() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(2000, 1000, Rgb([0, 0, 0])));
        let out = fit_within(img, 500);
        assert_eq!(out.dimensions(), (500, 250));
    }

    #[test]
    fn fit_within_never_upscales() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(100, 50, Rgb([0, 0, 0])));
        assert_eq!(fit_within(img, 500).dimensions(), (100, 50));
    }

    #[tokio::test]
    async fn large_image_is_stored_within_bounding_box() {
        let store = MemoryContentStore::default();
        let key = store_image(&store, upload("Big.PNG", encoded(2000, 1000, ImageFormat::Png)), 500)
            .await
            .unwrap()
            .expect("image stored");

        assert!(key.ends_with(".png"));
        let stored = store.get(&key).expect("object written");
        let img = image::load_from_memory(&stored).unwrap();
        assert!(img.width() <= 500 && img.height() <= 250);
        assert_eq!(img.dimensions(), (500, 250));
    }

    #[tokio::test]
    async fn small_image_keeps_its_size() {
        let store = MemoryContentStore::default();
        let key = store_image(&store, upload("small.jpg", encoded(100, 50, ImageFormat::Jpeg)), 500)
            .await
            .unwrap()
            .unwrap();

        let img = image::load_from_memory(&store.get(&key).unwrap()).unwrap();
        assert_eq!(img.dimensions(), (100, 50));
    }

    #[tokio::test]
    async fn rgba_source_can_be_saved_as_jpeg() {
        // PNG bytes uploaded with a .jpeg name are re-encoded as JPEG
        let store = MemoryContentStore::default();
        let key = store_image(&store, upload("pic.jpeg", encoded(600, 600, ImageFormat::Png)), 500)
            .await
            .unwrap()
            .unwrap();
        let stored = store.get(&key).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn sixteen_bit_grayscale_can_be_saved_as_gif() {
        let gray: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(700, 300, Luma([40_000u16]));
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageLuma16(gray)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();

        let store = MemoryContentStore::default();
        let key = store_image(
            &store,
            upload("scan.gif", Bytes::from(png.into_inner())),
            500,
        )
        .await
        .unwrap()
        .unwrap();

        let stored = store.get(&key).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Gif);
        let img = image::load_from_memory(&stored).unwrap();
        assert!(img.width() <= 500 && img.height() <= 500);
    }

    #[tokio::test]
    async fn undecodable_upload_fails_without_writing() {
        let store = MemoryContentStore::default();
        let err = store_image(&store, upload("broken.png", Bytes::from_static(b"not an image")), 500)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ImageDecode(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn missing_or_disallowed_upload_stores_nothing() {
        let store = MemoryContentStore::default();
        assert_eq!(store_image(&store, None, 500).await.unwrap(), None);
        let pdf = upload("cv.pdf", Bytes::from_static(b"%PDF-1.4"));
        assert_eq!(store_image(&store, pdf, 500).await.unwrap(), None);
        assert_eq!(store.len(), 0);
    }
}
