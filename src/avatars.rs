//! Avatar normalization: fixed square size, recompressed in place.
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context;
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageFormat, ImageReader};
use uuid::Uuid;

pub const AVATAR_SIZE: u32 = 250;
pub const JPEG_QUALITY: u8 = 60;

/// Resizes the image at `path` to `AVATAR_SIZE` square and rewrites it in its own format.
pub async fn normalize(path: PathBuf) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || normalize_blocking(&path))
        .await
        .context("avatar worker panicked")?
}

fn normalize_blocking(path: &Path) -> anyhow::Result<()> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .with_guessed_format()
        .context("read image header")?;
    let format = reader.format().context("unrecognized image format")?;
    let img = reader.decode().context("decode image")?;

    let resized = img.resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);

    match format {
        ImageFormat::Jpeg => {
            let out = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(out), JPEG_QUALITY);
            encoder
                .encode_image(&resized.to_rgb8())
                .context("encode jpeg")?;
        }
        other => resized
            .save_with_format(path, other)
            .with_context(|| format!("encode {:?}", other))?,
    }
    Ok(())
}

/// Final file name in public storage for `user_id`'s upload.
pub fn public_file_name(user_id: Uuid, original_name: &str) -> String {
    format!("{}_{}", user_id, sanitize_file_name(original_name))
}

/// Last path component of a client-supplied name, restricted to a safe charset.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "avatar".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes an upload into `tmp_dir` under a unique name.
pub async fn write_temp_upload(tmp_dir: &Path, original_name: &str, body: Bytes) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(tmp_dir)
        .await
        .with_context(|| format!("create {}", tmp_dir.display()))?;
    let path = tmp_dir.join(format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name)));
    tokio::fs::write(&path, &body)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
