// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — owns the session and runs the three workflows.
//
// The session sits behind `Arc<Mutex<>>` so it can be shared with async
// tasks, but the lock is only held to snapshot or mutate it. Decoding and
// encoding run in `spawn_blocking` on the snapshot, so editing the batch while
// a document is being assembled cannot change that document.
//
// Every public action ends in exactly one `StatusMessage`. Failures leave the
// session as it was.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::human_errors::{Severity, humanize_error};
use bildwerk_core::naming;
use bildwerk_core::status::{StatusMessage, format_bytes};
use bildwerk_core::types::{Download, ImageItem, TargetFormat};
use bildwerk_core::PipelineConfig;
use bildwerk_document::{DocumentAssembler, ImageProcessor, PdfReader, ReencodePipeline};
use tracing::{error, info, instrument, warn};

use super::data_dir;
use crate::state::SessionState;

/// A produced payload plus the success text describing it.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub download: Download,
    pub summary: String,
}

/// Shared application services.
///
/// Cheaply cloneable: clones share the same session.
#[derive(Clone)]
pub struct AppServices {
    session: Arc<Mutex<SessionState>>,
    config: Arc<PipelineConfig>,
    output_dir: PathBuf,
}

#[allow(dead_code)]
impl AppServices {
    /// Create services around a validated config. Downloads are written to
    /// `output_dir`.
    pub fn new(config: PipelineConfig, output_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        let output_dir = output_dir.into();
        info!(output = %output_dir.display(), capacity = config.batch_capacity, "app services initialised");
        Ok(Self {
            session: Arc::new(Mutex::new(SessionState::new(config.batch_capacity))),
            config: Arc::new(config),
            output_dir,
        })
    }

    /// Copy of the current session.
    pub fn session(&self) -> SessionState {
        self.session.lock().expect("session lock poisoned").clone()
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut guard = self.session.lock().expect("session lock poisoned");
        f(&mut guard)
    }

    // -- Ingestion -----------------------------------------------------------

    /// Read one image file. The extension must name a supported format and
    /// the content must not be an unsupported one; when the two disagree the
    /// content wins.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn load_image(path: &Path) -> Result<ImageItem> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = tokio::fs::read(path).await?;
        let item = ImageItem::from_named_bytes(name, data)?;

        let detected = ImageProcessor::detect_media_type(&item)?;
        if detected == item.media_type() {
            return Ok(item);
        }
        warn!(
            declared = ?item.media_type(),
            ?detected,
            "file content does not match its extension"
        );
        Ok(ImageItem::new(item.name(), detected, item.bytes()))
    }

    /// Read several files; any unreadable or unsupported file rejects them all.
    pub async fn load_images(paths: &[PathBuf]) -> Result<Vec<ImageItem>> {
        let mut items = Vec::with_capacity(paths.len());
        for path in paths {
            items.push(Self::load_image(path).await?);
        }
        Ok(items)
    }

    // -- Batch ---------------------------------------------------------------

    /// Append images to the document batch (all-or-nothing).
    pub fn add_to_batch(&self, items: Vec<ImageItem>) -> StatusMessage {
        if items.is_empty() {
            return report_error(&BildwerkError::NoImageSelected);
        }
        let added = items.len();
        match self.with_session(|s| {
            let total = s.batch_mut().append(items)?;
            Ok::<_, BildwerkError>((total, s.batch().total_bytes()))
        }) {
            Ok((total, queued_bytes)) => {
                info!(added, total, queued_bytes, "images added to batch");
                StatusMessage::success(format!("{added} image(s) added. Total images: {total}"))
            }
            Err(err) => report_error(&err),
        }
    }

    /// Remove the image at `index` from the batch.
    pub fn remove_from_batch(&self, index: usize) -> StatusMessage {
        match self.with_session(|s| {
            let removed = s.batch_mut().remove_at(index)?;
            Ok::<_, BildwerkError>((removed, s.batch().len()))
        }) {
            Ok((removed, total)) => {
                info!(index, name = removed.name(), total, "image removed from batch");
                StatusMessage::success(format!(
                    "Image removed successfully. Total images: {total}"
                ))
            }
            Err(err) => report_error(&err),
        }
    }

    pub fn clear_batch(&self) -> StatusMessage {
        self.with_session(SessionState::clear_batch);
        StatusMessage::success("All images cleared.")
    }

    // -- Single-image slots ----------------------------------------------------

    /// Put `image` in the compression slot, or clear it with `None`.
    pub fn select_compression_image(&self, image: Option<ImageItem>) -> StatusMessage {
        match image {
            Some(image) => {
                let text = format!(
                    "Image loaded for compression: {} ({})",
                    image.name(),
                    format_bytes(image.byte_len() as u64)
                );
                self.with_session(|s| s.set_compression_image(image));
                StatusMessage::success(text)
            }
            None => {
                self.with_session(SessionState::clear_compression_image);
                StatusMessage::success("Compression image cleared.")
            }
        }
    }

    /// Put `image` in the conversion slot, or clear it with `None`.
    pub fn select_conversion_image(&self, image: Option<ImageItem>) -> StatusMessage {
        match image {
            Some(image) => {
                let text = format!("Image loaded for conversion: {}", image.name());
                self.with_session(|s| s.set_conversion_image(image));
                StatusMessage::success(text)
            }
            None => {
                self.with_session(SessionState::clear_conversion_image);
                StatusMessage::success("Conversion image cleared.")
            }
        }
    }

    pub fn set_conversion_target(&self, target: TargetFormat) {
        self.with_session(|s| s.set_conversion_target(target));
    }

    // -- Workflows -------------------------------------------------------------

    /// Assemble the batch into a PDF and save it.
    pub async fn export_document(&self, custom_name: Option<&str>) -> StatusMessage {
        let result = self.build_document(custom_name).await;
        self.deliver(result).await
    }

    /// Compress the selected image (default quality if `None`) and save it.
    pub async fn compress_image(&self, quality: Option<f32>, custom_name: Option<&str>) -> StatusMessage {
        let result = self.build_compressed(quality, custom_name).await;
        self.deliver(result).await
    }

    /// Convert the selected image to the current target format and save it.
    pub async fn convert_image(&self, custom_name: Option<&str>) -> StatusMessage {
        let result = self.build_converted(custom_name).await;
        self.deliver(result).await
    }

    /// Build the PDF for the current batch without saving it.
    #[instrument(skip(self))]
    pub async fn build_document(&self, custom_name: Option<&str>) -> Result<Artifact> {
        let items = self.with_session(|s| s.batch().snapshot());
        if items.is_empty() {
            return Err(BildwerkError::EmptyBatch);
        }

        let assembler = DocumentAssembler::from_config(&self.config);
        let bytes = tokio::task::spawn_blocking(move || assembler.assemble(&items))
            .await
            .map_err(|err| BildwerkError::PdfError(format!("assembly task failed: {err}")))??;

        let pages = PdfReader::from_bytes(&bytes)?.page_count();
        Ok(Artifact {
            summary: format!("PDF converted with {pages} page(s)"),
            download: Download {
                file_name: naming::document_file_name(custom_name),
                mime_type: "application/pdf",
                bytes,
            },
        })
    }

    /// Compress the selected image without saving it.
    #[instrument(skip(self))]
    pub async fn build_compressed(&self, quality: Option<f32>, custom_name: Option<&str>) -> Result<Artifact> {
        let image = self
            .with_session(|s| s.compression_image().cloned())
            .ok_or(BildwerkError::NoImageSelected)?;
        let spec = self
            .config
            .compression_spec(quality.unwrap_or(self.config.default_compression_quality));

        let pipeline = ReencodePipeline::from_config(&self.config);
        let source = image.clone();
        let output = tokio::task::spawn_blocking(move || pipeline.compress_with(&source, &spec))
            .await
            .map_err(|err| BildwerkError::CompressionFailure(format!("compression task failed: {err}")))??;

        Ok(Artifact {
            summary: format!(
                "Image compressed from {} to {}",
                format_bytes(image.byte_len() as u64),
                format_bytes(output.byte_len as u64)
            ),
            download: Download {
                file_name: naming::compressed_file_name(&image, custom_name),
                mime_type: "image/jpeg",
                bytes: output.bytes,
            },
        })
    }

    /// Convert the selected image without saving it.
    #[instrument(skip(self))]
    pub async fn build_converted(&self, custom_name: Option<&str>) -> Result<Artifact> {
        let (image, target) = self.with_session(|s| (s.conversion_image().cloned(), s.conversion_target()));
        let image = image.ok_or(BildwerkError::NoImageSelected)?;

        let pipeline = ReencodePipeline::from_config(&self.config);
        let source = image.clone();
        let output = tokio::task::spawn_blocking(move || pipeline.convert(&source, target))
            .await
            .map_err(|err| BildwerkError::EncodeFailure(format!("conversion task failed: {err}")))??;

        Ok(Artifact {
            summary: format!(
                "Image successfully converted to {} ({})",
                target.label(),
                format_bytes(output.byte_len as u64)
            ),
            download: Download {
                file_name: naming::converted_file_name(&image, custom_name, target),
                mime_type: target.mime_type(),
                bytes: output.bytes,
            },
        })
    }

    // -- Output ------------------------------------------------------------------

    /// Write a download into the output directory.
    pub async fn save_download(&self, download: &Download) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(&download.file_name);
        tokio::fs::write(&path, &download.bytes).await?;
        info!(path = %path.display(), bytes = download.byte_len(), "download written");
        Ok(path)
    }

    /// Save a successful artifact and turn the whole outcome into one status.
    async fn deliver(&self, result: Result<Artifact>) -> StatusMessage {
        let artifact = match result {
            Ok(artifact) => artifact,
            Err(err) => return report_error(&err),
        };
        match self.save_download(&artifact.download).await {
            Ok(path) => StatusMessage::success(format!(
                "{}. Saved to {}",
                artifact.summary,
                path.display()
            )),
            Err(err) => report_error(&err),
        }
    }
}

fn report_error(err: &BildwerkError) -> StatusMessage {
    let human = humanize_error(err);
    match human.severity {
        Severity::Internal => error!(error = %err, "operation failed"),
        severity => warn!(error = %err, ?severity, "operation failed"),
    }
    StatusMessage::from_human(&human)
}

// -- Config persistence --------------------------------------------------------

/// Load the config from `explicit`, else from the default location if it
/// exists, else fall back to defaults.
pub async fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = data_dir::config_file();
            if !tokio::fs::try_exists(&default).await? {
                return Ok(PipelineConfig::default());
            }
            default
        }
    };
    let data = tokio::fs::read_to_string(&path).await?;
    let config = PipelineConfig::from_json(&data)?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Pretty-printed JSON for a config, as written by `gen-config`.
pub fn render_config(config: &PipelineConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::StatusKind;
    use bildwerk_core::types::MediaType;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn png(name: &str, width: u32, height: u32) -> ImageItem {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageItem::new(name, MediaType::Png, bytes)
    }

    fn services(dir: &tempfile::TempDir) -> AppServices {
        AppServices::new(PipelineConfig::default(), dir.path()).unwrap()
    }

    fn names(svc: &AppServices) -> Vec<String> {
        svc.session().batch().iter().map(|i| i.name().to_string()).collect()
    }

    #[tokio::test]
    async fn remove_then_export_keeps_upload_order() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);

        let status = svc.add_to_batch(vec![png("item0.png", 8, 8), png("item1.png", 8, 8), png("item2.png", 8, 8)]);
        assert_eq!(status.text, "3 image(s) added. Total images: 3");

        let status = svc.remove_from_batch(1);
        assert_eq!(status.text, "Image removed successfully. Total images: 2");
        assert_eq!(names(&svc), ["item0.png", "item2.png"]);

        let artifact = svc.build_document(None).await.unwrap();
        assert_eq!(PdfReader::from_bytes(&artifact.download.bytes).unwrap().page_count(), 2);

        let status = svc.export_document(None).await;
        assert!(status.is_success(), "{status}");
        assert!(dir.path().join("converted_images.pdf").exists());
    }

    #[tokio::test]
    async fn overflowing_add_is_rejected_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            batch_capacity: 3,
            ..PipelineConfig::default()
        };
        let svc = AppServices::new(config, dir.path()).unwrap();

        assert!(svc.add_to_batch(vec![png("a.png", 4, 4), png("b.png", 4, 4)]).is_success());
        let status = svc.add_to_batch(vec![png("c.png", 4, 4), png("d.png", 4, 4)]);
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("up to 3 images"), "{status}");
        assert_eq!(names(&svc), ["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn empty_batch_export_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);

        let status = svc.export_document(Some("album")).await;
        assert_eq!(status.kind, StatusKind::Error);
        assert!(!dir.path().join("album.pdf").exists());
    }

    #[tokio::test]
    async fn corrupt_item_fails_export_and_leaves_batch_intact() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);
        svc.add_to_batch(vec![
            png("fine.png", 4, 4),
            ImageItem::new("broken.png", MediaType::Png, vec![1u8, 2, 3]),
        ]);

        let status = svc.export_document(None).await;
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("broken.png"), "{status}");
        assert_eq!(svc.session().batch().len(), 2);
        assert!(!dir.path().join("converted_images.pdf").exists());
    }

    #[tokio::test]
    async fn removing_a_missing_index_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);
        svc.add_to_batch(vec![png("a.png", 4, 4)]);

        let status = svc.remove_from_batch(5);
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(svc.session().batch().len(), 1);
    }

    #[tokio::test]
    async fn export_snapshot_ignores_later_batch_edits() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);
        svc.add_to_batch(vec![png("a.png", 4, 4), png("b.png", 4, 4)]);

        let pending = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.build_document(None).await })
        };
        // Whether this lands before or after the snapshot, the document is
        // built from one consistent list: two pages or the cleared error.
        svc.clear_batch();

        match pending.await.unwrap() {
            Ok(artifact) => {
                let pages = PdfReader::from_bytes(&artifact.download.bytes).unwrap().page_count();
                assert_eq!(pages, 2);
            }
            Err(err) => assert!(matches!(err, BildwerkError::EmptyBatch)),
        }
    }

    #[tokio::test]
    async fn compress_without_selection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);

        let status = svc.compress_image(None, None).await;
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("No image selected"));
    }

    #[tokio::test]
    async fn compress_writes_jpeg_with_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);
        svc.select_compression_image(Some(png("sunset.png", 32, 24)));

        let status = svc.compress_image(Some(0.5), None).await;
        assert!(status.is_success(), "{status}");

        let written = std::fs::read(dir.path().join("sunset_compressed.jpg")).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn convert_uses_target_and_custom_name() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);
        svc.select_conversion_image(Some(png("scan.png", 20, 10)));
        svc.set_conversion_target(TargetFormat::Jpeg);

        let status = svc.convert_image(Some("final")).await;
        assert!(status.is_success(), "{status}");
        assert!(status.text.contains("JPEG"));

        let written = std::fs::read(dir.path().join("final.jpg")).unwrap();
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[tokio::test]
    async fn clearing_a_slot_makes_its_workflow_fail() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(&dir);
        svc.select_conversion_image(Some(png("x.png", 4, 4)));
        svc.select_conversion_image(None);

        assert!(matches!(
            svc.build_converted(None).await,
            Err(BildwerkError::NoImageSelected)
        ));
    }

    #[tokio::test]
    async fn load_images_rejects_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("ok.png");
        let bad = dir.path().join("anim.gif");
        std::fs::write(&good, png("ok.png", 2, 2).bytes()).unwrap();
        std::fs::write(&bad, b"GIF89a").unwrap();

        let item = AppServices::load_image(&good).await.unwrap();
        assert_eq!(item.name(), "ok.png");
        assert_eq!(item.media_type(), MediaType::Png);

        let err = AppServices::load_images(&[good, bad]).await.unwrap_err();
        assert!(matches!(err, BildwerkError::UnsupportedMedia(_)));
    }

    #[tokio::test]
    async fn renamed_file_is_judged_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let png_named_jpg = dir.path().join("photo.jpg");
        let gif_named_png = dir.path().join("anim.png");
        std::fs::write(&png_named_jpg, png("x.png", 3, 2).bytes()).unwrap();
        std::fs::write(&gif_named_png, b"GIF89a\x01\x00\x01\x00").unwrap();

        let item = AppServices::load_image(&png_named_jpg).await.unwrap();
        assert_eq!(item.name(), "photo.jpg");
        assert_eq!(item.media_type(), MediaType::Png);

        let err = AppServices::load_image(&gif_named_png).await.unwrap_err();
        assert!(matches!(err, BildwerkError::UnsupportedMedia(_)));
    }

    #[tokio::test]
    async fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "batch_capacity": 10, "paper_size": "A5" }"#).unwrap();

        let config = load_config(Some(path.as_path())).await.unwrap();
        assert_eq!(config.batch_capacity, 10);

        let rendered = render_config(&config).unwrap();
        assert_eq!(PipelineConfig::from_json(&rendered).unwrap(), config);
    }

    #[tokio::test]
    async fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(Some(dir.path().join("absent.json").as_path())).await,
            Err(BildwerkError::Io(_))
        ));
    }
}
