//! Album-art mosaic generator.
//!
//! Downloads every cover, scrambles each one (brightness, rotation, size,
//! solarization, translucency), piles them onto a black canvas at random
//! positions and finishes with an edge-enhancement pass.

pub mod transform;

use std::io::Cursor;
use std::ops::{Range, RangeInclusive};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{AppError, AppResult};
use crate::spotify::SpotifyClient;

/// Something that can download an album cover.
#[async_trait]
pub trait CoverFetcher: Send + Sync {
    async fn fetch_cover(&self, url: &str) -> AppResult<Vec<u8>>;
}

#[async_trait]
impl CoverFetcher for SpotifyClient {
    async fn fetch_cover(&self, url: &str) -> AppResult<Vec<u8>> {
        self.fetch_bytes(url).await
    }
}

/// Named ranges for every random choice the mosaic makes.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicParams {
    /// Side of the square every cover is first decoded to.
    pub cell_size: u32,
    /// Canvas side, in cells.
    pub grid: u32,
    /// Brightness multiplier.
    pub brightness: RangeInclusive<f32>,
    /// Counter-clockwise rotation, in whole degrees.
    pub rotation_degrees: Range<u32>,
    /// Width and height after rotation, drawn independently.
    pub resize: RangeInclusive<u32>,
    /// Channel values at or above this are inverted.
    pub solarize_threshold: RangeInclusive<u8>,
    /// Opacity of the paste mask.
    pub mask_opacity: RangeInclusive<u8>,
}

impl Default for MosaicParams {
    fn default() -> Self {
        Self {
            cell_size: 50,
            grid: 6,
            brightness: 0.7..=1.3,
            rotation_degrees: 0..360,
            resize: 50..=100,
            solarize_threshold: 50..=150,
            mask_opacity: 100..=200,
        }
    }
}

impl MosaicParams {
    pub fn canvas_size(&self) -> u32 {
        self.cell_size * self.grid
    }

    /// Shrink a decoded cover to a `cell_size` square tile.
    pub fn shrink(&self, cover: &DynamicImage) -> RgbaImage {
        cover
            .resize_exact(self.cell_size, self.cell_size, FilterType::Lanczos3)
            .to_rgba8()
    }

    /// Decode downloaded cover bytes straight into a cell-sized tile.
    pub fn decode_tile(&self, url: &str, bytes: &[u8]) -> AppResult<RgbaImage> {
        let cover = image::load_from_memory(bytes).map_err(|e| AppError::decode(url, e))?;
        Ok(self.shrink(&cover))
    }

    /// Composite cell-sized `tiles`, in order, onto a fresh opaque black canvas.
    pub fn compose<R: Rng + ?Sized>(&self, tiles: Vec<RgbaImage>, rng: &mut R) -> RgbaImage {
        let side = self.canvas_size();
        let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 255]));

        for tile in tiles {
            let tile = self.scramble(&tile, rng);
            let opacity = rng.gen_range(self.mask_opacity.clone());
            let x = rng.gen_range(0..=side.saturating_sub(tile.width()));
            let y = rng.gen_range(0..=side.saturating_sub(tile.height()));

            transform::blend_onto(&mut canvas, &tile, x, y, opacity);
        }

        transform::edge_enhance_more(&canvas)
    }

    fn scramble<R: Rng + ?Sized>(&self, tile: &RgbaImage, rng: &mut R) -> RgbaImage {
        let tile = transform::brighten(tile, rng.gen_range(self.brightness.clone()));
        let tile = transform::rotate_expand(&tile, rng.gen_range(self.rotation_degrees.clone()) as f64);

        let width = rng.gen_range(self.resize.clone());
        let height = rng.gen_range(self.resize.clone());
        let mut tile = image::imageops::resize(&tile, width, height, FilterType::CatmullRom);

        transform::solarize(&mut tile, rng.gen_range(self.solarize_threshold.clone()));
        tile
    }
}

/// Output encoding, picked from the mosaic file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosaicFormat {
    Png,
    /// Encoded at quality 95; alpha is dropped.
    Jpeg,
}

impl MosaicFormat {
    pub const JPEG_QUALITY: u8 = 95;

    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => Self::Jpeg,
            _ => Self::Png,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn encode(self, canvas: RgbaImage) -> AppResult<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoded = match self {
            Self::Png => DynamicImage::ImageRgba8(canvas)
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png),
            Self::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
                JpegEncoder::new_with_quality(&mut bytes, Self::JPEG_QUALITY).encode_image(&rgb)
            }
        };
        encoded.map_err(|e| AppError::Internal(format!("Failed to encode mosaic: {}", e)))?;

        Ok(bytes)
    }
}

/// A finished, persisted mosaic.
#[derive(Debug)]
pub struct Mosaic {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// One mosaic run: where covers come from and where the result goes.
pub struct MosaicGenerator<'a> {
    fetcher: &'a dyn CoverFetcher,
    params: MosaicParams,
    concurrency: usize,
    output: PathBuf,
    seed: Option<u64>,
}

impl<'a> MosaicGenerator<'a> {
    pub fn new(fetcher: &'a dyn CoverFetcher, params: MosaicParams, output: PathBuf) -> Self {
        Self {
            fetcher,
            params,
            concurrency: 8,
            output,
            seed: None,
        }
    }

    /// Maximum number of covers downloaded at once.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fix the random sequence, making the output reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the mosaic from `urls`, write it to the output path and return it.
    ///
    /// Any cover that fails to download or decode fails the whole run.
    pub async fn generate(self, urls: &[String]) -> AppResult<Mosaic> {
        if urls.is_empty() {
            return Err(AppError::NoImages);
        }

        let fetcher = self.fetcher;
        let params = &self.params;
        let tiles: Vec<RgbaImage> = stream::iter(urls)
            .map(|url| async move {
                let bytes = fetcher.fetch_cover(url).await?;
                let decoder = params.clone();
                let url = url.clone();
                actix_web::web::block(move || decoder.decode_tile(&url, &bytes))
                    .await
                    .map_err(|e| AppError::Internal(format!("Cover decode worker failed: {}", e)))?
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        tracing::info!(covers = tiles.len(), "Album covers downloaded, compositing mosaic");

        let format = MosaicFormat::from_path(&self.output);
        let params = self.params;
        let seed = self.seed;

        let bytes = actix_web::web::block(move || {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            format.encode(params.compose(tiles, &mut rng))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Mosaic worker failed: {}", e)))??;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.output, &bytes).await?;

        tracing::info!(
            path = %self.output.display(),
            bytes = bytes.len(),
            "Mosaic written"
        );

        Ok(Mosaic {
            bytes,
            content_type: format.content_type(),
        })
    }
}
