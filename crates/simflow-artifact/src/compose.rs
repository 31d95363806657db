//! Frame normalization and GIF encoding.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, Rgba, RgbaImage};

use crate::error::{ArtifactError, Result};

/// An animation written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    /// Where the animation was written.
    pub path: PathBuf,
    /// Number of frames encoded.
    pub frame_count: usize,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Input frames that could not be read and were left out.
    pub skipped: Vec<PathBuf>,
}

/// Bring images to a common canvas.
///
/// The canvas is as wide as the widest image and as tall as the tallest.
/// Each image is copied unscaled to the top-left corner; the rest of its
/// canvas is transparent when the source had alpha and opaque black
/// otherwise.
pub fn normalize(images: &[DynamicImage]) -> Vec<RgbaImage> {
    let width = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let height = images.iter().map(|i| i.height()).max().unwrap_or(0);

    images
        .iter()
        .map(|image| {
            let background = if image.color().has_alpha() {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([0, 0, 0, 255])
            };
            let mut canvas = RgbaImage::from_pixel(width, height, background);
            image::imageops::replace(&mut canvas, &image.to_rgba8(), 0, 0);
            canvas
        })
        .collect()
}

/// Encode `frames`, in the given order, into a looping GIF at `output`.
///
/// Unreadable frames are skipped. When none can be read no file is created.
/// On success every input frame is removed; removal failures are logged and
/// otherwise ignored.
pub fn compose(frames: &[PathBuf], delay: Duration, output: &Path) -> Result<Animation> {
    let mut images = Vec::with_capacity(frames.len());
    let mut skipped = Vec::new();

    for path in frames {
        match image::open(path) {
            Ok(image) => images.push(image),
            Err(e) => {
                tracing::warn!(frame = %path.display(), error = %e, "Skipping unreadable frame");
                skipped.push(path.clone());
            }
        }
    }

    if images.is_empty() {
        return Err(ArtifactError::NoValidFrames {
            skipped: skipped.len(),
        });
    }

    let canvases = normalize(&images);
    let (width, height) = canvases
        .first()
        .map(|c| c.dimensions())
        .unwrap_or((0, 0));
    let frame_count = canvases.len();

    if let Err(e) = write_gif(canvases, delay, output) {
        if output.exists()
            && let Err(remove_err) = std::fs::remove_file(output)
        {
            tracing::warn!(path = %output.display(), error = %remove_err, "Failed to remove partial animation");
        }
        return Err(e);
    }

    for path in frames {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(frame = %path.display(), error = %e, "Failed to remove frame");
        }
    }

    tracing::info!(
        path = %output.display(),
        frames = frame_count,
        skipped = skipped.len(),
        width,
        height,
        "Animation written"
    );

    Ok(Animation {
        path: output.to_path_buf(),
        frame_count,
        width,
        height,
        skipped,
    })
}

fn write_gif(canvases: Vec<RgbaImage>, delay: Duration, output: &Path) -> Result<()> {
    let io_err = |source| ArtifactError::Io {
        path: output.to_path_buf(),
        source,
    };
    let encode_err = |source| ArtifactError::Encode {
        path: output.to_path_buf(),
        source,
    };

    let file = File::create(output).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    {
        let mut encoder = GifEncoder::new(&mut writer);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_err)?;
        let delay = Delay::from_saturating_duration(delay);
        for canvas in canvases {
            encoder
                .encode_frame(Frame::from_parts(canvas, 0, 0, delay))
                .map_err(encode_err)?;
        }
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}
