//! Pixel-data conversion between FFmpeg frames and `image` buffers.

use ffmpeg_next::frame::Video as VideoFrame;
use image::RgbImage;

use crate::error::GifMakerError;

/// Copy pixel data from an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3). The
/// padding is stripped so the result can go straight into
/// [`RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Build an [`RgbImage`] from an RGB24 FFmpeg frame.
pub(crate) fn frame_to_rgb_image(video_frame: &VideoFrame) -> Result<RgbImage, GifMakerError> {
    let width = video_frame.width();
    let height = video_frame.height();
    let buffer = frame_to_rgb_buffer(video_frame, width, height);
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        GifMakerError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}
