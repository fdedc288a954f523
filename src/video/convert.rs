//! Pixel format conversion
//!
//! Integer BT.601 math, no SIMD. 640x480 at 30 fps is well within budget.

use super::frame::{Frame, PixelFormat};
use super::VideoError;

/// Luma of a BGR frame: `(77 R + 150 G + 29 B + 128) >> 8`
pub fn bgr_to_gray(frame: &Frame) -> Frame {
    let gray: Vec<u8> = frame
        .data
        .chunks_exact(3)
        .map(|px| {
            let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
            ((77 * r + 150 * g + 29 * b + 128) >> 8) as u8
        })
        .collect();

    Frame {
        width: frame.width,
        height: frame.height,
        format: PixelFormat::Gray8,
        data: gray.into(),
    }
}

/// Packed YUYV 4:2:2 (limited range) to BGR24
pub fn yuyv_to_bgr(src: &[u8], width: u32, height: u32) -> Result<Frame, VideoError> {
    let expected = width as usize * height as usize * 2;
    if src.len() < expected || width % 2 != 0 {
        return Err(VideoError::FrameSize {
            expected,
            actual: src.len(),
        });
    }

    let mut bgr = Vec::with_capacity(width as usize * height as usize * 3);
    for quad in src[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        push_bgr(&mut bgr, y0, u, v);
        push_bgr(&mut bgr, y1, u, v);
    }

    Frame::new(width, height, PixelFormat::Bgr24, bgr)
}

fn push_bgr(out: &mut Vec<u8>, y: u8, u: u8, v: u8) {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;

    out.push(b.clamp(0, 255) as u8);
    out.push(g.clamp(0, 255) as u8);
    out.push(r.clamp(0, 255) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bgr(pixels: &[[u8; 3]]) -> Frame {
        let data: Vec<u8> = pixels.iter().flatten().copied().collect();
        Frame::new(pixels.len() as u32, 1, PixelFormat::Bgr24, data).unwrap()
    }

    #[test]
    fn test_gray_extremes() {
        let frame = bgr(&[[0, 0, 0], [255, 255, 255]]);
        let gray = bgr_to_gray(&frame);
        assert_eq!(gray.format, PixelFormat::Gray8);
        assert_eq!(&gray.data[..], &[0, 255]);
    }

    #[test]
    fn test_gray_weights_green_highest() {
        let frame = bgr(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]]);
        let gray = bgr_to_gray(&frame);
        let (blue, green, red) = (gray.data[0], gray.data[1], gray.data[2]);
        assert!(green > red && red > blue);
        assert_eq!(red, 77);
    }

    #[test]
    fn test_yuyv_black_and_white() {
        // Two pixels: black (Y=16) and white (Y=235), neutral chroma
        let src = [16u8, 128, 235, 128];
        let frame = yuyv_to_bgr(&src, 2, 1).unwrap();
        assert_eq!(&frame.data[..], &[0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_red_dominates() {
        // High V pushes red
        let src = [81u8, 90, 81, 240];
        let frame = yuyv_to_bgr(&src, 2, 1).unwrap();
        let (b, g, r) = (frame.data[0], frame.data[1], frame.data[2]);
        assert!(r > 200);
        assert!(g < 50 && b < 50);
    }

    #[test]
    fn test_yuyv_short_buffer() {
        let src = [0u8; 6];
        assert!(yuyv_to_bgr(&src, 2, 2).is_err());
    }
}
