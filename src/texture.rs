//! Pixel storage
//!
//! `Texture` backs everything 2D in the pipeline: sampled material images,
//! shadow maps, and the color/depth planes of a render target. Pixels are
//! `AtomicI32` so the parallel geometry stage can write fragments through a
//! shared reference; relaxed loads compile to plain loads, so read-only
//! sampling pays nothing for it.
//!
//! Bounds are the caller's responsibility on the hot paths: `get`/`set`
//! index directly (debug assertions aside), and the shading stages clamp or
//! cull before touching pixels.

use std::sync::atomic::{AtomicI32, Ordering};

use thiserror::Error;

use crate::color::Color;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture dimensions must be nonzero ({width}x{height})")]
    ZeroSize { width: usize, height: usize },
    #[error("pixel buffer holds {len} values, expected {width}x{height}")]
    SizeMismatch { len: usize, width: usize, height: usize },
}

/// 2D array of packed color or fixed-point depth values.
#[derive(Debug)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<AtomicI32>,
}

impl Texture {
    /// Zero-filled texture.
    pub fn new(width: usize, height: usize) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        pixels.resize_with(width * height, || AtomicI32::new(0));
        Texture { width, height, pixels }
    }

    /// Wrap a decoded pixel buffer supplied by an asset loader.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<i32>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        if pixels.len() != width * height {
            return Err(TextureError::SizeMismatch { len: pixels.len(), width, height });
        }
        Ok(Texture {
            width,
            height,
            pixels: pixels.into_iter().map(AtomicI32::new).collect(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> i32 {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[y * self.width + x].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, x: usize, y: usize, value: i32) {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[y * self.width + x].store(value, Ordering::Relaxed);
    }

    /// Closer-wins depth write: stores `depth` if it is smaller than the
    /// current value and reports whether it won. Ties keep the first
    /// writer. Concurrent winners are resolved by the atomic min; a racing
    /// color store against a later, closer fragment is the documented
    /// nondeterminism of the pipeline.
    #[inline]
    pub fn depth_min(&self, x: usize, y: usize, depth: i32) -> bool {
        debug_assert!(x < self.width && y < self.height);
        let previous = self.pixels[y * self.width + x].fetch_min(depth, Ordering::AcqRel);
        previous > depth
    }

    pub fn fill(&self, value: i32) {
        for pixel in &self.pixels {
            pixel.store(value, Ordering::Relaxed);
        }
    }
}

impl Clone for Texture {
    fn clone(&self) -> Self {
        Texture {
            width: self.width,
            height: self.height,
            pixels: self
                .pixels
                .iter()
                .map(|pixel| AtomicI32::new(pixel.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

/// Color and depth planes of one render destination.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    color: Texture,
    depth: Texture,
}

impl RenderTarget {
    pub fn new(width: usize, height: usize) -> Self {
        RenderTarget {
            color: Texture::new(width, height),
            depth: Texture::new(width, height),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.color.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.color.height()
    }

    #[inline]
    pub fn color(&self) -> &Texture {
        &self.color
    }

    #[inline]
    pub fn depth(&self) -> &Texture {
        &self.depth
    }

    /// Reset for a new frame: background color everywhere, depth at the
    /// farthest representable value.
    pub fn clear(&self, background: Color) {
        self.color.fill(background.0 as i32);
        self.depth.fill(i32::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let texture = Texture::new(4, 3);
        texture.set(2, 1, 77);
        assert_eq!(texture.get(2, 1), 77);
        assert_eq!(texture.get(0, 0), 0);
    }

    #[test]
    fn test_from_pixels_validates() {
        assert!(Texture::from_pixels(2, 2, vec![1, 2, 3, 4]).is_ok());
        assert!(matches!(
            Texture::from_pixels(2, 2, vec![1, 2, 3]),
            Err(TextureError::SizeMismatch { .. })
        ));
        assert!(matches!(
            Texture::from_pixels(0, 2, vec![]),
            Err(TextureError::ZeroSize { .. })
        ));
    }

    #[test]
    fn test_depth_min_closer_wins() {
        let depth = Texture::new(2, 2);
        depth.fill(i32::MAX);
        assert!(depth.depth_min(0, 0, 1000));
        // a farther write must lose and leave the stored depth alone
        assert!(!depth.depth_min(0, 0, 2000));
        assert_eq!(depth.get(0, 0), 1000);
        // an equal write loses too: first writer keeps the pixel
        assert!(!depth.depth_min(0, 0, 1000));
    }

    #[test]
    fn test_clear() {
        let target = RenderTarget::new(3, 3);
        target.depth().set(1, 1, 5);
        target.clear(Color::rgb(1, 2, 3));
        assert_eq!(target.depth().get(1, 1), i32::MAX);
        assert_eq!(target.color().get(0, 0) as u32, Color::rgb(1, 2, 3).0);
    }

    #[test]
    fn test_contains() {
        let texture = Texture::new(4, 2);
        assert!(texture.contains(0, 0));
        assert!(texture.contains(3, 1));
        assert!(!texture.contains(4, 0));
        assert!(!texture.contains(-1, 0));
        assert!(!texture.contains(0, 2));
    }
}
