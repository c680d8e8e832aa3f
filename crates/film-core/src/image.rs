//! Floating-point image buffers.
//!
//! Two buffer types cover the whole pipeline:
//!
//! - [`Plane`] - one channel of `f32` samples; every optical and emulsion stage
//!   works on planes because the film layers are independent until composition.
//! - [`Image`] - interleaved 1- or 3-channel `f32` data in canonical **RGB**
//!   order.
//!
//! Channel order only matters at the 8-bit boundary: [`Image::from_u8`] and
//! [`Image::to_u8`] take a [`ChannelOrder`] and reorder there, so nothing past
//! the boundary ever sees BGR data.
//!
//! # Example
//!
//! ```rust
//! use film_core::{ChannelOrder, Image};
//!
//! // One blue pixel as delivered by a BGR source.
//! let bgr = [255u8, 0, 0];
//! let img = Image::from_u8(&bgr, 1, 1, 3, ChannelOrder::Bgr).unwrap();
//! assert_eq!(img.pixel(0, 0), &[0.0, 0.0, 1.0]);
//! assert_eq!(img.to_u8(ChannelOrder::Bgr), bgr.to_vec());
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Rec.709 luminance weights `[R, G, B]`.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Channel order of externally supplied 3-channel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Red, green, blue (canonical internal order).
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl ChannelOrder {
    /// Maps a canonical RGB channel index to the index in this order.
    #[inline]
    pub fn external_index(self, canonical: usize) -> usize {
        match self {
            ChannelOrder::Rgb => canonical,
            ChannelOrder::Bgr => 2 - canonical,
        }
    }
}

fn check_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height, "empty image"));
    }
    width
        .checked_mul(height)
        .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflow"))?;
    Ok(())
}

/// Single-channel `f32` image.
#[derive(Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    /// Creates a zero-filled plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates a plane with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wraps existing row-major samples.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] when `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Plane width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the plane holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major samples.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable row-major samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the plane and returns its samples.
    #[inline]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Sets the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    /// Row `y` as a slice.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Sum of all samples, accumulated in `f64`.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// Mean sample value (0 for an empty plane).
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum() / self.data.len() as f64
        }
    }

    /// Largest sample (`f32::NEG_INFINITY` for an empty plane).
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Smallest sample (`f32::INFINITY` for an empty plane).
    pub fn min(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Returns `true` if no sample is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Returns a new plane with `f` applied to every sample.
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Plane {
        Plane {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Applies `f` to every sample in place.
    pub fn map_in_place<F: Fn(f32) -> f32>(&mut self, f: F) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Combines two equally sized planes sample by sample.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] when sizes differ.
    pub fn zip_map<F: Fn(f32, f32) -> f32>(&self, other: &Plane, f: F) -> Result<Plane> {
        self.ensure_same_size(other)?;
        Ok(Plane {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Multiplies every sample by `factor`.
    pub fn scale(&mut self, factor: f32) {
        self.map_in_place(|v| v * factor);
    }

    /// Errors unless `other` has the same dimensions.
    pub fn ensure_same_size(&self, other: &Plane) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::dimension_mismatch(
                self.dimensions(),
                other.dimensions(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plane")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Interleaved 1- or 3-channel `f32` image in canonical RGB order.
///
/// Values are linear or encoded depending on the stage; the type does not
/// track that, the pipeline does.
#[derive(Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl Image {
    /// Creates a zero-filled image.
    ///
    /// # Errors
    ///
    /// Rejects empty dimensions and channel counts other than 1 or 3.
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        check_dims(width, height)?;
        check_channels(channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0.0; width * height * channels],
        })
    }

    /// Creates an image where every pixel equals `pixel`.
    ///
    /// The channel count is `pixel.len()`.
    pub fn filled(width: usize, height: usize, pixel: &[f32]) -> Result<Self> {
        check_dims(width, height)?;
        check_channels(pixel.len())?;
        let mut data = Vec::with_capacity(width * height * pixel.len());
        for _ in 0..width * height {
            data.extend_from_slice(pixel);
        }
        Ok(Self {
            width,
            height,
            channels: pixel.len(),
            data,
        })
    }

    /// Wraps interleaved RGB (or single-channel) samples.
    pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Result<Self> {
        check_dims(width, height)?;
        check_channels(channels)?;
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Imports 8-bit data, normalizing to [0, 1] and reordering to RGB.
    ///
    /// # Example
    ///
    /// ```rust
    /// use film_core::{ChannelOrder, Image};
    ///
    /// let img = Image::from_u8(&[0, 128, 255], 1, 1, 3, ChannelOrder::Rgb).unwrap();
    /// assert!((img.pixel(0, 0)[1] - 128.0 / 255.0).abs() < 1e-6);
    /// ```
    pub fn from_u8(
        bytes: &[u8],
        width: usize,
        height: usize,
        channels: usize,
        order: ChannelOrder,
    ) -> Result<Self> {
        check_dims(width, height)?;
        check_channels(channels)?;
        let expected = width * height * channels;
        if bytes.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, bytes.len()),
            ));
        }

        let mut data = vec![0.0f32; expected];
        if channels == 3 {
            for (dst, src) in data.chunks_exact_mut(3).zip(bytes.chunks_exact(3)) {
                for (c, d) in dst.iter_mut().enumerate() {
                    *d = src[order.external_index(c)] as f32 / 255.0;
                }
            }
        } else {
            for (d, &b) in data.iter_mut().zip(bytes) {
                *d = b as f32 / 255.0;
            }
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Exports to 8-bit in the requested channel order.
    ///
    /// Samples are clamped to [0, 1] and rounded; NaN maps to 0.
    pub fn to_u8(&self, order: ChannelOrder) -> Vec<u8> {
        let quantize = |v: f32| -> u8 {
            if v.is_nan() {
                0
            } else {
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };

        let mut out = vec![0u8; self.data.len()];
        if self.channels == 3 {
            for (dst, src) in out.chunks_exact_mut(3).zip(self.data.chunks_exact(3)) {
                for (c, &v) in src.iter().enumerate() {
                    dst[order.external_index(c)] = quantize(v);
                }
            }
        } else {
            for (d, &v) in out.iter_mut().zip(&self.data) {
                *d = quantize(v);
            }
        }
        out
    }

    /// Image width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Channel count (1 or 3).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Interleaved samples.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable interleaved samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Pixel at `(x, y)` as a channel slice.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let idx = (y * self.width + x) * self.channels;
        &self.data[idx..idx + self.channels]
    }

    /// Extracts channel `c` as a plane.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelMismatch`] if `c` is out of range.
    pub fn channel(&self, c: usize) -> Result<Plane> {
        if c >= self.channels {
            return Err(Error::channel_mismatch(self.channels, c + 1));
        }
        let data = self
            .data
            .iter()
            .skip(c)
            .step_by(self.channels)
            .copied()
            .collect();
        Ok(Plane {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Splits the image into one plane per channel.
    pub fn planes(&self) -> Vec<Plane> {
        let mut planes: Vec<Plane> = (0..self.channels)
            .map(|_| Plane::new(self.width, self.height))
            .collect();
        for (i, px) in self.data.chunks_exact(self.channels).enumerate() {
            for (plane, &v) in planes.iter_mut().zip(px) {
                plane.data[i] = v;
            }
        }
        planes
    }

    /// Interleaves equally sized planes into an image.
    ///
    /// # Errors
    ///
    /// Rejects channel counts other than 1 or 3 and mismatched plane sizes.
    pub fn from_planes(planes: &[Plane]) -> Result<Self> {
        check_channels(planes.len())?;
        let first = &planes[0];
        for p in &planes[1..] {
            first.ensure_same_size(p)?;
        }
        check_dims(first.width, first.height)?;

        let channels = planes.len();
        let mut data = vec![0.0f32; first.len() * channels];
        for (i, px) in data.chunks_exact_mut(channels).enumerate() {
            for (d, plane) in px.iter_mut().zip(planes) {
                *d = plane.data[i];
            }
        }
        Ok(Self {
            width: first.width,
            height: first.height,
            channels,
            data,
        })
    }

    /// Rec.709 luminance plane (the single channel for monochrome images).
    pub fn luminance(&self) -> Plane {
        let data = if self.channels == 3 {
            self.data
                .chunks_exact(3)
                .map(|px| px[0] * REC709_LUMA[0] + px[1] * REC709_LUMA[1] + px[2] * REC709_LUMA[2])
                .collect()
        } else {
            self.data.clone()
        };
        Plane {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Returns a 3-channel copy; monochrome data is replicated.
    pub fn to_rgb(&self) -> Image {
        if self.channels == 3 {
            return self.clone();
        }
        let data = self.data.iter().flat_map(|&v| [v, v, v]).collect();
        Image {
            width: self.width,
            height: self.height,
            channels: 3,
            data,
        }
    }

    /// Applies `f` to every sample in place.
    pub fn map_in_place<F: Fn(f32) -> f32>(&mut self, f: F) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Per-channel mean values.
    pub fn channel_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.channels];
        for px in self.data.chunks_exact(self.channels) {
            for (s, &v) in sums.iter_mut().zip(px) {
                *s += v as f64;
            }
        }
        let n = (self.width * self.height) as f64;
        sums.into_iter().map(|s| s / n).collect()
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .finish()
    }
}

fn check_channels(channels: usize) -> Result<()> {
    match channels {
        1 | 3 => Ok(()),
        got => Err(Error::UnsupportedChannels { got }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_stats() {
        let p = Plane::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(p.sum(), 10.0);
        assert_eq!(p.mean(), 2.5);
        assert_eq!(p.max(), 4.0);
        assert_eq!(p.min(), 1.0);
        assert_eq!(p.get(1, 1), 4.0);
        assert_eq!(p.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_plane_wrong_length() {
        let err = Plane::from_vec(3, 3, vec![0.0; 8]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_zip_map_mismatch() {
        let a = Plane::new(4, 4);
        let b = Plane::new(4, 5);
        assert!(a.zip_map(&b, |x, y| x + y).is_err());
    }

    #[test]
    fn test_rejects_unsupported_channels() {
        assert!(matches!(
            Image::new(4, 4, 4),
            Err(Error::UnsupportedChannels { got: 4 })
        ));
        assert!(Image::new(0, 4, 3).is_err());
    }

    #[test]
    fn test_bgr_import_is_reordered() {
        // BGR red pixel
        let img = Image::from_u8(&[0, 0, 255], 1, 1, 3, ChannelOrder::Bgr).unwrap();
        assert_eq!(img.pixel(0, 0), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bgr_boundary_round_trip() {
        let bytes: Vec<u8> = (0..4 * 3 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let img = Image::from_u8(&bytes, 4, 3, 3, ChannelOrder::Bgr).unwrap();
        assert_eq!(img.to_u8(ChannelOrder::Bgr), bytes);

        // Same buffer exported as RGB is channel-swapped.
        let rgb = img.to_u8(ChannelOrder::Rgb);
        for (a, b) in rgb.chunks_exact(3).zip(bytes.chunks_exact(3)) {
            assert_eq!(a, &[b[2], b[1], b[0]]);
        }
    }

    #[test]
    fn test_to_u8_clamps_and_handles_nan() {
        let img = Image::from_vec(3, 1, 1, vec![-0.5, 2.0, f32::NAN]).unwrap();
        assert_eq!(img.to_u8(ChannelOrder::Rgb), vec![0, 255, 0]);
    }

    #[test]
    fn test_planes_round_trip() {
        let data: Vec<f32> = (0..2 * 2 * 3).map(|i| i as f32).collect();
        let img = Image::from_vec(2, 2, 3, data).unwrap();
        let planes = img.planes();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[1].data(), &[1.0, 4.0, 7.0, 10.0]);
        assert_eq!(Image::from_planes(&planes).unwrap(), img);
        assert_eq!(img.channel(2).unwrap(), planes[2]);
    }

    #[test]
    fn test_luminance_and_to_rgb() {
        let img = Image::filled(2, 2, &[1.0, 1.0, 1.0]).unwrap();
        let lum = img.luminance();
        assert!((lum.get(0, 0) - 1.0).abs() < 1e-6);

        let mono = Image::filled(2, 2, &[0.25]).unwrap();
        let rgb = mono.to_rgb();
        assert_eq!(rgb.channels(), 3);
        assert_eq!(rgb.pixel(1, 1), &[0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_channel_means() {
        let img = Image::filled(3, 3, &[0.1, 0.2, 0.3]).unwrap();
        let means = img.channel_means();
        assert!((means[0] - 0.1).abs() < 1e-6);
        assert!((means[2] - 0.3).abs() < 1e-6);
    }
}
