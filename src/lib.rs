//! # zenraster
//!
//! Pixel format conversion, color quantization, and dithering for raster
//! images held fully in memory.
//!
//! The engine converts a [`RasterBuffer`] between a closed set of pixel
//! formats ([`PixelFormat`]): 1-bit mono in either bit order, 8-bit
//! indexed with a color table, RGB565, and the 32-bit RGB/ARGB/RGBA
//! variants in straight or premultiplied alpha. A format×format dispatch
//! table picks a hand-written direct converter, an in-place converter
//! when the bit depths permit reuse of the backing store, or a generic
//! fallback through the canonical premultiplied-ARGB32 representation.
//! Conversions to indexed and 1-bit formats go through palette
//! quantization (exact enumeration, then a 6×6×6 color cube) and
//! dithering (threshold, ordered, or error diffusion; see [`DitherMode`]).
//!
//! ## Non-Goals
//!
//! - Compressed file formats (use an image codec; this crate starts where
//!   decoding ends)
//! - Color management / ICC profiles
//! - GPU-side pixel formats and display compositing
//!
//! ## Usage
//!
//! ```
//! use zenraster::{ConvertFlags, PixelFormat, RasterBuffer};
//!
//! let mut image = RasterBuffer::new(16, 16, PixelFormat::Argb32);
//! // ... fill in pixels ...
//! image.convert(PixelFormat::Argb32Premultiplied, ConvertFlags::default())?;
//! assert_eq!(image.format(), PixelFormat::Argb32Premultiplied);
//!
//! let indexed = image.converted(PixelFormat::Indexed8, ConvertFlags::default())?;
//! assert!(indexed.color_table().len() <= 256);
//! # Ok::<(), zenraster::ConvertError>(())
//! ```
//!
//! Conversions never leave a buffer partially converted: the in-place
//! depth-growing path reserves memory before touching a pixel and is the
//! only fallible step.
//!
//! Distinct buffers may be converted from multiple threads freely; all
//! shared state is a handful of read-only tables.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod argb;
mod buffer;
mod codec;
mod direct;
mod error;
mod format;
mod inplace;
mod mono;
mod quantize;
mod router;
#[cfg(feature = "simd")]
mod simd;
mod tables;

// Re-exports
pub use buffer::{RasterBuffer, MAX_COLOR_TABLE};
pub use error::ConvertError;
pub use format::PixelFormat;
pub use router::{convert, converted, converted_with_color_table, ConvertFlags, DitherMode};
pub use tables::{gamma_correct_back_to_linear, GammaTable};
