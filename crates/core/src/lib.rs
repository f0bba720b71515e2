#![deny(unsafe_code)]
//! Core types for the flamefield engines.
//!
//! Provides the variation catalog ([`Variation`]), the twelve-coefficient
//! [`Affine`] map, the [`Xorshift64`] PRNG, the run [`Palette`], sample
//! colors ([`Hsba`]), the camera/depth-of-field [`Compositor`], the
//! [`Engine`] trait with its [`SampleSink`], and the [`Seed`] run description.

pub mod affine;
pub mod camera;
pub mod color;
pub mod engine;
pub mod error;
pub mod palette;
pub mod params;
pub mod prng;
pub mod sample;
pub mod seed;
pub mod variation;

pub use affine::Affine;
pub use camera::{Border, Camera, Compositor, DepthOfField, Projection};
pub use color::{Hsba, Srgb};
pub use engine::Engine;
pub use error::EngineError;
pub use glam::DVec3;
pub use palette::Palette;
pub use prng::Xorshift64;
pub use sample::{CountingSink, Sample, SampleSink};
pub use seed::Seed;
pub use variation::Variation;
