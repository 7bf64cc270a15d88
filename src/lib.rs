//! Disentangled content and pose representation networks for 64x64 video frames.
//!
//! A [ContentEncoder](model::ContentEncoder) maps a frame to a content code plus skip
//! maps, a [PoseEncoder](model::PoseEncoder) or
//! [IndependentPoseEncoder](model::IndependentPoseEncoder) maps a frame to pose codes, and
//! the [Decoder](model::Decoder) reconstructs a frame from both. The
//! [SceneDiscriminator](model::SceneDiscriminator) and
//! [IndependentDiscriminator](model::IndependentDiscriminator) classify pose codes.

pub mod common;
pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};

static_assertions::assert_impl_all!(model::DrnetModel: Send);
static_assertions::assert_impl_all!(model::PoseEncoder: Send);
static_assertions::assert_impl_all!(model::IndependentPoseEncoder: Send);
static_assertions::assert_impl_all!(model::ContentEncoder: Send);
static_assertions::assert_impl_all!(model::Decoder: Send);
static_assertions::assert_impl_all!(model::SceneDiscriminator: Send);
static_assertions::assert_impl_all!(model::IndependentDiscriminator: Send);
