mod blocks;
mod decoder;
mod discriminator;
mod encoder;
mod model;
pub mod params;

pub use blocks::{ProjectionHead, StridedConvBlock, StridedDeconvBlock};
pub use decoder::{Decoder, PoseInput};
pub use discriminator::{IndependentDiscriminator, SceneDiscriminator};
pub use encoder::{
    ContentEncoder, ContentEncoderOutput, IndependentPoseEncoder, IndependentPoseEncoderInit,
    PoseEncoder, PoseSource, SeparatePoseEncoder, SharedPoseEncoder,
};
pub use model::{DrnetModel, DrnetModelInit, DrnetModelInput, DrnetModelOutput};
