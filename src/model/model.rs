use super::{
    decoder::Decoder,
    discriminator::{IndependentDiscriminator, SceneDiscriminator},
    encoder::{
        ContentEncoder, ContentEncoderOutput, IndependentPoseEncoder, IndependentPoseEncoderInit,
        PoseSource,
    },
    params,
};
use crate::common::*;

// input type

#[derive(Debug, TensorLike)]
pub struct DrnetModelInput {
    /// Frames providing the content code, `[batch, nc, 64, 64]`.
    pub content_frames: Tensor,
    /// Frames providing the pose codes, `[batch, nc, 64, 64]`.
    pub pose_frames: Tensor,
}

// output type

#[derive(Debug, TensorLike)]
pub struct DrnetModelOutput {
    pub reconstruction: Tensor,
    pub content: ContentEncoderOutput,
    pub poses: Vec<Tensor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrnetModelInit {
    pub image_channels: i64,
    pub content_dim: i64,
    pub pose_dim: i64,
    pub n_pose: i64,
    pub separate_paths: bool,
    pub feature_channels: i64,
    pub pose_feature_channels: i64,
    pub discriminator_channels: i64,
}

impl Default for DrnetModelInit {
    fn default() -> Self {
        Self {
            image_channels: params::IMAGE_CHANNELS,
            content_dim: params::CONTENT_DIM,
            pose_dim: params::POSE_DIM,
            n_pose: params::N_POSE,
            separate_paths: false,
            feature_channels: params::FEATURE_CHANNELS,
            pose_feature_channels: params::FEATURE_CHANNELS,
            discriminator_channels: params::DISCRIMINATOR_CHANNELS,
        }
    }
}

impl DrnetModelInit {
    pub fn build<'p, P>(self, path: P) -> Result<DrnetModel>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            image_channels,
            content_dim,
            pose_dim,
            n_pose,
            separate_paths,
            feature_channels,
            pose_feature_channels,
            discriminator_channels,
        } = self;

        info!(
            "build model: nc={}, content_dim={}, n_pose={}, pose_dim={}, separate_paths={}",
            image_channels, content_dim, n_pose, pose_dim, separate_paths
        );

        let content_encoder = ContentEncoder::new(
            path / "content_encoder",
            content_dim,
            image_channels,
            feature_channels,
        )?;

        let pose_encoder = IndependentPoseEncoderInit {
            n_pose,
            pose_dim,
            separate_paths,
            image_channels,
            feature_channels: pose_feature_channels,
        }
        .build(path / "pose_encoder")?;

        let combined_pose_dim = pose_encoder.combined_pose_dim();

        let decoder = Decoder::new(
            path / "decoder",
            content_dim,
            combined_pose_dim,
            image_channels,
            feature_channels,
        )?;

        let scene_discriminator = SceneDiscriminator::new(
            path / "scene_discriminator",
            combined_pose_dim,
            discriminator_channels,
        )?;

        let independent_discriminator = IndependentDiscriminator::new(
            path / "independent_discriminator",
            combined_pose_dim,
            discriminator_channels,
        )?;

        Ok(DrnetModel {
            content_encoder,
            pose_encoder,
            decoder,
            scene_discriminator,
            independent_discriminator,
        })
    }
}

/// Content encoder, pose encoder, decoder and discriminators sharing one configuration.
#[derive(Debug)]
pub struct DrnetModel {
    content_encoder: ContentEncoder,
    pose_encoder: IndependentPoseEncoder,
    decoder: Decoder,
    scene_discriminator: SceneDiscriminator,
    independent_discriminator: IndependentDiscriminator,
}

impl DrnetModel {
    pub fn content_encoder(&self) -> &ContentEncoder {
        &self.content_encoder
    }

    pub fn pose_encoder(&self) -> &IndependentPoseEncoder {
        &self.pose_encoder
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn scene_discriminator(&self) -> &SceneDiscriminator {
        &self.scene_discriminator
    }

    pub fn independent_discriminator(&self) -> &IndependentDiscriminator {
        &self.independent_discriminator
    }

    /// Decodes the content of `content_frames` under the pose of `pose_frames`.
    pub fn forward_t(&self, input: &DrnetModelInput, train: bool) -> Result<DrnetModelOutput> {
        let DrnetModelInput {
            content_frames,
            pose_frames,
        } = input;

        let content = self.content_encoder.forward_t(content_frames, train)?;
        let poses = self.pose_encoder.forward_t(pose_frames, train)?;
        let reconstruction = self.decoder.forward_t(&content, &poses, train)?;

        Ok(DrnetModelOutput {
            reconstruction,
            content,
            poses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_init() -> DrnetModelInit {
        DrnetModelInit {
            image_channels: 3,
            content_dim: 16,
            pose_dim: 4,
            n_pose: 2,
            feature_channels: 4,
            pose_feature_channels: 4,
            discriminator_channels: 8,
            ..Default::default()
        }
    }

    #[test]
    fn model_reconstructs_frame_shape() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let model = small_init().build(&vs.root())?;

        let input = DrnetModelInput {
            content_frames: Tensor::rand(&[2, 3, 64, 64], (Kind::Float, Device::Cpu)),
            pose_frames: Tensor::rand(&[2, 3, 64, 64], (Kind::Float, Device::Cpu)),
        };
        let output = model.forward_t(&input, false)?;

        assert_eq!(output.reconstruction.size(), vec![2, 3, 64, 64]);
        assert_eq!(output.poses.len(), 2);
        assert_eq!(output.content.content.size(), vec![2, 16, 1, 1]);

        let probability = model.independent_discriminator().forward(&output.poses)?;
        assert_eq!(probability.size(), vec![2, 1]);

        let combined = Tensor::cat(&output.poses, 1);
        let probability = model.scene_discriminator().forward(&combined, &combined)?;
        assert_eq!(probability.size(), vec![2, 1]);
        Ok(())
    }

    #[test]
    fn model_io_moves_between_devices() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let model = small_init().build(&vs.root())?;

        let input = DrnetModelInput {
            content_frames: Tensor::rand(&[2, 3, 64, 64], (Kind::Float, Device::Cpu)),
            pose_frames: Tensor::rand(&[2, 3, 64, 64], (Kind::Float, Device::Cpu)),
        };
        let input = input.to_device(Device::Cpu);
        let output = model.forward_t(&input.shallow_clone(), false)?;

        let moved = output.to_device(Device::Cpu);
        assert!(moved.reconstruction.equal(&output.reconstruction));
        assert_eq!(moved.content.skips.len(), output.content.skips.len());

        let cloned = output.shallow_clone();
        assert_eq!(cloned.poses.len(), output.poses.len());
        assert!(cloned
            .poses
            .iter()
            .zip(output.poses.iter())
            .all(|(lhs, rhs)| lhs.equal(rhs)));
        Ok(())
    }

    #[test]
    fn model_rejects_mismatched_frames() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let model = small_init().build(&vs.root())?;

        let input = DrnetModelInput {
            content_frames: Tensor::rand(&[2, 1, 64, 64], (Kind::Float, Device::Cpu)),
            pose_frames: Tensor::rand(&[2, 3, 64, 64], (Kind::Float, Device::Cpu)),
        };
        assert!(model.forward_t(&input, false).unwrap_err().is_shape_mismatch());
        Ok(())
    }
}
