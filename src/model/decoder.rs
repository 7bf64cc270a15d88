use super::{
    blocks::{ensure_positive, expect_size, scale_channels, StridedDeconvBlock},
    encoder::ContentEncoderOutput,
    params,
};
use crate::common::*;

/// Pose codes handed to the decoder.
///
/// A sequence is concatenated along the channel axis in the given order, which must
/// match the order the pose encoder produced.
#[derive(Debug, Clone, Copy)]
pub enum PoseInput<'a> {
    Single(&'a Tensor),
    Sequence(&'a [Tensor]),
}

impl<'a> PoseInput<'a> {
    pub fn combine(&self) -> Result<Tensor> {
        match *self {
            Self::Single(pose) => Ok(pose.shallow_clone()),
            Self::Sequence(poses) => {
                let first = poses.first().ok_or_else(|| Error::ShapeMismatch {
                    context: "decoder pose sequence",
                    expected: "at least one pose code".into(),
                    found: vec![],
                })?;
                let batch_size = first.size().first().copied();
                for pose in poses {
                    expect_size(
                        "decoder pose sequence",
                        pose,
                        &[batch_size, None, Some(1), Some(1)],
                    )?;
                }
                Ok(Tensor::cat(poses, 1))
            }
        }
    }
}

impl<'a> From<&'a Tensor> for PoseInput<'a> {
    fn from(from: &'a Tensor) -> Self {
        Self::Single(from)
    }
}

impl<'a> From<&'a [Tensor]> for PoseInput<'a> {
    fn from(from: &'a [Tensor]) -> Self {
        Self::Sequence(from)
    }
}

impl<'a> From<&'a Vec<Tensor>> for PoseInput<'a> {
    fn from(from: &'a Vec<Tensor>) -> Self {
        Self::Sequence(from.as_slice())
    }
}

/// Reconstructs a 64x64 frame from a content code, its skip maps and a pose code.
#[derive(Debug)]
pub struct Decoder {
    // model params
    content_dim: i64,
    pose_dim: i64,
    feature_channels: i64,
    // modules & weights
    expand: StridedDeconvBlock,
    stages: Vec<StridedDeconvBlock>,
    output_deconv: ConvTranspose2D,
}

impl Decoder {
    pub fn new<'p, P>(
        path: P,
        content_dim: i64,
        pose_dim: i64,
        image_channels: i64,
        feature_channels: i64,
    ) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        ensure_positive("content_dim", content_dim)?;
        ensure_positive("pose_dim", pose_dim)?;
        ensure_positive("image_channels", image_channels)?;
        ensure_positive("feature_channels", feature_channels)?;

        debug!(
            "build decoder: content_dim={}, pose_dim={}, nc={}, nf={}",
            content_dim, pose_dim, image_channels, feature_channels
        );

        let nf = feature_channels;
        let code_channels = content_dim.checked_add(pose_dim).ok_or_else(|| {
            Error::Configuration(format!(
                "content_dim + pose_dim overflows: {} + {}",
                content_dim, pose_dim
            ))
        })?;
        // widest layer is the first concatenated stage with 16nf inputs
        scale_channels("feature_channels", nf, 16)?;

        // [content, pose] 1x1 -> 8nf x 4x4
        let expand = StridedDeconvBlock::expanding(path / "upc1", code_channels, nf * 8);

        // [8nf, skip 8nf] 4x4 -> 4nf x 8x8 -> 2nf x 16x16 -> nf x 32x32
        let stages = (1..params::NUM_SKIPS)
            .map(|stage| {
                let in_channels = (nf << (params::NUM_SKIPS - stage)) * 2;
                let out_channels = nf << (params::NUM_SKIPS - stage - 1);
                StridedDeconvBlock::new(
                    path / format!("upc{}", stage + 1),
                    in_channels,
                    out_channels,
                )
            })
            .collect::<Vec<_>>();

        // [nf, skip nf] 32x32 -> nc x 64x64
        let output_deconv = nn::conv_transpose2d(
            path / format!("upc{}", params::NUM_SKIPS + 1),
            nf * 2,
            image_channels,
            params::KERNEL_SIZE,
            ConvTransposeConfig {
                stride: 2,
                padding: 1,
                ..Default::default()
            },
        );

        Ok(Self {
            content_dim,
            pose_dim,
            feature_channels,
            expand,
            stages,
            output_deconv,
        })
    }

    pub fn pose_dim(&self) -> i64 {
        self.pose_dim
    }

    pub fn forward_t<'a, I>(
        &self,
        content: &ContentEncoderOutput,
        pose: I,
        train: bool,
    ) -> Result<Tensor>
    where
        I: Into<PoseInput<'a>>,
    {
        let ContentEncoderOutput {
            content: content_code,
            skips,
        } = content;

        // sanity check
        let batch_size = expect_size(
            "decoder content code",
            content_code,
            &[None, Some(self.content_dim), Some(1), Some(1)],
        )?[0];

        let pose = pose.into().combine()?;
        expect_size(
            "decoder pose code",
            &pose,
            &[Some(batch_size), Some(self.pose_dim), Some(1), Some(1)],
        )?;

        if skips.len() != params::NUM_SKIPS {
            return Err(Error::ShapeMismatch {
                context: "decoder skip maps",
                expected: format!("{} skip maps", params::NUM_SKIPS),
                found: vec![skips.len() as i64],
            });
        }
        for (index, skip) in skips.iter().enumerate() {
            let extent = (params::FRAME_SIZE / 2) >> index;
            expect_size(
                "decoder skip map",
                skip,
                &[
                    Some(batch_size),
                    Some(self.feature_channels << index),
                    Some(extent),
                    Some(extent),
                ],
            )?;
        }

        // upsample, deepest skip first
        let mut net = self
            .expand
            .forward_t(&Tensor::cat(&[content_code, &pose], 1), train)?;
        for (stage, skip) in self.stages.iter().zip(skips.iter().rev()) {
            net = stage.forward_t(&Tensor::cat(&[&net, skip], 1), train)?;
        }

        let output = Tensor::cat(&[&net, &skips[0]], 1)
            .apply(&self.output_deconv)
            .sigmoid();
        Ok(output)
    }
}
