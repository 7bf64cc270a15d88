use super::{
    blocks::{ensure_positive, expect_size, scale_channels, ProjectionHead, StridedConvBlock},
    params,
};
use crate::common::*;

fn expect_frames(
    context: &'static str,
    frames: &Tensor,
    image_channels: i64,
    train: bool,
) -> Result<i64> {
    let size = expect_size(
        context,
        frames,
        &[
            None,
            Some(image_channels),
            Some(params::FRAME_SIZE),
            Some(params::FRAME_SIZE),
        ],
    )?;
    let batch_size = size[0];

    // batch norm on the 1x1 projection needs two values per channel to update its stats
    if train && batch_size < 2 {
        return Err(Error::ShapeMismatch {
            context,
            expected: format!(
                "[>=2, {}, {}, {}] in training mode",
                image_channels,
                params::FRAME_SIZE,
                params::FRAME_SIZE
            ),
            found: size,
        });
    }

    Ok(batch_size)
}

// downsampling stack shared by pose and content encoders

#[derive(Debug)]
struct DownsamplingStack {
    blocks: Vec<StridedConvBlock>,
}

impl DownsamplingStack {
    /// Four blocks: nc -> nf -> 2nf -> 4nf -> 8nf, 64x64 -> 4x4.
    fn new<'p, P>(path: P, image_channels: i64, feature_channels: i64) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        // widths are computed up front so that no layer is allocated on overflow
        let widths = (0..params::NUM_SKIPS)
            .map(|index| scale_channels("feature_channels", feature_channels, 1 << index))
            .collect::<Result<Vec<_>>>()?;

        let blocks = widths
            .iter()
            .enumerate()
            .map(|(index, &out_channels)| {
                let in_channels = match index {
                    0 => image_channels,
                    _ => widths[index - 1],
                };
                StridedConvBlock::new(
                    path / format!("c{}", index + 1),
                    in_channels,
                    out_channels,
                )
            })
            .collect::<Vec<_>>();

        Ok(Self { blocks })
    }

    fn out_channels(&self) -> i64 {
        self.blocks
            .last()
            .map(|block| block.out_channels())
            .unwrap_or_default()
    }

    /// Returns every intermediate activation, shallowest first.
    fn forward_t(&self, frames: &Tensor, train: bool) -> Result<Vec<Tensor>> {
        let mut activations: Vec<Tensor> = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.iter() {
            let input = activations.last().unwrap_or(frames);
            let output = block.forward_t(input, train)?;
            activations.push(output);
        }
        Ok(activations)
    }
}

// pose encoder

/// Encodes a 64x64 frame into a pose code of shape `[batch, pose_dim, 1, 1]` in `[-1, 1]`.
#[derive(Debug)]
pub struct PoseEncoder {
    pose_dim: i64,
    image_channels: i64,
    stack: DownsamplingStack,
    projection: ProjectionHead,
}

impl PoseEncoder {
    pub fn new<'p, P>(
        path: P,
        pose_dim: i64,
        image_channels: i64,
        feature_channels: i64,
    ) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        ensure_positive("pose_dim", pose_dim)?;
        ensure_positive("image_channels", image_channels)?;
        ensure_positive("feature_channels", feature_channels)?;

        let stack = DownsamplingStack::new(path, image_channels, feature_channels)?;
        let projection = ProjectionHead::new(path / "c5", stack.out_channels(), pose_dim);

        Ok(Self {
            pose_dim,
            image_channels,
            stack,
            projection,
        })
    }

    pub fn pose_dim(&self) -> i64 {
        self.pose_dim
    }

    pub fn forward_t(&self, frames: &Tensor, train: bool) -> Result<Tensor> {
        expect_frames("pose encoder input", frames, self.image_channels, train)?;

        let activations = self.stack.forward_t(frames, train)?;
        let last = activations
            .last()
            .ok_or_else(|| Error::Configuration("empty downsampling stack".into()))?;
        Ok(self.projection.forward_t(last, train).tanh())
    }
}

// independent pose encoders

/// Anything that turns a frame into an ordered list of pose codes.
pub trait PoseSource {
    fn n_pose(&self) -> i64;

    fn pose_dim(&self) -> i64;

    /// Width of all pose codes concatenated along the channel axis.
    fn combined_pose_dim(&self) -> i64 {
        self.n_pose() * self.pose_dim()
    }

    /// Produces `n_pose` tensors of shape `[batch, pose_dim, 1, 1]`.
    fn forward_t(&self, frames: &Tensor, train: bool) -> Result<Vec<Tensor>>;
}

/// One full pose encoder per pose code, each with its own weights.
#[derive(Debug)]
pub struct SeparatePoseEncoder {
    pose_dim: i64,
    paths: Vec<PoseEncoder>,
}

impl PoseSource for SeparatePoseEncoder {
    fn n_pose(&self) -> i64 {
        self.paths.len() as i64
    }

    fn pose_dim(&self) -> i64 {
        self.pose_dim
    }

    fn forward_t(&self, frames: &Tensor, train: bool) -> Result<Vec<Tensor>> {
        self.paths
            .iter()
            .map(|path| path.forward_t(frames, train))
            .collect()
    }
}

/// A single pose encoder whose `n_pose * pose_dim` output channels are split into chunks.
#[derive(Debug)]
pub struct SharedPoseEncoder {
    n_pose: i64,
    pose_dim: i64,
    net: PoseEncoder,
}

impl SharedPoseEncoder {
    /// Runs the shared network and returns its unsplit output.
    pub fn forward_combined(&self, frames: &Tensor, train: bool) -> Result<Tensor> {
        let combined = self.net.forward_t(frames, train)?;
        let channels = combined.size().get(1).copied().unwrap_or_default();
        if channels != self.n_pose * self.pose_dim {
            return Err(Error::Configuration(format!(
                "shared pose network produces {} channels, but n_pose * pose_dim = {} * {}",
                channels, self.n_pose, self.pose_dim
            )));
        }
        Ok(combined)
    }
}

impl PoseSource for SharedPoseEncoder {
    fn n_pose(&self) -> i64 {
        self.n_pose
    }

    fn pose_dim(&self) -> i64 {
        self.pose_dim
    }

    fn forward_t(&self, frames: &Tensor, train: bool) -> Result<Vec<Tensor>> {
        let combined = self.forward_combined(frames, train)?;
        let poses = (0..self.n_pose)
            .map(|index| combined.narrow(1, index * self.pose_dim, self.pose_dim))
            .collect();
        Ok(poses)
    }
}

#[derive(Debug)]
pub enum IndependentPoseEncoder {
    Separate(SeparatePoseEncoder),
    Shared(SharedPoseEncoder),
}

impl PoseSource for IndependentPoseEncoder {
    fn n_pose(&self) -> i64 {
        match self {
            Self::Separate(encoder) => encoder.n_pose(),
            Self::Shared(encoder) => encoder.n_pose(),
        }
    }

    fn pose_dim(&self) -> i64 {
        match self {
            Self::Separate(encoder) => encoder.pose_dim(),
            Self::Shared(encoder) => encoder.pose_dim(),
        }
    }

    fn forward_t(&self, frames: &Tensor, train: bool) -> Result<Vec<Tensor>> {
        match self {
            Self::Separate(encoder) => encoder.forward_t(frames, train),
            Self::Shared(encoder) => encoder.forward_t(frames, train),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndependentPoseEncoderInit {
    pub n_pose: i64,
    pub pose_dim: i64,
    pub separate_paths: bool,
    pub image_channels: i64,
    pub feature_channels: i64,
}

impl IndependentPoseEncoderInit {
    pub fn new(n_pose: i64, pose_dim: i64) -> Self {
        Self {
            n_pose,
            pose_dim,
            separate_paths: false,
            image_channels: params::IMAGE_CHANNELS,
            feature_channels: params::POSE_PATH_CHANNELS,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<IndependentPoseEncoder>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            n_pose,
            pose_dim,
            separate_paths,
            image_channels,
            feature_channels,
        } = self;

        ensure_positive("n_pose", n_pose)?;
        ensure_positive("pose_dim", pose_dim)?;

        debug!(
            "build independent pose encoder: n_pose={}, pose_dim={}, separate_paths={}",
            n_pose, pose_dim, separate_paths
        );

        let encoder = if separate_paths {
            let paths = (0..n_pose)
                .map(|index| {
                    PoseEncoder::new(
                        path / format!("path_{}", index),
                        pose_dim,
                        image_channels,
                        feature_channels,
                    )
                })
                .collect::<Result<Vec<_>>>()?;
            IndependentPoseEncoder::Separate(SeparatePoseEncoder { pose_dim, paths })
        } else {
            let combined_dim = n_pose.checked_mul(pose_dim).ok_or_else(|| {
                Error::Configuration(format!(
                    "n_pose * pose_dim overflows: {} * {}",
                    n_pose, pose_dim
                ))
            })?;
            let net = PoseEncoder::new(
                path / "shared",
                combined_dim,
                image_channels,
                feature_channels,
            )?;
            IndependentPoseEncoder::Shared(SharedPoseEncoder {
                n_pose,
                pose_dim,
                net,
            })
        };

        Ok(encoder)
    }
}

// content encoder

/// The content code with the skip maps of the downsampling stack.
#[derive(Debug, TensorLike)]
pub struct ContentEncoderOutput {
    /// `[batch, content_dim, 1, 1]` in `[-1, 1]`.
    pub content: Tensor,
    /// Pre-projection activations at 32x32, 16x16, 8x8 and 4x4, shallowest first.
    pub skips: Vec<Tensor>,
}

#[derive(Debug)]
pub struct ContentEncoder {
    content_dim: i64,
    image_channels: i64,
    stack: DownsamplingStack,
    projection: ProjectionHead,
}

impl ContentEncoder {
    pub fn new<'p, P>(
        path: P,
        content_dim: i64,
        image_channels: i64,
        feature_channels: i64,
    ) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        ensure_positive("content_dim", content_dim)?;
        ensure_positive("image_channels", image_channels)?;
        ensure_positive("feature_channels", feature_channels)?;

        debug!(
            "build content encoder: content_dim={}, nc={}, nf={}",
            content_dim, image_channels, feature_channels
        );

        let stack = DownsamplingStack::new(path, image_channels, feature_channels)?;
        let projection = ProjectionHead::new(path / "c5", stack.out_channels(), content_dim);

        Ok(Self {
            content_dim,
            image_channels,
            stack,
            projection,
        })
    }

    pub fn content_dim(&self) -> i64 {
        self.content_dim
    }

    pub fn forward_t(&self, frames: &Tensor, train: bool) -> Result<ContentEncoderOutput> {
        expect_frames("content encoder input", frames, self.image_channels, train)?;

        let skips = self.stack.forward_t(frames, train)?;
        let last = skips
            .last()
            .ok_or_else(|| Error::Configuration("empty downsampling stack".into()))?;
        let content = self.projection.forward_t(last, train).tanh();

        Ok(ContentEncoderOutput { content, skips })
    }
}
