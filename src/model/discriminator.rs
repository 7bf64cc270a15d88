use super::blocks::{ensure_positive, scale_channels};
use crate::common::*;

/// Three linear layers with ReLU in between and a sigmoid on the scalar output.
#[derive(Debug)]
struct ClassifierHead {
    in_features: i64,
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
}

impl ClassifierHead {
    fn new<'p, P>(path: P, in_features: i64, hidden_features: i64) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let fc1 = nn::linear(path / "fc1", in_features, hidden_features, Default::default());
        let fc2 = nn::linear(path / "fc2", hidden_features, hidden_features, Default::default());
        let fc3 = nn::linear(path / "fc3", hidden_features, 1, Default::default());

        Self {
            in_features,
            fc1,
            fc2,
            fc3,
        }
    }

    /// Expects `[batch, in_features]` features.
    fn forward(&self, features: &Tensor) -> Tensor {
        features
            .apply(&self.fc1)
            .relu()
            .apply(&self.fc2)
            .relu()
            .apply(&self.fc3)
            .sigmoid()
    }
}

/// Flattens a pose code to `[batch, width]` and returns it with its width.
fn flatten_pose(
    context: &'static str,
    pose: &Tensor,
    batch_size: Option<i64>,
) -> Result<(Tensor, i64)> {
    let size = pose.size();
    if size.len() < 2 || size.first().copied() != batch_size {
        let expected = match batch_size {
            Some(batch_size) => format!("[{}, ...]", batch_size),
            None => "[_, ...]".into(),
        };
        return Err(Error::ShapeMismatch {
            context,
            expected,
            found: size,
        });
    }
    let width: i64 = size.iter().skip(1).product();
    Ok((pose.reshape(&[size[0], width]), width))
}

/// Predicts whether two pose codes come from the same scene.
#[derive(Debug)]
pub struct SceneDiscriminator {
    pose_dim: i64,
    head: ClassifierHead,
}

impl SceneDiscriminator {
    pub fn new<'p, P>(path: P, pose_dim: i64, hidden_features: i64) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        ensure_positive("pose_dim", pose_dim)?;
        ensure_positive("hidden_features", hidden_features)?;

        let in_features = scale_channels("pose_dim", pose_dim, 2)?;
        let head = ClassifierHead::new(path, in_features, hidden_features);
        Ok(Self { pose_dim, head })
    }

    /// Returns `[batch, 1]` probabilities in `[0, 1]`.
    pub fn forward(&self, lhs: &Tensor, rhs: &Tensor) -> Result<Tensor> {
        let context = "scene discriminator input";
        let batch_size = lhs.size().first().copied();

        let mut flattened = Vec::with_capacity(2);
        for pose in [lhs, rhs] {
            let (flat, width) = flatten_pose(context, pose, batch_size)?;
            if width != self.pose_dim {
                return Err(Error::ShapeMismatch {
                    context,
                    expected: format!("{} features per pose code", self.pose_dim),
                    found: pose.size(),
                });
            }
            flattened.push(flat);
        }

        Ok(self.head.forward(&Tensor::cat(&flattened, 1)))
    }
}

/// Classifies a set of pose codes concatenated along the channel axis.
///
/// The first layer is sized to `pose_dim`, so the widths of the supplied codes must sum
/// to exactly `pose_dim`.
#[derive(Debug)]
pub struct IndependentDiscriminator {
    pose_dim: i64,
    head: ClassifierHead,
}

impl IndependentDiscriminator {
    pub fn new<'p, P>(path: P, pose_dim: i64, hidden_features: i64) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        ensure_positive("pose_dim", pose_dim)?;
        ensure_positive("hidden_features", hidden_features)?;

        let head = ClassifierHead::new(path, pose_dim, hidden_features);
        Ok(Self { pose_dim, head })
    }

    /// Returns `[batch, 1]` probabilities in `[0, 1]`.
    pub fn forward(&self, poses: &[Tensor]) -> Result<Tensor> {
        let first = poses.first().ok_or_else(|| Error::ShapeMismatch {
            context: "independent discriminator input",
            expected: "at least one pose code".into(),
            found: vec![],
        })?;
        let batch_size = first.size().first().copied();

        let mut total_width = 0;
        let mut flattened = Vec::with_capacity(poses.len());
        for pose in poses {
            let (flat, width) = flatten_pose("independent discriminator input", pose, batch_size)?;
            total_width += width;
            flattened.push(flat);
        }

        if total_width != self.pose_dim {
            return Err(Error::ShapeMismatch {
                context: "independent discriminator input",
                expected: format!("pose codes summing to {} features", self.pose_dim),
                found: vec![total_width],
            });
        }

        Ok(self.head.forward(&Tensor::cat(&flattened, 1)))
    }
}
