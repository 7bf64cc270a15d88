use super::params;
use crate::common::*;

/// Checks the size of a tensor against a pattern where `None` matches any extent.
pub(crate) fn expect_size(
    context: &'static str,
    tensor: &Tensor,
    pattern: &[Option<i64>],
) -> Result<Vec<i64>> {
    let size = tensor.size();
    let matched = size.len() == pattern.len()
        && size
            .iter()
            .zip(pattern.iter())
            .all(|(&actual, expected)| expected.map_or(true, |expected| actual == expected));

    if !matched {
        let expected = pattern
            .iter()
            .map(|extent| match extent {
                Some(extent) => extent.to_string(),
                None => "_".into(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Error::ShapeMismatch {
            context,
            expected: format!("[{}]", expected),
            found: size,
        });
    }

    Ok(size)
}

pub(crate) fn ensure_positive(name: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(Error::Configuration(format!(
            "{} must be positive, but get {}",
            name, value
        )));
    }
    Ok(())
}

/// Multiplies a channel count, failing instead of overflowing.
pub(crate) fn scale_channels(name: &str, channels: i64, factor: i64) -> Result<i64> {
    channels.checked_mul(factor).ok_or_else(|| {
        Error::Configuration(format!(
            "{} * {} overflows, where {} = {}",
            name, factor, name, channels
        ))
    })
}

pub(crate) fn leaky_relu(xs: &Tensor) -> Tensor {
    xs.relu() - xs.neg().relu() * params::LEAKY_RELU_SLOPE
}

// downsampling block

/// Convolution (kernel 4, stride 2, padding 1), batch norm and leaky ReLU.
/// Halves the spatial size.
#[derive(Debug)]
pub struct StridedConvBlock {
    in_channels: i64,
    out_channels: i64,
    conv: Conv2D,
    norm: BatchNorm,
}

impl StridedConvBlock {
    pub fn new<'p, P>(path: P, in_channels: i64, out_channels: i64) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let conv = nn::conv2d(
            path / "conv",
            in_channels,
            out_channels,
            params::KERNEL_SIZE,
            ConvConfig {
                stride: 2,
                padding: 1,
                ..Default::default()
            },
        );
        let norm = nn::batch_norm2d(path / "norm", out_channels, Default::default());

        Self {
            in_channels,
            out_channels,
            conv,
            norm,
        }
    }

    pub fn out_channels(&self) -> i64 {
        self.out_channels
    }

    pub fn forward_t(&self, input: &Tensor, train: bool) -> Result<Tensor> {
        expect_size(
            "strided conv block",
            input,
            &[None, Some(self.in_channels), None, None],
        )?;

        let xs = input.apply(&self.conv).apply_t(&self.norm, train);
        Ok(leaky_relu(&xs))
    }
}

// upsampling block

/// Transposed convolution, batch norm and leaky ReLU.
///
/// The strided variant (kernel 4, stride 2, padding 1) doubles the spatial size.
/// The expanding variant (kernel 4, stride 1, padding 0) turns a 1x1 code into a 4x4 map.
#[derive(Debug)]
pub struct StridedDeconvBlock {
    in_channels: i64,
    out_channels: i64,
    deconv: ConvTranspose2D,
    norm: BatchNorm,
}

impl StridedDeconvBlock {
    pub fn new<'p, P>(path: P, in_channels: i64, out_channels: i64) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        Self::with_stride(path, in_channels, out_channels, 2, 1)
    }

    pub fn expanding<'p, P>(path: P, in_channels: i64, out_channels: i64) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        Self::with_stride(path, in_channels, out_channels, 1, 0)
    }

    fn with_stride<'p, P>(
        path: P,
        in_channels: i64,
        out_channels: i64,
        stride: i64,
        padding: i64,
    ) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let deconv = nn::conv_transpose2d(
            path / "deconv",
            in_channels,
            out_channels,
            params::KERNEL_SIZE,
            ConvTransposeConfig {
                stride,
                padding,
                ..Default::default()
            },
        );
        let norm = nn::batch_norm2d(path / "norm", out_channels, Default::default());

        Self {
            in_channels,
            out_channels,
            deconv,
            norm,
        }
    }

    pub fn out_channels(&self) -> i64 {
        self.out_channels
    }

    pub fn forward_t(&self, input: &Tensor, train: bool) -> Result<Tensor> {
        expect_size(
            "strided deconv block",
            input,
            &[None, Some(self.in_channels), None, None],
        )?;

        let xs = input.apply(&self.deconv).apply_t(&self.norm, train);
        Ok(leaky_relu(&xs))
    }
}

// projection to a code vector

/// Convolution (kernel 4, stride 1, no padding) followed by batch norm.
/// Maps a 4x4 feature map to a 1x1 code before squashing.
#[derive(Debug)]
pub struct ProjectionHead {
    conv: Conv2D,
    norm: BatchNorm,
}

impl ProjectionHead {
    pub fn new<'p, P>(path: P, in_channels: i64, out_channels: i64) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let conv = nn::conv2d(
            path / "conv",
            in_channels,
            out_channels,
            params::KERNEL_SIZE,
            ConvConfig {
                stride: 1,
                padding: 0,
                ..Default::default()
            },
        );
        let norm = nn::batch_norm2d(path / "norm", out_channels, Default::default());

        Self { conv, norm }
    }

    pub fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        input.apply(&self.conv).apply_t(&self.norm, train)
    }
}
