// input frames
pub const FRAME_SIZE: i64 = 64;
pub const IMAGE_CHANNELS: i64 = 1;

// architecture
pub const NUM_SKIPS: usize = 4; // skip maps at 32x32, 16x16, 8x8, 4x4
pub const KERNEL_SIZE: i64 = 4;
pub const LEAKY_RELU_SLOPE: f64 = 0.2;

// hyper-parameters: codes
pub const CONTENT_DIM: i64 = 128;
pub const POSE_DIM: i64 = 10;
pub const N_POSE: i64 = 1;

// hyper-parameters: feature widths
pub const FEATURE_CHANNELS: i64 = 64; // content encoder, decoder, pose encoder
pub const POSE_PATH_CHANNELS: i64 = 32; // independent pose encoder
pub const DISCRIMINATOR_CHANNELS: i64 = 256;
