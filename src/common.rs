pub use crate::error::{Error, Result};
pub use log::{debug, info};
pub use serde::{
    de::Error as DeserializeError, Deserialize, Deserializer, Serialize, Serializer,
};
pub use std::{
    borrow::Borrow,
    fs,
    path::Path,
    str::FromStr,
};
pub use tch::{
    nn::{self, BatchNorm, Conv2D, ConvConfig, ConvTranspose2D, ConvTransposeConfig, Linear},
    Device, Kind, Tensor,
};
pub use tch_tensor_like::TensorLike;
