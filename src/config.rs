use crate::{common::*, model::DrnetModelInit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(
        serialize_with = "serialize_device",
        deserialize_with = "deserialize_device",
        default = "default_device"
    )]
    pub device: Device,
    #[serde(default)]
    pub model: DrnetModelInit,
}

impl Config {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = text.parse()?;
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let config = json5::from_str(text)?;
        Ok(config)
    }
}

fn default_device() -> Device {
    Device::cuda_if_available()
}

fn serialize_device<S>(device: &Device, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = match device {
        Device::Cpu => "cpu".into(),
        Device::Cuda(n) => format!("cuda({})", n),
    };
    text.serialize(serializer)
}

fn deserialize_device<'de, D>(deserializer: D) -> Result<Device, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    if name == "cpu" {
        return Ok(Device::Cpu);
    }

    let index = name
        .strip_prefix("cuda(")
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|index| index.parse::<usize>().ok())
        .ok_or_else(|| {
            D::Error::custom(format!(
                r#"unknown device "{}", expect "cpu" or "cuda(N)""#,
                name
            ))
        })?;
    Ok(Device::Cuda(index))
}
