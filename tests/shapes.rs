use drnet::{
    model::{
        ContentEncoder, Decoder, IndependentDiscriminator, IndependentPoseEncoderInit,
        PoseEncoder, PoseSource, SceneDiscriminator,
    },
    Result,
};
use tch::{nn, Device, Kind, Tensor};

fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

fn frames(batch: i64, channels: i64) -> Tensor {
    Tensor::rand(&[batch, channels, 64, 64], (Kind::Float, Device::Cpu))
}

#[test]
fn reference_configuration_shapes() -> Result<()> {
    init_logger();

    let (nc, nf, content_dim, pose_dim, batch) = (1, 64, 128, 10, 4);
    let vs = nn::VarStore::new(Device::Cpu);
    let root = vs.root();

    let pose_encoder = PoseEncoder::new(&root / "pose_encoder", pose_dim, nc, nf)?;
    let content_encoder = ContentEncoder::new(&root / "content_encoder", content_dim, nc, nf)?;
    let decoder = Decoder::new(&root / "decoder", content_dim, pose_dim, nc, nf)?;

    let input = frames(batch, nc);

    let pose = pose_encoder.forward_t(&input, true)?;
    assert_eq!(pose.size(), vec![4, 10, 1, 1]);
    assert!(pose.min().double_value(&[]) >= -1.0);
    assert!(pose.max().double_value(&[]) <= 1.0);

    let content = content_encoder.forward_t(&input, true)?;
    assert_eq!(content.content.size(), vec![4, 128, 1, 1]);
    let skip_sizes = content
        .skips
        .iter()
        .map(|skip| skip.size())
        .collect::<Vec<_>>();
    assert_eq!(
        skip_sizes,
        vec![
            vec![4, 64, 32, 32],
            vec![4, 128, 16, 16],
            vec![4, 256, 8, 8],
            vec![4, 512, 4, 4],
        ]
    );

    let output = decoder.forward_t(&content, &pose, true)?;
    assert_eq!(output.size(), input.size());
    Ok(())
}

#[test]
fn round_trip_with_multichannel_frames() -> Result<()> {
    init_logger();

    let (nc, nf, content_dim, pose_dim) = (3, 8, 20, 6);
    let vs = nn::VarStore::new(Device::Cpu);
    let root = vs.root();

    let pose_encoder = IndependentPoseEncoderInit {
        separate_paths: true,
        image_channels: nc,
        feature_channels: nf,
        ..IndependentPoseEncoderInit::new(3, pose_dim)
    }
    .build(&root / "pose_encoder")?;
    let content_encoder = ContentEncoder::new(&root / "content_encoder", content_dim, nc, nf)?;
    let decoder = Decoder::new(
        &root / "decoder",
        content_dim,
        pose_encoder.combined_pose_dim(),
        nc,
        nf,
    )?;

    let input = frames(2, nc);
    let content = content_encoder.forward_t(&input, false)?;
    let poses = pose_encoder.forward_t(&input, false)?;
    let output = decoder.forward_t(&content, &poses, false)?;

    assert_eq!(output.size(), vec![2, 3, 64, 64]);
    assert!(output.min().double_value(&[]) >= 0.0);
    assert!(output.max().double_value(&[]) <= 1.0);
    Ok(())
}

#[test]
fn mismatched_feature_channels_are_rejected() -> Result<()> {
    init_logger();

    let vs = nn::VarStore::new(Device::Cpu);
    let root = vs.root();

    let content_encoder = ContentEncoder::new(&root / "content_encoder", 16, 1, 8)?;
    let pose_encoder = PoseEncoder::new(&root / "pose_encoder", 4, 1, 8)?;
    let decoder = Decoder::new(&root / "decoder", 16, 4, 1, 16)?;

    let input = frames(2, 1);
    let content = content_encoder.forward_t(&input, false)?;
    let pose = pose_encoder.forward_t(&input, false)?;

    let err = decoder.forward_t(&content, &pose, false).unwrap_err();
    assert!(err.is_shape_mismatch());
    Ok(())
}

#[test]
fn variants_are_interchangeable() -> Result<()> {
    init_logger();

    let vs = nn::VarStore::new(Device::Cpu);
    let root = vs.root();

    let init = IndependentPoseEncoderInit {
        feature_channels: 4,
        ..IndependentPoseEncoderInit::new(2, 3)
    };
    let shared = init.clone().build(&root / "shared")?;
    let separate = IndependentPoseEncoderInit {
        separate_paths: true,
        ..init
    }
    .build(&root / "separate")?;

    let input = frames(2, 1);
    let shared_sizes = shared
        .forward_t(&input, false)?
        .iter()
        .map(|pose| pose.size())
        .collect::<Vec<_>>();
    let separate_sizes = separate
        .forward_t(&input, false)?
        .iter()
        .map(|pose| pose.size())
        .collect::<Vec<_>>();

    assert_eq!(shared_sizes, separate_sizes);
    assert_eq!(shared.combined_pose_dim(), separate.combined_pose_dim());
    Ok(())
}

#[test]
fn discriminators_stay_in_unit_interval() -> Result<()> {
    init_logger();

    let vs = nn::VarStore::new(Device::Cpu);
    let root = vs.root();

    let scene = SceneDiscriminator::new(&root / "scene", 10, 256)?;
    let independent = IndependentDiscriminator::new(&root / "independent", 10, 256)?;

    for &scale in &[1e-3, 1.0, 1e6] {
        let lhs = Tensor::randn(&[8, 10, 1, 1], (Kind::Float, Device::Cpu)) * scale;
        let rhs = Tensor::randn(&[8, 10, 1, 1], (Kind::Float, Device::Cpu)) * -scale;

        for output in [
            scene.forward(&lhs, &rhs)?,
            independent.forward(&[lhs.narrow(1, 0, 4), lhs.narrow(1, 4, 6)])?,
        ] {
            assert_eq!(output.size(), vec![8, 1]);
            assert!(output.min().double_value(&[]) >= 0.0);
            assert!(output.max().double_value(&[]) <= 1.0);
        }
    }
    Ok(())
}
