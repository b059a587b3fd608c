use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::{
    distribution::Distribution,
    docker::{BuildMode, BuildRequest, ContainerTool},
    image_ref::ImageNaming,
    images::Image,
    Result,
};

/// Dockerfiles per image. A binding image is only built when its Dockerfile is provided.
#[derive(Debug, Default, Clone)]
pub struct Dockerfiles {
    /// Defaults to [`Distribution::default_dockerfile`].
    pub base: Option<PathBuf>,
    pub pyspark: Option<PathBuf>,
    pub sparkr: Option<PathBuf>,
}

#[derive(Debug)]
pub struct BuildOptions<'a> {
    pub naming: &'a ImageNaming,
    pub dockerfiles: &'a Dockerfiles,
    pub no_cache: bool,
    /// Passed verbatim as `--build-arg` values, ahead of the arguments derived from the
    /// distribution.
    pub build_args: &'a [String],
    pub uid: Option<u32>,
    pub mode: BuildMode,
}

/// Builds the base image followed by every binding image that has a Dockerfile configured. The
/// distribution is validated before anything is built and the first failure aborts the sequence.
pub fn build(
    tool: &dyn ContainerTool,
    distribution: &Distribution,
    options: BuildOptions,
) -> Result<()> {
    distribution.validate()?;

    let mut build_args = options.build_args.to_vec();
    if let Some(uid) = options.uid {
        build_args.push(format!("spark_uid={uid}"));
    }
    build_args.extend(distribution.build_args());

    let base_reference = options.naming.reference(Image::Spark.name());
    let base_dockerfile = options
        .dockerfiles
        .base
        .clone()
        .unwrap_or_else(|| distribution.default_dockerfile());
    build_image(
        tool,
        Image::Spark,
        BuildRequest {
            context: distribution.home(),
            dockerfile: &base_dockerfile,
            tag: &base_reference,
            no_cache: options.no_cache,
            build_args: &build_args,
            mode: options.mode,
        },
    )?;

    let mut binding_build_args = build_args;
    binding_build_args.push(format!("base_img={base_reference}"));

    for (image, dockerfile) in [
        (Image::PySpark, options.dockerfiles.pyspark.as_deref()),
        (Image::SparkR, options.dockerfiles.sparkr.as_deref()),
    ] {
        let Some(dockerfile) = dockerfile else {
            debug!("no Dockerfile provided for the {label} image, skipping", label = image.label());
            continue;
        };
        build_binding(
            tool,
            image,
            dockerfile,
            distribution,
            &options,
            &binding_build_args,
        )?;
    }

    Ok(())
}

fn build_binding(
    tool: &dyn ContainerTool,
    image: Image,
    dockerfile: &Path,
    distribution: &Distribution,
    options: &BuildOptions,
    build_args: &[String],
) -> Result<()> {
    let reference = options.naming.reference(image.name());
    build_image(
        tool,
        image,
        BuildRequest {
            context: distribution.home(),
            dockerfile,
            tag: &reference,
            no_cache: options.no_cache,
            build_args,
            mode: options.mode,
        },
    )
}

fn build_image(tool: &dyn ContainerTool, image: Image, request: BuildRequest) -> Result<()> {
    let label = image.label();
    info!("Building {label} image {tag}...", tag = request.tag);
    tool.build(&request).map_err(|error| {
        format!("Failed to build {label} Docker image, please refer to Docker build output for details: {error}")
    })?;
    info!("Built {tag}", tag = request.tag);
    Ok(())
}
