use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use constcat::concat;
use log::debug;

use crate::{
    build::{self, BuildOptions, Dockerfiles},
    distribution::{self, Distribution},
    docker::{BuildMode, ContainerTool, Docker, CROSS_BUILD_PLATFORMS},
    image_ref::{self, ImageNaming},
    minikube, push, spark_env, Result,
};

const AFTER_HELP: &str = "\
Commands:
  build       Build image. Requires a repository address to be provided if the image will be
              pushed to a different registry.
  push        Push a pre-built image to a registry. Requires a repository address to be provided.

Using minikube when building images will do so directly into minikube's Docker daemon.
There is no need to push the images into minikube in that case, they'll be automatically
available when running applications inside the minikube cluster.

Check the following documentation for more information on using the minikube Docker daemon:

  https://kubernetes.io/docs/getting-started-guides/minikube/#reusing-the-docker-daemon

Examples:
  - Build image in minikube with tag \"testing\"
    docker-image-tool -m -t testing build

  - Build PySpark docker image
    docker-image-tool -r docker.io/myrepo -t v2.3.0 -p kubernetes/dockerfiles/spark/bindings/python/Dockerfile build

  - Build and push image with tag \"v2.3.0\" to docker.io/myrepo
    docker-image-tool -r docker.io/myrepo -t v2.3.0 build
    docker-image-tool -r docker.io/myrepo -t v2.3.0 push

  - Build and push JDK11-based image for multiple archs to docker.io/myrepo
    docker-image-tool -r docker.io/myrepo -t v3.0.0 -X -b java_image_tag=11-jre-slim build";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Build,
    Push,
}

impl Command {
    const fn as_str(&self) -> &'static str {
        match self {
            Command::Build => "build",
            Command::Push => "push",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Builds or pushes the built-in Spark Docker image.",
    after_help = AFTER_HELP
)]
pub struct Cli {
    #[arg(short = 'f', value_name = "file", help = concat!("Dockerfile to build for JVM based Jobs. By default builds the Dockerfile shipped with Spark at \"", distribution::RELEASE_IMAGE_PATH, "/spark/Dockerfile\"."))]
    base_dockerfile: Option<PathBuf>,

    /// (Optional) Dockerfile to build for PySpark Jobs. Builds Python dependencies and ships with
    /// Spark. Skips building PySpark docker image if not specified.
    #[arg(short = 'p', value_name = "file")]
    pyspark_dockerfile: Option<PathBuf>,

    /// (Optional) Dockerfile to build for SparkR Jobs. Builds R dependencies and ships with Spark.
    /// Skips building SparkR docker image if not specified.
    #[arg(short = 'R', value_name = "file")]
    sparkr_dockerfile: Option<PathBuf>,

    /// Repository address.
    #[arg(short = 'r', value_name = "repo", value_parser = image_ref::parse_repository)]
    repository: Option<String>,

    /// Tag to apply to the built image, or to identify the image to be pushed.
    #[arg(short = 't', value_name = "tag", value_parser = image_ref::parse_tag)]
    tag: Option<String>,

    /// Use minikube's Docker daemon.
    #[arg(short = 'm', default_value_t)]
    minikube: bool,

    /// Build docker image with --no-cache.
    #[arg(short = 'n', default_value_t)]
    no_cache: bool,

    /// Build arg to build or push the image. For multiple build args, this option needs to be used
    /// separately for each build arg.
    #[arg(short = 'b', value_name = "arg")]
    build_args: Vec<String>,

    /// UID to use in the USER directive to set the user the main Spark process runs as inside the
    /// resulting container.
    #[arg(short = 'u', value_name = "uid")]
    uid: Option<u32>,

    /// Use docker buildx to cross build for linux/amd64 and linux/arm64. Automatically pushes the
    /// images, so a repository address is required.
    #[arg(short = 'X', default_value_t)]
    cross_build: bool,

    /// Root of the Spark distribution. Defaults to the parent of the directory containing this
    /// executable.
    #[arg(long = "spark-home", env = "SPARK_HOME", value_name = "dir")]
    spark_home: Option<PathBuf>,

    /// build | push
    #[arg(value_name = "command", required = true)]
    command: Option<String>,
}

impl Cli {
    /// Parses the arguments and performs the validation that involves more than a single flag.
    /// Every usage problem is reported as a [`clap::Error`].
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Self::try_parse_from(args)?;
        let command = cli.subcommand()?;

        let has_repository = cli.naming().repository().is_some();
        if command == Command::Push && !has_repository {
            return Err(usage_error(
                ErrorKind::MissingRequiredArgument,
                "the `push` command requires a repository address, provide one with `-r <repo>`",
            ));
        }
        if cli.cross_build && !has_repository {
            return Err(usage_error(
                ErrorKind::MissingRequiredArgument,
                "cross building with `-X` pushes the images and requires a repository address, provide one with `-r <repo>`",
            ));
        }

        Ok(cli)
    }

    fn subcommand(&self) -> Result<Command, clap::Error> {
        match self.command.as_deref() {
            Some("build") => Ok(Command::Build),
            Some("push") => Ok(Command::Push),
            Some(other) => Err(usage_error(
                ErrorKind::InvalidValue,
                format!(
                    "invalid command '{other}', expected '{build}' or '{push}'",
                    build = Command::Build.as_str(),
                    push = Command::Push.as_str(),
                ),
            )),
            None => Err(usage_error(
                ErrorKind::MissingRequiredArgument,
                "no command provided",
            )),
        }
    }

    fn naming(&self) -> ImageNaming {
        ImageNaming::new(self.repository.clone(), self.tag.clone())
    }

    fn dockerfiles(&self) -> Result<Dockerfiles> {
        let cwd = std::env::current_dir()?;
        let resolve = |path: &Option<PathBuf>| path.as_deref().map(|path| cwd.join(path));
        Ok(Dockerfiles {
            base: resolve(&self.base_dockerfile),
            pyspark: resolve(&self.pyspark_dockerfile),
            sparkr: resolve(&self.sparkr_dockerfile),
        })
    }

    pub fn run(self) -> Result<()> {
        let command = self.subcommand()?;
        let spark_home = match self.spark_home.clone() {
            Some(path) => path,
            None => default_spark_home()?,
        };
        debug!("spark home: {spark_home:?}");
        let env = spark_env::load(&spark_home)?;

        let docker = if self.minikube {
            Docker::with_env(minikube::docker_env()?)
        } else {
            Docker::new()
        };
        let tool = &docker as &dyn ContainerTool;

        let naming = self.naming();
        match command {
            Command::Build => {
                let distribution = Distribution::detect(spark_home, &env)?;
                let dockerfiles = self.dockerfiles()?;
                build::build(
                    tool,
                    &distribution,
                    BuildOptions {
                        naming: &naming,
                        dockerfiles: &dockerfiles,
                        no_cache: self.no_cache,
                        build_args: &self.build_args,
                        uid: self.uid,
                        mode: if self.cross_build {
                            BuildMode::CrossPush(CROSS_BUILD_PLATFORMS)
                        } else {
                            BuildMode::Local
                        },
                    },
                )?;
            }
            Command::Push => {
                push::push(tool, &naming)?;
            }
        }

        Ok(())
    }
}

fn usage_error(kind: ErrorKind, message: impl std::fmt::Display) -> clap::Error {
    Cli::command().error(kind, message)
}

/// The distribution root is the parent of the `bin` directory holding the executable.
fn default_spark_home() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| format!("failed to determine the Spark home from {exe:?}, set SPARK_HOME").into())
}

/// Help and version requests succeed, every other usage error exits with 1.
pub fn usage_exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() {
        1
    } else {
        0
    }
}
