use std::{ffi::OsString, path::Path};

use log::debug;

use crate::{process, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    LinuxAmd64,
    LinuxArm64,
}

impl Platform {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "linux/amd64",
            Platform::LinuxArm64 => "linux/arm64",
        }
    }
}

/// Platforms targeted by `docker buildx` when cross-building.
pub const CROSS_BUILD_PLATFORMS: &[Platform] = &[Platform::LinuxAmd64, Platform::LinuxArm64];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Builds into the local image store with `docker build`.
    Local,
    /// Builds for several platforms with `docker buildx build` and pushes the result. Nothing is
    /// loaded into the local image store.
    CrossPush(&'static [Platform]),
}

#[derive(Debug)]
pub struct BuildRequest<'a> {
    pub context: &'a Path,
    pub dockerfile: &'a Path,
    pub tag: &'a str,
    pub no_cache: bool,
    /// Each entry is passed verbatim as `--build-arg <entry>`.
    pub build_args: &'a [String],
    pub mode: BuildMode,
}

impl BuildRequest<'_> {
    /// The arguments following the `docker` program name.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match self.mode {
            BuildMode::Local => args.push("build".into()),
            BuildMode::CrossPush(platforms) => {
                let platforms = platforms
                    .iter()
                    .map(Platform::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                for arg in [
                    "buildx",
                    "build",
                    "--platform",
                    platforms.as_str(),
                    "--push",
                    "--progress",
                    "plain",
                ] {
                    args.push(arg.into());
                }
            }
        }
        if self.no_cache {
            args.push("--no-cache".into());
        }
        for build_arg in self.build_args {
            args.push("--build-arg".into());
            args.push(build_arg.into());
        }
        for arg in ["-t", self.tag] {
            args.push(arg.into());
        }
        args.push("-f".into());
        args.push(self.dockerfile.into());
        args.push(self.context.into());
        args
    }
}

/// The operations the build and push orchestration needs from a container engine.
pub trait ContainerTool {
    fn build(&self, request: &BuildRequest) -> Result<()>;

    /// Returns whether an image with the given reference exists in the local image store.
    fn image_exists(&self, reference: &str) -> Result<bool>;

    fn push(&self, reference: &str) -> Result<()>;
}

/// Drives the `docker` command line.
#[derive(Debug, Default)]
pub struct Docker {
    /// Variables such as `DOCKER_HOST` that select the daemon to talk to.
    env: Vec<(String, String)>,
}

impl Docker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(env: Vec<(String, String)>) -> Self {
        Self { env }
    }

    fn docker(&self) -> process::Command {
        process::command!("docker").envs(self.env.iter().map(|(k, v)| (k, v)))
    }
}

impl ContainerTool for Docker {
    fn build(&self, request: &BuildRequest) -> Result<()> {
        self.docker()
            .args(request.to_args().iter().map(OsString::as_os_str))
            .status()?;
        Ok(())
    }

    fn image_exists(&self, reference: &str) -> Result<bool> {
        let output = process::args!(self.docker(), "images", "-q", reference).output()?;
        let ids = std::str::from_utf8(&output.stdout)?.trim();
        debug!("local image ids for {reference:?}: {ids:?}");
        Ok(!ids.is_empty())
    }

    fn push(&self, reference: &str) -> Result<()> {
        process::args!(self.docker(), "push", reference).status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args_to_strings(request: &BuildRequest) -> Vec<String> {
        request
            .to_args()
            .into_iter()
            .map(|arg| arg.into_string().unwrap())
            .collect()
    }

    #[test]
    fn local_build_args() {
        let context = PathBuf::from("/opt/spark");
        let dockerfile = PathBuf::from("/opt/spark/kubernetes/dockerfiles/spark/Dockerfile");
        let build_args = ["spark_uid=185".to_string(), "base_img=spark:v1".to_string()];
        let request = BuildRequest {
            context: &context,
            dockerfile: &dockerfile,
            tag: "spark-py:v1",
            no_cache: true,
            build_args: &build_args,
            mode: BuildMode::Local,
        };
        assert_eq!(
            args_to_strings(&request),
            [
                "build",
                "--no-cache",
                "--build-arg",
                "spark_uid=185",
                "--build-arg",
                "base_img=spark:v1",
                "-t",
                "spark-py:v1",
                "-f",
                "/opt/spark/kubernetes/dockerfiles/spark/Dockerfile",
                "/opt/spark",
            ]
        );
    }

    #[test]
    fn cross_build_args() {
        let context = PathBuf::from(".");
        let dockerfile = PathBuf::from("Dockerfile");
        let request = BuildRequest {
            context: &context,
            dockerfile: &dockerfile,
            tag: "docker.io/myrepo/spark:v2.3.0",
            no_cache: false,
            build_args: &[],
            mode: BuildMode::CrossPush(CROSS_BUILD_PLATFORMS),
        };
        assert_eq!(
            args_to_strings(&request),
            [
                "buildx",
                "build",
                "--platform",
                "linux/amd64,linux/arm64",
                "--push",
                "--progress",
                "plain",
                "-t",
                "docker.io/myrepo/spark:v2.3.0",
                "-f",
                "Dockerfile",
                ".",
            ]
        );
    }
}
