use std::path::{Path, PathBuf};

use log::debug;

use crate::{spark_env::SparkEnv, Result};

/// Present in the root of packaged distributions and absent from source checkouts.
pub const RELEASE_MARKER: &str = "RELEASE";

pub const RELEASE_IMAGE_PATH: &str = "kubernetes/dockerfiles";
pub const RELEASE_JARS_PATH: &str = "jars";

pub const SOURCE_IMAGE_PATH: &str = "resource-managers/kubernetes/docker/src/main/dockerfiles";
pub const SOURCE_K8S_TESTS_PATH: &str = "resource-managers/kubernetes/integration-tests/tests";
const SOURCE_ASSEMBLY_TARGET: &str = "assembly/target";
const SCALA_DIR_PREFIX: &str = "scala-";
/// Assumed when no assembly has been built yet, so that validation reports what is missing.
const DEFAULT_SCALA_VERSION: &str = "2.12";

/// Artifacts that must be present in the jars directory for a distribution to be usable.
const JAR_PREFIX: &str = "spark-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// A runnable distribution, as produced by `dev/make-distribution.sh`.
    Release,
    /// A source checkout that has been built locally.
    SourceTree { scala_version: String },
}

#[derive(Debug, Clone)]
pub struct Distribution {
    home: PathBuf,
    layout: Layout,
}

impl Distribution {
    pub fn new(home: PathBuf, layout: Layout) -> Self {
        Self { home, layout }
    }

    /// Determines the layout of the distribution rooted at `home`.
    pub fn detect(home: PathBuf, env: &SparkEnv) -> Result<Self> {
        let layout = if home.join(RELEASE_MARKER).is_file() {
            Layout::Release
        } else {
            let scala_version = match env.var("SPARK_SCALA_VERSION") {
                Some(version) => version,
                None => detect_scala_version(&home)?,
            };
            Layout::SourceTree { scala_version }
        };
        debug!("distribution at {home:?} has layout {layout:?}");
        Ok(Self::new(home, layout))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The directory holding the Dockerfiles and the files they copy, relative to [`Self::home`].
    pub fn image_path(&self) -> &'static str {
        match self.layout {
            Layout::Release => RELEASE_IMAGE_PATH,
            Layout::SourceTree { .. } => SOURCE_IMAGE_PATH,
        }
    }

    /// The directory holding the Spark jars, relative to [`Self::home`].
    pub fn jars_path(&self) -> String {
        match &self.layout {
            Layout::Release => RELEASE_JARS_PATH.to_string(),
            Layout::SourceTree { scala_version } => {
                format!("{SOURCE_ASSEMBLY_TARGET}/{SCALA_DIR_PREFIX}{scala_version}/jars")
            }
        }
    }

    pub fn default_dockerfile(&self) -> PathBuf {
        self.home.join(self.image_path()).join("spark/Dockerfile")
    }

    /// Build arguments pointing the Dockerfiles at the source tree locations of their inputs.
    /// Packaged distributions already match the defaults declared in the Dockerfiles.
    pub fn build_args(&self) -> Vec<String> {
        match self.layout {
            Layout::Release => Vec::new(),
            Layout::SourceTree { .. } => vec![
                format!("img_path={}", self.image_path()),
                format!("spark_jars={}", self.jars_path()),
                format!("k8s_tests={SOURCE_K8S_TESTS_PATH}"),
            ],
        }
    }

    /// Verifies that the image content directory exists and that Spark has actually been built.
    pub fn validate(&self) -> Result<()> {
        let image_dir = self.home.join(self.image_path());
        if !image_dir.is_dir() {
            debug!("{image_dir:?} is not a directory");
            return Err("Cannot find docker image. This script must be run from a runnable distribution of Apache Spark.".into());
        }

        let jars_dir = self.home.join(self.jars_path());
        let has_jars = match std::fs::read_dir(&jars_dir) {
            Ok(entries) => entries.filter_map(|entry| entry.ok()).any(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(JAR_PREFIX))
            }),
            Err(error) => {
                debug!("unable to list {jars_dir:?}: {error}");
                false
            }
        };
        if !has_jars {
            return Err("Cannot find Spark JARs. This script assumes that Apache Spark has first been built locally or this is a runnable distribution.".into());
        }

        Ok(())
    }
}

fn detect_scala_version(home: &Path) -> Result<String> {
    let target = home.join(SOURCE_ASSEMBLY_TARGET);
    let mut versions = match std::fs::read_dir(&target) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix(SCALA_DIR_PREFIX))
                    .map(str::to_owned)
            })
            .collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };
    versions.sort();

    match versions.as_slice() {
        [version] => Ok(version.clone()),
        [] => {
            debug!("no Scala build found in {target:?}, assuming Scala {DEFAULT_SCALA_VERSION}");
            Ok(DEFAULT_SCALA_VERSION.to_string())
        }
        _ => Err(format!(
            "Presence of build for multiple Scala versions detected ({versions}) in {target:?}. Either clean one of them or set SPARK_SCALA_VERSION.",
            versions = versions.join(", ")
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    /// Shadows any `SPARK_SCALA_VERSION` set in the environment running the tests.
    fn unset_scala_env() -> SparkEnv {
        [("SPARK_SCALA_VERSION".to_owned(), String::new())]
            .into_iter()
            .collect()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn release_layout() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join(RELEASE_MARKER));

        let distribution =
            Distribution::detect(dir.path().to_owned(), &SparkEnv::default()).unwrap();
        assert_eq!(&distribution.layout, &Layout::Release);
        assert_eq!(distribution.image_path(), "kubernetes/dockerfiles");
        assert_eq!(distribution.jars_path(), "jars");
        assert_eq!(
            distribution.default_dockerfile(),
            dir.path().join("kubernetes/dockerfiles/spark/Dockerfile")
        );
        assert!(distribution.build_args().is_empty());
    }

    #[test]
    fn source_tree_layout() {
        let distribution = Distribution::new(
            PathBuf::from("/src/spark"),
            Layout::SourceTree {
                scala_version: "2.12".to_string(),
            },
        );
        assert_eq!(distribution.jars_path(), "assembly/target/scala-2.12/jars");
        assert_eq!(
            distribution.build_args(),
            [
                "img_path=resource-managers/kubernetes/docker/src/main/dockerfiles",
                "spark_jars=assembly/target/scala-2.12/jars",
                "k8s_tests=resource-managers/kubernetes/integration-tests/tests",
            ]
        );
    }

    #[test]
    fn scala_version_is_detected_from_assembly() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assembly/target/scala-2.13/jars")).unwrap();

        let distribution =
            Distribution::detect(dir.path().to_owned(), &unset_scala_env()).unwrap();
        assert_eq!(
            &distribution.layout,
            &Layout::SourceTree {
                scala_version: "2.13".to_string()
            }
        );
    }

    #[test]
    fn scala_version_defaults_without_assembly() {
        let dir = tempfile::tempdir().unwrap();

        let distribution =
            Distribution::detect(dir.path().to_owned(), &unset_scala_env()).unwrap();
        assert_eq!(distribution.jars_path(), "assembly/target/scala-2.12/jars");

        let error = distribution.validate().unwrap_err().to_string();
        assert!(error.starts_with("Cannot find docker image."), "{error}");
    }

    #[test]
    fn scala_version_from_environment_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assembly/target/scala-2.12")).unwrap();
        fs::create_dir_all(dir.path().join("assembly/target/scala-2.13")).unwrap();
        let env: SparkEnv = [("SPARK_SCALA_VERSION".to_owned(), "2.13".to_owned())]
            .into_iter()
            .collect();

        let distribution = Distribution::detect(dir.path().to_owned(), &env).unwrap();
        assert_eq!(distribution.jars_path(), "assembly/target/scala-2.13/jars");
    }

    #[test]
    fn ambiguous_scala_version_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assembly/target/scala-2.12")).unwrap();
        fs::create_dir_all(dir.path().join("assembly/target/scala-2.13")).unwrap();
        let error = Distribution::detect(dir.path().to_owned(), &unset_scala_env())
            .unwrap_err()
            .to_string();
        assert!(error.contains("multiple Scala versions"), "{error}");
        assert!(error.contains("2.12, 2.13"), "{error}");
    }

    #[test]
    fn validate_requires_image_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("jars/spark-core_2.12-3.5.1.jar"));

        let error = Distribution::new(dir.path().to_owned(), Layout::Release)
            .validate()
            .unwrap_err()
            .to_string();
        assert!(error.starts_with("Cannot find docker image."), "{error}");
    }

    #[test]
    fn validate_requires_spark_jars() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("kubernetes/dockerfiles/spark")).unwrap();
        let distribution = Distribution::new(dir.path().to_owned(), Layout::Release);

        // Missing jars directory.
        let error = distribution.validate().unwrap_err().to_string();
        assert!(error.starts_with("Cannot find Spark JARs."), "{error}");

        // Jars directory without Spark jars.
        touch(&dir.path().join("jars/guava-14.0.1.jar"));
        let error = distribution.validate().unwrap_err().to_string();
        assert!(error.starts_with("Cannot find Spark JARs."), "{error}");

        touch(&dir.path().join("jars/spark-core_2.12-3.5.1.jar"));
        distribution.validate().unwrap();
    }
}
