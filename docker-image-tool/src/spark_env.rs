use std::{collections::BTreeMap, path::Path};

use log::debug;

use crate::{process, Result};

pub const LOAD_SPARK_ENV_SCRIPT: &str = "bin/load-spark-env.sh";

/// Sources the script passed as `$0` with its output sent to stderr, then dumps the resulting
/// environment as NUL separated `KEY=VALUE` entries.
const SOURCE_AND_DUMP: &str = r#". "$0" >&2 && env -0"#;

/// The environment exported by the distribution's `bin/load-spark-env.sh`.
#[derive(Debug, Default, Clone)]
pub struct SparkEnv {
    vars: BTreeMap<String, String>,
}

impl SparkEnv {
    /// Returns the variable as exported by the script, falling back to the environment of this
    /// process.
    pub fn var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|value| !value.is_empty())
    }
}

impl FromIterator<(String, String)> for SparkEnv {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

pub fn load(spark_home: &Path) -> Result<SparkEnv> {
    let script = spark_home.join(LOAD_SPARK_ENV_SCRIPT);
    if !script.is_file() {
        debug!("{script:?} does not exist, not loading the distribution environment");
        return Ok(SparkEnv::default());
    }

    let output = process::command!("bash", "-c", SOURCE_AND_DUMP, &script)
        .envs([("SPARK_HOME", spark_home)])
        .output()
        .map_err(|error| format!("Failed to load the environment from {script:?}: {error}"))?;

    let env = parse_env_dump(&output.stdout)?;
    debug!("loaded {count} variables from {script:?}", count = env.vars.len());
    Ok(env)
}

fn parse_env_dump(dump: &[u8]) -> Result<SparkEnv> {
    let mut vars = BTreeMap::new();
    for entry in dump.split(|&b| b == 0).filter(|entry| !entry.is_empty()) {
        // Exported bash functions and other oddities are not `KEY=VALUE` shaped.
        if let Some((key, value)) = std::str::from_utf8(entry)?.split_once('=') {
            vars.insert(key.to_owned(), value.to_owned());
        }
    }
    Ok(SparkEnv { vars })
}
