use log::debug;

use crate::{process, Result};

/// Returns the environment variables that point `docker` at minikube's Docker daemon. Images
/// built this way are directly available to pods in the minikube cluster.
pub fn docker_env() -> Result<Vec<(String, String)>> {
    match process::command!("minikube", "status").output() {
        Ok(_) => {}
        Err(error) if matches!(error.kind, process::ErrorKind::NotFound) => {
            return Err("Cannot find minikube.".into());
        }
        Err(error) => {
            debug!("{error}");
            return Err("Cannot contact minikube. Make sure it's running.".into());
        }
    }

    let output = process::command!("minikube", "docker-env", "--shell", "none").output()?;
    let env = parse_docker_env(std::str::from_utf8(&output.stdout)?);
    debug!("minikube docker-env: {env:?}");
    Ok(env)
}

/// Parses `KEY=VALUE` lines, tolerating the `export KEY="VALUE"` form of the POSIX shells.
fn parse_docker_env(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value
                .strip_prefix('"')
                .and_then(|value| value.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.trim().to_owned(), value.to_owned()))
        })
        .collect()
}
