pub(crate) mod build;
pub(crate) mod distribution;
pub(crate) mod docker;
pub(crate) mod image_ref;
pub(crate) mod images;
pub(crate) mod minikube;
pub(crate) mod process;
pub(crate) mod push;
pub(crate) mod spark_env;

pub mod cli;

pub(crate) type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;
