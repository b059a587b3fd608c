//! Formatting of image references from a short image name, an optional repository and an optional
//! tag. The repository and tag grammars follow
//! [reference.go](https://github.com/distribution/distribution/blob/v2.7.1/reference/reference.go):
//!
//! ```txt
//! repository       := [domain '/'] path-component ['/' path-component]*
//! domain           := domain-component ['.' domain-component]* [':' port-number]
//! domain-component := /([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])/
//! path-component   := alpha-numeric [separator alpha-numeric]*
//! tag              := /[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}/
//! ```

use std::sync::LazyLock;

use regex::Regex;

const REPOSITORY_SUFFIX: char = '/';
const TAG_PREFIX: char = ':';

static REPOSITORY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^",
        r"(?:(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*)(?::[0-9]+)?/)?",
        r"[a-z0-9]+(?:(?:[_.]|__|[-]*)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[_.]|__|[-]*)[a-z0-9]+)*)*",
        r"$"
    ))
    .unwrap()
});

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").unwrap());

/// Accepts an empty value, which is treated as if the repository was not provided.
pub fn parse_repository(value: &str) -> Result<String, &'static str> {
    if !value.is_empty() && !REPOSITORY_REGEX.is_match(value) {
        return Err("expected a repository such as `docker.io/myrepo` or `localhost:5000/team`");
    }
    Ok(value.to_string())
}

/// Accepts an empty value, which is treated as if the tag was not provided.
pub fn parse_tag(value: &str) -> Result<String, &'static str> {
    if !value.is_empty() && !TAG_REGEX.is_match(value) {
        return Err("expected a tag of at most 128 ASCII letters, digits, `_`, `.` or `-`, not starting with `.` or `-`");
    }
    Ok(value.to_string())
}

/// The repository and tag shared by every image this tool builds or pushes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageNaming {
    repository: Option<String>,
    tag: Option<String>,
}

impl ImageNaming {
    pub fn new(repository: Option<String>, tag: Option<String>) -> Self {
        Self {
            repository: repository.filter(|value| !value.is_empty()),
            tag: tag.filter(|value| !value.is_empty()),
        }
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    /// Returns `name`, `repository/name`, `name:tag` or `repository/name:tag`.
    pub fn reference(&self, name: &str) -> String {
        let mut buffer = String::with_capacity(
            self.repository
                .as_ref()
                .map(|x| x.len() + REPOSITORY_SUFFIX.len_utf8())
                .unwrap_or_default()
                + name.len()
                + self
                    .tag
                    .as_ref()
                    .map(|x| x.len() + TAG_PREFIX.len_utf8())
                    .unwrap_or_default(),
        );

        if let Some(repository) = &self.repository {
            buffer.push_str(repository);
            buffer.push(REPOSITORY_SUFFIX);
        }
        buffer.push_str(name);
        if let Some(tag) = &self.tag {
            buffer.push(TAG_PREFIX);
            buffer.push_str(tag);
        }
        buffer
    }
}
