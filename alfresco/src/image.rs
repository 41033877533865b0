//! Docker image references (`[registry/]repository[:tag]`).

use errors::{FixtureError, FixtureResult};
use std::fmt;

const DEFAULT_TAG: &str = "latest";
const DOCKER_HUB: &str = "docker.io";

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    registry: Option<String>,
    repository: String,
    tag: String
}

impl ImageReference {
    /// Parses `[registry/]repository[:tag]`. A missing tag means `latest`.
    ///
    /// ```
    /// use alfresco_testcontainers::ImageReference;
    ///
    /// let image = ImageReference::parse("quay.io/alfresco/content:7.4.1").unwrap();
    /// assert_eq!(image.registry(), Some("quay.io"));
    /// assert_eq!(image.repository(), "alfresco/content");
    /// assert_eq!(image.tag(), "7.4.1");
    /// ```
    pub fn parse(reference: &str) -> FixtureResult<Self> {
        let malformed = |reason: &str| FixtureError::MalformedImageReference {
            reference: reference.to_string(),
            reason: reason.to_string()
        };

        let reference_trimmed = reference.trim();
        if reference_trimmed.is_empty() {
            return Err(malformed("reference is empty"));
        }
        if reference_trimmed.contains(char::is_whitespace) {
            return Err(malformed("reference contains whitespace"));
        }

        // A colon after the last slash separates the tag; earlier colons
        // belong to a registry port.
        let last_slash = reference_trimmed.rfind('/').map_or(0, |i| i + 1);
        let (name, tag) = match reference_trimmed[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&reference_trimmed[..split], &reference_trimmed[split + 1..])
            }
            None => (reference_trimmed, DEFAULT_TAG)
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest)
            }
            _ => (None, name)
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(malformed("repository name has an empty path component"));
        }
        validate_tag(tag).map_err(|reason| malformed(&reason))?;

        Ok(Self {
            registry,
            repository: repository.to_string(),
            tag: tag.to_string()
        })
    }

    /// Builds `repository:tag` from an unversioned repository and a version tag.
    pub fn versioned(repository: &str, version: &str) -> FixtureResult<Self> {
        let base = Self::parse(repository)?;
        validate_tag(version).map_err(|reason| FixtureError::MalformedImageReference {
            reference: format!("{}:{version}", base.unversioned()),
            reason
        })?;
        Ok(base.with_tag(version))
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Image name without the tag, including the registry when present.
    pub fn unversioned(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{registry}/{}", self.repository),
            None => self.repository.clone()
        }
    }

    /// True when both references name the same repository. Docker Hub
    /// prefixes (`docker.io/`, `library/`) are ignored; tags never matter.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.canonical_registry() == other.canonical_registry()
            && self.canonical_repository() == other.canonical_repository()
    }

    /// Fails with `InvalidImageReference` unless `self` is compatible with `expected`.
    pub fn assert_compatible_with(&self, expected: &Self) -> FixtureResult<()> {
        if self.is_compatible_with(expected) {
            Ok(())
        } else {
            Err(FixtureError::InvalidImageReference {
                reference: self.to_string(),
                expected: expected.unversioned()
            })
        }
    }

    fn canonical_registry(&self) -> &str {
        match self.registry.as_deref() {
            None | Some(DOCKER_HUB) | Some("registry-1.docker.io") | Some("index.docker.io") => {
                DOCKER_HUB
            }
            Some(other) => other
        }
    }

    fn canonical_repository(&self) -> &str {
        self.repository
            .strip_prefix("library/")
            .unwrap_or(&self.repository)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.unversioned(), self.tag)
    }
}

fn validate_tag(tag: &str) -> Result<(), String> {
    let valid_chars = tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    let valid_start = tag
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_chars && valid_start && tag.len() <= 128 {
        Ok(())
    } else {
        Err(format!("tag {tag:?} is not at most 128 characters of [A-Za-z0-9_.-]"))
    }
}
