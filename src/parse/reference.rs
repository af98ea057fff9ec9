use std::fmt::{Display, Formatter};

/// An image name split into repository and tag or digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Image name without tag or digest, registry host and port included.
    pub repository: String,
    /// Either the digest (after `@`) or the tag (after `:`).
    pub qualifier: Option<String>,
    digest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier<'a> {
    Digest(&'a str),
    Tag(&'a str),
}

impl ImageReference {
    pub fn parse(name: &str) -> ImageReference {
        if let Some((repository, digest)) = name.split_once('@') {
            return ImageReference {
                repository: repository.to_string(),
                qualifier: Some(digest.to_string()),
                digest: true,
            };
        }
        match name.split_once(':') {
            // a '/' after the colon means the colon separates a registry port
            Some((repository, tag)) if !tag.contains('/') => ImageReference {
                repository: repository.to_string(),
                qualifier: Some(tag.to_string()),
                digest: false,
            },
            _ => ImageReference {
                repository: name.to_string(),
                qualifier: None,
                digest: false,
            },
        }
    }

    pub fn qualifier(&self) -> Option<Qualifier<'_>> {
        self.qualifier.as_deref().map(|value| {
            if self.digest {
                Qualifier::Digest(value)
            } else {
                Qualifier::Tag(value)
            }
        })
    }

    pub fn tag(&self) -> Option<&str> {
        match self.qualifier() {
            Some(Qualifier::Tag(tag)) => Some(tag),
            _ => None,
        }
    }

    pub fn digest(&self) -> Option<&str> {
        match self.qualifier() {
            Some(Qualifier::Digest(digest)) => Some(digest),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (String, Option<String>) {
        (self.repository, self.qualifier)
    }
}

impl Display for ImageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.qualifier() {
            None => f.write_str(&self.repository),
            Some(Qualifier::Tag(tag)) => write!(f, "{}:{}", self.repository, tag),
            Some(Qualifier::Digest(digest)) => write!(f, "{}@{}", self.repository, digest),
        }
    }
}

/// Splits an image name into repository and an optional tag or digest.
///
/// Text after `@` is taken verbatim as a digest without validating its
/// algorithm.
pub fn parse_repository(name: &str) -> (String, Option<String>) {
    ImageReference::parse(name).into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_has_no_qualifier() {
        assert_eq!(parse_repository("fedora"), ("fedora".to_string(), None));
        assert_eq!(parse_repository("quay.io/podman/stable"), ("quay.io/podman/stable".to_string(), None));
        assert_eq!(parse_repository(""), (String::new(), None));
    }

    #[test]
    fn tag_is_split() {
        assert_eq!(parse_repository("fedora:latest"), ("fedora".to_string(), Some("latest".to_string())));
        let reference = ImageReference::parse("image:latest");
        assert_eq!(reference.tag(), Some("latest"));
        assert_eq!(reference.digest(), None);
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        assert_eq!(
            parse_repository("localhost:5000/fedora"),
            ("localhost:5000/fedora".to_string(), None)
        );
        assert_eq!(
            parse_repository("registry:5000/image"),
            ("registry:5000/image".to_string(), None)
        );
        // first colon wins, so a port followed by a tag keeps the whole name
        assert_eq!(
            parse_repository("registry:5000/image:1.0"),
            ("registry:5000/image:1.0".to_string(), None)
        );
    }

    #[test]
    fn digest_wins_over_tag() {
        assert_eq!(
            parse_repository("fedora@sha256:deadbeef"),
            ("fedora".to_string(), Some("sha256:deadbeef".to_string()))
        );
        let reference = ImageReference::parse("localhost:5000/fedora:33@sha256:abcd");
        assert_eq!(reference.repository, "localhost:5000/fedora:33");
        assert_eq!(reference.digest(), Some("sha256:abcd"));
        assert_eq!(reference.tag(), None);
    }

    #[test]
    fn anything_after_at_is_accepted() {
        assert_eq!(parse_repository("image@not-a-digest"), ("image".to_string(), Some("not-a-digest".to_string())));
        assert_eq!(parse_repository("image@"), ("image".to_string(), Some(String::new())));
    }

    #[test]
    fn display_round_trips() {
        for name in ["fedora", "fedora:33", "fedora@sha256:9598a10f", "localhost:5000/fedora"] {
            assert_eq!(ImageReference::parse(name).to_string(), name);
        }
    }
}
