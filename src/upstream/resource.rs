use std::fmt;

/// Character API resource, addressable both upstream and in the cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Characters,
    Character { id: String },
}

impl Resource {
    pub fn character(id: impl Into<String>) -> Self {
        Resource::Character { id: id.into() }
    }

    /// Path relative to the upstream API base URL.
    pub fn path(&self) -> String {
        match self {
            Resource::Characters => "/character".to_string(),
            Resource::Character { id } => format!("/character/{id}"),
        }
    }

    pub fn cache_key(&self) -> String {
        match self {
            Resource::Characters => "characters".to_string(),
            Resource::Character { id } => format!("character:{id}"),
        }
    }
}

/// Whether `id` stays a single path segment once appended to a URL: no separators and
/// no dot-segment, plain or percent-encoded.
pub fn is_path_segment(id: &str) -> bool {
    if id.is_empty() || id.contains(['/', '\\']) {
        return false;
    }

    let decoded = id.to_ascii_lowercase().replace("%2e", ".");
    decoded != "." && decoded != ".."
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Resource::Characters => write!(f, "characters"),
            Resource::Character { id } => write!(f, "character {id}"),
        }
    }
}
