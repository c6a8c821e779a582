use crate::core::PATH_SEPARATOR;

/// Mapper configuration
///
/// Shared by every handle and proxy type compiled through one registry.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Separator used by the store for nested document paths
    pub path_separator: char,

    /// Invoke each zero-argument constructor once while compiling a handle
    pub probe_constructors: bool,

    /// Leading segment of synthesized proxy type names
    pub proxy_name_prefix: String,
}

impl MapperConfig {
    /// Create a configuration with the store defaults
    pub fn new() -> Self {
        Self {
            path_separator: PATH_SEPARATOR,
            probe_constructors: true,
            proxy_name_prefix: "Proxy".to_string(),
        }
    }

    /// Set the nested path separator
    pub fn path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    /// Enable or disable constructor probing
    pub fn probe_constructors(mut self, probe: bool) -> Self {
        self.probe_constructors = probe;
        self
    }

    /// Set the proxy type name prefix
    pub fn proxy_name_prefix(mut self, prefix: &str) -> Self {
        self.proxy_name_prefix = prefix.to_string();
        self
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}
