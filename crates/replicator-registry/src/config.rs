//! Configuration for `RequestRegistry`.

/// Tunables for a `RequestRegistry`, following the teacher's
/// `BulkheadConfig::builder()...build()` convention.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub(crate) max_concurrent: usize,
    pub(crate) name: String,
}

impl RegistryConfig {
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::new()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

pub struct RegistryConfigBuilder {
    max_concurrent: usize,
    name: String,
}

impl RegistryConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_concurrent: 100,
            name: "request-registry".to_string(),
        }
    }

    /// In-flight cluster-request cap. Default: 100.
    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Name of this registry instance for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> RegistryConfig {
        RegistryConfig {
            max_concurrent: self.max_concurrent,
            name: self.name,
        }
    }
}

impl Default for RegistryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
