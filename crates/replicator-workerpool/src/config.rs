//! Configuration for `WorkerPool`.

/// Tunables for a `WorkerPool`, following the teacher's
/// `FooConfig::builder()...build()` convention.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub(crate) num_threads: usize,
    pub(crate) name: String,
}

impl WorkerPoolConfig {
    pub fn builder() -> WorkerPoolConfigBuilder {
        WorkerPoolConfigBuilder::new()
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

pub struct WorkerPoolConfigBuilder {
    num_threads: usize,
    name: String,
}

impl WorkerPoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            num_threads: 0,
            name: "worker-pool".to_string(),
        }
    }

    /// Size of the worker pool. Required, must be `> 0`.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Name of this pool instance for observability. Default: "worker-pool".
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// # Panics
    ///
    /// Panics if `num_threads` was never set to a positive value; the spec
    /// names `numThreads` as a required, `> 0` tunable with no default.
    pub fn build(self) -> WorkerPoolConfig {
        assert!(self.num_threads > 0, "num_threads must be > 0");
        WorkerPoolConfig {
            num_threads: self.num_threads,
            name: self.name,
        }
    }
}

impl Default for WorkerPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
