//! Pool configuration.

use crate::error::{Error, Result};
use crate::executor::PanicStrategy;
use crate::scheduler::heap::DEFAULT_CAPACITY;

/// Upper bound on the number of workers a single pool may spawn.
pub const MAX_THREADS: usize = 1024;

/// Settings used by [`ThreadPool::with_config`](crate::ThreadPool::with_config).
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker count. `None` uses one worker per logical CPU.
    pub num_threads: Option<usize>,
    /// Workers are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
    /// Stack size for each worker thread; `None` keeps the platform default.
    pub stack_size: Option<usize>,
    /// Initial capacity of the task heap. It grows on demand and never shrinks.
    pub queue_capacity: usize,
    /// How a panicking task is reported.
    pub panic_strategy: PanicStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "pripool-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
            queue_capacity: DEFAULT_CAPACITY,
            panic_strategy: PanicStrategy::default(),
        }
    }
}

impl Config {
    /// Start building a config from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Check every field, returning [`Error::Config`] for the first bad one.
    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > MAX_THREADS {
                return Err(Error::config(format!(
                    "num_threads too large (max {})",
                    MAX_THREADS
                )));
            }
        }

        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be > 0"));
        }

        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        Ok(())
    }

    /// The resolved number of workers.
    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Builder holding [`Config::default`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the worker count.
    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    /// Set the worker thread name prefix.
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the initial task heap capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the panic strategy.
    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
