//! Execution session.
//!
//! A `Session` owns the worker pool every engine operation runs on. It is
//! built once, handed by reference to each stage, and torn down when it is
//! dropped, on success and error paths alike. There is no global session.

use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

const DEFAULT_APP_NAME: &str = "engine";

/// Builder for [`Session`]
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    app_name: String,
    num_threads: usize,
}

impl SessionBuilder {
    /// Name used in logs and worker thread names
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Worker count; 0 means one per logical CPU
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn build(self) -> Result<Session> {
        let thread_prefix = self.app_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(move |i| format!("{}-worker-{}", thread_prefix, i))
            .build()?;

        info!(
            "Started session {} with {} worker threads",
            self.app_name,
            pool.current_num_threads()
        );

        Ok(Session {
            app_name: self.app_name,
            pool,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            num_threads: 0,
        }
    }
}

/// Scoped handle on the engine's worker pool
pub struct Session {
    app_name: String,
    pool: ThreadPool,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` on the session's pool; rayon iterators inside use its workers.
    pub fn run<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("app_name", &self.app_name)
            .field("num_threads", &self.num_threads())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        info!("Stopping session {}", self.app_name);
    }
}
