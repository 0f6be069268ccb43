// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Worker pool for batch generation
//!
//! One request occupies one worker for its whole duration. The generator
//! is shared read-only between workers.

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{Generated, Generator};
use crate::request::GenerateRequest;
use rayon::prelude::*;

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    generator: Generator,
}

impl WorkerPool {
    pub fn new(threads: usize, generator: Generator) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("partforge-worker-{}", i))
            .build()?;
        tracing::info!(threads = pool.current_num_threads(), "Worker pool ready");
        Ok(Self { pool, generator })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.worker_threads, Generator::from_config(config))
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Generate one request on a pool worker
    pub fn generate(&self, request: &GenerateRequest) -> Result<Generated> {
        self.pool.install(|| self.generator.generate_request(request))
    }

    /// Generate many requests in parallel, results in request order
    pub fn generate_batch(&self, requests: &[GenerateRequest]) -> Vec<Result<Generated>> {
        let generator = &self.generator;
        self.pool.install(|| {
            requests
                .par_iter()
                .map(|request| generator.generate_request(request))
                .collect()
        })
    }
}
