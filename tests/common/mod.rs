//! Shared harness for the integration tests.
//!
//! Scripts live under `test_scripts/` in the package root. Every engine the
//! harness builds searches that directory for imports and captures what
//! programs print.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use glang::{CapturedOutput, Engine, EngineBuilder, Error, RuntimeConfig};

pub fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_scripts")
}

/// Read a script from `test_scripts/`.
pub fn script(path: &str) -> String {
    let file = scripts_dir().join(path);
    fs::read_to_string(&file).unwrap_or_else(|e| panic!("Failed to read {}: {e}", file.display()))
}

/// An engine wired to `test_scripts/` with captured output.
pub struct TestHarness {
    pub engine: Engine,
    pub output: Arc<CapturedOutput>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with(|builder| builder)
    }

    pub fn with_debug_prints() -> Self {
        Self::with(|builder| builder.config(RuntimeConfig::default().with_debug_prints(true)))
    }

    /// Build from a customised builder. The include directory and the
    /// output sink are added afterwards.
    pub fn with(configure: impl FnOnce(EngineBuilder) -> EngineBuilder) -> Self {
        let output = Arc::new(CapturedOutput::default());
        let engine = configure(Engine::builder())
            .include_dir(scripts_dir())
            .output(output.clone())
            .build();
        Self { engine, output }
    }

    /// Run `source` as the unit `namespace` and return what it printed.
    pub fn run(&self, namespace: &str, source: &str) -> Result<String, Error> {
        self.engine.run_source(namespace, source, Vec::new())?;
        Ok(self.output.stdout())
    }

    /// Run a script from `test_scripts/` and return what it printed.
    pub fn run_script(&self, path: &str, args: &[&str]) -> Result<String, Error> {
        let args = args.iter().map(|a| a.to_string()).collect();
        self.engine.run_path(path, args)?;
        Ok(self.output.stdout())
    }

    /// The reasons of every diagnostic compiling `source` reports.
    pub fn compile_errors(&self, source: &str) -> Vec<String> {
        match self.engine.compile("test.errors", source) {
            Ok(_) => Vec::new(),
            Err(e) => e
                .compile_errors()
                .map(|errors| errors.iter().map(|e| e.reason.clone()).collect())
                .unwrap_or_default(),
        }
    }

    pub fn stderr(&self) -> String {
        self.output.stderr()
    }
}
