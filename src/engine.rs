use std::path::PathBuf;
use std::sync::Arc;

use glang_compiler::{CodeUnit, CompileOptions, compile_source};
use glang_core::{RuntimeError, namespace_for_path, type_name_for};
use glang_runtime::{
    ExtensionRegistrar, LoadedUnit, OutputSink, Runtime, RuntimeConfig, Value,
};
use log::debug;

use crate::error::{Error, Result};
use crate::loader::{DirectorySource, ModuleLoader, SourceProvider};

/// Builder for an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<RuntimeConfig>,
    include_dirs: Vec<PathBuf>,
    providers: Vec<Arc<dyn SourceProvider>>,
    registrars: Vec<Arc<dyn ExtensionRegistrar>>,
    output: Option<Arc<dyn OutputSink>>,
}

impl EngineBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use the configuration from the process environment.
    pub fn config_from_env(self) -> Result<Self> {
        Ok(self.config(RuntimeConfig::from_env()?))
    }

    /// Search `dir` for units imported by name.
    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Search `provider` for units, after the include directories.
    pub fn source_provider(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn registrar(mut self, registrar: Arc<dyn ExtensionRegistrar>) -> Self {
        self.registrars.push(registrar);
        self
    }

    pub fn output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Engine {
        let config = self.config.unwrap_or_default();
        let options = CompileOptions::default().with_debug_prints(config.debug_prints);

        let mut providers: Vec<Arc<dyn SourceProvider>> = Vec::new();
        if !self.include_dirs.is_empty() {
            providers.push(Arc::new(DirectorySource::new(self.include_dirs)));
        }
        providers.extend(self.providers);
        let loader = Arc::new(ModuleLoader::new(providers, options.clone()));

        let mut runtime = Runtime::builder().config(config).class_source(loader);
        for registrar in self.registrars {
            runtime = runtime.registrar(registrar);
        }
        if let Some(output) = self.output {
            runtime = runtime.output(output);
        }

        Engine {
            runtime: runtime.build(),
            options,
        }
    }
}

/// Compiles and runs glang units against one [`Runtime`].
///
/// ```ignore
/// let engine = Engine::builder().include_dir("scripts").build();
/// engine.run_path("demo/hello.glang", vec![])?;
/// ```
#[derive(Debug)]
pub struct Engine {
    runtime: Runtime,
    options: CompileOptions,
}

impl Engine {
    /// An engine with the default configuration and no include directories.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `source` as the unit for `namespace` without loading it.
    pub fn compile(&self, namespace: &str, source: &str) -> Result<CodeUnit> {
        Ok(compile_source(namespace, source, &self.options)?)
    }

    /// Compile and load `source` as the unit for `namespace`.
    pub fn load_source(&self, namespace: &str, source: &str) -> Result<Arc<LoadedUnit>> {
        let code = self.compile(namespace, source)?;
        Ok(self.runtime.load_unit(code)?)
    }

    /// Compile, load and run `source`, passing `args` to its `main`.
    pub fn run_source(&self, namespace: &str, source: &str, args: Vec<String>) -> Result<Value> {
        let unit = self.load_source(namespace, source)?;
        self.run(&unit, args)
    }

    /// Load the unit at a relative source path such as `a/b/test.glang`
    /// through the engine's source providers.
    pub fn load_from_path(&self, path: &str) -> Result<Arc<LoadedUnit>> {
        let namespace =
            namespace_for_path(path).ok_or_else(|| Error::InvalidPath(path.to_string()))?;
        let type_name = type_name_for(&namespace);
        debug!("loading {path} as {type_name}");
        self.runtime.find_class(&type_name).map_err(|e| match e {
            RuntimeError::ClassNotFound { .. } => RuntimeError::ImportNotFound {
                path: Vec::new(),
                target: Some(path.to_string()),
                reason: Some("no such source file".into()),
            },
            other => other,
        })?;
        self.runtime
            .unit(&type_name)
            .ok_or_else(|| Error::InvalidPath(path.to_string()))
    }

    /// Load and run the unit at `path`.
    pub fn run_path(&self, path: &str, args: Vec<String>) -> Result<Value> {
        let unit = self.load_from_path(path)?;
        self.run(&unit, args)
    }

    fn run(&self, unit: &LoadedUnit, args: Vec<String>) -> Result<Value> {
        let args = args.into_iter().map(Value::from).collect();
        Ok(self.runtime.run_unit(unit, args)?)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemorySource;
    use glang_runtime::CapturedOutput;

    #[test]
    fn paths_need_the_source_suffix() {
        let engine = Engine::new();
        let err = engine.load_from_path("demo/hello.txt").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn launch_arguments_reach_main() {
        let output = Arc::new(CapturedOutput::default());
        let engine = Engine::builder().output(output.clone()).build();
        engine
            .run_source("demo.args", "println(args)", vec!["a".into(), "b".into()])
            .unwrap();
        assert_eq!(output.stdout(), "[a, b]\n");
    }

    #[test]
    fn units_import_each_other_through_providers() {
        let memory = MemorySource::new()
            .with("lib/shapes.glang", "sides = 4")
            .with("app/main.glang", "import lib.ShapesNs\nprintln(ShapesNs)");
        let output = Arc::new(CapturedOutput::default());
        let engine = Engine::builder()
            .source_provider(Arc::new(memory))
            .output(output.clone())
            .build();
        engine.run_path("app/main.glang", vec![]).unwrap();
        assert_eq!(output.stdout(), "class lib.ShapesNs\n");
    }

    #[test]
    fn missing_source_files() {
        let engine = Engine::new();
        let err = engine.load_from_path("nowhere/gone.glang").unwrap_err();
        assert_eq!(err.to_string(), "nowhere/gone.glang: no such source file");
    }
}
