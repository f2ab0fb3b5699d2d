//! Loading units from source on first use.
//!
//! A [`ModuleLoader`] is a [`ClassSource`]: when the class path is asked for
//! a generated type name like `a.b.TestNs` it reads `a/b/test.glang` from
//! its [`SourceProvider`]s, compiles it and loads the unit. Each unit is
//! compiled at most once, even when several threads ask for it at the same
//! time: the first one compiles, the others wait for its result.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use glang_compiler::{CompileOptions, compile_source};
use glang_core::{RuntimeError, RuntimeResult, namespace_for_path, source_path_for};
use glang_runtime::{ClassRef, ClassSource, Runtime};
use log::{debug, trace};
use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

/// Source text and the name diagnostics show for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub source: String,
    pub display_name: String,
}

/// Resolves relative source paths (`a/b/test.glang`) to source text.
pub trait SourceProvider: Send + Sync {
    /// The file at `path`, or `Ok(None)` when this provider has none.
    fn read(&self, path: &str) -> RuntimeResult<Option<SourceFile>>;
}

/// Sources under one or more root directories, searched in order.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    roots: Vec<PathBuf>,
}

impl DirectorySource {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl SourceProvider for DirectorySource {
    fn read(&self, path: &str) -> RuntimeResult<Option<SourceFile>> {
        for root in &self.roots {
            let file = root.join(path);
            match fs::read_to_string(&file) {
                Ok(source) => {
                    return Ok(Some(SourceFile {
                        source,
                        display_name: file.display().to_string(),
                    }));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(RuntimeError::Io(format!("{}: {e}", file.display()))),
            }
        }
        Ok(None)
    }
}

/// Sources held in memory, keyed by relative path.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<FxHashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &str, source: &str) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&self, path: &str, source: &str) {
        self.files.write().insert(path.to_string(), source.to_string());
    }
}

impl SourceProvider for MemorySource {
    fn read(&self, path: &str) -> RuntimeResult<Option<SourceFile>> {
        Ok(self.files.read().get(path).map(|source| SourceFile {
            source: source.clone(),
            display_name: path.to_string(),
        }))
    }
}

/// Compiles and loads units on demand.
pub struct ModuleLoader {
    providers: Vec<Arc<dyn SourceProvider>>,
    options: CompileOptions,
    /// Type names some thread is compiling right now.
    loading: Mutex<FxHashSet<String>>,
    loaded: Condvar,
}

impl ModuleLoader {
    pub fn new(providers: Vec<Arc<dyn SourceProvider>>, options: CompileOptions) -> Self {
        Self {
            providers,
            options,
            loading: Mutex::new(FxHashSet::default()),
            loaded: Condvar::new(),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    fn read(&self, path: &str) -> RuntimeResult<Option<SourceFile>> {
        for provider in &self.providers {
            if let Some(file) = provider.read(path)? {
                return Ok(Some(file));
            }
        }
        Ok(None)
    }

    /// Compile and load the unit at `path`. Returns false when no provider
    /// has the file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn compile_and_load(&self, runtime: &Runtime, path: &str) -> RuntimeResult<bool> {
        let Some(file) = self.read(path)? else {
            trace!("no source for {path}");
            return Ok(false);
        };
        let namespace = namespace_for_path(path)
            .ok_or_else(|| RuntimeError::IllegalArgument(format!("not a source path: {path}")))?;
        let options = self.options.clone().with_source_file(file.display_name.clone());
        debug!("compiling {} as {namespace}", file.display_name);
        let code = compile_source(&namespace, &file.source, &options)?;
        runtime.load_unit(code)?;
        Ok(true)
    }

    /// Load the unit whose type name is `type_name` unless it is loaded
    /// already, waiting for another thread that is loading it.
    pub fn ensure_loaded(&self, runtime: &Runtime, type_name: &str) -> RuntimeResult<()> {
        let Some(path) = source_path_for(type_name) else {
            return Ok(());
        };
        {
            let mut loading = self.loading.lock();
            loop {
                if runtime.unit(type_name).is_some() {
                    return Ok(());
                }
                if loading.insert(type_name.to_string()) {
                    break;
                }
                self.loaded.wait(&mut loading);
            }
        }

        let result = self.compile_and_load(runtime, &path);

        self.loading.lock().remove(type_name);
        self.loaded.notify_all();
        result.map(|_| ())
    }
}

impl ClassSource for ModuleLoader {
    fn find_class(&self, runtime: &Runtime, name: &str) -> RuntimeResult<Option<ClassRef>> {
        // nested types live in their outer type's unit
        let outer = name.split('$').next().unwrap_or(name);
        self.ensure_loaded(runtime, outer)?;
        Ok(runtime.class_path().defined(name))
    }
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("providers", &self.providers.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
