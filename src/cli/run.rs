//! The run command.
//!
//! Prepares the work directory, bundles and loads scripts, resolves their
//! plugins and runs every feature, in that order.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bundler::{prepare_scripts, Bundler, CommandBundler, CopyBundler};
use crate::cache::BuildCache;
use crate::config::{load_config, HabitableConfig, RunSettings, WorkDirs};
use crate::error::Result;
use crate::plugins::{NativeLoader, PluginLoader, PluginResolver, PluginTable, Vendor};
use crate::scripting::ScriptBridge;
use crate::suite::{load_features, render, Suite};
use crate::variables::VariableStore;

use super::args::Cli;
use super::command::{Command, CommandResult};

/// Timeout for downloading a plugin artifact.
const PLUGIN_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    overrides: HabitableConfig,
    clean: bool,
    variables: VariableStore,
    loader: Box<dyn PluginLoader>,
}

impl RunCommand {
    /// Create a run command for `project_root` from parsed arguments.
    pub fn new(project_root: &Path, cli: &Cli) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: cli.config.clone(),
            overrides: cli.overrides(),
            clean: cli.clean,
            variables: VariableStore::from_env(),
            loader: Box::new(NativeLoader),
        }
    }

    /// Load plugins with `loader` instead of as native libraries.
    pub fn with_loader(mut self, loader: Box<dyn PluginLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Seed scripts and step substitution from `variables` instead of the
    /// process environment.
    pub fn with_variables(mut self, variables: VariableStore) -> Self {
        self.variables = variables;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve the settings for this run.
    pub fn settings(&self) -> Result<RunSettings> {
        let config = load_config(&self.project_root, self.config_path.as_deref())?;
        Ok(RunSettings::from_config(config.merge(self.overrides.clone())))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let settings = self.settings()?;
        tracing::debug!("running with settings {:?}", settings);

        let work = WorkDirs::new(&self.project_root);
        work.prepare(self.clean)?;
        let cache = BuildCache::in_dir(&work.build());

        let bundler: Box<dyn Bundler> = match &settings.bundler_command {
            Some(command) => Box::new(CommandBundler::new(command.clone())),
            None => Box::new(CopyBundler),
        };
        let sources: Vec<PathBuf> = settings.extensions.iter().map(|p| self.resolve(p)).collect();
        prepare_scripts(&cache, bundler.as_ref(), &sources, &work)?;

        tracing::info!("loading scripts");
        let mut bridge = ScriptBridge::new(
            self.variables.clone(),
            PluginTable::with_default_location(settings.default_plugin_location.clone()),
        );
        bridge.load_dir(&work.scripts())?;

        let vendor = Vendor::new(work.plugins(), PLUGIN_FETCH_TIMEOUT)?;
        let resolver = PluginResolver::new(&cache, vendor, Box::new(LoaderRef(self.loader.as_ref())));
        let plugins = resolver.resolve(&bridge.plugin_table())?;
        bridge.bind(&plugins)?;

        let tests: Vec<PathBuf> = settings.tests.iter().map(|p| self.resolve(p)).collect();
        let features = load_features(&tests)?;

        let variables = &self.variables;
        let suite = Suite::new(settings.name.clone()).before_step(|text| {
            let substituted = variables.substitute(text);
            tracing::trace!("{}", substituted);
            substituted
        });
        let report = suite.run(&features, |registrar| {
            tracing::info!("registering script defined steps");
            bridge.register_steps(registrar).map(|_| ())
        })?;

        let rendered = render(&report, settings.format)?;
        out.write_all(rendered.as_bytes())?;
        out.flush()?;

        if report.passed() {
            Ok(CommandResult::success())
        } else {
            tracing::info!(
                "{} of {} scenarios failed",
                report.failed_scenarios(),
                report.scenario_count()
            );
            Ok(CommandResult::failure(1))
        }
    }
}

/// Lends a borrowed loader to the resolver.
struct LoaderRef<'a>(&'a dyn PluginLoader);

impl PluginLoader for LoaderRef<'_> {
    fn load(&self, name: &str, artifact: &Path) -> anyhow::Result<crate::plugins::PluginHandle> {
        self.0.load(name, artifact)
    }
}
