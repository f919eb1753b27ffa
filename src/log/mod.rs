//! The `log` module configures the crate-wide logger. Logging here means diagnostic messages
//! about what the simulation is doing (agents changing state, per-tick counts, run start and
//! end). It is not a results channel: the runner prints its summary on stdout independently of
//! the log level.
//!
//! The module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`, where `error!` represents the highest-priority log messages and `trace!` the
//! lowest.
//!
//! Logging is _disabled_ by default. It can be enabled by passing the command line option
//! `--log-level <level>` to the `epicity` binary, or programmatically with
//! `set_log_level(level: LevelFilter)`, which enables only log messages with priority at least
//! `level`. `LevelFilter::Off` turns logging back off.
//!
//! Per-module filtering is configured with `set_module_filter()` / `set_module_filters()` and
//! `remove_module_filter()`:
//!
//! ```rust
//! use epicity::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Per-tick counts and run summaries.
//!     set_log_level(LevelFilter::Debug);
//!     // Every individual infection, death and quarantine transfer.
//!     set_module_filter("epicity::agent", LevelFilter::Trace);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;

use crate::hashing::HashMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Default module specific filters
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] = [
    // One trace line per agent transition drowns out everything else.
    ("epicity::agent", LevelFilter::Debug),
];

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Different log level filters can be applied to the log messages emitted from different modules
/// according to the module path (e.g. `"epicity::simulation"`). These are stored in the global
/// `LogConfiguration`.
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    /// The module path this configuration applies to
    module: String,
    /// The maximum log level for this module path
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Holds logging configuration: the filter levels of modules and a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct should exist. The
/// public API are free functions which fetch the singleton and call the appropriate member
/// function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The "default" level filter for modules ("targets") without an explicitly set filter. A
    /// global filter level of `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        let module_configurations = HashMap::from_iter(module_configurations);
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }

            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Returns the global log level currently in effect.
pub fn log_level() -> LevelFilter {
    get_log_configuration().global_log_level
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk; the logger is rebuilt at most once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
