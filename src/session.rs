use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::bindings::host::CoreModule;
use crate::bindings::pattern::PatternModule;
use crate::bindings::system::SystemModule;
use crate::bindings::{self, CapabilityModule};
use crate::bootstrap::{self, BootstrapSequence, ConfigSource};
use crate::error::ConfigError;
use crate::interpreter::Interpreter;
use crate::options;
use crate::repl::{EditorLines, LineSource, PromptedLines, Repl};

/// Everything the command line decides for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: ConfigSource,
    pub interactive: bool,
    pub dryrun: bool,
    /// Directory added to `package.path`
    pub home: Option<PathBuf>,
    /// Load bootstrap fragments from here instead of the embedded copies
    pub share_dir: Option<PathBuf>,
}

/// A configured engine: modules registered, options seeded, configuration run
pub struct Session {
    interp: Interpreter,
    interactive: bool,
}

impl Session {
    pub fn start(settings: &Settings) -> Result<Self, ConfigError> {
        let interp = Interpreter::start()?;

        if let Some(home) = &settings.home {
            interp.extend_package_path(home)?;
        }

        let core = CoreModule {
            dryrun: settings.dryrun,
        };
        let modules: [&dyn CapabilityModule; 3] = [&core, &SystemModule, &PatternModule];
        bindings::register_all(&interp, &modules)?;

        options::init_defaults(&interp, settings.dryrun)?;

        let sequence = match &settings.share_dir {
            Some(dir) => BootstrapSequence::from_dir(dir),
            None => BootstrapSequence::standard(),
        };
        bootstrap::run_sequence(&interp, &sequence, &settings.source)?;

        debug!(options = ?options::snapshot(&interp), "configuration loaded");
        Ok(Self {
            interp,
            interactive: settings.interactive,
        })
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn get_boolean(&self, name: &str) -> bool {
        options::get_boolean(&self.interp, name)
    }

    pub fn get_number(&self, name: &str) -> f64 {
        options::get_number(&self.interp, name)
    }

    pub fn get_string(&self, name: &str) -> String {
        options::get_string(&self.interp, name)
    }

    /// Run the REPL on stdin if interactive mode was requested
    pub fn interact(&self) -> anyhow::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        info!("interactive mode");

        let stdin = std::io::stdin();
        let mut source: Box<dyn LineSource> = if stdin.is_terminal() {
            Box::new(EditorLines::new())
        } else {
            Box::new(PromptedLines::new(stdin.lock(), std::io::stdout()))
        };
        Repl::new(&self.interp, std::io::stderr()).run(source.as_mut())
    }

    pub fn stop(self) {
        self.interp.stop()
    }
}
