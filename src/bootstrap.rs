use mlua::Function;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::error::{ConfigError, ScriptError, diagnostic};
use crate::interpreter::Interpreter;

// Fragments are embedded at compile time
const COMMON: &str = include_str!("../lua/common.lua");
const SET: &str = include_str!("../lua/set.lua");
const REGEX: &str = include_str!("../lua/regex.lua");
const ACCOUNT: &str = include_str!("../lua/account.lua");
const MAILBOX: &str = include_str!("../lua/mailbox.lua");
const MESSAGE: &str = include_str!("../lua/message.lua");
const OPTIONS: &str = include_str!("../lua/options.lua");
const AUXILIARY: &str = include_str!("../lua/auxiliary.lua");

/// Names of the standard fragments, in execution order
pub const FRAGMENT_NAMES: [&str; 8] = [
    "common",
    "set",
    "regex",
    "account",
    "mailbox",
    "message",
    "options",
    "auxiliary",
];

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentSource {
    Embedded(&'static str),
    File(PathBuf),
}

/// One unit of the bootstrap sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub source: FragmentSource,
}

impl Fragment {
    pub fn embedded(name: &str, code: &'static str) -> Self {
        Self {
            name: name.to_string(),
            source: FragmentSource::Embedded(code),
        }
    }

    pub fn file(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            source: FragmentSource::File(path),
        }
    }

    fn load(&self, interp: &Interpreter) -> Result<Function, ScriptError> {
        match &self.source {
            FragmentSource::Embedded(code) => {
                load_chunk(interp, code.as_bytes(), &format!("={}", self.name))
            }
            FragmentSource::File(path) => load_file(interp, path),
        }
    }
}

/// Fixed, ordered list of fragments run before the configuration
#[derive(Debug, Clone)]
pub struct BootstrapSequence {
    fragments: Vec<Fragment>,
}

impl BootstrapSequence {
    /// The fragments compiled into the binary
    pub fn standard() -> Self {
        let codes = [COMMON, SET, REGEX, ACCOUNT, MAILBOX, MESSAGE, OPTIONS, AUXILIARY];
        let fragments = FRAGMENT_NAMES
            .iter()
            .zip(codes)
            .map(|(name, code)| Fragment::embedded(name, code))
            .collect();
        Self { fragments }
    }

    /// The standard fragments read from `<dir>/<name>.lua`
    pub fn from_dir(dir: &Path) -> Self {
        let fragments = FRAGMENT_NAMES
            .iter()
            .map(|name| Fragment::file(name, dir.join(format!("{}.lua", name))))
            .collect();
        Self { fragments }
    }

    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }
}

/// Where the user's configuration comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Stdin,
    Inline(String),
}

impl ConfigSource {
    /// `-` selects standard input, anything else is a file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str() == "-" {
            ConfigSource::Stdin
        } else {
            ConfigSource::File(path)
        }
    }
}

/// Run every fragment, then the configuration; the first failure is fatal
pub fn run_sequence(
    interp: &Interpreter,
    sequence: &BootstrapSequence,
    source: &ConfigSource,
) -> Result<(), ConfigError> {
    for fragment in sequence.fragments() {
        debug!(fragment = %fragment.name, "running bootstrap fragment");
        let result = fragment
            .load(interp)
            .and_then(|chunk| execute(interp, &fragment.name, &chunk));
        if let Err(e) = result {
            error!(fragment = %fragment.name, "bootstrap fragment failed");
            return Err(e.into());
        }
    }

    run_config(interp, source, &mut std::io::stdin().lock())
}

/// Run the configuration source alone, reading `stdin` if it selects standard input
pub fn run_config(
    interp: &Interpreter,
    source: &ConfigSource,
    stdin: &mut dyn Read,
) -> Result<(), ConfigError> {
    let result = match source {
        ConfigSource::Inline(code) => {
            debug!("running configuration from the command line");
            load_chunk(interp, code.as_bytes(), "=<command line>")
                .and_then(|chunk| execute(interp, "<command line>", &chunk))
        }
        ConfigSource::Stdin => {
            debug!("running configuration from standard input");
            let mut code = Vec::new();
            stdin
                .read_to_end(&mut code)
                .map_err(|source| ConfigError::Io {
                    path: PathBuf::from("-"),
                    source,
                })?;
            load_chunk(interp, skip_shebang(&code), "=stdin")
                .and_then(|chunk| execute_with_traceback(interp, "stdin", &chunk))
        }
        ConfigSource::File(path) => {
            debug!(path = %path.display(), "running configuration file");
            let unit = path.display().to_string();
            load_file(interp, path).and_then(|chunk| execute_with_traceback(interp, &unit, &chunk))
        }
    };

    if let Err(e) = &result {
        error!(unit = e.unit(), "configuration failed");
    }
    result.map_err(ConfigError::from)
}

/// Compile a unit without running it
pub fn load_chunk(interp: &Interpreter, code: &[u8], name: &str) -> Result<Function, ScriptError> {
    interp
        .lua()
        .load(code)
        .set_name(name)
        .into_function()
        .map_err(|e| ScriptError::Load {
            unit: name.trim_start_matches(['=', '@']).to_string(),
            message: diagnostic(&e),
        })
}

fn load_file(interp: &Interpreter, path: &Path) -> Result<Function, ScriptError> {
    let code = std::fs::read(path).map_err(|e| ScriptError::Load {
        unit: path.display().to_string(),
        message: format!("cannot open {}: {}", path.display(), e),
    })?;
    load_chunk(interp, skip_shebang(&code), &format!("@{}", path.display()))
}

/// Blank out a leading `#` line, keeping line numbers intact
fn skip_shebang(code: &[u8]) -> &[u8] {
    if code.first() == Some(&b'#') {
        match code.iter().position(|&b| b == b'\n') {
            Some(end) => &code[end..],
            None => &[],
        }
    } else {
        code
    }
}

/// Run a loaded unit; the error is the engine's message without a traceback
pub fn execute(interp: &Interpreter, unit: &str, chunk: &Function) -> Result<(), ScriptError> {
    interp.call(chunk).map_err(|message| ScriptError::Execution {
        unit: unit.to_string(),
        message,
    })
}

fn execute_with_traceback(
    interp: &Interpreter,
    unit: &str,
    chunk: &Function,
) -> Result<(), ScriptError> {
    interp
        .call_with_traceback(chunk)
        .map_err(|message| ScriptError::Execution {
            unit: unit.to_string(),
            message,
        })
}
