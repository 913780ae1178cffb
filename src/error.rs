use std::path::PathBuf;

/// Exit status reserved for configuration failures.
pub const EXIT_CONFIG: i32 = 2;

/// A failure raised by the engine while loading or running one unit of code
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// The unit could not be read or compiled
    #[error("{message}")]
    Load { unit: String, message: String },

    /// The unit compiled but raised an error while running
    #[error("{message}")]
    Execution { unit: String, message: String },
}

impl ScriptError {
    /// Name of the chunk that failed
    pub fn unit(&self) -> &str {
        match self {
            ScriptError::Load { unit, .. } | ScriptError::Execution { unit, .. } => unit,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ScriptError::Load { message, .. } | ScriptError::Execution { message, .. } => message,
        }
    }
}

/// Fatal error during startup; there is no partial success
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot register module '{module}': {reason}")]
    Registration { module: String, reason: String },

    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Engine(#[from] mlua::Error),
}

impl ConfigError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        EXIT_CONFIG
    }
}

/// Extract the engine's own diagnostic text from an mlua error, without mlua's traceback
pub(crate) fn diagnostic(err: &mlua::Error) -> String {
    match err {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::CallbackError { cause, .. } => diagnostic(cause),
        other => other.to_string(),
    }
}
