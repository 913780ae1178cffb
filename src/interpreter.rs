use mlua::{Function, Lua, MultiValue, Table, Value};
use std::path::Path;
use tracing::debug;

use crate::error::diagnostic;

/// The single embedded Lua engine of the process.
///
/// Every other component borrows the engine through [`Interpreter::lua`]; `stop`
/// consumes the handle so nothing can use it afterwards.
///
/// `pcall`, `xpcall` and the traceback handler are captured at start so that
/// scripts reassigning those globals cannot change how the host runs code.
pub struct Interpreter {
    pcall: Function,
    xpcall: Function,
    traceback: Function,
    lua: Lua,
}

impl Interpreter {
    /// Create the engine and open the full standard library, `debug` included
    pub fn start() -> mlua::Result<Self> {
        // SAFETY: configuration scripts are trusted code supplied by the operator;
        // the unrestricted library set (debug, C modules) is what they expect.
        let lua = unsafe { Lua::unsafe_new() };

        let globals = lua.globals();
        let pcall: Function = globals.get("pcall")?;
        let xpcall: Function = globals.get("xpcall")?;
        let traceback = traceback_handler(&lua)?;
        drop(globals);

        debug!("lua engine started");
        Ok(Self {
            pcall,
            xpcall,
            traceback,
            lua,
        })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Let scripts `require` modules that live in `dir`
    pub fn extend_package_path(&self, dir: &Path) -> mlua::Result<()> {
        let package: Table = self.lua.globals().get("package")?;
        let current: String = package.get("path")?;
        let path = format!("{}/?.lua;{}", dir.display(), current);
        package.set("path", path)?;
        debug!(dir = %dir.display(), "extended package.path");
        Ok(())
    }

    /// Run `chunk` to completion; the error is the engine's message as-is
    pub fn call(&self, chunk: &Function) -> Result<(), String> {
        let results: MultiValue = self
            .pcall
            .call(chunk.clone())
            .map_err(|e| diagnostic(&e))?;
        self.outcome(results)
    }

    /// Run `chunk` to completion; the error carries the call stack at the point of failure
    pub fn call_with_traceback(&self, chunk: &Function) -> Result<(), String> {
        let results: MultiValue = self
            .xpcall
            .call((chunk.clone(), self.traceback.clone()))
            .map_err(|e| diagnostic(&e))?;
        self.outcome(results)
    }

    fn outcome(&self, results: MultiValue) -> Result<(), String> {
        let mut results = results.into_iter();
        match results.next() {
            Some(Value::Boolean(false)) => {
                Err(error_text(&self.lua, results.next().unwrap_or(Value::Nil)))
            }
            _ => Ok(()),
        }
    }

    /// Release the engine and everything it owns
    pub fn stop(self) {
        let Self {
            pcall,
            xpcall,
            traceback,
            lua,
        } = self;
        drop((pcall, xpcall, traceback));
        drop(lua);
        debug!("lua engine stopped");
    }
}

/// Message handler for `xpcall`: stringify the error, then append the call stack
fn traceback_handler(lua: &Lua) -> mlua::Result<Function> {
    let traceback: Function = lua.globals().get::<Table>("debug")?.get("traceback")?;
    lua.create_function(move |lua, err: Value| {
        let message = error_text(lua, err);
        traceback.call::<String>((message, 2))
    })
}

/// Render an error object the way the standalone interpreter does
fn error_text(lua: &Lua, value: Value) -> String {
    match value {
        Value::Error(e) => diagnostic(&e),
        Value::Table(table) => {
            let tostring = table
                .metatable()
                .and_then(|mt| mt.get::<Function>("__tostring").ok());
            match tostring.map(|f| f.call::<String>(table)) {
                Some(Ok(text)) => text,
                _ => "(error object is a table value)".to_string(),
            }
        }
        other => {
            let type_name = other.type_name();
            match lua.coerce_string(other) {
                Ok(Some(s)) => s.to_string_lossy().to_string(),
                _ => format!("(error object is a {} value)", type_name),
            }
        }
    }
}
