pub mod host;
pub mod pattern;
pub mod system;

use mlua::{Lua, Table};
use tracing::debug;

use crate::error::ConfigError;
use crate::interpreter::Interpreter;
use crate::options::OPTIONS_GLOBAL;

/// Globals a capability module may never replace
const PROTECTED_GLOBALS: &[&str] = &[
    "_G",
    "_VERSION",
    "coroutine",
    "debug",
    "io",
    "math",
    "os",
    "package",
    "string",
    "table",
    "utf8",
    OPTIONS_GLOBAL,
];

/// A named bundle of host functions installed as one global table
pub trait CapabilityModule {
    /// Global name the module is bound under
    fn name(&self) -> &'static str;

    /// Build the table of bindings
    fn build(&self, lua: &Lua) -> mlua::Result<Table>;
}

/// Install a module under its name, replacing any earlier binding of that name
pub fn register(interp: &Interpreter, module: &dyn CapabilityModule) -> Result<(), ConfigError> {
    let name = module.name();
    if PROTECTED_GLOBALS.contains(&name) {
        return Err(ConfigError::Registration {
            module: name.to_string(),
            reason: "name collides with a protected global".to_string(),
        });
    }

    let lua = interp.lua();
    let table = module
        .build(lua)
        .map_err(|e| ConfigError::Registration {
            module: name.to_string(),
            reason: crate::error::diagnostic(&e),
        })?;
    lua.globals().set(name, table)?;

    debug!(module = name, "registered capability module");
    Ok(())
}

pub fn register_all(
    interp: &Interpreter,
    modules: &[&dyn CapabilityModule],
) -> Result<(), ConfigError> {
    for module in modules {
        register(interp, *module)?;
    }
    Ok(())
}
