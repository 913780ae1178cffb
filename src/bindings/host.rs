use mlua::{Lua, Table};

use super::CapabilityModule;

/// `ifcore`: facts about the host and a bridge into its log
pub struct CoreModule {
    pub dryrun: bool,
}

impl CapabilityModule for CoreModule {
    fn name(&self) -> &'static str {
        "ifcore"
    }

    fn build(&self, lua: &Lua) -> mlua::Result<Table> {
        let module = lua.create_table()?;
        module.set("version", env!("CARGO_PKG_VERSION"))?;

        let dryrun = self.dryrun;
        module.set("dryrun", lua.create_function(move |_, ()| Ok(dryrun))?)?;

        module.set(
            "log",
            lua.create_function(|_, (level, message): (String, String)| {
                match level.as_str() {
                    "error" => tracing::error!(target: "script", "{}", message),
                    "warn" => tracing::warn!(target: "script", "{}", message),
                    "info" => tracing::info!(target: "script", "{}", message),
                    "debug" => tracing::debug!(target: "script", "{}", message),
                    "trace" => tracing::trace!(target: "script", "{}", message),
                    other => {
                        return Err(mlua::Error::RuntimeError(format!(
                            "unknown log level '{}'",
                            other
                        )));
                    }
                }
                Ok(())
            })?,
        )?;

        Ok(module)
    }
}
