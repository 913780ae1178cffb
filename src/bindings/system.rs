use mlua::{Lua, Table};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use super::CapabilityModule;

/// `ifsys`: process and environment access for configuration scripts
pub struct SystemModule;

fn shell(command: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    cmd
}

fn exit_status(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

impl CapabilityModule for SystemModule {
    fn name(&self) -> &'static str {
        "ifsys"
    }

    fn build(&self, lua: &Lua) -> mlua::Result<Table> {
        let module = lua.create_table()?;

        module.set(
            "sleep",
            lua.create_function(|_, seconds: f64| {
                if seconds.is_sign_negative() || !seconds.is_finite() {
                    return Err(mlua::Error::RuntimeError(format!(
                        "invalid sleep duration {}",
                        seconds
                    )));
                }
                std::thread::sleep(Duration::from_secs_f64(seconds));
                Ok(())
            })?,
        )?;

        module.set(
            "getenv",
            lua.create_function(|_, name: String| Ok(std::env::var(name).ok()))?,
        )?;

        // Returns the exit status and everything the command wrote to stdout
        module.set(
            "popen",
            lua.create_function(|_, command: String| {
                let output = shell(&command)
                    .stdin(Stdio::null())
                    .stderr(Stdio::inherit())
                    .output()
                    .map_err(mlua::Error::external)?;
                Ok((
                    exit_status(output.status),
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                ))
            })?,
        )?;

        // Feeds `data` to the command's stdin and returns its exit status
        module.set(
            "pipe_to",
            lua.create_function(|_, (command, data): (String, mlua::String)| {
                let mut child = shell(&command)
                    .stdin(Stdio::piped())
                    .spawn()
                    .map_err(mlua::Error::external)?;
                // A command may exit without reading all of its input
                let written = match child.stdin.take() {
                    Some(mut stdin) => match stdin.write_all(&data.as_bytes()) {
                        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                        _ => Ok(()),
                    },
                    None => Ok(()),
                };
                let status = child.wait().map_err(mlua::Error::external)?;
                written.map_err(mlua::Error::external)?;
                Ok(exit_status(status))
            })?,
        )?;

        Ok(module)
    }
}
