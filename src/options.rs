use mlua::{Lua, Table, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::interpreter::Interpreter;

/// Global name the options table is bound under
pub const OPTIONS_GLOBAL: &str = "options";

/// A value that can be stored in the options table
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl OptionValue {
    /// Read a Lua value without coercion; anything else is not an option value
    fn from_lua(value: &Value) -> Option<OptionValue> {
        match value {
            Value::Boolean(b) => Some(OptionValue::Boolean(*b)),
            Value::Integer(i) => Some(OptionValue::Number(*i as f64)),
            Value::Number(n) => Some(OptionValue::Number(*n)),
            Value::String(s) => Some(OptionValue::String(s.to_string_lossy().to_string())),
            _ => None,
        }
    }
}

/// Documented defaults, seeded before any script runs
pub const DEFAULT_OPTIONS: &[(&str, DefaultValue)] = &[
    ("certificates", DefaultValue::Boolean(true)),
    ("create", DefaultValue::Boolean(false)),
    ("expunge", DefaultValue::Boolean(true)),
    ("hostnames", DefaultValue::Boolean(true)),
    ("keepalive", DefaultValue::Number(29.0)),
    ("namespace", DefaultValue::Boolean(true)),
    ("persist", DefaultValue::Boolean(false)),
    ("recover", DefaultValue::String("all")),
    ("reenter", DefaultValue::Boolean(true)),
    ("starttls", DefaultValue::Boolean(true)),
    ("subscribe", DefaultValue::Boolean(false)),
    ("timeout", DefaultValue::Number(60.0)),
    ("wakeonany", DefaultValue::Boolean(false)),
];

/// Compile-time form of [`OptionValue`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Boolean(bool),
    Number(f64),
    String(&'static str),
}

/// Create the options table, seed it and bind it as `options`.
///
/// `dryrun` is the one entry that comes from the host instead of a literal.
pub fn init_defaults(interp: &Interpreter, dryrun: bool) -> mlua::Result<()> {
    let lua = interp.lua();
    let table = lua.create_table()?;

    for (name, value) in DEFAULT_OPTIONS {
        match *value {
            DefaultValue::Boolean(b) => set_boolean(&table, name, b)?,
            DefaultValue::Number(n) => set_number(&table, name, n)?,
            DefaultValue::String(s) => set_string(&table, name, s)?,
        }
    }
    set_boolean(&table, "dryrun", dryrun)?;

    lua.globals().set(OPTIONS_GLOBAL, table)?;
    debug!(count = DEFAULT_OPTIONS.len() + 1, dryrun, "seeded default options");
    Ok(())
}

pub fn set_boolean(table: &Table, name: &str, value: bool) -> mlua::Result<()> {
    table.set(name, value)
}

pub fn set_number(table: &Table, name: &str, value: f64) -> mlua::Result<()> {
    table.set(name, value)
}

pub fn set_string(table: &Table, name: &str, value: &str) -> mlua::Result<()> {
    table.set(name, value)
}

/// Look up `name` in the current options table; nil if either is missing
fn lookup(lua: &Lua, name: &str) -> Value {
    match lua.globals().get::<Value>(OPTIONS_GLOBAL) {
        Ok(Value::Table(table)) => table.get::<Value>(name).unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}

/// Lua truthiness: only nil and false are false
pub fn get_boolean(interp: &Interpreter, name: &str) -> bool {
    !matches!(lookup(interp.lua(), name), Value::Nil | Value::Boolean(false))
}

/// Lua numeric coercion; anything not convertible reads as 0
pub fn get_number(interp: &Interpreter, name: &str) -> f64 {
    let lua = interp.lua();
    match lua.coerce_number(lookup(lua, name)) {
        Ok(Some(n)) => n,
        _ => 0.0,
    }
}

/// Lua string coercion; anything not convertible reads as ""
pub fn get_string(interp: &Interpreter, name: &str) -> String {
    let lua = interp.lua();
    match lua.coerce_string(lookup(lua, name)) {
        Ok(Some(s)) => s.to_string_lossy().to_string(),
        _ => String::new(),
    }
}

/// Every option currently holding a boolean, number or string
pub fn snapshot(interp: &Interpreter) -> BTreeMap<String, OptionValue> {
    let mut entries = BTreeMap::new();
    let Ok(Value::Table(table)) = interp.lua().globals().get::<Value>(OPTIONS_GLOBAL) else {
        return entries;
    };
    for pair in table.pairs::<Value, Value>() {
        let Ok((Value::String(key), value)) = pair else {
            continue;
        };
        if let Some(value) = OptionValue::from_lua(&value) {
            entries.insert(key.to_string_lossy().to_string(), value);
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(dryrun: bool) -> Interpreter {
        let interp = Interpreter::start().unwrap();
        init_defaults(&interp, dryrun).unwrap();
        interp
    }

    #[test]
    fn defaults_are_visible_before_any_script() {
        let interp = seeded(false);
        assert!(get_boolean(&interp, "expunge"));
        assert!(!get_boolean(&interp, "create"));
        assert_eq!(get_number(&interp, "timeout"), 60.0);
        assert_eq!(get_number(&interp, "keepalive"), 29.0);
        assert_eq!(get_string(&interp, "recover"), "all");
    }

    #[test]
    fn dryrun_follows_host_flag() {
        assert!(get_boolean(&seeded(true), "dryrun"));
        assert!(!get_boolean(&seeded(false), "dryrun"));

        let interp = seeded(true);
        interp.lua().load("options.dryrun = false").exec().unwrap();
        assert!(!get_boolean(&interp, "dryrun"));
    }

    #[test]
    fn getters_degrade_to_zero_values() {
        let interp = seeded(false);
        assert_eq!(get_string(&interp, "never_set"), "");
        assert_eq!(get_number(&interp, "never_set"), 0.0);
        assert!(!get_boolean(&interp, "never_set"));

        // a table is not coercible to either
        interp.lua().load("options.recover = {}").exec().unwrap();
        assert_eq!(get_string(&interp, "recover"), "");
        assert_eq!(get_number(&interp, "recover"), 0.0);
    }

    #[test]
    fn getters_apply_lua_coercion() {
        let interp = seeded(false);
        interp
            .lua()
            .load(
                r#"
                options.expunge = 0
                options.timeout = "120"
                options.recover = 5
                "#,
            )
            .exec()
            .unwrap();

        // 0 is truthy in Lua
        assert!(get_boolean(&interp, "expunge"));
        assert_eq!(get_number(&interp, "timeout"), 120.0);
        assert_eq!(get_string(&interp, "recover"), "5");
    }

    #[test]
    fn missing_options_table_is_tolerated() {
        let interp = seeded(false);
        interp.lua().load("options = nil").exec().unwrap();
        assert!(!get_boolean(&interp, "expunge"));
        assert_eq!(get_number(&interp, "timeout"), 0.0);
        assert!(snapshot(&interp).is_empty());
    }

    #[test]
    fn snapshot_skips_non_scalar_entries() {
        let interp = seeded(true);
        interp
            .lua()
            .load("options.hook = function() end; options.limit = 3")
            .exec()
            .unwrap();
        let entries = snapshot(&interp);
        assert_eq!(entries.len(), DEFAULT_OPTIONS.len() + 2);
        assert_eq!(entries["dryrun"], OptionValue::Boolean(true));
        assert_eq!(entries["limit"], OptionValue::Number(3.0));
        assert_eq!(entries["recover"], OptionValue::String("all".to_string()));
        assert!(!entries.contains_key("hook"));
    }
}
