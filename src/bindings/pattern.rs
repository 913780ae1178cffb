use mlua::{Lua, Table, Value, Variadic};
use regex::Regex;

use super::CapabilityModule;

/// `ifre`: regular expression matching
pub struct PatternModule;

impl CapabilityModule for PatternModule {
    fn name(&self) -> &'static str {
        "ifre"
    }

    fn build(&self, lua: &Lua) -> mlua::Result<Table> {
        let module = lua.create_table()?;

        // search(pattern, subject) -> matched, capture1, capture2, ...
        module.set(
            "search",
            lua.create_function(|lua, (pattern, subject): (String, String)| {
                let re = Regex::new(&pattern)
                    .map_err(|e| mlua::Error::RuntimeError(format!("bad pattern: {}", e)))?;

                let mut results = vec![];
                match re.captures(&subject) {
                    None => results.push(Value::Boolean(false)),
                    Some(caps) => {
                        results.push(Value::Boolean(true));
                        for group in caps.iter().skip(1) {
                            results.push(match group {
                                Some(m) => Value::String(lua.create_string(m.as_str())?),
                                None => Value::Nil,
                            });
                        }
                    }
                }
                Ok(Variadic::from_iter(results))
            })?,
        )?;

        module.set(
            "escape",
            lua.create_function(|_, text: String| Ok(regex::escape(&text)))?,
        )?;

        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::register;
    use crate::interpreter::Interpreter;

    fn interp() -> Interpreter {
        let interp = Interpreter::start().unwrap();
        register(&interp, &PatternModule).unwrap();
        interp
    }

    #[test]
    fn search_returns_captures() {
        let interp = interp();
        let (matched, user, domain): (bool, String, String) = interp
            .lua()
            .load(r#"return ifre.search("(\\w+)@([\\w.]+)", "From: bob@example.org")"#)
            .eval()
            .unwrap();
        assert!(matched);
        assert_eq!(user, "bob");
        assert_eq!(domain, "example.org");
    }

    #[test]
    fn search_without_match_returns_false_only() {
        let interp = interp();
        let count: i64 = interp
            .lua()
            .load(r##"return select("#", ifre.search("^x", "abc"))"##)
            .eval()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn bad_pattern_raises() {
        let interp = interp();
        let err = interp
            .lua()
            .load(r#"ifre.search("(", "abc")"#)
            .exec()
            .unwrap_err();
        assert!(err.to_string().contains("bad pattern"));
    }

    #[test]
    fn escape_quotes_metacharacters() {
        let interp = interp();
        let matched: bool = interp
            .lua()
            .load(r#"return (ifre.search(ifre.escape("a.b"), "a.b"))"#)
            .eval()
            .unwrap();
        assert!(matched);
    }
}
