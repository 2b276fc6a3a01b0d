//! Value bridge: interpreter values out to [`HostValue`].
//!
//! Conversion is infallible — every interpreter value maps to some
//! `HostValue`, with types that have no host equivalent (functions,
//! userdata, threads) mapped to a diagnostic placeholder string. All
//! functions here run on the owner thread; nothing retains interpreter
//! references past the conversion.

use std::collections::HashMap;
use std::ffi::c_void;

use mlua::{Table, Value};

use luahost_types::HostValue;

/// Convert an interpreter value into a host value.
pub(crate) fn host_value(value: Value) -> HostValue {
    convert(value, &mut Vec::new())
}

/// `visiting` holds the table identities of the current ancestor chain; a
/// table that shows up in its own ancestry converts to a `<cycle>`
/// placeholder instead of recursing forever.
fn convert(value: Value, visiting: &mut Vec<*const c_void>) -> HostValue {
    match value {
        Value::Nil => HostValue::Nil,
        Value::Boolean(b) => HostValue::Boolean(b),
        // The interpreter's integer subtype is preserved exactly; everything
        // else it calls a number becomes a float
        Value::Integer(i) => HostValue::Integer(i),
        Value::Number(n) => HostValue::Float(n),
        // Length-prefixed bytes: embedded NULs survive, invalid UTF-8 is
        // replaced
        Value::String(s) => {
            HostValue::String(String::from_utf8_lossy(&s.as_bytes()).into_owned())
        }
        Value::Table(table) => convert_table(table, visiting),
        other => HostValue::String(format!("<unsupported Lua type: {}>", other.type_name())),
    }
}

fn convert_table(table: Table, visiting: &mut Vec<*const c_void>) -> HostValue {
    let identity = table.to_pointer();
    if visiting.contains(&identity) {
        return HostValue::String("<cycle>".to_owned());
    }
    visiting.push(identity);

    let mut entries: HashMap<HostValue, HostValue> = HashMap::new();
    for (key, value) in table.pairs::<Value, Value>().flatten() {
        let key = convert(key, visiting);
        let value = convert(value, visiting);
        entries.insert(key, value);
    }

    visiting.pop();

    // A table whose keys are exactly the integers 1..=N is an array, in key
    // order. An empty table is an empty array.
    if entries.is_empty() {
        return HostValue::Array(Vec::new());
    }
    let len = entries.len() as i64;
    let dense = (1..=len).all(|i| entries.contains_key(&HostValue::Integer(i)));
    if dense {
        let items = (1..=len)
            .map(|i| {
                entries
                    .remove(&HostValue::Integer(i))
                    .unwrap_or(HostValue::Nil)
            })
            .collect();
        HostValue::Array(items)
    } else {
        HostValue::Table(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Lua;

    fn eval(lua: &Lua, code: &str) -> HostValue {
        host_value(lua.load(code).eval::<Value>().expect("eval failed"))
    }

    #[test]
    fn scalars() {
        let lua = Lua::new();
        assert_eq!(eval(&lua, "return nil"), HostValue::Nil);
        assert_eq!(eval(&lua, "return true"), HostValue::Boolean(true));
        assert_eq!(eval(&lua, "return 42"), HostValue::Integer(42));
        assert_eq!(eval(&lua, "return 3.14"), HostValue::Float(3.14));
        assert_eq!(eval(&lua, "return 'hello'"), HostValue::from("hello"));
    }

    #[test]
    fn integer_subtype_is_preserved() {
        let lua = Lua::new();
        // Same numeric value, different interpreter subtype
        assert_eq!(eval(&lua, "return 10"), HostValue::Integer(10));
        assert_eq!(eval(&lua, "return 10.0"), HostValue::Float(10.0));
        assert_eq!(eval(&lua, "return 7 // 2"), HostValue::Integer(3));
        assert_eq!(eval(&lua, "return 7 / 2"), HostValue::Float(3.5));
    }

    #[test]
    fn strings_keep_embedded_nul_bytes() {
        let lua = Lua::new();
        assert_eq!(eval(&lua, "return 'a\\0b'"), HostValue::from("a\0b"));
        assert_eq!(eval(&lua, "return #'a\\0b'"), HostValue::Integer(3));
    }

    #[test]
    fn dense_table_becomes_array() {
        let lua = Lua::new();
        assert_eq!(
            eval(&lua, "return {10, 20, 30}"),
            HostValue::Array(vec![
                HostValue::Integer(10),
                HostValue::Integer(20),
                HostValue::Integer(30),
            ])
        );
    }

    #[test]
    fn empty_table_becomes_empty_array() {
        let lua = Lua::new();
        assert_eq!(eval(&lua, "return {}"), HostValue::Array(Vec::new()));
    }

    #[test]
    fn gapped_or_keyed_tables_become_maps() {
        let lua = Lua::new();

        let gapped = eval(&lua, "return {[1] = 'a', [3] = 'c'}");
        let entries = gapped.as_table().expect("expected a table");
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.get(&HostValue::Integer(3)),
            Some(&HostValue::from("c"))
        );

        let keyed = eval(&lua, "return {a = 'a', b = 'b'}");
        let entries = keyed.as_table().expect("expected a table");
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.get(&HostValue::from("a")),
            Some(&HostValue::from("a"))
        );

        // One string key disqualifies the dense integer run
        let mixed = eval(&lua, "return {1, 2, x = 3}");
        let entries = mixed.as_table().expect("expected a table");
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.get(&HostValue::Integer(2)),
            Some(&HostValue::Integer(2))
        );
    }

    #[test]
    fn nested_tables_convert_recursively() {
        let lua = Lua::new();
        let value = eval(&lua, "return {inner = {1, {flag = true}}}");
        let outer = value.as_table().expect("expected a table");
        let inner = outer
            .get(&HostValue::from("inner"))
            .and_then(|v| v.as_array())
            .expect("expected inner array");
        assert_eq!(inner[0], HostValue::Integer(1));
        assert_eq!(
            inner[1].get(&HostValue::from("flag")),
            Some(&HostValue::Boolean(true))
        );
    }

    #[test]
    fn self_referential_table_yields_cycle_placeholder() {
        let lua = Lua::new();
        let value = eval(&lua, "local t = {} t.me = t return t");
        let entries = value.as_table().expect("expected a table");
        assert_eq!(
            entries.get(&HostValue::from("me")),
            Some(&HostValue::from("<cycle>"))
        );
    }

    #[test]
    fn shared_but_acyclic_table_converts_twice() {
        let lua = Lua::new();
        let value = eval(&lua, "local shared = {1} return {shared, shared}");
        let items = value.as_array().expect("expected an array");
        assert_eq!(items[0], HostValue::Array(vec![HostValue::Integer(1)]));
        assert_eq!(items[0], items[1]);
    }

    #[test]
    fn unbridgeable_types_become_placeholders() {
        let lua = Lua::new();
        assert_eq!(
            eval(&lua, "return print"),
            HostValue::from("<unsupported Lua type: function>")
        );
        assert_eq!(
            eval(&lua, "return coroutine.create(function() end)"),
            HostValue::from("<unsupported Lua type: thread>")
        );
    }
}
