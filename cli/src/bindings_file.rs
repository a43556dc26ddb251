use std::path::Path;

use interpreter::{Bindings, Value};

/// Convert a TOML value to a template value.
/// Tables become maps, arrays become lists, datetimes are kept as text.
pub fn toml_to_value(val: &toml::Value) -> Value {
    match val {
        toml::Value::String(s) => Value::Text(s.clone()),
        toml::Value::Integer(n) => Value::Integer(*n),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(items) => Value::List(items.iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => table
            .iter()
            .map(|(key, value)| (key.clone(), toml_to_value(value)))
            .collect(),
        other => Value::Text(other.to_string()),
    }
}

/// Top-level keys of a TOML table as bindings.
pub fn table_to_bindings(table: &toml::Table) -> Bindings {
    table
        .iter()
        .map(|(key, value)| (key.clone(), toml_to_value(value)))
        .collect()
}

/// Load bindings from a TOML file.
pub fn load(path: &Path) -> Result<Bindings, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| format!("invalid bindings file '{}': {}", path.display(), e))?;
    Ok(table_to_bindings(&table))
}

/// Parse a command line value.
/// Integers and floats become numbers, "true"/"false" become booleans,
/// everything else is text.
pub fn parse_arg(s: &str) -> Value {
    if let Ok(n) = s.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Text(s.to_string()),
    }
}

/// Split a `--set KEY=VALUE` argument.
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key.to_string(), parse_arg(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_from_arguments() {
        assert_eq!(parse_arg("42"), Value::Integer(42));
        assert_eq!(parse_arg("2.5"), Value::Float(2.5));
        assert_eq!(parse_arg("true"), Value::Bool(true));
        assert_eq!(parse_arg("Pepa"), Value::Text("Pepa".into()));
    }

    #[test]
    fn assignments() {
        let (key, value) = parse_assignment("name=Joe Doe").unwrap();
        assert_eq!(key, "name");
        assert_eq!(value, Value::Text("Joe Doe".into()));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn tables_become_maps() {
        let table: toml::Table = toml::from_str(
            r#"
            title = "Menu"
            items = ["a", "b"]
            [user]
            nickname = "pepa"
            age = 7
            "#,
        )
        .unwrap();
        let bindings = table_to_bindings(&table);
        assert_eq!(bindings.get("title"), Some(&Value::Text("Menu".into())));
        assert_eq!(
            bindings.get("items"),
            Some(&Value::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            bindings.lookup("user.nickname"),
            Some(&Value::Text("pepa".into()))
        );
        assert_eq!(bindings.lookup("user.age"), Some(&Value::Integer(7)));
    }
}
