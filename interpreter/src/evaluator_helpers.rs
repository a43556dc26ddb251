use crate::runtime_value::{Fragment, Value};

/// Split `user.address.city` into `("user", "address.city")`.
pub fn split_path(name: &str) -> Option<(&str, &str)> {
    name.split_once('.')
        .filter(|(head, path)| !head.is_empty() && !path.is_empty())
}

/// Walk `path` into an evaluated argument. Only an argument that evaluated
/// to exactly one host value can be walked.
pub fn select_path(fragments: Vec<Fragment>, path: &str) -> Option<Vec<Fragment>> {
    let [Fragment::Value(value)] = <[Fragment; 1]>::try_from(fragments).ok()? else {
        return None;
    };
    value.get_path(path).cloned().map(Value::into_fragments)
}

/// The value a fragment stands for when handed back to host code.
pub fn fragment_value(fragment: Fragment) -> Value {
    match fragment {
        Fragment::Text(s) | Fragment::Error(s) => Value::Text(s),
        Fragment::Value(value) => value,
    }
}
