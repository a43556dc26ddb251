//! Built-in blocks available to every template.
//!
//! They are ordinary native blocks: each reads its arguments through the
//! interpreter exactly as a host-provided block would.

use crate::bindings::Bindings;
use crate::error::EvalError;
use crate::evaluator::Interpreter;
use crate::evaluator_helpers::fragment_value;
use crate::runtime_value::Fragment;

/// The runtime library as a bindings layer.
pub fn library() -> Bindings {
    Bindings::new()
        // Escapes for characters the grammar reserves.
        .with("(", "[")
        .with(")", "]")
        .with("Sp", " ")
        .with_native("If", if_block)
        .with_native("List", list)
        .with_native("Split", split)
        .with_native("PairTag", pair_tag)
        .with_native("EmptyTag", empty_tag)
        .with_native("Link", link)
        .with_native("Item", |ip: &mut Interpreter<'_>| wrap(ip, "li"))
        .with_native("ItemList", |ip: &mut Interpreter<'_>| wrap(ip, "ul"))
}

// ----- Control -----

/// `[If [condition] Then=[...] Else=[...]]`
fn if_block(ip: &mut Interpreter<'_>) -> Vec<Fragment> {
    let branch = if ip.get_boolean("#") { "Then" } else { "Else" };
    ip.get_value(branch).unwrap_or_default()
}

/// `[List Seq=[...] Sep=[...] IfEmpty=[...] [body]]`
///
/// Evaluates the body once per fragment of `Seq` with `Item`, `Order`,
/// `First`, `Last`, `Odd` and `Even` bound. Error markers inside `Seq` are
/// passed through and not iterated.
fn list(ip: &mut Interpreter<'_>) -> Vec<Fragment> {
    let seq = ip.get_value("Seq").unwrap_or_default();
    let (mut out, items): (Vec<Fragment>, Vec<Fragment>) =
        seq.into_iter().partition(Fragment::is_error);

    if items.is_empty() {
        out.extend(ip.get_value("IfEmpty").unwrap_or_default());
        return out;
    }

    let separator = ip.get_value("Sep").unwrap_or_default();
    let count = items.len();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.extend(separator.iter().cloned());
        }
        let scope = Bindings::new()
            .with("Item", fragment_value(item))
            .with("Order", (i + 1) as i64)
            .with("First", i == 0)
            .with("Last", i + 1 == count)
            .with("Odd", i % 2 == 0)
            .with("Even", i % 2 == 1);
        let body = ip.with_bindings(scope, |ip| ip.get_value("#").unwrap_or_default());
        out.extend(body);
    }
    out
}

/// `[Split Sep=[,] [a,b,c]]` yields one fragment per piece.
fn split(ip: &mut Interpreter<'_>) -> Vec<Fragment> {
    let content = ip.get_string("#");
    let separator = ip.get_string("Sep");
    if separator.is_empty() {
        return vec![Fragment::Text(content)];
    }
    content.split(separator.as_str()).map(Fragment::text).collect()
}

// ----- Markup -----

/// `[PairTag Name=[div] Required=[id] Optional=[class] id=[...] [content]]`
fn pair_tag(ip: &mut Interpreter<'_>) -> Vec<Fragment> {
    let (name, attributes) = match tag_head(ip) {
        Ok(head) => head,
        Err(err) => return vec![ip.error(err)],
    };
    let mut out = vec![Fragment::Text(format!("<{}{}>", name, attributes))];
    out.extend(ip.get_value("#").unwrap_or_default());
    out.push(Fragment::Text(format!("</{}>", name)));
    out
}

/// `[EmptyTag Name=[img] Required=[src] src=[...]]`
fn empty_tag(ip: &mut Interpreter<'_>) -> Vec<Fragment> {
    match tag_head(ip) {
        Ok((name, attributes)) => vec![Fragment::Text(format!("<{}{}/>", name, attributes))],
        Err(err) => vec![ip.error(err)],
    }
}

/// `[Link Target=[url] [caption]]`; the caption defaults to the target.
fn link(ip: &mut Interpreter<'_>) -> Vec<Fragment> {
    let target = ip.get_string("Target");
    let caption = ip
        .get_value("#")
        .filter(|fragments| !fragments.is_empty())
        .unwrap_or_else(|| vec![Fragment::Text(target.clone())]);

    let mut out = vec![Fragment::Text(format!(
        "<a href=\"{}\">",
        escape_html(&target)
    ))];
    out.extend(caption);
    out.push(Fragment::text("</a>"));
    out
}

fn wrap(ip: &mut Interpreter<'_>, tag: &str) -> Vec<Fragment> {
    let mut out = vec![Fragment::Text(format!("<{}>", tag))];
    out.extend(ip.get_value("#").unwrap_or_default());
    out.push(Fragment::Text(format!("</{}>", tag)));
    out
}

/// Validated tag name and rendered attribute list.
fn tag_head(ip: &mut Interpreter<'_>) -> Result<(String, String), EvalError> {
    let name = ip.get_string("Name").trim().to_string();
    if name.is_empty() {
        return Err(EvalError::Validation("missing tag name".to_string()));
    }
    if !is_valid_tag_name(&name) {
        return Err(EvalError::Validation(format!(
            "tag name \"{}\" invalid",
            name
        )));
    }

    let mut attributes = Vec::new();
    for attribute in attribute_names(&ip.get_string("Required")) {
        let value = ip.get_string(&attribute);
        if value.is_empty() {
            return Err(EvalError::Validation(format!(
                "required attribute \"{}\" is missing",
                attribute
            )));
        }
        attributes.push((attribute, value));
    }
    for attribute in attribute_names(&ip.get_string("Optional")) {
        let value = ip.get_string(&attribute);
        attributes.push((attribute, value));
    }

    Ok((name, join_attributes(&attributes)))
}

fn attribute_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// `name` or `prefix:name`, ASCII letters and digits only.
fn is_valid_tag_name(name: &str) -> bool {
    let part_ok = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
    match name.split_once(':') {
        Some((prefix, local)) => part_ok(prefix) && part_ok(local),
        None => part_ok(name),
    }
}

/// ` key="value"` for every attribute with a non-empty value.
fn join_attributes(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_html(value)))
        .collect()
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('>', "&gt;")
        .replace('<', "&lt;")
}
