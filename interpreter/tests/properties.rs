//! Property-based tests for definition-free templates.

use interpreter::{Bindings, Template};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Bound(usize),
    Unbound(String),
}

fn part_strategy() -> impl Strategy<Value = Part> {
    prop_oneof![
        "[a-z.,!?<>/]{1,5}".prop_map(Part::Text),
        (0usize..4).prop_map(Part::Bound),
        "missing[a-z]{1,3}".prop_map(Part::Unbound),
    ]
}

fn value_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9 ]{0,8}", 4)
}

fn source_of(parts: &[Part]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => text.clone(),
            Part::Bound(index) => format!("[var{}]", index),
            Part::Unbound(name) => format!("[{}]", name),
        })
        .collect()
}

proptest! {
    #[test]
    fn substitution_without_definitions(
        parts in prop::collection::vec(part_strategy(), 0..12),
        values in value_strategy(),
    ) {
        let bindings: Bindings = values
            .iter()
            .enumerate()
            .map(|(i, value)| (format!("var{}", i), value.clone()))
            .collect();

        let expected: String = parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => text.clone(),
                Part::Bound(index) => values[*index].clone(),
                Part::Unbound(name) => format!("[{} not found]", name),
            })
            .collect();

        let template = Template::new(&source_of(&parts)).expect("generated source parses");
        prop_assert_eq!(template.render(&bindings), expected);
    }

    #[test]
    fn rendering_is_repeatable(
        parts in prop::collection::vec(part_strategy(), 0..12),
        values in value_strategy(),
    ) {
        let bindings: Bindings = values
            .iter()
            .enumerate()
            .map(|(i, value)| (format!("var{}", i), value.clone()))
            .collect();
        let template = Template::new(&source_of(&parts)).expect("generated source parses");
        prop_assert_eq!(template.render(&bindings), template.render(&bindings));
    }
}
