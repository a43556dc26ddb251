use std::collections::BTreeMap;
use std::time::Instant;

use interpreter::{
    Bindings, ErrorFormatter, EvalError, Fragment, Interpreter, MAX_RECURSION_LIMIT,
    RenderOptions, Template, Value,
};

fn run(source: &str) -> String {
    run_with(source, &Bindings::new())
}

fn run_with(source: &str, bindings: &Bindings) -> String {
    interpreter::render(source, bindings).expect("parse failed")
}

fn user() -> Value {
    [("nickname", Value::from("spide")), ("age", Value::from(26))]
        .into_iter()
        .collect()
}

// ----- Substitution -----

#[test]
fn place_variable() {
    let bindings = Bindings::new().with("name", "world");
    assert_eq!(run_with("Hello [name]!", &bindings), "Hello world!");
}

#[test]
fn dotted_names_walk_maps() {
    let bindings = Bindings::new().with("user", user());
    assert_eq!(
        run_with("[user.nickname]([user.age])", &bindings),
        "spide(26)"
    );
}

#[test]
fn one_element_list_is_unwrapped_on_path() {
    let bindings = Bindings::new().with("user", Value::List(vec![user()]));
    assert_eq!(run_with("[user.nickname]", &bindings), "spide");
}

#[test]
fn list_values_render_every_element() {
    let bindings = Bindings::new().with("names", vec!["a", "b", "c"]);
    assert_eq!(run_with("[names]", &bindings), "abc");
}

#[test]
fn value_display() {
    let bindings = Bindings::new()
        .with("half", 2.5)
        .with("whole", 3.0)
        .with("yes", true);
    assert_eq!(run_with("[half] [whole] [yes]", &bindings), "2.5 3 true");
}

#[test]
fn comment() {
    assert_eq!(run("aaa[*comment[*]bbb"), "aaabbb");
}

#[test]
fn space_after_comment_is_kept() {
    let bindings = Bindings::new().with("x", 1);
    assert_eq!(run_with("a[* c *] [x]", &bindings), "a 1");
}

#[test]
fn escaping() {
    assert_eq!(run("[(]1[)]"), "[1]");
    assert_eq!(run("a[Sp]b"), "a b");
}

#[test]
fn bindings_shadow_the_library() {
    let bindings = Bindings::new().with("Sp", "_");
    assert_eq!(run_with("a[Sp]b", &bindings), "a_b");
}

// ----- Not found -----

#[test]
fn not_found() {
    assert_eq!(run("[a] [b c=[d]]"), "[a not found] [b not found]");
}

#[test]
fn argument_of_caller_scope() {
    let source = "
        [Greeting:=[Hello [name]!]]
        [Greeting name=[[name]]]
    ";
    assert_eq!(run(source), "Hello [name not found]!");
}

// ----- Definitions -----

#[test]
fn define_template() {
    let source = "
        [Html :=[
            <html>[Header][Body]</html>
            ] Header=[
                <head><title>[Title]</title></head>
            ] Body=[
                <body>[#]</body>
            ]
        ]
        [Html Title=[New page] [Hello world!]]
    ";
    assert_eq!(
        run(source),
        "<html><head><title>New page</title></head><body>Hello world!</body></html>"
    );
}

#[test]
fn default_used_when_argument_missing() {
    assert_eq!(run("[Box:=[[title]] title=[xxx]][Box][Box title=[yyy]]"), "xxxyyy");
}

#[test]
fn argument_does_not_leak_into_later_calls() {
    assert_eq!(
        run("[Box:=[[title]] title=[xxx]][Box title=[yyy]] [Box]"),
        "yyy xxx"
    );
}

#[test]
fn default_sees_supplied_and_sibling_parameters() {
    let source = "[Card:=[[a]|[b]] a=[A] b=[[a]B]][Card] [Card a=[z]]";
    assert_eq!(run(source), "A|AB z|zB");
}

#[test]
fn sibling_default_cycle_ends_in_marker() {
    assert_eq!(run("[C:=[[a]] a=[[b]] b=[[a]]][C]"), "[a not found]");
}

#[test]
fn own_default_falls_back_to_block() {
    let bindings = Bindings::new().with("title", "outer");
    assert_eq!(
        run_with("[T:=[[title]] title=[<[@]>]][T]", &bindings),
        "<outer>"
    );
}

#[test]
fn arguments_evaluate_in_caller_scope() {
    let source = "[Outer:=[[Inner x=[[y]]]] y=[Y]][Inner:=[([x])] y=[inner]][Outer]";
    assert_eq!(run(source), "(Y)");
}

#[test]
fn nested_definition_does_not_see_outer_parameters() {
    assert_eq!(
        run("[Outer:=[[Inner:=[[x]]][Inner]]][Outer x=[1]]"),
        "[x not found]"
    );
}

#[test]
fn definitions_are_scoped_to_their_content() {
    assert_eq!(
        run("[If [yes] Then=[[a:=[in]][a]]] [a]"),
        "in [a not found]"
    );
}

#[test]
fn later_definition_shadows_outer_one() {
    assert_eq!(run("[a:=[outer]][If [yes] Then=[[a:=[inner]][a]]] [a]"), "inner outer");
}

// ----- Recursion safety -----

#[test]
fn recursion_limit_marker() {
    assert_eq!(run("[c:=[[c]]][c]"), "[recurrence limit for c]");
}

#[test]
fn recursion_ceiling_counts_entries() {
    let expected = format!("{}[recurrence limit for c]", "x".repeat(30));
    assert_eq!(run("[c:=[x[c]]][c]"), expected);
}

#[test]
fn recursion_ceiling_is_configurable() {
    let template = Template::new("[c:=[x[c]]][c]")
        .expect("parse failed")
        .with_options(RenderOptions::new().with_recursion_limit(3));
    assert_eq!(
        template.render(&Bindings::new()),
        "xxx[recurrence limit for c]"
    );
}

#[test]
fn wrapper_reaches_outer_binding() {
    let bindings = Bindings::new().with("title", "outer");
    assert_eq!(run_with("[title:=[<[title]>]][title]", &bindings), "<outer>");
}

#[test]
fn wrapper_reaches_outer_definition() {
    assert_eq!(
        run("[a:=[outer]][If [yes] Then=[[a:=[<[a]>]][a]]]"),
        "<outer>"
    );
}

#[test]
fn wrapper_reaches_library_block() {
    assert_eq!(
        run("[Link:=[<b>[Link Target=[[Target]] [[#]]]</b>]][Link Target=[/x] [home]]"),
        r#"<b><a href="/x">home</a></b>"#
    );
}

#[test]
fn self_reference_without_outer_block_still_recurses() {
    assert_eq!(run("[c:=[[c]]][c]"), "[recurrence limit for c]");
    let bindings = Bindings::new().with("other", "x");
    assert_eq!(
        run_with("[c:=[[c]]][c]", &bindings),
        "[recurrence limit for c]"
    );
}

#[test]
fn recursion_limit_is_clamped() {
    let options = RenderOptions::new().with_recursion_limit(usize::MAX);
    assert_eq!(options.recursion_limit, MAX_RECURSION_LIMIT);

    let mut options = RenderOptions::new();
    options.recursion_limit = usize::MAX;
    assert_eq!(options.effective_recursion_limit(), MAX_RECURSION_LIMIT);

    let template = Template::new("[c:=[x[c]]][c]")
        .expect("parse failed")
        .with_options(options);
    let expected = format!(
        "{}[recurrence limit for c]",
        "x".repeat(MAX_RECURSION_LIMIT)
    );
    assert_eq!(template.render(&Bindings::new()), expected);
}

#[test]
fn mutual_cycle_is_cut_by_guard() {
    assert_eq!(run("[a:=[[b]]][b:=[[a]]][a]"), "[a not found]");
}

// ----- Runtime library -----

#[test]
fn list_with_if() {
    let code = r#"
        <ul>[List Seq=[[Literature]] [
            <li[*just an example*][If [[Last]] Then=[[Sp]class="last"]]>[Order]. [Item]</li>
        ]]</ul>
    "#;
    let bindings = Bindings::new().with("Literature", vec!["Shakespear", "Čapek"]);
    assert_eq!(
        run_with(code, &bindings),
        r#"<ul><li>1. Shakespear</li><li class="last">2. Čapek</li></ul>"#
    );
}

#[test]
fn list_separator_and_split() {
    assert_eq!(
        run("[List Seq=[[Split Sep=[,] [a,b,c]]] Sep=[; ] [[Order]:[Item]]]"),
        "1:a; 2:b; 3:c"
    );
}

#[test]
fn list_position_flags() {
    let bindings = Bindings::new().with("xs", vec!["a", "b", "c"]);
    assert_eq!(
        run_with(
            "[List Seq=[[xs]] [[If [[First]] Then=[F]][If [[Odd]] Then=[o]][If [[Even]] Then=[e]][Item]]]",
            &bindings
        ),
        "Foaeboc"
    );
}

#[test]
fn list_if_empty() {
    let bindings = Bindings::new().with("items", Value::List(Vec::new()));
    assert_eq!(
        run_with("[List Seq=[[items]] IfEmpty=[none] [[Item]]]", &bindings),
        "none"
    );
}

#[test]
fn list_passes_errors_through() {
    assert_eq!(
        run("[List Seq=[[missing]] IfEmpty=[none] [x]]"),
        "[missing not found]none"
    );
}

#[test]
fn if_branches() {
    let yes = Bindings::new().with("flag", true);
    let no = Bindings::new().with("flag", false);
    let source = "[If [[flag]] Then=[yes] Else=[no]]";
    assert_eq!(run_with(source, &yes), "yes");
    assert_eq!(run_with(source, &no), "no");
    assert_eq!(run(source), "no");
    assert_eq!(run("[If [] Then=[yes]]"), "");
}

#[test]
fn pair_tag() {
    assert_eq!(
        run("[PairTag Name=[a] Required=[href] Optional=[class, title] href=[x&y] class=[] [link]]"),
        r#"<a href="x&amp;y">link</a>"#
    );
}

#[test]
fn tag_validation_markers() {
    assert_eq!(
        run("[PairTag Name=[a] Required=[href] [x]]"),
        r#"[required attribute "href" is missing]"#
    );
    assert_eq!(run("[EmptyTag Name=[a b]]"), r#"[tag name "a b" invalid]"#);
    assert_eq!(run("[EmptyTag]"), "[missing tag name]");
}

#[test]
fn empty_tag_with_namespace() {
    assert_eq!(
        run("[EmptyTag Name=[svg:rect] Required=[x] x=[1]]"),
        r#"<svg:rect x="1"/>"#
    );
}

#[test]
fn link_shortcut() {
    assert_eq!(
        run("[>http://example.com]"),
        r#"<a href="http://example.com">http://example.com</a>"#
    );
    assert_eq!(
        run("[>/home [Home page]]"),
        r#"<a href="/home">Home page</a>"#
    );
}

#[test]
fn list_item_shortcut() {
    assert_eq!(run("[.] one\n[.] two\n"), "<ul><li>one</li><li>two</li></ul>");
}

// ----- Host integration -----

#[test]
fn native_block_reads_arguments() {
    let bindings = Bindings::new().with_native("Greeting", |ip| {
        vec![Fragment::Text(format!("Hello {}!", ip.get_string("name")))]
    });
    assert_eq!(
        run_with("Mr. White: [Greeting name=[Ms. Black]]", &bindings),
        "Mr. White: Hello Ms. Black!"
    );
}

#[test]
fn native_block_may_nest_in_its_own_argument() {
    let bindings = Bindings::new().with_native("Twice", |ip| {
        let mut out = ip.get_value("#").unwrap_or_default();
        out.extend(ip.get_value("#").unwrap_or_default());
        out
    });
    assert_eq!(run_with("[Twice [[Twice [x]]]]", &bindings), "xxxx");
}

#[test]
fn native_raw_values() {
    let bindings = Bindings::new().with("user", user()).with_native("Kind", |ip| {
        let kind = ip.get_raw("#").map(|value| value.type_name()).unwrap_or("none");
        vec![Fragment::text(kind)]
    });
    assert_eq!(
        run_with("[Kind [[user]]] [Kind [text]] [Kind]", &bindings),
        "Map Text none"
    );
}

#[test]
fn native_has_param() {
    let bindings = Bindings::new().with_native("Has", |ip: &mut Interpreter<'_>| {
        vec![Fragment::text(if ip.has_param("x") { "yes" } else { "no" })]
    });
    assert_eq!(run_with("[Has x=[]] [Has]", &bindings), "yes no");
}

#[test]
fn parameter_value_can_be_walked() {
    let bindings = Bindings::new().with("user", user());
    assert_eq!(
        run_with("[Card:=[[who.nickname]]][Card who=[[user]]]", &bindings),
        "spide"
    );
}

struct Czech;

impl ErrorFormatter for Czech {
    fn format(&self, error: &EvalError) -> String {
        match error {
            EvalError::BlockNotFound(name) | EvalError::ParameterNotFound(name) => {
                format!("[{} nenalezen]", name)
            }
            other => format!("[{}]", other),
        }
    }
}

#[test]
fn custom_error_formatter() {
    let template = Template::new("[a]")
        .expect("parse failed")
        .with_options(RenderOptions::new().with_formatter(Czech));
    assert_eq!(template.render(&Bindings::new()), "[a nenalezen]");
}

#[test]
fn deadline_marks_remaining_calls() {
    let template = Template::new("x[a]y")
        .expect("parse failed")
        .with_options(RenderOptions::new().with_deadline(Instant::now()));
    assert_eq!(
        template.render(&Bindings::new()),
        "x[render deadline exceeded]y"
    );
}

#[test]
fn template_renders_many_times() {
    let template = Template::new("Hello [name]!").expect("parse failed");
    let first = Bindings::new().with("name", "Alice");
    let second = Bindings::new().with("name", "Bob");
    assert_eq!(template.render(&first), "Hello Alice!");
    assert_eq!(template.render(&second), "Hello Bob!");
}

#[test]
fn render_fragments_keeps_markers_apart() {
    let template = Template::new("a [b]").expect("parse failed");
    assert_eq!(
        template.render_fragments(&Bindings::new()),
        vec![
            Fragment::text("a "),
            Fragment::Error("[b not found]".to_string())
        ]
    );
}

#[test]
fn parse_error_is_reported() {
    let err = interpreter::render("[a", &Bindings::new()).expect_err("should fail");
    assert_eq!(err.message, "unbalanced brackets");
}

#[test]
fn template_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Template>();

    let mut map = BTreeMap::new();
    map.insert("k".to_string(), Value::from("v"));
    let template = std::sync::Arc::new(Template::new("[m.k]").expect("parse failed"));
    let handle = {
        let template = template.clone();
        std::thread::spawn(move || template.render(&Bindings::new().with("m", map)))
    };
    assert_eq!(handle.join().expect("thread panicked"), "v");
}
