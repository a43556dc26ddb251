use mrkev::parser::{ParseError, Parser};
use mrkev::tree::{Block, ParseNode};

fn parse(source: &str) -> Vec<ParseNode> {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn parse_err(source: &str) -> ParseError {
    match Parser::new(source.to_string(), 0).with_filename("page.mrk").parse() {
        Ok(tree) => panic!("expected a parse error, got {:?}", tree),
        Err(err) => err,
    }
}

fn block(name: &str) -> Block {
    Block::new(name)
}

fn lit(text: &str) -> ParseNode {
    ParseNode::literal(text)
}

fn reference(name: &str) -> ParseNode {
    ParseNode::reference(name)
}

// ----- Well-formed input -----

#[test]
fn content_parameter() {
    assert_eq!(
        parse("[import [guideline]]"),
        vec![ParseNode::Block(
            block("import").with_param("#", vec![lit("guideline")])
        )]
    );
}

#[test]
fn nested_named_parameters() {
    let expected = block("for")
        .with_param(
            "list",
            vec![ParseNode::Block(
                block("enumerate").with_param("list", vec![reference("customers")]),
            )],
        )
        .with_param("template", vec![reference("order"), lit(". "), reference("name")]);

    assert_eq!(
        parse("[for list=[[enumerate list=[[customers]]]] template=[[order]. [name]]]"),
        vec![ParseNode::Block(expected)]
    );
}

#[test]
fn parameter_name_with_special_characters() {
    assert_eq!(
        parse("[t \"$#:%!=[]]"),
        vec![ParseNode::Block(block("t").with_param("\"$#:%!", vec![]))]
    );
}

#[test]
fn block_name_followed_by_line_end() {
    assert_eq!(parse("[t\n]"), vec![reference("t")]);
}

#[test]
fn block_name_with_special_characters() {
    assert_eq!(parse("[\"$#%!=]"), vec![reference("\"$#%!=")]);
}

#[test]
fn line_ends_preserved_verbatim() {
    let text = "\r\n\na\nb";
    assert_eq!(parse(text), vec![lit(text)]);
}

#[test]
fn empty_source() {
    assert_eq!(parse(""), vec![]);
}

#[test]
fn dotted_block_name() {
    assert_eq!(
        parse("[user.nickname]([user.age])"),
        vec![reference("user.nickname"), lit("("), reference("user.age"), lit(")")]
    );
}

#[test]
fn definition_marker() {
    let tree = parse("[Greeting:=[Hello [name]!]]");
    let expected = block("Greeting").with_param(":", vec![lit("Hello "), reference("name"), lit("!")]);
    assert_eq!(tree, vec![ParseNode::Block(expected)]);

    match &tree[0] {
        ParseNode::Block(b) => assert!(b.is_definition()),
        other => panic!("expected block, got {:?}", other),
    }
}

#[test]
fn definition_with_defaults() {
    let expected = block("Card")
        .with_param(":", vec![reference("title")])
        .with_param("title", vec![lit("untitled")]);
    assert_eq!(
        parse("[Card:=[[title]] title=[untitled]]"),
        vec![ParseNode::Block(expected)]
    );
}

#[test]
fn spans_cover_the_block() {
    let tree = parse("ab[c d=[e]]");
    match &tree[1] {
        ParseNode::Block(b) => assert_eq!(b.span, 2..11),
        other => panic!("expected block, got {:?}", other),
    }
}

// ----- Shortcuts -----

#[test]
fn content_shortcut() {
    assert_eq!(parse("[name other]"), parse("[name #=[[other]]]"));
    assert_eq!(parse("[t a\n]"), parse("[t [[a]]]"));
}

#[test]
fn parameter_value_shortcut() {
    assert_eq!(parse("[card title=heading]"), parse("[card title=[[heading]]]"));
}

#[test]
fn definition_shortcut() {
    assert_eq!(parse("[Alias:=target]"), parse("[Alias:=[[target]]]"));
}

// ----- Comments -----

#[test]
fn comment_is_dropped() {
    assert_eq!(parse("aaa[*comment[*]bbb"), vec![lit("aaa"), lit("bbb")]);
}

#[test]
fn first_comment_close_ends_comment() {
    assert_eq!(parse("[* a ** b *]c"), vec![lit("c")]);
    assert_eq!(parse_err("[* a *] b *]").message, "unexpected close bracket");
}

#[test]
fn comment_may_contain_brackets() {
    assert_eq!(parse("x[* [[ ]] *]y"), vec![lit("x"), lit("y")]);
}

// ----- Errors -----

#[test]
fn space_after_equal_sign() {
    let err = parse_err("[a x= []]");
    assert_eq!(err.message, "parameter \"x\" has no value");
}

#[test]
fn unexpected_close_bracket() {
    let err = parse_err("[a]]");
    assert_eq!(err.message, "unexpected close bracket");
    assert_eq!(err.column, 4);
}

#[test]
fn missing_close_bracket() {
    assert_eq!(parse_err("[a").message, "unbalanced brackets");
    assert_eq!(parse_err("[a b=[c]").message, "unbalanced brackets");
    assert_eq!(parse_err("[a [b").message, "unbalanced brackets");
}

#[test]
fn unbalanced_brackets_note_the_open_block() {
    let err = parse_err("text\n  [a b=[c]");
    assert_eq!(
        err.notes,
        vec!["block \"a\" opened at line 2, column 3".to_string()]
    );
    let err = parse_err("[a [b");
    assert_eq!(err.notes, vec!["block \"b\" opened at line 1, column 4".to_string()]);
}

#[test]
fn missing_block_name() {
    assert_eq!(parse_err("[]").message, "no name");
    assert_eq!(parse_err("[ a]").message, "no name");
}

#[test]
fn missing_parameter_name() {
    assert_eq!(parse_err("[a =[b]]").message, "missing parameter name");
}

#[test]
fn duplicate_parameter() {
    assert_eq!(
        parse_err("[a x=[1] x=[2]]").message,
        "parameter \"x\" has been already defined"
    );
    assert_eq!(
        parse_err("[a [1] [2]]").message,
        "parameter \"#\" has been already defined"
    );
}

#[test]
fn definition_must_come_first() {
    assert_eq!(
        parse_err("[a x=[1] :=[2]]").message,
        "definition has to precede default parameters"
    );
}

#[test]
fn unfinished_comment() {
    assert_eq!(parse_err("a [* never closed").message, "unfinished comment");
}

#[test]
fn error_location_and_display() {
    let err = parse_err("first line\nsecond ]");
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 8);
    assert_eq!(err.source_line, "second ]");
    assert_eq!(err.filename, "page.mrk");
    assert_eq!(
        err.to_string(),
        "unexpected close bracket\n  File \"page.mrk\", line 2\n    second ]\n           ^"
    );
}

#[test]
fn error_converts_to_diagnostic() {
    let err = parse_err("[a]]").with_note("remove the extra bracket");
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.message, "unexpected close bracket");
    assert_eq!(diagnostic.labels.len(), 1);
    assert_eq!(diagnostic.labels[0].range, 3..4);
    assert_eq!(diagnostic.notes, vec!["remove the extra bracket".to_string()]);
}
