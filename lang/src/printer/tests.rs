use super::*;
use crate::parser::ast::{BasicLit, Ident};
use crate::position::{FileSet, Pos};
use crate::scanner::{Mode, TokenKind};
use crate::{parse_source, ConvertOptions};

fn opts() -> ConvertOptions {
    ConvertOptions {
        comments: true,
        strict: false,
        config: Config {
            tab_indent: true,
            use_spaces: true,
            ..Config::default()
        },
    }
}

fn to_curly(src: &str) -> String {
    crate::convert("test.igo", src, Mode::Indented, &opts()).expect("conversion failed")
}

fn to_indented(src: &str) -> String {
    crate::convert("test.go", src, Mode::Curly, &opts()).expect("conversion failed")
}

/// Reformat without switching syntax (parse curly, emit curly).
fn reformat_curly(src: &str) -> String {
    let options = opts();
    let mut fset = FileSet::new();
    let file = parse_source(&mut fset, "test.go", src, Mode::Curly, &options)
        .expect("parse failed");
    let mut out = Vec::new();
    emit(&mut out, &fset, Node::File(&file), &options.config, Syntax::Curly).unwrap();
    String::from_utf8(out).unwrap()
}

// ----------------------------------------------------------------------
// Exact outputs

#[test]
fn simple_function_to_curly() {
    let got = to_curly("package p\n\nfunc f()\n\treturn 1\n");
    assert_eq!(got, "package p\n\nfunc f() {\n\treturn 1\n}\n");
}

#[test]
fn simple_function_to_indented() {
    let got = to_indented("package p\n\nfunc f() {\n\treturn 1\n}\n");
    assert_eq!(got, "package p\n\nfunc f()\n\treturn 1\n");
}

#[test]
fn empty_file_converts_to_empty_output() {
    assert_eq!(to_curly(""), "");
    assert_eq!(to_indented(""), "");
}

#[test]
fn comments_only_file_is_preserved_in_order() {
    assert_eq!(to_curly("# a\n# b\n"), "// a\n// b\n");
    assert_eq!(to_indented("// a\n// b\n"), "# a\n# b\n");
}

#[test]
fn blank_lines_are_capped_at_one_blank() {
    let got = to_indented("package p\n\n\n\n\nfunc f() {\n\treturn\n}\n");
    assert_eq!(got, "package p\n\nfunc f()\n\treturn\n");
}

#[test]
fn empty_body_keeps_literal_braces_in_indented_form() {
    let got = to_indented("package p\n\nfunc f() {\n}\n");
    assert_eq!(got, "package p\n\nfunc f() {}\n");
}

#[test]
fn dedent_two_levels_emits_two_closing_braces() {
    let got = to_curly("package p\n\nfunc f()\n\tif a\n\t\tif b\n\t\t\tg()\n\th()\n");
    assert_eq!(
        got,
        concat!(
            "package p\n\nfunc f() {\n",
            "\tif a {\n\t\tif b {\n\t\t\tg()\n\t\t}\n\t}\n",
            "\th()\n}\n"
        )
    );
}

#[test]
fn block_comment_stays_attached_in_curly_reformat() {
    let src = "package p\n\nfunc f() {\n\t/* a */ x := 1\n}\n";
    let got = reformat_curly(src);
    assert!(got.contains("\t/* a */ x := 1\n"), "got:\n{}", got);
}

#[test]
fn line_directive_passes_through_verbatim() {
    let src = "package p\n\n//line foo.src:42\nfunc f() {\n\treturn\n}\n";
    let got = reformat_curly(src);
    assert!(got.contains("//line foo.src:42\n"), "got:\n{}", got);
    assert!(got.contains("func f() {"), "got:\n{}", got);
}

#[test]
fn operator_combination_guard_inserts_blank() {
    // INT directly followed by '.' would re-tokenize as a float
    let expr = crate::parser::ast::Expr::Selector {
        receiver: Box::new(crate::parser::ast::Expr::BasicLit(BasicLit {
            pos: Pos::NONE,
            kind: TokenKind::Int,
            text: "1".to_string(),
        })),
        sel: Ident {
            pos: Pos::NONE,
            name: "x".to_string(),
        },
    };
    let fset = FileSet::new();
    let mut out = Vec::new();
    emit(
        &mut out,
        &fset,
        Node::Expr(&expr),
        &Config::default(),
        Syntax::Curly,
    )
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1 .x");
}

#[test]
fn raw_format_terminates_statements_with_semicolons() {
    let options = ConvertOptions {
        config: Config {
            raw_format: true,
            ..Config::default()
        },
        ..opts()
    };
    let got = crate::convert(
        "test.igo",
        "package p\n\nfunc f()\n\treturn 1\n\treturn 2\n",
        Mode::Indented,
        &options,
    )
    .unwrap();
    assert!(got.contains("return 1;\n"), "got:\n{}", got);
    assert!(!got.contains("return 2;"), "got:\n{}", got);
}

#[test]
fn source_pos_mode_emits_line_directives() {
    let options = ConvertOptions {
        config: Config {
            source_pos: true,
            tab_indent: true,
            use_spaces: true,
            ..Config::default()
        },
        ..opts()
    };
    let got = crate::convert(
        "test.igo",
        "package p\n\nfunc f()\n\treturn 1\nfunc g()\n\treturn 2\n",
        Mode::Indented,
        &options,
    )
    .unwrap();
    assert!(got.contains("//line test.igo:"), "got:\n{}", got);
}

#[test]
fn struct_fields_align_in_curly_output() {
    let src = "package p\n\ntype point struct {\n\tx int\n\tlonger string\n}\n";
    let got = reformat_curly(src);
    assert_eq!(
        got,
        "package p\n\ntype point struct {\n\tx      int\n\tlonger string\n}\n"
    );
}

#[test]
fn labels_land_at_the_outer_column() {
    let src = "package p\n\nfunc f() {\n\tfor {\n\tloop:\n\t\tx++\n\t}\n}\n";
    let got = reformat_curly(src);
    assert_eq!(got, src);
}

#[test]
fn trailing_comments_stay_on_their_line() {
    let got = to_indented("package p\n\nfunc f() {\n\tx := 1 // note\n\tg(x)\n}\n");
    let line = got
        .lines()
        .find(|l| l.contains("x := 1"))
        .expect("missing statement line");
    assert!(line.contains("# note"), "got:\n{}", got);
}

// ----------------------------------------------------------------------
// Round-trip laws

const FIXTURES: &[&str] = &[
    // control flow and else
    concat!(
        "package p\n\n",
        "func f(x int) int {\n",
        "\tif x > 1 {\n\t\treturn x\n\t} else {\n\t\treturn 0\n\t}\n",
        "}\n"
    ),
    // comments, doc and trailing
    concat!(
        "package p\n\n",
        "// entry point\n",
        "func main() {\n",
        "\tx := 1\n",
        "\tf(x)\n",
        "}\n"
    ),
    // the kitchen sink: imports, consts, structs, composites, switch,
    // loops, selectors and indexing
    concat!(
        "package main\n\n",
        "import (\n\t\"fmt\"\n\t\"os\"\n)\n\n",
        "const greeting = \"hello\"\n\n",
        "type point struct {\n\tx, y int\n\tname string\n}\n\n",
        "var origin = point{x: 0, y: 0}\n\n",
        "func scale(p *point, factor int) point {\n",
        "\tresult := point{\n",
        "\t\tx: p.x * factor,\n",
        "\t\ty: p.y * factor,\n",
        "\t}\n",
        "\treturn result\n",
        "}\n\n",
        "func classify(n int) string {\n",
        "\tswitch n {\n",
        "\tcase 0:\n\t\treturn \"zero\"\n",
        "\tcase 1, 2:\n\t\treturn \"small\"\n",
        "\tdefault:\n\t\treturn \"big\"\n",
        "\t}\n",
        "}\n\n",
        "func main() {\n",
        "\ttotal := 0\n",
        "\tfor i := 0; i < 10; i++ {\n",
        "\t\ttotal += i\n",
        "\t}\n",
        "\tfor total > 0 {\n",
        "\t\ttotal--\n",
        "\t}\n",
        "\tfmt.Println(greeting, os.Args[0])\n",
        "}\n"
    ),
    // methods, defer, go, else-if chains
    concat!(
        "package p\n\n",
        "func (p *point) dist(q point) int {\n",
        "\tdx := p.x - q.x\n",
        "\tif dx < 0 {\n",
        "\t\tdx = -dx\n",
        "\t} else if dx == 0 {\n",
        "\t\treturn 0\n",
        "\t}\n",
        "\tdefer release(p)\n",
        "\tgo log(dx)\n",
        "\treturn dx\n",
        "}\n"
    ),
];

#[test]
fn conversion_reaches_a_fixpoint() {
    for (i, src) in FIXTURES.iter().enumerate() {
        let igo1 = to_indented(src);
        let go1 = to_curly(&igo1);
        let igo2 = to_indented(&go1);
        assert_eq!(igo1, igo2, "indented fixpoint failed for fixture {}", i);
        let go2 = to_curly(&igo2);
        assert_eq!(go1, go2, "curly fixpoint failed for fixture {}", i);
    }
}

#[test]
fn no_output_line_carries_trailing_whitespace() {
    for src in FIXTURES {
        let igo = to_indented(src);
        let go = to_curly(&igo);
        for out in [&igo, &go] {
            for line in out.lines() {
                assert!(
                    !line.ends_with(' ') && !line.ends_with('\t'),
                    "trailing whitespace in {:?}",
                    line
                );
            }
        }
    }
}

#[test]
fn every_comment_survives_exactly_once() {
    let src = concat!(
        "package p\n\n",
        "// first\n",
        "func f() {\n",
        "\t// inner\n",
        "\tx := 1 // trailing\n",
        "\tg(x)\n",
        "}\n"
    );
    let igo = to_indented(src);
    for needle in ["# first", "# inner", "# trailing"] {
        assert_eq!(igo.matches(needle).count(), 1, "got:\n{}", igo);
    }
    let back = to_curly(&igo);
    for needle in ["// first", "// inner", "// trailing"] {
        assert_eq!(back.matches(needle).count(), 1, "got:\n{}", back);
    }
}

#[test]
fn statement_lists_print_standalone() {
    let options = opts();
    let mut fset = FileSet::new();
    let file = parse_source(
        &mut fset,
        "test.go",
        "package p\n\nfunc f() {\n\tx := 1\n\tx++\n}\n",
        Mode::Curly,
        &options,
    )
    .unwrap();
    let stmts = match &file.decls[0] {
        crate::parser::ast::Decl::Func {
            body: Some(body), ..
        } => &body.stmts,
        _ => unreachable!(),
    };
    let mut out = Vec::new();
    emit(
        &mut out,
        &fset,
        Node::Stmts(stmts),
        &options.config,
        Syntax::Curly,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("x := 1"));
    assert!(text.contains("x++"));
}
