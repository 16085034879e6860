use super::*;
use crate::position::FileSet;
use crate::scanner::{self, Mode, ScanConfig};

fn parse(src: &str, mode: Mode) -> File {
    try_parse(src, mode).expect("parse failed")
}

fn try_parse(src: &str, mode: Mode) -> Result<File> {
    let mut fset = FileSet::new();
    let index = fset.add("test", src);
    let result = scanner::scan(fset.file(index), src, mode, ScanConfig::default());
    assert!(
        result.errors.is_empty(),
        "scan errors: {:?}",
        result.errors
    );
    parse_file(result.tokens, result.comments)
}

fn single_func_body(file: &File) -> &[Stmt] {
    match &file.decls[0] {
        Decl::Func { body: Some(body), .. } => &body.stmts,
        other => panic!("expected function with body, got {:?}", other),
    }
}

#[test]
fn parse_simple_file() {
    let file = parse("package p\n\nfunc f() {\n\treturn 1\n}\n", Mode::Curly);
    assert_eq!(file.name.name, "p");
    assert_eq!(file.decls.len(), 1);
    let stmts = single_func_body(&file);
    assert!(matches!(&stmts[0], Stmt::Return { results, .. } if results.len() == 1));
}

#[test]
fn both_syntaxes_yield_the_same_shape() {
    let curly = parse("package p\n\nfunc f() {\n\tx := 1\n\tx++\n}\n", Mode::Curly);
    let indented = parse("package p\n\nfunc f()\n\tx := 1\n\tx++\n", Mode::Indented);
    assert_eq!(single_func_body(&curly).len(), 2);
    assert_eq!(single_func_body(&indented).len(), 2);
    assert!(matches!(single_func_body(&indented)[0], Stmt::Assign { .. }));
    assert!(matches!(single_func_body(&indented)[1], Stmt::IncDec { .. }));
}

#[test]
fn parse_if_else_across_syntaxes() {
    let curly = parse(
        "package p\n\nfunc f() {\n\tif x > 1 {\n\t\ty = 2\n\t} else {\n\t\ty = 3\n\t}\n}\n",
        Mode::Curly,
    );
    let indented = parse(
        "package p\n\nfunc f()\n\tif x > 1\n\t\ty = 2\n\telse\n\t\ty = 3\n",
        Mode::Indented,
    );
    for file in [&curly, &indented] {
        match &single_func_body(file)[0] {
            Stmt::If { else_branch, .. } => assert!(else_branch.is_some()),
            other => panic!("expected if statement, got {:?}", other),
        }
    }
}

#[test]
fn parse_if_with_init_statement() {
    let file = parse(
        "package p\n\nfunc f() {\n\tif err := g(); err != nil {\n\t\treturn err\n\t}\n}\n",
        Mode::Curly,
    );
    match &single_func_body(&file)[0] {
        Stmt::If { init, cond, .. } => {
            assert!(init.is_some());
            assert!(matches!(cond, Expr::Binary { .. }));
        }
        other => panic!("expected if statement, got {:?}", other),
    }
}

#[test]
fn parse_for_variants() {
    let file = parse(
        concat!(
            "package p\n\nfunc f() {\n",
            "\tfor i := 0; i < 10; i++ {\n\t\tg(i)\n\t}\n",
            "\tfor x < 3 {\n\t\tg(0)\n\t}\n",
            "\tfor {\n\t\tg(1)\n\t}\n",
            "\tfor i := range xs {\n\t\tg(i)\n\t}\n",
            "}\n"
        ),
        Mode::Curly,
    );
    let stmts = single_func_body(&file);
    match &stmts[0] {
        Stmt::For { init, cond, post, .. } => {
            assert!(init.is_some() && cond.is_some() && post.is_some());
        }
        other => panic!("expected for, got {:?}", other),
    }
    match &stmts[1] {
        Stmt::For { init, cond, post, .. } => {
            assert!(init.is_none() && cond.is_some() && post.is_none());
        }
        other => panic!("expected for, got {:?}", other),
    }
    match &stmts[2] {
        Stmt::For { init, cond, post, .. } => {
            assert!(init.is_none() && cond.is_none() && post.is_none());
        }
        other => panic!("expected for, got {:?}", other),
    }
    match &stmts[3] {
        Stmt::For { init, cond, post, .. } => {
            assert!(init.is_some() && cond.is_none() && post.is_none());
            match init.as_deref() {
                Some(Stmt::Assign { rhs, .. }) => {
                    assert!(matches!(
                        rhs[0],
                        Expr::Unary {
                            op: crate::scanner::TokenKind::Range,
                            ..
                        }
                    ));
                }
                other => panic!("expected range assignment, got {:?}", other),
            }
        }
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn parse_switch_with_cases_and_default() {
    let file = parse(
        concat!(
            "package p\n\nfunc f() {\n",
            "\tswitch n {\n",
            "\tcase 0:\n\t\treturn\n",
            "\tcase 1, 2:\n\t\tg()\n",
            "\tdefault:\n\t\th()\n",
            "\t}\n",
            "}\n"
        ),
        Mode::Curly,
    );
    match &single_func_body(&file)[0] {
        Stmt::Switch { tag, body, .. } => {
            assert!(tag.is_some());
            assert_eq!(body.stmts.len(), 3);
            match &body.stmts[1] {
                Stmt::Case { values, body, .. } => {
                    assert_eq!(values.len(), 2);
                    assert_eq!(body.len(), 1);
                }
                other => panic!("expected case clause, got {:?}", other),
            }
            match &body.stmts[2] {
                Stmt::Case { values, .. } => assert!(values.is_empty()),
                other => panic!("expected default clause, got {:?}", other),
            }
        }
        other => panic!("expected switch, got {:?}", other),
    }
}

#[test]
fn parse_grouped_declarations() {
    let file = parse("package p\n\nvar (\n\tx int\n\ty = 2\n)\n", Mode::Curly);
    match &file.decls[0] {
        Decl::Gen { lparen, specs, .. } => {
            assert!(lparen.is_valid());
            assert_eq!(specs.len(), 2);
            assert!(matches!(
                &specs[0],
                Spec::Value { ty: Some(_), values, .. } if values.is_empty()
            ));
            assert!(matches!(
                &specs[1],
                Spec::Value { ty: None, values, .. } if values.len() == 1
            ));
        }
        other => panic!("expected var group, got {:?}", other),
    }
}

#[test]
fn parse_imports_with_local_name() {
    let file = parse(
        "package p\n\nimport (\n\tfoo \"bar/foo\"\n\t\"fmt\"\n)\n",
        Mode::Curly,
    );
    match &file.decls[0] {
        Decl::Gen { specs, .. } => {
            assert!(matches!(&specs[0], Spec::Import { name: Some(n), .. } if n.name == "foo"));
            assert!(matches!(&specs[1], Spec::Import { name: None, .. }));
        }
        other => panic!("expected import group, got {:?}", other),
    }
}

#[test]
fn parse_struct_type_declaration() {
    let file = parse(
        "package p\n\ntype point struct {\n\tx, y int\n\tname string\n}\n",
        Mode::Curly,
    );
    match &file.decls[0] {
        Decl::Gen { specs, .. } => match &specs[0] {
            Spec::Type { name, ty } => {
                assert_eq!(name.name, "point");
                match ty {
                    Expr::StructType { fields, .. } => {
                        assert_eq!(fields.fields.len(), 2);
                        assert_eq!(fields.fields[0].names.len(), 2);
                    }
                    other => panic!("expected struct type, got {:?}", other),
                }
            }
            other => panic!("expected type spec, got {:?}", other),
        },
        other => panic!("expected type declaration, got {:?}", other),
    }
}

#[test]
fn parse_composite_literal_with_keys() {
    let file = parse(
        "package p\n\nfunc f() {\n\tp := point{x: 1, y: 2}\n}\n",
        Mode::Curly,
    );
    match &single_func_body(&file)[0] {
        Stmt::Assign { rhs, .. } => match &rhs[0] {
            Expr::Composite { ty: Some(_), elts, .. } => {
                assert_eq!(elts.len(), 2);
                assert!(matches!(&elts[0], Expr::KeyValue { .. }));
            }
            other => panic!("expected composite literal, got {:?}", other),
        },
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn composite_literals_not_taken_in_control_headers() {
    // `{` after the condition opens the block, not a composite literal
    let file = parse(
        "package p\n\nfunc f() {\n\tif x == y {\n\t\tg()\n\t}\n}\n",
        Mode::Curly,
    );
    match &single_func_body(&file)[0] {
        Stmt::If { cond, body, .. } => {
            assert!(matches!(cond, Expr::Binary { .. }));
            assert_eq!(body.stmts.len(), 1);
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn parse_labeled_statement() {
    let file = parse(
        "package p\n\nfunc f() {\n\tfor {\n\tloop:\n\t\tx++\n\t}\n}\n",
        Mode::Curly,
    );
    match &single_func_body(&file)[0] {
        Stmt::For { body, .. } => match &body.stmts[0] {
            Stmt::Labeled { label, stmt, .. } => {
                assert_eq!(label.name, "loop");
                assert!(matches!(stmt.as_ref(), Stmt::IncDec { .. }));
            }
            other => panic!("expected labeled statement, got {:?}", other),
        },
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn parse_method_with_receiver() {
    let file = parse(
        "package p\n\nfunc (p *point) len() int {\n\treturn 0\n}\n",
        Mode::Curly,
    );
    match &file.decls[0] {
        Decl::Func { recv, name, ty, .. } => {
            assert!(recv.is_some());
            assert_eq!(name.name, "len");
            assert!(ty.results.is_some());
        }
        other => panic!("expected method, got {:?}", other),
    }
}

#[test]
fn parse_func_literal_argument() {
    let file = parse(
        "package p\n\nfunc f() {\n\tg(func(x int) int { return x })\n}\n",
        Mode::Curly,
    );
    match &single_func_body(&file)[0] {
        Stmt::Expr(Expr::Call { args, .. }) => {
            assert!(matches!(&args[0], Expr::FuncLit { .. }));
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn parse_error_carries_position() {
    let err = try_parse("package p\nfunc 1() {}\n", Mode::Curly).unwrap_err();
    assert!(err.message.contains("expected identifier"));
    assert!(err.pos.is_valid());
}

#[test]
fn empty_source_parses_to_empty_file() {
    let file = parse("", Mode::Curly);
    assert!(!file.package.is_valid());
    assert!(file.decls.is_empty());
}

#[test]
fn comments_only_source_keeps_comment_groups() {
    let file = parse("// a\n\n// b\n", Mode::Curly);
    assert!(file.decls.is_empty());
    assert_eq!(file.comments.len(), 2);
}
