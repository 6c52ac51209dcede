use super::*;
use crate::ast::{BinOp, Expr, Statement, UnaryOp};
use crate::error::ErrorKind;

const GUN: &str = r#"# A simple gun
entity gun {
	name: string = "M60",
	damage: i32 = 25,
	rounds_per_minute: i32 = 300,
}

ammo: i32 = 100

on_fire(self: id) {
	ammo = ammo - 1
	if ammo <= 0 {
		reload(self)
	} else if ammo < 10 {
		print_string("low")
	} else {
		print_string("bang")
	}
}

helper_clamp(n: i32, max: i32) i32 {
	while n > max {
		n = n - 1
	}
	return n
}
"#;

fn expr_of(source_expr: &str) -> Expr {
    let source = format!("entity e {{\n\tx: f32 = {}\n}}\n", source_expr);
    let file = parse(&source).expect("expression should parse");
    file.entity.node.fields[0].node.value.node.clone()
}

#[test]
fn test_parse_full_file() {
    let file = parse(GUN).expect("Failed to parse");

    assert_eq!(file.entity.node.name.node, "gun");
    let fields = &file.entity.node.fields;
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[2].node.name.node, "rounds_per_minute");
    assert_eq!(fields[2].node.ty.node, "i32");
    assert_eq!(fields[2].node.value.node, Expr::number("300"));

    assert_eq!(file.globals.len(), 1);
    assert_eq!(file.globals[0].node.name.node, "ammo");

    assert_eq!(file.functions.len(), 2);
    let on_fire = &file.functions[0].node;
    assert_eq!(on_fire.name.node, "on_fire");
    assert_eq!(on_fire.params.len(), 1);
    assert!(on_fire.return_type.is_none());
    assert_eq!(on_fire.body.node.statements.len(), 2);

    let clamp = &file.functions[1].node;
    assert_eq!(clamp.return_type.as_ref().map(|t| t.node.as_str()), Some("i32"));
}

#[test]
fn test_lines_are_annotated() {
    let file = parse(GUN).expect("Failed to parse");

    assert_eq!(file.entity.line, Some(2));
    assert_eq!(file.entity.node.fields[0].line, Some(3));
    assert_eq!(file.entity.node.fields[2].node.value.line, Some(5));
    assert_eq!(file.globals[0].line, Some(8));
    assert_eq!(file.functions[1].line, Some(21));
}

#[test]
fn test_spans_cover_source_text() {
    let file = parse(GUN).expect("Failed to parse");

    let value = &file.entity.node.fields[2].node.value;
    let span = value.span.clone().expect("parsed nodes have spans");
    assert_eq!(&GUN[span], "300");

    let body = &file.functions[1].node.body;
    let span = body.span.clone().expect("parsed nodes have spans");
    assert!(GUN[span.clone()].starts_with('{'));
    assert!(GUN[span].ends_with('}'));
}

#[test]
fn test_else_if_chain() {
    let file = parse(GUN).expect("Failed to parse");
    let Statement::If { else_block, .. } = &file.functions[0].node.body.node.statements[1].node
    else {
        panic!("expected if statement");
    };

    let else_block = else_block.as_ref().expect("else branch");
    let nested = else_block.node.as_else_if().expect("else if");
    assert_eq!(else_block.span, nested.span);

    let Statement::If { else_block, .. } = &nested.node else {
        panic!("expected nested if");
    };
    let last = else_block.as_ref().expect("final else");
    assert!(last.node.as_else_if().is_none());
    assert_eq!(last.node.statements.len(), 1);
}

#[test]
fn test_precedence() {
    let Expr::Binary { op, left, right } = expr_of("1 + 2 * 3") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinOp::Add);
    assert_eq!(left.node, Expr::number("1"));
    assert!(matches!(right.node, Expr::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn test_left_associativity() {
    let Expr::Binary { op, left, right } = expr_of("10 - 4 - 3") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinOp::Sub);
    assert!(matches!(left.node, Expr::Binary { op: BinOp::Sub, .. }));
    assert_eq!(right.node, Expr::number("3"));
}

#[test]
fn test_parentheses_leave_no_node() {
    let source = "entity e {\n\tx: f32 = (1 + 2) * 3\n}\n";
    let file = parse(source).expect("Failed to parse");
    let value = &file.entity.node.fields[0].node.value;

    let Expr::Binary { op, left, .. } = &value.node else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinOp::Mul);
    assert!(matches!(left.node, Expr::Binary { op: BinOp::Add, .. }));
    let span = left.span.clone().expect("span");
    assert_eq!(&source[span], "(1 + 2)");
}

#[test]
fn test_unary_operators() {
    let Expr::Unary { op, operand } = expr_of("-2.5") else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Neg);
    assert_eq!(operand.node, Expr::number("2.5"));

    assert!(matches!(
        expr_of("not true and false"),
        Expr::Binary { op: BinOp::And, .. }
    ));
}

#[test]
fn test_statements() {
    let source = r#"entity e {}

f() {
	x: i32 = 1
	x = x + 1
	while true {
		if x > 3 {
			break
		}
		continue
	}
	return
}
"#;
    let file = parse(source).expect("Failed to parse");
    let statements = &file.functions[0].node.body.node.statements;
    let kinds: Vec<_> = statements.iter().map(|s| s.node.kind_name()).collect();
    assert_eq!(kinds, vec!["assignment", "assignment", "while", "return"]);

    let Statement::Assignment { ty, .. } = &statements[0].node else {
        panic!("expected assignment");
    };
    assert_eq!(ty.as_ref().map(|t| t.node.as_str()), Some("i32"));
    assert_eq!(statements[3].node, Statement::Return(None));
}

#[test]
fn test_empty_blocks_and_comments() {
    let source = "entity e {\n} # nothing here\n\n# trailing\nf() {}\ng() {\n\t# only a comment\n}\n";
    let file = parse(source).expect("Failed to parse");
    assert!(file.entity.node.fields.is_empty());
    assert_eq!(file.functions.len(), 2);
    assert!(file.functions[0].node.body.node.statements.is_empty());
    assert!(file.functions[1].node.body.node.statements.is_empty());
}

#[test]
fn test_fields_on_one_line() {
    let file = parse("entity e { a: i32 = 1, b: bool = true }").expect("Failed to parse");
    assert_eq!(file.entity.node.fields.len(), 2);
}

#[test]
fn test_missing_entity_is_an_error() {
    let err = parse("f() {}\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.line, 1);
}

#[test]
fn test_error_line_points_at_problem() {
    let source = "entity e {\n\ta: i32 = 1,\n}\n\nf() {\n\tx = = 2\n}\n";
    let err = parse(source).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.line, 6);
    assert!(!err.message.is_empty());
}

#[test]
fn test_lexer_error_line() {
    let err = parse("entity e {\n\ta: string = \"open\n}\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.line, 2);
}

#[test]
fn test_declared_type_mismatch() {
    let err = parse("entity e {\n\ta: i32 = 1,\n\tb: i32 = \"x\",\n}\n").unwrap_err();
    assert_eq!(err.line, 3);
    assert!(err.message.contains("\"b\""), "message: {}", err.message);

    let err = parse("entity e {\n\ta: i32 = 99999999999,\n}\n").unwrap_err();
    assert!(err.message.contains("i32"));

    assert!(parse("entity e {\n\ta: i32 = -2147483648,\n}\n").is_ok());
}

#[test]
fn test_keyword_is_not_a_name() {
    assert!(parse("entity e {\n\twhile: i32 = 1,\n}\n").is_err());
}

#[test]
fn test_statements_need_newlines() {
    assert!(parse("entity e {}\nf() { x = 1 }\n").is_err());
}
