use super::api::{unescape_string, JsParser, Rule};
use super::ast::*;
use super::static_semantics::{function_declarations, var_declared_names};

use pest::{consumes_to, parses_to};
use pest::Parser;

fn parse_ok(code: &str) -> ProgramData {
    match JsParser::parse_to_ast("test.js", code) {
        Ok(p) => p,
        Err(e) => panic!("Failed to parse {:?}: {}", code, e),
    }
}

fn first_expression(code: &str) -> ExpressionType {
    let mut program = parse_ok(code);
    match program.body.remove(0) {
        StatementType::ExpressionStatement { expression, .. } => *expression,
        other => panic!("Expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_decimal_number_with_no_dot() {
    parses_to! {
        parser: JsParser,
        input: "10",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 2)
        ]
    };
}

#[test]
fn test_decimal_number_with_exponent() {
    parses_to! {
        parser: JsParser,
        input: "1.123e10",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 8)
        ]
    };
}

#[test]
fn test_hex_number() {
    parses_to! {
        parser: JsParser,
        input: "0x1F",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 4)
        ]
    };
}

#[test]
fn test_number_followed_by_identifier_is_rejected() {
    assert!(JsParser::parse(Rule::numeric_literal, "3in").is_err());
}

#[test]
fn test_identifier_excludes_reserved_words() {
    parses_to! {
        parser: JsParser,
        input: "instance",
        rule: Rule::identifier,
        tokens: [
            identifier(0, 8)
        ]
    };
    assert!(JsParser::parse(Rule::identifier, "in").is_err());
    assert!(JsParser::parse(Rule::identifier, "typeof").is_err());
}

#[test]
fn test_string_literal_tokens() {
    parses_to! {
        parser: JsParser,
        input: "'a\\'b'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 6)
        ]
    };
}

#[test]
fn test_unescape_string() {
    assert_eq!(unescape_string("a\\nb").unwrap(), "a\nb");
    assert_eq!(unescape_string("\\x41\\u0042").unwrap(), "AB");
    assert_eq!(unescape_string("\\uD83D\\uDE00").unwrap(), "\u{1F600}");
    assert_eq!(unescape_string("line\\\ncontinued").unwrap(), "linecontinued");
    assert!(unescape_string("\\u12").is_err());
}

#[test]
fn test_operator_precedence() {
    match first_expression("1 + 2 * 3") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_left_associativity() {
    match first_expression("a - b - c") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Subtract,
            left,
            ..
        } => assert!(matches!(
            *left,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Subtract,
                ..
            }
        )),
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    match first_expression("a = b = 1") {
        ExpressionType::AssignmentExpression { right, .. } => assert!(matches!(
            *right,
            ExpressionType::AssignmentExpression { .. }
        )),
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_compound_assignment_operator() {
    assert!(matches!(
        first_expression("x >>>= 2"),
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::BitwiseUnsignedRightShiftEquals,
            ..
        }
    ));
}

#[test]
fn test_invalid_assignment_target() {
    let err = JsParser::parse_to_ast_from_str("1 = 2;").unwrap_err();
    assert!(err.message.contains("Invalid left-hand side"));
    assert_eq!(err.line, 1);
}

#[test]
fn test_member_call_and_new_chains() {
    match first_expression("new Foo.Bar(1).baz(2)") {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 1);
            match *callee {
                ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                    object,
                    property,
                    ..
                }) => {
                    assert_eq!(property.name, "baz");
                    assert!(matches!(*object, ExpressionType::NewExpression { .. }));
                }
                other => panic!("Unexpected callee {:?}", other),
            }
        }
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_index_access_after_integer() {
    assert!(matches!(
        first_expression("a[0].length"),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression { .. })
    ));
}

#[test]
fn test_array_literal_holes() {
    match first_expression("[1,,2,]") {
        ExpressionType::ArrayExpression { elements, .. } => {
            assert_eq!(elements.len(), 3);
            assert!(elements[1].is_none());
        }
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_object_literal_accessors() {
    match first_expression("({ a: 1, 'b': 2, 3: 3, get c() { return 1; }, set c(v) {} })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            let keys: Vec<&str> = properties.iter().map(|p| p.key.as_str()).collect();
            assert_eq!(keys, vec!["a", "b", "3", "c", "c"]);
            assert!(matches!(properties[3].kind, PropertyKind::Get(_)));
            assert!(matches!(properties[4].kind, PropertyKind::Set(_)));
        }
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_property_named_get() {
    match first_expression("({ get: 1 })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties[0].key, "get");
            assert!(matches!(properties[0].kind, PropertyKind::Init(_)));
        }
        other => panic!("Unexpected tree {:?}", other),
    }
}

#[test]
fn test_statements_without_semicolons() {
    let program = parse_ok("var a = 1\nvar b = a\nb++\n");
    assert_eq!(program.body.len(), 3);
}

#[test]
fn test_for_in_and_for_statements() {
    let program = parse_ok("for (var k in o) {}\nfor (k in o) ;\nfor (var i = 0; i < 3; i++) {}\nfor (;;) break;");
    assert!(matches!(program.body[0], StatementType::ForInStatement(_)));
    assert!(matches!(program.body[1], StatementType::ForInStatement(_)));
    match &program.body[2] {
        StatementType::ForStatement {
            init, test, update, ..
        } => {
            assert!(matches!(
                init,
                Some(VariableDeclarationOrExpression::VariableDeclaration(_))
            ));
            assert!(test.is_some());
            assert!(update.is_some());
        }
        other => panic!("Unexpected statement {:?}", other),
    }
    assert!(matches!(
        program.body[3],
        StatementType::ForStatement {
            init: None,
            test: None,
            update: None,
            ..
        }
    ));
}

#[test]
fn test_labels_and_jumps() {
    let program = parse_ok("outer: while (true) { continue outer; break; }");
    match &program.body[0] {
        StatementType::LabeledStatement { label, body, .. } => {
            assert_eq!(label.name, "outer");
            assert!(body.is_iteration_statement());
        }
        other => panic!("Unexpected statement {:?}", other),
    }
}

#[test]
fn test_try_switch_and_meta() {
    let program = parse_ok("try {\n  x();\n} catch (e) {} finally {}\nswitch (x) { case 1: a(); default: b(); }");
    match &program.body[0] {
        StatementType::TryStatement {
            handler, finalizer, block, ..
        } => {
            assert_eq!(handler.as_ref().map(|h| h.param.name.as_str()), Some("e"));
            assert!(finalizer.is_some());
            assert_eq!(block.body[0].get_meta().line, 2);
            assert_eq!(block.body[0].get_meta().column, 3);
        }
        other => panic!("Unexpected statement {:?}", other),
    }
    match &program.body[1] {
        StatementType::SwitchStatement { cases, .. } => {
            assert_eq!(cases.len(), 2);
            assert!(cases[1].test.is_none());
        }
        other => panic!("Unexpected statement {:?}", other),
    }
}

#[test]
fn test_comments_are_skipped() {
    let program = parse_ok("// leading\nvar a = /* inline */ 1; /* trailing */");
    assert_eq!(program.body.len(), 1);
}

#[test]
fn test_regex_literals_are_not_supported() {
    assert!(JsParser::parse_to_ast_from_str("var r = /ab+c/;").is_err());
}

#[test]
fn test_hoisting_semantics() {
    let program = parse_ok(
        "var a; if (x) { var b = 1; function f() { var inner; } } for (var i = 0;;) {} function g() {}",
    );
    assert_eq!(var_declared_names(&program.body), vec!["a", "b", "i"]);
    let names: Vec<String> = function_declarations(&program.body)
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(names, vec!["f", "g"]);
}

#[test]
fn test_token_tree_rendering() {
    let tree = JsParser::parse_to_token_tree("a;").unwrap();
    assert!(tree.starts_with("script"));
    assert!(tree.contains("identifier"));
}
