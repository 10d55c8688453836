use color_eyre::eyre::Result;
use proptest::prelude::*;

use foxlite::{
    lexer::{Lexer, LexicalErrorKind, TokenKind},
    parser::{
        formatter::{
            BasicParserFormatter, ParserFormatter, ProgramFormatter, SExpressionFormatter,
            SourceFormatter,
        },
        statement::Statement,
        Parser, ParserError, ParserErrorKind,
    },
};

fn parse_sexpr(input: &str) -> (String, Vec<ParserError>) {
    let mut parser = Parser::new(Lexer::new(input));
    let (program, errors) = parser
        .parse()
        .expect("Test input should be lexically valid.");
    (SExpressionFormatter.format(&program), errors)
}

fn check(input: &str, expected: &str) {
    let (actual, errors) = parse_sexpr(input);
    assert!(errors.is_empty(), "Unexpected syntax errors {errors:?} for {input:?}");
    assert_eq!(actual, expected, "Input: {input:?}");
}

fn check_errors(input: &str, expected: &[&str]) {
    let (_, errors) = parse_sexpr(input);
    let messages: Vec<String> = errors
        .iter()
        .map(|error| BasicParserFormatter.format_error(error))
        .collect();
    assert_eq!(messages, expected, "Input: {input:?}");
}

#[test]
fn test_atoms() {
    check("1.50", "1.5\n");
    check("'hi'", "\"hi\"\n");
    check(".T.", ".T.\n");
    check("false", ".F.\n");
    check("NULL", "null\n");
    check("Total", "total\n");
}

#[test]
fn test_arithmetic_precedence() {
    check("1 + 2 * 3", "(+ 1 (* 2 3))\n");
    check("(1 + 2) * 3", "(* (+ 1 2) 3)\n");
    check("10 - 3 - 2", "(- (- 10 3) 2)\n");
    check("8 / 4 / 2", "(/ (/ 8 4) 2)\n");
    check("-a * b", "(* (- a) b)\n");
    check("!a == b", "(== (! a) b)\n");
}

#[test]
fn test_comparison_and_logic() {
    check("a < b == c >= d", "(== (< a b) (>= c d))\n");
    check("a OR b AND c", "(OR a (AND b c))\n");
    check("a AND b OR c", "(OR (AND a b) c)\n");
    check("x > 1 AND y != 2", "(AND (> x 1) (!= y 2))\n");
}

#[test]
fn test_assignment() {
    check("a = b = 1", "(= a (= b 1))\n");
    check("x += 1", "(+= x 1)\n");
    check("x := y OR z", "(:= x (OR y z))\n");
    check("total /= 2 * n", "(/= total (* 2 n))\n");
}

#[test]
fn test_calls_and_iif() {
    check("f()", "(call f)\n");
    check("f(1, g(2))", "(call f 1 (call g 2))\n");
    check("IIF(a > 1, 'y', \"n\")", "(iif (> a 1) \"y\" \"n\")\n");
    check("LEN(name) + 1", "(+ (call len name) 1)\n");
}

#[test]
fn test_declarations() {
    check(
        "LOCAL X = 10\nLOCAL B AS NUMBER\nPUBLIC a, b = 2\nPRIVATE (c = 1,\n d)",
        "(local x 10)\n\
         (local b :number)\n\
         (public-inline (a) (b 2))\n\
         (private-inline (c 1) (d))\n",
    );
    check("LOCAL s AS Character", "(local s :string)\n");
}

#[test]
fn test_function_declarations() {
    check(
        "FUNCTION add(a, b)\n  RETURN a + b\nENDFUNC",
        "(function add (a b) (block (return (+ a b))))\n",
    );
    check(
        "FUNCTION hello\n? 'hi'\nENDFUNC",
        "(function hello () (block (print \"hi\")))\n",
    );
    check(
        "FUNCTION f\nRETURN\nENDFUNC",
        "(function f () (block (return)))\n",
    );
}

#[test]
fn test_if_statements() {
    check(
        "IF x > 1 THEN\n? 1\nELSE\n? 2\nENDIF",
        "(if (> x 1) (block (print 1)) (block (print 2)))\n",
    );
    check("IF x\nENDIF", "(if x (block))\n");
}

#[test]
fn test_do_case_statement() {
    check(
        "DO CASE\nCASE a\n? 1\nCASE b\n? 2\nOTHERWISE\n? 3\nENDCASE",
        "(do-case (case a (block (print 1))) (case b (block (print 2))) (otherwise (block (print 3))))\n",
    );
}

#[test]
fn test_while_statements() {
    check(
        "DO WHILE i < 3\ni += 1\nIF i == 2\nLOOP\nENDIF\nEXIT\nENDDO",
        "(while (< i 3) (block (+= i 1) (if (== i 2) (block (loop))) (exit)))\n",
    );
    check("WHILE .T.\nENDDO", "(while .T. (block))\n");
}

#[test]
fn test_statement_separators() {
    check("a = 1; b = 2", "(= a 1)\n(= b 2)\n");
    check("? 1, 2 && trailing\n\n?", "(print 1 2)\n(print)\n");
}

#[test]
fn test_unexpected_tokens_are_reported() {
    check_errors(
        "LOCAL = 1",
        &["Syntax error at (1:7) expected a name but found EQUAL."],
    );
    check_errors(
        "IF .T.\n    ? 1",
        &["Syntax error at (2:8) expected ENDIF but found EOF."],
    );
    check_errors(
        "FUNCTION f(1)\nENDFUNC",
        &[
            "Syntax error at (1:12) expected a name but found NUMBER.",
            "Syntax error at (2:1) expected an expression but found ENDFUNC.",
        ],
    );
}

#[test]
fn test_parser_recovers_at_next_line() {
    let (program, errors) = parse_sexpr("x = \ny = 2");
    assert_eq!(
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["Syntax error at (1:5) expected an expression but found NEWLINE."]
    );
    assert_eq!(program, "(= y 2)\n");

    let (program, errors) = parse_sexpr("1 +\n)\n? 3");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].kind, ParserErrorKind::NonExpression(TokenKind::Newline));
    assert_eq!(
        errors[1].kind,
        ParserErrorKind::NonExpression(TokenKind::RightParenthesis)
    );
    assert_eq!((errors[1].line, errors[1].col), (2, 1));
    assert_eq!(program, "(print 3)\n");
}

#[test]
fn test_unknown_type_and_case_branch() {
    let (_, errors) = parse_sexpr("LOCAL x AS money");
    assert_eq!(errors[0].kind, ParserErrorKind::UnknownType("money".into()));
    assert_eq!(errors[0].code(), "SY005");

    let (_, errors) = parse_sexpr("DO CASE\nCASE a\n? 1");
    assert_eq!(errors[0].kind, ParserErrorKind::NonCaseBranch(TokenKind::Eof));

    let (_, errors) = parse_sexpr("DO CASE\n? 1\nENDCASE");
    assert_eq!(
        errors[0].kind,
        ParserErrorKind::NonCaseBranch(TokenKind::Question)
    );
}

#[test]
fn test_lexical_error_aborts_parse() {
    let mut parser = Parser::new(Lexer::new("x = 1\ny = @"));
    let error = parser.parse().expect_err("@ is not a valid character");
    assert_eq!(error.kind, LexicalErrorKind::Unrecognized('@'));
    assert_eq!((error.line, error.col), (2, 5));
}

#[test]
fn test_statement_shapes() -> Result<()> {
    let mut parser = Parser::new(Lexer::new("LOCAL a, b\nLOCAL (c)\nEXIT"));
    let (program, errors) = parser.parse()?;
    assert!(errors.is_empty());
    assert_eq!(program.len(), 3);
    let statements: Vec<&Statement> = program.iter().collect();
    assert!(matches!(
        statements[0],
        Statement::InlineVariableDecl(decl) if !decl.grouped && decl.declarators.len() == 2
    ));
    assert!(matches!(
        statements[1],
        Statement::InlineVariableDecl(decl) if decl.grouped && decl.declarators.len() == 1
    ));
    assert!(matches!(statements[2], Statement::Exit(_)));
    Ok(())
}

#[test]
fn test_source_formatter() -> Result<()> {
    let input = "local x as number = 1 + 2 * 3\n\
                 private (a = \"it's\", b)\n\
                 function f(p)\n\
                 if p then\n\
                 return -p\n\
                 endif\n\
                 endfunc\n\
                 do case\n\
                 case x == 7\n\
                 ? iif(.t., null, f(x))\n\
                 endcase\n\
                 do while x > 0\n\
                 x -= 1\n\
                 exit\n\
                 enddo";
    let mut parser = Parser::new(Lexer::new(input));
    let (program, errors) = parser.parse()?;
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        SourceFormatter.format(&program),
        "LOCAL x AS NUMBER = 1 + (2 * 3)\n\
         PRIVATE (a = \"it's\", b)\n\
         FUNCTION f(p)\n\
         \x20   IF p THEN\n\
         \x20       RETURN -p\n\
         \x20   ENDIF\n\
         ENDFUNC\n\
         DO CASE\n\
         \x20   CASE x == 7\n\
         \x20       ? IIF(.T., NULL, f(x))\n\
         ENDCASE\n\
         DO WHILE x > 0\n\
         \x20   x -= 1\n\
         \x20   EXIT\n\
         ENDDO\n"
    );
    Ok(())
}

// Property-based tests

fn leaf_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,3}".prop_map(|s: String| s),
        prop::sample::select(vec!["a", "b", "total", "f"]).prop_map(String::from),
        "'[a-z ]{0,8}'".prop_map(|s: String| s),
        Just(".T.".to_string()),
        Just(".F.".to_string()),
        Just("NULL".to_string()),
    ]
}

fn expression_strategy() -> impl Strategy<Value = String> {
    leaf_strategy().prop_recursive(4, 32, 3, |inner| {
        let operator = prop::sample::select(vec![
            "+", "-", "*", "/", "<", "<=", ">", ">=", "==", "!=", "AND", "OR",
        ]);
        prop_oneof![
            (inner.clone(), operator, inner.clone())
                .prop_map(|(lhs, op, rhs)| format!("({lhs} {op} {rhs})")),
            inner.clone().prop_map(|e| format!("-{e}")),
            inner.clone().prop_map(|e| format!("!{e}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("f({a}, {b})")),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, a, b)| format!("IIF({c}, {a}, {b})")),
        ]
    })
}

fn statement_strategy() -> impl Strategy<Value = String> {
    let expr = expression_strategy;
    prop_oneof![
        expr().prop_map(|e| format!("x = {e}")),
        (expr(), expr()).prop_map(|(a, b)| format!("? {a}, {b}")),
        expr().prop_map(|e| format!("LOCAL v AS NUMBER = {e}")),
        expr().prop_map(|e| format!("PUBLIC p, q = {e}")),
        (expr(), expr())
            .prop_map(|(c, e)| format!("IF {c}\n    ? {e}\nELSE\n    RETURN {e}\nENDIF")),
        (expr(), expr())
            .prop_map(|(c, e)| format!("DO WHILE {c}\n    total += {e}\n    LOOP\nENDDO")),
        expr().prop_map(|c| {
            format!("DO CASE\n    CASE {c}\n        EXIT\n    OTHERWISE\n        ?\nENDCASE")
        }),
        (expr(), expr()).prop_map(|(a, b)| format!("FUNCTION g(m, n)\n    RETURN IIF(m, {a}, {b})\nENDFUNC")),
    ]
}

fn program_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(statement_strategy(), 1..8).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn source_formatter_round_trips(input in program_strategy()) {
        let mut parser = Parser::new(Lexer::new(&input));
        let (program, errors) = parser.parse().expect("Generated input is lexically valid.");
        prop_assert!(errors.is_empty(), "{:?}", errors);
        let expected = SExpressionFormatter.format(&program);

        let formatted = SourceFormatter.format(&program);
        let mut parser = Parser::new(Lexer::new(&formatted));
        let (reparsed, errors) = parser.parse().expect("Formatted source is lexically valid.");
        prop_assert!(errors.is_empty(), "{:?}", errors);
        prop_assert_eq!(SExpressionFormatter.format(&reparsed), expected);
    }

    #[test]
    fn parser_never_panics_on_token_soup(input in "[a-z0-9 ().,=+/<>!?\n-]{0,64}") {
        let mut parser = Parser::new(Lexer::new(&input));
        prop_assert!(parser.parse().is_ok());
    }
}
