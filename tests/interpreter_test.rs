use std::{
    fs::{read_dir, read_to_string},
    path::Path,
    str::FromStr,
};

use color_eyre::{eyre::Context, Result};
use foxlite::{
    interpreter::{context::BufferedContext, Environment, Evaluator},
    lexer::Lexer,
    parser::{
        formatter::{BasicParserFormatter, ParserFormatter},
        Parser,
    },
    value::{
        error::RuntimeErrorKind,
        formatter::{BasicFormatter, ValueFormatter},
        Value,
    },
};

#[test]
fn test_operator() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/operator");
    test_engine(input_dir)
}

#[test]
fn test_string() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/string");
    test_engine(input_dir)
}

#[test]
fn test_assignment() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/assignment");
    test_engine(input_dir)
}

#[test]
fn test_declaration() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/declaration");
    test_engine(input_dir)
}

#[test]
fn test_scope() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/scope");
    test_engine(input_dir)
}

#[test]
fn test_call() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/call");
    test_engine(input_dir)
}

#[test]
fn test_control() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/control");
    test_engine(input_dir)
}

#[test]
fn test_logical() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/logical");
    test_engine(input_dir)
}

#[test]
fn test_result() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/result");
    test_engine(input_dir)
}

#[test]
fn test_syntax() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/syntax");
    test_engine(input_dir)
}

struct TestCase {
    name: String,
    source: String,
    output: String,
    result: Option<String>,
    syntax_errors: String,
    runtime_errors: String,
}

impl TestCase {
    pub fn check(&self) {
        let mut parser = Parser::new(Lexer::new(&self.source));
        let (program, errors) = parser
            .parse()
            .unwrap_or_else(|e| panic!("Failed test {} with lexical error {e}.", self.name));

        if !errors.is_empty() {
            let actual: Vec<String> = errors
                .iter()
                .map(|e| BasicParserFormatter.format_error(e))
                .collect();
            assert_eq!(
                self.syntax_errors,
                actual.join("\n"),
                "Failed test {} at parsing stage.",
                self.name,
            );
            return;
        }
        assert!(
            self.syntax_errors.is_empty(),
            "Failed test {}: expected syntax errors.",
            self.name
        );

        let value_formatter = BasicFormatter::new(&self.source);
        let environment = Environment::new_global();
        let mut evaluator = Evaluator::new(BufferedContext::new());
        let result = evaluator.evaluate_program(&program, &environment);
        let printed = evaluator.into_context().into_data();
        assert_eq!(self.output, printed, "Failed test {} at print.", self.name);

        match result {
            Ok(value) => {
                assert!(
                    self.runtime_errors.is_empty(),
                    "Failed test {}: expected a runtime error.",
                    self.name
                );
                if let Some(ref expected) = self.result {
                    assert_eq!(
                        expected,
                        &value_formatter.format(&value),
                        "Failed test {} at result.",
                        self.name
                    );
                }
            }
            Err(e) => {
                let msg = value_formatter.format_error(&e);
                assert_eq!(
                    self.runtime_errors, msg,
                    "Failed test {} at runtime.",
                    self.name,
                );
            }
        }
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension() else {
            continue;
        };

        if extension != "prg" {
            continue;
        }

        println!("Parsing {path:?}");
        let test_case = parse_test_case(&path)?;
        println!("Checking {}", test_case.name);

        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }

    assert!(succeeded, "Some test cases in {input_dir:?} failed.");

    Ok(())
}

fn strip_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let comment_index = line.find(marker)?;
    line[comment_index..]
        .strip_prefix(marker)
        .map(|rest| rest.trim())
}

fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    let test_name = AsRef::<Path>::as_ref(
        input_path
            .file_name()
            .expect("File name can't be none as the path is to a real file."),
    )
    .to_string_lossy();

    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut source_lines = Vec::new();
    let mut expected_outputs = Vec::new();
    let mut expected_result = None;
    let mut expected_syntax_errors = Vec::new();
    let mut expected_runtime_errors = Vec::new();

    for (line_index, line) in input.lines().enumerate() {
        if let Some(expected) = strip_after(line, "// expect:") {
            expected_outputs.push(expected.to_string());
        } else if let Some(expected) = strip_after(line, "// expect result:") {
            expected_result = Some(expected.to_string());
        } else if let Some(expected) = strip_after(line, "// expect syntax error:") {
            expected_syntax_errors.push(expected.to_string());
        } else if let Some(expected) = strip_after(line, "// expect runtime error:") {
            let expected = format!("({}) {expected}", line_index + 1);
            expected_runtime_errors.push(expected);
        }
        source_lines.push(line.to_string());
    }

    expected_outputs.push(String::from_str("")?);
    Ok(TestCase {
        name: test_name.into_owned(),
        source: source_lines.join("\n"),
        output: expected_outputs.join("\n"),
        result: expected_result,
        syntax_errors: expected_syntax_errors.join("\n"),
        runtime_errors: expected_runtime_errors.join("\n"),
    })
}

// Direct checks

fn run(source: &str) -> (std::result::Result<Value, RuntimeErrorKind>, String) {
    let environment = Environment::new_global();
    run_in(source, &environment)
}

fn run_in(
    source: &str,
    environment: &Environment,
) -> (std::result::Result<Value, RuntimeErrorKind>, String) {
    let mut parser = Parser::new(Lexer::new(source));
    let (program, errors) = parser.parse().expect("Source is lexically valid.");
    assert!(errors.is_empty(), "Unexpected syntax errors {errors:?}");
    let mut evaluator = Evaluator::new(BufferedContext::new());
    let result = evaluator
        .evaluate_program(&program, environment)
        .map_err(|e| e.kind);
    (result, evaluator.into_context().into_data())
}

fn number(result: std::result::Result<Value, RuntimeErrorKind>) -> f64 {
    match result {
        Ok(Value::Number(v)) => v,
        other => panic!("Expected a number but got {other:?}"),
    }
}

#[test]
fn test_end_to_end_return() {
    let (result, output) = run("LOCAL A = 10\nLOCAL B = 20\nRETURN A + B");
    assert_eq!(number(result), 30.0);
    assert_eq!(output, "");
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(number(run("1 + 2 * 3").0), 7.0);
    assert_eq!(number(run("(1 + 2) * 3").0), 9.0);
    assert_eq!(number(run("10 - 3 - 2").0), 5.0);
    assert_eq!(number(run("2 * 3 - 4 / 2").0), 4.0);
}

#[test]
fn test_and_skips_right_operand() {
    let source = "FUNCTION boom\n    RETURN 1 / 0\nENDFUNC\n.F. AND boom()";
    assert!(matches!(run(source).0, Ok(Value::Boolean(false))));
    let source = "FUNCTION boom\n    RETURN 1 / 0\nENDFUNC\n.T. OR boom()";
    assert!(matches!(run(source).0, Ok(Value::Boolean(true))));
    let source = "FUNCTION boom\n    RETURN 1 / 0\nENDFUNC\n.T. AND boom()";
    assert_eq!(run(source).0.unwrap_err(), RuntimeErrorKind::DivisionByZero);
}

#[test]
fn test_local_is_hidden_from_callees() {
    let source = "FUNCTION outer\n\
                  LOCAL x = 1\n\
                  FUNCTION inner\n\
                  RETURN x\n\
                  ENDFUNC\n\
                  RETURN inner()\n\
                  ENDFUNC\n\
                  outer()";
    assert_eq!(
        run(source).0.unwrap_err(),
        RuntimeErrorKind::UndefinedVariable("x".into())
    );

    let source = source.replace("LOCAL x", "PRIVATE x");
    assert_eq!(number(run(&source).0), 1.0);
}

#[test]
fn test_division_by_zero() {
    assert_eq!(run("1 / 0").0.unwrap_err(), RuntimeErrorKind::DivisionByZero);
}

#[test]
fn test_string_minus_trims_left_operand() {
    match run("'AB  ' - 'CD'").0 {
        Ok(Value::String(s)) => assert_eq!(s, "ABCD"),
        other => panic!("Unexpected result {other:?}"),
    }
}

#[test]
fn test_missing_arguments_default_to_false() {
    let source = "FUNCTION f(a, b)\n    RETURN b\nENDFUNC\nf(1)";
    assert!(matches!(run(source).0, Ok(Value::Boolean(false))));

    let source = "FUNCTION f(a)\nENDFUNC\nf(1, 2)";
    assert_eq!(
        run(source).0.unwrap_err(),
        RuntimeErrorKind::TooManyArguments {
            name: "f".into(),
            expected: 1,
            actual: 2
        }
    );
}

#[test]
fn test_do_case_runs_first_match_only() {
    let source = "DO CASE\n\
                  CASE 1 == 2\n\
                  ? 'a'\n\
                  CASE 2 == 2\n\
                  ? 'b'\n\
                  CASE 3 == 3\n\
                  ? 'c'\n\
                  OTHERWISE\n\
                  ? 'd'\n\
                  ENDCASE";
    let (result, output) = run(source);
    assert!(result.is_ok());
    assert_eq!(output, "b\n");
}

#[test]
fn test_loop_and_exit() {
    let source = "LOCAL i = 0\n\
                  LOCAL total = 0\n\
                  DO WHILE .T.\n\
                  i += 1\n\
                  IF i > 5\n\
                  EXIT\n\
                  ENDIF\n\
                  IF i == 3\n\
                  LOOP\n\
                  ENDIF\n\
                  total += i\n\
                  ENDDO\n\
                  RETURN total";
    assert_eq!(number(run(source).0), 12.0);
}

#[test]
fn test_stray_loop_control() {
    assert_eq!(
        run("EXIT").0.unwrap_err(),
        RuntimeErrorKind::StrayLoopControl("EXIT")
    );
    assert_eq!(
        run("IF .T.\n    LOOP\nENDIF").0.unwrap_err(),
        RuntimeErrorKind::StrayLoopControl("LOOP")
    );
}

#[test]
fn test_print_joins_values_with_spaces() {
    let (_, output) = run("? 1, 'two', .T., NULL\n?");
    assert_eq!(output, "1 two .T. .NULL.\n\n");
}

#[test]
fn test_errors_stop_execution() {
    let (result, output) = run("? 'before'\nmissing\n? 'after'");
    assert_eq!(
        result.unwrap_err(),
        RuntimeErrorKind::UndefinedVariable("missing".into())
    );
    assert_eq!(output, "before\n");
}

#[test]
fn test_global_environment_persists_between_programs() {
    let environment = Environment::new_global();
    let (result, _) = run_in("LOCAL total = 1\nFUNCTION twice(n)\n    RETURN n * 2\nENDFUNC", &environment);
    assert!(result.is_ok());
    let (result, _) = run_in("total = twice(total + 1)", &environment);
    assert_eq!(number(result), 4.0);
    let (result, output) = run_in("? total", &environment);
    assert!(matches!(result, Ok(Value::None)));
    assert_eq!(output, "4\n");
}

#[test]
fn test_runtime_error_reports_line() -> Result<()> {
    let source = "LOCAL a = 1\n\n? a + 'x'";
    let mut parser = Parser::new(Lexer::new(source));
    let (program, _) = parser.parse()?;
    let mut evaluator = Evaluator::new(BufferedContext::new());
    let error = evaluator
        .evaluate_program(&program, &Environment::new_global())
        .expect_err("numeric + character is a type mismatch");
    assert_eq!(error.code(), "RT003");
    assert_eq!(
        BasicFormatter::new(source).format_error(&error),
        "(3) operator/operand type mismatch: numeric + character"
    );
    Ok(())
}
