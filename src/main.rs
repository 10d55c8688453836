use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use foxlite::{
    interpreter::{context::StdioContext, Environment, Evaluator},
    lexer::{
        formatter::{
            BasicFormatter as BasicTokenFormatter, DebugFormatter as DebugTokenFormatter,
            LineFormatter, PrettyFormatter as PrettyTokenFormatter, ToFormatter, TokenFormatter,
        },
        Lexer, TokenKind,
    },
    parser::{
        formatter::{
            BasicParserFormatter, DebugParserFormatter, DebugProgramFormatter, ParserFormatter,
            PrettyParserFormatter, ProgramFormatter, SExpressionFormatter, SourceFormatter,
        },
        Parser as FoxParser, ParserError, ParserErrorKind,
    },
    value::formatter::{
        BasicFormatter as BasicValueFormatter, DebugFormatter as DebugValueFormatter,
        PrettyFormatter as PrettyValueFormatter, ValueFormatter,
    },
};
use std::{
    fs::read_to_string,
    io::{BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

const EXIT_DATA_ERROR: u8 = 65;
const EXIT_SOFTWARE_ERROR: u8 = 70;

#[derive(Debug, Parser)]
#[clap(name = "foxlite", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: FoxliteCommand,
}

#[derive(Debug, Subcommand)]
pub enum FoxliteCommand {
    /// Print every token of a script.
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: TokenFormat,
    },
    /// Parse a script and print its syntax tree.
    Parse {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "sexpr")]
        format: ProgramFormat,
    },
    /// Run a script.
    Run {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "pretty")]
        format: DiagnosticFormat,
    },
    /// Start an interactive session sharing one global environment.
    Repl,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TokenFormat {
    Debug,
    Basic,
    Line,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ProgramFormat {
    Debug,
    #[clap(name = "sexpr")]
    SExpr,
    Source,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum DiagnosticFormat {
    Debug,
    Basic,
    Pretty,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    foxlite::init_tracing();
    let args = CLArgs::parse();
    let succeeded = match args.routine {
        FoxliteCommand::Tokenize { path, format } => {
            let src = read_to_string(&path)?;
            tokenize(&src, &path, &format)
        }
        FoxliteCommand::Parse { path, format } => {
            let src = read_to_string(&path)?;
            parse(&src, &path, &format)
        }
        FoxliteCommand::Run { path, format } => {
            let src = read_to_string(&path)?;
            return Ok(run(&src, &path, &format));
        }
        FoxliteCommand::Repl => {
            repl()?;
            true
        }
    };

    if succeeded {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_DATA_ERROR))
    }
}

fn tokenize(src: &str, path: &Path, format: &TokenFormat) -> bool {
    let mut lexer = Lexer::new(src);
    let formatter: Box<dyn TokenFormatter> = match format {
        TokenFormat::Debug => Box::new(ToFormatter::<DebugTokenFormatter>::create_formatter(&lexer)),
        TokenFormat::Basic => Box::new(ToFormatter::<BasicTokenFormatter>::create_formatter(&lexer)),
        TokenFormat::Line => Box::new(ToFormatter::<LineFormatter>::create_formatter(&lexer)),
    };
    loop {
        match lexer.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    return true;
                }
            }
            Err(error) => {
                eprintln!(
                    "{}",
                    PrettyTokenFormatter::new(src, path).format_lexical_error(&error)
                );
                return false;
            }
        }
    }
}

fn parse(src: &str, path: &Path, format: &ProgramFormat) -> bool {
    let mut parser = FoxParser::new(Lexer::new(src));
    let (program, errors) = match parser.parse() {
        Ok(result) => result,
        Err(error) => {
            eprintln!(
                "{}",
                PrettyTokenFormatter::new(src, path).format_lexical_error(&error)
            );
            return false;
        }
    };

    let error_formatter = PrettyParserFormatter::new(src, path);
    for error in errors.iter() {
        eprintln!("{}", error_formatter.format_error(error));
    }

    let formatter: Box<dyn ProgramFormatter> = match format {
        ProgramFormat::Debug => Box::new(DebugProgramFormatter),
        ProgramFormat::SExpr => Box::new(SExpressionFormatter),
        ProgramFormat::Source => Box::new(SourceFormatter),
    };
    print!("{}", formatter.format(&program));
    errors.is_empty()
}

fn run(src: &str, path: &Path, format: &DiagnosticFormat) -> ExitCode {
    let (parser_formatter, value_formatter): (
        Box<dyn ParserFormatter + '_>,
        Box<dyn ValueFormatter + '_>,
    ) = match format {
        DiagnosticFormat::Debug => (
            Box::new(DebugParserFormatter),
            Box::new(DebugValueFormatter),
        ),
        DiagnosticFormat::Basic => (
            Box::new(BasicParserFormatter),
            Box::new(BasicValueFormatter::new(src)),
        ),
        DiagnosticFormat::Pretty => (
            Box::new(PrettyParserFormatter::new(src, path)),
            Box::new(PrettyValueFormatter::new(src, path)),
        ),
    };

    let mut parser = FoxParser::new(Lexer::new(src));
    let program = match parser.parse() {
        Ok((program, errors)) if errors.is_empty() => program,
        Ok((_, errors)) => {
            for error in errors.iter() {
                eprintln!("{}", parser_formatter.format_error(error));
            }
            return ExitCode::from(EXIT_DATA_ERROR);
        }
        Err(error) => {
            eprintln!(
                "{}",
                PrettyTokenFormatter::new(src, path).format_lexical_error(&error)
            );
            return ExitCode::from(EXIT_DATA_ERROR);
        }
    };

    let mut evaluator = Evaluator::new(StdioContext);
    let environment = Environment::new_global();
    match evaluator.evaluate_program(&program, &environment) {
        Ok(value) => {
            if !value.is_none() {
                println!("{}", value_formatter.format(&value));
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", value_formatter.format_error(&error));
            ExitCode::from(EXIT_SOFTWARE_ERROR)
        }
    }
}

/// Errors caused by the input stopping early. The REPL reads another line for these.
fn is_incomplete(errors: &[ParserError]) -> bool {
    errors.iter().any(|error| {
        matches!(
            error.kind,
            ParserErrorKind::UnexpectedToken {
                actual: TokenKind::Eof,
                ..
            } | ParserErrorKind::NonExpression(TokenKind::Eof)
                | ParserErrorKind::NonCaseBranch(TokenKind::Eof)
        )
    })
}

fn repl() -> Result<()> {
    println!("FoxLite {}", env!("CARGO_PKG_VERSION"));
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut evaluator = Evaluator::new(StdioContext);
    let environment = Environment::new_global();
    let mut buffer = String::new();

    loop {
        print!("{}", if buffer.is_empty() { ">>> " } else { "... " });
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        if buffer.is_empty() {
            match line.trim() {
                "" => continue,
                command if command.eq_ignore_ascii_case("quit") => break,
                _ => {}
            }
        }
        buffer.push_str(&line);

        let mut parser = FoxParser::new(Lexer::new(&buffer));
        let program = match parser.parse() {
            Ok((program, errors)) if errors.is_empty() => program,
            Ok((_, errors)) if is_incomplete(&errors) && !line.trim().is_empty() => continue,
            Ok((_, errors)) => {
                for error in errors.iter() {
                    eprintln!("{}", BasicParserFormatter.format_error(error));
                }
                buffer.clear();
                continue;
            }
            Err(error) => {
                eprintln!("{}", BasicTokenFormatter.format_lexical_error(&error));
                buffer.clear();
                continue;
            }
        };

        let value_formatter = BasicValueFormatter::new(&buffer);
        match evaluator.evaluate_program(&program, &environment) {
            Ok(value) if !value.is_none() => println!("{}", value_formatter.format(&value)),
            Ok(_) => {}
            Err(error) => eprintln!("{}", value_formatter.format_error(&error)),
        }
        buffer.clear();
    }
    Ok(())
}
