use std::fs::read_to_string;
use std::path::Path;
use std::process::exit;
use std::{env, io};

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::evaluator::evaluate;
use crate::scanner::scan;

mod diagnostics;
mod evaluator;
mod scanner;
mod test_helpers;
mod token;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error("file does not seem to exist {0}")]
    FileDoesNotExist(String),
}

fn main() -> Result<(), color_eyre::eyre::Error> {
    color_eyre::install()?;

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: rlox [tokenize|evaluate] <filename>");
        exit(1);
    }
    let command = &args[1];
    let filename = &args[2];

    let source = match read_source(filename) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{error}");
            exit(1);
        }
    };

    let status = match command.as_str() {
        "tokenize" => run_tokenize(&source),
        "evaluate" => run_evaluate(&source),
        _ => {
            eprintln!("Unknown command: {command}");
            exit(1);
        }
    };
    exit(status);
}

fn read_source(path_string: &str) -> Result<String, CliError> {
    let path = Path::new(path_string);
    if !path.try_exists()? {
        return Err(CliError::FileDoesNotExist(path_string.to_string()));
    }
    Ok(read_to_string(path)?)
}

fn run_tokenize(source: &str) -> i32 {
    let (tokens, diagnostics) = scan(source);
    for diagnostic in diagnostics.iter() {
        eprintln!("{diagnostic}");
    }
    for token in &tokens {
        println!("{token}");
    }
    exit_status(&diagnostics)
}

fn run_evaluate(source: &str) -> i32 {
    let (tokens, lex_diagnostics) = scan(source);
    if !lex_diagnostics.is_empty() {
        // a broken token stream is not worth evaluating
        for diagnostic in lex_diagnostics.iter() {
            eprintln!("{diagnostic}");
        }
        return exit_status(&lex_diagnostics);
    }

    let (value, diagnostics) = evaluate(&tokens);
    if diagnostics.is_empty() {
        println!("{value}");
    }
    for diagnostic in diagnostics.iter() {
        eprintln!("{diagnostic}");
    }
    exit_status(&diagnostics)
}

/// the whole exit-code contract: any diagnostic from the selected mode is 65,
/// a clean run is 0. Usage and file errors exit 1 before we get here.
fn exit_status(diagnostics: &Diagnostics) -> i32 {
    if diagnostics.is_empty() {
        0
    } else {
        65
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Diagnostics;
    use crate::exit_status;

    #[test]
    fn test_exit_status_mapping() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(exit_status(&diagnostics), 0);
        diagnostics.report(1, "Unexpected character: @".to_string());
        assert_eq!(exit_status(&diagnostics), 65);
    }
}
