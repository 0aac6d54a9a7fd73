use std::fmt;
use std::rc::Rc;

use crate::interpreter::Interpreter;
use crate::natives::NativeRegistry;
use crate::parser::{self, SyntaxError};
use crate::semantics::SemanticAnalyzer;

/// Diagnostic switches, all off by default.
///
/// Carried by value through every stage rather than living in process
/// globals, so runs with different switches can share a process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Scope traces and symbol-table dumps from analysis.
    pub scope: bool,
    /// ENTER/LEAVE lines and call-stack dumps from execution.
    pub stack: bool,
    /// Every token as the parser fetches it.
    pub tokens: bool,
    /// Debug forms of reported errors.
    pub internal_errors: bool,
}

/// Terminal state of one run. Each failing stage keeps its own variant so
/// callers can map outcomes to exit codes without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Success(String),
    LexError(String),
    ParseError(String),
    SemanticError(String),
    RuntimeError(String),
}

impl ExitOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitOutcome::Success(_) => 0,
            ExitOutcome::LexError(_) => 2,
            ExitOutcome::ParseError(_) => 3,
            ExitOutcome::SemanticError(_) => 4,
            ExitOutcome::RuntimeError(_) => 5,
        }
    }

    /// The printed program output on success, the diagnostic otherwise.
    pub fn message(&self) -> &str {
        match self {
            ExitOutcome::Success(text)
            | ExitOutcome::LexError(text)
            | ExitOutcome::ParseError(text)
            | ExitOutcome::SemanticError(text)
            | ExitOutcome::RuntimeError(text) => text,
        }
    }
}

/// Runs a source text through every stage with the stock natives.
pub fn run(source: &str, options: LogOptions) -> ExitOutcome {
    run_with_natives(source, options, Rc::new(NativeRegistry::standard()))
}

/// Same pipeline, but resolving calls against a caller-supplied registry.
pub fn run_with_natives(
    source: &str,
    options: LogOptions,
    natives: Rc<NativeRegistry>,
) -> ExitOutcome {
    let program = match parser::parse(source, options) {
        Ok(program) => program,
        Err(SyntaxError::Lex(error)) => {
            report(options, &error);
            return ExitOutcome::LexError(error.to_string());
        }
        Err(SyntaxError::Parse(error)) => {
            report(options, &error);
            return ExitOutcome::ParseError(error.to_string());
        }
    };

    if let Err(error) = SemanticAnalyzer::new(Rc::clone(&natives), options).analyze(&program) {
        report(options, &error);
        return ExitOutcome::SemanticError(error.to_string());
    }

    match Interpreter::new(natives, options).interpret(&program) {
        Ok(output) => ExitOutcome::Success(output),
        Err(error) => {
            report(options, &error);
            ExitOutcome::RuntimeError(error.to_string())
        }
    }
}

fn report<E: fmt::Debug>(options: LogOptions, error: &E) {
    if options.internal_errors {
        eprintln!("{error:?}");
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use indoc::indoc;
    use num_bigint::BigInt;

    use crate::interpreter::Value;
    use crate::natives::NativeRegistry;

    use super::{ExitOutcome, LogOptions, run, run_with_natives};

    #[test]
    fn success_carries_the_program_output() {
        let outcome = run("PROGRAM p;\nprint(\"hi\")", LogOptions::default());
        assert_eq!(outcome, ExitOutcome::Success("hi".to_string()));
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn each_failure_class_keeps_its_exit_code() {
        let cases = [
            ("PROGRAM p;\nx := @", 2),
            ("PROGRAM p;\nVAR x INTEGER", 3),
            ("PROGRAM p;\nx := 1", 4),
            ("PROGRAM p;\nprint(1 DIV 0)", 5),
        ];
        for (source, code) in cases {
            let outcome = run(source, LogOptions::default());
            assert_eq!(outcome.exit_code(), code, "{source}: {outcome:?}");
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let source = indoc! {r#"
            PROGRAM p;
            VAR total: INTEGER;
            total := 0;
            FUNCTION add(n: INTEGER) { print(n + 1) };
            add(total);
            add(41)
        "#};
        assert_eq!(
            run(source, LogOptions::default()),
            run(source, LogOptions::default())
        );
    }

    #[test]
    fn diagnostic_switches_leave_the_outcome_untouched() {
        let source = "PROGRAM p;\nVAR a: INTEGER;\na := 6 * 7;\nprint(a)";
        let all_on = LogOptions {
            scope: true,
            stack: true,
            tokens: true,
            internal_errors: true,
        };
        assert_eq!(run(source, all_on), run(source, LogOptions::default()));
    }

    #[test]
    fn host_natives_join_resolution() {
        let mut natives = NativeRegistry::standard();
        natives.register("greet", &[("name", "STRING")], |frame, output| {
            let name = frame.get("name")?;
            output.push(format!("hello {name}"));
            Ok(None)
        });
        let outcome = run_with_natives(
            "PROGRAM p;\ngreet(\"ada\")",
            LogOptions::default(),
            Rc::new(natives),
        );
        assert_eq!(outcome, ExitOutcome::Success("hello ada".to_string()));
    }

    #[test]
    fn native_return_values_flow_into_expressions() {
        let mut natives = NativeRegistry::standard();
        natives.register("six", &[], |_, _| Ok(Some(Value::Integer(BigInt::from(6)))));
        let outcome = run_with_natives(
            "PROGRAM p;\nVAR x: INTEGER;\nx := six() * 7;\nprint(x)",
            LogOptions::default(),
            Rc::new(natives),
        );
        assert_eq!(outcome, ExitOutcome::Success("42".to_string()));
    }
}
