use crate::diagnostics::Diagnostics;
use crate::evaluator::{evaluate, EvalValue};
use crate::scanner::scan;
use crate::token::Token;

#[allow(dead_code)]
pub fn scan_clean(code: &str) -> Vec<Token> {
    let (tokens, diagnostics) = scan(code);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics in test setup: {diagnostics:?}"
    );
    tokens
}

#[allow(dead_code)]
pub fn eval_source(code: &str) -> (EvalValue, Diagnostics) {
    evaluate(&scan_clean(code))
}
