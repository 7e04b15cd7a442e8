//! Rule processing: one evaluation routine per syntax-node kind, producing completion records.

/// Evaluates an expression to its value, returning early from the enclosing rule if the
/// evaluation completed abruptly.
macro_rules! value {
    ($ctx:expr, $expr:expr) => {{
        let completion = $crate::runner::eval::rule_processor::process_expression($expr, $ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        completion.get_value()
    }};
}

/// Evaluates an identifier or member expression to a reference, returning early from the
/// enclosing rule if evaluating its base completed abruptly.
macro_rules! reference {
    ($ctx:expr, $expr:expr) => {
        match $crate::runner::eval::rule_processor::process_reference($expr, $ctx)? {
            Ok(reference) => reference,
            Err(abrupt) => return Ok(abrupt),
        }
    };
}

/// Unwraps the result of a native operation, or reports the error and completes the
/// enclosing rule with Unknown.
macro_rules! recoverable {
    ($ctx:expr, $result:expr) => {
        match $result {
            Ok(v) => v,
            Err(e) => return Ok($ctx.recover(e)),
        }
    };
}

pub mod ambiguous;
pub mod expression;
pub mod function;
pub mod rule_processor;
pub mod statement;
pub mod types;

pub use types::{Completion, CompletionType, Reference, ReferenceBase};
