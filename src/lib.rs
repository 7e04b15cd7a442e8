//! # codeprocessor - static abstract interpreter for ECMAScript 5
//!
//! Simulates the execution of a script without running it, so that analyses can observe what
//! the program would do. Values that cannot be decided statically are `Unknown`; branches
//! behind an unknown test are visited once inside an *ambiguous block*, and loops are bounded
//! by an iteration limit so that processing always terminates.
//!
//! ## Quick Start
//!
//! ### Parsing JavaScript
//!
//! ```
//! use codeprocessor::parser::JsParser;
//!
//! let ast = JsParser::parse_to_ast_from_str("var x = 5 + 3;").unwrap();
//! assert_eq!(ast.body.len(), 1);
//! ```
//!
//! ### Processing a program
//!
//! ```
//! use codeprocessor::runner::api::CodeProcessor;
//! use codeprocessor::runner::ds::value::JsValue;
//! use codeprocessor::runner::runtime::RuntimeOptions;
//!
//! let mut processor = CodeProcessor::new(RuntimeOptions::default()).unwrap();
//! processor.define_unknown_global("input");
//! let results = processor
//!     .process_source("main.js", "var a = 1; if (input) { a = 2; } var b = a + 1;")
//!     .unwrap();
//!
//! assert!(results.is_normal());
//! assert_eq!(results.global("b"), Some(JsValue::Unknown));
//! assert_eq!(results.unknown_conditions.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and syntax tree types
//! - **[`runner`]** - The abstract interpreter
//!   - **[`runner::api`]** - `CodeProcessor` entry point and results
//!   - **[`runner::ds`]** - Values, objects, property descriptors, environments
//!   - **[`runner::eval`]** - Rule processor and the per-node rules
//!   - **[`runner::plugin`]** - Built-in registry and event subscribers
//!   - **[`runner::std_lib`]** - Core built-in objects

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
