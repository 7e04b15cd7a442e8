//! Extension surfaces.
//!
//! Two things can be plugged into a run:
//!
//! - **Built-ins**: a [`BuiltInRegistry`] lists the objects installed into each new realm.
//!   Embedders add host APIs by registering extra [`BuiltInObject`]s; their methods receive the
//!   [`EvalContext`](types::EvalContext) and may return Unknown for anything that depends on
//!   the outside world.
//! - **Subscribers**: an [`EventSubscriber`] sees every rule before and after it is processed,
//!   plus the diagnostics of the run. Subscribers observe; they cannot change evaluation.
//!
//! ```
//! use codeprocessor::runner::api::CodeProcessor;
//! use codeprocessor::runner::ds::realm::Realm;
//! use codeprocessor::runner::plugin::events::Event;
//! use codeprocessor::runner::runtime::RuntimeOptions;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let calls = Rc::new(RefCell::new(0));
//! let seen = calls.clone();
//! let mut processor = CodeProcessor::new(RuntimeOptions::default()).unwrap();
//! processor.subscribe(Box::new(move |event: &Event<'_>, _: &Realm| {
//!     if let Event::RulePre { kind, .. } = event {
//!         if kind.to_string() == "CallExpression" {
//!             *seen.borrow_mut() += 1;
//!         }
//!     }
//! }));
//! processor.process_source("a.js", "function f() {} f(); f();").unwrap();
//! assert_eq!(*calls.borrow(), 2);
//! ```

pub mod events;
pub mod registry;
pub mod types;

pub use events::{Event, EventSubscriber};
pub use registry::BuiltInRegistry;
pub use types::{BuiltInFn, BuiltInObject, EvalContext, NativeFn};
