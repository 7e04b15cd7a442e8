use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::ds::env_record::EnvId;
use crate::runner::plugin::types::BuiltInFn;

/// The callable capability of a function object. Dispatch happens on the variant.
#[derive(Clone)]
pub enum FunctionKind {
    Native {
        name: String,
        call: Option<BuiltInFn>,
        construct: Option<BuiltInFn>,
    },
    Script(ScriptFunction),
}

impl FunctionKind {
    pub fn native(name: impl Into<String>, call: BuiltInFn) -> Self {
        FunctionKind::Native {
            name: name.into(),
            call: Some(call),
            construct: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FunctionKind::Native { name, .. } => name,
            FunctionKind::Script(f) => f.data.name(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            FunctionKind::Native { construct, .. } => construct.is_some(),
            FunctionKind::Script(_) => true,
        }
    }
}

/// A closure over user code: the function's syntax and the environment it was created in.
#[derive(Clone)]
pub struct ScriptFunction {
    pub data: Rc<FunctionData>,
    pub scope: EnvId,
}
