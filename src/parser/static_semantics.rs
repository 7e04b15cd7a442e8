use std::rc::Rc;

use crate::parser::ast::{
    FunctionData, StatementType, VariableDeclarationData, VariableDeclarationOrExpression,
};

/// Names introduced by `var` anywhere in `statements`, in source order and without duplicates.
/// Nested function bodies are not searched.
pub fn var_declared_names(statements: &[StatementType]) -> Vec<String> {
    let mut names = vec![];
    for stmt in statements {
        collect_var_names(stmt, &mut names);
    }
    names
}

/// Function declarations hoisted to the enclosing function or program, in source order.
pub fn function_declarations(statements: &[StatementType]) -> Vec<Rc<FunctionData>> {
    let mut functions = vec![];
    for stmt in statements {
        collect_functions(stmt, &mut functions);
    }
    functions
}

fn push_declaration_names(decl: &VariableDeclarationData, names: &mut Vec<String>) {
    for d in &decl.declarations {
        if !names.contains(&d.id.name) {
            names.push(d.id.name.clone());
        }
    }
}

fn collect_var_names(stmt: &StatementType, names: &mut Vec<String>) {
    match stmt {
        StatementType::VariableDeclaration(decl) => push_declaration_names(decl, names),
        StatementType::BlockStatement(block) => {
            for s in &block.body {
                collect_var_names(s, names);
            }
        }
        StatementType::LabeledStatement { body, .. }
        | StatementType::WhileStatement { body, .. }
        | StatementType::DoWhileStatement { body, .. } => collect_var_names(body, names),
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, names);
            if let Some(alt) = alternate {
                collect_var_names(alt, names);
            }
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) = init {
                push_declaration_names(decl, names);
            }
            collect_var_names(body, names);
        }
        StatementType::ForInStatement(data) => {
            if let VariableDeclarationOrExpression::VariableDeclaration(decl) = &data.left {
                push_declaration_names(decl, names);
            }
            collect_var_names(&data.body, names);
        }
        StatementType::SwitchStatement { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    collect_var_names(s, names);
                }
            }
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            for s in &block.body {
                collect_var_names(s, names);
            }
            if let Some(handler) = handler {
                for s in &handler.body.body {
                    collect_var_names(s, names);
                }
            }
            if let Some(finalizer) = finalizer {
                for s in &finalizer.body {
                    collect_var_names(s, names);
                }
            }
        }
        _ => { /* No var declarations possible */ }
    }
}

fn collect_functions(stmt: &StatementType, functions: &mut Vec<Rc<FunctionData>>) {
    match stmt {
        StatementType::FunctionDeclaration(f) => functions.push(f.clone()),
        StatementType::BlockStatement(block) => {
            for s in &block.body {
                collect_functions(s, functions);
            }
        }
        StatementType::LabeledStatement { body, .. } => collect_functions(body, functions),
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_functions(consequent, functions);
            if let Some(alt) = alternate {
                collect_functions(alt, functions);
            }
        }
        StatementType::SwitchStatement { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    collect_functions(s, functions);
                }
            }
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            for s in &block.body {
                collect_functions(s, functions);
            }
            if let Some(handler) = handler {
                for s in &handler.body.body {
                    collect_functions(s, functions);
                }
            }
            if let Some(finalizer) = finalizer {
                for s in &finalizer.body {
                    collect_functions(s, functions);
                }
            }
        }
        _ => { /* Declarations only appear at statement-list level */ }
    }
}
