use std::fmt::Debug;
use std::rc::Rc;

/// Source span of a node. `line` and `column` are 1-based and point at the start of the node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
    pub line: usize,
    pub column: usize,
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

impl HasMeta for IdentifierData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    ThisExpression {
        meta: Meta,
    },
    ArrayExpression {
        meta: Meta,
        elements: Vec<Option<ExpressionType>>,
    },
    ObjectExpression {
        meta: Meta,
        properties: Vec<PropertyData>,
    },
    FunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    UpdateExpression {
        meta: Meta,
        operator: UpdateOperator,
        argument: Box<ExpressionType>,
        prefix: bool,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    CallExpression {
        //A function or method call expression.
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    NewExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    MemberExpression(MemberExpressionType),
    SequenceExpression {
        //A comma-separated sequence of expressions
        meta: Meta,
        expressions: Vec<ExpressionType>,
    },
}

impl ExpressionType {
    /// True for the two forms that can appear on the left of an assignment.
    pub fn is_valid_simple_assignment_target(&self) -> bool {
        matches!(
            self,
            ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_)
        )
    }
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(data) => &data.meta,
            ExpressionType::Identifier(data) => &data.meta,
            ExpressionType::ThisExpression { meta } => meta,
            ExpressionType::ArrayExpression { meta, .. } => meta,
            ExpressionType::ObjectExpression { meta, .. } => meta,
            ExpressionType::FunctionExpression(data) => &data.meta,
            ExpressionType::UnaryExpression { meta, .. } => meta,
            ExpressionType::UpdateExpression { meta, .. } => meta,
            ExpressionType::BinaryExpression { meta, .. } => meta,
            ExpressionType::AssignmentExpression { meta, .. } => meta,
            ExpressionType::LogicalExpression { meta, .. } => meta,
            ExpressionType::ConditionalExpression { meta, .. } => meta,
            ExpressionType::CallExpression { meta, .. } => meta,
            ExpressionType::NewExpression { meta, .. } => meta,
            ExpressionType::MemberExpression(data) => data.get_meta(),
            ExpressionType::SequenceExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub enum MemberExpressionType {
    SimpleMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: IdentifierData,
    },
    ComputedMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: Box<ExpressionType>,
    },
}

impl HasMeta for MemberExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            MemberExpressionType::SimpleMemberExpression { meta, .. } => meta,
            MemberExpressionType::ComputedMemberExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub struct PropertyData {
    pub meta: Meta,
    pub key: String,
    pub kind: PropertyKind,
}

#[derive(Debug)]
pub enum PropertyKind {
    Init(ExpressionType),
    Get(Rc<FunctionData>),
    Set(Rc<FunctionData>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
    BitwiseLeftShiftEquals,
    BitwiseRightShiftEquals,
    BitwiseUnsignedRightShiftEquals,
    BitwiseOrEquals,
    BitwiseAndEquals,
    BitwiseXorEquals,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies before storing.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        Some(match self {
            AssignmentOperator::Equals => return None,
            AssignmentOperator::AddEquals => BinaryOperator::Add,
            AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
            AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
            AssignmentOperator::DivideEquals => BinaryOperator::Divide,
            AssignmentOperator::ModuloEquals => BinaryOperator::Modulo,
            AssignmentOperator::BitwiseLeftShiftEquals => BinaryOperator::BitwiseLeftShift,
            AssignmentOperator::BitwiseRightShiftEquals => BinaryOperator::BitwiseRightShift,
            AssignmentOperator::BitwiseUnsignedRightShiftEquals => {
                BinaryOperator::BitwiseUnsignedRightShift
            }
            AssignmentOperator::BitwiseOrEquals => BinaryOperator::BitwiseOr,
            AssignmentOperator::BitwiseAndEquals => BinaryOperator::BitwiseAnd,
            AssignmentOperator::BitwiseXorEquals => BinaryOperator::BitwiseXor,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    BitwiseNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    BitwiseLeftShift,
    BitwiseRightShift,
    BitwiseUnsignedRightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseOr,
    BitwiseAnd,
    BitwiseXor,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    Or,
    And,
}

#[derive(Debug)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, PartialEq)]
pub enum LiteralType {
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    NumberLiteral(f64),
}

#[derive(Debug)]
pub struct ProgramData {
    pub meta: Meta,
    /// Name the source was loaded from, used for event and diagnostic locations.
    pub file: String,
    pub body: Vec<StatementType>,
}

impl HasMeta for ProgramData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug)]
pub struct BlockStatementData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
}

#[derive(Debug)]
pub enum StatementType {
    ExpressionStatement {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    BlockStatement(BlockStatementData),
    EmptyStatement {
        meta: Meta,
    },
    DebuggerStatement {
        meta: Meta,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<Box<ExpressionType>>,
    },
    BreakStatement {
        meta: Meta,
        label: Option<IdentifierData>,
    },
    ContinueStatement {
        meta: Meta,
        label: Option<IdentifierData>,
    },
    LabeledStatement {
        meta: Meta,
        label: IdentifierData,
        body: Box<StatementType>,
    },
    IfStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    SwitchStatement {
        meta: Meta,
        discriminant: Box<ExpressionType>,
        cases: Vec<SwitchCaseData>,
    },
    ThrowStatement {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
    TryStatement {
        meta: Meta,
        block: BlockStatementData,
        handler: Option<CatchClauseData>,
        finalizer: Option<BlockStatementData>,
    },
    WhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    DoWhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ForStatement {
        meta: Meta,
        init: Option<VariableDeclarationOrExpression>,
        test: Option<Box<ExpressionType>>,
        update: Option<Box<ExpressionType>>,
        body: Box<StatementType>,
    },
    ForInStatement(ForIteratorData),
    VariableDeclaration(VariableDeclarationData),
    FunctionDeclaration(Rc<FunctionData>),
}

impl StatementType {
    pub fn is_iteration_statement(&self) -> bool {
        matches!(
            self,
            StatementType::WhileStatement { .. }
                | StatementType::DoWhileStatement { .. }
                | StatementType::ForStatement { .. }
                | StatementType::ForInStatement(_)
        )
    }
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::ExpressionStatement { meta, .. } => meta,
            StatementType::BlockStatement(data) => &data.meta,
            StatementType::EmptyStatement { meta } => meta,
            StatementType::DebuggerStatement { meta } => meta,
            StatementType::ReturnStatement { meta, .. } => meta,
            StatementType::BreakStatement { meta, .. } => meta,
            StatementType::ContinueStatement { meta, .. } => meta,
            StatementType::LabeledStatement { meta, .. } => meta,
            StatementType::IfStatement { meta, .. } => meta,
            StatementType::SwitchStatement { meta, .. } => meta,
            StatementType::ThrowStatement { meta, .. } => meta,
            StatementType::TryStatement { meta, .. } => meta,
            StatementType::WhileStatement { meta, .. } => meta,
            StatementType::DoWhileStatement { meta, .. } => meta,
            StatementType::ForStatement { meta, .. } => meta,
            StatementType::ForInStatement(data) => &data.meta,
            StatementType::VariableDeclaration(data) => &data.meta,
            StatementType::FunctionDeclaration(data) => &data.meta,
        }
    }
}

#[derive(Debug)]
pub struct FunctionBodyData {
    pub meta: Meta,
    pub body: Vec<StatementType>, /* Directives such as 'use strict' are parsed as plain expression statements */
}

impl HasMeta for FunctionBodyData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<IdentifierData>,
    pub body: FunctionBodyData,
}

impl FunctionData {
    pub fn name(&self) -> &str {
        match &self.id {
            Some(id) => &id.name,
            None => "",
        }
    }
}

impl HasMeta for FunctionData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug)]
pub struct ForIteratorData {
    pub meta: Meta,
    pub left: VariableDeclarationOrExpression,
    pub right: Box<ExpressionType>,
    pub body: Box<StatementType>,
}

#[derive(Debug)]
pub enum VariableDeclarationOrExpression {
    VariableDeclaration(VariableDeclarationData),
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct VariableDeclarationData {
    pub meta: Meta,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<Box<ExpressionType>>,
}

#[derive(Debug)]
pub struct SwitchCaseData {
    pub meta: Meta,
    pub test: Option<ExpressionType>,
    pub consequent: Vec<StatementType>,
}

#[derive(Debug)]
pub struct CatchClauseData {
    pub meta: Meta,
    pub param: IdentifierData,
    pub body: BlockStatementData,
}
