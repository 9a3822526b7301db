//! Typed tree for generated TypeScript
//!
//! Projectors and format backends build these nodes; only the printer turns
//! them into text. Nothing here knows about contracts.

use serde_json::Value;

// =============================================================================
// Types
// =============================================================================

/// A TypeScript type expression
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `string`, `number`, `boolean`, `unknown`, `null`, `void`
    Keyword(&'static str),
    /// A literal type, printed as JSON (`"active"`, `3`, `true`)
    Literal(Value),
    /// A named type
    Named(String),
    /// `Name<A, B>`
    Generic { name: String, args: Vec<TypeExpr> },
    /// `Array<T>`
    Array(Box<TypeExpr>),
    /// `Record<string, T>`
    Record(Box<TypeExpr>),
    /// An inline object type
    Object(Vec<Field>),
    /// `A | B`
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self::Generic { name: name.into(), args }
    }

    pub fn string_literal(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }

    /// `T | null`, flattening when `T` is already a union
    pub fn or_null(self) -> Self {
        match self {
            Self::Union(mut members) => {
                members.push(Self::Keyword("null"));
                Self::Union(members)
            }
            other => Self::Union(vec![other, Self::Keyword("null")]),
        }
    }
}

/// A member of an object type or interface
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub optional: bool,
    pub doc: Option<String>,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    /// Printed as JSON
    Literal(Value),
    /// Regular-expression literal; `/` is escaped on output
    Regex(String),
    Template(Vec<TemplatePart>),
    Array(Vec<Expr>),
    Object(Vec<Prop>),
    Member { object: Box<Expr>, property: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, type_args: Vec<TypeExpr>, args: Vec<Expr> },
    Arrow { params: Vec<Param>, body: Box<Expr> },
    /// `await x`, `delete x`, `!x`
    Prefix { op: &'static str, operand: Box<Expr> },
    AsConst(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    KeyValue(String, Expr),
    /// `{ name }`
    Shorthand(String),
    Spread(Expr),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Value::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }

    /// Numeric literal; whole numbers print without a fraction
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Self::Literal(Value::from(value as i64))
        } else {
            Self::Literal(serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number))
        }
    }

    pub fn member(self, property: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(self),
            property: property.into(),
        }
    }

    pub fn index(self, index: Expr) -> Self {
        Self::Index {
            object: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Box::new(self),
            type_args: Vec::new(),
            args,
        }
    }

    pub fn call_generic(self, type_args: Vec<TypeExpr>, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Box::new(self),
            type_args,
            args,
        }
    }

    /// `self.name(args)`
    pub fn method(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        self.member(name).call(args)
    }

    pub fn arrow(params: Vec<Param>, body: Expr) -> Self {
        Self::Arrow {
            params,
            body: Box::new(body),
        }
    }

    pub fn prefix(op: &'static str, operand: Expr) -> Self {
        Self::Prefix {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn as_const(self) -> Self {
        Self::AsConst(Box::new(self))
    }

    /// Name of the outermost method call, if this is `x.name(..)`
    pub fn outer_method(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => match callee.as_ref() {
                Self::Member { property, .. } => Some(property),
                _ => None,
            },
            _ => None,
        }
    }

    /// Receiver of the outermost method call
    pub fn receiver(&self) -> Option<&Expr> {
        match self {
            Self::Call { callee, .. } => match callee.as_ref() {
                Self::Member { object, .. } => Some(object),
                _ => None,
            },
            _ => None,
        }
    }
}

// =============================================================================
// Statements and Declarations
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub optional: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            optional: true,
            ..Self::new(name, ty)
        }
    }
}

/// Left-hand side of a `const`
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Name(String),
    /// `{ key: local, ...rest }`; `local` equal to `key` prints shorthand
    Destructure {
        fields: Vec<(String, String)>,
        rest: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Const { binding: Binding, value: Expr },
    Assign { target: Expr, value: Expr },
    Return(Expr),
    Expr(Expr),
    If { cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt> },
}

/// A top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `/** ... */` block
    DocBlock(Vec<String>),
    /// Section banner
    Banner(String),
    Import {
        default: Option<String>,
        names: Vec<String>,
        from: String,
        type_only: bool,
    },
    TypeAlias {
        name: String,
        ty: TypeExpr,
        doc: Option<String>,
    },
    Interface {
        name: String,
        fields: Vec<Field>,
        doc: Option<String>,
    },
    Const {
        name: String,
        annotation: Option<TypeExpr>,
        value: Expr,
        doc: Option<String>,
    },
    Function {
        name: String,
        is_async: bool,
        params: Vec<Param>,
        returns: Option<TypeExpr>,
        body: Vec<Stmt>,
        doc: Option<String>,
    },
}
