//! Untyped parse tree
//!
//! One node per grammar rule, built by the parser and consumed by the
//! semantic checker. Terminals carry their text and 1-based source line;
//! no types are resolved here.

use crate::types::Type;

/// A terminal with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub text: String,
    pub line: u32,
}

/// `program: "package" "main" import_decl? func_decl*`
#[derive(Debug, Clone)]
pub struct Program {
    pub funcs: Vec<FuncDecl>,
}

/// `func_decl: "func" (IDENT | "main") "(" func_args? ")" var_type? block`
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: Ident,
    pub is_main: bool,
    pub params: Vec<Param>,
    /// Declared return type; `None` means the function returns nothing
    pub ret: Option<Type>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

/// `block: "{" statement* "}"`
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// A variable reference, optionally indexed (`x` or `x[i]`)
#[derive(Debug, Clone)]
pub struct Id {
    pub name: Ident,
    pub index: Option<Box<Expr>>,
}

/// `func_call: IDENT "(" expr_list? ")"`
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub name: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    pub line: u32,
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `var x int`, `var x int = e`, `var x = e`
    VarDecl {
        name: Ident,
        ty: Option<Type>,
        init: Option<Expr>,
    },
    /// `x := e`
    DeclareAssign { name: Ident, value: Expr },
    /// `x = e`, `x += e`, `x -= e`
    Assign {
        target: Id,
        op: AssignOp,
        value: Expr,
    },
    /// `x++`, `x--`
    IncDec { target: Id, inc: bool },
    If {
        line: u32,
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// `for e { ... }` or the condition-less `for { ... }`
    For {
        line: u32,
        cond: Option<Expr>,
        body: Block,
    },
    Switch {
        line: u32,
        subject: Option<Id>,
        cases: Vec<CaseClause>,
        default: Option<Vec<Stmt>>,
    },
    Return { line: u32, value: Option<Expr> },
    /// `fmt.Scanln(&x)`
    Input { target: Id },
    /// `fmt.Println(e, ...)`
    Output { line: u32, args: Vec<Expr> },
    Call(CallExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

impl AssignOp {
    pub fn text(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit { value: i32, line: u32 },
    FloatLit { value: f32, line: u32 },
    /// Quotes still enclose the text, as lexed
    StrLit { text: String, line: u32 },
    BoolLit { value: bool, line: u32 },
    Id(Id),
    Call(CallExpr),
    Binary {
        op: BinOp,
        line: u32,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Line of the leftmost terminal, for diagnostics
    pub fn line(&self) -> u32 {
        match self {
            Expr::IntLit { line, .. }
            | Expr::FloatLit { line, .. }
            | Expr::StrLit { line, .. }
            | Expr::BoolLit { line, .. }
            | Expr::Binary { line, .. } => *line,
            Expr::Id(id) => id.name.line,
            Expr::Call(call) => call.name.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// Source text of the operator, for diagnostics
    pub fn text(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }
}
