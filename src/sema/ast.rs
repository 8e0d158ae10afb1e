//! Typed AST
//!
//! The tree the semantic checker produces and both backends consume.
//! Every node carries a resolved type; the integer payload is overloaded
//! per kind (literal value, bool 0/1, string-table index, or table slot)
//! and only kinds flagged by [`NodeKind::has_data`] carry a meaningful
//! payload. Children are exclusively owned by their parent.

use std::fmt::{self, Write as _};

use crate::sema::tables::VarTable;
use crate::types::Type;

/// Closed set of AST node tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    // ============ Value nodes ============
    BoolVal,
    IntVal,
    FloatVal,
    StringVal,

    // ============ I/O nodes ============
    Input,
    Output,

    // ============ Relational nodes ============
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // ============ Arithmetic nodes ============
    Mul,
    Div,
    Mod,
    Add,
    Sub,

    // ============ Statement nodes ============
    StmtSection,
    VarDecl,
    DeclareAssign,
    Assign,
    PlusAssign,
    MinusAssign,
    PlusPlus,
    MinusMinus,
    If,
    For,
    Switch,
    Case,
    Default,
    FuncCall,
    Return,

    // ============ Function nodes ============
    FuncMain,
    FuncDecl,
    FuncArgs,

    // ============ List wrappers ============
    ExprList,
    Program,
    FuncList,
    VarUse,
}

impl NodeKind {
    /// Whether nodes of this kind carry a meaningful payload
    pub fn has_data(self) -> bool {
        matches!(
            self,
            NodeKind::BoolVal
                | NodeKind::IntVal
                | NodeKind::FloatVal
                | NodeKind::StringVal
                | NodeKind::VarDecl
                | NodeKind::DeclareAssign
                | NodeKind::VarUse
                | NodeKind::FuncCall
                | NodeKind::FuncMain
                | NodeKind::FuncDecl
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::BoolVal | NodeKind::IntVal | NodeKind::FloatVal | NodeKind::StringVal => "",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Eq => "==",
            NodeKind::Ne => "!=",
            NodeKind::Lt => "<",
            NodeKind::Le => "<=",
            NodeKind::Gt => ">",
            NodeKind::Ge => ">=",
            NodeKind::Mul => "*",
            NodeKind::Div => "/",
            NodeKind::Mod => "%",
            NodeKind::Add => "+",
            NodeKind::Sub => "-",
            NodeKind::StmtSection => "statement_sect",
            NodeKind::VarDecl => "var_decl",
            NodeKind::DeclareAssign => ":=",
            NodeKind::Assign => "=",
            NodeKind::PlusAssign => "+=",
            NodeKind::MinusAssign => "-=",
            NodeKind::PlusPlus => "++",
            NodeKind::MinusMinus => "--",
            NodeKind::If => "if",
            NodeKind::For => "for",
            NodeKind::Switch => "switch",
            NodeKind::Case => "case",
            NodeKind::Default => "default",
            NodeKind::FuncCall => "func_call",
            NodeKind::Return => "return",
            NodeKind::FuncMain => "func_main",
            NodeKind::FuncDecl => "func_decl",
            NodeKind::FuncArgs => "func_args",
            NodeKind::ExprList => "expr_list",
            NodeKind::Program => "program",
            NodeKind::FuncList => "func_list",
            NodeKind::VarUse => "var_use",
        };
        write!(f, "{}", s)
    }
}

/// A typed AST node
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: Type,
    /// Literal int value, bool 0/1, string-table index, or table slot,
    /// depending on `kind`
    pub int_data: i32,
    /// Float literal value
    pub float_data: f32,
    pub children: Vec<Node>,
}

impl Node {
    /// Leaf with an integer payload
    pub fn with_int(kind: NodeKind, int_data: i32, ty: Type) -> Self {
        Self {
            kind,
            ty,
            int_data,
            float_data: 0.0,
            children: Vec::new(),
        }
    }

    /// Leaf with a float payload
    pub fn with_float(kind: NodeKind, float_data: f32, ty: Type) -> Self {
        Self {
            kind,
            ty,
            int_data: 0,
            float_data,
            children: Vec::new(),
        }
    }

    /// Structural node owning its children
    pub fn subtree(kind: NodeKind, ty: Type, children: Vec<Node>) -> Self {
        Self {
            kind,
            ty,
            int_data: 0,
            float_data: 0.0,
            children,
        }
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn child(&self, idx: usize) -> &Node {
        &self.children[idx]
    }
}

// ==================== DOT rendering ====================

/// Render the tree in graphviz DOT, labels carrying the resolved type,
/// variable names for var nodes and `@idx` for string literals
pub fn render_dot(root: &Node, vars: &VarTable) -> String {
    let mut out = String::new();
    let mut next = 0usize;
    out.push_str("digraph {\ngraph [ordering=\"out\"];\n");
    render_node(root, vars, &mut next, &mut out);
    out.push_str("}\n");
    out
}

fn render_node(node: &Node, vars: &VarTable, next: &mut usize, out: &mut String) -> usize {
    let my_nr = *next;
    *next += 1;

    let _ = write!(out, "node{}[label=\"", my_nr);
    if node.ty != Type::NoType {
        let _ = write!(out, "({}) ", node.ty);
    }
    match node.kind {
        NodeKind::VarDecl | NodeKind::VarUse | NodeKind::DeclareAssign => {
            let _ = write!(out, "{}@", vars.name(node.int_data as usize));
        }
        _ => {
            let _ = write!(out, "{}", node.kind);
        }
    }
    if node.kind.has_data() {
        match node.kind {
            NodeKind::StringVal => {
                let _ = write!(out, "@{}", node.int_data);
            }
            NodeKind::FloatVal => {
                let _ = write!(out, "{:.2}", node.float_data);
            }
            NodeKind::VarDecl | NodeKind::VarUse | NodeKind::DeclareAssign => {}
            _ => {
                let _ = write!(out, "{}", node.int_data);
            }
        }
    }
    let _ = writeln!(out, "\"];");

    for child in &node.children {
        let child_nr = render_node(child, vars, next, out);
        let _ = writeln!(out, "node{} -> node{};", my_nr, child_nr);
    }
    my_nr
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn has_data_covers_payload_kinds_only() {
        assert!(NodeKind::IntVal.has_data());
        assert!(NodeKind::VarUse.has_data());
        assert!(NodeKind::DeclareAssign.has_data());
        assert!(!NodeKind::Add.has_data());
        assert!(!NodeKind::StmtSection.has_data());
        assert!(!NodeKind::If.has_data());
    }

    #[test]
    fn children_keep_source_order() {
        let node = Node::subtree(
            NodeKind::Add,
            Type::Int,
            vec![
                Node::with_int(NodeKind::IntVal, 1, Type::Int),
                Node::with_int(NodeKind::IntVal, 2, Type::Int),
            ],
        );
        assert_eq!(node.child(0).int_data, 1);
        assert_eq!(node.child(1).int_data, 2);
    }

    #[test]
    fn dot_rendering_labels_typed_nodes() {
        let mut vars = VarTable::new();
        let slot = vars.add("x", 1, Type::Int);
        let tree = Node::subtree(
            NodeKind::Assign,
            Type::NoType,
            vec![
                Node::with_int(NodeKind::VarUse, slot as i32, Type::Int),
                Node::with_int(NodeKind::IntVal, 5, Type::Int),
            ],
        );
        let dot = render_dot(&tree, &vars);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("(int) x@"));
        assert!(dot.contains("(int) 5"));
        assert!(dot.contains("node0 -> node1;"));
    }
}
