//! Semantic checker
//!
//! A single recursive descent over the parse tree that populates the
//! symbol tables, resolves types and produces the typed AST. Errors do
//! not stop the traversal: each check records a line-tagged diagnostic
//! and continues, so one run surfaces every independent error. Later
//! stages are gated on [`CheckedProgram::passed`].

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::frontend::syntax::{self, AssignOp, BinOp};
use crate::sema::ast::{Node, NodeKind};
use crate::sema::tables::{FuncTable, StrTable, VarTable};
use crate::types::Type;

/// One semantic error, tagged with its source line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SEMANTIC ERROR ({}): {}", self.line, self.message)
    }
}

/// Result of the semantic pass: the typed AST, the populated tables and
/// the ordered diagnostic list
#[derive(Debug)]
pub struct CheckedProgram {
    pub ast: Node,
    pub strings: StrTable,
    pub vars: VarTable,
    pub funcs: FuncTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckedProgram {
    /// Whether the pass found no semantic errors
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// The checker state: tables under construction plus accumulated
/// diagnostics. One instance checks one compilation unit.
#[derive(Default)]
pub struct SemanticChecker {
    strings: StrTable,
    vars: VarTable,
    funcs: FuncTable,
    diagnostics: Vec<Diagnostic>,
}

impl SemanticChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a whole compilation unit, consuming the checker
    pub fn check(mut self, program: &syntax::Program) -> CheckedProgram {
        let mut func_list = Node::subtree(NodeKind::FuncList, Type::NoType, Vec::new());
        for func in &program.funcs {
            let child = self.check_func(func);
            func_list.add_child(child);
        }
        let root = Node::subtree(NodeKind::Program, Type::NoType, vec![func_list]);

        debug!(
            "semantic pass finished: {} vars, {} funcs, {} strings, {} diagnostics",
            self.vars.len(),
            self.funcs.len(),
            self.strings.len(),
            self.diagnostics.len()
        );

        CheckedProgram {
            ast: root,
            strings: self.strings,
            vars: self.vars,
            funcs: self.funcs,
            diagnostics: self.diagnostics,
        }
    }

    fn report(&mut self, line: u32, message: String) {
        self.diagnostics.push(Diagnostic { line, message });
    }

    // ==================== Var and function declaration ====================

    /// Declare a variable; on redeclaration, reports and reuses the
    /// existing slot
    fn declare_var(&mut self, name: &syntax::Ident, ty: Type) -> usize {
        if let Some(idx) = self.vars.lookup(&name.text) {
            let prev_line = self.vars.line(idx);
            self.report(
                name.line,
                format!(
                    "variable '{}' already declared at line {}.",
                    name.text, prev_line
                ),
            );
            return idx;
        }
        self.vars.add(&name.text, name.line, ty)
    }

    /// Resolve a variable use; an undeclared name is reported once and
    /// then entered with `NoType` so it does not cascade
    fn resolve_var(&mut self, name: &syntax::Ident) -> usize {
        match self.vars.lookup(&name.text) {
            Some(idx) => idx,
            None => {
                self.report(
                    name.line,
                    format!("variable '{}' was not declared.", name.text),
                );
                self.vars.add(&name.text, name.line, Type::NoType)
            }
        }
    }

    fn declare_func(&mut self, name: &syntax::Ident, ret: Type, arity: usize) -> usize {
        if let Some(idx) = self.funcs.lookup(&name.text) {
            let prev_line = self.funcs.line(idx);
            self.report(
                name.line,
                format!(
                    "function '{}' already declared at line {}.",
                    name.text, prev_line
                ),
            );
            return idx;
        }
        self.funcs.add(&name.text, name.line, ret, arity)
    }

    // ==================== Type checks ====================

    fn type_error(&mut self, line: u32, op: &str, lt: Type, rt: Type) {
        // An operand that already failed was reported where it failed
        if lt == Type::NoType || rt == Type::NoType {
            return;
        }
        self.report(
            line,
            format!(
                "incompatible types for operator '{}', LHS is '{}' and RHS is '{}'.",
                op, lt, rt
            ),
        );
    }

    fn check_bool_expr(&mut self, line: u32, cmd: &str, ty: Type) {
        if ty != Type::Bool && ty != Type::NoType {
            self.report(
                line,
                format!(
                    "conditional expression in '{}' is '{}' instead of '{}'.",
                    cmd,
                    ty,
                    Type::Bool
                ),
            );
        }
    }

    fn check_index(&mut self, line: u32, ty: Type) {
        if ty != Type::Int && ty != Type::NoType {
            self.report(line, format!("incompatible type '{}' at array index.", ty));
        }
    }

    fn check_assign(&mut self, line: u32, op: &str, lt: Type, rt: Type) {
        if lt != rt {
            self.type_error(line, op, lt, rt);
        }
    }

    fn check_init_assign(&mut self, line: u32, var_name: &str, lt: Type, rt: Type) {
        if lt != rt && lt != Type::NoType && rt != Type::NoType {
            self.report(
                line,
                format!(
                    "incompatible types when declaring variable '{}', var type is '{}' and expression type is '{}'.",
                    var_name, lt, rt
                ),
            );
        }
    }

    fn check_case(&mut self, line: u32, expected: Type, got: Type) {
        if expected != got && expected != Type::NoType && got != Type::NoType {
            self.report(
                line,
                format!(
                    "incompatible types for case, expected '{}' but expression is '{}'.",
                    expected, got
                ),
            );
        }
    }

    fn check_return(&mut self, line: u32, func_ret: Type, got: Type) {
        if got != func_ret && got != Type::NoType {
            self.report(
                line,
                format!(
                    "Return statement type incompatible with function type. Expected '{}' but received '{}'.",
                    func_ret, got
                ),
            );
        }
    }

    // ==================== Functions ====================

    fn check_func(&mut self, func: &syntax::FuncDecl) -> Node {
        let ret = func.ret.unwrap_or(Type::NoType);

        // Arguments land in the flat variable table; there is no
        // per-function scope in this language model
        let mut args = Node::subtree(NodeKind::FuncArgs, Type::NoType, Vec::new());
        for param in &func.params {
            let slot = self.declare_var(&param.name, param.ty);
            args.add_child(Node::with_int(NodeKind::VarDecl, slot as i32, param.ty));
        }

        // Declared before the body is checked, so the body can mention it
        let idx = self.declare_func(&func.name, ret, func.params.len());
        let kind = if func.is_main {
            NodeKind::FuncMain
        } else {
            NodeKind::FuncDecl
        };

        let body = self.check_block(&func.body, ret);

        let mut node = Node::with_int(kind, idx as i32, ret);
        node.add_child(args);
        node.add_child(body);
        node
    }

    fn check_block(&mut self, block: &syntax::Block, func_ret: Type) -> Node {
        let mut node = Node::subtree(NodeKind::StmtSection, Type::NoType, Vec::new());
        for stmt in &block.stmts {
            let child = self.check_stmt(stmt, func_ret);
            node.add_child(child);
        }
        node
    }

    // ==================== Statements ====================

    fn check_stmt(&mut self, stmt: &syntax::Stmt, func_ret: Type) -> Node {
        match stmt {
            syntax::Stmt::VarDecl { name, ty, init } => self.check_var_decl(name, *ty, init),

            syntax::Stmt::DeclareAssign { name, value } => {
                let value_node = self.check_expr(value);
                let slot = self.declare_var(name, value_node.ty);
                let mut node =
                    Node::with_int(NodeKind::DeclareAssign, slot as i32, value_node.ty);
                node.add_child(value_node);
                node
            }

            syntax::Stmt::Assign { target, op, value } => {
                let value_node = self.check_expr(value);
                let target_node = self.check_id(target);
                // `+=`/`-=` carry an addition, so both sides must be
                // numeric; plain `=` only needs matching types
                if *op != AssignOp::Set
                    && !target_node.ty.is_numeric()
                    && target_node.ty != Type::NoType
                {
                    self.type_error(target.name.line, op.text(), target_node.ty, value_node.ty);
                } else {
                    self.check_assign(
                        target.name.line,
                        op.text(),
                        target_node.ty,
                        value_node.ty,
                    );
                }
                let kind = match op {
                    AssignOp::Set => NodeKind::Assign,
                    AssignOp::Add => NodeKind::PlusAssign,
                    AssignOp::Sub => NodeKind::MinusAssign,
                };
                Node::subtree(kind, Type::NoType, vec![target_node, value_node])
            }

            syntax::Stmt::IncDec { target, inc } => {
                let target_node = self.check_id(target);
                let op = if *inc { "++" } else { "--" };
                if !target_node.ty.is_numeric() && target_node.ty != Type::NoType {
                    self.report(
                        target.name.line,
                        format!(
                            "type '{}' not suported for unary operator '{}'.",
                            target_node.ty, op
                        ),
                    );
                }
                let kind = if *inc {
                    NodeKind::PlusPlus
                } else {
                    NodeKind::MinusMinus
                };
                Node::subtree(kind, Type::NoType, vec![target_node])
            }

            syntax::Stmt::If { line, cond, then_block, else_block } => {
                let cond_node = self.check_expr(cond);
                self.check_bool_expr(*line, "if", cond_node.ty);
                let mut children = vec![cond_node, self.check_block(then_block, func_ret)];
                if let Some(else_block) = else_block {
                    children.push(self.check_block(else_block, func_ret));
                }
                Node::subtree(NodeKind::If, Type::NoType, children)
            }

            syntax::Stmt::For { line, cond, body } => {
                let mut children = Vec::new();
                if let Some(cond) = cond {
                    let cond_node = self.check_expr(cond);
                    self.check_bool_expr(*line, "for", cond_node.ty);
                    children.push(cond_node);
                }
                children.push(self.check_block(body, func_ret));
                Node::subtree(NodeKind::For, Type::NoType, children)
            }

            syntax::Stmt::Switch { subject, cases, default, .. } => {
                self.check_switch(subject, cases, default, func_ret)
            }

            syntax::Stmt::Return { line, value } => {
                let (child, got) = match value {
                    Some(expr) => {
                        let node = self.check_expr(expr);
                        let ty = node.ty;
                        (Some(node), ty)
                    }
                    None => (None, Type::NoType),
                };
                self.check_return(*line, func_ret, got);
                let mut node = Node::subtree(NodeKind::Return, got, Vec::new());
                if let Some(child) = child {
                    node.add_child(child);
                }
                node
            }

            syntax::Stmt::Input { target } => {
                let target_node = self.check_id(target);
                Node::subtree(NodeKind::Input, Type::NoType, vec![target_node])
            }

            syntax::Stmt::Output { args, .. } => {
                let list = self.check_expr_list(args);
                Node::subtree(NodeKind::Output, Type::NoType, vec![list])
            }

            syntax::Stmt::Call(call) => self.check_call(call),
        }
    }

    fn check_var_decl(
        &mut self,
        name: &syntax::Ident,
        ty: Option<Type>,
        init: &Option<syntax::Expr>,
    ) -> Node {
        match (ty, init) {
            // `var x int`
            (Some(ty), None) => {
                let slot = self.declare_var(name, ty);
                Node::with_int(NodeKind::VarDecl, slot as i32, ty)
            }
            // `var x int = e`: declared and initializer types must match
            // exactly, no widening
            (Some(ty), Some(init)) => {
                let slot = self.declare_var(name, ty);
                let var_ty = self.vars.ty(slot);
                let init_node = self.check_expr(init);
                self.check_init_assign(name.line, &name.text, var_ty, init_node.ty);
                let mut node = Node::with_int(NodeKind::VarDecl, slot as i32, ty);
                node.add_child(init_node);
                node
            }
            // `var x = e`: the declared type is inferred
            (None, Some(init)) => {
                let init_node = self.check_expr(init);
                let slot = self.declare_var(name, init_node.ty);
                let mut node = Node::with_int(NodeKind::VarDecl, slot as i32, init_node.ty);
                node.add_child(init_node);
                node
            }
            // Rejected by the parser
            (None, None) => Node::subtree(NodeKind::VarDecl, Type::NoType, Vec::new()),
        }
    }

    fn check_switch(
        &mut self,
        subject: &Option<syntax::Id>,
        cases: &[syntax::CaseClause],
        default: &Option<Vec<syntax::Stmt>>,
        func_ret: Type,
    ) -> Node {
        let mut children = Vec::new();
        // With no subject, cases are bare boolean expressions
        let subject_ty = match subject {
            Some(id) => {
                let node = self.check_id(id);
                let ty = node.ty;
                children.push(node);
                ty
            }
            None => Type::Bool,
        };

        for case in cases {
            let value = self.check_expr(&case.value);
            self.check_case(case.line, subject_ty, value.ty);
            let mut case_node = Node::subtree(NodeKind::Case, Type::NoType, vec![value]);
            for stmt in &case.body {
                let child = self.check_stmt(stmt, func_ret);
                case_node.add_child(child);
            }
            children.push(case_node);
        }

        if let Some(stmts) = default {
            let mut default_node = Node::subtree(NodeKind::Default, Type::NoType, Vec::new());
            for stmt in stmts {
                let child = self.check_stmt(stmt, func_ret);
                default_node.add_child(child);
            }
            children.push(default_node);
        }

        Node::subtree(NodeKind::Switch, Type::NoType, children)
    }

    // ==================== Expressions ====================

    fn check_call(&mut self, call: &syntax::CallExpr) -> Node {
        let idx = match self.funcs.lookup(&call.name.text) {
            Some(idx) => idx,
            None => {
                self.report(
                    call.name.line,
                    format!("function '{}' was not declared.", call.name.text),
                );
                // Entered with the seen arity so the mistake is reported once
                self.funcs
                    .add(&call.name.text, call.name.line, Type::NoType, call.args.len())
            }
        };

        let list = self.check_expr_list(&call.args);
        let expected = self.funcs.arity(idx);
        if call.args.len() != expected {
            self.report(
                call.name.line,
                format!(
                    "function '{}' expected {} arguments but received '{}'.",
                    call.name.text,
                    expected,
                    call.args.len()
                ),
            );
        }

        let mut node = Node::with_int(NodeKind::FuncCall, idx as i32, self.funcs.ret(idx));
        node.add_child(list);
        node
    }

    fn check_expr_list(&mut self, exprs: &[syntax::Expr]) -> Node {
        let mut node = Node::subtree(NodeKind::ExprList, Type::NoType, Vec::new());
        for expr in exprs {
            let child = self.check_expr(expr);
            node.add_child(child);
        }
        node
    }

    fn check_expr(&mut self, expr: &syntax::Expr) -> Node {
        match expr {
            syntax::Expr::IntLit { value, .. } => {
                Node::with_int(NodeKind::IntVal, *value, Type::Int)
            }
            syntax::Expr::FloatLit { value, .. } => {
                Node::with_float(NodeKind::FloatVal, *value, Type::Float32)
            }
            syntax::Expr::StrLit { text, .. } => {
                let idx = self.strings.intern(text);
                Node::with_int(NodeKind::StringVal, idx as i32, Type::Str)
            }
            syntax::Expr::BoolLit { value, .. } => {
                Node::with_int(NodeKind::BoolVal, i32::from(*value), Type::Bool)
            }
            syntax::Expr::Id(id) => self.check_id(id),
            syntax::Expr::Call(call) => self.check_call(call),
            syntax::Expr::Binary { op, line, lhs, rhs } => {
                let left = self.check_expr(lhs);
                let right = self.check_expr(rhs);

                let unified = if op.is_equality() {
                    left.ty.unify_equality(right.ty)
                } else if op.is_ordering() {
                    left.ty.unify_ordering(right.ty)
                } else {
                    left.ty.unify_math(right.ty)
                };
                if unified == Type::NoType {
                    self.type_error(*line, op.text(), left.ty, right.ty);
                }

                let kind = match op {
                    BinOp::Eq => NodeKind::Eq,
                    BinOp::Ne => NodeKind::Ne,
                    BinOp::Lt => NodeKind::Lt,
                    BinOp::Le => NodeKind::Le,
                    BinOp::Gt => NodeKind::Gt,
                    BinOp::Ge => NodeKind::Ge,
                    BinOp::Add => NodeKind::Add,
                    BinOp::Sub => NodeKind::Sub,
                    BinOp::Mul => NodeKind::Mul,
                    BinOp::Div => NodeKind::Div,
                    BinOp::Mod => NodeKind::Mod,
                };
                Node::subtree(kind, unified, vec![left, right])
            }
        }
    }

    /// A variable reference; the index expression of `x[i]` is checked
    /// and then dropped, since array storage is not modeled
    fn check_id(&mut self, id: &syntax::Id) -> Node {
        if let Some(index) = &id.index {
            let index_node = self.check_expr(index);
            self.check_index(id.name.line, index_node.ty);
        }
        let slot = self.resolve_var(&id.name);
        Node::with_int(NodeKind::VarUse, slot as i32, self.vars.ty(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn check(source: &str) -> CheckedProgram {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        SemanticChecker::new().check(&program)
    }

    fn messages(checked: &CheckedProgram) -> Vec<String> {
        checked.diagnostics.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn clean_program_passes() {
        let checked = check(
            "package main\nfunc main() {\n\tvar x int = 2 + 3\n\tfmt.Println(x)\n}",
        );
        assert!(checked.passed(), "{:?}", checked.diagnostics);
        assert_eq!(checked.vars.len(), 1);
        assert_eq!(checked.vars.ty(0), Type::Int);
    }

    #[test]
    fn redeclaration_points_at_first_declaration() {
        let checked = check(
            "package main\nfunc main() {\n\tvar x int\n\tvar x float32\n}",
        );
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (4): variable 'x' already declared at line 3."]
        );
    }

    #[test]
    fn undeclared_variable_reported_once() {
        let checked = check(
            "package main\nfunc main() {\n\ty = 1\n\ty = 2\n}",
        );
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (3): variable 'y' was not declared."]
        );
    }

    #[test]
    fn incompatible_initializer_is_one_diagnostic() {
        let checked = check("package main\nfunc main() {\n\tvar x bool = 1\n}");
        assert_eq!(
            messages(&checked),
            vec![
                "SEMANTIC ERROR (3): incompatible types when declaring variable 'x', var type is 'bool' and expression type is 'int'."
            ]
        );
    }

    #[test]
    fn non_bool_condition_is_one_diagnostic() {
        let checked = check("package main\nfunc main() {\n\tif 3 {\n\t}\n}");
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (3): conditional expression in 'if' is 'int' instead of 'bool'."]
        );
    }

    #[test]
    fn operator_mismatch_reports_both_sides() {
        let checked = check(
            "package main\nfunc main() {\n\tvar s string = \"a\"\n\tvar x = s + 1\n}",
        );
        assert_eq!(
            messages(&checked),
            vec![
                "SEMANTIC ERROR (4): incompatible types for operator '+', LHS is 'string' and RHS is 'int'."
            ]
        );
    }

    #[test]
    fn mixed_numeric_arithmetic_widens() {
        let checked = check(
            "package main\nfunc main() {\n\tvar x float32 = 1 + 2.5\n}",
        );
        assert!(checked.passed(), "{:?}", checked.diagnostics);
        assert_eq!(checked.vars.ty(0), Type::Float32);
    }

    #[test]
    fn arity_mismatch_flagged_even_with_valid_argument_types() {
        let checked = check(
            "package main\nfunc add(a int, b int) int { return a + b }\nfunc main() {\n\tx := add(1)\n}",
        );
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (4): function 'add' expected 2 arguments but received '1'."]
        );
    }

    #[test]
    fn return_type_must_match_function() {
        let checked = check(
            "package main\nfunc f() int { return 1.5 }\nfunc main() {}",
        );
        assert_eq!(
            messages(&checked),
            vec![
                "SEMANTIC ERROR (2): Return statement type incompatible with function type. Expected 'int' but received 'float32'."
            ]
        );
    }

    #[test]
    fn bare_return_matches_untyped_function() {
        let checked = check("package main\nfunc f() { return }\nfunc main() {}");
        assert!(checked.passed(), "{:?}", checked.diagnostics);
    }

    #[test]
    fn index_must_be_int() {
        let checked = check(
            "package main\nfunc main() {\n\tvar a int\n\ta[1.5] = 2\n}",
        );
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (4): incompatible type 'float32' at array index."]
        );
    }

    #[test]
    fn case_type_must_match_subject() {
        let checked = check(
            "package main\nfunc main() {\n\tvar x int\n\tswitch x {\n\tcase \"a\":\n\t\tx = 1\n\t}\n}",
        );
        assert_eq!(
            messages(&checked),
            vec![
                "SEMANTIC ERROR (5): incompatible types for case, expected 'int' but expression is 'string'."
            ]
        );
    }

    #[test]
    fn compound_assignment_needs_numeric_operands() {
        let checked = check(
            "package main\nfunc main() {\n\tvar s string = \"a\"\n\ts += s\n}",
        );
        assert_eq!(
            messages(&checked),
            vec![
                "SEMANTIC ERROR (4): incompatible types for operator '+=', LHS is 'string' and RHS is 'string'."
            ]
        );

        let checked = check(
            "package main\nfunc main() {\n\tvar b bool = true\n\tb -= b\n}",
        );
        assert_eq!(
            messages(&checked),
            vec![
                "SEMANTIC ERROR (4): incompatible types for operator '-=', LHS is 'bool' and RHS is 'bool'."
            ]
        );
    }

    #[test]
    fn plain_assignment_of_strings_is_allowed() {
        let checked = check(
            "package main\nfunc main() {\n\tvar s string = \"a\"\n\ts = \"b\"\n}",
        );
        assert!(checked.passed(), "{:?}", checked.diagnostics);
    }

    #[test]
    fn increment_needs_numeric_operand() {
        let checked = check(
            "package main\nfunc main() {\n\tvar b bool\n\tb++\n}",
        );
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (4): type 'bool' not suported for unary operator '++'."]
        );
    }

    #[test]
    fn multiple_errors_accumulate_in_order() {
        let checked = check(
            "package main\nfunc main() {\n\tvar x bool = 1\n\tif 3 {\n\t}\n\ty = 2\n}",
        );
        let lines: Vec<u32> = checked.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
    }

    #[test]
    fn string_literals_are_interned_into_the_table() {
        let checked = check(
            "package main\nfunc main() {\n\tfmt.Println(\"hi\", \"hi\", \"ho\")\n}",
        );
        assert!(checked.passed());
        assert_eq!(checked.strings.len(), 2);
        assert_eq!(checked.strings.get(0), "\"hi\"");
        assert_eq!(checked.strings.get(1), "\"ho\"");
    }

    #[test]
    fn error_cascades_are_suppressed() {
        // `y` is undeclared; the uses of its NoType result must not add
        // further diagnostics
        let checked = check(
            "package main\nfunc main() {\n\tvar x int = y + 1\n}",
        );
        assert_eq!(
            messages(&checked),
            vec!["SEMANTIC ERROR (3): variable 'y' was not declared."]
        );
    }
}
