//! Text rendering of a syntax tree with ASCII connectors.
//!
//! ```text
//! BLOCK
//! |-- DECL (x)
//! |   +-- OP (*)
//! |       |-- NUM (2)
//! |       +-- NUM (8)
//! +-- PRINT (Expr)
//!     +-- ID (x)
//! ```

use crate::ast::{Block, Expr, NEGATE_SYMBOL, Program, Stmt};

/// Render the whole program, rooted at a `BLOCK` line.
pub fn render_tree(program: &Program) -> String {
    let mut out = String::new();
    let mut ancestor_mask = Vec::new();
    render_node(&mut out, TreeNode::Block(&program.body), 0, true, &mut ancestor_mask);
    out
}

#[derive(Clone, Copy)]
enum TreeNode<'a> {
    Block(&'a Block),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> TreeNode<'a> {
    fn label(self) -> String {
        match self {
            TreeNode::Block(_) => "BLOCK".to_string(),
            TreeNode::Stmt(stmt) => match stmt {
                Stmt::Declaration { name, .. } => format!("DECL ({name})"),
                Stmt::Assignment { target, .. } => format!("ASSIGN (=) {target}"),
                Stmt::Print { .. } => "PRINT (Expr)".to_string(),
                Stmt::PrintString { literal } => format!("PRINT (String): {literal}"),
                Stmt::If { .. } => "IF".to_string(),
            },
            TreeNode::Expr(expr) => match expr {
                Expr::Number(value) => format!("NUM ({value})"),
                Expr::Identifier(name) => format!("ID ({name})"),
                Expr::Binary { op, .. } => format!("OP ({op})"),
                Expr::Negate { .. } => format!("OP ({NEGATE_SYMBOL})"),
            },
        }
    }

    fn children(self) -> Vec<TreeNode<'a>> {
        match self {
            TreeNode::Block(block) => block.statements.iter().map(TreeNode::Stmt).collect(),
            TreeNode::Stmt(stmt) => match stmt {
                Stmt::Declaration { init, .. } => init.iter().map(TreeNode::Expr).collect(),
                Stmt::Assignment { value, .. } | Stmt::Print { value } => {
                    vec![TreeNode::Expr(value)]
                }
                Stmt::PrintString { .. } => Vec::new(),
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    let mut children = vec![TreeNode::Expr(cond), TreeNode::Block(then_branch)];
                    children.extend(else_branch.as_ref().map(TreeNode::Block));
                    children
                }
            },
            TreeNode::Expr(expr) => match expr {
                Expr::Binary { left, right, .. } => {
                    vec![TreeNode::Expr(left), TreeNode::Expr(right)]
                }
                Expr::Negate { operand } => vec![TreeNode::Expr(operand)],
                Expr::Number(_) | Expr::Identifier(_) => Vec::new(),
            },
        }
    }
}

/// `ancestor_mask[b]` is true when the ancestor at depth `b` still has
/// siblings to come, which keeps its vertical bar running.
fn render_node(
    out: &mut String,
    node: TreeNode<'_>,
    depth: usize,
    is_last: bool,
    ancestor_mask: &mut Vec<bool>,
) {
    // The root has no connector column of its own.
    for &continues in ancestor_mask.iter().skip(1) {
        out.push_str(if continues { "|   " } else { "    " });
    }
    if depth > 0 {
        out.push_str(if is_last { "+-- " } else { "|-- " });
    }
    out.push_str(&node.label());
    out.push('\n');

    ancestor_mask.push(!is_last);
    let children = node.children();
    let count = children.len();
    for (index, child) in children.into_iter().enumerate() {
        render_node(out, child, depth + 1, index + 1 == count, ancestor_mask);
    }
    ancestor_mask.pop();
}
