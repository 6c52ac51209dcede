//! Generator - render a grug AST as canonical source text.
//!
//! [`generate`] prints a whole file. The `render_*` functions print a single
//! subtree and are shared with the patch engine, which splices their output
//! into existing source.
//!
//! # Example
//!
//! ```rust
//! use grug_ast::{generate, parse};
//!
//! let ast = parse("entity gun {rpm: i32 = 300}").unwrap();
//! assert_eq!(generate(&ast), "entity gun {\n\trpm: i32 = 300,\n}\n");
//! ```
//!
//! # Formatting
//!
//! The canonical style is:
//! - tab indentation
//! - every entity field on its own line, followed by `,`
//! - one blank line between the entity, the globals and each function
//! - `{}` for empty blocks, `else if` for an else branch holding only an `if`
//! - single spaces around binary operators, parentheses only where
//!   precedence or associativity requires them
//!
//! Multi-line renderings never indent their first line; later lines are
//! prefixed with the `indent` argument, plus `unit` per nesting level.

use crate::ast::*;

/// Canonical indentation unit.
pub const INDENT: &str = "\t";

/// Render a whole file in canonical style, ending with a newline.
pub fn generate(file: &File) -> String {
    let mut w = Writer::new("", INDENT);
    w.write_file(file);
    w.finish()
}

/// Where an expression sits relative to its parent operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Not an operand: a statement value, argument or condition.
    Top,
    /// Left operand of a binary operator with this precedence.
    Left(u8),
    /// Right operand of a binary operator with this precedence.
    Right(u8),
    /// Operand of a prefix operator.
    Operand,
}

/// Binding strength of an expression; atoms bind tightest.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => UNARY_PRECEDENCE,
        _ => UNARY_PRECEDENCE + 1,
    }
}

/// Whether `expr` needs parentheses at `position`.
pub fn needs_parens(expr: &Expr, position: Position) -> bool {
    let own = precedence(expr);
    match position {
        Position::Top => false,
        Position::Left(parent) => own < parent,
        // Every binary level is left associative
        Position::Right(parent) => own <= parent,
        Position::Operand => own < UNARY_PRECEDENCE,
    }
}

/// Render an expression with no surrounding operator.
pub fn render_expr(expr: &Expr) -> String {
    render_expr_at(expr, Position::Top)
}

/// Render an expression, parenthesized if `position` requires it.
pub fn render_expr_at(expr: &Expr, position: Position) -> String {
    let text = match expr {
        Expr::Literal {
            kind: LiteralKind::String,
            value,
        } => format!("\"{}\"", value),
        Expr::Literal { value, .. } => value.clone(),
        Expr::Identifier(name) => name.clone(),
        Expr::Unary { op, operand } => {
            let operand = render_expr_at(&operand.node, Position::Operand);
            match op {
                UnaryOp::Neg => format!("-{}", operand),
                UnaryOp::Not => format!("not {}", operand),
            }
        }
        Expr::Binary { op, left, right } => {
            let p = op.precedence();
            format!(
                "{} {} {}",
                render_expr_at(&left.node, Position::Left(p)),
                op.symbol(),
                render_expr_at(&right.node, Position::Right(p))
            )
        }
        Expr::Call(call) => render_call(call),
    };

    if needs_parens(expr, position) {
        format!("({})", text)
    } else {
        text
    }
}

/// `name(arg, ...)`
pub fn render_call(call: &Call) -> String {
    let arguments: Vec<String> = call
        .arguments
        .iter()
        .map(|a| render_expr(&a.node))
        .collect();
    format!("{}({})", call.name.node, arguments.join(", "))
}

/// `name: type = value`, without the trailing comma.
pub fn render_field(field: &Field) -> String {
    format!(
        "{}: {} = {}",
        field.name.node,
        field.ty.node,
        render_expr(&field.value.node)
    )
}

/// `name: type = value`
pub fn render_global(global: &GlobalVariable) -> String {
    format!(
        "{}: {} = {}",
        global.name.node,
        global.ty.node,
        render_expr(&global.value.node)
    )
}

pub fn render_param(param: &Param) -> String {
    format!("{}: {}", param.name.node, param.ty.node)
}

/// Everything before a function's body: `name(params) return_type`.
pub fn render_function_header(function: &Function) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|p| render_param(&p.node))
        .collect();
    let mut header = format!("{}({})", function.name.node, params.join(", "));
    if let Some(ty) = &function.return_type {
        header.push(' ');
        header.push_str(&ty.node);
    }
    header
}

pub fn render_entity(entity: &Entity, indent: &str, unit: &str) -> String {
    let mut w = Writer::new(indent, unit);
    w.write_entity(entity);
    w.finish()
}

pub fn render_function(function: &Function, indent: &str, unit: &str) -> String {
    let mut w = Writer::new(indent, unit);
    w.write_function(function);
    w.finish()
}

pub fn render_block(block: &Block, indent: &str, unit: &str) -> String {
    let mut w = Writer::new(indent, unit);
    w.write_block(block);
    w.finish()
}

/// The text after `else `: a nested `if` or a braced block.
pub fn render_else(block: &Block, indent: &str, unit: &str) -> String {
    let mut w = Writer::new(indent, unit);
    w.write_else(block);
    w.finish()
}

pub fn render_statement(stmt: &Statement, indent: &str, unit: &str) -> String {
    let mut w = Writer::new(indent, unit);
    w.write_statement(stmt);
    w.finish()
}

/// Internal writer for building output.
struct Writer<'a> {
    output: String,
    /// Indentation of the line the rendering starts on.
    base: &'a str,
    unit: &'a str,
    indent: usize,
}

impl<'a> Writer<'a> {
    fn new(base: &'a str, unit: &'a str) -> Self {
        Self {
            output: String::new(),
            base,
            unit,
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    /// Write the base indentation plus one unit per level.
    fn write_indent(&mut self) {
        self.output.push_str(self.base);
        for _ in 0..self.indent {
            self.output.push_str(self.unit);
        }
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        if self.indent > 0 {
            self.indent -= 1;
        }
    }

    /// Write a line with current indentation.
    fn writeln(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    /// Write without indentation or newline.
    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    // ========================================================================
    // Top-Level File Structure
    // ========================================================================

    fn write_file(&mut self, file: &File) {
        self.write_entity(&file.entity.node);
        self.newline();

        if !file.globals.is_empty() {
            self.newline();
            for global in &file.globals {
                self.writeln(&render_global(&global.node));
            }
        }

        for function in &file.functions {
            self.newline();
            self.write_function(&function.node);
            self.newline();
        }
    }

    fn write_entity(&mut self, entity: &Entity) {
        self.write(&format!("entity {} {{", entity.name.node));
        if entity.fields.is_empty() {
            self.write("}");
            return;
        }

        self.newline();
        self.indent();
        for field in &entity.fields {
            self.writeln(&format!("{},", render_field(&field.node)));
        }
        self.dedent();
        self.write_indent();
        self.write("}");
    }

    fn write_function(&mut self, function: &Function) {
        self.write(&render_function_header(function));
        self.write(" ");
        self.write_block(&function.body.node);
    }

    // ========================================================================
    // Blocks and Statements
    // ========================================================================

    fn write_block(&mut self, block: &Block) {
        if block.statements.is_empty() {
            self.write("{}");
            return;
        }

        self.write("{");
        self.newline();
        self.indent();
        for stmt in &block.statements {
            self.write_indent();
            self.write_statement(&stmt.node);
            self.newline();
        }
        self.dedent();
        self.write_indent();
        self.write("}");
    }

    fn write_else(&mut self, block: &Block) {
        match block.as_else_if() {
            Some(nested) => self.write_statement(&nested.node),
            None => self.write_block(block),
        }
    }

    fn write_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assignment { name, ty, value } => {
                let value = render_expr(&value.node);
                match ty {
                    Some(ty) => self.write(&format!("{}: {} = {}", name.node, ty.node, value)),
                    None => self.write(&format!("{} = {}", name.node, value)),
                }
            }
            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.write(&format!("if {} ", render_expr(&condition.node)));
                self.write_block(&then_block.node);
                if let Some(else_block) = else_block {
                    self.write(" else ");
                    self.write_else(&else_block.node);
                }
            }
            Statement::While { condition, body } => {
                self.write(&format!("while {} ", render_expr(&condition.node)));
                self.write_block(&body.node);
            }
            Statement::Call(call) => self.write(&render_call(call)),
            Statement::Return(Some(value)) => {
                self.write(&format!("return {}", render_expr(&value.node)))
            }
            Statement::Return(None) => self.write("return"),
            Statement::Break => self.write("break"),
            Statement::Continue => self.write("continue"),
        }
    }
}
