//! Top-down structural diff producing byte edits.

use super::align::{align, Step};
use super::layout::{
    comma_after, deletion_range, line_end, line_start, rest_of_line_is_trivia, starts_line,
};
use super::Edit;
use crate::ast::*;
use crate::error::{Error, Result};
use crate::generator::{
    render_call, render_else, render_expr, render_expr_at, render_field,
    render_function, render_function_header, render_global, render_statement, Position, INDENT,
};
use crate::here;
use crate::source::{detect_indent_unit, indent_at, LineIndex};
use std::ops::Range;

/// Where a list of items lives in the source.
#[derive(Debug, Clone, Copy)]
enum Container {
    /// Between a `{` (exclusive `open` is the byte after it) and the `}` at
    /// `close`.
    Braced { open: usize, close: usize },
    /// Global variables, following the entity that ends at `entity_end`.
    Globals { entity_end: usize },
    /// Functions, at the end of the file.
    Functions,
}

/// A list element the differ knows how to render and recurse into.
trait Item: Sized {
    /// Whether items are separated by commas.
    const COMMA: bool;

    fn render(&self, indent: &str, unit: &str) -> String;

    fn diff(differ: &mut Differ<'_>, old: &Spanned<Self>, new: &Spanned<Self>) -> Result<()>;
}

impl Item for Field {
    const COMMA: bool = true;

    fn render(&self, _indent: &str, _unit: &str) -> String {
        render_field(self)
    }

    fn diff(differ: &mut Differ<'_>, old: &Spanned<Self>, new: &Spanned<Self>) -> Result<()> {
        differ.text(&old.node.name, &new.node.name)?;
        differ.text(&old.node.ty, &new.node.ty)?;
        differ.expr(&old.node.value, &new.node.value, Position::Top)
    }
}

impl Item for GlobalVariable {
    const COMMA: bool = false;

    fn render(&self, _indent: &str, _unit: &str) -> String {
        render_global(self)
    }

    fn diff(differ: &mut Differ<'_>, old: &Spanned<Self>, new: &Spanned<Self>) -> Result<()> {
        differ.text(&old.node.name, &new.node.name)?;
        differ.text(&old.node.ty, &new.node.ty)?;
        differ.expr(&old.node.value, &new.node.value, Position::Top)
    }
}

impl Item for Function {
    const COMMA: bool = false;

    fn render(&self, indent: &str, unit: &str) -> String {
        render_function(self, indent, unit)
    }

    fn diff(differ: &mut Differ<'_>, old: &Spanned<Self>, new: &Spanned<Self>) -> Result<()> {
        differ.function(old, new)
    }
}

impl Item for Statement {
    const COMMA: bool = false;

    fn render(&self, indent: &str, unit: &str) -> String {
        render_statement(self, indent, unit)
    }

    fn diff(differ: &mut Differ<'_>, old: &Spanned<Self>, new: &Spanned<Self>) -> Result<()> {
        differ.statement(old, new)
    }
}

/// Byte span of a node from the original parse.
fn span_of<T>(node: &Spanned<T>) -> Result<Range<usize>> {
    node.span.clone().ok_or_else(|| {
        Error::schema(
            "the original tree has no source positions to patch",
            node.line,
            here!(),
        )
    })
}

pub(super) struct Differ<'s> {
    source: &'s str,
    index: LineIndex,
    unit: String,
    edits: Vec<Edit>,
}

impl<'s> Differ<'s> {
    pub(super) fn new(source: &'s str) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            unit: detect_indent_unit(source).unwrap_or_else(|| INDENT.to_string()),
            edits: Vec::new(),
        }
    }

    pub(super) fn finish(self) -> Vec<Edit> {
        self.edits
    }

    // ========================================================================
    // Edit recording
    // ========================================================================

    fn replace(&mut self, range: Range<usize>, text: String) {
        log::trace!("replace {:?} with {:?}", range, text);
        self.edits.push(Edit::new(range, text));
    }

    /// Insert at `at`. Text inserted at the same point by earlier calls
    /// stays in front.
    fn insert(&mut self, at: usize, text: String) {
        log::trace!("insert {:?} at {}", text, at);
        if let Some(edit) = self
            .edits
            .iter_mut()
            .find(|e| e.byte_start == at && e.byte_end == at)
        {
            edit.new_text.push_str(&text);
            return;
        }
        self.edits.push(Edit::new(at..at, text));
    }

    fn delete(&mut self, range: Range<usize>) {
        log::trace!("delete {:?}", range);
        self.edits.push(Edit::new(range, String::new()));
    }

    fn indent(&self, offset: usize) -> String {
        indent_at(self.source, &self.index, offset).to_string()
    }

    /// Replace a name or type tag if it changed.
    fn text(&mut self, old: &Spanned<String>, new: &Spanned<String>) -> Result<()> {
        if old.node != new.node {
            let span = span_of(old)?;
            self.replace(span, new.node.clone());
        }
        Ok(())
    }

    // ========================================================================
    // Top-level structure
    // ========================================================================

    pub(super) fn file(&mut self, old: &File, new: &File) -> Result<()> {
        let entity_span = span_of(&old.entity)?;
        self.entity(&old.entity, &new.entity)?;

        let steps = align(&old.globals, &new.globals, |a, b| {
            a.node.name.node == b.node.name.node
        });
        self.list(
            Container::Globals {
                entity_end: entity_span.end,
            },
            &old.globals,
            &new.globals,
            &steps,
        )?;

        let steps = align(&old.functions, &new.functions, |a, b| {
            a.node.name.node == b.node.name.node
        });
        self.list(Container::Functions, &old.functions, &new.functions, &steps)
    }

    fn entity(&mut self, old: &Spanned<Entity>, new: &Spanned<Entity>) -> Result<()> {
        let span = span_of(old)?;
        let name_end = span_of(&old.node.name)?.end;
        self.text(&old.node.name, &new.node.name)?;

        let open = self.source[name_end..span.end]
            .find('{')
            .map(|i| name_end + i + 1)
            .ok_or_else(|| Error::schema("entity has no opening brace", old.line, here!()))?;
        let container = Container::Braced {
            open,
            close: span.end - 1,
        };

        let steps = align(&old.node.fields, &new.node.fields, |a, b| {
            a.node.name.node == b.node.name.node
        });
        self.list(container, &old.node.fields, &new.node.fields, &steps)
    }

    fn function(&mut self, old: &Spanned<Function>, new: &Spanned<Function>) -> Result<()> {
        let (o, n) = (&old.node, &new.node);
        let body_start = span_of(&o.body)?.start;

        if o.params != n.params || o.return_type != n.return_type {
            let start = span_of(old)?.start;
            self.replace(start..body_start, format!("{} ", render_function_header(n)));
        } else {
            self.text(&o.name, &n.name)?;
        }

        self.block(&o.body, &n.body)
    }

    // ========================================================================
    // Lists
    // ========================================================================

    fn list<T: Item>(
        &mut self,
        container: Container,
        old: &[Spanned<T>],
        new: &[Spanned<T>],
        steps: &[Step],
    ) -> Result<()> {
        if old.is_empty() {
            let items: Vec<&T> = new.iter().map(|n| &n.node).collect();
            if !items.is_empty() {
                self.fill(container, &items);
            }
            return Ok(());
        }

        let mut last_paired = None;
        let mut pending: Vec<&T> = Vec::new();
        let mut deleting = None;

        for (pos, step) in steps.iter().enumerate() {
            match *step {
                Step::Pair(i, j) => {
                    T::diff(self, &old[i], &new[j])?;
                    last_paired = Some(i);
                }
                // A run of adjacent deletions is removed as one range
                Step::Delete(i) => {
                    let first = *deleting.get_or_insert(i);
                    if !matches!(steps.get(pos + 1), Some(Step::Delete(_))) {
                        let span = span_of(&old[first])?.start..span_of(&old[i])?.end;
                        self.delete(deletion_range(self.source, span, T::COMMA));
                        deleting = None;
                    }
                }
                Step::Insert(j) => pending.push(&new[j].node),
            }

            let run_ends = !matches!(steps.get(pos + 1), Some(Step::Insert(_)));
            if run_ends && !pending.is_empty() {
                match last_paired {
                    Some(a) => self.insert_after(container, &old[a], &pending)?,
                    None => {
                        let next = steps[pos + 1..].iter().find_map(|s| match s {
                            Step::Pair(i, _) => Some(*i),
                            _ => None,
                        });
                        match next {
                            Some(b) => self.insert_before(container, &old[b], &pending)?,
                            // Every old item is deleted: put the new ones where the first was
                            None => self.insert_before(container, &old[0], &pending)?,
                        }
                    }
                }
                pending.clear();
            }
        }
        Ok(())
    }

    /// Insert `items` after the retained item `anchor`.
    fn insert_after<T: Item>(
        &mut self,
        container: Container,
        anchor: &Spanned<T>,
        items: &[&T],
    ) -> Result<()> {
        let span = span_of(anchor)?;
        let indent = self.indent(span.start);
        let sep = if T::COMMA { "," } else { "" };

        match container {
            Container::Braced { close, .. } => {
                match rest_of_line_is_trivia(self.source, span.end, T::COMMA)
                    .filter(|&eol| eol < close)
                {
                    Some(eol) => {
                        if T::COMMA && comma_after(self.source, span.end).is_none() {
                            self.insert(span.end, ",".to_string());
                        }
                        let text: String = items
                            .iter()
                            .map(|item| format!("\n{}{}{}", indent, item.render(&indent, &self.unit), sep))
                            .collect();
                        self.insert(eol, text);
                    }
                    None if T::COMMA => match comma_after(self.source, span.end) {
                        Some(after) => {
                            let text: String = items
                                .iter()
                                .map(|item| format!(" {},", item.render(&indent, &self.unit)))
                                .collect();
                            self.insert(after, text);
                        }
                        None => {
                            let text: String = items
                                .iter()
                                .map(|item| format!(", {}", item.render(&indent, &self.unit)))
                                .collect();
                            self.insert(span.end, text);
                        }
                    },
                    None => {
                        let text: String = items
                            .iter()
                            .map(|item| format!("\n{}{}", indent, item.render(&indent, &self.unit)))
                            .collect();
                        self.insert(span.end, text);
                    }
                }
            }
            Container::Globals { .. } => {
                let text: String = items
                    .iter()
                    .map(|item| format!("\n{}{}", indent, item.render(&indent, &self.unit)))
                    .collect();
                self.insert(line_end(self.source, span.end), text);
            }
            Container::Functions => {
                let text: String = items
                    .iter()
                    .map(|item| format!("\n\n{}{}", indent, item.render(&indent, &self.unit)))
                    .collect();
                self.insert(line_end(self.source, span.end), text);
            }
        }
        Ok(())
    }

    /// Insert `items` in front of the old item `anchor`.
    fn insert_before<T: Item>(
        &mut self,
        container: Container,
        anchor: &Spanned<T>,
        items: &[&T],
    ) -> Result<()> {
        let span = span_of(anchor)?;
        let indent = self.indent(span.start);
        let sep = if T::COMMA { "," } else { "" };
        let at = line_start(self.source, span.start);

        let own_line = match container {
            Container::Braced { open, .. } => starts_line(self.source, span.start) && at >= open,
            _ => true,
        };
        if !own_line {
            let text: String = items
                .iter()
                .map(|item| format!("{}{} ", item.render(&indent, &self.unit), sep))
                .collect();
            self.insert(span.start, text);
            return Ok(());
        }

        let blank = if matches!(container, Container::Functions) {
            "\n"
        } else {
            ""
        };
        let text: String = items
            .iter()
            .map(|item| {
                format!(
                    "{}{}{}\n{}",
                    indent,
                    item.render(&indent, &self.unit),
                    sep,
                    blank
                )
            })
            .collect();
        self.insert(at, text);
        Ok(())
    }

    /// Insert `items` into a container that held none.
    fn fill<T: Item>(&mut self, container: Container, items: &[&T]) {
        let sep = if T::COMMA { "," } else { "" };
        match container {
            Container::Braced { open, close } => {
                let indent = self.indent(open.saturating_sub(1));
                let child = format!("{}{}", indent, self.unit);
                let lines: String = items
                    .iter()
                    .map(|item| format!("{}{}{}\n", child, item.render(&child, &self.unit), sep))
                    .collect();

                // Keep comments inside the braces when the `}` has a line of its own
                let close_line = line_start(self.source, close);
                if close_line >= open && starts_line(self.source, close) {
                    self.insert(close_line, lines);
                } else {
                    self.replace(open..close, format!("\n{}{}", lines, indent));
                }
            }
            Container::Globals { entity_end } => {
                let lines: Vec<String> = items.iter().map(|item| item.render("", &self.unit)).collect();
                self.insert(
                    line_end(self.source, entity_end),
                    format!("\n\n{}", lines.join("\n")),
                );
            }
            Container::Functions => {
                let mut text = String::new();
                if !self.source.is_empty() && !self.source.ends_with('\n') {
                    text.push('\n');
                }
                for item in items {
                    text.push('\n');
                    text.push_str(&item.render("", &self.unit));
                    text.push('\n');
                }
                self.insert(self.source.len(), text);
            }
        }
    }

    // ========================================================================
    // Blocks and statements
    // ========================================================================

    fn block(&mut self, old: &Spanned<Block>, new: &Spanned<Block>) -> Result<()> {
        let span = span_of(old)?;
        let steps = align(&old.node.statements, &new.node.statements, |a, b| a == b);
        self.list(
            Container::Braced {
                open: span.start + 1,
                close: span.end - 1,
            },
            &old.node.statements,
            &new.node.statements,
            &steps,
        )
    }

    fn statement(&mut self, old: &Spanned<Statement>, new: &Spanned<Statement>) -> Result<()> {
        let span = span_of(old)?;
        match (&old.node, &new.node) {
            (
                Statement::Assignment {
                    name: old_name,
                    ty: old_ty,
                    value: old_value,
                },
                Statement::Assignment {
                    name: new_name,
                    ty: new_ty,
                    value: new_value,
                },
            ) if old_ty.is_some() == new_ty.is_some() => {
                self.text(old_name, new_name)?;
                if let (Some(o), Some(n)) = (old_ty, new_ty) {
                    self.text(o, n)?;
                }
                self.expr(old_value, new_value, Position::Top)
            }
            (
                Statement::If {
                    condition: old_cond,
                    then_block: old_then,
                    else_block: old_else,
                },
                Statement::If {
                    condition: new_cond,
                    then_block: new_then,
                    else_block: new_else,
                },
            ) => {
                self.expr(old_cond, new_cond, Position::Top)?;
                self.block(old_then, new_then)?;
                self.else_branch(&span, old_then, old_else.as_ref(), new_else.as_ref())
            }
            (
                Statement::While {
                    condition: old_cond,
                    body: old_body,
                },
                Statement::While {
                    condition: new_cond,
                    body: new_body,
                },
            ) => {
                self.expr(old_cond, new_cond, Position::Top)?;
                self.block(old_body, new_body)
            }
            (Statement::Call(o), Statement::Call(n)) => self.call(o, n, span),
            (Statement::Return(Some(o)), Statement::Return(Some(n))) => {
                self.expr(o, n, Position::Top)
            }
            (Statement::Return(None), Statement::Return(Some(n))) => {
                self.insert(span.end, format!(" {}", render_expr(&n.node)));
                Ok(())
            }
            (Statement::Return(Some(_)), Statement::Return(None)) => {
                self.delete(span.start + "return".len()..span.end);
                Ok(())
            }
            (Statement::Return(None), Statement::Return(None))
            | (Statement::Break, Statement::Break)
            | (Statement::Continue, Statement::Continue) => Ok(()),
            _ => {
                let indent = self.indent(span.start);
                let text = render_statement(&new.node, &indent, &self.unit);
                self.replace(span, text);
                Ok(())
            }
        }
    }

    fn else_branch(
        &mut self,
        if_span: &Range<usize>,
        old_then: &Spanned<Block>,
        old_else: Option<&Spanned<Block>>,
        new_else: Option<&Spanned<Block>>,
    ) -> Result<()> {
        let then_end = span_of(old_then)?.end;
        let indent = self.indent(if_span.start);

        match (old_else, new_else) {
            (None, None) => {}
            (None, Some(n)) => {
                let text = format!(" else {}", render_else(&n.node, &indent, &self.unit));
                self.insert(then_end, text);
            }
            (Some(o), None) => self.delete(then_end..span_of(o)?.end),
            (Some(o), Some(n)) => {
                let span = span_of(o)?;
                if self.source[span.start..].starts_with('{') {
                    return self.block(o, n);
                }
                match (o.node.as_else_if(), n.node.as_else_if()) {
                    (Some(old_if), Some(new_if)) => self.statement(old_if, new_if)?,
                    _ => {
                        let text = render_else(&n.node, &indent, &self.unit);
                        self.replace(span, text);
                    }
                }
            }
        }
        Ok(())
    }

    fn call(&mut self, old: &Call, new: &Call, span: Range<usize>) -> Result<()> {
        if old.arguments.len() != new.arguments.len() {
            self.replace_token(span, render_call(new));
            return Ok(());
        }
        self.text(&old.name, &new.name)?;
        for (o, n) in old.arguments.iter().zip(&new.arguments) {
            self.expr(o, n, Position::Top)?;
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, old: &Spanned<Expr>, new: &Spanned<Expr>, position: Position) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let span = span_of(old)?;

        match (&old.node, &new.node) {
            (
                Expr::Binary {
                    op: old_op,
                    left: old_left,
                    right: old_right,
                },
                Expr::Binary {
                    op: new_op,
                    left: new_left,
                    right: new_right,
                },
            ) if old_op == new_op => {
                let p = old_op.precedence();
                self.expr(old_left, new_left, Position::Left(p))?;
                self.expr(old_right, new_right, Position::Right(p))
            }
            (
                Expr::Unary {
                    op: old_op,
                    operand: old_operand,
                },
                Expr::Unary {
                    op: new_op,
                    operand: new_operand,
                },
            ) if old_op == new_op => self.expr(old_operand, new_operand, Position::Operand),
            (Expr::Call(o), Expr::Call(n)) => self.call(o, n, span),
            _ => {
                let text = render_expr_at(&new.node, position);
                self.replace_token(span, text);
                Ok(())
            }
        }
    }

    /// Replace `range` with `text`, adding a space on either side where the
    /// text would otherwise fuse with a neighbouring word, as in `if(x)` or
    /// `not(x)` losing their parentheses.
    fn replace_token(&mut self, range: Range<usize>, text: String) {
        let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
        let before = self.source[..range.start].chars().next_back().is_some_and(word);
        let after = self.source[range.end..].chars().next().is_some_and(word);

        let mut padded = String::with_capacity(text.len() + 2);
        if before && text.starts_with(word) {
            padded.push(' ');
        }
        padded.push_str(&text);
        if after && text.ends_with(word) {
            padded.push(' ');
        }
        self.replace(range, padded);
    }
}

