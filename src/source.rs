//! Line bookkeeping for source text.
//!
//! [`LineIndex`] maps byte offsets to 1-based lines and answers the layout
//! questions the patch engine asks (where does this line start, how is it
//! indented). [`annotate_lines`] uses it to stamp every parsed node with the
//! line it starts on.

use crate::ast::*;

/// Start offsets of every line in a source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            starts,
            len: source.len(),
        }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> u32 {
        let offset = offset.min(self.len);
        let idx = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (idx + 1) as u32
    }

    /// Byte offset where the line containing `offset` starts.
    pub fn line_start(&self, offset: usize) -> usize {
        let line = self.line_of(offset) as usize;
        self.starts[line - 1]
    }

    /// Number of lines, counting a trailing line without a newline.
    pub fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }
}

/// Leading whitespace of the line containing `offset`.
pub fn indent_at<'a>(source: &'a str, index: &LineIndex, offset: usize) -> &'a str {
    let start = index.line_start(offset);
    let rest = &source[start..];
    let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..width]
}

/// The indentation unit a file uses: the leading whitespace of its first
/// indented line, or `None` when nothing is indented.
pub fn detect_indent_unit(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let trimmed = line.trim_start_matches([' ', '\t']);
        let width = line.len() - trimmed.len();
        if width == 0 || trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        if line.starts_with('\t') {
            Some("\t".to_string())
        } else {
            Some(line[..width].to_string())
        }
    })
}

// ============================================================================
// Line annotation
// ============================================================================

/// Fill in `line` on every node that has a span.
pub fn annotate_lines(file: &mut File, index: &LineIndex) {
    stamp(&mut file.entity, index);
    stamp(&mut file.entity.node.name, index);
    for field in &mut file.entity.node.fields {
        stamp(field, index);
        stamp(&mut field.node.name, index);
        stamp(&mut field.node.ty, index);
        annotate_expr(&mut field.node.value, index);
    }

    for global in &mut file.globals {
        stamp(global, index);
        stamp(&mut global.node.name, index);
        stamp(&mut global.node.ty, index);
        annotate_expr(&mut global.node.value, index);
    }

    for function in &mut file.functions {
        stamp(function, index);
        let function = &mut function.node;
        stamp(&mut function.name, index);
        for param in &mut function.params {
            stamp(param, index);
            stamp(&mut param.node.name, index);
            stamp(&mut param.node.ty, index);
        }
        if let Some(ty) = &mut function.return_type {
            stamp(ty, index);
        }
        annotate_block(&mut function.body, index);
    }
}

fn stamp<T>(node: &mut Spanned<T>, index: &LineIndex) {
    if let Some(span) = &node.span {
        node.line = Some(index.line_of(span.start));
    }
}

fn annotate_block(block: &mut Spanned<Block>, index: &LineIndex) {
    stamp(block, index);
    for stmt in &mut block.node.statements {
        annotate_statement(stmt, index);
    }
}

fn annotate_statement(stmt: &mut Spanned<Statement>, index: &LineIndex) {
    stamp(stmt, index);
    match &mut stmt.node {
        Statement::Assignment { name, ty, value } => {
            stamp(name, index);
            if let Some(ty) = ty {
                stamp(ty, index);
            }
            annotate_expr(value, index);
        }
        Statement::If {
            condition,
            then_block,
            else_block,
        } => {
            annotate_expr(condition, index);
            annotate_block(then_block, index);
            if let Some(else_block) = else_block {
                annotate_block(else_block, index);
            }
        }
        Statement::While { condition, body } => {
            annotate_expr(condition, index);
            annotate_block(body, index);
        }
        Statement::Call(call) => annotate_call(call, index),
        Statement::Return(Some(value)) => annotate_expr(value, index),
        Statement::Return(None) | Statement::Break | Statement::Continue => {}
    }
}

fn annotate_call(call: &mut Call, index: &LineIndex) {
    stamp(&mut call.name, index);
    for arg in &mut call.arguments {
        annotate_expr(arg, index);
    }
}

fn annotate_expr(expr: &mut Spanned<Expr>, index: &LineIndex) {
    stamp(expr, index);
    match &mut expr.node {
        Expr::Unary { operand, .. } => annotate_expr(operand, index),
        Expr::Binary { left, right, .. } => {
            annotate_expr(left, index);
            annotate_expr(right, index);
        }
        Expr::Call(call) => annotate_call(call, index),
        Expr::Literal { .. } | Expr::Identifier(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("a\nbc\n\nd");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
        assert_eq!(index.line_of(100), 4);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_line_start_and_indent() {
        let source = "entity e {\n\t\tx: i32 = 1,\n}\n";
        let index = LineIndex::new(source);
        let x = source.find('x').unwrap();
        assert_eq!(index.line_start(x), 11);
        assert_eq!(indent_at(source, &index, x), "\t\t");
        assert_eq!(indent_at(source, &index, 0), "");
    }

    #[test]
    fn test_detect_indent_unit() {
        assert_eq!(detect_indent_unit("a {\n    b\n}\n").as_deref(), Some("    "));
        assert_eq!(detect_indent_unit("a {\n\tb\n}\n").as_deref(), Some("\t"));
        assert_eq!(detect_indent_unit("  # note\na {}\n"), None);
    }
}
