//! Formatting-preserving patch engine.
//!
//! [`diff`] compares the tree parsed from a source file with an edited tree
//! and produces the smallest byte [`Edit`]s that turn the source into a
//! rendering of the edited tree. Bytes belonging to unchanged subtrees,
//! comments and whitespace are never touched. [`apply_edits`] splices the
//! edits into the source. Neither function does any I/O.
//!
//! ```rust
//! use grug_ast::{parse, patch, Expr};
//!
//! let source = "entity gun {\n\trpm: i32 = 300, # fast\n}\n";
//! let original = parse(source).unwrap();
//!
//! let mut edited = original.clone();
//! edited.entity.node.fields[0].node.value.node = Expr::number("600");
//!
//! let edits = patch::diff(&original, source, &edited).unwrap();
//! assert_eq!(edits.len(), 1);
//! let patched = patch::apply_edits(source, edits).unwrap();
//! assert_eq!(patched, "entity gun {\n\trpm: i32 = 600, # fast\n}\n");
//! ```
//!
//! # Algorithm
//!
//! Lists (fields, globals, functions, statements) are aligned with a longest
//! common subsequence: fields, globals and functions match by name,
//! statements by structural equality. Aligned pairs recurse; a node is
//! re-rendered only where it actually differs, at the smallest span that
//! covers the difference. Inserted items copy their indentation from a
//! sibling and deleted items take their line, separator and trailing
//! comment with them.

mod align;
mod differ;
mod layout;

use crate::ast::File;
use crate::error::{Error, Result};
use crate::here;
use std::ops::Range;

/// A byte-span replacement on the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text for `[byte_start, byte_end)`
    pub new_text: String,
}

impl Edit {
    pub fn new(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            byte_start: range.start,
            byte_end: range.end,
            new_text: new_text.into(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }
}

/// Compute the edits that turn `source`, whose parse is `original`, into a
/// rendering of `new`.
///
/// Every node of `original` must carry its source span. An empty result
/// means the trees are structurally equal.
pub fn diff(original: &File, source: &str, new: &File) -> Result<Vec<Edit>> {
    let mut differ = differ::Differ::new(source);
    differ.file(original, new)?;
    let edits = differ.finish();
    log::debug!("diff produced {} edit(s)", edits.len());
    Ok(edits)
}

/// Apply edits to `source`.
///
/// Edits are applied bottom-to-top so offsets stay valid. Insertions at the
/// same offset keep their order. Overlapping or out-of-range edits are
/// rejected.
pub fn apply_edits(source: &str, edits: Vec<Edit>) -> Result<String> {
    let mut edits: Vec<(usize, Edit)> = edits.into_iter().enumerate().collect();

    // Descending by start, then by end; later-listed first among equals
    edits.sort_by(|(ia, a), (ib, b)| {
        b.byte_start
            .cmp(&a.byte_start)
            .then(b.byte_end.cmp(&a.byte_end))
            .then(ib.cmp(ia))
    });

    for (_, edit) in &edits {
        if edit.byte_start > edit.byte_end
            || edit.byte_end > source.len()
            || !source.is_char_boundary(edit.byte_start)
            || !source.is_char_boundary(edit.byte_end)
        {
            return Err(Error::schema(
                format!(
                    "edit range {}..{} is invalid for a source of {} bytes",
                    edit.byte_start,
                    edit.byte_end,
                    source.len()
                ),
                None,
                here!(),
            ));
        }
    }

    // Sorted descending: the earlier edit must end before the later starts
    for window in edits.windows(2) {
        let (later, earlier) = (&window[0].1, &window[1].1);
        if earlier.byte_end > later.byte_start {
            return Err(Error::schema(
                format!(
                    "overlapping edits at {:?} and {:?}",
                    earlier.range(),
                    later.range()
                ),
                None,
                here!(),
            ));
        }
    }

    let mut output = source.to_string();
    for (_, edit) in &edits {
        output.replace_range(edit.range(), &edit.new_text);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    const GUN: &str = r#"# The M60
entity gun {
	name: string = "M60",   # display name
	damage: i32 = 25,
	rounds_per_minute: i32 = 300,
}

ammo: i32 = 100

on_fire(self: id) {
	# one round per shot
	ammo = ammo - 1
	if ammo <= 0 {
		reload(self)
	} else if ammo < 10 {
		print_string("low")
	}
}

helper_clamp(n: i32, max: i32) i32 {
	while n > max {
		n = n - 1
	}
	return n
}
"#;

    /// Parse GUN, edit the tree, patch, and check the result reparses to
    /// the edited tree.
    fn patch(edit: impl FnOnce(&mut File)) -> String {
        patch_source(GUN, edit)
    }

    fn patch_source(source: &str, edit: impl FnOnce(&mut File)) -> String {
        let original = parse(source).expect("Failed to parse");
        let mut edited = original.clone();
        edit(&mut edited);

        let edits = diff(&original, source, &edited).expect("diff failed");
        let patched = apply_edits(source, edits).expect("apply failed");
        let reparsed = parse(&patched)
            .unwrap_or_else(|e| panic!("patched source does not parse: {}\n{}", e, patched));
        assert_eq!(reparsed, edited, "patched source:\n{}", patched);
        patched
    }

    fn s<T>(node: T) -> Spanned<T> {
        Spanned::synthetic(node)
    }

    fn name(text: &str) -> Spanned<String> {
        s(text.to_string())
    }

    fn field(n: &str, ty: &str, value: Expr) -> Spanned<Field> {
        s(Field {
            name: name(n),
            ty: name(ty),
            value: s(value),
        })
    }

    fn call(n: &str, args: Vec<Expr>) -> Spanned<Statement> {
        s(Statement::Call(Call {
            name: name(n),
            arguments: args.into_iter().map(s).collect(),
        }))
    }

    fn body(file: &mut File, function: usize) -> &mut Vec<Spanned<Statement>> {
        &mut file.functions[function].node.body.node.statements
    }

    #[test]
    fn test_unchanged_tree_produces_no_edits() {
        let original = parse(GUN).expect("Failed to parse");
        let edits = diff(&original, GUN, &original.clone()).expect("diff failed");
        assert!(edits.is_empty());
    }

    #[test]
    fn test_change_one_literal() {
        let patched = patch(|f| {
            f.entity.node.fields[2].node.value.node = Expr::number("600");
        });
        assert_eq!(patched, GUN.replace("= 300", "= 600"));
    }

    #[test]
    fn test_rename_entity_and_function() {
        let patched = patch(|f| {
            f.entity.node.name.node = "rifle".to_string();
            f.functions[0].node.name.node = "on_shoot".to_string();
        });
        assert_eq!(
            patched,
            GUN.replace("entity gun", "entity rifle")
                .replace("on_fire(", "on_shoot(")
        );
    }

    #[test]
    fn test_change_function_header() {
        let patched = patch(|f| {
            f.functions[1].node.return_type = None;
        });
        assert!(patched.contains("\nhelper_clamp(n: i32, max: i32) {\n"));
    }

    #[test]
    fn test_insert_field_after_last() {
        let patched = patch(|f| {
            f.entity
                .node
                .fields
                .push(field("magazine", "i32", Expr::number("100")));
        });
        assert_eq!(
            patched,
            GUN.replace(
                "rounds_per_minute: i32 = 300,\n",
                "rounds_per_minute: i32 = 300,\n\tmagazine: i32 = 100,\n"
            )
        );
    }

    #[test]
    fn test_insert_field_first() {
        let patched = patch(|f| {
            f.entity
                .node
                .fields
                .insert(0, field("id", "string", Expr::string("m60")));
        });
        assert!(patched.contains("entity gun {\n\tid: string = \"m60\",\n\tname: string"));
    }

    #[test]
    fn test_insert_field_adds_missing_comma() {
        let source = "entity gun {\n\tdamage: i32 = 25 # no comma\n}\n";
        let original = parse(source).expect("Failed to parse");
        let mut edited = original.clone();
        edited
            .entity
            .node
            .fields
            .push(field("rpm", "i32", Expr::number("300")));

        let edits = diff(&original, source, &edited).expect("diff failed");
        let patched = apply_edits(source, edits).expect("apply failed");
        assert_eq!(
            patched,
            "entity gun {\n\tdamage: i32 = 25, # no comma\n\trpm: i32 = 300,\n}\n"
        );
    }

    #[test]
    fn test_one_line_entity() {
        let source = "entity gun { damage: i32 = 25, rpm: i32 = 300 }\n";
        let original = parse(source).expect("Failed to parse");

        let mut edited = original.clone();
        edited
            .entity
            .node
            .fields
            .push(field("ammo", "i32", Expr::number("100")));
        let patched = apply_edits(source, diff(&original, source, &edited).unwrap()).unwrap();
        assert_eq!(
            patched,
            "entity gun { damage: i32 = 25, rpm: i32 = 300, ammo: i32 = 100 }\n"
        );

        let mut edited = original.clone();
        edited.entity.node.fields.remove(0);
        let patched = apply_edits(source, diff(&original, source, &edited).unwrap()).unwrap();
        assert_eq!(patched, "entity gun { rpm: i32 = 300 }\n");
    }

    #[test]
    fn test_delete_field_takes_comment() {
        let patched = patch(|f| {
            f.entity.node.fields.remove(0);
        });
        assert_eq!(patched, GUN.replace("\tname: string = \"M60\",   # display name\n", ""));
    }

    #[test]
    fn test_reorder_fields_is_a_change() {
        let patched = patch(|f| {
            f.entity.node.fields.swap(0, 1);
        });
        assert!(patched.contains("entity gun {\n\tdamage: i32 = 25,\n\tname: string = \"M60\","));
    }

    #[test]
    fn test_fill_empty_entity_and_block() {
        let source = "entity e {}\n\nf() {}\n";
        let original = parse(source).expect("Failed to parse");
        let mut edited = original.clone();
        edited
            .entity
            .node
            .fields
            .push(field("hp", "f32", Expr::number("1.5")));
        body(&mut edited, 0).push(call("print_string", vec![Expr::string("hi")]));

        let patched = apply_edits(source, diff(&original, source, &edited).unwrap()).unwrap();
        assert_eq!(
            patched,
            "entity e {\n\thp: f32 = 1.5,\n}\n\nf() {\n\tprint_string(\"hi\")\n}\n"
        );
    }

    #[test]
    fn test_insert_statement_keeps_comments() {
        let patched = patch(|f| {
            body(f, 0).insert(1, call("play_sound", vec![Expr::string("bang")]));
        });
        assert!(patched.contains(
            "\t# one round per shot\n\tammo = ammo - 1\n\tplay_sound(\"bang\")\n\tif ammo <= 0 {"
        ));
    }

    #[test]
    fn test_delete_statement() {
        let patched = patch(|f| {
            body(f, 1).remove(0);
        });
        assert!(patched.contains("helper_clamp(n: i32, max: i32) i32 {\n\treturn n\n}"));
    }

    #[test]
    fn test_statement_kind_change_is_rerendered() {
        let patched = patch(|f| {
            body(f, 1)[0] = s(Statement::If {
                condition: s(Expr::Identifier("n".to_string())),
                then_block: s(Block::new(vec![s(Statement::Break)])),
                else_block: None,
            });
        });
        assert!(patched.contains("\tif n {\n\t\tbreak\n\t}\n\treturn n"));
    }

    #[test]
    fn test_add_and_remove_else() {
        let patched = patch(|f| {
            let Statement::If { else_block, .. } = &mut body(f, 0)[1].node else {
                panic!("expected if");
            };
            *else_block = None;
        });
        assert!(patched.contains("\t\treload(self)\n\t}\n}"));

        let patched = patch(|f| {
            let Statement::If { else_block, .. } = &mut body(f, 0)[1].node else {
                panic!("expected if");
            };
            let Some(else_if) = else_block else {
                panic!("expected else");
            };
            let Statement::If { else_block, .. } = &mut else_if.node.statements[0].node else {
                panic!("expected else if");
            };
            *else_block = Some(s(Block::new(vec![call("fire", vec![])])));
        });
        assert!(patched.contains("\t} else if ammo < 10 {\n\t\tprint_string(\"low\")\n\t} else {\n\t\tfire()\n\t}\n"));
    }

    #[test]
    fn test_expression_replacement_respects_precedence() {
        let patched = patch(|f| {
            let Statement::Assignment { value, .. } = &mut body(f, 0)[0].node else {
                panic!("expected assignment");
            };
            let Expr::Binary { right, .. } = &mut value.node else {
                panic!("expected binary");
            };
            right.node = Expr::Binary {
                op: BinOp::Add,
                left: Box::new(s(Expr::number("1"))),
                right: Box::new(s(Expr::number("2"))),
            };
        });
        assert!(patched.contains("\tammo = ammo - (1 + 2)\n"));
    }

    #[test]
    fn test_insert_and_delete_globals() {
        let patched = patch(|f| {
            f.globals.push(s(GlobalVariable {
                name: name("reloading"),
                ty: name("bool"),
                value: s(Expr::bool(false)),
            }));
        });
        assert!(patched.contains("ammo: i32 = 100\nreloading: bool = false\n\non_fire"));

        let patched = patch(|f| {
            f.globals.clear();
        });
        assert!(patched.contains("}\n\non_fire(self: id) {"));
        assert!(!patched.contains("ammo: i32"));
    }

    #[test]
    fn test_insert_and_delete_functions() {
        let patched = patch(|f| {
            f.functions.push(s(Function {
                name: name("on_spawn"),
                params: vec![],
                return_type: None,
                body: s(Block::new(vec![call("print_string", vec![Expr::string("hi")])])),
            }));
        });
        assert!(patched.ends_with("\treturn n\n}\n\non_spawn() {\n\tprint_string(\"hi\")\n}\n"));

        let patched = patch(|f| {
            f.functions.remove(0);
        });
        assert!(patched.contains("ammo: i32 = 100\n\nhelper_clamp("));
    }

    #[test]
    fn test_delete_two_separate_fields() {
        let patched = patch(|f| {
            f.entity.node.fields.remove(2);
            f.entity.node.fields.remove(0);
        });
        assert!(patched.contains("entity gun {\n\tdamage: i32 = 25,\n}\n"));
    }

    #[test]
    fn test_delete_every_function() {
        let patched = patch(|f| {
            f.functions.clear();
        });
        assert!(patched.ends_with("}\n\nammo: i32 = 100\n"));
    }

    #[test]
    fn test_delete_trailing_functions_between_blank_lines() {
        let source = "entity e {}\n\nf() {}\n\ng() {}\n\nh() {}\n";
        let patched = patch_source(source, |f| {
            f.functions.truncate(1);
        });
        assert_eq!(patched, "entity e {}\n\nf() {}\n");

        let patched = patch_source(source, |f| {
            f.functions.remove(1);
        });
        assert_eq!(patched, "entity e {}\n\nf() {}\n\nh() {}\n");
    }

    #[test]
    fn test_delete_statements_between_blank_lines() {
        let source = "entity e {}\n\nf() {\n\ta = 1\n\n\tb = 2\n\n\tc = 3\n}\n";
        let patched = patch_source(source, |f| {
            body(f, 0).truncate(1);
        });
        assert_eq!(patched, "entity e {}\n\nf() {\n\ta = 1\n}\n");

        let patched = patch_source(source, |f| {
            body(f, 0).remove(1);
        });
        assert_eq!(patched, "entity e {}\n\nf() {\n\ta = 1\n\n\tc = 3\n}\n");
    }

    #[test]
    fn test_delete_next_to_insert() {
        let patched = patch(|f| {
            let statements = body(f, 0);
            statements.remove(0);
            statements.push(call("fire", vec![]));
        });
        assert!(patched.contains(
            "on_fire(self: id) {\n\t# one round per shot\n\tif ammo <= 0 {"
        ));
        assert!(patched.contains("\t\tprint_string(\"low\")\n\t}\n\tfire()\n}\n"));
    }

    #[test]
    fn test_replacement_does_not_fuse_with_keyword() {
        let source = "entity e {}\n\nf() {\n\tif(ready) {\n\t\tx = not(y)\n\t}\n}\n";
        let patched = patch_source(source, |f| {
            let Statement::If {
                condition,
                then_block,
                ..
            } = &mut body(f, 0)[0].node
            else {
                panic!("expected if");
            };
            condition.node = Expr::Identifier("go".to_string());
            let Statement::Assignment { value, .. } = &mut then_block.node.statements[0].node else {
                panic!("expected assignment");
            };
            let Expr::Unary { operand, .. } = &mut value.node else {
                panic!("expected unary");
            };
            operand.node = Expr::Identifier("z".to_string());
        });
        assert_eq!(
            patched,
            "entity e {}\n\nf() {\n\tif go {\n\t\tx = not z\n\t}\n}\n"
        );
    }

    #[test]
    fn test_replacement_keeps_following_word_apart() {
        let source = "entity e {\n\tok: bool = (a)and b,\n}\n";
        let patched = patch_source(source, |f| {
            let Expr::Binary { left, .. } = &mut f.entity.node.fields[0].node.value.node else {
                panic!("expected binary");
            };
            left.node = Expr::Identifier("c".to_string());
        });
        assert_eq!(patched, "entity e {\n\tok: bool = c and b,\n}\n");
    }

    #[test]
    fn test_apply_edits_rejects_overlap() {
        let edits = vec![Edit::new(0..5, "a"), Edit::new(3..8, "b")];
        assert!(apply_edits("0123456789", edits).is_err());
        assert!(apply_edits("0123", vec![Edit::new(2..9, "x")]).is_err());
    }

    #[test]
    fn test_apply_edits_keeps_insertion_order() {
        let edits = vec![Edit::new(1..1, "a"), Edit::new(1..1, "b"), Edit::new(0..1, "X")];
        assert_eq!(apply_edits("01", edits).unwrap(), "Xab1");
    }
}
