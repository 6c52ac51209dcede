//! JSON → AST.
//!
//! Decoding is strict about shape and lenient about extras: every required
//! key must be present with the right JSON type, scalars must be text the
//! lexer could have produced, but unknown keys are ignored.

use super::{is_known_kind, EXPRESSION_KINDS, STATEMENT_KINDS};
use crate::ast::{
    check_declared_type, check_literal, is_identifier, BinOp, Block, Call, Entity, Expr, Field,
    File, Function, GlobalVariable, LiteralKind, Param, Spanned, Statement, UnaryOp,
};
use crate::error::{Error, ErrorKind, Location, Result};
use crate::here;
use serde_json::{Map, Value};

/// Decode a JSON document into a file.
pub fn decode(value: &Value) -> Result<File> {
    Decoder {
        misplaced: ErrorKind::Decode,
    }
    .file(value)
}

/// Decode for the patch engine, where a known kind in the wrong position
/// means the edit cannot be reconciled with the target file.
pub(crate) fn decode_for_patch(value: &Value) -> Result<File> {
    Decoder {
        misplaced: ErrorKind::Schema,
    }
    .file(value)
}

/// A JSON object checked to be a node of an allowed kind.
struct Node<'v> {
    obj: &'v Map<String, Value>,
    kind: &'v str,
    /// The node's own `line` key.
    line: Option<u32>,
    /// The nearest known line, for error reporting.
    context: Option<u32>,
}

struct Decoder {
    misplaced: ErrorKind,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn decode_error(message: impl Into<String>, line: Option<u32>, at: Location) -> Error {
    Error::decode(message, line, at)
}

impl Node<'_> {
    fn spanned<T>(&self, node: T) -> Spanned<T> {
        Spanned::synthetic(node).with_line(self.line)
    }

    fn required(&self, key: &str) -> Result<&Value> {
        self.obj.get(key).ok_or_else(|| {
            decode_error(
                format!("{} node is missing required key \"{}\"", self.kind, key),
                self.context,
                here!(),
            )
        })
    }

    /// An optional key; JSON `null` counts as absent.
    fn optional(&self, key: &str) -> Option<&Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str) -> Result<&str> {
        let value = self.required(key)?;
        value.as_str().ok_or_else(|| self.mismatch(key, "a string", value))
    }

    fn array(&self, key: &str) -> Result<&Vec<Value>> {
        let value = self.required(key)?;
        value
            .as_array()
            .ok_or_else(|| self.mismatch(key, "an array", value))
    }

    fn mismatch(&self, key: &str, expected: &str, found: &Value) -> Error {
        decode_error(
            format!(
                "key \"{}\" of {} node must be {}, found {}",
                key,
                self.kind,
                expected,
                json_type(found)
            ),
            self.context,
            here!(),
        )
    }

    /// A name or type tag under `key`.
    fn identifier(&self, key: &str) -> Result<Spanned<String>> {
        let text = self.string(key)?;
        self.check_identifier(key, text)?;
        Ok(self.spanned(text.to_owned()))
    }

    fn optional_identifier(&self, key: &str) -> Result<Option<Spanned<String>>> {
        match self.optional(key) {
            None => Ok(None),
            Some(Value::String(text)) => {
                self.check_identifier(key, text)?;
                Ok(Some(self.spanned(text.clone())))
            }
            Some(other) => Err(self.mismatch(key, "a string or null", other)),
        }
    }

    fn check_identifier(&self, key: &str, text: &str) -> Result<()> {
        if is_identifier(text) {
            Ok(())
        } else {
            Err(decode_error(
                format!(
                    "\"{}\" is not a valid identifier for key \"{}\" of {} node",
                    text, key, self.kind
                ),
                self.context,
                here!(),
            ))
        }
    }
}

impl Decoder {
    /// Check that `value` is an object whose kind is one of `allowed`.
    fn node<'v>(
        &self,
        value: &'v Value,
        allowed: &[&str],
        role: &str,
        context: Option<u32>,
    ) -> Result<Node<'v>> {
        let obj = value.as_object().ok_or_else(|| {
            decode_error(
                format!("{} must be an object, found {}", role, json_type(value)),
                context,
                here!(),
            )
        })?;

        let line = match obj.get("line") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_u64().and_then(|n| u32::try_from(n).ok()).ok_or_else(
                || {
                    decode_error(
                        format!("\"line\" of {} must be a non-negative integer", role),
                        context,
                        here!(),
                    )
                },
            )?),
        };
        let context = line.or(context);

        let kind = match obj.get("kind") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                return Err(decode_error(
                    format!("\"kind\" of {} must be a string, found {}", role, json_type(other)),
                    context,
                    here!(),
                ))
            }
            None => {
                return Err(decode_error(
                    format!("{} is missing required key \"kind\"", role),
                    context,
                    here!(),
                ))
            }
        };

        if !is_known_kind(kind) {
            return Err(decode_error(
                format!("unknown node kind \"{}\"", kind),
                context,
                here!(),
            ));
        }
        if !allowed.contains(&kind) {
            return Err(Error::decode(
                format!("{} node cannot appear as {}", kind, role),
                context,
                here!(),
            )
            .with_kind(self.misplaced));
        }

        Ok(Node {
            obj,
            kind,
            line,
            context,
        })
    }

    fn file(&self, value: &Value) -> Result<File> {
        if !value.is_object() {
            return Err(decode_error(
                format!("JSON root must be an object, found {}", json_type(value)),
                None,
                here!(),
            ));
        }
        let node = self.node(value, &["file"], "the root", None)?;

        let entity = self.entity(node.required("entity")?, node.context)?;

        let globals = node
            .array("globals")?
            .iter()
            .map(|g| self.global(g, node.context))
            .collect::<Result<Vec<_>>>()?;

        let functions = node
            .array("functions")?
            .iter()
            .map(|f| self.function(f, node.context))
            .collect::<Result<Vec<_>>>()?;

        Ok(File {
            entity,
            globals,
            functions,
        })
    }

    fn entity(&self, value: &Value, context: Option<u32>) -> Result<Spanned<Entity>> {
        let node = self.node(value, &["entity"], "the entity", context)?;
        let name = node.identifier("name")?;
        let fields = node
            .array("fields")?
            .iter()
            .map(|f| self.field(f, node.context))
            .collect::<Result<Vec<_>>>()?;
        Ok(node.spanned(Entity { name, fields }))
    }

    fn field(&self, value: &Value, context: Option<u32>) -> Result<Spanned<Field>> {
        let node = self.node(value, &["field"], "an entity field", context)?;
        let (name, ty, value) = self.declaration(&node)?;
        Ok(node.spanned(Field { name, ty, value }))
    }

    fn global(&self, value: &Value, context: Option<u32>) -> Result<Spanned<GlobalVariable>> {
        let node = self.node(value, &["global"], "a global variable", context)?;
        let (name, ty, value) = self.declaration(&node)?;
        Ok(node.spanned(GlobalVariable { name, ty, value }))
    }

    /// `name`, `type` and a `value` that agrees with the type.
    fn declaration(
        &self,
        node: &Node<'_>,
    ) -> Result<(Spanned<String>, Spanned<String>, Spanned<Expr>)> {
        let name = node.identifier("name")?;
        let ty = node.identifier("type")?;
        let value = self.expr(node.required("value")?, node.context)?;
        check_declared_type(&name.node, &ty.node, &value.node)
            .map_err(|msg| decode_error(msg, node.context, here!()))?;
        Ok((name, ty, value))
    }

    fn function(&self, value: &Value, context: Option<u32>) -> Result<Spanned<Function>> {
        let node = self.node(value, &["function"], "a function", context)?;
        let name = node.identifier("name")?;
        let params = node
            .array("params")?
            .iter()
            .map(|p| -> Result<Spanned<Param>> {
                let param = self.node(p, &["param"], "a function parameter", node.context)?;
                Ok(param.spanned(Param {
                    name: param.identifier("name")?,
                    ty: param.identifier("type")?,
                }))
            })
            .collect::<Result<Vec<_>>>()?;
        let return_type = node.optional_identifier("return_type")?;
        let body = self.block(&node, "body")?;
        Ok(node.spanned(Function {
            name,
            params,
            return_type,
            body,
        }))
    }

    fn block(&self, node: &Node<'_>, key: &str) -> Result<Spanned<Block>> {
        let statements = node
            .array(key)?
            .iter()
            .map(|s| self.statement(s, node.context))
            .collect::<Result<Vec<_>>>()?;
        Ok(Spanned::synthetic(Block::new(statements)))
    }

    fn call(&self, node: &Node<'_>) -> Result<Call> {
        let name = node.identifier("name")?;
        let arguments = node
            .array("arguments")?
            .iter()
            .map(|a| self.expr(a, node.context))
            .collect::<Result<Vec<_>>>()?;
        Ok(Call { name, arguments })
    }

    fn statement(&self, value: &Value, context: Option<u32>) -> Result<Spanned<Statement>> {
        let node = self.node(value, &STATEMENT_KINDS, "a statement", context)?;
        let stmt = match node.kind {
            "assignment" => {
                let name = node.identifier("name")?;
                let ty = node.optional_identifier("type")?;
                let value = self.expr(node.required("value")?, node.context)?;
                if let Some(ty) = &ty {
                    check_declared_type(&name.node, &ty.node, &value.node)
                        .map_err(|msg| decode_error(msg, node.context, here!()))?;
                }
                Statement::Assignment { name, ty, value }
            }
            "if" => {
                let condition = self.expr(node.required("condition")?, node.context)?;
                let then_block = self.block(&node, "then")?;
                let else_block = match node.optional("else") {
                    None => None,
                    Some(_) => Some(self.block(&node, "else")?),
                };
                Statement::If {
                    condition,
                    then_block,
                    else_block,
                }
            }
            "while" => Statement::While {
                condition: self.expr(node.required("condition")?, node.context)?,
                body: self.block(&node, "body")?,
            },
            "call" => Statement::Call(self.call(&node)?),
            "return" => Statement::Return(match node.optional("value") {
                None => None,
                Some(value) => Some(self.expr(value, node.context)?),
            }),
            "break" => Statement::Break,
            _ => Statement::Continue,
        };
        Ok(node.spanned(stmt))
    }

    fn expr(&self, value: &Value, context: Option<u32>) -> Result<Spanned<Expr>> {
        let node = self.node(value, &EXPRESSION_KINDS, "an expression", context)?;
        let expr = match node.kind {
            "number" | "string" | "bool" => {
                let kind = match node.kind {
                    "number" => LiteralKind::Number,
                    "string" => LiteralKind::String,
                    _ => LiteralKind::Bool,
                };
                let text = node.string("value")?;
                check_literal(kind, text).map_err(|msg| decode_error(msg, node.context, here!()))?;
                Expr::Literal {
                    kind,
                    value: text.to_owned(),
                }
            }
            "identifier" => Expr::Identifier(node.identifier("name")?.node),
            "unary" => {
                let symbol = node.string("operator")?;
                let op = UnaryOp::from_symbol(symbol).ok_or_else(|| {
                    decode_error(
                        format!("unknown unary operator \"{}\"", symbol),
                        node.context,
                        here!(),
                    )
                })?;
                Expr::Unary {
                    op,
                    operand: Box::new(self.expr(node.required("operand")?, node.context)?),
                }
            }
            "binary" => {
                let symbol = node.string("operator")?;
                let op = BinOp::from_symbol(symbol).ok_or_else(|| {
                    decode_error(
                        format!("unknown binary operator \"{}\"", symbol),
                        node.context,
                        here!(),
                    )
                })?;
                Expr::Binary {
                    op,
                    left: Box::new(self.expr(node.required("left")?, node.context)?),
                    right: Box::new(self.expr(node.required("right")?, node.context)?),
                }
            }
            _ => Expr::Call(self.call(&node)?),
        };
        Ok(node.spanned(expr))
    }
}
