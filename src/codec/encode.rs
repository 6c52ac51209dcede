//! AST → JSON.

use crate::ast::{
    Block, Call, Entity, Expr, Field, File, Function, GlobalVariable, Param, Spanned, Statement,
};
use serde_json::{Map, Value};

/// Encode a file. Total: every AST has exactly one encoding.
pub fn encode(file: &File) -> Value {
    let mut obj = Map::new();
    obj.insert("kind".to_owned(), Value::String("file".to_owned()));
    obj.insert("entity".to_owned(), encode_entity(&file.entity));
    obj.insert(
        "globals".to_owned(),
        Value::Array(file.globals.iter().map(encode_global).collect()),
    );
    obj.insert(
        "functions".to_owned(),
        Value::Array(file.functions.iter().map(encode_function).collect()),
    );
    Value::Object(obj)
}

/// Start an object for a node of `kind`.
fn node(kind: &str) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("kind".to_owned(), Value::String(kind.to_owned()));
    obj
}

/// Close an object, appending the node's line when known.
fn finish(mut obj: Map<String, Value>, line: Option<u32>) -> Value {
    if let Some(line) = line {
        obj.insert("line".to_owned(), Value::from(line));
    }
    Value::Object(obj)
}

fn string(s: &Spanned<String>) -> Value {
    Value::String(s.node.clone())
}

fn optional_string(s: &Option<Spanned<String>>) -> Value {
    s.as_ref().map_or(Value::Null, string)
}

fn encode_entity(entity: &Spanned<Entity>) -> Value {
    let mut obj = node("entity");
    obj.insert("name".to_owned(), string(&entity.node.name));
    obj.insert(
        "fields".to_owned(),
        Value::Array(entity.node.fields.iter().map(encode_field).collect()),
    );
    finish(obj, entity.line)
}

fn encode_field(field: &Spanned<Field>) -> Value {
    let mut obj = node("field");
    obj.insert("name".to_owned(), string(&field.node.name));
    obj.insert("type".to_owned(), string(&field.node.ty));
    obj.insert("value".to_owned(), encode_expr(&field.node.value));
    finish(obj, field.line)
}

fn encode_global(global: &Spanned<GlobalVariable>) -> Value {
    let mut obj = node("global");
    obj.insert("name".to_owned(), string(&global.node.name));
    obj.insert("type".to_owned(), string(&global.node.ty));
    obj.insert("value".to_owned(), encode_expr(&global.node.value));
    finish(obj, global.line)
}

fn encode_function(function: &Spanned<Function>) -> Value {
    let f = &function.node;
    let mut obj = node("function");
    obj.insert("name".to_owned(), string(&f.name));
    obj.insert(
        "params".to_owned(),
        Value::Array(f.params.iter().map(encode_param).collect()),
    );
    obj.insert("return_type".to_owned(), optional_string(&f.return_type));
    obj.insert("body".to_owned(), encode_block(&f.body));
    finish(obj, function.line)
}

fn encode_param(param: &Spanned<Param>) -> Value {
    let mut obj = node("param");
    obj.insert("name".to_owned(), string(&param.node.name));
    obj.insert("type".to_owned(), string(&param.node.ty));
    finish(obj, param.line)
}

fn encode_block(block: &Spanned<Block>) -> Value {
    Value::Array(block.node.statements.iter().map(encode_statement).collect())
}

fn encode_call(mut obj: Map<String, Value>, call: &Call) -> Map<String, Value> {
    obj.insert("name".to_owned(), string(&call.name));
    obj.insert(
        "arguments".to_owned(),
        Value::Array(call.arguments.iter().map(encode_expr).collect()),
    );
    obj
}

fn encode_statement(stmt: &Spanned<Statement>) -> Value {
    let mut obj = node(stmt.node.kind_name());
    match &stmt.node {
        Statement::Assignment { name, ty, value } => {
            obj.insert("name".to_owned(), string(name));
            obj.insert("type".to_owned(), optional_string(ty));
            obj.insert("value".to_owned(), encode_expr(value));
        }
        Statement::If {
            condition,
            then_block,
            else_block,
        } => {
            obj.insert("condition".to_owned(), encode_expr(condition));
            obj.insert("then".to_owned(), encode_block(then_block));
            obj.insert(
                "else".to_owned(),
                else_block.as_ref().map_or(Value::Null, encode_block),
            );
        }
        Statement::While { condition, body } => {
            obj.insert("condition".to_owned(), encode_expr(condition));
            obj.insert("body".to_owned(), encode_block(body));
        }
        Statement::Call(call) => obj = encode_call(obj, call),
        Statement::Return(value) => {
            obj.insert(
                "value".to_owned(),
                value.as_ref().map_or(Value::Null, encode_expr),
            );
        }
        Statement::Break | Statement::Continue => {}
    }
    finish(obj, stmt.line)
}

fn encode_expr(expr: &Spanned<Expr>) -> Value {
    let mut obj = node(expr.node.kind_name());
    match &expr.node {
        Expr::Literal { value, .. } => {
            obj.insert("value".to_owned(), Value::String(value.clone()));
        }
        Expr::Identifier(name) => {
            obj.insert("name".to_owned(), Value::String(name.clone()));
        }
        Expr::Unary { op, operand } => {
            obj.insert("operator".to_owned(), Value::String(op.symbol().to_owned()));
            obj.insert("operand".to_owned(), encode_expr(operand));
        }
        Expr::Binary { op, left, right } => {
            obj.insert("operator".to_owned(), Value::String(op.symbol().to_owned()));
            obj.insert("left".to_owned(), encode_expr(left));
            obj.insert("right".to_owned(), encode_expr(right));
        }
        Expr::Call(call) => obj = encode_call(obj, call),
    }
    finish(obj, expr.line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    #[test]
    fn test_encode_entity_shape() {
        let file = parse("entity gun {\n\tname: string = \"M60\",\n\trpm: i32 = 300,\n}\n")
            .expect("Failed to parse");
        let json = encode(&file);

        assert_eq!(json["kind"], "file");
        assert_eq!(json["entity"]["name"], "gun");
        assert_eq!(json["entity"]["line"], 1);
        assert_eq!(
            json["entity"]["fields"][1],
            json!({
                "kind": "field",
                "name": "rpm",
                "type": "i32",
                "value": { "kind": "number", "value": "300", "line": 3 },
                "line": 3,
            })
        );
        assert_eq!(json["entity"]["fields"][0]["value"]["value"], "M60");
        assert_eq!(json["globals"], json!([]));
    }

    #[test]
    fn test_encode_function_shape() {
        let file = parse("entity e {}\n\nf(a: i32) i32 {\n\treturn -a * 2\n}\n")
            .expect("Failed to parse");
        let json = encode(&file);
        let f = &json["functions"][0];

        assert_eq!(f["kind"], "function");
        assert_eq!(f["return_type"], "i32");
        assert_eq!(f["params"][0]["name"], "a");
        let ret = &f["body"][0];
        assert_eq!(ret["kind"], "return");
        assert_eq!(ret["value"]["kind"], "binary");
        assert_eq!(ret["value"]["operator"], "*");
        assert_eq!(ret["value"]["left"]["kind"], "unary");
        assert_eq!(ret["value"]["left"]["operator"], "-");
        assert_eq!(ret["value"]["right"]["value"], "2");
    }

    #[test]
    fn test_absent_optionals_are_null() {
        let file = parse("entity e {}\n\nf() {\n\tif x {\n\t\treturn\n\t}\n}\n")
            .expect("Failed to parse");
        let json = encode(&file);
        let f = &json["functions"][0];

        assert_eq!(f["return_type"], Value::Null);
        assert_eq!(f["body"][0]["else"], Value::Null);
        assert_eq!(f["body"][0]["then"][0]["value"], Value::Null);
    }

    #[test]
    fn test_synthetic_nodes_have_no_line() {
        let file = File {
            entity: Spanned::synthetic(Entity {
                name: Spanned::synthetic("e".to_string()),
                fields: vec![],
            }),
            globals: vec![],
            functions: vec![],
        };
        let json = encode(&file);
        assert!(json["entity"].get("line").is_none());
    }
}
