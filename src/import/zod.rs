//! Zod schema importer
//!
//! Reads `const fooSchema = z.object({ ... })` style declarations into a
//! [`SchemaDocument`]. Declarations may reference each other by identifier;
//! `fooSchema` becomes the declaration `Foo`. A bare expression without a
//! `const` is treated as `const schema = <expr>;`.

use super::lexer::{TokenKind, TokenStream};
use super::{ImportError, check_references};
use crate::models::{
    Declaration, Field, Literal, NumberChecks, SchemaDocument, SchemaNode, StringChecks,
    StringFormat,
};
use std::collections::HashMap;
use tracing::debug;

/// Variable name given to a bare schema expression
pub const WRAPPED_VARIABLE: &str = "schema";

const STATEMENT_KEYWORDS: &[&str] = &["const", "let", "var", "export", "import"];

/// Modifiers that take arguments but do not change the data shape
const SHAPE_PRESERVING: &[&str] = &[
    "default", "catch", "strict", "passthrough", "strip", "nonstrict", "trim", "toLowerCase",
    "toUpperCase", "refine", "superRefine", "transform", "brand", "readonly", "pipe", "regex",
    "startsWith", "endsWith", "includes", "cuid", "cuid2", "ulid", "emoji", "ip", "finite",
    "safe", "multipleOf", "step", "nonempty", "describe",
];

/// Importer for Zod schema source.
#[derive(Debug, Default, Clone)]
pub struct ZodImporter;

impl ZodImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse Zod source into a schema document.
    pub fn parse(&self, source: &str) -> Result<SchemaDocument, ImportError> {
        let mut tokens = TokenStream::new(source)?;
        let mut parser = Parser {
            tokens: &mut tokens,
        };

        let statements = if parser.starts_with_statement() {
            parser.parse_statements()?
        } else {
            debug!("No declaration found, wrapping input as `const {WRAPPED_VARIABLE}`");
            let description = parser.tokens.take_doc();
            let (node, described) = parser.parse_expr()?;
            parser.tokens.eat_symbol(";");
            if !parser.tokens.at_eof() {
                return Err(parser.tokens.unexpected("end of input"));
            }
            vec![(WRAPPED_VARIABLE.to_string(), node, described.or(description))]
        };

        if statements.is_empty() {
            return Err(ImportError::Empty("Zod"));
        }

        let names: HashMap<String, String> = statements
            .iter()
            .map(|(variable, _, _)| (variable.clone(), declaration_name(variable)))
            .collect();

        let mut doc = SchemaDocument::new();
        for (variable, node, description) in statements {
            let mut declaration =
                Declaration::new(declaration_name(&variable), rename_refs(node, &names)?);
            declaration.description = description;
            doc.add(declaration);
        }
        check_references(&doc)?;
        Ok(doc)
    }
}

/// `userSchema` -> `User`, `schema` -> `Schema`
pub fn declaration_name(variable: &str) -> String {
    let base = variable
        .strip_suffix("Schema")
        .filter(|b| !b.is_empty())
        .unwrap_or(variable);
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn rename_refs(node: SchemaNode, names: &HashMap<String, String>) -> Result<SchemaNode, ImportError> {
    let rename = |n: SchemaNode| rename_refs(n, names);
    let renamed = match node {
        SchemaNode::Ref { name } => match names.get(&name) {
            Some(target) => SchemaNode::reference(target.clone()),
            None => return Err(ImportError::UnresolvedReference(name)),
        },
        SchemaNode::Object { fields } => SchemaNode::Object {
            fields: fields
                .into_iter()
                .map(|f| {
                    Ok(Field {
                        node: rename(f.node)?,
                        ..f
                    })
                })
                .collect::<Result<_, ImportError>>()?,
        },
        SchemaNode::Array { items } => SchemaNode::array(rename(*items)?),
        SchemaNode::Tuple { items } => SchemaNode::Tuple {
            items: items.into_iter().map(rename).collect::<Result<_, _>>()?,
        },
        SchemaNode::Record { key, value } => SchemaNode::Record {
            key: Box::new(rename(*key)?),
            value: Box::new(rename(*value)?),
        },
        SchemaNode::Union { options } => SchemaNode::Union {
            options: options.into_iter().map(rename).collect::<Result<_, _>>()?,
        },
        SchemaNode::Intersection { parts } => SchemaNode::Intersection {
            parts: parts.into_iter().map(rename).collect::<Result<_, _>>()?,
        },
        SchemaNode::Optional { inner } => rename(*inner)?.optional(),
        SchemaNode::Nullable { inner } => rename(*inner)?.nullable(),
        other => other,
    };
    Ok(renamed)
}

type Statement = (String, SchemaNode, Option<String>);

struct Parser<'a> {
    tokens: &'a mut TokenStream,
}

impl Parser<'_> {
    fn starts_with_statement(&self) -> bool {
        let mut n = 0;
        while matches!(self.tokens.peek_nth(n), TokenKind::Doc(_)) {
            n += 1;
        }
        matches!(self.tokens.peek_nth(n), TokenKind::Ident(word) if STATEMENT_KEYWORDS.contains(&word.as_str()))
    }

    fn parse_statements(&mut self) -> Result<Vec<Statement>, ImportError> {
        let mut statements = Vec::new();
        loop {
            let description = self.tokens.take_doc();
            if self.tokens.at_eof() {
                break;
            }
            if self.tokens.eat_symbol(";") {
                continue;
            }
            if self.tokens.is_ident("import") {
                self.skip_statement();
                continue;
            }
            self.tokens.eat_ident("export");
            if self.tokens.is_ident("type") || self.tokens.is_ident("interface") {
                // `export type User = z.infer<typeof userSchema>;`
                self.skip_statement();
                continue;
            }
            if !(self.tokens.eat_ident("const")
                || self.tokens.eat_ident("let")
                || self.tokens.eat_ident("var"))
            {
                return Err(self.tokens.unexpected("`const`"));
            }
            let variable = self.tokens.expect_ident()?;
            if self.tokens.eat_symbol(":") {
                // Type annotation such as `z.ZodType<User>`
                while !self.tokens.is_symbol("=") && !self.tokens.at_eof() {
                    self.tokens.next();
                }
            }
            self.tokens.expect_symbol("=")?;
            let (node, described) = self.parse_expr()?;
            self.tokens.eat_symbol(";");
            statements.push((variable, node, described.or(description)));
        }
        Ok(statements)
    }

    fn skip_statement(&mut self) {
        while !self.tokens.at_eof() && !self.tokens.eat_symbol(";") {
            self.tokens.next();
        }
    }

    /// An expression and the text of any `.describe(...)` applied to it
    fn parse_expr(&mut self) -> Result<(SchemaNode, Option<String>), ImportError> {
        self.tokens.enter()?;
        let result = self.parse_chain();
        self.tokens.leave();
        result
    }

    fn parse_chain(&mut self) -> Result<(SchemaNode, Option<String>), ImportError> {
        let mut node = self.parse_primary()?;
        let mut description = None;

        while self.tokens.eat_symbol(".") {
            let method = self.tokens.expect_ident()?;
            match method.as_str() {
                "optional" => {
                    self.expect_no_args()?;
                    node = node.optional();
                }
                "nullable" => {
                    self.expect_no_args()?;
                    node = node.nullable();
                }
                "nullish" => {
                    self.expect_no_args()?;
                    node = node.nullable().optional();
                }
                "array" => {
                    self.expect_no_args()?;
                    node = SchemaNode::array(node);
                }
                "or" => {
                    self.tokens.expect_symbol("(")?;
                    let (other, _) = self.parse_expr()?;
                    self.tokens.expect_symbol(")")?;
                    node = SchemaNode::union(vec![node, other]);
                }
                "and" => {
                    self.tokens.expect_symbol("(")?;
                    let (other, _) = self.parse_expr()?;
                    self.tokens.expect_symbol(")")?;
                    node = SchemaNode::Intersection {
                        parts: vec![node, other],
                    };
                }
                "describe" => {
                    self.tokens.expect_symbol("(")?;
                    if let TokenKind::Str(text) = self.tokens.peek_kind().clone() {
                        self.tokens.next();
                        description = Some(text);
                    }
                    self.skip_args_from_inside()?;
                }
                "shape" | "element" | "unwrap" => {}
                _ => {
                    let args = self.parse_numeric_args()?;
                    node = apply_check(node, &method, &args);
                }
            }
        }
        Ok((node, description))
    }

    fn parse_primary(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.skip_docs();
        match self.tokens.peek_kind().clone() {
            TokenKind::Symbol("(") => {
                self.tokens.next();
                let (node, _) = self.parse_expr()?;
                self.tokens.expect_symbol(")")?;
                Ok(node)
            }
            TokenKind::Ident(name) if name == "z" => {
                self.tokens.next();
                self.tokens.expect_symbol(".")?;
                let mut constructor = self.tokens.expect_ident()?;
                if constructor == "coerce" {
                    self.tokens.expect_symbol(".")?;
                    constructor = self.tokens.expect_ident()?;
                }
                self.parse_constructor(&constructor)
            }
            TokenKind::Ident(name) => {
                self.tokens.next();
                Ok(SchemaNode::reference(name))
            }
            _ => Err(self.tokens.unexpected("a schema expression")),
        }
    }

    fn parse_constructor(&mut self, constructor: &str) -> Result<SchemaNode, ImportError> {
        self.tokens.expect_symbol("(")?;
        let node = match constructor {
            "string" => SchemaNode::string(),
            "number" => SchemaNode::number(),
            "bigint" => SchemaNode::BigInt,
            "boolean" => SchemaNode::Boolean,
            "date" => SchemaNode::Date,
            "null" => SchemaNode::Null,
            "undefined" | "void" => SchemaNode::Undefined,
            "any" => SchemaNode::Any,
            "unknown" | "nativeEnum" => SchemaNode::Unknown,
            "never" => SchemaNode::Never,
            "literal" => {
                let value = self.parse_literal()?;
                self.tokens.eat_symbol(",");
                value
            }
            "enum" => {
                self.tokens.expect_symbol("[")?;
                let mut values = Vec::new();
                while !self.tokens.eat_symbol("]") {
                    match self.tokens.next().kind {
                        TokenKind::Str(value) => values.push(value),
                        _ => return Err(self.tokens.unexpected("a string enum value")),
                    }
                    if !self.tokens.eat_symbol(",") {
                        self.tokens.expect_symbol("]")?;
                        break;
                    }
                }
                SchemaNode::Enum { values }
            }
            "object" | "strictObject" | "looseObject" => self.parse_object_shape()?,
            "array" | "set" => SchemaNode::array(self.parse_expr()?.0),
            "optional" => self.parse_expr()?.0.optional(),
            "nullable" => self.parse_expr()?.0.nullable(),
            "tuple" => SchemaNode::Tuple {
                items: self.parse_expr_list()?,
            },
            "union" => SchemaNode::union(self.parse_expr_list()?),
            "discriminatedUnion" => {
                match self.tokens.next().kind {
                    TokenKind::Str(_) => {}
                    _ => return Err(self.tokens.unexpected("a discriminator key")),
                }
                self.tokens.expect_symbol(",")?;
                SchemaNode::union(self.parse_expr_list()?)
            }
            "intersection" => {
                let (left, _) = self.parse_expr()?;
                self.tokens.expect_symbol(",")?;
                let (right, _) = self.parse_expr()?;
                SchemaNode::Intersection {
                    parts: vec![left, right],
                }
            }
            "record" | "map" => {
                let (first, _) = self.parse_expr()?;
                if self.tokens.eat_symbol(",") && !self.tokens.is_symbol(")") {
                    let (value, _) = self.parse_expr()?;
                    SchemaNode::Record {
                        key: Box::new(first),
                        value: Box::new(value),
                    }
                } else {
                    SchemaNode::Record {
                        key: Box::new(SchemaNode::string()),
                        value: Box::new(first),
                    }
                }
            }
            "lazy" => {
                // `() => expr` or `() => { return expr; }`
                self.tokens.expect_symbol("(")?;
                self.tokens.expect_symbol(")")?;
                self.tokens.expect_symbol("=>")?;
                if self.tokens.eat_symbol("{") {
                    if !self.tokens.eat_ident("return") {
                        return Err(self.tokens.unexpected("`return`"));
                    }
                    let (node, _) = self.parse_expr()?;
                    self.tokens.eat_symbol(";");
                    self.tokens.expect_symbol("}")?;
                    node
                } else {
                    self.parse_expr()?.0
                }
            }
            other => {
                return Err(self.tokens.unexpected(&format!(
                    "a supported zod constructor (found `z.{other}`)"
                )));
            }
        };
        // Trailing options object such as `{ required_error: "..." }`
        self.skip_args_from_inside()?;
        Ok(node)
    }

    fn parse_literal(&mut self) -> Result<SchemaNode, ImportError> {
        let negative = self.tokens.eat_symbol("-");
        let node = match self.tokens.next().kind {
            TokenKind::Str(s) if !negative => SchemaNode::Literal {
                value: Literal::String(s),
            },
            TokenKind::Num(n) => SchemaNode::Literal {
                value: Literal::Number(if negative { -n } else { n }),
            },
            TokenKind::Ident(word) if !negative => match word.as_str() {
                "true" => SchemaNode::Literal {
                    value: Literal::Bool(true),
                },
                "false" => SchemaNode::Literal {
                    value: Literal::Bool(false),
                },
                "null" => SchemaNode::Null,
                "undefined" => SchemaNode::Undefined,
                _ => return Err(self.tokens.unexpected("a literal value")),
            },
            _ => return Err(self.tokens.unexpected("a literal value")),
        };
        Ok(node)
    }

    fn parse_object_shape(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.expect_symbol("{")?;
        self.tokens.enter()?;
        let mut fields = Vec::new();
        loop {
            let description = self.tokens.take_doc();
            if self.tokens.eat_symbol("}") {
                break;
            }
            let name = match self.tokens.next().kind {
                TokenKind::Ident(name) | TokenKind::Str(name) => name,
                TokenKind::Num(n) => n.to_string(),
                _ => return Err(self.tokens.unexpected("a property name")),
            };
            self.tokens.expect_symbol(":")?;
            let (node, described) = self.parse_expr()?;
            let mut field = Field::new(name, node);
            field.description = described.or(description);
            fields.push(field);
            if !self.tokens.eat_symbol(",") {
                self.tokens.skip_docs();
                self.tokens.expect_symbol("}")?;
                break;
            }
        }
        self.tokens.leave();
        Ok(SchemaNode::object(fields))
    }

    /// `[a, b, c]`
    fn parse_expr_list(&mut self) -> Result<Vec<SchemaNode>, ImportError> {
        self.tokens.expect_symbol("[")?;
        let mut items = Vec::new();
        while !self.tokens.eat_symbol("]") {
            items.push(self.parse_expr()?.0);
            if !self.tokens.eat_symbol(",") {
                self.tokens.expect_symbol("]")?;
                break;
            }
        }
        Ok(items)
    }

    fn expect_no_args(&mut self) -> Result<(), ImportError> {
        self.tokens.expect_symbol("(")?;
        self.tokens.expect_symbol(")")
    }

    /// Parse `(n, ...)`, keeping leading numeric arguments; anything else is skipped.
    fn parse_numeric_args(&mut self) -> Result<Vec<f64>, ImportError> {
        self.tokens.expect_symbol("(")?;
        let mut args = Vec::new();
        loop {
            let negative = self.tokens.is_symbol("-")
                && matches!(self.tokens.peek_nth(1), TokenKind::Num(_));
            if negative {
                self.tokens.next();
            }
            match self.tokens.peek_kind().clone() {
                TokenKind::Num(n) => {
                    self.tokens.next();
                    args.push(if negative { -n } else { n });
                    if !self.tokens.eat_symbol(",") {
                        break;
                    }
                }
                _ => break,
            }
        }
        self.skip_args_from_inside()?;
        Ok(args)
    }

    /// Skip to and past the `)` closing an argument list already opened.
    fn skip_args_from_inside(&mut self) -> Result<(), ImportError> {
        let mut depth = 1usize;
        loop {
            let token = self.tokens.next();
            match token.kind {
                TokenKind::Eof => return Err(self.tokens.unexpected("`)`")),
                TokenKind::Symbol("(") | TokenKind::Symbol("[") | TokenKind::Symbol("{") => {
                    depth += 1
                }
                TokenKind::Symbol(")") | TokenKind::Symbol("]") | TokenKind::Symbol("}") => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }
}

/// Apply a refinement such as `.int()` or `.min(3)` to a node.
fn apply_check(node: SchemaNode, method: &str, args: &[f64]) -> SchemaNode {
    let first = args.first().copied();
    match node {
        SchemaNode::String(mut checks) => {
            apply_string_check(&mut checks, method, first);
            SchemaNode::String(checks)
        }
        SchemaNode::Number(mut checks) => {
            apply_number_check(&mut checks, method, first);
            SchemaNode::Number(checks)
        }
        // Wrappers pass refinements through to what they wrap
        SchemaNode::Optional { inner } => apply_check(*inner, method, args).optional(),
        SchemaNode::Nullable { inner } => apply_check(*inner, method, args).nullable(),
        other => {
            if !SHAPE_PRESERVING.contains(&method) && !is_known_check(method) {
                debug!("Ignoring unsupported zod modifier .{method}()");
            }
            other
        }
    }
}

fn is_known_check(method: &str) -> bool {
    matches!(
        method,
        "min" | "max" | "length" | "gt" | "gte" | "lt" | "lte" | "int" | "positive" | "negative"
            | "nonnegative" | "nonpositive" | "email" | "uuid" | "url" | "datetime"
    )
}

fn apply_string_check(checks: &mut StringChecks, method: &str, arg: Option<f64>) {
    let len = arg.filter(|n| *n >= 0.0).map(|n| n as usize);
    match method {
        "email" => checks.format = Some(StringFormat::Email),
        "uuid" | "guid" => checks.format = Some(StringFormat::Uuid),
        "url" => checks.format = Some(StringFormat::Url),
        "datetime" => checks.format = Some(StringFormat::Datetime),
        "min" => checks.min_length = len,
        "max" => checks.max_length = len,
        "length" => {
            checks.min_length = len;
            checks.max_length = len;
        }
        "nonempty" => checks.min_length = Some(checks.min_length.unwrap_or(0).max(1)),
        _ => {}
    }
}

fn apply_number_check(checks: &mut NumberChecks, method: &str, arg: Option<f64>) {
    let step = if checks.integer { 1.0 } else { 1e-6 };
    match method {
        "int" => checks.integer = true,
        "min" | "gte" => checks.min = arg,
        "max" | "lte" => checks.max = arg,
        "gt" => checks.min = arg.map(|n| n + step),
        "lt" => checks.max = arg.map(|n| n - step),
        "positive" => checks.min = Some(step),
        "nonnegative" => checks.min = Some(0.0),
        "negative" => checks.max = Some(-step),
        "nonpositive" => checks.max = Some(0.0),
        _ => {}
    }
}
