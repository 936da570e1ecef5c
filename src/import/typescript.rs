//! TypeScript type definition importer
//!
//! Reads `type`, `interface` and `enum` declarations into a
//! [`SchemaDocument`]. Text that does not start with a declaration is treated
//! as the right-hand side of `type Random = ...`.

use super::lexer::{TokenKind, TokenStream};
use super::{ImportError, check_references};
use crate::models::{Declaration, Field, Literal, SchemaDocument, SchemaNode};
use std::collections::BTreeSet;
use tracing::debug;

/// Name given to the declaration wrapped around a bare type expression
pub const WRAPPED_DECLARATION: &str = "Random";

const DECLARATION_KEYWORDS: &[&str] = &["type", "interface", "enum", "export", "declare"];

/// Importer for TypeScript type definitions.
///
/// # Example
///
/// ```rust
/// use data_conversion_sdk::import::TypeScriptImporter;
///
/// let doc = TypeScriptImporter::new()
///     .parse("interface User { name: string; age?: number }")
///     .unwrap();
/// assert_eq!(doc.declarations[0].name, "User");
/// ```
#[derive(Debug, Default, Clone)]
pub struct TypeScriptImporter;

impl TypeScriptImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse TypeScript source into a schema document.
    pub fn parse(&self, source: &str) -> Result<SchemaDocument, ImportError> {
        let mut tokens = TokenStream::new(source)?;
        let mut parser = Parser {
            tokens: &mut tokens,
            type_params: BTreeSet::new(),
        };

        let doc = if parser.starts_with_declaration() {
            parser.parse_document()?
        } else {
            debug!("No declaration keyword found, wrapping input as `type {WRAPPED_DECLARATION}`");
            parser.parse_bare_type()?
        };

        if doc.is_empty() {
            return Err(ImportError::Empty("TypeScript"));
        }
        check_references(&doc)?;
        Ok(doc)
    }
}

struct Parser<'a> {
    tokens: &'a mut TokenStream,
    /// Generic parameters of the declaration being parsed
    type_params: BTreeSet<String>,
}

impl Parser<'_> {
    fn starts_with_declaration(&self) -> bool {
        let mut n = 0;
        while matches!(self.tokens.peek_nth(n), TokenKind::Doc(_)) {
            n += 1;
        }
        matches!(self.tokens.peek_nth(n), TokenKind::Ident(word) if DECLARATION_KEYWORDS.contains(&word.as_str()))
    }

    fn parse_bare_type(&mut self) -> Result<SchemaDocument, ImportError> {
        self.tokens.skip_docs();
        let node = self.parse_type()?;
        self.tokens.eat_symbol(";");
        if !self.tokens.at_eof() {
            return Err(self.tokens.unexpected("end of input"));
        }
        Ok(SchemaDocument::single(WRAPPED_DECLARATION, node))
    }

    fn parse_document(&mut self) -> Result<SchemaDocument, ImportError> {
        let mut doc = SchemaDocument::new();
        loop {
            let description = self.tokens.take_doc();
            if self.tokens.at_eof() {
                break;
            }
            if self.tokens.eat_symbol(";") {
                continue;
            }
            let mut declaration = self.parse_declaration()?;
            if declaration.description.is_none() {
                declaration.description = description;
            }
            doc.add(declaration);
        }
        Ok(doc)
    }

    fn parse_declaration(&mut self) -> Result<Declaration, ImportError> {
        if self.tokens.eat_ident("export") {
            self.tokens.eat_ident("default");
        }
        self.tokens.eat_ident("declare");
        self.tokens.eat_ident("const");

        self.type_params.clear();
        if self.tokens.eat_ident("type") {
            let name = self.tokens.expect_ident()?;
            self.parse_type_params()?;
            self.tokens.expect_symbol("=")?;
            let node = self.parse_type()?;
            self.tokens.eat_symbol(";");
            Ok(Declaration::new(name, node))
        } else if self.tokens.eat_ident("interface") {
            let name = self.tokens.expect_ident()?;
            self.parse_type_params()?;
            let mut parts = Vec::new();
            if self.tokens.eat_ident("extends") {
                loop {
                    parts.push(self.parse_postfix()?);
                    if !self.tokens.eat_symbol(",") {
                        break;
                    }
                }
            }
            let body = self.parse_object_type()?;
            let node = if parts.is_empty() {
                body
            } else {
                parts.push(body);
                SchemaNode::Intersection { parts }
            };
            Ok(Declaration::new(name, node))
        } else if self.tokens.eat_ident("enum") {
            let name = self.tokens.expect_ident()?;
            let node = self.parse_enum_body()?;
            Ok(Declaration::new(name, node))
        } else {
            Err(self.tokens.unexpected("`type`, `interface` or `enum`"))
        }
    }

    /// `<T, U extends X = Y>`; parameters resolve to `any`
    fn parse_type_params(&mut self) -> Result<(), ImportError> {
        if !self.tokens.eat_symbol("<") {
            return Ok(());
        }
        loop {
            let name = self.tokens.expect_ident()?;
            self.type_params.insert(name);
            if self.tokens.eat_ident("extends") {
                self.parse_type()?;
            }
            if self.tokens.eat_symbol("=") {
                self.parse_type()?;
            }
            if !self.tokens.eat_symbol(",") {
                break;
            }
        }
        self.tokens.expect_symbol(">")
    }

    fn parse_type(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.enter()?;
        let result = self.parse_union();
        self.tokens.leave();
        result
    }

    fn parse_union(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.eat_symbol("|");
        let mut options = vec![self.parse_intersection()?];
        while self.tokens.eat_symbol("|") {
            options.push(self.parse_intersection()?);
        }
        if options.len() == 1 {
            return Ok(options.remove(0));
        }
        Ok(SchemaNode::union(options))
    }

    fn parse_intersection(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.eat_symbol("&");
        let mut parts = vec![self.parse_postfix()?];
        while self.tokens.eat_symbol("&") {
            parts.push(self.parse_postfix()?);
        }
        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        Ok(SchemaNode::Intersection { parts })
    }

    /// Operand of a prefix operator (`keyof T`, `readonly T[]`)
    fn parse_operand(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.enter()?;
        let result = self.parse_postfix();
        self.tokens.leave();
        result
    }

    fn parse_postfix(&mut self) -> Result<SchemaNode, ImportError> {
        let mut node = self.parse_primary()?;
        while self.tokens.is_symbol("[") {
            if matches!(self.tokens.peek_nth(1), TokenKind::Symbol("]")) {
                self.tokens.next();
                self.tokens.next();
                node = SchemaNode::array(node);
            } else {
                // Indexed access (`T["key"]`) has no canonical counterpart
                self.tokens.next();
                self.parse_type()?;
                self.tokens.expect_symbol("]")?;
                node = SchemaNode::Any;
            }
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<SchemaNode, ImportError> {
        let token = self.tokens.peek().clone();
        match token.kind {
            TokenKind::Symbol("(") => {
                self.tokens.next();
                if self.looks_like_function_params() {
                    self.skip_function_type()?;
                    return Ok(SchemaNode::Any);
                }
                let node = self.parse_type()?;
                self.tokens.expect_symbol(")")?;
                Ok(node)
            }
            TokenKind::Symbol("{") => self.parse_object_type(),
            TokenKind::Symbol("[") => self.parse_tuple(),
            TokenKind::Symbol("-") => {
                self.tokens.next();
                match self.tokens.next().kind {
                    TokenKind::Num(n) => Ok(SchemaNode::Literal {
                        value: Literal::Number(-n),
                    }),
                    _ => Err(ImportError::syntax(
                        token.line,
                        token.column,
                        "expected a number after `-`",
                    )),
                }
            }
            TokenKind::Str(s) => {
                self.tokens.next();
                Ok(SchemaNode::Literal {
                    value: Literal::String(s),
                })
            }
            TokenKind::Num(n) => {
                self.tokens.next();
                Ok(SchemaNode::Literal {
                    value: Literal::Number(n),
                })
            }
            TokenKind::Ident(name) => {
                self.tokens.next();
                self.parse_named_type(name)
            }
            _ => Err(self.tokens.unexpected("a type")),
        }
    }

    fn parse_named_type(&mut self, name: String) -> Result<SchemaNode, ImportError> {
        let node = match name.as_str() {
            "string" => SchemaNode::string(),
            "number" => SchemaNode::number(),
            "bigint" => SchemaNode::BigInt,
            "boolean" => SchemaNode::Boolean,
            "true" => SchemaNode::Literal {
                value: Literal::Bool(true),
            },
            "false" => SchemaNode::Literal {
                value: Literal::Bool(false),
            },
            "null" => SchemaNode::Null,
            "undefined" | "void" => SchemaNode::Undefined,
            "any" | "symbol" => SchemaNode::Any,
            "unknown" => SchemaNode::Unknown,
            "never" => SchemaNode::Never,
            "object" => SchemaNode::Record {
                key: Box::new(SchemaNode::string()),
                value: Box::new(SchemaNode::Unknown),
            },
            "Date" => SchemaNode::Date,
            "keyof" => {
                self.parse_operand()?;
                SchemaNode::string()
            }
            "typeof" => {
                self.parse_qualified_rest(name)?;
                SchemaNode::Any
            }
            "readonly" => return self.parse_operand(),
            _ => {
                let name = self.parse_qualified_rest(name)?;
                let args = self.parse_type_args()?;
                return Ok(self.apply_generic(name, args));
            }
        };
        Ok(node)
    }

    /// Consume `.B.C` after `A`, returning the last segment
    fn parse_qualified_rest(&mut self, first: String) -> Result<String, ImportError> {
        let mut name = first;
        while self.tokens.eat_symbol(".") {
            name = self.tokens.expect_ident()?;
        }
        Ok(name)
    }

    fn parse_type_args(&mut self) -> Result<Vec<SchemaNode>, ImportError> {
        let mut args = Vec::new();
        if !self.tokens.eat_symbol("<") {
            return Ok(args);
        }
        loop {
            args.push(self.parse_type()?);
            if !self.tokens.eat_symbol(",") {
                break;
            }
        }
        self.tokens.expect_symbol(">")?;
        Ok(args)
    }

    fn apply_generic(&self, name: String, args: Vec<SchemaNode>) -> SchemaNode {
        let mut args = args.into_iter();
        match name.as_str() {
            "Array" | "ReadonlyArray" | "Set" | "ReadonlySet" => {
                SchemaNode::array(args.next().unwrap_or(SchemaNode::Any))
            }
            "Record" | "Map" | "ReadonlyMap" => SchemaNode::Record {
                key: Box::new(args.next().unwrap_or(SchemaNode::string())),
                value: Box::new(args.next().unwrap_or(SchemaNode::Any)),
            },
            "Partial" => match args.next().unwrap_or(SchemaNode::Any) {
                SchemaNode::Object { fields } => SchemaNode::object(
                    fields
                        .into_iter()
                        .map(|f| Field {
                            node: f.node.optional(),
                            ..f
                        })
                        .collect(),
                ),
                other => other,
            },
            "Required" | "Readonly" | "Promise" | "NonNullable" => {
                args.next().unwrap_or(SchemaNode::Any)
            }
            "Omit" | "Pick" | "Exclude" | "Extract" | "ReturnType" | "Parameters" => {
                SchemaNode::Any
            }
            _ if self.type_params.contains(&name) => SchemaNode::Any,
            _ => SchemaNode::reference(name),
        }
    }

    fn parse_object_type(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.expect_symbol("{")?;
        self.tokens.enter()?;
        let mut fields: Vec<Field> = Vec::new();
        let mut index_signature: Option<(SchemaNode, SchemaNode)> = None;

        loop {
            let description = self.tokens.take_doc();
            if self.tokens.eat_symbol("}") {
                break;
            }
            if self.tokens.is_ident("readonly")
                && !matches!(
                    self.tokens.peek_nth(1),
                    TokenKind::Symbol(":") | TokenKind::Symbol("?") | TokenKind::Symbol("(")
                )
            {
                self.tokens.next();
            }

            if self.tokens.is_symbol("[") {
                // Index signature `[key: string]: T`
                self.tokens.next();
                self.tokens.expect_ident()?;
                self.tokens.expect_symbol(":")?;
                let key = self.parse_type()?;
                self.tokens.expect_symbol("]")?;
                self.tokens.eat_symbol("?");
                self.tokens.expect_symbol(":")?;
                let value = self.parse_type()?;
                index_signature = Some((key, value));
            } else {
                let name = match self.tokens.next().kind {
                    TokenKind::Ident(name) | TokenKind::Str(name) => name,
                    TokenKind::Num(n) => n.to_string(),
                    _ => return Err(self.tokens.unexpected("a property name")),
                };
                let optional = self.tokens.eat_symbol("?");
                if self.tokens.is_symbol("(") || self.tokens.is_symbol("<") {
                    // Method signature: not data
                    self.skip_method_signature()?;
                } else {
                    self.tokens.expect_symbol(":")?;
                    let mut node = self.parse_type()?;
                    if optional {
                        node = node.optional();
                    }
                    let mut field = Field::new(name, node);
                    field.description = description;
                    fields.push(field);
                }
            }

            if !self.tokens.eat_symbol(";") && !self.tokens.eat_symbol(",") {
                self.tokens.skip_docs();
                if !self.tokens.is_symbol("}") {
                    return Err(self.tokens.unexpected("`;`, `,` or `}`"));
                }
            }
        }
        self.tokens.leave();

        match index_signature {
            Some((key, value)) if fields.is_empty() => Ok(SchemaNode::Record {
                key: Box::new(key),
                value: Box::new(value),
            }),
            _ => Ok(SchemaNode::object(fields)),
        }
    }

    fn parse_tuple(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.expect_symbol("[")?;
        let mut items = Vec::new();
        while !self.tokens.eat_symbol("]") {
            // Labelled element `name: T`
            if matches!(self.tokens.peek_kind(), TokenKind::Ident(_))
                && matches!(self.tokens.peek_nth(1), TokenKind::Symbol(":"))
            {
                self.tokens.next();
                self.tokens.next();
            }
            let mut item = self.parse_type()?;
            if self.tokens.eat_symbol("?") {
                item = item.optional();
            }
            items.push(item);
            if !self.tokens.eat_symbol(",") {
                self.tokens.expect_symbol("]")?;
                break;
            }
        }
        Ok(SchemaNode::Tuple { items })
    }

    fn parse_enum_body(&mut self) -> Result<SchemaNode, ImportError> {
        self.tokens.expect_symbol("{")?;
        let mut values: Vec<Literal> = Vec::new();
        let mut next_index = 0.0;
        loop {
            self.tokens.skip_docs();
            if self.tokens.eat_symbol("}") {
                break;
            }
            match self.tokens.next().kind {
                TokenKind::Ident(_) | TokenKind::Str(_) => {}
                _ => return Err(self.tokens.unexpected("an enum member")),
            }
            if self.tokens.eat_symbol("=") {
                let negative = self.tokens.eat_symbol("-");
                match self.tokens.next().kind {
                    TokenKind::Str(s) => values.push(Literal::String(s)),
                    TokenKind::Num(n) => {
                        let n = if negative { -n } else { n };
                        values.push(Literal::Number(n));
                        next_index = n + 1.0;
                    }
                    _ => return Err(self.tokens.unexpected("an enum initializer")),
                }
            } else {
                values.push(Literal::Number(next_index));
                next_index += 1.0;
            }
            if !self.tokens.eat_symbol(",") {
                self.tokens.expect_symbol("}")?;
                break;
            }
        }

        if values.iter().all(|v| matches!(v, Literal::String(_))) && !values.is_empty() {
            let values = values
                .into_iter()
                .filter_map(|v| match v {
                    Literal::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            return Ok(SchemaNode::Enum { values });
        }
        Ok(SchemaNode::union(
            values
                .into_iter()
                .map(|value| SchemaNode::Literal { value })
                .collect(),
        ))
    }

    /// After `(`: is this `() =>` or `(a: T, ...) =>`?
    fn looks_like_function_params(&self) -> bool {
        match (self.tokens.peek_kind(), self.tokens.peek_nth(1)) {
            (TokenKind::Symbol(")"), TokenKind::Symbol("=>")) => true,
            (TokenKind::Symbol("..."), _) => true,
            (TokenKind::Ident(_), TokenKind::Symbol(":"))
            | (TokenKind::Ident(_), TokenKind::Symbol(","))
            | (TokenKind::Ident(_), TokenKind::Symbol("?")) => true,
            _ => false,
        }
    }

    /// Skip the rest of `(params) => T` after the opening parenthesis
    fn skip_function_type(&mut self) -> Result<(), ImportError> {
        self.skip_balanced_from_inside(")")?;
        self.tokens.expect_symbol("=>")?;
        self.parse_type()?;
        Ok(())
    }

    fn skip_method_signature(&mut self) -> Result<(), ImportError> {
        if self.tokens.eat_symbol("<") {
            self.skip_balanced_from_inside(">")?;
        }
        self.tokens.expect_symbol("(")?;
        self.skip_balanced_from_inside(")")?;
        if self.tokens.eat_symbol(":") {
            self.parse_type()?;
        }
        Ok(())
    }

    /// Consume tokens until the bracket matching an already-consumed opener
    fn skip_balanced_from_inside(&mut self, close: &str) -> Result<(), ImportError> {
        let mut stack = vec![close.to_string()];
        while let Some(expected) = stack.last().cloned() {
            let token = self.tokens.next();
            match token.kind {
                TokenKind::Eof => return Err(self.tokens.unexpected(&format!("`{expected}`"))),
                TokenKind::Symbol(s) if s == expected => {
                    stack.pop();
                }
                TokenKind::Symbol("(") => stack.push(")".into()),
                TokenKind::Symbol("[") => stack.push("]".into()),
                TokenKind::Symbol("{") => stack.push("}".into()),
                TokenKind::Symbol("<") => stack.push(">".into()),
                _ => {}
            }
        }
        Ok(())
    }
}
