//! Tokenizer shared by the TypeScript and Zod importers.
//!
//! Both notations are JavaScript-flavoured, so one token set covers them:
//! identifiers, string and number literals, punctuation and JSDoc comments.
//! Plain comments are dropped.

use super::ImportError;

/// Nesting limit for the recursive-descent parsers
pub const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Num(f64),
    /// Punctuation, including the multi-character `=>` and `...`
    Symbol(&'static str),
    /// Body of a `/** ... */` comment with delimiters and leading `*` removed
    Doc(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

const SYMBOLS: &[&str] = &[
    "=>", "...", "{", "}", "(", ")", "[", "]", "<", ">", ":", ";", ",", "?", "|", "&", "=", ".",
    "-", "+", "!", "*", "/",
];

/// Split source text into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ImportError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut column = 1;

    macro_rules! advance {
        ($n:expr) => {
            for _ in 0..$n {
                if chars[i] == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
                i += 1;
            }
        };
    }

    while i < chars.len() {
        let c = chars[i];
        let (start_line, start_column) = (line, column);

        if c.is_whitespace() {
            advance!(1);
            continue;
        }

        // Comments
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                advance!(1);
            }
            continue;
        }
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let is_doc = chars.get(i + 2) == Some(&'*') && chars.get(i + 3) != Some(&'/');
            let body_start = i + 2;
            advance!(2);
            loop {
                if i + 1 >= chars.len() {
                    return Err(ImportError::syntax(
                        start_line,
                        start_column,
                        "unterminated block comment",
                    ));
                }
                if chars[i] == '*' && chars[i + 1] == '/' {
                    break;
                }
                advance!(1);
            }
            let body: String = chars[body_start..i].iter().collect();
            advance!(2);
            if is_doc {
                if let Some(doc) = clean_doc_comment(&body) {
                    tokens.push(Token {
                        kind: TokenKind::Doc(doc),
                        line: start_line,
                        column: start_column,
                    });
                }
            }
            continue;
        }

        // Strings
        if c == '"' || c == '\'' || c == '`' {
            let quote = c;
            advance!(1);
            let mut value = String::new();
            loop {
                let Some(&ch) = chars.get(i) else {
                    return Err(ImportError::syntax(
                        start_line,
                        start_column,
                        "unterminated string literal",
                    ));
                };
                if ch == quote {
                    advance!(1);
                    break;
                }
                if quote == '`' && ch == '$' && chars.get(i + 1) == Some(&'{') {
                    return Err(ImportError::syntax(
                        line,
                        column,
                        "template literal interpolation is not supported",
                    ));
                }
                if ch == '\\' {
                    let Some(&escaped) = chars.get(i + 1) else {
                        return Err(ImportError::syntax(line, column, "dangling escape"));
                    };
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                    advance!(2);
                    continue;
                }
                if ch == '\n' && quote != '`' {
                    return Err(ImportError::syntax(
                        start_line,
                        start_column,
                        "unterminated string literal",
                    ));
                }
                value.push(ch);
                advance!(1);
            }
            tokens.push(Token {
                kind: TokenKind::Str(value),
                line: start_line,
                column: start_column,
            });
            continue;
        }

        // Numbers
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_')
            {
                // Exponent sign
                if (chars[i] == 'e' || chars[i] == 'E')
                    && matches!(chars.get(i + 1), Some('+') | Some('-'))
                {
                    advance!(1);
                }
                advance!(1);
            }
            let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            let value = parse_number(&text).ok_or_else(|| {
                ImportError::syntax(start_line, start_column, format!("invalid number `{text}`"))
            })?;
            tokens.push(Token {
                kind: TokenKind::Num(value),
                line: start_line,
                column: start_column,
            });
            continue;
        }

        // Identifiers
        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                advance!(1);
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..i].iter().collect()),
                line: start_line,
                column: start_column,
            });
            continue;
        }

        let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
        let Some(symbol) = SYMBOLS.iter().find(|s| rest.starts_with(**s)) else {
            return Err(ImportError::syntax(
                start_line,
                start_column,
                format!("unexpected character `{c}`"),
            ));
        };
        advance!(symbol.chars().count());
        tokens.push(Token {
            kind: TokenKind::Symbol(symbol),
            line: start_line,
            column: start_column,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        column,
    });
    Ok(tokens)
}

fn parse_number(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return i64::from_str_radix(bin, 2).ok().map(|n| n as f64);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(|n| n as f64);
    }
    // BigInt literal suffix
    let lower = lower.strip_suffix('n').unwrap_or(&lower);
    lower.parse::<f64>().ok()
}

fn clean_doc_comment(body: &str) -> Option<String> {
    let body = body.strip_prefix('*').unwrap_or(body);
    let lines: Vec<&str> = body
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

/// Cursor over a token list with the helpers both parsers need.
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl TokenStream {
    pub fn new(source: &str) -> Result<Self, ImportError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    pub fn peek(&self) -> &Token {
        // tokenize always ends the list with Eof, and `next` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub fn peek_nth(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    pub fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Symbol(s) if *s == symbol)
    }

    pub fn is_ident(&self, ident: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(s) if s == ident)
    }

    /// Consume the symbol if it is next
    pub fn eat_symbol(&mut self, symbol: &str) -> bool {
        if self.is_symbol(symbol) {
            self.next();
            true
        } else {
            false
        }
    }

    pub fn eat_ident(&mut self, ident: &str) -> bool {
        if self.is_ident(ident) {
            self.next();
            true
        } else {
            false
        }
    }

    pub fn expect_symbol(&mut self, symbol: &str) -> Result<(), ImportError> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{symbol}`")))
        }
    }

    pub fn expect_ident(&mut self) -> Result<String, ImportError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.next();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Take every doc comment at the cursor, keeping the last one.
    pub fn take_doc(&mut self) -> Option<String> {
        let mut doc = None;
        while let TokenKind::Doc(text) = self.peek_kind() {
            doc = Some(text.clone());
            self.next();
        }
        doc
    }

    pub fn skip_docs(&mut self) {
        self.take_doc();
    }

    /// Track recursion; fails once nesting passes [`MAX_NESTING`].
    pub fn enter(&mut self) -> Result<(), ImportError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ImportError::MaxDepthExceeded {
                depth: self.depth,
                max: MAX_NESTING,
            });
        }
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Build an "expected X, found Y" error at the cursor
    pub fn unexpected(&self, expected: &str) -> ImportError {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::Str(s) => format!("string \"{s}\""),
            TokenKind::Num(n) => format!("number {n}"),
            TokenKind::Symbol(s) => format!("`{s}`"),
            TokenKind::Doc(_) => "doc comment".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        };
        ImportError::syntax(
            token.line,
            token.column,
            format!("expected {expected}, found {found}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("type A = { a?: string[] };"),
            vec![
                TokenKind::Ident("type".into()),
                TokenKind::Ident("A".into()),
                TokenKind::Symbol("="),
                TokenKind::Symbol("{"),
                TokenKind::Ident("a".into()),
                TokenKind::Symbol("?"),
                TokenKind::Symbol(":"),
                TokenKind::Ident("string".into()),
                TokenKind::Symbol("["),
                TokenKind::Symbol("]"),
                TokenKind::Symbol("}"),
                TokenKind::Symbol(";"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_numbers_and_arrows() {
        assert_eq!(
            kinds(r#"z.lazy(() => 'it\'s') 1_000 2.5e-3"#),
            vec![
                TokenKind::Ident("z".into()),
                TokenKind::Symbol("."),
                TokenKind::Ident("lazy".into()),
                TokenKind::Symbol("("),
                TokenKind::Symbol("("),
                TokenKind::Symbol(")"),
                TokenKind::Symbol("=>"),
                TokenKind::Str("it's".into()),
                TokenKind::Symbol(")"),
                TokenKind::Num(1000.0),
                TokenKind::Num(0.0025),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("// line\n/* block */\n/** Doc\n * text */ x");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Doc("Doc text".into()),
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        let err = tokenize("type A = \"open").unwrap_err();
        assert!(matches!(err, ImportError::Syntax { line: 1, column: 10, .. }));

        let err = tokenize("a\n  #").unwrap_err();
        assert!(matches!(err, ImportError::Syntax { line: 2, column: 3, .. }));
    }
}
