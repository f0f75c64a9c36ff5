//! Condition text to [`Expr`].
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and (("||" | "or") and)*
//! and     := unary (("&&" | "and") unary)*
//! unary   := ("!" | "not") unary | compare
//! compare := primary (cmp-op primary)?
//! primary := number | string | "true" | "false" | "null" | path | "(" or ")"
//! cmp-op  := "==" | "!=" | "===" | "!==" | "<" | "<=" | ">" | ">="
//! ```
//!
//! Paths are identifiers joined by dots; a segment may be all digits to
//! index into a sequence. Strings take single or double quotes.

use serde_json::{Number, Value};

use crate::error::ConditionError;
use crate::expr::{CompareOp, Expr};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Path(String),
    Literal(Value),
    And,
    Or,
    Not,
    LParen,
    RParen,
    Op(CompareOp),
}

#[derive(Clone, Debug)]
struct Spanned {
    token: Token,
    position: usize,
}

fn error(position: usize, message: impl Into<String>) -> ConditionError {
    ConditionError::Parse {
        position,
        message: message.into(),
    }
}

/// Deepest expression tree a condition may produce. Every parenthesis,
/// every `!`, and every extra operand of an `&&`/`||` chain adds a level.
pub const MAX_DEPTH: usize = 256;

/// Parse a condition expression.
pub fn parse_condition(source: &str) -> Result<Expr, ConditionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(extra) => Err(error(extra.position, format!("unexpected {:?}", extra.token))),
    }
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, ConditionError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i];
        let rest = &source[i..];

        let token = if c.is_ascii_whitespace() {
            i += 1;
            continue;
        } else if c == b'(' {
            i += 1;
            Token::LParen
        } else if c == b')' {
            i += 1;
            Token::RParen
        } else if rest.starts_with("&&") {
            i += 2;
            Token::And
        } else if rest.starts_with("||") {
            i += 2;
            Token::Or
        } else if let Some((op, len)) = comparison(rest) {
            i += len;
            Token::Op(op)
        } else if c == b'!' {
            i += 1;
            Token::Not
        } else if c == b'"' || c == b'\'' {
            let (text, len) = string_literal(source, i)?;
            i += len;
            Token::Literal(Value::String(text))
        } else if c.is_ascii_digit() || (c == b'-' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let len = rest
                .char_indices()
                .skip(1)
                .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '.' || *ch == '_'))
                .map_or(rest.len(), |(idx, _)| idx);
            let number = number_literal(&rest[..len]).ok_or_else(|| error(start, format!("invalid number {:?}", &rest[..len])))?;
            i += len;
            Token::Literal(Value::Number(number))
        } else if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '.')))
                .map_or(rest.len(), |(idx, _)| idx);
            let word = &rest[..len];
            i += len;
            keyword(word).unwrap_or_else(|| Token::Path(word.to_string()))
        } else {
            let ch = rest.chars().next().unwrap_or('?');
            return Err(error(start, format!("unexpected character {ch:?}")));
        };

        if let Token::Path(path) = &token {
            if path.split('.').any(str::is_empty) {
                return Err(error(start, format!("malformed path {path:?}")));
            }
        }
        tokens.push(Spanned {
            token,
            position: start,
        });
    }
    Ok(tokens)
}

fn comparison(rest: &str) -> Option<(CompareOp, usize)> {
    // Longest match first.
    const OPS: [(&str, CompareOp); 8] = [
        ("===", CompareOp::StrictEq),
        ("!==", CompareOp::StrictNe),
        ("==", CompareOp::Eq),
        ("!=", CompareOp::Ne),
        ("<=", CompareOp::Le),
        (">=", CompareOp::Ge),
        ("<", CompareOp::Lt),
        (">", CompareOp::Gt),
    ];
    OPS.iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|(text, op)| (*op, text.len()))
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" => Token::Literal(Value::Bool(true)),
        "false" => Token::Literal(Value::Bool(false)),
        "null" => Token::Literal(Value::Null),
        _ => return None,
    })
}

fn number_literal(text: &str) -> Option<Number> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Returns the unescaped text and the byte length consumed, quotes included.
fn string_literal(source: &str, start: usize) -> Result<(String, usize), ConditionError> {
    let mut chars = source[start..].char_indices();
    let (_, quote) = chars.next().ok_or_else(|| error(start, "expected string"))?;
    let mut text = String::new();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((text, idx + c.len_utf8())),
            '\\' => {
                let (_, escaped) = chars.next().ok_or_else(|| error(start, "unterminated string"))?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            other => text.push(other),
        }
    }
    Err(error(start, "unterminated string"))
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn eat(&mut self, token: &Token) -> bool {
        self.eat_at(token).is_some()
    }

    /// Like [`Self::eat`], returning the consumed token's offset.
    fn eat_at(&mut self, token: &Token) -> Option<usize> {
        let position = self.peek().filter(|s| &s.token == token)?.position;
        self.cursor += 1;
        Some(position)
    }

    fn descend(&mut self, position: usize) -> Result<(), ConditionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(error(position, "expression nested too deeply"));
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Spanned, ConditionError> {
        let spanned = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| error(self.end, "unexpected end of expression"))?;
        self.cursor += 1;
        Ok(spanned)
    }

    fn or(&mut self) -> Result<Expr, ConditionError> {
        let mark = self.depth;
        let mut expr = self.and()?;
        while let Some(position) = self.eat_at(&Token::Or) {
            self.descend(position)?;
            expr = Expr::Or(Box::new(expr), Box::new(self.and()?));
        }
        self.depth = mark;
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, ConditionError> {
        let mark = self.depth;
        let mut expr = self.unary()?;
        while let Some(position) = self.eat_at(&Token::And) {
            self.descend(position)?;
            expr = Expr::And(Box::new(expr), Box::new(self.unary()?));
        }
        self.depth = mark;
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ConditionError> {
        if let Some(position) = self.eat_at(&Token::Not) {
            self.descend(position)?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.compare()
    }

    fn compare(&mut self) -> Result<Expr, ConditionError> {
        let left = self.primary()?;
        let Some(Spanned {
            token: Token::Op(op),
            ..
        }) = self.peek().cloned()
        else {
            return Ok(left);
        };
        self.cursor += 1;
        let right = self.primary()?;
        if let Some(Spanned {
            token: Token::Op(_),
            position,
        }) = self.peek()
        {
            return Err(error(*position, "comparisons cannot be chained"));
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn primary(&mut self) -> Result<Expr, ConditionError> {
        let Spanned { token, position } = self.next()?;
        match token {
            Token::Path(path) => Ok(Expr::Path(path)),
            Token::Literal(value) => Ok(Expr::Literal(value)),
            Token::LParen => {
                self.descend(position)?;
                let inner = self.or()?;
                if !self.eat(&Token::RParen) {
                    let at = self.peek().map_or(self.end, |s| s.position);
                    return Err(error(at, "expected ')'"));
                }
                self.depth -= 1;
                Ok(inner)
            }
            other => Err(error(position, format!("unexpected {other:?}"))),
        }
    }
}
