//! Literal prop values.
//!
//! Attribute expressions made only of literals (`{3}`, `{['a', 'b']}`,
//! `{{ fontSize: 12 }}`) are stored as plain values instead of expression
//! source. Objects with a `type` key stay expressions: the document format
//! reserves that key for nodes.

use indexmap::IndexMap;
use mdxir_lexer::{Lexer, Token, TokenKind};
use mdxir_types::{PropValue, SourceText};

/// The literal value of `source`, or `None` when it is anything else.
pub(crate) fn literal_prop(source: &str) -> Option<PropValue> {
    let lexed = Lexer::new(&SourceText::new(source)).lex();
    if lexed.errors.has_errors() {
        return None;
    }
    let mut reader = Reader {
        tokens: &lexed.tokens,
        pos: 0,
    };
    let value = reader.value()?;
    matches!(reader.peek(), TokenKind::Eof).then_some(value)
}

static EOF: TokenKind = TokenKind::Eof;

struct Reader<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Reader<'t> {
    fn peek(&self) -> &'t TokenKind {
        self.tokens.get(self.pos).map_or(&EOF, |t| &t.kind)
    }

    fn next(&mut self) -> &'t TokenKind {
        let kind = self.peek();
        self.pos += 1;
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let found = self.peek() == kind;
        if found {
            self.pos += 1;
        }
        found
    }

    fn value(&mut self) -> Option<PropValue> {
        let value = match self.next() {
            TokenKind::String(s) => PropValue::String(s.clone()),
            TokenKind::Number(n) => finite(*n)?,
            TokenKind::Minus => match self.next() {
                TokenKind::Number(n) => finite(-n)?,
                _ => return None,
            },
            TokenKind::True => PropValue::Bool(true),
            TokenKind::False => PropValue::Bool(false),
            TokenKind::Null => PropValue::Null,
            TokenKind::LBracket => self.array()?,
            TokenKind::LBrace => self.object()?,
            _ => return None,
        };
        Some(value)
    }

    fn array(&mut self) -> Option<PropValue> {
        let mut items = Vec::new();
        while !self.eat(&TokenKind::RBracket) {
            items.push(self.value()?);
            if !self.eat(&TokenKind::Comma) {
                self.eat(&TokenKind::RBracket).then_some(())?;
                break;
            }
        }
        Some(PropValue::Array(items))
    }

    fn object(&mut self) -> Option<PropValue> {
        let mut entries = IndexMap::new();
        while !self.eat(&TokenKind::RBrace) {
            let key = match self.next() {
                TokenKind::Identifier(name) | TokenKind::String(name) | TokenKind::Reserved(name) => {
                    name.clone()
                }
                TokenKind::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => (*n as i64).to_string(),
                TokenKind::True => "true".to_string(),
                TokenKind::False => "false".to_string(),
                TokenKind::Null => "null".to_string(),
                _ => return None,
            };
            if key == "type" || !self.eat(&TokenKind::Colon) {
                return None;
            }
            let value = self.value()?;
            entries.insert(key, value);
            if !self.eat(&TokenKind::Comma) {
                self.eat(&TokenKind::RBrace).then_some(())?;
                break;
            }
        }
        Some(PropValue::Object(entries))
    }
}

/// Documents only hold finite numbers; `1e400` stays an expression.
fn finite(n: f64) -> Option<PropValue> {
    n.is_finite().then_some(PropValue::Number(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(literal_prop("3"), Some(PropValue::Number(3.0)));
        assert_eq!(literal_prop("-1.5"), Some(PropValue::Number(-1.5)));
        assert_eq!(literal_prop("'hi'"), Some(PropValue::String("hi".into())));
        assert_eq!(literal_prop("false"), Some(PropValue::Bool(false)));
        assert_eq!(literal_prop("null"), Some(PropValue::Null));
    }

    #[test]
    fn nested_collections() {
        let value = literal_prop("{ fontSize: 12, 'font-weight': 'bold', tags: ['a', 'b',], }").unwrap();
        let PropValue::Object(entries) = value else {
            panic!("expected an object");
        };
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            ["fontSize", "font-weight", "tags"]
        );
        assert_eq!(
            entries["tags"],
            PropValue::Array(vec![PropValue::String("a".into()), PropValue::String("b".into())])
        );
    }

    #[test]
    fn non_literals_stay_expressions() {
        for source in [
            "user.name",
            "undefined",
            "1 + 2",
            "[1,,2]",
            "{ a }",
            "{ type: 'text', value: 'x' }",
            "{ ...rest }",
            "'unterminated",
            "1e400",
            "[-1e400]",
            "",
        ] {
            assert_eq!(literal_prop(source), None, "{source}");
        }
    }
}
