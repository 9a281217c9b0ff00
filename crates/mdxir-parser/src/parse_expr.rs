//! Expression parsing with operator precedence.
//!
//! Precedence (lowest → highest):
//! 10. `? :` (conditional, right-associative)
//! 9. `??`
//! 8. `||`
//! 7. `&&`
//! 6. `===`, `!==`, `==`, `!=`
//! 5. `<`, `<=`, `>`, `>=`
//! 4. `+`, `-`
//! 3. `*`, `/`, `%`
//! 2. unary `!`, `+`, `-`
//! 1. `.`, `?.`, `[]`, `?.[]`, `()` (member access / call)

use mdxir_lexer::token::TokenKind;
use mdxir_types::ast::*;
use mdxir_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// `Expression = Conditional`
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        if !self.enter() {
            return None;
        }
        let result = self.parse_conditional();
        self.leave();
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Conditional = Nullish [ "?" Expression ":" Expression ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let test = self.parse_nullish()?;
        if !self.eat(&TokenKind::Question) {
            return Some(test);
        }
        let consequent = self.parse_expression()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_expression()?;
        let span = test.span.merge(alternate.span);
        Some(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// `Nullish = Or { "??" Or }`
    fn parse_nullish(&mut self) -> Option<Expr> {
        let mut left = self.parse_or()?;
        let mut levels = 0;
        while self.eat(&TokenKind::QuestionQuestion) {
            self.nest(&mut levels)?;
            let right = self.parse_or()?;
            left = logical(left, LogicalOp::Nullish, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `Or = And { "||" And }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        let mut levels = 0;
        while self.eat(&TokenKind::PipePipe) {
            self.nest(&mut levels)?;
            let right = self.parse_and()?;
            left = logical(left, LogicalOp::Or, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `And = Equality { "&&" Equality }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        let mut levels = 0;
        while self.eat(&TokenKind::AmpAmp) {
            self.nest(&mut levels)?;
            let right = self.parse_equality()?;
            left = logical(left, LogicalOp::And, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `Equality = Relational { EqOp Relational }`
    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_relational()?;
        let mut levels = 0;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::BangEqEq => BinaryOp::StrictNe,
                TokenKind::EqEq => BinaryOp::LooseEq,
                TokenKind::BangEq => BinaryOp::LooseNe,
                _ => break,
            };
            self.advance();
            self.nest(&mut levels)?;
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `Relational = Additive { RelOp Additive }`
    fn parse_relational(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive()?;
        let mut levels = 0;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEq => BinaryOp::Le,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            self.nest(&mut levels)?;
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `Additive = Multiplicative { ("+" | "-") Multiplicative }`
    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        let mut levels = 0;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.nest(&mut levels)?;
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `Multiplicative = Unary { ("*" | "/" | "%") Unary }`
    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        let mut levels = 0;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            self.nest(&mut levels)?;
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        self.unnest(levels);
        Some(left)
    }

    /// `Unary = ( "!" | "+" | "-" ) Unary | Postfix`
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        let start = self.advance();
        if !self.enter() {
            return None;
        }
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `Postfix = Primary { "." Name | "?." Name | "?." "[" Expression "]"
    ///            | "[" Expression "]" | "(" Arguments ")" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        let mut levels = 0;
        loop {
            if matches!(
                self.peek_kind(),
                TokenKind::Dot | TokenKind::QuestionDot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.nest(&mut levels)?;
            }
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = member(expr, MemberProperty::Static(name), false, self.previous_span());
                }
                TokenKind::QuestionDot => {
                    let question = self.advance();
                    match self.peek_kind() {
                        TokenKind::LBracket => {
                            self.advance();
                            let key = self.parse_expression()?;
                            self.expect(&TokenKind::RBracket)?;
                            expr = member(
                                expr,
                                MemberProperty::Computed(Box::new(key)),
                                true,
                                self.previous_span(),
                            );
                        }
                        TokenKind::LParen => {
                            self.error_at(
                                ErrorCode::UNSUPPORTED_SYNTAX,
                                "optional calls (`?.()`) are not supported",
                                question,
                            );
                            return None;
                        }
                        _ => {
                            let name = self.expect_property_name()?;
                            expr = member(
                                expr,
                                MemberProperty::Static(name),
                                true,
                                self.previous_span(),
                            );
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = member(
                        expr,
                        MemberProperty::Computed(Box::new(key)),
                        false,
                        self.previous_span(),
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        self.unnest(levels);
        Some(expr)
    }

    /// `Arguments = [ Expression { "," Expression } [ "," ] ]`, after `(`.
    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::Number(n) => {
                self.advance();
                Some(Expr::new(ExprKind::Number(n), start))
            }
            TokenKind::String(s) => {
                self.advance();
                Some(Expr::new(ExprKind::String(s), start))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::Bool(true), start))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::Bool(false), start))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::new(ExprKind::Null, start))
            }

            // ── Names ───────────────────────────────────────────────────
            TokenKind::Identifier(name) => {
                if matches!(self.look_ahead(1), TokenKind::Arrow) {
                    self.report_arrow(start);
                    return None;
                }
                self.advance();
                Some(Expr::new(ExprKind::Identifier(name), start))
            }

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                if self.is_arrow_parameter_list() {
                    self.report_arrow(start);
                    return None;
                }
                self.advance();
                let inner = self.parse_expression()?;
                let end = self.expect(&TokenKind::RParen)?;
                // parentheses widen the span but leave no node behind
                Some(Expr::new(inner.kind, start.merge(end)))
            }

            TokenKind::LBracket => self.parse_array_literal(),

            // ── Refused ─────────────────────────────────────────────────
            TokenKind::Reserved(word) if word == "function" => {
                self.error_at(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "function expressions are not supported",
                    start,
                );
                None
            }
            TokenKind::Reserved(word) if word == "new" => {
                self.error_at(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "object construction with `new` is not supported",
                    start,
                );
                None
            }

            _ => {
                if !self.report_refused_syntax() {
                    let message = if self.at_end() {
                        "unexpected end of expression".to_string()
                    } else {
                        format!("expected an expression, got {}", self.peek_kind())
                    };
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                }
                None
            }
        }
    }

    /// `Array = "[" [ Element { "," Element } ] "]"` where an element may be
    /// omitted to leave a hole.
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.advance(); // eat `[`
        let mut items = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBracket => break,
                TokenKind::Comma => {
                    self.advance();
                    items.push(None);
                }
                _ => {
                    items.push(Some(self.parse_expression()?));
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        let end = self.expect(&TokenKind::RBracket)?;
        Some(Expr::new(ExprKind::Array(items), start.merge(end)))
    }

    // ── Arrow Detection ───────────────────────────────────────────────────────

    /// At `(`: does a matching `)` followed by `=>` come next?
    fn is_arrow_parameter_list(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            match self.look_ahead(n) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(self.look_ahead(n + 1), TokenKind::Arrow);
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            n += 1;
        }
    }

    fn report_arrow(&mut self, span: Span) {
        self.error_with_suggestion(
            ErrorCode::UNSUPPORTED_SYNTAX,
            "arrow functions are not supported in expressions",
            span,
            "render props must be written as a direct child: {(value) => <Component />}",
        );
    }
}

// ── Node Builders ─────────────────────────────────────────────────────────────

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn member(object: Expr, property: MemberProperty, optional: bool, end: Span) -> Expr {
    let span = object.span.merge(end);
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property,
            optional,
        },
        span,
    )
}
