//! Expression evaluator.
//!
//! Walks a parsed [`Expr`] against a [`Scope`]. There is no way to reach
//! host state beyond the scope bindings and the functions registered in
//! [`AllowCalls`]: member reads only see plain data, and the prototype-chain
//! names are refused whether they are written statically or computed.

use crate::env::{AllowCalls, Scope};
use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use mdxir_types::ast::*;
use std::cmp::Ordering;

/// Property names no expression may read.
pub const BLOCKED_PROPERTIES: &[&str] = &["__proto__", "prototype", "constructor"];

/// Evaluate `expr` in `scope`, calling only functions in `allow_calls`.
pub fn evaluate(expr: &Expr, scope: &Scope, allow_calls: &AllowCalls) -> EvalResult<Value> {
    Evaluator::new(scope, allow_calls).eval_expr(expr)
}

/// The core evaluator: walks AST nodes and produces Values.
pub struct Evaluator<'a> {
    scope: &'a Scope,
    allow_calls: &'a AllowCalls,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a Scope, allow_calls: &'a AllowCalls) -> Self {
        Self { scope, allow_calls }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    pub fn eval_expr(&self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),

            ExprKind::Array(items) => self.eval_array(items),
            ExprKind::Identifier(name) => Ok(self.eval_identifier(name)),

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test)?.is_truthy() {
                    self.eval_expr(consequent)
                } else {
                    self.eval_expr(alternate)
                }
            }

            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                })
            }

            ExprKind::Binary { left, op, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                Ok(eval_binary(&l, *op, &r))
            }

            ExprKind::Logical { left, op, right } => self.eval_logical(left, *op, right),

            ExprKind::Member {
                object, property, ..
            } => self.eval_member(object, property),

            ExprKind::Call { callee, args } => self.eval_call(callee, args),
        }
    }

    fn eval_array(&self, items: &[Option<Expr>]) -> EvalResult<Value> {
        let values = items
            .iter()
            .map(|item| match item {
                Some(expr) => self.eval_expr(expr),
                None => Ok(Value::Null),
            })
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Value::Array(values))
    }

    /// Unbound names evaluate to `undefined`; `undefined` itself is just an
    /// unbound name unless the scope defines it.
    fn eval_identifier(&self, name: &str) -> Value {
        self.scope.get(name).cloned().unwrap_or(Value::Undefined)
    }

    /// `&&`, `||` and `??` only evaluate the right side when needed.
    fn eval_logical(&self, left: &Expr, op: LogicalOp, right: &Expr) -> EvalResult<Value> {
        let l = self.eval_expr(left)?;
        let short_circuit = match op {
            LogicalOp::And => !l.is_truthy(),
            LogicalOp::Or => l.is_truthy(),
            LogicalOp::Nullish => !l.is_nullish(),
        };
        if short_circuit {
            Ok(l)
        } else {
            self.eval_expr(right)
        }
    }

    // ── Member access ─────────────────────────────────────────────────────

    /// Evaluate the object, resolve the key, check it, then read.
    ///
    /// Reads on `null` or `undefined` produce `undefined` rather than an
    /// error, so `?.` and `.` behave the same.
    fn eval_member(&self, object: &Expr, property: &MemberProperty) -> EvalResult<Value> {
        let base = self.eval_expr(object)?;
        let key = match property {
            MemberProperty::Static(ident) => ident.name.clone(),
            MemberProperty::Computed(expr) => match self.eval_expr(expr)? {
                Value::String(s) => s,
                Value::Number(n) => Value::Number(n).to_js_string(),
                other => return Err(EvalError::InvalidPropertyKey(other.type_name())),
            },
        };
        if BLOCKED_PROPERTIES.contains(&key.as_str()) {
            return Err(EvalError::BlockedProperty(key));
        }
        Ok(read_property(&base, &key))
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn eval_call(&self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        let ExprKind::Identifier(name) = &callee.kind else {
            return Err(EvalError::Unsupported(
                "calling anything other than a named function".into(),
            ));
        };
        let function = self
            .allow_calls
            .get(name)
            .ok_or_else(|| EvalError::CallNotAllowed(name.clone()))?;
        let args = args
            .iter()
            .map(|arg| self.eval_expr(arg))
            .collect::<EvalResult<Vec<_>>>()?;
        function(&args).map_err(|message| EvalError::CallFailed {
            name: name.clone(),
            message,
        })
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════

fn eval_binary(l: &Value, op: BinaryOp, r: &Value) -> Value {
    match op {
        BinaryOp::Add => l.add(r),
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        // f64 `%` is the same truncated remainder JavaScript uses
        BinaryOp::Mod => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::StrictEq => Value::Bool(l.strict_equals(r)),
        BinaryOp::StrictNe => Value::Bool(!l.strict_equals(r)),
        BinaryOp::LooseEq => Value::Bool(l.loose_equals(r)),
        BinaryOp::LooseNe => Value::Bool(!l.loose_equals(r)),
        BinaryOp::Lt => Value::Bool(l.compare(r) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(l.compare(r), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gt => Value::Bool(l.compare(r) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            l.compare(r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

/// Read `key` from `base`. Only own data is visible: object entries, array
/// elements and `length`, string characters and `length`.
fn read_property(base: &Value, key: &str) -> Value {
    match base {
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) => {
            if key == "length" {
                return Value::Number(items.len() as f64);
            }
            array_index(key)
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or(Value::Undefined)
        }
        Value::String(s) => {
            if key == "length" {
                return Value::Number(s.encode_utf16().count() as f64);
            }
            array_index(key)
                .and_then(|i| s.encode_utf16().nth(i))
                .map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
                .unwrap_or(Value::Undefined)
        }
        _ => Value::Undefined,
    }
}

/// A canonical array index: digits only, no leading zeros.
fn array_index(key: &str) -> Option<usize> {
    let canonical = key == "0" || (!key.starts_with('0') && key.bytes().all(|b| b.is_ascii_digit()));
    if canonical && !key.is_empty() {
        key.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_indices_only() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index(""), None);
    }

    #[test]
    fn string_reads_use_utf16_units() {
        let s = Value::from("a😀");
        assert_eq!(read_property(&s, "length"), Value::Number(3.0));
        assert_eq!(read_property(&s, "0"), Value::from("a"));
        assert_eq!(read_property(&s, "9"), Value::Undefined);
    }
}
