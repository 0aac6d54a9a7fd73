use std::fmt;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use super::error::RuntimeError;

/// A runtime value: arbitrary-precision integer or decimal, string, or the
/// absent value a user-defined call produces. Booleans deliberately have no
/// representation here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(BigInt),
    Decimal(BigDecimal),
    Str(String),
    Empty,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Decimal(_) => "REAL",
            Value::Str(_) => "STRING",
            Value::Empty => "null",
        }
    }

    /// Addition, or concatenation when a string is involved. A string
    /// operand absorbs any non-empty operand by converting it to text; the
    /// empty value does not participate at all.
    pub fn add(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => Ok(Value::Integer(left + right)),
            (Value::Decimal(left), Value::Decimal(right)) => Ok(Value::Decimal(left + right)),
            (Value::Integer(left), Value::Decimal(right)) => {
                Ok(Value::Decimal(BigDecimal::from(left.clone()) + right))
            }
            (Value::Decimal(left), Value::Integer(right)) => {
                Ok(Value::Decimal(left + BigDecimal::from(right.clone())))
            }
            (Value::Str(left), Value::Str(right)) => Ok(Value::Str(format!("{left}{right}"))),
            (Value::Str(left), Value::Integer(_) | Value::Decimal(_)) => {
                Ok(Value::Str(format!("{left}{other}")))
            }
            (Value::Integer(_) | Value::Decimal(_), Value::Str(right)) => {
                Ok(Value::Str(format!("{self}{right}")))
            }
            _ => Err(self.unsupported("+", other)),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => Ok(Value::Integer(left - right)),
            (Value::Decimal(left), Value::Decimal(right)) => Ok(Value::Decimal(left - right)),
            (Value::Integer(left), Value::Decimal(right)) => {
                Ok(Value::Decimal(BigDecimal::from(left.clone()) - right))
            }
            (Value::Decimal(left), Value::Integer(right)) => {
                Ok(Value::Decimal(left - BigDecimal::from(right.clone())))
            }
            _ => Err(self.unsupported("-", other)),
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => Ok(Value::Integer(left * right)),
            (Value::Decimal(left), Value::Decimal(right)) => Ok(Value::Decimal(left * right)),
            (Value::Integer(left), Value::Decimal(right)) => {
                Ok(Value::Decimal(BigDecimal::from(left.clone()) * right))
            }
            (Value::Decimal(left), Value::Integer(right)) => {
                Ok(Value::Decimal(left * BigDecimal::from(right.clone())))
            }
            _ => Err(self.unsupported("*", other)),
        }
    }

    /// Division under either spelling. An integer pair stays integer and
    /// truncates toward zero; once a decimal is involved the result is
    /// decimal, rounded half-up to the left operand's scale.
    pub fn div(&self, other: &Value, op: &'static str) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => {
                if right.is_zero() {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Integer(left / right))
            }
            (Value::Decimal(left), Value::Decimal(right)) => Self::div_decimal(left, right),
            (Value::Integer(left), Value::Decimal(right)) => {
                Self::div_decimal(&BigDecimal::from(left.clone()), right)
            }
            (Value::Decimal(left), Value::Integer(right)) => {
                Self::div_decimal(left, &BigDecimal::from(right.clone()))
            }
            _ => Err(self.unsupported(op, other)),
        }
    }

    fn div_decimal(left: &BigDecimal, right: &BigDecimal) -> Result<Value, RuntimeError> {
        if right.is_zero() {
            return Err(RuntimeError::DivisionByZero);
        }
        let scale = left.fractional_digit_count().max(0);
        Ok(Value::Decimal(
            (left / right).with_scale_round(scale, RoundingMode::HalfUp),
        ))
    }

    /// Unary `+` is absolute value, not identity.
    pub fn abs(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Integer(value) => Ok(Value::Integer(value.abs())),
            Value::Decimal(value) => Ok(Value::Decimal(value.abs())),
            _ => Err(RuntimeError::UnsupportedUnary {
                op: "+",
                operand: self.type_name(),
            }),
        }
    }

    pub fn negate(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Integer(value) => Ok(Value::Integer(-value)),
            Value::Decimal(value) => Ok(Value::Decimal(-value)),
            _ => Err(RuntimeError::UnsupportedUnary {
                op: "-",
                operand: self.type_name(),
            }),
        }
    }

    fn unsupported(&self, op: &'static str, other: &Value) -> RuntimeError {
        RuntimeError::UnsupportedOperands {
            op,
            left: self.type_name(),
            right: other.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::Str(value) => write!(f, "{value}"),
            Value::Empty => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;

    use super::{RuntimeError, Value};

    fn int(value: i64) -> Value {
        Value::Integer(BigInt::from(value))
    }

    fn dec(text: &str) -> Value {
        Value::Decimal(BigDecimal::from_str(text).expect("bad decimal literal"))
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(int(2).add(&int(3)), Ok(int(5)));
        assert_eq!(int(2).sub(&int(3)), Ok(int(-1)));
        assert_eq!(int(4).mul(&int(6)), Ok(int(24)));
        assert_eq!(int(7).div(&int(2), "DIV"), Ok(int(3)));
        assert_eq!(int(-7).div(&int(2), "DIV"), Ok(int(-3)));
    }

    #[test]
    fn mixed_operands_promote_to_decimal() {
        assert_eq!(int(1).add(&dec("2.5")), Ok(dec("3.5")));
        assert_eq!(dec("2.5").mul(&int(2)), Ok(dec("5.0")));
        assert_eq!(dec("1.5").sub(&int(1)), Ok(dec("0.5")));
    }

    #[test]
    fn decimal_division_rounds_half_up_to_left_scale() {
        let quotient = dec("1.0").div(&dec("3"), "/").expect("division failed");
        assert_eq!(quotient.to_string(), "0.3");

        let rounded = dec("1.00").div(&dec("3"), "/").expect("division failed");
        assert_eq!(rounded.to_string(), "0.33");

        let up = dec("5.0").div(&dec("3"), "/").expect("division failed");
        assert_eq!(up.to_string(), "1.7");
    }

    #[test]
    fn integer_dividend_rounds_at_scale_zero() {
        // A promoted integer has scale 0, so the quotient rounds to a whole
        // number.
        let quotient = int(5).div(&dec("2.0"), "/").expect("division failed");
        assert_eq!(quotient.to_string(), "3");
    }

    #[test]
    fn division_by_zero_is_a_typed_error() {
        assert_eq!(int(1).div(&int(0), "DIV"), Err(RuntimeError::DivisionByZero));
        assert_eq!(
            dec("1.0").div(&dec("0.0"), "/"),
            Err(RuntimeError::DivisionByZero)
        );
    }

    #[test]
    fn string_concatenation_absorbs_numbers() {
        let hello = Value::Str("x".to_string());
        assert_eq!(hello.add(&int(1)), Ok(Value::Str("x1".to_string())));
        assert_eq!(
            int(1).add(&Value::Str("x".to_string())),
            Ok(Value::Str("1x".to_string()))
        );
        assert_eq!(
            Value::Str("a".to_string()).add(&dec("2.5")),
            Ok(Value::Str("a2.5".to_string()))
        );
    }

    #[test]
    fn empty_never_participates_in_addition() {
        let err = Value::Str("a".to_string()).add(&Value::Empty).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UnsupportedOperands {
                op: "+",
                left: "STRING",
                right: "null",
            }
        );
        assert!(Value::Empty.add(&int(1)).is_err());
    }

    #[test]
    fn type_errors_name_both_operand_kinds() {
        let err = Value::Str("a".to_string()).sub(&int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot apply '-' to STRING and INTEGER"
        );
    }

    #[test]
    fn unary_plus_is_absolute_value() {
        assert_eq!(int(-4).abs(), Ok(int(4)));
        assert_eq!(dec("-2.5").abs(), Ok(dec("2.5")));
        assert_eq!(int(4).negate(), Ok(int(-4)));
        assert!(Value::Str("a".to_string()).abs().is_err());
        assert!(Value::Empty.negate().is_err());
    }

    #[test]
    fn values_render_their_textual_form() {
        assert_eq!(int(42).to_string(), "42");
        assert_eq!(dec("2.50").to_string(), "2.50");
        assert_eq!(Value::Str("hi".to_string()).to_string(), "hi");
        assert_eq!(Value::Empty.to_string(), "null");
    }
}
