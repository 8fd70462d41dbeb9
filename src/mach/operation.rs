use super::Val;
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// The binary and unary operations of the expression language.
/// Integer/integer paths are checked and stay integer; mixing integer
/// and double promotes to double; strings only participate in `+`
/// (concatenation) and the relational operators.
pub struct Operation {}

impl Operation {
    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Runtime; "Overflow")),
            },
            Double(n) => Ok(Double(-n)),
            String(_) => Err(error!(Runtime; "Type mismatch")),
        }
    }

    pub fn not(val: Val) -> Result<Val> {
        Ok(Val::from_bool(!val.truthy()))
    }

    pub fn sum(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(l), r) => Ok(String(l + &r.to_string())),
            (l, String(r)) => Ok(String(l.to_string() + &r)),
            (Integer(l), Integer(r)) => match l.checked_add(r) {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Runtime; "Overflow")),
            },
            (l, r) => Ok(Double(l.as_number() + r.as_number())),
        }
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(_), _) | (_, String(_)) => Err(error!(Runtime; "Type mismatch")),
            (Integer(l), Integer(r)) => match l.checked_sub(r) {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Runtime; "Overflow")),
            },
            (l, r) => Ok(Double(l.as_number() - r.as_number())),
        }
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(_), _) | (_, String(_)) => Err(error!(Runtime; "Type mismatch")),
            (Integer(l), Integer(r)) => match l.checked_mul(r) {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Runtime; "Overflow")),
            },
            (l, r) => Ok(Double(l.as_number() * r.as_number())),
        }
    }

    /// `/` always produces a double, even between integers.
    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(_), _) | (_, String(_)) => Err(error!(Runtime; "Type mismatch")),
            (l, r) => {
                let divisor = r.as_number();
                if divisor == 0.0 {
                    return Err(error!(Runtime; "Division by zero"));
                }
                Ok(Double(l.as_number() / divisor))
            }
        }
    }

    /// `\` truncates toward zero. The one overflowing integer case is
    /// the minimum integer divided by minus one.
    pub fn divide_int(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(_), _) | (_, String(_)) => Err(error!(Runtime; "Type mismatch")),
            (Integer(l), Integer(r)) => {
                if r == 0 {
                    return Err(error!(Runtime; "Division by zero"));
                }
                match l.checked_div(r) {
                    Some(n) => Ok(Integer(n)),
                    None => Err(error!(Runtime; "Overflow")),
                }
            }
            (l, r) => {
                let divisor = r.as_number();
                if divisor == 0.0 {
                    return Err(error!(Runtime; "Division by zero"));
                }
                Ok(Double((l.as_number() / divisor).trunc()))
            }
        }
    }

    pub fn modulus(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(_), _) | (_, String(_)) => Err(error!(Runtime; "Type mismatch")),
            (Integer(l), Integer(r)) => {
                if r == 0 {
                    return Err(error!(Runtime; "Division by zero"));
                }
                // MIN MOD -1 is zero; checked_rem flags it as overflow.
                Ok(Integer(l.checked_rem(r).unwrap_or(0)))
            }
            (l, r) => {
                let divisor = r.as_number();
                if divisor == 0.0 {
                    return Err(error!(Runtime; "Division by zero"));
                }
                Ok(Double(l.as_number() % divisor))
            }
        }
    }

    pub fn power(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(_), _) | (_, String(_)) => Err(error!(Runtime; "Type mismatch")),
            (l, r) => Ok(Double(l.as_number().powf(r.as_number()))),
        }
    }

    pub fn and(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(lhs.truthy() && rhs.truthy()))
    }

    pub fn or(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(lhs.truthy() || rhs.truthy()))
    }

    pub fn equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(Self::compare(&lhs, &rhs) == std::cmp::Ordering::Equal))
    }

    pub fn not_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(Self::compare(&lhs, &rhs) != std::cmp::Ordering::Equal))
    }

    pub fn less(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(Self::compare(&lhs, &rhs) == std::cmp::Ordering::Less))
    }

    pub fn less_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(Self::compare(&lhs, &rhs) != std::cmp::Ordering::Greater))
    }

    pub fn greater(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(Self::compare(&lhs, &rhs) == std::cmp::Ordering::Greater))
    }

    pub fn greater_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from_bool(Self::compare(&lhs, &rhs) != std::cmp::Ordering::Less))
    }

    /// Strings compare lexicographically when both sides are strings;
    /// every other pairing compares numerically.
    fn compare(lhs: &Val, rhs: &Val) -> std::cmp::Ordering {
        use Val::*;
        match (lhs, rhs) {
            (String(l), String(r)) => l.cmp(r),
            (l, r) => l
                .as_number()
                .partial_cmp(&r.as_number())
                .unwrap_or(std::cmp::Ordering::Equal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_fast_path() {
        assert_eq!(
            Operation::sum(Val::Integer(2), Val::Integer(3)).unwrap(),
            Val::Integer(5)
        );
        assert!(Operation::sum(Val::Integer(32767), Val::Integer(1)).is_err());
        assert!(Operation::subtract(Val::Integer(-32768), Val::Integer(1)).is_err());
        assert!(Operation::multiply(Val::Integer(1000), Val::Integer(1000)).is_err());
    }

    #[test]
    fn test_promotion() {
        assert_eq!(
            Operation::sum(Val::Integer(1), Val::Double(0.5)).unwrap(),
            Val::Double(1.5)
        );
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            Operation::sum(Val::String("a".to_string()), Val::Integer(1)).unwrap(),
            Val::String("a1".to_string())
        );
        assert!(Operation::subtract(Val::String("a".to_string()), Val::Integer(1)).is_err());
    }

    #[test]
    fn test_divide_always_double() {
        assert_eq!(
            Operation::divide(Val::Integer(7), Val::Integer(2)).unwrap(),
            Val::Double(3.5)
        );
        assert!(Operation::divide(Val::Integer(1), Val::Integer(0)).is_err());
    }

    #[test]
    fn test_divide_int() {
        assert_eq!(
            Operation::divide_int(Val::Integer(7), Val::Integer(2)).unwrap(),
            Val::Integer(3)
        );
        assert_eq!(
            Operation::divide_int(Val::Integer(-7), Val::Integer(2)).unwrap(),
            Val::Integer(-3)
        );
        assert_eq!(
            Operation::divide_int(Val::Double(7.5), Val::Integer(2)).unwrap(),
            Val::Double(3.0)
        );
        assert!(Operation::divide_int(Val::Integer(-32768), Val::Integer(-1)).is_err());
    }

    #[test]
    fn test_modulus() {
        assert_eq!(
            Operation::modulus(Val::Integer(7), Val::Integer(4)).unwrap(),
            Val::Integer(3)
        );
        assert_eq!(
            Operation::modulus(Val::Integer(-32768), Val::Integer(-1)).unwrap(),
            Val::Integer(0)
        );
        assert!(Operation::modulus(Val::Integer(1), Val::Integer(0)).is_err());
    }

    #[test]
    fn test_negate_minimum_overflows() {
        assert!(Operation::negate(Val::Integer(-32768)).is_err());
        assert_eq!(Operation::negate(Val::Integer(5)).unwrap(), Val::Integer(-5));
    }

    #[test]
    fn test_relational() {
        assert_eq!(
            Operation::less(
                Val::String("APPLE".to_string()),
                Val::String("BANANA".to_string())
            )
            .unwrap(),
            Val::Integer(1)
        );
        assert_eq!(
            Operation::equal(Val::Integer(2), Val::Double(2.0)).unwrap(),
            Val::Integer(1)
        );
        assert_eq!(
            Operation::greater_equal(Val::Integer(2), Val::Integer(3)).unwrap(),
            Val::Integer(0)
        );
    }
}
