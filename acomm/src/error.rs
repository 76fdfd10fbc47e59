use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("not a valid x,y,depth position: '{0}'")]
    Position(String),
}

/// Numeric failure inside the loss computation.
///
/// Floats never trap, so these are detected from the intermediate
/// values: NaN is a domain error, a zero denominator is a division by
/// zero, and an infinite value is an overflow.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticFault {
    #[error("domain")]
    Domain,

    #[error("zero_division")]
    ZeroDivision,

    #[error("overflow")]
    Overflow,
}

impl ArithmeticFault {
    /// Classifies a value that should have been finite.
    pub(crate) fn check(val: f64) -> Result<f64, ArithmeticFault> {
        if val.is_nan() {
            Err(Self::Domain)
        } else if val.is_infinite() {
            Err(Self::Overflow)
        } else {
            Ok(val)
        }
    }

    /// Checks that `val` is finite and usable as a denominator.
    pub(crate) fn check_divisor(val: f64) -> Result<f64, ArithmeticFault> {
        match Self::check(val)? {
            v if v == 0.0 => Err(Self::ZeroDivision),
            v => Ok(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ArithmeticFault;

    #[test]
    fn test_check_classifies_values() {
        assert_eq!(ArithmeticFault::check(1.5), Ok(1.5));
        assert_eq!(ArithmeticFault::check(f64::NAN), Err(ArithmeticFault::Domain));
        assert_eq!(
            ArithmeticFault::check(f64::INFINITY),
            Err(ArithmeticFault::Overflow)
        );
        assert_eq!(
            ArithmeticFault::check_divisor(0.0),
            Err(ArithmeticFault::ZeroDivision)
        );
    }

    #[test]
    fn test_fault_tags() {
        assert_eq!(ArithmeticFault::Domain.to_string(), "domain");
        assert_eq!(ArithmeticFault::ZeroDivision.to_string(), "zero_division");
        assert_eq!(ArithmeticFault::Overflow.to_string(), "overflow");
    }
}
