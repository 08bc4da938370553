use crate::BoxError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

/// A leaf field that can be parsed from form strings.
///
/// Implement [`parse`](FormValue::parse) for single values; repeated keys are handled by
/// [`from_values`](FormValue::from_values), which keeps the last non-empty value for scalars
/// and every value for `Vec<T>`.
///
/// ```
/// use micro_form::{BoxError, FormValue};
///
/// struct Percent(u8);
///
/// impl FormValue for Percent {
///     fn parse(value: &str) -> Result<Self, BoxError> {
///         let value = u8::parse(value.trim_end_matches('%'))?;
///         if value > 100 {
///             return Err("percent out of range".into());
///         }
///         Ok(Percent(value))
///     }
/// }
///
/// assert_eq!(Percent::parse("42%").unwrap().0, 42);
/// ```
pub trait FormValue: Sized {
    fn parse(value: &str) -> Result<Self, BoxError>;

    /// Picks a value out of the values submitted for one key.
    ///
    /// `Ok(None)` leaves the field untouched.
    fn from_values(values: &[String]) -> Result<Option<Self>, BoxError> {
        match values.last() {
            Some(value) if !value.is_empty() => Self::parse(value).map(Some),
            _ => Ok(None),
        }
    }
}

impl FormValue for String {
    fn parse(value: &str) -> Result<Self, BoxError> {
        Ok(value.to_owned())
    }
}

impl FormValue for bool {
    fn parse(value: &str) -> Result<Self, BoxError> {
        match value {
            "1" | "t" | "T" | "on" => Ok(true),
            "0" | "f" | "F" | "off" => Ok(false),
            _ if value.eq_ignore_ascii_case("true") => Ok(true),
            _ if value.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(format!("invalid boolean: {value}").into()),
        }
    }
}

macro_rules! from_str_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FormValue for $ty {
                #[inline]
                fn parse(value: &str) -> Result<Self, BoxError> {
                    value.trim().parse::<$ty>().map_err(BoxError::from)
                }
            }
        )+
    };
}

from_str_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
from_str_value!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

impl FormValue for char {
    fn parse(value: &str) -> Result<Self, BoxError> {
        value.parse::<char>().map_err(BoxError::from)
    }
}

impl FormValue for PathBuf {
    fn parse(value: &str) -> Result<Self, BoxError> {
        Ok(PathBuf::from(value))
    }
}

impl<T: FormValue> FormValue for Option<T> {
    fn parse(value: &str) -> Result<Self, BoxError> {
        T::parse(value).map(Some)
    }

    fn from_values(values: &[String]) -> Result<Option<Self>, BoxError> {
        T::from_values(values).map(|value| value.map(Some))
    }
}

impl<T: FormValue> FormValue for Vec<T> {
    fn parse(value: &str) -> Result<Self, BoxError> {
        T::parse(value).map(|value| vec![value])
    }

    fn from_values(values: &[String]) -> Result<Option<Self>, BoxError> {
        let parsed = values.iter().filter(|value| !value.is_empty()).map(|value| T::parse(value)).collect::<Result<Vec<_>, _>>()?;
        Ok(Some(parsed))
    }
}

impl<T: FormValue> FormValue for Box<T> {
    fn parse(value: &str) -> Result<Self, BoxError> {
        T::parse(value).map(Box::new)
    }

    fn from_values(values: &[String]) -> Result<Option<Self>, BoxError> {
        T::from_values(values).map(|value| value.map(Box::new))
    }
}

#[cfg(feature = "chrono")]
mod time {
    use super::FormValue;
    use crate::BoxError;
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    // `<input type="date">`, `<input type="time">` and `<input type="datetime-local">` formats
    const DATE: &str = "%Y-%m-%d";
    const TIMES: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
    const DATE_TIMES: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    impl FormValue for NaiveDate {
        fn parse(value: &str) -> Result<Self, BoxError> {
            NaiveDate::parse_from_str(value, DATE).map_err(BoxError::from)
        }
    }

    impl FormValue for NaiveTime {
        fn parse(value: &str) -> Result<Self, BoxError> {
            first_match(value, &TIMES, NaiveTime::parse_from_str)
        }
    }

    impl FormValue for NaiveDateTime {
        fn parse(value: &str) -> Result<Self, BoxError> {
            first_match(value, &DATE_TIMES, NaiveDateTime::parse_from_str)
        }
    }

    impl FormValue for DateTime<FixedOffset> {
        fn parse(value: &str) -> Result<Self, BoxError> {
            DateTime::parse_from_rfc3339(value).map_err(BoxError::from)
        }
    }

    impl FormValue for DateTime<Utc> {
        fn parse(value: &str) -> Result<Self, BoxError> {
            DateTime::parse_from_rfc3339(value).map(|time| time.with_timezone(&Utc)).map_err(BoxError::from)
        }
    }

    fn first_match<T>(
        value: &str,
        formats: &[&str],
        parse: fn(&str, &str) -> chrono::ParseResult<T>,
    ) -> Result<T, BoxError> {
        let mut last_error = None;
        for format in formats {
            match parse(value, format) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.map_or_else(|| BoxError::from("no format to parse with"), BoxError::from))
    }
}
