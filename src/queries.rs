//! The `queries` request parameter.

/// Number of rows a `/dbs` or `/updates` request works on, always in
/// `MIN..=MAX`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueryCount(usize);

impl QueryCount {
    pub const MIN: usize = 1;
    pub const MAX: usize = 500;

    /// Clamps a raw parameter value.
    ///
    /// Missing or unparsable input counts as 1; numbers outside the range are
    /// clamped into it, never rejected.
    pub fn from_param(raw: Option<&str>) -> Self {
        let n = raw
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(Self::MIN as i64);
        Self(n.clamp(Self::MIN as i64, Self::MAX as i64) as usize)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for QueryCount {
    fn default() -> Self { Self(Self::MIN) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(raw: Option<&str>) -> usize {
        QueryCount::from_param(raw).get()
    }

    #[test]
    fn in_range_values_pass_through() {
        assert_eq!(count(Some("1")), 1);
        assert_eq!(count(Some("20")), 20);
        assert_eq!(count(Some("500")), 500);
        assert_eq!(count(Some("+7")), 7);
    }

    #[test]
    fn missing_or_garbage_defaults_to_one() {
        assert_eq!(count(None), 1);
        assert_eq!(count(Some("")), 1);
        assert_eq!(count(Some("abc")), 1);
        assert_eq!(count(Some("2.5")), 1);
        assert_eq!(count(Some("99999999999999999999999")), 1);
        assert_eq!(count(Some(" 5")), 1);
        assert_eq!(count(Some("5 ")), 1);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(count(Some("0")), 1);
        assert_eq!(count(Some("-3")), 1);
        assert_eq!(count(Some("501")), 500);
        assert_eq!(count(Some("1000000")), 500);
    }
}
