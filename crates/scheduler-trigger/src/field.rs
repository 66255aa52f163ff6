// Parsing and matching of a single cron field expression.
//
// Grammar: `*` | `N` | `N-M` | `*/S` | a comma-separated list of the above.
// Each field has its own numeric domain (e.g. hour is 0-23); the parser
// rejects values outside that domain.

use scheduler_core::SchedulerError;

#[derive(Debug, Clone, Copy)]
enum Token {
    Any,
    Single(i64),
    Range(i64, i64),
    Step(i64, i64, i64),
}

impl Token {
    fn first_in_range(&self, low: i64, high: i64) -> Option<i64> {
        if low > high {
            return None;
        }
        match *self {
            Token::Any => Some(low),
            Token::Single(v) => (v >= low && v <= high).then_some(v),
            Token::Range(a, b) => {
                let start = a.max(low);
                let end = b.min(high);
                (start <= end).then_some(start)
            }
            Token::Step(a, b, step) => {
                let end = b.min(high);
                if a > end || step <= 0 {
                    return None;
                }
                let floor = a.max(low);
                let offset = (floor - a).rem_euclid(step);
                let candidate = if offset == 0 { floor } else { floor + (step - offset) };
                (candidate <= end).then_some(candidate)
            }
        }
    }

    fn matches(&self, value: i64) -> bool {
        match *self {
            Token::Any => true,
            Token::Single(v) => v == value,
            Token::Range(a, b) => value >= a && value <= b,
            Token::Step(a, b, step) => value >= a && value <= b && (value - a) % step == 0,
        }
    }
}

/// A parsed cron field: any number of tokens, unioned together.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    tokens: Vec<Token>,
    min: i64,
    max: i64,
}

impl FieldMatcher {
    pub fn parse(expr: &str, min: i64, max: i64) -> Result<Self, SchedulerError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(SchedulerError::validation("cron field must not be empty"));
        }
        let mut tokens = Vec::new();
        for part in expr.split(',') {
            tokens.push(parse_part(part, min, max)?);
        }
        Ok(FieldMatcher { tokens, min, max })
    }

    pub fn matches(&self, value: i64) -> bool {
        self.tokens.iter().any(|t| t.matches(value))
    }

    /// Smallest value in `[low, high]` (clamped to this field's own domain)
    /// that satisfies at least one token, or `None` if there is no match.
    pub fn first_in_range(&self, low: i64, high: i64) -> Option<i64> {
        let low = low.max(self.min);
        let high = high.min(self.max);
        self.tokens
            .iter()
            .filter_map(|t| t.first_in_range(low, high))
            .min()
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }
}

fn parse_part(part: &str, min: i64, max: i64) -> Result<Token, SchedulerError> {
    let part = part.trim();
    if part == "*" {
        return Ok(Token::Any);
    }
    if let Some(rest) = part.strip_prefix("*/") {
        let step = parse_int(rest)?;
        return Ok(Token::Step(min, max, step));
    }
    if let Some((lo, hi)) = part.split_once('-') {
        let a = parse_int(lo)?;
        let b = parse_int(hi)?;
        if a > b {
            return Err(SchedulerError::validation(format!(
                "cron range '{part}' has start greater than end"
            )));
        }
        return Ok(Token::Range(a, b));
    }
    let value = parse_int(part)?;
    if value < min || value > max {
        return Err(SchedulerError::validation(format!(
            "cron value {value} out of range [{min}, {max}]"
        )));
    }
    Ok(Token::Single(value))
}

fn parse_int(s: &str) -> Result<i64, SchedulerError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| SchedulerError::validation(format!("invalid cron field token '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_everything_in_domain() {
        let field = FieldMatcher::parse("*", 0, 59).unwrap();
        assert!(field.matches(0));
        assert!(field.matches(59));
        assert_eq!(field.first_in_range(5, 59), Some(5));
    }

    #[test]
    fn single_value() {
        let field = FieldMatcher::parse("7", 0, 23).unwrap();
        assert!(field.matches(7));
        assert!(!field.matches(8));
        assert_eq!(field.first_in_range(0, 23), Some(7));
    }

    #[test]
    fn range_value() {
        let field = FieldMatcher::parse("9-17", 0, 23).unwrap();
        assert!(field.matches(12));
        assert!(!field.matches(18));
        assert_eq!(field.first_in_range(0, 23), Some(9));
        assert_eq!(field.first_in_range(13, 23), Some(13));
    }

    #[test]
    fn step_value() {
        let field = FieldMatcher::parse("*/15", 0, 59).unwrap();
        assert!(field.matches(0));
        assert!(field.matches(45));
        assert!(!field.matches(46));
        assert_eq!(field.first_in_range(1, 59), Some(15));
    }

    #[test]
    fn comma_list() {
        let field = FieldMatcher::parse("1,3,5-7", 0, 9).unwrap();
        assert!(field.matches(1));
        assert!(field.matches(6));
        assert!(!field.matches(4));
        assert_eq!(field.first_in_range(2, 9), Some(3));
    }

    #[test]
    fn rejects_out_of_domain_and_malformed() {
        assert!(FieldMatcher::parse("99", 0, 59).is_err());
        assert!(FieldMatcher::parse("5-2", 0, 59).is_err());
        assert!(FieldMatcher::parse("abc", 0, 59).is_err());
    }
}
