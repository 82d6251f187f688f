// Lexical helpers shared by the view DSL parsers

use nom::{
    branch::alt,
    bytes::complete::is_a,
    character::complete::{alphanumeric1, char, multispace0, none_of},
    combinator::{map, recognize, value},
    multi::{many0, many1},
    sequence::{delimited, preceded},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Double-quoted string with `\"`, `\\` and `\n` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            many0(alt((
                none_of("\\\""),
                preceded(
                    char('\\'),
                    alt((char('"'), char('\\'), value('\n', char('n')))),
                ),
            ))),
            char('"'),
        ),
        |chars| chars.into_iter().collect(),
    )(input)
}

/// Unquoted category key or attribute name, e.g. `semi-furnished`, `0`, `2.5`
pub fn bare_value(input: &str) -> IResult<&str, String> {
    map(
        recognize(many1(alt((alphanumeric1, is_a("_-.+"))))),
        String::from,
    )(input)
}

/// Any value position: quoted string or bare token
pub fn value_literal(input: &str) -> IResult<&str, String> {
    alt((string_literal, bare_value))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""semi furnished""#), Ok(("", "semi furnished".to_string())));
        assert_eq!(string_literal(r#""say \"hi\"""#), Ok(("", "say \"hi\"".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
        assert!(string_literal(r#""unterminated"#).is_err());
    }

    #[test]
    fn test_bare_value() {
        assert_eq!(bare_value("semi-furnished)"), Ok((")", "semi-furnished".to_string())));
        assert_eq!(bare_value("2.5,"), Ok((",", "2.5".to_string())));
        assert!(bare_value(",x").is_err());
    }

    #[test]
    fn test_ws() {
        let mut comma = ws(char(','));
        assert_eq!(comma("  ,  next"), Ok(("next", ',')));
    }
}
