// Pipeline parser for the view DSL

use super::ast::{Command, ViewSpec};
use super::command::{parse_arrange, parse_axes, parse_order, parse_select};
use super::lexer::ws;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, opt},
    multi::separated_list0,
    IResult,
};

fn parse_pipeline_component(input: &str) -> IResult<&str, Command> {
    alt((parse_axes, parse_arrange, parse_select, parse_order))(input)
}

/// Parse a complete view description
/// Format: component | component | ...
pub fn parse_view_spec(input: &str) -> IResult<&str, ViewSpec> {
    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list0(ws(tag("|")), parse_pipeline_component)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut spec = ViewSpec::default();
    for component in components {
        match component {
            Command::Axes(axes) => spec.axes = Some(axes),
            Command::Select { axis, keys } => {
                for key in keys {
                    spec.selection.insert(axis.clone(), key);
                }
            }
            Command::Order { axis, keys } => {
                spec.order.insert(axis, keys);
            }
            Command::Arrange(arrange) => spec.arrange = Some(arrange),
        }
    }

    Ok((input, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Arrange;

    #[test]
    fn test_parse_full_view() {
        let (_, spec) = parse_view_spec(
            "axes(furnishingstatus, parking) | select(parking: 0) | order(parking: 2, 1, 0) | arrange()",
        )
        .unwrap();
        assert_eq!(
            spec.axes,
            Some(vec!["furnishingstatus".to_string(), "parking".to_string()])
        );
        assert!(spec.selection.contains("parking", "0"));
        assert_eq!(spec.order["parking"], vec!["2", "1", "0"]);
        assert_eq!(spec.arrange, Some(Arrange { iterations: None }));
    }

    #[test]
    fn test_select_merges() {
        let (_, spec) =
            parse_view_spec("select(parking: 0) | select(parking: 1) | select(mainroad: yes)").unwrap();
        assert!(spec.selection.contains("parking", "0"));
        assert!(spec.selection.contains("parking", "1"));
        assert!(spec.selection.contains("mainroad", "yes"));
        assert!(spec.axes.is_none());
    }

    #[test]
    fn test_empty_input_is_default_view() {
        let (_, spec) = parse_view_spec("   ").unwrap();
        assert_eq!(spec, ViewSpec::default());
    }

    #[test]
    fn test_leading_pipe() {
        assert!(parse_view_spec("| axes(a, b)").is_ok());
    }

    #[test]
    fn test_trailing_pipe_fails() {
        assert!(parse_view_spec("axes(a, b) |").is_err());
    }

    #[test]
    fn test_leftover_input_fails() {
        assert!(parse_view_spec("axes(a, b) extra").is_err());
        assert!(parse_view_spec("colour(a)").is_err());
    }
}
