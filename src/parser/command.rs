// Component parsers for the view DSL

use super::ast::{Arrange, Command};
use super::lexer::{value_literal, ws};
use nom::{
    bytes::complete::tag,
    character::complete::{char, u64 as parse_u64},
    combinator::opt,
    multi::{separated_list0, separated_list1},
    sequence::preceded,
    IResult,
};

/// Parse the axis list
/// Format: axes(furnishingstatus, parking, "hot water")
pub fn parse_axes(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("axes"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, axes) = separated_list0(ws(char(',')), ws(value_literal))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Axes(axes)))
}

/// `axis: key, key, ...` shared by select and order
fn axis_keys(input: &str) -> IResult<&str, (String, Vec<String>)> {
    let (input, axis) = ws(value_literal)(input)?;
    let (input, _) = ws(char(':'))(input)?;
    let (input, keys) = separated_list1(ws(char(',')), ws(value_literal))(input)?;
    Ok((input, (axis, keys)))
}

/// Parse a selection entry
/// Format: select(parking: 0, 1)
pub fn parse_select(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("select"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, (axis, keys)) = axis_keys(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Select { axis, keys }))
}

/// Parse an order override for one axis
/// Format: order(furnishingstatus: unfurnished, furnished)
pub fn parse_order(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("order"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, (axis, keys)) = axis_keys(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Order { axis, keys }))
}

/// Parse an auto-arrange request
/// Format: arrange() or arrange(iterations: 5)
pub fn parse_arrange(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("arrange"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, iterations) = opt(preceded(
        ws(tag("iterations")),
        preceded(ws(char(':')), ws(parse_u64)),
    ))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((
        input,
        Command::Arrange(Arrange {
            iterations: iterations.map(|n| n as usize),
        }),
    ))
}
