use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct FourParser;

pub type PestError = pest::error::Error<Rule>;
pub type ParseResult<T> = Result<T, PestError>;

/// removes all whitespace, the grammar is matched against the result
pub fn strip_whitespace(src: &str) -> String {
    src.chars().filter(|c| !c.is_whitespace()).collect()
}

/// matches whitespace free source against the grammar and returns the digits
/// between "3." and the final "4"
pub fn program_body(cleaned: &str) -> ParseResult<&str> {
    let body = FourParser::parse(Rule::program, cleaned)?
        .flatten()
        .find(|pair| pair.as_rule() == Rule::body)
        .map(|pair| pair.as_str())
        .unwrap_or_default();
    Ok(body)
}
