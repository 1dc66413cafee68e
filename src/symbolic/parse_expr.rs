//! a module turns a String expression into a symbolic expression
//!
//! Parsing runs in fixed stages: whitespace is stripped, the text is cut into tokens
//! (synonyms such as `sen`, `ln`, `arctan`, `theta` or `**` are mapped to their canonical
//! token while cutting), multiplication signs are inserted between adjacent operands, and
//! finally the token list is split recursively on the weakest operator outside brackets.
//!
//!# Example
//! ```
//! use RustedIntegra::symbolic::symbolic_engine::Expr;
//! let parsed = Expr::parse_expression("2x sen(y)^2").unwrap();
//! assert_eq!(parsed.to_string(), "((2 * x) * (sin(y) ^ 2))");
//! ```
//                  search recursion diagram
//                "y^2+exp(x)*z-x"                  |
//                |       left  | right             |
//                |_________________________________|
//                |      split by rightmost -       |
//                |_________________________________|
//                | y^2+exp(x)*z|       x           |
//                |_____ \|/____|___________________|
//                |      split by rightmost +       |
//                |_________________________________|
//                |       y^2   |  exp(x)*z         |
//                |____ \|/_____|____\|/____________|
//                |   split ^   |  split *          |
//                |   y  |  2   | exp(x) |  z       |
//                  etc...
//
// Known ambiguity: every letter run is cut into alphabet words, so `xy` is `x*y` and
// `x2` is `x*2`; multi-letter names exist only for the fixed function list and the
// Greek variable spellings. Scientific notation is not part of the language: `2e-3`
// reads as `2*e - 3`.
use crate::errors::IntegraError;
use crate::symbolic::symbolic_engine::{Expr, PHI, RHO, THETA};
use itertools::Itertools;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit0, digit1},
    combinator::{map, opt, recognize},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(String),
    Variable(&'static str),
    Pi,
    Euler,
    Function(&'static str),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    /// canonical spelling used by the normalized text
    fn text(&self) -> &str {
        match self {
            Token::Number(s) => s,
            Token::Variable(name) => name,
            Token::Pi => "π",
            Token::Euler => "e",
            Token::Function(name) => name,
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Caret => "^",
            Token::LParen => "(",
            Token::RParen => ")",
        }
    }

    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_) | Token::Variable(_) | Token::Pi | Token::Euler | Token::RParen
        )
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Variable(_)
                | Token::Pi
                | Token::Euler
                | Token::Function(_)
                | Token::LParen
        )
    }
}

/// words a run of letters may be cut into, with the token each one stands for
const WORDS: [(&str, Token); 38] = [
    ("arcsin", Token::Function("asin")),
    ("arccos", Token::Function("acos")),
    ("arctan", Token::Function("atan")),
    ("arctg", Token::Function("atan")),
    ("asin", Token::Function("asin")),
    ("acos", Token::Function("acos")),
    ("atan", Token::Function("atan")),
    ("sinh", Token::Function("sinh")),
    ("cosh", Token::Function("cosh")),
    ("tanh", Token::Function("tanh")),
    ("sqrt", Token::Function("sqrt")),
    ("sin", Token::Function("sin")),
    ("sen", Token::Function("sin")),
    ("cos", Token::Function("cos")),
    ("tan", Token::Function("tan")),
    ("tg", Token::Function("tan")),
    ("exp", Token::Function("exp")),
    ("log", Token::Function("log")),
    ("ln", Token::Function("log")),
    ("abs", Token::Function("abs")),
    ("theta", Token::Variable(THETA)),
    ("θ", Token::Variable(THETA)),
    ("phi", Token::Variable(PHI)),
    ("φ", Token::Variable(PHI)),
    ("ϕ", Token::Variable(PHI)),
    ("rho", Token::Variable(RHO)),
    ("ρ", Token::Variable(RHO)),
    ("x", Token::Variable("x")),
    ("y", Token::Variable("y")),
    ("z", Token::Variable("z")),
    ("r", Token::Variable("r")),
    ("pi", Token::Pi),
    ("π", Token::Pi),
    ("e", Token::Euler),
    ("E", Token::Euler),
    ("X", Token::Variable("x")),
    ("Y", Token::Variable("y")),
    ("Z", Token::Variable("z")),
];

enum Lexeme<'a> {
    Number(&'a str),
    Letters(&'a str),
    Op(Token),
}

fn parse_number(input: &str) -> IResult<&str, &str> {
    alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ))
    .parse(input)
}

fn parse_operator(input: &str) -> IResult<&str, Token> {
    alt((
        map(tag("**"), |_| Token::Caret),
        map(tag("^"), |_| Token::Caret),
        map(tag("+"), |_| Token::Plus),
        map(alt((tag("-"), tag("−"))), |_| Token::Minus),
        map(alt((tag("*"), tag("×"), tag("·"))), |_| Token::Star),
        map(alt((tag("/"), tag("÷"))), |_| Token::Slash),
        map(tag("("), |_| Token::LParen),
        map(tag(")"), |_| Token::RParen),
    ))
    .parse(input)
}

fn parse_lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        map(parse_number, Lexeme::Number),
        map(take_while1(|c: char| c.is_alphabetic()), Lexeme::Letters),
        map(parse_operator, Lexeme::Op),
    ))
    .parse(input)
}

/// Cuts a run of letters into alphabet words, longest word first.
fn split_letters(run: &str, input: &str) -> Result<Vec<Token>, IntegraError> {
    let mut tokens = Vec::new();
    let mut rest = run;
    while !rest.is_empty() {
        let word = WORDS
            .iter()
            .filter(|(word, _)| rest.starts_with(word))
            .max_by_key(|(word, _)| word.len());
        match word {
            Some((word, token)) => {
                tokens.push(token.clone());
                rest = &rest[word.len()..];
            }
            None => {
                return Err(IntegraError::parse_error(
                    input,
                    format!("unknown identifier '{}'", rest),
                ));
            }
        }
    }
    Ok(tokens)
}

/// Strips whitespace and turns the text into canonical tokens with the implicit
/// multiplication signs already inserted.
pub fn tokenize(input: &str) -> Result<Vec<Token>, IntegraError> {
    let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() {
        return Err(IntegraError::parse_error(input, "empty expression"));
    }
    let mut raw = Vec::new();
    let mut rest = stripped.as_str();
    while !rest.is_empty() {
        match parse_lexeme(rest) {
            Ok((remaining, lexeme)) => {
                match lexeme {
                    Lexeme::Number(text) => raw.push(Token::Number(text.to_string())),
                    Lexeme::Letters(run) => raw.extend(split_letters(run, input)?),
                    Lexeme::Op(token) => raw.push(token),
                }
                rest = remaining;
            }
            Err(_) => {
                let bad = rest.chars().next().unwrap_or(' ');
                return Err(IntegraError::parse_error(
                    input,
                    format!("unexpected character '{}'", bad),
                ));
            }
        }
    }
    insert_implicit_multiplication(raw, input)
}

fn insert_implicit_multiplication(raw: Vec<Token>, input: &str) -> Result<Vec<Token>, IntegraError> {
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
    for token in raw {
        if let Some(prev) = tokens.last() {
            if let (Token::Number(a), Token::Number(b)) = (prev, &token) {
                return Err(IntegraError::parse_error(
                    input,
                    format!("malformed number '{}{}'", a, b),
                ));
            }
            if let Token::Function(name) = prev {
                if token != Token::LParen {
                    return Err(IntegraError::parse_error(
                        input,
                        format!("function '{}' must be followed by '('", name),
                    ));
                }
            }
            if prev.ends_operand() && token.starts_operand() {
                tokens.push(Token::Star);
            }
        }
        tokens.push(token);
    }
    if let Some(Token::Function(name)) = tokens.last() {
        return Err(IntegraError::parse_error(
            input,
            format!("function '{}' must be followed by '('", name),
        ));
    }
    Ok(tokens)
}

/// Text after whitespace stripping, synonym substitution and implicit multiplication.
pub fn normalize(input: &str) -> Result<String, IntegraError> {
    let tokens = tokenize(input)?;
    Ok(tokens.iter().map(Token::text).join(""))
}

// index of the bracket closing the one opened at `open`
fn find_pair_to_this_bracket(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn check_brackets(tokens: &[Token], input: &str) -> Result<(), IntegraError> {
    let mut depth: i64 = 0;
    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth < 0 {
                    return Err(IntegraError::parse_error(input, "unbalanced brackets: unexpected ')'"));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(IntegraError::parse_error(input, "unbalanced brackets: missing ')'"));
    }
    Ok(())
}

// function to find the rightmost (or leftmost) operator of one precedence level outside brackets
fn find_operator_outside_brackets<P: Fn(usize) -> bool>(
    tokens: &[Token],
    is_operator: P,
    rightmost: bool,
) -> Option<usize> {
    let mut depth = 0usize;
    let mut found = None;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_operator(i) => {
                if !rightmost {
                    return Some(i);
                }
                found = Some(i);
            }
            _ => {}
        }
    }
    found
}

fn parse_tokens(tokens: &[Token], input: &str) -> Result<Expr, IntegraError> {
    if tokens.is_empty() {
        return Err(IntegraError::parse_error(input, "missing operand"));
    }
    // whole slice in brackets
    if tokens[0] == Token::LParen
        && find_pair_to_this_bracket(tokens, 0) == Some(tokens.len() - 1)
    {
        if tokens.len() == 2 {
            return Err(IntegraError::parse_error(input, "empty brackets"));
        }
        return parse_tokens(&tokens[1..tokens.len() - 1], input);
    }
    // binary + and -: the sign must follow a complete operand
    let is_binary_sign = |i: usize| {
        matches!(tokens[i], Token::Plus | Token::Minus) && i > 0 && tokens[i - 1].ends_operand()
    };
    if let Some(pos) = find_operator_outside_brackets(tokens, is_binary_sign, true) {
        let left = parse_tokens(&tokens[..pos], input)?;
        let right = parse_operand(&tokens[pos + 1..], &tokens[pos], input)?;
        return Ok(match tokens[pos] {
            Token::Plus => Expr::Add(left.boxed(), right.boxed()),
            _ => Expr::Sub(left.boxed(), right.boxed()),
        });
    }
    let is_product = |i: usize| matches!(tokens[i], Token::Star | Token::Slash);
    if let Some(pos) = find_operator_outside_brackets(tokens, is_product, true) {
        if pos == 0 {
            return Err(IntegraError::parse_error(
                input,
                format!("missing operand before '{}'", tokens[pos].text()),
            ));
        }
        let left = parse_tokens(&tokens[..pos], input)?;
        let right = parse_operand(&tokens[pos + 1..], &tokens[pos], input)?;
        return Ok(match tokens[pos] {
            Token::Star => Expr::Mul(left.boxed(), right.boxed()),
            _ => Expr::Div(left.boxed(), right.boxed()),
        });
    }
    // unary sign binds looser than ^ : -x^2 is -(x^2)
    match tokens[0] {
        Token::Minus => {
            let rest = &tokens[1..];
            if let [Token::Number(text)] = rest {
                return Ok(Expr::Const(-parse_number_text(text, input)?));
            }
            let inner = parse_operand(rest, &tokens[0], input)?;
            return Ok(Expr::Mul(Expr::Const(-1.0).boxed(), inner.boxed()));
        }
        Token::Plus => return parse_operand(&tokens[1..], &tokens[0], input),
        _ => {}
    }
    // ^ is right associative, so split on the leftmost one
    let is_power = |i: usize| tokens[i] == Token::Caret;
    if let Some(pos) = find_operator_outside_brackets(tokens, is_power, false) {
        if pos == 0 {
            return Err(IntegraError::parse_error(input, "missing operand before '^'"));
        }
        let base = parse_tokens(&tokens[..pos], input)?;
        let exp = parse_operand(&tokens[pos + 1..], &tokens[pos], input)?;
        return Ok(Expr::Pow(base.boxed(), exp.boxed()));
    }
    if let Token::Function(name) = tokens[0] {
        if tokens.len() > 2
            && tokens[1] == Token::LParen
            && find_pair_to_this_bracket(tokens, 1) == Some(tokens.len() - 1)
        {
            let arg = parse_tokens(&tokens[2..tokens.len() - 1], input)?;
            return Expr::from_function_name(name, arg).ok_or_else(|| {
                IntegraError::parse_error(input, format!("unknown function '{}'", name))
            });
        }
        return Err(IntegraError::parse_error(
            input,
            format!("function '{}' must be followed by an argument in brackets", name),
        ));
    }
    match tokens {
        [Token::Number(text)] => Ok(Expr::Const(parse_number_text(text, input)?)),
        [Token::Variable(name)] => Ok(Expr::var(name)),
        [Token::Pi] => Ok(Expr::Pi),
        [Token::Euler] => Ok(Expr::E),
        _ => Err(IntegraError::parse_error(
            input,
            format!(
                "cannot parse '{}'",
                tokens.iter().map(|t| t.text()).collect::<String>()
            ),
        )),
    }
}

// right-hand operand of an operator; an empty one is a dangling operator
fn parse_operand(tokens: &[Token], operator: &Token, input: &str) -> Result<Expr, IntegraError> {
    if tokens.is_empty() {
        return Err(IntegraError::parse_error(
            input,
            format!("missing operand after '{}'", operator.text()),
        ));
    }
    parse_tokens(tokens, input)
}

fn parse_number_text(text: &str, input: &str) -> Result<f64, IntegraError> {
    text.parse::<f64>()
        .map_err(|_| IntegraError::parse_error(input, format!("malformed number '{}'", text)))
}

impl Expr {
    /// Parses free-form text into an expression over the closed variable alphabet.
    pub fn parse_expression(input: &str) -> Result<Expr, IntegraError> {
        let tokens = tokenize(input)?;
        check_brackets(&tokens, input)?;
        parse_tokens(&tokens, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Expr {
        Expr::parse_expression(s).unwrap()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(
            parse("x+y*z"),
            Expr::var("x") + Expr::var("y") * Expr::var("z")
        );
        assert_eq!(
            parse("x-y-z"),
            (Expr::var("x") - Expr::var("y")) - Expr::var("z")
        );
        assert_eq!(
            parse("x/y/z"),
            (Expr::var("x") / Expr::var("y")) / Expr::var("z")
        );
        assert_eq!(
            parse("x^y^z"),
            Expr::var("x").pow(Expr::var("y").pow(Expr::var("z")))
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(parse("-2"), Expr::Const(-2.0));
        assert_eq!(parse("-x^2"), -(Expr::var("x").pow(Expr::Const(2.0))));
        assert_eq!(parse("2*-x"), Expr::Const(2.0) * -Expr::var("x"));
        assert_eq!(parse("x^-2"), Expr::var("x").pow(Expr::Const(-2.0)));
        assert_eq!(parse("x--y"), Expr::var("x") - -Expr::var("y"));
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(parse("2x"), Expr::Const(2.0) * Expr::var("x"));
        assert_eq!(parse("x2"), Expr::var("x") * Expr::Const(2.0));
        assert_eq!(
            parse("(x+1)(y+1)"),
            (Expr::var("x") + Expr::Const(1.0)) * (Expr::var("y") + Expr::Const(1.0))
        );
        assert_eq!(
            parse("xsin(y)"),
            Expr::var("x") * Expr::sin(Expr::var("y").boxed())
        );
        assert_eq!(parse("xy"), Expr::var("x") * Expr::var("y"));
        assert_eq!(parse("2pi"), Expr::Const(2.0) * Expr::Pi);
        assert_eq!(normalize("2x sen(y)^2").unwrap(), "2*x*sin(y)^2");
        assert_eq!(normalize("(x+1)(y+1)").unwrap(), "(x+1)*(y+1)");
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(parse("sen(x)"), parse("sin(x)"));
        assert_eq!(parse("ln(x)"), Expr::Ln(Expr::var("x").boxed()));
        assert_eq!(parse("arctan(x)"), parse("atan(x)"));
        assert_eq!(parse("arcsin(x)"), Expr::arcsin(Expr::var("x").boxed()));
        assert_eq!(parse("x**2"), parse("x^2"));
        assert_eq!(parse("π"), Expr::Pi);
        assert_eq!(parse("rho^2 sin(phi)"), parse("ρ^2*sin(φ)"));
        assert_eq!(parse("theta"), Expr::var(THETA));
        assert_eq!(parse("abs(x)"), Expr::abs(Expr::var("x").boxed()));
        assert_eq!(parse("e^x"), Expr::E.pow(Expr::var("x")));
        assert_eq!(parse("X*Y*Z"), parse("x*y*z"));
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "", "x+", "*x", "(x+1", "x+1)", "sec(x)", "sinx", "w", "x$y", "()", "sin", "2..3",
        ] {
            let result = Expr::parse_expression(bad);
            assert!(
                matches!(result, Err(IntegraError::ParseError { .. })),
                "'{}' should not parse, got {:?}",
                bad,
                result
            );
        }
        match Expr::parse_expression("foo(x)") {
            Err(IntegraError::ParseError { input, message }) => {
                assert_eq!(input, "foo(x)");
                assert!(message.contains("unknown identifier"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_render_parse_round_trip() {
        for s in [
            "x^2+y^2+z^2",
            "2x sin(y) - 3/(z+1)",
            "-x*-y",
            "exp(-r^2)*r",
            "rho^2 sin(phi) cos(theta)",
            "sqrt(abs(x))+log(1+y)",
            "asin(x/2)+acos(0.5)+atan(y)",
            "sinh(x)cosh(y)tanh(z)",
            "0.1+0.2*pi-e",
            "2^-x^2",
            "(x+1)(y+1)(z+1)",
            "-(x+y)",
            "x^(1/3)",
        ] {
            let first = parse(s);
            let again = parse(&first.to_string());
            assert_eq!(first, again, "round trip of '{}' via '{}'", s, first);
        }
    }

    #[test]
    fn test_whitespace_ignored() {
        assert_eq!(parse(" x  +\ty \n"), parse("x+y"));
        assert_eq!(parse("2 x"), parse("2x"));
    }
}
