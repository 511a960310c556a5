//! logos-based display expressions.
//!
//! An expression concatenates entity fields and string literals:
//! `#number + ' - ' + #name`. Field references may follow belongs-to
//! relations (`#product.number`). Expressions are parsed once when a pattern
//! is initialized and evaluated per entity while binding or listing.

use logos::Logos;

use crate::model::Entity;

/// Expression token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    /// Field reference: `#name`, `#product.number`.
    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*")]
    Field,

    /// Single-quoted literal.
    #[regex(r"'[^']*'")]
    Literal,

    /// `+`
    #[token("+")]
    Plus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Field(String),
    Literal(String),
}

/// Errors from expression parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected `{text}` at offset {offset} in expression `{expression}`")]
    Unexpected {
        expression: String,
        text: String,
        offset: usize,
    },
    #[error("expression `{0}` ends with an operator")]
    TrailingOperator(String),
}

/// A parsed display expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    source: String,
    operands: Vec<Operand>,
}

impl Expression {
    /// Parse an expression: operands separated by `+`.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let mut operands = Vec::new();
        let mut expect_operand = true;
        let mut lexer = Token::lexer(source);

        while let Some(token) = lexer.next() {
            let text = lexer.slice();
            match (token, expect_operand) {
                (Ok(Token::Field), true) => {
                    operands.push(Operand::Field(text[1..].to_owned()));
                    expect_operand = false;
                }
                (Ok(Token::Literal), true) => {
                    operands.push(Operand::Literal(text[1..text.len() - 1].to_owned()));
                    expect_operand = false;
                }
                (Ok(Token::Plus), false) => expect_operand = true,
                _ => {
                    return Err(ExpressionError::Unexpected {
                        expression: source.to_owned(),
                        text: text.to_owned(),
                        offset: lexer.span().start,
                    })
                }
            }
        }

        if operands.is_empty() {
            return Err(ExpressionError::Empty);
        }
        if expect_operand {
            return Err(ExpressionError::TrailingOperator(source.to_owned()));
        }
        Ok(Self {
            source: source.to_owned(),
            operands,
        })
    }

    /// Expression reading a single field.
    pub fn field(name: &str) -> Self {
        Self {
            source: format!("#{name}"),
            operands: vec![Operand::Field(name.to_owned())],
        }
    }

    /// The text this expression was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field paths referenced by the expression.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(|operand| match operand {
            Operand::Field(path) => Some(path.as_str()),
            Operand::Literal(_) => None,
        })
    }

    /// Evaluate against an entity. Missing or null fields render empty.
    pub fn evaluate(&self, entity: &Entity) -> String {
        let mut out = String::new();
        for operand in &self.operands {
            match operand {
                Operand::Field(path) => {
                    if let Some(text) = entity.text(path) {
                        out.push_str(&text);
                    }
                }
                Operand::Literal(text) => out.push_str(text),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Entity {
        Entity::new("product")
            .with_id(4)
            .with_field("number", "P-4")
            .with_field("name", "Bolt")
            .with_belongs_to("unit", Entity::new("unit").with_id(1).with_field("symbol", "pcs"))
    }

    #[test]
    fn single_field() {
        let expr = Expression::parse("#number").unwrap();
        assert_eq!(expr.evaluate(&product()), "P-4");
        assert_eq!(expr, Expression::field("number"));
    }

    #[test]
    fn concatenation_with_literals() {
        let expr = Expression::parse("#number + ' - ' + #name").unwrap();
        assert_eq!(expr.evaluate(&product()), "P-4 - Bolt");
        assert_eq!(expr.fields().collect::<Vec<_>>(), vec!["number", "name"]);
    }

    #[test]
    fn relation_path() {
        let expr = Expression::parse("#name + ' [' + #unit.symbol + ']'").unwrap();
        assert_eq!(expr.evaluate(&product()), "Bolt [pcs]");
    }

    #[test]
    fn missing_field_renders_empty() {
        let expr = Expression::parse("#missing + '!'").unwrap();
        assert_eq!(expr.evaluate(&product()), "!");
    }

    #[test]
    fn id_pseudo_field() {
        let expr = Expression::parse("'#' + #id").unwrap();
        assert_eq!(expr.evaluate(&product()), "#4");
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(Expression::parse("  "), Err(ExpressionError::Empty));
    }

    #[test]
    fn trailing_plus_is_rejected() {
        assert!(matches!(
            Expression::parse("#name +"),
            Err(ExpressionError::TrailingOperator(_))
        ));
    }

    #[test]
    fn adjacent_operands_are_rejected() {
        let err = Expression::parse("#name #number").unwrap_err();
        assert_eq!(
            err,
            ExpressionError::Unexpected {
                expression: "#name #number".into(),
                text: "#number".into(),
                offset: 6,
            }
        );
    }

    #[test]
    fn unknown_characters_are_rejected() {
        assert!(matches!(
            Expression::parse("#name * 2"),
            Err(ExpressionError::Unexpected { offset: 6, .. })
        ));
    }
}
