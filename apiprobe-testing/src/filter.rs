//! Tag expressions for selecting test cases.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr  := and ("or" and)*
//! and   := unary ("and" unary)*
//! unary := "not" unary | "(" expr ")" | TAG
//! ```

use crate::error::RunnerError;

/// Parsed tag expression such as `smoke and not slow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    Tag(String),
    Not(Box<TagExpr>),
    And(Box<TagExpr>, Box<TagExpr>),
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    pub fn parse(expression: &str) -> Result<Self, RunnerError> {
        let spaced = expression.replace('(', " ( ").replace(')', " ) ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let invalid = |reason: &str| RunnerError::InvalidTagExpression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        if tokens.is_empty() {
            return Err(invalid("empty expression"));
        }

        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(&format!("unexpected '{}'", token)));
        }
        Ok(expr)
    }

    /// Evaluate against the tags of one case.
    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            TagExpr::Tag(tag) => tags.iter().any(|t| t == tag),
            TagExpr::Not(inner) => !inner.matches(tags),
            TagExpr::And(a, b) => a.matches(tags) && b.matches(tags),
            TagExpr::Or(a, b) => a.matches(tags) || b.matches(tags),
        }
    }
}

struct Parser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn or(&mut self) -> Result<TagExpr, &'static str> {
        let mut left = self.and()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            left = TagExpr::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<TagExpr, &'static str> {
        let mut left = self.unary()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            left = TagExpr::And(Box::new(left), Box::new(self.unary()?));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<TagExpr, &'static str> {
        match self.next() {
            Some("not") => Ok(TagExpr::Not(Box::new(self.unary()?))),
            Some("(") => {
                let inner = self.or()?;
                match self.next() {
                    Some(")") => Ok(inner),
                    _ => Err("missing ')'"),
                }
            }
            Some(")") => Err("unexpected ')'"),
            Some("and") | Some("or") => Err("operator without operand"),
            Some(tag) => Ok(TagExpr::Tag(tag.to_string())),
            None => Err("unexpected end of expression"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_single_tag() {
        let expr = TagExpr::parse("smoke").unwrap();
        assert!(expr.matches(&tags(&["smoke", "login"])));
        assert!(!expr.matches(&tags(&["users"])));
    }

    #[test]
    fn test_operators() {
        let smoke_login = tags(&["smoke", "login"]);
        let users = tags(&["users"]);

        assert!(!TagExpr::parse("not smoke").unwrap().matches(&smoke_login));
        assert!(TagExpr::parse("not smoke").unwrap().matches(&users));
        assert!(TagExpr::parse("smoke and login").unwrap().matches(&smoke_login));
        assert!(!TagExpr::parse("smoke and users").unwrap().matches(&smoke_login));
        assert!(TagExpr::parse("smoke or users").unwrap().matches(&users));
    }

    #[test]
    fn test_precedence() {
        // a or (b and not c)
        let expr = TagExpr::parse("a or b and not c").unwrap();
        assert_eq!(
            expr,
            TagExpr::Or(
                Box::new(TagExpr::Tag("a".into())),
                Box::new(TagExpr::And(
                    Box::new(TagExpr::Tag("b".into())),
                    Box::new(TagExpr::Not(Box::new(TagExpr::Tag("c".into())))),
                )),
            )
        );

        let grouped = TagExpr::parse("(a or b) and c").unwrap();
        assert!(!grouped.matches(&tags(&["a"])));
        assert!(grouped.matches(&tags(&["b", "c"])));
    }

    #[test]
    fn test_invalid_expressions() {
        for bad in ["", "and", "a or", "(a", "a b", "not", "a )"] {
            assert!(
                matches!(
                    TagExpr::parse(bad),
                    Err(RunnerError::InvalidTagExpression { .. })
                ),
                "accepted {:?}",
                bad
            );
        }
    }
}
