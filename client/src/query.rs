//! PuppetDB query AST
//!
//! A [`Query`] is a boolean tree that encodes to the JSON array syntax of
//! the PuppetDB v4 query language, e.g. `["and", ["=", "certname", "a"]]`.

use serde_json::{Value, json};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    And(Vec<Query>),
    Or(Vec<Query>),
    Equals { field: String, value: String },
    Null { field: String, is_null: bool },
    LessOrEqual { field: String, value: String },
}

impl Query {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn null(field: impl Into<String>, is_null: bool) -> Self {
        Self::Null {
            field: field.into(),
            is_null,
        }
    }

    pub fn less_or_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::LessOrEqual {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Encode to the PuppetDB AST.
    ///
    /// Fails if any composite in the tree has no operands.
    pub fn to_json(&self) -> Result<Value, Error> {
        match self {
            Self::And(children) => composite("and", children),
            Self::Or(children) => composite("or", children),
            Self::Equals { field, value } => Ok(json!(["=", field, value])),
            Self::Null { field, is_null } => Ok(json!(["null?", field, is_null])),
            Self::LessOrEqual { field, value } => Ok(json!(["<=", field, value])),
        }
    }

    /// Encode to the string form used in the `query` request parameter
    pub fn to_query_string(&self) -> Result<String, Error> {
        Ok(self.to_json()?.to_string())
    }
}

fn composite(op: &'static str, children: &[Query]) -> Result<Value, Error> {
    if children.is_empty() {
        return Err(Error::EmptyComposite(op));
    }
    let mut operands = Vec::with_capacity(children.len() + 1);
    operands.push(Value::String(op.to_string()));
    for child in children {
        operands.push(child.to_json()?);
    }
    Ok(Value::Array(operands))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_encoding() {
        let q = Query::equals("catalog_environment", "production");
        assert_eq!(
            q.to_json().unwrap(),
            json!(["=", "catalog_environment", "production"])
        );
    }

    #[test]
    fn test_null_encoding() {
        let q = Query::null("report_timestamp", true);
        assert_eq!(q.to_json().unwrap(), json!(["null?", "report_timestamp", true]));
    }

    #[test]
    fn test_less_or_equal_encoding() {
        let q = Query::less_or_equal("report_timestamp", "2024-01-01T10:00:00");
        assert_eq!(
            q.to_json().unwrap(),
            json!(["<=", "report_timestamp", "2024-01-01T10:00:00"])
        );
    }

    #[test]
    fn test_nested_encoding() {
        let q = Query::And(vec![
            Query::equals("catalog_environment", "production"),
            Query::Or(vec![
                Query::null("report_timestamp", true),
                Query::less_or_equal("report_timestamp", "2024-01-01T10:00:00"),
            ]),
        ]);
        assert_eq!(
            q.to_query_string().unwrap(),
            r#"["and",["=","catalog_environment","production"],["or",["null?","report_timestamp",true],["<=","report_timestamp","2024-01-01T10:00:00"]]]"#
        );
    }

    #[test]
    fn test_single_child_and_kept() {
        let q = Query::And(vec![Query::equals("certname", "web01")]);
        assert_eq!(q.to_json().unwrap(), json!(["and", ["=", "certname", "web01"]]));
    }

    #[test]
    fn test_empty_and_rejected() {
        let q = Query::And(vec![]);
        assert!(matches!(q.to_json(), Err(Error::EmptyComposite("and"))));
    }

    #[test]
    fn test_nested_empty_or_rejected() {
        let q = Query::And(vec![
            Query::equals("certname", "web01"),
            Query::Or(vec![]),
        ]);
        assert!(matches!(q.to_json(), Err(Error::EmptyComposite("or"))));
    }
}
