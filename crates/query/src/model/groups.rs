//! Nested AND/OR condition groups

use serde_json::{Map, Value as JsonValue};

use super::conditions::Predicate;
use super::types::Combinator;
use crate::codec::{self, Structural};
use crate::error::QueryResult;

/// One member of a boolean group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Predicate(Predicate),
    Group(BooleanGroup),
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Condition::Predicate(predicate)
    }
}

impl From<BooleanGroup> for Condition {
    fn from(group: BooleanGroup) -> Self {
        Condition::Group(group)
    }
}

impl Structural for Condition {
    fn to_structure(&self) -> JsonValue {
        match self {
            Condition::Predicate(predicate) => predicate.to_structure(),
            Condition::Group(group) => group.to_structure(),
        }
    }

    /// Mappings carrying `conditions` are groups; anything else is a predicate
    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "group condition")?;
        if obj.contains_key("conditions") {
            BooleanGroup::from_structure(value).map(Condition::Group)
        } else {
            Predicate::from_structure(value).map(Condition::Predicate)
        }
    }
}

/// Ordered combination of predicates and sub-groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanGroup {
    pub combinator: Combinator,
    pub conditions: Vec<Condition>,
}

impl BooleanGroup {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            conditions: Vec::new(),
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            combinator: Combinator::And,
            conditions,
        }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            combinator: Combinator::Or,
            conditions,
        }
    }

    pub fn push(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Nesting depth; a group holding only predicates has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Group(group) => group.depth(),
                Condition::Predicate(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

impl Structural for BooleanGroup {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("type".into(), self.combinator.to_structure());
        obj.insert("conditions".into(), codec::list_to_structure(&self.conditions));
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "boolean group")?;
        Ok(Self {
            combinator: Combinator::from_structure(codec::required(obj, "type", "boolean group")?)?,
            conditions: codec::list_of(codec::required(obj, "conditions", "boolean group")?, "boolean group")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Operator;
    use serde_json::json;

    fn nested() -> BooleanGroup {
        BooleanGroup::or(vec![
            Predicate::eq("role", "admin").into(),
            BooleanGroup::and(vec![
                Predicate::eq("role", "editor").into(),
                Predicate::new("level", Operator::GreaterThanOrEqual, 3).into(),
            ])
            .into(),
        ])
    }

    #[test]
    fn test_group_structure() {
        assert_eq!(
            nested().to_structure(),
            json!({
                "type": "OR",
                "conditions": [
                    {"field": "role", "operator": "=", "value": "admin"},
                    {
                        "type": "AND",
                        "conditions": [
                            {"field": "role", "operator": "=", "value": "editor"},
                            {"field": "level", "operator": ">=", "value": 3},
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn test_nested_group_round_trip() {
        let group = nested();
        assert_eq!(BooleanGroup::from_structure(&group.to_structure()).unwrap(), group);
    }

    #[test]
    fn test_depth() {
        assert_eq!(BooleanGroup::new(Combinator::And).depth(), 1);
        assert_eq!(nested().depth(), 2);
        let deeper = BooleanGroup::and(vec![nested().into()]);
        assert_eq!(deeper.depth(), 3);
    }

    #[test]
    fn test_order_is_significant_for_equality() {
        let a = BooleanGroup::and(vec![Predicate::eq("a", 1).into(), Predicate::eq("b", 2).into()]);
        let b = BooleanGroup::and(vec![Predicate::eq("b", 2).into(), Predicate::eq("a", 1).into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_unknown_combinator() {
        let err = BooleanGroup::from_structure(&json!({"type": "XOR", "conditions": []})).unwrap_err();
        assert_eq!(err.value(), Some("XOR"));
    }
}
