use std::fmt;

use serde::{Deserialize, Serialize};

/// Known filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Gender,
    BirthDate,
    Channel,
    Name,
    Email,
    City,
    Country,
    NewField,
}

/// Comparison operators a filter can apply to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "not equals")]
    NotEquals,
    #[serde(rename = "is after")]
    IsAfter,
    #[serde(rename = "is before")]
    IsBefore,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "starts with")]
    StartsWith,
    #[serde(rename = "ends with")]
    EndsWith,
    #[serde(rename = "is empty")]
    IsEmpty,
    #[serde(rename = "is not empty")]
    IsNotEmpty,
}

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Logic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Gender,
        Field::BirthDate,
        Field::Channel,
        Field::Name,
        Field::Email,
        Field::City,
        Field::Country,
        Field::NewField,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Gender => "gender",
            Field::BirthDate => "birth_date",
            Field::Channel => "channel",
            Field::Name => "name",
            Field::Email => "email",
            Field::City => "city",
            Field::Country => "country",
            Field::NewField => "new_field",
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::IsAfter,
        Operator::IsBefore,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not equals",
            Operator::IsAfter => "is after",
            Operator::IsBefore => "is before",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
            Operator::IsEmpty => "is empty",
            Operator::IsNotEmpty => "is not empty",
        }
    }

    /// Whether the operator takes a value operand. `is empty` and
    /// `is not empty` ignore the filter's value.
    #[must_use]
    pub fn takes_value(self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }
}

impl Logic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }

    #[must_use]
    pub fn flipped(self) -> Logic {
        match self {
            Logic::And => Logic::Or,
            Logic::Or => Logic::And,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
