use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::domain::ExpenseView;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Amount,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("date") {
            Some(Self::Date)
        } else if raw.eq_ignore_ascii_case("amount") {
            Some(Self::Amount)
        } else {
            None
        }
    }

    fn compare(self, a: &ExpenseView, b: &ExpenseView) -> Ordering {
        match self {
            Self::Date => a.date.cmp(&b.date),
            Self::Amount => a.amount.cmp(&b.amount),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Date => "date",
            Self::Amount => "amount",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Asc => ord,
            Self::Desc => ord.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortRule {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortRule {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    fn compare(&self, a: &ExpenseView, b: &ExpenseView) -> Ordering {
        self.direction.apply(self.field.compare(a, b))
    }
}

/// Ordered sort rules, no field repeated. An empty spec means
/// [`default_order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    rules: Vec<SortRule>,
}

impl SortSpec {
    pub fn rules(&self) -> &[SortRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Earlier rules win; later rules only break ties left by earlier ones.
    pub fn compare(&self, a: &ExpenseView, b: &ExpenseView) -> Ordering {
        if self.rules.is_empty() {
            return default_order(a, b);
        }

        self.rules
            .iter()
            .fold(Ordering::Equal, |acc, rule| acc.then_with(|| rule.compare(a, b)))
    }
}

impl FromStr for SortSpec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sort_spec(s)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", rule.field, rule.direction)?;
        }
        Ok(())
    }
}

/// Date ascending, then amount descending, then category name (ordinal).
pub fn default_order(a: &ExpenseView, b: &ExpenseView) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| b.amount.cmp(&a.amount))
        .then_with(|| a.category_name.cmp(&b.category_name))
}

/// Parses `field:direction[,field:direction...]`, e.g. `date:asc,amount:desc`.
pub fn parse_sort_spec(raw: &str) -> Result<SortSpec, ValidationError> {
    let mut rules: Vec<SortRule> = Vec::new();

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let parts: Vec<&str> = token
            .split(':')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let &[field_raw, direction_raw] = parts.as_slice() else {
            return Err(ValidationError::MalformedToken(token.to_string()));
        };

        let field = SortField::parse(field_raw)
            .ok_or_else(|| ValidationError::UnknownField(field_raw.to_string()))?;
        let direction = SortDirection::parse(direction_raw)
            .ok_or_else(|| ValidationError::UnknownDirection(direction_raw.to_string()))?;

        if rules.iter().any(|r| r.field == field) {
            return Err(ValidationError::DuplicateField(field.to_string()));
        }

        rules.push(SortRule::new(field, direction));
    }

    Ok(SortSpec { rules })
}
