//! # Sort Mapping
//!
//! Every result type declares which public names may be sorted on and which
//! storage field each one maps to. A mapping flagged `reverse` flips the
//! requested direction, so `usage` ascending reads as "most used first".
//!
//! Sort expressions are comma-separated `field[ direction]` tokens, e.g.
//! `"category, usage desc"`. Names match case-insensitively.

use std::collections::BTreeSet;

use serde::Serialize;

use super::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Public sort name → storage field path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortMapping {
    pub name: &'static str,
    pub path: &'static str,
    pub reverse: bool,
}

impl SortMapping {
    pub const fn new(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            reverse: false,
        }
    }

    /// A mapping whose natural order is inverted
    pub const fn reversed(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            reverse: true,
        }
    }
}

/// One resolved ordering step, in storage terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortClause {
    pub path: &'static str,
    pub direction: SortDirection,
}

impl SortClause {
    pub fn asc(path: &'static str) -> Self {
        Self {
            path,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(path: &'static str) -> Self {
        Self {
            path,
            direction: SortDirection::Desc,
        }
    }
}

/// The sortable fields of one result type
#[derive(Debug)]
pub struct SortMappingTable {
    pub mappings: &'static [SortMapping],
    /// Order used when the request names none, in public names
    pub default_order: &'static [(&'static str, SortDirection)],
    /// Storage path appended ascending to make the order total
    pub tiebreaker: &'static str,
}

impl SortMappingTable {
    pub fn lookup(&self, name: &str) -> Option<&SortMapping> {
        self.mappings
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mappings.iter().map(|m| m.name)
    }

    /// Validate a sort expression and translate it to storage clauses.
    ///
    /// Every unknown name is reported at once, sorted and de-duplicated. A
    /// token with an unknown direction word is reported verbatim.
    pub fn resolve(&self, expression: Option<&str>) -> Result<Vec<SortClause>, ValidationError> {
        let expression = expression.map(str::trim).filter(|e| !e.is_empty());

        let requested = match expression {
            None => self.default_requests(),
            Some(expression) => self.parse_requests(expression)?,
        };

        let mut clauses: Vec<SortClause> = Vec::with_capacity(requested.len() + 1);
        for (mapping, direction) in requested {
            if clauses.iter().any(|c| c.path == mapping.path) {
                continue;
            }
            let direction = if mapping.reverse {
                direction.reversed()
            } else {
                direction
            };
            clauses.push(SortClause {
                path: mapping.path,
                direction,
            });
        }

        if !clauses.iter().any(|c| c.path == self.tiebreaker) {
            clauses.push(SortClause::asc(self.tiebreaker));
        }

        Ok(clauses)
    }

    fn default_requests(&self) -> Vec<(&SortMapping, SortDirection)> {
        // Default names are compile-time constants; one that does not map is skipped
        self.default_order
            .iter()
            .filter_map(|(name, direction)| self.lookup(name).map(|m| (m, *direction)))
            .collect()
    }

    fn parse_requests(
        &self,
        expression: &str,
    ) -> Result<Vec<(&SortMapping, SortDirection)>, ValidationError> {
        let mut requested = Vec::new();
        let mut invalid = BTreeSet::new();

        for token in expression.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let mut words = token.split_whitespace();
            let name = words.next().unwrap_or_default();
            let direction = match (words.next(), words.next()) {
                (None, _) => Some(SortDirection::Asc),
                (Some(word), None) => SortDirection::parse(word),
                (Some(_), Some(_)) => None,
            };

            match (self.lookup(name), direction) {
                (Some(mapping), Some(direction)) => requested.push((mapping, direction)),
                (None, _) => {
                    invalid.insert(name.to_string());
                }
                (Some(_), None) => {
                    invalid.insert(token.to_string());
                }
            }
        }

        if !invalid.is_empty() {
            return Err(ValidationError::InvalidSortField(invalid.into_iter().collect()));
        }

        Ok(requested)
    }
}
