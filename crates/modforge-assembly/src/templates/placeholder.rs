//! Placeholder syntax and case transformation

use std::fmt;
use std::str::FromStr;

/// Represents a case transformation for placeholder values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    /// PascalCase (e.g., MyProject)
    PascalCase,
    /// camelCase (e.g., myProject)
    CamelCase,
    /// snake_case (e.g., my_project)
    SnakeCase,
    /// kebab-case (e.g., my-project)
    KebabCase,
    /// UPPERCASE (e.g., MY_PROJECT)
    UpperCase,
    /// lowercase (e.g., myproject)
    LowerCase,
}

impl CaseTransform {
    /// Apply case transformation to a string
    pub fn apply(&self, input: &str) -> String {
        use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};

        match self {
            CaseTransform::PascalCase => input.to_pascal_case(),
            CaseTransform::CamelCase => input.to_lower_camel_case(),
            CaseTransform::SnakeCase => input.to_snake_case(),
            CaseTransform::KebabCase => input.to_kebab_case(),
            CaseTransform::UpperCase => input.to_uppercase(),
            CaseTransform::LowerCase => input.to_lowercase(),
        }
    }

    /// Filter name used in templates
    pub fn filter_name(&self) -> &'static str {
        match self {
            CaseTransform::PascalCase => "pascal",
            CaseTransform::CamelCase => "camel",
            CaseTransform::SnakeCase => "snake",
            CaseTransform::KebabCase => "kebab",
            CaseTransform::UpperCase => "upper",
            CaseTransform::LowerCase => "lower",
        }
    }
}

impl FromStr for CaseTransform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pascal" => Ok(CaseTransform::PascalCase),
            "camel" => Ok(CaseTransform::CamelCase),
            "snake" => Ok(CaseTransform::SnakeCase),
            "kebab" => Ok(CaseTransform::KebabCase),
            "upper" => Ok(CaseTransform::UpperCase),
            "lower" => Ok(CaseTransform::LowerCase),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

impl fmt::Display for CaseTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filter_name())
    }
}

/// A parsed `{{ name }}` or `{{ name | filter }}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Variable name
    pub name: String,
    /// Optional case transform
    pub transform: Option<CaseTransform>,
}

/// Result of looking at the inside of a `{{ ... }}` pair
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PlaceholderSyntax {
    /// A well-formed placeholder
    Placeholder(Placeholder),
    /// Looks like a placeholder but names an unknown filter
    BadFilter(String),
    /// Not placeholder syntax at all; left untouched
    Literal,
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Classify the text between `{{` and `}}`
pub(crate) fn parse_placeholder(inner: &str) -> PlaceholderSyntax {
    let (name, filter) = match inner.split_once('|') {
        Some((name, filter)) => (name.trim(), Some(filter.trim())),
        None => (inner.trim(), None),
    };

    if !is_variable_name(name) {
        return PlaceholderSyntax::Literal;
    }

    match filter {
        None => PlaceholderSyntax::Placeholder(Placeholder {
            name: name.to_string(),
            transform: None,
        }),
        Some(filter) if filter.chars().all(|c| c.is_ascii_alphabetic()) && !filter.is_empty() => {
            match filter.parse::<CaseTransform>() {
                Ok(transform) => PlaceholderSyntax::Placeholder(Placeholder {
                    name: name.to_string(),
                    transform: Some(transform),
                }),
                Err(message) => PlaceholderSyntax::BadFilter(message),
            }
        }
        Some(_) => PlaceholderSyntax::Literal,
    }
}
