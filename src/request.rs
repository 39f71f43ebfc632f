//! Normalized repository request built from the form.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier used by the form for "no template".
pub const NONE_IDENTIFIER: &str = "none";

/// Repository visibility on the hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Public => Self::Private,
            Self::Private => Self::Public,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A .gitignore or license template selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateChoice {
    None,
    Named(String),
}

impl TemplateChoice {
    /// Parse a form identifier. `"none"` (any case) or an empty string is no template;
    /// anything else is lowercased.
    pub fn from_identifier(identifier: &str) -> Self {
        let trimmed = identifier.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NONE_IDENTIFIER) {
            Self::None
        } else {
            Self::Named(trimmed.to_lowercase())
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::None => NONE_IDENTIFIER,
            Self::Named(name) => name,
        }
    }
}

/// Errors raised while building a request from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Repository name is required")]
    EmptyName,
}

/// Normalize a repository name: trim the ends, then collapse each whitespace run to `-`.
pub fn normalize_repo_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Repository parameters sent to the generator. The name is always non-empty and hyphenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRequest {
    name: String,
    pub description: String,
    pub visibility: Visibility,
    pub include_readme: bool,
    pub gitignore_template: TemplateChoice,
    pub license_template: TemplateChoice,
}

impl RepoRequest {
    /// Build a request with default options for everything but the name.
    pub fn new(name: &str) -> Result<Self, RequestError> {
        let name = normalize_repo_name(name);
        if name.is_empty() {
            return Err(RequestError::EmptyName);
        }
        Ok(Self {
            name,
            description: String::new(),
            visibility: Visibility::default(),
            include_readme: true,
            gitignore_template: TemplateChoice::None,
            license_template: TemplateChoice::None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_readme(mut self, include_readme: bool) -> Self {
        self.include_readme = include_readme;
        self
    }

    pub fn with_gitignore(mut self, identifier: &str) -> Self {
        self.gitignore_template = TemplateChoice::from_identifier(identifier);
        self
    }

    pub fn with_license(mut self, identifier: &str) -> Self {
        self.license_template = TemplateChoice::from_identifier(identifier);
        self
    }
}
