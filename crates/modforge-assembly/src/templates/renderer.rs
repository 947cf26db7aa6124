//! Variable substitution for template-flagged files
//!
//! Syntax:
//! - `{{ name }}` substitutes a variable
//! - `{{ name | filter }}` applies a case filter (`pascal`, `camel`, `snake`,
//!   `kebab`, `upper`, `lower`)
//! - `\{{` renders a literal `{{`
//!
//! Brace pairs whose contents are not placeholder syntax are left untouched.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{AssemblyError, Result};
use crate::models::{FileContents, ProjectTree, SelectionRequest};
use crate::templates::placeholder::{parse_placeholder, PlaceholderSyntax};

/// Built-in variable holding the project name
pub const PROJECT_NAME_VAR: &str = "projectName";
/// Built-in variable holding the author, when one was supplied
pub const AUTHOR_VAR: &str = "author";

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\)?\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"));

/// Output of rendering one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered content
    pub content: String,
    /// Variables that were substituted
    pub placeholders_used: BTreeSet<String>,
    /// Placeholders left in place because no value was supplied
    pub unresolved: Vec<String>,
}

/// Renders templates against a fixed set of variables
///
/// Rendering is pure: the same content and variables always produce the
/// same output, and nothing touches the filesystem.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    variables: BTreeMap<String, String>,
    strict: bool,
}

impl TemplateRenderer {
    /// Create a renderer over explicit variables
    pub fn new(variables: BTreeMap<String, String>, strict: bool) -> Self {
        Self { variables, strict }
    }

    /// Variables of a selection request plus the built-ins
    ///
    /// `projectName` and `author` override same-named request variables.
    pub fn for_request(request: &SelectionRequest, strict: bool) -> Self {
        let mut variables = request.variables.clone();
        variables.insert(PROJECT_NAME_VAR.to_string(), request.project_name.clone());
        if let Some(author) = &request.author {
            variables.insert(AUTHOR_VAR.to_string(), author.clone());
        }
        Self::new(variables, strict)
    }

    /// Whether unresolved placeholders are errors
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Render one file's content; `file` labels errors
    pub fn render(&self, file: &str, content: &str) -> Result<RenderResult> {
        let mut rendered = String::with_capacity(content.len());
        let mut placeholders_used = BTreeSet::new();
        let mut unresolved = Vec::new();
        let mut last = 0;

        for captures in PLACEHOLDER_PATTERN.captures_iter(content) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            rendered.push_str(&content[last..whole.start()]);
            last = whole.end();

            if captures.get(1).is_some() {
                rendered.push_str(&whole.as_str()[1..]);
                continue;
            }

            let inner = captures.get(2).map_or("", |m| m.as_str());
            match parse_placeholder(inner) {
                PlaceholderSyntax::Literal => rendered.push_str(whole.as_str()),
                PlaceholderSyntax::BadFilter(message) => {
                    return Err(AssemblyError::InvalidTemplate {
                        file: file.to_string(),
                        message: format!("{} in '{}'", message, whole.as_str()),
                    });
                }
                PlaceholderSyntax::Placeholder(placeholder) => {
                    match self.variables.get(&placeholder.name) {
                        Some(value) => {
                            let value = match placeholder.transform {
                                Some(transform) => transform.apply(value),
                                None => value.clone(),
                            };
                            rendered.push_str(&value);
                            placeholders_used.insert(placeholder.name);
                        }
                        None if self.strict => {
                            return Err(AssemblyError::UnresolvedVariable {
                                file: file.to_string(),
                                variable: placeholder.name,
                            });
                        }
                        None => {
                            rendered.push_str(whole.as_str());
                            unresolved.push(placeholder.name);
                        }
                    }
                }
            }
        }
        rendered.push_str(&content[last..]);

        Ok(RenderResult {
            content: rendered,
            placeholders_used,
            unresolved,
        })
    }

    /// Render every template-flagged file in the tree
    ///
    /// Non-template files are left as they are. Returns one warning per
    /// placeholder left unresolved in lenient mode.
    pub fn render_all(&self, tree: &mut ProjectTree) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        let mut rendered_files = 0;

        for (path, file) in tree.files_mut() {
            if !file.template {
                continue;
            }
            let FileContents::Text(content) = &mut file.contents else {
                return Err(AssemblyError::InvalidTemplate {
                    file: path.clone(),
                    message: "template is not valid UTF-8".to_string(),
                });
            };

            let result = self.render(path, content)?;
            for variable in &result.unresolved {
                warn!(file = %path, variable = %variable, "Placeholder left unresolved");
                warnings.push(format!("unresolved variable '{}' left in {}", variable, path));
            }
            *content = result.content;
            rendered_files += 1;
        }

        debug!(files = rendered_files, "Rendered templates");
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TreeFile;

    fn renderer(strict: bool) -> TemplateRenderer {
        let request = SelectionRequest::new("base", "shop-api")
            .with_author("Ada")
            .with_variable("description", "An online shop");
        TemplateRenderer::for_request(&request, strict)
    }

    #[test]
    fn test_render_builtins_and_variables() {
        let result = renderer(true)
            .render("README.md", "# {{ projectName }}\n{{description}} by {{ author }}\n")
            .unwrap();
        assert_eq!(result.content, "# shop-api\nAn online shop by Ada\n");
        assert_eq!(
            result.placeholders_used.iter().collect::<Vec<_>>(),
            vec!["author", "description", "projectName"]
        );
    }

    #[test]
    fn test_render_filters() {
        let result = renderer(true)
            .render(
                "src/main.ts",
                "class {{ projectName | pascal }} {} // {{projectName|snake}} {{ projectName | upper }}",
            )
            .unwrap();
        assert_eq!(result.content, "class ShopApi {} // shop_api SHOP-API");
    }

    #[test]
    fn test_builtins_override_request_variables() {
        let request = SelectionRequest::new("base", "real").with_variable("projectName", "spoofed");
        let result = TemplateRenderer::for_request(&request, true)
            .render("a", "{{ projectName }}")
            .unwrap();
        assert_eq!(result.content, "real");
    }

    #[test]
    fn test_strict_mode_fails_on_unknown_variable() {
        let err = renderer(true).render("config.ts", "port = {{ port }}").unwrap_err();
        match err {
            AssemblyError::UnresolvedVariable { file, variable } => {
                assert_eq!(file, "config.ts");
                assert_eq!(variable, "port");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_mode_keeps_placeholder_literal() {
        let result = renderer(false).render("config.ts", "port = {{ port | upper }};").unwrap();
        assert_eq!(result.content, "port = {{ port | upper }};");
        assert_eq!(result.unresolved, vec!["port"]);
    }

    #[test]
    fn test_escape_and_non_placeholder_braces() {
        let result = renderer(true)
            .render("App.tsx", r"<div style={{ color: 'red' }}>\{{ projectName }}</div>")
            .unwrap();
        assert_eq!(result.content, "<div style={{ color: 'red' }}>{{ projectName }}</div>");
    }

    #[test]
    fn test_unknown_filter_is_invalid_template() {
        let err = renderer(true).render("a.ts", "{{ projectName | shout }}").unwrap_err();
        assert_eq!(err.kind(), "invalid_template");
    }

    #[test]
    fn test_render_is_deterministic() {
        let content = "{{ projectName | camel }} {{ description | kebab }}";
        let first = renderer(true).render("a", content).unwrap();
        let second = renderer(true).render("a", content).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_all_skips_plain_files() {
        let mut tree = ProjectTree::new();
        tree.insert("README.md", TreeFile::template("# {{ projectName }}"));
        tree.insert("raw.txt", TreeFile::text("# {{ projectName }}"));

        let warnings = renderer(true).render_all(&mut tree).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(tree.text("README.md"), Some("# shop-api"));
        assert_eq!(tree.text("raw.txt"), Some("# {{ projectName }}"));
    }

    #[test]
    fn test_render_all_collects_lenient_warnings() {
        let mut tree = ProjectTree::new();
        tree.insert(".env.example", TreeFile::template("PORT={{ port }}\n"));

        let warnings = renderer(false).render_all(&mut tree).unwrap();
        assert_eq!(warnings, vec!["unresolved variable 'port' left in .env.example"]);
    }
}
