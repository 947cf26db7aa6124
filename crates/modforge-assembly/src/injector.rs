//! Anchor-based code injection into shared project files
//!
//! Every directive inserts its lines directly above the line holding the
//! first occurrence of its marker. Modules applied later therefore end up
//! nearer the marker, and the top-to-bottom order of injected blocks equals
//! the application order.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{AssemblyError, Result};
use crate::models::{AnchorDirective, FileContents, ModuleManifest, ProjectTree};

/// Identity of an applied directive within one run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AppliedDirective {
    module: String,
    file: String,
    marker: String,
    lines: Vec<String>,
}

/// Applies injection directives to a project tree
///
/// One injector belongs to exactly one assembly run; its ledger keeps a
/// directive from being applied twice in that run.
#[derive(Debug, Default)]
pub struct CodeInjector {
    applied: HashSet<AppliedDirective>,
}

impl CodeInjector {
    /// Create an injector with an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every module's directives, in the given application order
    pub fn apply_all(&mut self, modules: &[&ModuleManifest], tree: &mut ProjectTree) -> Result<usize> {
        let mut applied = 0;
        for module in modules {
            applied += self.apply_module(module, tree)?;
        }
        Ok(applied)
    }

    /// Apply one module's directives; returns how many were applied
    pub fn apply_module(&mut self, module: &ModuleManifest, tree: &mut ProjectTree) -> Result<usize> {
        let mut applied = 0;
        for directive in module.directives() {
            if self.apply(&module.name, directive, tree)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Apply a single directive
    ///
    /// Returns `false` when the same directive was already applied in this run.
    pub fn apply(
        &mut self,
        module: &str,
        directive: &AnchorDirective,
        tree: &mut ProjectTree,
    ) -> Result<bool> {
        let key = AppliedDirective {
            module: module.to_string(),
            file: directive.target_file.clone(),
            marker: directive.anchor_marker.clone(),
            lines: directive.lines.clone(),
        };
        if self.applied.contains(&key) {
            debug!(
                module,
                file = %directive.target_file,
                kind = %directive.kind,
                "Directive already applied, skipping"
            );
            return Ok(false);
        }

        let anchor_not_found = || AssemblyError::AnchorNotFound {
            module: module.to_string(),
            file: directive.target_file.clone(),
            marker: directive.anchor_marker.clone(),
        };

        let file = tree
            .get_mut(&directive.target_file)
            .ok_or_else(anchor_not_found)?;
        let FileContents::Text(content) = &mut file.contents else {
            return Err(anchor_not_found());
        };
        let injected = inject_before_marker(content, &directive.anchor_marker, &directive.lines)
            .ok_or_else(anchor_not_found)?;
        *content = injected;

        debug!(
            module,
            file = %directive.target_file,
            kind = %directive.kind,
            lines = directive.lines.len(),
            "Applied directive"
        );
        self.applied.insert(key);
        Ok(true)
    }
}

/// Insert `lines` above the line containing the first `marker`
///
/// Each line takes the marker line's indentation and the file's line ending.
/// Returns `None` when the marker is empty or does not occur.
pub fn inject_before_marker(content: &str, marker: &str, lines: &[String]) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    let position = content.find(marker)?;
    let line_start = content[..position].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &content[line_start..position];
    let indent = &prefix[..prefix.len() - prefix.trim_start().len()];
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };

    let mut block = String::new();
    for line in lines {
        if !line.is_empty() {
            block.push_str(indent);
            block.push_str(line);
        }
        block.push_str(newline);
    }

    let mut result = String::with_capacity(content.len() + block.len());
    result.push_str(&content[..line_start]);
    result.push_str(&block);
    result.push_str(&content[line_start..]);
    Some(result)
}
