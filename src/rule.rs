//! Style rules: named line-sequence transformations.
//!
//! A rule sees every added line of one file at once, so it can keep state
//! across lines, and must answer with a sequence of the same length. Rules are
//! either arbitrary transforms or declarative search/replace pairs; both are
//! normalized into [`Behavior`] and applied through [`Rule::apply`].

use error_set::error_set;
use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use std::fmt;

error_set! {
    /// Errors raised by a rule's transform
    RuleError := {
        #[display("{message}")]
        Failed { message: String },
    }

    /// Errors from building a rule
    RuleBuildError := {
        #[display("Invalid glob '{pattern}': {message}")]
        InvalidGlob { pattern: String, message: String },
        #[display("Invalid regex '{pattern}': {message}")]
        InvalidRegex { pattern: String, message: String },
    }
}

/// What a rule knows about the file it is running on.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Repository-relative path of the file
    pub path: &'a str,
}

/// Output of a transform: `None` means the rule suggests no changes at all.
pub type TransformResult = Result<Option<Vec<String>>, RuleError>;

type TransformFn = dyn Fn(&[String], &RuleContext<'_>) -> TransformResult;

/// How a rule rewrites lines.
pub enum Behavior {
    /// Arbitrary transform over the whole line sequence
    Transform(Box<TransformFn>),
    /// Regex substitution on each line independently
    SearchReplace {
        pattern: Regex,
        replacement: String,
        /// Replace every match instead of only the first
        all: bool,
    },
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Transform(_) => f.write_str("Transform(..)"),
            Behavior::SearchReplace {
                pattern,
                replacement,
                all,
            } => f
                .debug_struct("SearchReplace")
                .field("pattern", &pattern.as_str())
                .field("replacement", replacement)
                .field("all", all)
                .finish(),
        }
    }
}

/// A named style rule, optionally restricted to paths matching a glob.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    applies_to: Option<GlobMatcher>,
    behavior: Behavior,
}

impl Rule {
    /// A rule backed by an arbitrary transform.
    pub fn transform<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&[String], &RuleContext<'_>) -> TransformResult + 'static,
    {
        Self {
            name: name.into(),
            applies_to: None,
            behavior: Behavior::Transform(Box::new(transform)),
        }
    }

    /// A rule replacing `pattern` with `replacement` on each line.
    ///
    /// `replacement` may reference capture groups as `$1` or `${name}`.
    pub fn search_replace(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
        all: bool,
    ) -> Result<Self, RuleBuildError> {
        let pattern = Regex::new(pattern).map_err(|e| RuleBuildError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name: name.into(),
            applies_to: None,
            behavior: Behavior::SearchReplace {
                pattern,
                replacement: replacement.into(),
                all,
            },
        })
    }

    /// Restrict the rule to paths matching `pattern`.
    ///
    /// `*` stays within one path component, `**` crosses directories.
    pub fn applies_to(mut self, pattern: &str) -> Result<Self, RuleBuildError> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| RuleBuildError::InvalidGlob {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        self.applies_to = Some(glob.compile_matcher());
        Ok(self)
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Whether the rule should run on `path`
    pub fn matches(&self, path: &str) -> bool {
        self.applies_to
            .as_ref()
            .is_none_or(|glob| glob.is_match(path))
    }

    /// Run the rule over one file's added lines.
    pub fn apply(&self, lines: &[String], context: &RuleContext<'_>) -> TransformResult {
        match &self.behavior {
            Behavior::Transform(transform) => transform(lines, context),
            Behavior::SearchReplace {
                pattern,
                replacement,
                all,
            } => Ok(Some(
                lines
                    .iter()
                    .map(|line| {
                        let replaced = if *all {
                            pattern.replace_all(line, replacement.as_str())
                        } else {
                            pattern.replace(line, replacement.as_str())
                        };
                        replaced.into_owned()
                    })
                    .collect(),
            )),
        }
    }
}

/// Transforms that ship with the tool, addressable by name from configuration.
pub mod builtin {
    use super::{Rule, RuleContext, TransformResult};

    pub const TRIM_TRAILING_WHITESPACE: &str = "trim-trailing-whitespace";
    pub const EXPAND_LEADING_TABS: &str = "expand-leading-tabs";
    pub const FUNCTION_SPACER: &str = "function-spacer";

    pub const ALL: [&str; 3] = [TRIM_TRAILING_WHITESPACE, EXPAND_LEADING_TABS, FUNCTION_SPACER];

    pub const DEFAULT_TAB_WIDTH: usize = 2;

    /// Build the built-in transform `id` under the rule name `name`.
    pub fn lookup(id: &str, name: &str, tab_width: Option<usize>) -> Option<Rule> {
        let rule = match id {
            TRIM_TRAILING_WHITESPACE => Rule::transform(name, trim_trailing_whitespace),
            EXPAND_LEADING_TABS => {
                let width = tab_width.unwrap_or(DEFAULT_TAB_WIDTH);
                Rule::transform(name, move |lines: &[String], _: &RuleContext<'_>| {
                    expand_leading_tabs(lines, width)
                })
            }
            FUNCTION_SPACER => Rule::transform(name, function_spacer),
            _ => return None,
        };
        Some(rule)
    }

    fn trim_trailing_whitespace(lines: &[String], _: &RuleContext<'_>) -> TransformResult {
        Ok(Some(lines.iter().map(|l| l.trim_end().to_string()).collect()))
    }

    fn expand_leading_tabs(lines: &[String], width: usize) -> TransformResult {
        Ok(Some(
            lines
                .iter()
                .map(|line| {
                    let body = line.trim_start_matches('\t');
                    let tabs = line.len() - body.len();
                    format!("{}{}", " ".repeat(tabs * width), body)
                })
                .collect(),
        ))
    }

    fn function_spacer(lines: &[String], _: &RuleContext<'_>) -> TransformResult {
        Ok(Some(
            lines
                .iter()
                .map(|line| line.replacen("function(", "function (", 1))
                .collect(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    const CTX: RuleContext<'static> = RuleContext { path: "src/app.js" };

    #[test]
    fn search_replace_first_match_only() {
        let rule = Rule::search_replace("no-debugger", r"\s*debugger;\s*", "", false).unwrap();
        let out = rule
            .apply(&lines(&["a(); debugger; debugger;", "ok"]), &CTX)
            .unwrap()
            .unwrap();
        assert_eq!(out, lines(&["a();debugger;", "ok"]));
    }

    #[test]
    fn search_replace_all_with_captures() {
        let rule = Rule::search_replace("quotes", r#""(\w+)""#, "'$1'", true).unwrap();
        let out = rule
            .apply(&lines(&[r#"x("a", "b")"#]), &CTX)
            .unwrap()
            .unwrap();
        assert_eq!(out, lines(&["x('a', 'b')"]));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let result = Rule::search_replace("broken", "(", "", false);
        assert!(matches!(result, Err(RuleBuildError::InvalidRegex { .. })));
    }

    #[test]
    fn glob_star_does_not_cross_directories() {
        let rule = Rule::transform("x", |l: &[String], _: &RuleContext<'_>| Ok(Some(l.to_vec())))
            .applies_to("*.js")
            .unwrap();
        assert!(rule.matches("foo.js"));
        assert!(!rule.matches("bar.md"));
        assert!(!rule.matches("src/foo.js"));
    }

    #[test]
    fn glob_double_star_matches_any_depth() {
        let rule = Rule::search_replace("x", "a", "b", false)
            .unwrap()
            .applies_to("**/*.js")
            .unwrap();
        assert!(rule.matches("foo.js"));
        assert!(rule.matches("src/deep/foo.js"));
        assert!(!rule.matches("src/foo.jsx"));
    }

    #[test]
    fn unrestricted_rule_matches_everything() {
        let rule = builtin::lookup(builtin::FUNCTION_SPACER, "spacer", None).unwrap();
        assert!(rule.matches("README.md"));
    }

    #[test]
    fn transform_sees_path_and_all_lines() {
        let rule = Rule::transform("count", |l: &[String], ctx: &RuleContext<'_>| {
            Ok(Some(
                l.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{}:{}:{}", ctx.path, i, s))
                    .collect(),
            ))
        });
        let out = rule.apply(&lines(&["a", "b"]), &CTX).unwrap().unwrap();
        assert_eq!(out, lines(&["src/app.js:0:a", "src/app.js:1:b"]));
    }

    #[test]
    fn trim_trailing_whitespace_builtin() {
        let rule = builtin::lookup(builtin::TRIM_TRAILING_WHITESPACE, "trim", None).unwrap();
        let out = rule
            .apply(&lines(&["  foo   ", "bar\t", ""]), &CTX)
            .unwrap()
            .unwrap();
        assert_eq!(out, lines(&["  foo", "bar", ""]));
    }

    #[test]
    fn expand_leading_tabs_builtin() {
        let rule = builtin::lookup(builtin::EXPAND_LEADING_TABS, "tabs", Some(4)).unwrap();
        let out = rule
            .apply(&lines(&["\t\tx\ty", "no tabs"]), &CTX)
            .unwrap()
            .unwrap();
        assert_eq!(out, lines(&["        x\ty", "no tabs"]));
    }

    #[test]
    fn function_spacer_builtin() {
        let rule = builtin::lookup(builtin::FUNCTION_SPACER, "spacer", None).unwrap();
        let out = rule
            .apply(&lines(&["var f = function(a) { return function(b) {}; };"]), &CTX)
            .unwrap()
            .unwrap();
        assert_eq!(
            out,
            lines(&["var f = function (a) { return function(b) {}; };"])
        );
    }

    #[test]
    fn unknown_builtin() {
        assert!(builtin::lookup("no-such-rule", "x", None).is_none());
    }
}
