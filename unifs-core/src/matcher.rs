//! `glob:` and `regex:` path matchers.
//!
//! Backends opt into the path-matcher capability by returning
//! [`StandardPathMatching`] from `Backend::path_matching`.

use regex::Regex;

use crate::error::{Result, UnifsError};
use crate::path::VirtualPath;
use crate::traits::{PathMatcher, PathMatching};

const GLOB_SYNTAX: &str = "glob";
const REGEX_SYNTAX: &str = "regex";

/// Matches the rendered path against a compiled regular expression.
#[derive(Debug, Clone)]
pub struct RegexPathMatcher {
    regex: Regex,
}

impl RegexPathMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| UnifsError::InvalidArgument(format!("invalid pattern: {}", e)))?;
        Ok(Self { regex })
    }

    /// Compiles a glob by translating it to an anchored regular expression.
    pub fn glob(glob: &str) -> Result<Self> {
        Self::new(&glob_to_regex(glob)?)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PathMatcher for RegexPathMatcher {
    fn matches(&self, path: &VirtualPath) -> bool {
        self.regex.is_match(&path.to_string())
    }
}

/// The `glob:` and `regex:` syntaxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPathMatching;

impl PathMatching for StandardPathMatching {
    fn compile(&self, syntax_and_pattern: &str) -> Result<Box<dyn PathMatcher>> {
        let (syntax, pattern) = syntax_and_pattern.split_once(':').ok_or_else(|| {
            UnifsError::InvalidArgument(format!(
                "expected 'syntax:pattern', got '{}'",
                syntax_and_pattern
            ))
        })?;

        let matcher = match syntax.to_ascii_lowercase().as_str() {
            GLOB_SYNTAX => RegexPathMatcher::glob(pattern)?,
            REGEX_SYNTAX => RegexPathMatcher::new(pattern)?,
            other => {
                return Err(UnifsError::InvalidArgument(format!(
                    "unknown pattern syntax '{}'",
                    other
                )))
            }
        };
        Ok(Box::new(matcher))
    }
}

/// Translates a glob into an anchored regular expression.
///
/// `*` and `?` stay within one segment, `**` crosses segments, `[...]` is a
/// character class (`[!...]` negated), `{a,b}` is an alternation and `\`
/// escapes the next character.
pub fn glob_to_regex(glob: &str) -> Result<String> {
    let invalid = |reason: &str| {
        UnifsError::InvalidArgument(format!("invalid glob '{}': {}", glob, reason))
    };

    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();
    let mut in_group = false;

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                out.push_str("[[^/]&&[");
                if chars.peek() == Some(&'!') {
                    chars.next();
                    out.push('^');
                }
                let mut closed = false;
                for c in chars.by_ref() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '/' => return Err(invalid("'/' is not allowed in a class")),
                        '\\' | '[' | '&' | '~' | '^' => {
                            out.push('\\');
                            out.push(c);
                        }
                        _ => out.push(c),
                    }
                }
                if !closed {
                    return Err(invalid("missing ']'"));
                }
                out.push_str("]]");
            }
            '{' => {
                if in_group {
                    return Err(invalid("nested groups are not supported"));
                }
                in_group = true;
                out.push_str("(?:");
            }
            '}' if in_group => {
                in_group = false;
                out.push(')');
            }
            ',' if in_group => out.push('|'),
            '\\' => {
                let escaped = chars.next().ok_or_else(|| invalid("trailing '\\'"))?;
                out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
            }
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    if in_group {
        return Err(invalid("missing '}'"));
    }
    out.push('$');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MountIdentity;

    fn p(text: &str) -> VirtualPath {
        VirtualPath::parse(&MountIdentity::new("mem://a").unwrap(), text)
    }

    fn glob(pattern: &str) -> Box<dyn PathMatcher> {
        StandardPathMatching.compile(&format!("glob:{}", pattern)).unwrap()
    }

    #[test]
    fn test_star_stays_in_segment() {
        let m = glob("/docs/*.txt");
        assert!(m.matches(&p("/docs/a.txt")));
        assert!(!m.matches(&p("/docs/sub/a.txt")));
        assert!(!m.matches(&p("/docs/a.md")));
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let m = glob("/docs/**.txt");
        assert!(m.matches(&p("/docs/sub/deep/a.txt")));
        assert!(!m.matches(&p("/other/a.txt")));
    }

    #[test]
    fn test_question_mark_and_classes() {
        assert!(glob("file?.log").matches(&p("file1.log")));
        assert!(!glob("file?.log").matches(&p("file10.log")));
        assert!(glob("[abc].rs").matches(&p("b.rs")));
        assert!(!glob("[abc].rs").matches(&p("d.rs")));
        assert!(glob("[!abc].rs").matches(&p("d.rs")));
        assert!(glob("[a-c]x").matches(&p("bx")));
    }

    #[test]
    fn test_groups_and_escapes() {
        let m = glob("*.{rs,toml}");
        assert!(m.matches(&p("lib.rs")));
        assert!(m.matches(&p("Cargo.toml")));
        assert!(!m.matches(&p("README.md")));
        assert!(glob("a\\*b").matches(&p("a*b")));
        assert!(!glob("a\\*b").matches(&p("axb")));
        assert!(glob("a.b").matches(&p("a.b")));
        assert!(!glob("a.b").matches(&p("axb")));
    }

    #[test]
    fn test_regex_syntax() {
        let m = StandardPathMatching.compile("regex:^/a/[0-9]+$").unwrap();
        assert!(m.matches(&p("/a/42")));
        assert!(!m.matches(&p("/a/b")));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(StandardPathMatching.compile("no-colon").is_err());
        assert!(StandardPathMatching.compile("fancy:*").is_err());
        assert!(StandardPathMatching.compile("regex:(").is_err());
        assert!(StandardPathMatching.compile("glob:[abc").is_err());
        assert!(StandardPathMatching.compile("glob:{a,b").is_err());
        assert!(StandardPathMatching.compile("glob:{a,{b}}").is_err());
        assert!(StandardPathMatching.compile("glob:[a/b]").is_err());
        assert!(StandardPathMatching.compile("glob:x\\").is_err());
    }
}
