//! Route pattern parsing
//!
//! A route pattern is a slash-delimited template. Segments are either literal
//! text or a variable (`$name`), optionally constrained to an enumerated set
//! of values (`$name[val1,val2]`).

use std::fmt;

/// One segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed text, matched verbatim
    Literal(String),
    /// Variable segment, bound to the request segment on match
    Variable {
        /// Parameter name, without the `$` prefix or `[...]` suffix
        name: String,
        /// Enumerated values the request segment must be one of, if any
        allowed: Option<Vec<String>>,
    },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let Some(var) = raw.strip_prefix('$') else {
            return Self::Literal(raw.to_string());
        };

        match var.split_once('[') {
            Some((name, rest)) => {
                let values = rest.trim_end_matches(']');
                let allowed = values
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect::<Vec<_>>();
                Self::Variable {
                    name: name.to_string(),
                    allowed: if allowed.is_empty() { None } else { Some(allowed) },
                }
            }
            None => Self::Variable {
                name: var.to_string(),
                allowed: None,
            },
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{text}"),
            Self::Variable { name, allowed } => match allowed {
                Some(values) => write!(f, "${name}[{}]", values.join(",")),
                None => write!(f, "${name}"),
            },
        }
    }
}

/// A parsed route pattern
///
/// # Examples
/// ```
/// use polyhost::routing::RoutePattern;
///
/// let pattern = RoutePattern::parse("/lang/$code[en,nl]");
/// assert_eq!(pattern.len(), 2);
/// assert_eq!(pattern.to_string(), "/lang/$code[en,nl]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a slash-delimited pattern. Leading and trailing slashes are not
    /// significant; any text is a valid pattern.
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .trim_matches('/')
            .split('/')
            .filter(|part| !part.is_empty())
            .map(Segment::parse)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Match against request path segments.
    ///
    /// Returns the specificity score (count of literal segments matched) on a
    /// full match, or `None` when any segment disagrees or the lengths
    /// differ. A variable with an enumerated value list rejects the whole
    /// pattern when the request segment is not among the allowed values.
    pub fn match_segments(&self, request: &[&str]) -> Option<usize> {
        if self.segments.len() != request.len() {
            return None;
        }

        let mut specificity = 0;
        for (segment, value) in self.segments.iter().zip(request) {
            match segment {
                Segment::Literal(text) => {
                    if text != value {
                        return None;
                    }
                    specificity += 1;
                }
                Segment::Variable { allowed, .. } => {
                    if let Some(values) = allowed {
                        if !values.iter().any(|v| v == value) {
                            return None;
                        }
                    }
                    // Variables never count towards specificity
                }
            }
        }

        Some(specificity)
    }

    /// Bind the variable segments of this pattern to the request segments.
    ///
    /// Only meaningful for a pattern that matched the same segments.
    pub fn bind<'a>(&'a self, request: &[&str]) -> Vec<(&'a str, String)> {
        self.segments
            .iter()
            .zip(request)
            .filter_map(|(segment, value)| match segment {
                Segment::Variable { name, .. } => Some((name.as_str(), (*value).to_string())),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literals_and_variables() {
        let pattern = RoutePattern::parse("/blog/$id");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("blog".to_string()),
                Segment::Variable {
                    name: "id".to_string(),
                    allowed: None
                }
            ]
        );
    }

    #[test]
    fn parse_enumerated_values() {
        let pattern = RoutePattern::parse("/lang/$code[en,nl]");
        assert_eq!(
            pattern.segments()[1],
            Segment::Variable {
                name: "code".to_string(),
                allowed: Some(vec!["en".to_string(), "nl".to_string()])
            }
        );
    }

    #[test]
    fn empty_value_list_matches_anything() {
        let pattern = RoutePattern::parse("/x/$v[]");
        assert_eq!(pattern.match_segments(&["x", "whatever"]), Some(1));
    }

    #[test]
    fn match_counts_literals_only() {
        let pattern = RoutePattern::parse("/user/$id/edit");
        assert_eq!(pattern.match_segments(&["user", "42", "edit"]), Some(2));
    }

    #[test]
    fn length_mismatch_rejects() {
        let pattern = RoutePattern::parse("/user/$id");
        assert_eq!(pattern.match_segments(&["user"]), None);
        assert_eq!(pattern.match_segments(&["user", "42", "extra"]), None);
    }

    #[test]
    fn enumerated_value_rejects_whole_pattern() {
        let pattern = RoutePattern::parse("/lang/$code[en,nl]");
        assert_eq!(pattern.match_segments(&["lang", "en"]), Some(1));
        assert_eq!(pattern.match_segments(&["lang", "fr"]), None);
    }

    #[test]
    fn bind_strips_variable_decorations() {
        let pattern = RoutePattern::parse("/lang/$code[en,nl]/$page");
        let bound = pattern.bind(&["lang", "nl", "3"]);
        assert_eq!(
            bound,
            vec![("code", "nl".to_string()), ("page", "3".to_string())]
        );
    }

    #[test]
    fn display_round_trips() {
        for raw in ["/blog/$id", "/lang/$code[en,nl]", "/a/b/c", "/"] {
            assert_eq!(RoutePattern::parse(raw).to_string(), raw);
        }
    }
}
