//! Directive grammars embedded in documentation comments.
//!
//! A directive is a single doc line such as `openapi:tag entities`. Each
//! family of directives is an ordered [`DirectiveTable`]; a line is tested
//! against the rules in order and the first rule that matches produces a
//! typed directive. Lines matching no rule are ordinary description text.

use crate::document::{ParameterLocation, ResponseKey};
use log::warn;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

/// Anything shaped like `word:word...` is treated as a directive line and
/// kept out of description text, even if no grammar accepts it.
static DIRECTIVE_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+:[a-z0-9]").unwrap());

static OPERATION_BINDING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^openapi:operation (\S+) (\S+)$").unwrap());

static SPEC_DIRECTIVES: LazyLock<DirectiveTable<SpecDirective>> = LazyLock::new(|| {
    DirectiveTable::new(vec![DirectiveRule::new(
        "info",
        r"^openapi:info (\S+)$",
        |caps| {
            Some(SpecDirective::Info {
                version: caps[1].to_string(),
            })
        },
    )])
});

static SCHEMA_DIRECTIVES: LazyLock<DirectiveTable<SchemaDirective>> = LazyLock::new(|| {
    DirectiveTable::new(vec![
        DirectiveRule::new("component", r"^openapi:component schema (\w+)$", |caps| {
            Some(SchemaDirective::Component {
                id: caps[1].to_string(),
            })
        }),
        DirectiveRule::new("example", r"^(?:openapi|schema):example (.*)$", |caps| {
            Some(SchemaDirective::Example(caps[1].to_string()))
        }),
        DirectiveRule::new("format", r"^(?:openapi|schema):format (.*)$", |caps| {
            Some(SchemaDirective::Format(caps[1].to_string()))
        }),
        DirectiveRule::new("default", r"^(?:openapi|schema):default (.*)$", |caps| {
            Some(SchemaDirective::Default(caps[1].to_string()))
        }),
    ])
});

static OPERATION_DIRECTIVES: LazyLock<DirectiveTable<OperationDirective>> = LazyLock::new(|| {
    DirectiveTable::new(vec![
        DirectiveRule::new(
            "parameter",
            r#"^openapi:parameter (\w+) (path|query) (\w+)(?:/(\S+))?(?: "([^"]+)")?$"#,
            |caps| {
                let location = match &caps[2] {
                    "path" => ParameterLocation::Path,
                    _ => ParameterLocation::Query,
                };
                Some(OperationDirective::Parameter {
                    name: caps[1].to_string(),
                    location,
                    typed: TypedAs::from_captures(caps, 3, 4),
                    description: optional(caps, 5),
                })
            },
        ),
        DirectiveRule::new("tag", r"^openapi:tag (\w+)$", |caps| {
            Some(OperationDirective::Tag(caps[1].to_string()))
        }),
        DirectiveRule::new(
            "response",
            r#"^openapi:response (default|[0-9]{3})(?: "([^"]+)")?$"#,
            |caps| {
                Some(OperationDirective::Response {
                    key: ResponseKey::parse(&caps[1])?,
                    description: optional(caps, 2),
                })
            },
        ),
        DirectiveRule::new(
            "responseContent",
            r"^openapi:responseContent (default|[0-9]{3}) (\S+) (\w+)$",
            |caps| {
                Some(OperationDirective::ResponseContent {
                    key: ResponseKey::parse(&caps[1])?,
                    media_type: caps[2].to_string(),
                    schema_id: caps[3].to_string(),
                })
            },
        ),
        DirectiveRule::new(
            "responseHeader",
            r#"^openapi:responseHeader (default|[0-9]{3}) (\S+) (\w+)(?:/(\S+))?(?: "([^"]+)")?$"#,
            |caps| {
                Some(OperationDirective::ResponseHeader {
                    key: ResponseKey::parse(&caps[1])?,
                    name: caps[2].to_string(),
                    typed: TypedAs::from_captures(caps, 3, 4),
                    description: optional(caps, 5),
                })
            },
        ),
        DirectiveRule::new(
            "responseExample",
            r"^openapi:responseExample (default|[0-9]{3}) (\S+) (\S+)$",
            |caps| {
                Some(OperationDirective::ResponseExample {
                    key: ResponseKey::parse(&caps[1])?,
                    media_type: caps[2].to_string(),
                    file: caps[3].to_string(),
                })
            },
        ),
        DirectiveRule::new(
            "requestBody",
            r#"^openapi:requestBody (\S+) (\w+)(?: (true|false))?(?: "([^"]+)")?$"#,
            |caps| {
                Some(OperationDirective::RequestBody {
                    media_type: caps[1].to_string(),
                    schema_id: caps[2].to_string(),
                    required: caps.get(3).map_or(true, |m| m.as_str() == "true"),
                    description: optional(caps, 4),
                })
            },
        ),
    ])
});

/// One grammar of a directive family.
pub struct DirectiveRule<T> {
    name: &'static str,
    pattern: Regex,
    build: fn(&Captures) -> Option<T>,
}

impl<T> DirectiveRule<T> {
    /// Panics on an invalid pattern.
    fn new(name: &'static str, pattern: &str, build: fn(&Captures) -> Option<T>) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            build,
        }
    }
}

/// An ordered list of grammars for one directive family.
pub struct DirectiveTable<T> {
    rules: Vec<DirectiveRule<T>>,
}

impl<T> DirectiveTable<T> {
    pub fn new(rules: Vec<DirectiveRule<T>>) -> Self {
        Self { rules }
    }

    /// Parses `line` with the first rule whose pattern matches and whose
    /// builder accepts the captures. Never fails; `None` means plain text.
    pub fn parse(&self, line: &str) -> Option<T> {
        let line = line.trim();
        self.rules.iter().find_map(|rule| {
            let caps = rule.pattern.captures(line)?;
            (rule.build)(&caps)
        })
    }

    #[cfg(test)]
    fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }
}

/// Directives found in file-level documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecDirective {
    Info { version: String },
}

/// Directives on type declarations and struct fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDirective {
    Component { id: String },
    Example(String),
    Format(String),
    Default(String),
}

/// Directives that shape an operation, applied in textual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationDirective {
    Parameter {
        name: String,
        location: ParameterLocation,
        typed: TypedAs,
        description: Option<String>,
    },
    Tag(String),
    Response {
        key: ResponseKey,
        description: Option<String>,
    },
    ResponseContent {
        key: ResponseKey,
        media_type: String,
        schema_id: String,
    },
    ResponseHeader {
        key: ResponseKey,
        name: String,
        typed: TypedAs,
        description: Option<String>,
    },
    ResponseExample {
        key: ResponseKey,
        media_type: String,
        file: String,
    },
    RequestBody {
        media_type: String,
        schema_id: String,
        required: bool,
        description: Option<String>,
    },
}

/// `<type>[/<format>]` as written in parameter and header directives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedAs {
    pub type_name: String,
    pub format: Option<String>,
}

impl TypedAs {
    fn from_captures(caps: &Captures, type_group: usize, format_group: usize) -> Self {
        Self {
            type_name: caps[type_group].to_string(),
            format: optional(caps, format_group),
        }
    }
}

/// Path and method named by an `openapi:operation` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBinding {
    pub path: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
    ];

    /// Case-insensitive lookup in the fixed verb table.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(token))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

fn optional(caps: &Captures, group: usize) -> Option<String> {
    caps.get(group).map(|m| m.as_str().to_string())
}

/// Returns true if the line is a directive rather than description text.
pub fn is_directive_line(line: &str) -> bool {
    DIRECTIVE_LINE_REGEX.is_match(line.trim())
}

pub fn parse_spec_directive(line: &str) -> Option<SpecDirective> {
    SPEC_DIRECTIVES.parse(line)
}

pub fn parse_schema_directive(line: &str) -> Option<SchemaDirective> {
    SCHEMA_DIRECTIVES.parse(line)
}

pub fn parse_operation_directive(line: &str) -> Option<OperationDirective> {
    OPERATION_DIRECTIVES.parse(line)
}

/// Parses an `openapi:operation <path> <method>` line.
///
/// Returns `None` for any other line. A well-formed line naming a verb
/// outside the supported set is logged and also yields `None`, so the
/// operation it would have introduced is dropped.
pub fn parse_operation_binding(line: &str) -> Option<OperationBinding> {
    let caps = OPERATION_BINDING_REGEX.captures(line.trim())?;
    match HttpMethod::parse(&caps[2]) {
        Some(method) => Some(OperationBinding {
            path: caps[1].to_string(),
            method,
        }),
        None => {
            warn!(
                "Unsupported HTTP method '{}' for path {}, operation dropped",
                &caps[2], &caps[1]
            );
            None
        }
    }
}
