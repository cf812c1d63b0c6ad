//! Template parsing: `{{…}}` tags into a node tree

use super::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    /// `{{path}}` or `{{{path}}}`
    Value(Path),
    Each { path: Path, body: Vec<Node> },
    If {
        path: Path,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Dotted lookup path; an empty segment list means `this`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    pub this: bool,
    pub segments: Vec<String>,
}

impl Path {
    fn parse(raw: &str, offset: usize) -> Result<Self, TemplateError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TemplateError::EmptyTag { offset });
        }
        let mut segments: Vec<&str> = raw.split('.').collect();
        let this = segments[0] == "this";
        if this {
            segments.remove(0);
        }
        let valid = |s: &&str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !segments.iter().all(valid) {
            return Err(TemplateError::BadPath {
                path: raw.to_string(),
                offset,
            });
        }
        Ok(Self {
            this,
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }
}

enum Tag {
    Value(Path),
    OpenEach(Path),
    OpenIf(Path),
    Else,
    Close(String),
}

fn parse_tag(inner: &str, offset: usize) -> Result<Tag, TemplateError> {
    let inner = inner.trim();
    if let Some(block) = inner.strip_prefix('#') {
        let (helper, arg) = block.split_once(char::is_whitespace).unwrap_or((block, ""));
        let path = Path::parse(arg, offset)?;
        return match helper {
            "each" => Ok(Tag::OpenEach(path)),
            "if" => Ok(Tag::OpenIf(path)),
            other => Err(TemplateError::UnknownHelper {
                helper: other.to_string(),
                offset,
            }),
        };
    }
    if let Some(helper) = inner.strip_prefix('/') {
        return Ok(Tag::Close(helper.trim().to_string()));
    }
    if inner == "else" {
        return Ok(Tag::Else);
    }
    Path::parse(inner, offset).map(Tag::Value)
}

/// Block under construction
struct Frame {
    helper: &'static str,
    path: Path,
    offset: usize,
    nodes: Vec<Node>,
    /// Nodes before `{{else}}`, once seen
    then: Option<Vec<Node>>,
}

pub(crate) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut rest = source;
    let mut consumed = 0;

    fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [Frame]) -> &'a mut Vec<Node> {
        match stack.last_mut() {
            Some(frame) => &mut frame.nodes,
            None => root,
        }
    }

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            current(&mut root, &mut stack).push(Node::Text(rest[..start].to_string()));
        }
        let offset = consumed + start;
        let triple = rest[start..].starts_with("{{{");
        let (open, close) = if triple { (3, "}}}") } else { (2, "}}") };
        let after_open = &rest[start + open..];
        let end = after_open
            .find(close)
            .ok_or(TemplateError::Unterminated { offset })?;
        let inner = &after_open[..end];
        let tag = parse_tag(inner, offset)?;
        if triple && !matches!(tag, Tag::Value(_)) {
            return Err(TemplateError::BadPath {
                path: inner.trim().to_string(),
                offset,
            });
        }

        match tag {
            Tag::Value(path) => current(&mut root, &mut stack).push(Node::Value(path)),
            Tag::OpenEach(path) => stack.push(Frame {
                helper: "each",
                path,
                offset,
                nodes: Vec::new(),
                then: None,
            }),
            Tag::OpenIf(path) => stack.push(Frame {
                helper: "if",
                path,
                offset,
                nodes: Vec::new(),
                then: None,
            }),
            Tag::Else => match stack.last_mut() {
                Some(frame) if frame.helper == "if" && frame.then.is_none() => {
                    frame.then = Some(std::mem::take(&mut frame.nodes));
                }
                _ => return Err(TemplateError::StrayElse { offset }),
            },
            Tag::Close(helper) => {
                let frame = stack.pop().ok_or_else(|| TemplateError::Unbalanced {
                    expected: None,
                    found: helper.clone(),
                    offset,
                })?;
                if frame.helper != helper {
                    return Err(TemplateError::Unbalanced {
                        expected: Some(frame.helper.to_string()),
                        found: helper,
                        offset,
                    });
                }
                let node = if frame.helper == "each" {
                    Node::Each {
                        path: frame.path,
                        body: frame.nodes,
                    }
                } else if let Some(then) = frame.then {
                    Node::If {
                        path: frame.path,
                        then,
                        otherwise: frame.nodes,
                    }
                } else {
                    Node::If {
                        path: frame.path,
                        then: frame.nodes,
                        otherwise: Vec::new(),
                    }
                };
                current(&mut root, &mut stack).push(node);
            }
        }

        let tag_len = open + end + close.len();
        consumed += start + tag_len;
        rest = &rest[start + tag_len..];
    }

    if let Some(frame) = stack.pop() {
        return Err(TemplateError::Unclosed {
            helper: frame.helper.to_string(),
            offset: frame.offset,
        });
    }
    if !rest.is_empty() {
        root.push(Node::Text(rest.to_string()));
    }
    Ok(root)
}
