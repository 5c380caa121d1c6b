//! Markdown term parser.
//!
//! Definitions are headings at the configured level whose whole text is a
//! `[[Name]]` marker. References are `[[Name]]` or `[[Name|shown text]]`
//! anywhere else, except in front matter, fenced code blocks and inline code
//! spans.

use docgraph_core::{
    slugify, Finding, FindingKind, Location, Severity, TermDefinition, TermKind, TermReference,
    TermScope, TermsConfig,
};

mod patterns {
    use std::sync::LazyLock;

    pub static HEADING: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap()
    });

    pub static TERM_HEADING: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^\[\[\s*([^\[\]|]+?)\s*\]\]$").unwrap());

    pub static REFERENCE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"\[\[\s*([^\[\]|\n]+?)\s*(?:\|[^\[\]\n]*)?\]\]").unwrap()
    });

    pub static ATTRIBUTE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"(?i)^\s*[-*]\s+(kind|scope|aliases|related|id)\s*:\s*(.*?)\s*$").unwrap()
    });
}

/// Terms found in one document.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub path: String,
    pub definitions: Vec<TermDefinition>,
    pub references: Vec<TermReference>,
    /// Unreadable attribute values, as warnings.
    pub warnings: Vec<Finding>,
}

/// Extracts term definitions and references from markdown text.
#[derive(Debug, Clone)]
pub struct TermParser {
    config: TermsConfig,
}

impl TermParser {
    pub fn new(config: &TermsConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Parse one document. Never fails; bad attribute values become warnings.
    pub fn parse(&self, path: &str, text: &str) -> ParsedDocument {
        let mut doc = ParsedDocument {
            path: path.to_string(),
            ..ParsedDocument::default()
        };

        let lines: Vec<&str> = text.lines().collect();
        let body_start = front_matter_end(&lines).map_or(0, |end| end + 1);
        let default_scope = self.config.scope_for(path);

        let mut fence: Option<(u8, usize)> = None;
        let mut open: Option<OpenDefinition> = None;

        for (idx, &line) in lines.iter().enumerate().skip(body_start) {
            let line_no = idx + 1;

            if let Some((ch, len)) = fence {
                if fence_marker(line).is_some_and(|(c, n, rest)| c == ch && n >= len && rest.is_empty()) {
                    fence = None;
                }
                continue;
            }
            if let Some((ch, len, _)) = fence_marker(line) {
                fence = Some((ch, len));
                continue;
            }

            if let Some(caps) = patterns::HEADING.captures(line) {
                if let Some(finished) = open.take() {
                    doc.definitions.push(finished.finish());
                }
                let level = caps[1].len();
                let heading = caps[2].trim();
                if level == self.config.definition_heading_level {
                    if let Some(term) = patterns::TERM_HEADING.captures(heading) {
                        let name = term[1].to_string();
                        open = Some(OpenDefinition::new(name, path, line_no, default_scope));
                        continue;
                    }
                }
                scan_references(line, path, line_no, &mut doc.references);
                continue;
            }

            if let Some(current) = open.as_mut() {
                if let Some(attr) = patterns::ATTRIBUTE.captures(line) {
                    let key = attr[1].to_lowercase();
                    if let Err(message) = current.apply(&key, &attr[2]) {
                        doc.warnings.push(
                            Finding::new(FindingKind::MalformedMetadata, Severity::Warning, message)
                                .at(Location::new(path, line_no)),
                        );
                    }
                    continue;
                }
                current.body.push(line);
            }

            scan_references(line, path, line_no, &mut doc.references);
        }

        if let Some(finished) = open.take() {
            doc.definitions.push(finished.finish());
        }

        doc
    }
}

struct OpenDefinition<'a> {
    def: TermDefinition,
    explicit_id: bool,
    body: Vec<&'a str>,
}

impl<'a> OpenDefinition<'a> {
    fn new(name: String, path: &str, line: usize, scope: TermScope) -> Self {
        Self {
            def: TermDefinition {
                id: slugify(&name),
                name,
                kind: TermKind::default(),
                scope,
                aliases: Vec::new(),
                related: Vec::new(),
                definition: String::new(),
                file: path.to_string(),
                line,
            },
            explicit_id: false,
            body: Vec::new(),
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "kind" => {
                self.def.kind = value
                    .parse()
                    .map_err(|_| format!("unknown term kind '{value}' for [[{}]]", self.def.name))?;
            }
            "scope" => {
                self.def.scope = value
                    .parse()
                    .map_err(|_| format!("unknown term scope '{value}' for [[{}]]", self.def.name))?;
            }
            "aliases" => {
                self.def.aliases.extend(split_list(value));
            }
            "related" => {
                let marked: Vec<String> = patterns::REFERENCE
                    .captures_iter(value)
                    .map(|c| c[1].to_string())
                    .collect();
                if marked.is_empty() {
                    self.def.related.extend(split_list(value));
                } else {
                    self.def.related.extend(marked);
                }
            }
            "id" => {
                if value.is_empty() {
                    return Err(format!("empty id for [[{}]]", self.def.name));
                }
                self.def.id = value.to_string();
                self.explicit_id = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> TermDefinition {
        self.def.definition = self
            .body
            .iter()
            .flat_map(|line| line.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        if !self.explicit_id && self.def.id.is_empty() {
            self.def.id = self.def.name.to_lowercase();
        }
        self.def
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|item| item.trim().trim_start_matches("[[").trim_end_matches("]]").trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

/// Index of the closing `---` line when the text opens with front matter.
fn front_matter_end(lines: &[&str]) -> Option<usize> {
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| matches!(l.trim_end(), "---" | "..."))
        .map(|(idx, _)| idx)
}

/// Fence character, run length and the text after the run.
fn fence_marker(line: &str) -> Option<(u8, usize, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = *trimmed.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let run = trimmed.bytes().take_while(|&b| b == ch).count();
    if run < 3 {
        return None;
    }
    Some((ch, run, trimmed[run..].trim()))
}

/// Blank out inline code spans, keeping byte offsets intact.
///
/// A span opens with a run of N backticks and closes at the next run of
/// exactly N. An unmatched run is literal text.
fn mask_inline_code(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut masked = String::with_capacity(line.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        let run = i - start;

        let mut j = i;
        let mut close = None;
        while j < bytes.len() {
            if bytes[j] != b'`' {
                j += 1;
                continue;
            }
            let run_start = j;
            while j < bytes.len() && bytes[j] == b'`' {
                j += 1;
            }
            if j - run_start == run {
                close = Some(j);
                break;
            }
        }

        if let Some(end) = close {
            masked.push_str(&line[copied..start]);
            masked.extend(std::iter::repeat(' ').take(end - start));
            copied = end;
            i = end;
        }
    }

    masked.push_str(&line[copied..]);
    masked
}

fn scan_references(line: &str, path: &str, line_no: usize, out: &mut Vec<TermReference>) {
    if !line.contains("[[") {
        return;
    }
    let masked = mask_inline_code(line);
    for caps in patterns::REFERENCE.captures_iter(&masked) {
        out.push(TermReference {
            text: caps[1].to_string(),
            canonical: None,
            file: path.to_string(),
            line: line_no,
            context: line.trim().to_string(),
        });
    }
}
