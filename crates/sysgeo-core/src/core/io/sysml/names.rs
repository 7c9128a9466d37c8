use phf::{Set, phf_set};
use std::borrow::Cow;

static RESERVED_KEYWORDS: Set<&'static str> = phf_set! {
    "about", "abstract", "accept", "action", "actor", "after", "alias", "all", "allocate",
    "allocation", "analysis", "and", "as", "assert", "assign", "assume", "at", "attribute",
    "bind", "binding", "by", "calc", "case", "comment", "concern", "connect", "connection",
    "constant", "constraint", "crosses", "decide", "def", "default", "defined", "dependency",
    "derived", "do", "doc", "else", "end", "entry", "enum", "event", "exhibit", "exit", "expose",
    "false", "filter", "first", "flow", "for", "fork", "frame", "from", "hastype", "if",
    "implies", "import", "in", "include", "individual", "inout", "interface", "istype", "item",
    "join", "language", "library", "locale", "loop", "merge", "message", "meta", "metadata",
    "new", "nonunique", "not", "null", "objective", "occurrence", "of", "or", "ordered", "out",
    "package", "parallel", "part", "perform", "port", "private", "protected", "public",
    "redefines", "ref", "references", "render", "rendering", "rep", "require", "requirement",
    "return", "satisfy", "send", "snapshot", "specializes", "stakeholder", "standard", "state",
    "subject", "subsets", "succession", "terminate", "then", "timeslice", "to", "transition",
    "true", "until", "use", "variant", "variation", "verification", "verify", "via", "view",
    "viewpoint", "when", "while", "xor",
};

pub fn is_reserved(word: &str) -> bool {
    RESERVED_KEYWORDS.contains(word)
}

/// Returns `true` if `name` can be written as a basic SysML identifier without quoting.
pub fn is_basic_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_reserved(name)
}

/// Formats a name for output, quoting it as an unrestricted name when necessary.
pub fn format_name(name: &str) -> Cow<'_, str> {
    if is_basic_name(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(quote(name, '\''))
    }
}

/// Formats a string literal with `"` and `\` escaped.
pub fn format_string(value: &str) -> String {
    quote(value, '"')
}

fn quote(value: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(delimiter);
    for c in value.chars() {
        if c == delimiter || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(delimiter);
    out
}
