use super::error::{ParseErrorKind, SysmlError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// A basic identifier or keyword.
    Word(String),
    /// A `'...'` unrestricted name, unescaped.
    QuotedName(String),
    /// A `"..."` string literal, unescaped.
    String(String),
    /// A numeric literal, kept as text until its use is known.
    Number(String),
    Symbol(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Word(w) => w.clone(),
            TokenKind::QuotedName(n) => format!("'{n}'"),
            TokenKind::String(s) => format!("\"{s}\""),
            TokenKind::Number(n) => n.clone(),
            TokenKind::Symbol(s) => (*s).to_string(),
        }
    }
}

// Longest first so that `:>>` wins over `:>` and `:`.
const SYMBOLS: [&str; 16] = [
    ":>>", "::>", ":>", "::", "..", ":", ";", ",", "=", "{", "}", "(", ")", "[", "]", "*",
];
const SIGNS: [&str; 2] = ["-", "+"];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, SysmlError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    let parse_error = |line: usize, kind: ParseErrorKind| SysmlError::Parse { line, kind };

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let start_line = line;
            i += 2;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(parse_error(start_line, ParseErrorKind::UnterminatedComment));
                    }
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => {
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }
            continue;
        }

        if c == '\'' || c == '"' {
            let start_line = line;
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(parse_error(start_line, ParseErrorKind::UnterminatedString));
                    }
                    Some('\\') => {
                        let escaped = chars.get(i + 1).ok_or_else(|| {
                            parse_error(start_line, ParseErrorKind::UnterminatedString)
                        })?;
                        text.push(*escaped);
                        i += 2;
                    }
                    Some(&d) if d == c => {
                        i += 1;
                        break;
                    }
                    Some(&other) => {
                        if other == '\n' {
                            line += 1;
                        }
                        text.push(other);
                        i += 1;
                    }
                }
            }
            let kind = if c == '\'' {
                TokenKind::QuotedName(text)
            } else {
                TokenKind::String(text)
            };
            tokens.push(Token {
                kind,
                line: start_line,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word(chars[start..i].iter().collect()),
                line,
            });
            continue;
        }

        let fraction = c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit());
        if c.is_ascii_digit() || fraction {
            let start = i;
            i = scan_number(&chars, i);
            let text: String = chars[start..i].iter().collect();
            if chars.get(i).is_some_and(|d| d.is_ascii_alphabetic() || *d == '_') {
                return Err(parse_error(line, ParseErrorKind::InvalidNumber(text)));
            }
            tokens.push(Token {
                kind: TokenKind::Number(text),
                line,
            });
            continue;
        }

        let rest = &chars[i..];
        let symbol = SYMBOLS
            .iter()
            .chain(SIGNS.iter())
            .find(|s| s.chars().zip(rest.iter()).all(|(a, b)| a == *b) && s.len() <= rest.len());
        match symbol {
            Some(s) => {
                tokens.push(Token {
                    kind: TokenKind::Symbol(*s),
                    line,
                });
                i += s.len();
            }
            None => return Err(parse_error(line, ParseErrorKind::UnexpectedCharacter(c))),
        }
    }
    Ok(tokens)
}

fn scan_number(chars: &[char], mut i: usize) -> usize {
    let digits = |chars: &[char], mut i: usize| {
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    i = digits(chars, i);
    // A single dot followed by a digit is a fraction; `..` is a range.
    if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) {
        i = digits(chars, i + 1);
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|d| d.is_ascii_digit()) {
            i = digits(chars, j);
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_attribute_redefinition() {
        assert_eq!(
            kinds("attribute :>> tx = -1.5e-3;"),
            vec![
                TokenKind::Word("attribute".into()),
                TokenKind::Symbol(":>>"),
                TokenKind::Word("tx".into()),
                TokenKind::Symbol("="),
                TokenKind::Symbol("-"),
                TokenKind::Number("1.5e-3".into()),
                TokenKind::Symbol(";"),
            ]
        );
    }

    #[test]
    fn multiplicity_range_is_not_a_decimal() {
        assert_eq!(
            kinds("[0..*]"),
            vec![
                TokenKind::Symbol("["),
                TokenKind::Number("0".into()),
                TokenKind::Symbol(".."),
                TokenKind::Symbol("*"),
                TokenKind::Symbol("]"),
            ]
        );
    }

    #[test]
    fn quoted_names_and_strings_are_unescaped() {
        assert_eq!(
            kinds(r#"'O\'Brien' "a\"b""#),
            vec![
                TokenKind::QuotedName("O'Brien".into()),
                TokenKind::String("a\"b".into()),
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_counted() {
        let tokens = tokenize("// header\n/* block\n comment */ part\n\nx").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].line, 3);
        assert_eq!(tokens[1].line, 5);
    }

    #[test]
    fn unterminated_constructs_report_their_start_line() {
        assert!(matches!(
            tokenize("\n/* never closed"),
            Err(SysmlError::Parse {
                line: 2,
                kind: ParseErrorKind::UnterminatedComment
            })
        ));
        assert!(matches!(
            tokenize("'open"),
            Err(SysmlError::Parse {
                line: 1,
                kind: ParseErrorKind::UnterminatedString
            })
        ));
    }

    #[test]
    fn stray_characters_are_rejected() {
        assert!(matches!(
            tokenize("part @"),
            Err(SysmlError::Parse {
                kind: ParseErrorKind::UnexpectedCharacter('@'),
                ..
            })
        ));
    }
}
