//! SQL identifier quoting, parameter placeholders and name validation.
//!
//! [`SqlCharacters`] captures everything that differs in how database products spell
//! names and parameters. Dialects use it to build statements; drivers use it to
//! combine two statements into one batch.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// How positional parameters are written in command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    /// Anonymous `?` placeholders (MySQL, SQLite).
    Anonymous,
    /// `$1`, `$2`, ... (PostgreSQL).
    Numbered,
    /// `@p0`, `@p1`, ... (SQL Server).
    Named,
}

/// Quoting and placeholder conventions of one database product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlCharacters {
    /// Opening identifier delimiter.
    pub left_delimiter: char,
    /// Closing identifier delimiter.
    pub right_delimiter: char,
    /// Placeholder syntax.
    pub parameter_style: ParameterStyle,
    /// Separator placed between statements of a batch.
    pub statement_separator: &'static str,
}

impl SqlCharacters {
    /// SQL Server: `[name]`, `@p0`.
    pub const MS_SQL: Self = Self {
        left_delimiter: '[',
        right_delimiter: ']',
        parameter_style: ParameterStyle::Named,
        statement_separator: ";",
    };

    /// MySQL: `` `name` ``, `?`.
    pub const MY_SQL: Self = Self {
        left_delimiter: '`',
        right_delimiter: '`',
        parameter_style: ParameterStyle::Anonymous,
        statement_separator: ";",
    };

    /// PostgreSQL: `"name"`, `$1`.
    pub const POSTGRE_SQL: Self = Self {
        left_delimiter: '"',
        right_delimiter: '"',
        parameter_style: ParameterStyle::Numbered,
        statement_separator: ";",
    };

    /// SQLite: `"name"`, `?`.
    pub const SQLITE: Self = Self {
        left_delimiter: '"',
        right_delimiter: '"',
        parameter_style: ParameterStyle::Anonymous,
        statement_separator: ";",
    };

    /// Quote an identifier, doubling any embedded closing delimiter.
    pub fn escape_sql(&self, name: &str) -> String {
        let mut escaped = String::with_capacity(name.len() + 2);
        escaped.push(self.left_delimiter);
        for ch in name.chars() {
            if ch == self.right_delimiter {
                escaped.push(ch);
            }
            escaped.push(ch);
        }
        escaped.push(self.right_delimiter);
        escaped
    }

    /// Quote a possibly schema-qualified table name.
    pub fn qualified_name(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) if !schema.is_empty() => {
                format!("{}.{}", self.escape_sql(schema), self.escape_sql(name))
            }
            _ => self.escape_sql(name),
        }
    }

    /// Placeholder for the parameter at zero-based `position`.
    pub fn parameter_name(&self, position: usize) -> Cow<'static, str> {
        match self.parameter_style {
            ParameterStyle::Anonymous => Cow::Borrowed("?"),
            ParameterStyle::Numbered => Cow::Owned(format!("${}", position + 1)),
            ParameterStyle::Named => Cow::Owned(format!("@p{position}")),
        }
    }

    /// Shift every placeholder in `command_text` by `offset` positions.
    ///
    /// Used when a statement is appended to a batch after `offset` parameters.
    /// Placeholders inside string literals are shifted too; anonymous placeholders
    /// need no renumbering.
    pub fn renumber_parameters<'a>(&self, command_text: &'a str, offset: usize) -> Cow<'a, str> {
        if offset == 0 {
            return Cow::Borrowed(command_text);
        }
        let (pattern, prefix) = match self.parameter_style {
            ParameterStyle::Anonymous => return Cow::Borrowed(command_text),
            ParameterStyle::Numbered => (numbered_parameter_regex(), "$"),
            ParameterStyle::Named => (named_parameter_regex(), "@p"),
        };
        pattern.replace_all(command_text, |caps: &regex::Captures<'_>| {
            // An index too large for usize is not one of ours; leave it as written.
            match caps[1].parse::<usize>().ok().and_then(|n| n.checked_add(offset)) {
                Some(n) => format!("{prefix}{n}"),
                None => caps[0].to_string(),
            }
        })
    }
}

fn numbered_parameter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(\d+)").expect("static pattern"))
}

fn named_parameter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@p(\d+)\b").expect("static pattern"))
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$ ]{0,127}$").expect("static pattern")
    })
}

/// Check whether `name` is acceptable as a table, schema, column or sequence name.
///
/// Names start with a letter or underscore and contain letters, digits, `_`, `$` or
/// spaces, up to 128 characters.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name) && !name.ends_with(' ')
}
