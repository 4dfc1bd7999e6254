//! Html pages listing stored expressions.
use super::{
    eval::{Expression, Num},
    reply::Html,
};
use std::{borrow::Cow, fmt::Write};

/// Heading of the page listing every stored expression.
pub const ALL_HEADING: &str = "List of operations happened";

/// Heading of the page listing the latest stored expressions.
pub const LATEST_HEADING: &str = "List of latest 20 operations happened";

/// Escape the characters that are significant in html text and attribute values.
///
/// ```
/// use hypercalc::view::escape;
///
/// assert_eq!("1 &lt; 2", escape("1 < 2"));
/// assert_eq!("plain", escape("plain"));
/// ```
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// Render `entries` as an ordered list of `question = answer` lines under `heading`.
pub fn render(heading: &str, entries: &[Expression]) -> Html {
    let mut items = String::new();
    for e in entries {
        // writing to a String cannot fail
        let _ = writeln!(
            items,
            "        <li>{} = {}</li>",
            escape(&e.question),
            Num(e.answer)
        );
    }

    Html(format!(
        "<!DOCTYPE html>
<html>
<head>
    <title>Operations</title>
</head>
<body>
    <h1>{}</h1>
    <ol>
{}    </ol>
</body>
</html>
",
        escape(heading),
        items
    ))
}

/// The page listing every stored expression.
pub fn all(entries: &[Expression]) -> Html {
    render(ALL_HEADING, entries)
}

/// The page listing the latest stored expressions.
pub fn latest(entries: &[Expression]) -> Html {
    render(LATEST_HEADING, entries)
}
