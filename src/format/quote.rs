//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mimedump.
//
// Mimedump is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mimedump is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mimedump. If not, see <http://www.gnu.org/licenses/>.

//! Quote depth detection, quoting, and colouring of quoted text.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::html::escape_html;

lazy_static! {
    static ref PLAIN_QUOTE: Regex = Regex::new(r"^(?:> ?)+").unwrap();
    static ref HTML_QUOTE: Regex = Regex::new(r"^(?:&gt; ?)+").unwrap();
    static ref BLOCKQUOTE: Regex =
        Regex::new(r"(?i)<(/?)blockquote\b[^>]*>").unwrap();
}

/// The number of `>` quote markers at the start of a plain text line.
pub fn quote_depth(line: &str) -> usize {
    PLAIN_QUOTE
        .find(line)
        .map_or(0, |m| m.as_str().matches('>').count())
}

/// Put `prefix` before every line of `text`.
///
/// Empty lines get the prefix without trailing whitespace, so that quoting
/// does not introduce trailing spaces.
pub fn quote_text(text: &str, prefix: &str) -> String {
    let bare = prefix.trim_end();
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for (ix, line) in text.trim_end_matches('\n').split('\n').enumerate() {
        if ix > 0 {
            out.push('\n');
        }
        if line.is_empty() {
            out.push_str(bare);
        } else if line.starts_with('>') {
            // Nested quotes stay compact: "> > x" rather than ">  > x"
            out.push_str(bare);
            out.push(' ');
            out.push_str(line);
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
    }
    out.push('\n');
    out
}

fn color_for(colors: &[String], depth: usize) -> Option<&str> {
    if 0 == depth || colors.is_empty() {
        None
    } else {
        Some(&colors[(depth - 1) % colors.len()])
    }
}

/// Colour quoted lines of text which has already been escaped for HTML.
///
/// A line is quoted if it starts with one or more `&gt;`; the colour is
/// chosen by the number of them.
pub fn color_quoted_lines(escaped: &str, colors: &[String]) -> String {
    let mut out = String::with_capacity(escaped.len());
    for (ix, line) in escaped.split('\n').enumerate() {
        if ix > 0 {
            out.push('\n');
        }

        let depth = HTML_QUOTE
            .find(line)
            .map_or(0, |m| m.as_str().matches("&gt;").count());
        match color_for(colors, depth) {
            Some(color) => {
                out.push_str("<span style=\"color: ");
                out.push_str(&escape_html(color));
                out.push_str("\">");
                out.push_str(line);
                out.push_str("</span>");
            },
            None => out.push_str(line),
        }
    }
    out
}

/// Colour `<blockquote>` elements of HTML by nesting depth.
///
/// The content of each blockquote is wrapped in a coloured `<div>`.
/// Blockquotes left open at the end are closed.
pub fn color_blockquotes(html: &str, colors: &[String]) -> String {
    if colors.is_empty() {
        return html.to_owned();
    }

    let mut depth = 0usize;
    let mut out = BLOCKQUOTE
        .replace_all(html, |c: &Captures| {
            if c[1].is_empty() {
                depth += 1;
                let color =
                    escape_html(color_for(colors, depth).unwrap_or(""));
                format!(
                    "{}<div style=\"border-left: 2px solid {color}; \
                     padding-left: 8px; color: {color}\">",
                    &c[0],
                    color = color
                )
            } else if depth > 0 {
                depth -= 1;
                format!("</div>{}", &c[0])
            } else {
                // Stray closing tag
                String::new()
            }
        })
        .into_owned();

    for _ in 0..depth {
        out.push_str("</div></blockquote>");
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn colors() -> Vec<String> {
        vec!["red".to_owned(), "blue".to_owned()]
    }

    #[test]
    fn test_quote_depth() {
        assert_eq!(0, quote_depth("plain"));
        assert_eq!(0, quote_depth(" > indented"));
        assert_eq!(1, quote_depth("> one"));
        assert_eq!(2, quote_depth(">> two"));
        assert_eq!(3, quote_depth("> > > three"));
    }

    #[test]
    fn test_quote_text() {
        assert_eq!(
            "> Hello\n>\n> > earlier\n",
            quote_text("Hello\n\n> earlier\n", "> ")
        );
        assert_eq!("| a\n", quote_text("a", "| "));
    }

    #[test]
    fn test_color_quoted_lines() {
        assert_eq!(
            "Reply\n\
             <span style=\"color: red\">&gt; first</span>\n\
             <span style=\"color: blue\">&gt;&gt; second</span>\n\
             <span style=\"color: red\">&gt; &gt; &gt; third</span>\n\
             x &gt; y",
            color_quoted_lines(
                "Reply\n&gt; first\n&gt;&gt; second\n\
                 &gt; &gt; &gt; third\nx &gt; y",
                &colors()
            )
        );
        assert_eq!("&gt; x", color_quoted_lines("&gt; x", &[]));
    }

    #[test]
    fn test_color_blockquotes() {
        assert_eq!(
            "<blockquote type=\"cite\"><div style=\"border-left: 2px solid \
             red; padding-left: 8px; color: red\">a<blockquote><div \
             style=\"border-left: 2px solid blue; padding-left: 8px; \
             color: blue\">b</div></blockquote></div></blockquote>c",
            color_blockquotes(
                "<blockquote type=\"cite\">a<blockquote>b</blockquote>\
                 </blockquote>c</blockquote>",
                &colors()
            )
        );
        assert!(color_blockquotes("<BLOCKQUOTE>open", &colors())
            .ends_with("open</div></blockquote>"));
    }
}
