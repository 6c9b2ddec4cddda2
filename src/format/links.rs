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

//! Hyperlink detection and inline image reference rewriting.

use std::fmt::Write as _;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::html::escape_html;

lazy_static! {
    static ref LINK: Regex = Regex::new(concat!(
        r#"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>"']+"#,
        r"|\b[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)+\b",
    ))
    .unwrap();
    static ref IMG_CID: Regex =
        Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*)(["']?)cid:([^"'\s>]+)"#)
            .unwrap();
}

/// Escaped characters which can never be part of a URL.
static URL_TERMINATORS: &[&str] = &["&lt;", "&gt;", "&quot;", "&#39;"];

/// Turn URLs and email addresses in HTML-escaped text into anchors.
///
/// `target` is placed in the `target` attribute of URL anchors unless empty.
pub fn linkify(escaped: &str, target: &str) -> String {
    LINK.replace_all(escaped, |c: &Captures| {
        let whole = &c[0];
        let cut = URL_TERMINATORS
            .iter()
            .filter_map(|t| whole.find(t))
            .min()
            .unwrap_or(whole.len());
        let (link, rest) = whole.split_at(cut);
        let mut end = link.len();
        while let Some(ch) = link[..end].chars().next_back() {
            if !is_trailing_punctuation(&link[..end], ch) {
                break;
            }
            end -= ch.len_utf8();
        }
        let (link, punct) = link.split_at(end);

        if link.is_empty() {
            return whole.to_owned();
        }

        let mut out = String::new();
        if link.contains("://") {
            anchor(&mut out, link, link, target);
        } else if link.len() > 4 && link[..4].eq_ignore_ascii_case("www.") {
            anchor(&mut out, &format!("http://{}", link), link, target);
        } else {
            let _ = write!(out, "<a href=\"mailto:{}\">{}</a>", link, link);
        }
        out.push_str(punct);
        out.push_str(rest);
        out
    })
    .into_owned()
}

fn is_trailing_punctuation(link: &str, ch: char) -> bool {
    match ch {
        '.' | ',' | ';' | ':' | '!' | '?' => true,
        ')' => link.matches('(').count() < link.matches(')').count(),
        _ => false,
    }
}

fn anchor(out: &mut String, href: &str, text: &str, target: &str) {
    let _ = write!(out, "<a href=\"{}\"", href);
    if !target.is_empty() {
        let _ = write!(out, " target=\"{}\"", escape_html(target));
    }
    let _ = write!(out, ">{}</a>", text);
}

/// Rewrite `<img src="cid:...">` references to fetchable URLs.
///
/// `template` contains `{session}`, `{uid}` and `{cid}` placeholders. Every
/// `cid:` reference is rewritten whether or not such a part exists.
pub fn rewrite_cid_images(
    html: &str,
    template: &str,
    session: &str,
    uid: u32,
) -> String {
    IMG_CID
        .replace_all(html, |c: &Captures| {
            let url = template
                .replace("{session}", &url_escape(session))
                .replace("{uid}", &uid.to_string())
                .replace("{cid}", &url_escape(&c[3]));
            format!("{}{}{}", &c[1], &c[2], escape_html(&url))
        })
        .into_owned()
}

/// Percent-encode everything but the RFC 3986 unreserved characters.
pub fn url_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'.'
            | b'_'
            | b'~' => out.push(b as char),
            b => {
                let _ = write!(out, "%{:02X}", b);
            },
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn links_are_detected() {
        assert_eq!(
            "see <a href=\"https://example.com/a?b=1&amp;c=2\" \
             target=\"_blank\">https://example.com/a?b=1&amp;c=2</a>.",
            linkify("see https://example.com/a?b=1&amp;c=2.", "_blank")
        );
        assert_eq!(
            "<a href=\"http://www.example.org\">www.example.org</a>, ok",
            linkify("www.example.org, ok", "")
        );
        assert_eq!(
            "mail <a href=\"mailto:bob@example.com\">bob@example.com</a>!",
            linkify("mail bob@example.com!", "")
        );
        assert_eq!("nothing here", linkify("nothing here", "x"));
    }

    #[test]
    fn links_stop_at_escaped_delimiters() {
        assert_eq!(
            "&lt;<a href=\"http://x.com/\">http://x.com/</a>&gt;",
            linkify("&lt;http://x.com/&gt;", "")
        );
        assert_eq!(
            "(<a href=\"http://x.com/a_(b)\">http://x.com/a_(b)</a>)",
            linkify("(http://x.com/a_(b))", "")
        );
    }

    #[test]
    fn cid_images_are_rewritten() {
        assert_eq!(
            "<p><img alt=\"x\" src=\"/img?s=abc&amp;u=7&amp;c=a%40b\"></p>",
            rewrite_cid_images(
                "<p><img alt=\"x\" src=\"cid:a@b\"></p>",
                "/img?s={session}&u={uid}&c={cid}",
                "abc",
                7
            )
        );
        assert_eq!(
            "<IMG SRC=u/1/z>",
            rewrite_cid_images(
                "<IMG SRC=cid:z>",
                "{session}/{uid}/{cid}",
                "u",
                1
            )
        );
        assert_eq!(
            "<a href=\"cid:z\">",
            rewrite_cid_images("<a href=\"cid:z\">", "{cid}", "", 1)
        );
    }

    #[test]
    fn escape_url() {
        assert_eq!("a-b.c_d~e", url_escape("a-b.c_d~e"));
        assert_eq!("%3Cx%40y%3E%20%C3%A9", url_escape("<x@y> é"));
    }
}
