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

//! Text transforms shared by the visitors.
//!
//! The free functions in the submodules are stateless. `Formatter` bundles
//! them with the tables from the configuration.

pub mod html;
pub mod links;
pub mod quote;
pub mod wrap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::support::config::{Config, FormatterConfig, ImageConfig};

pub use self::html::{escape_html, html_to_text};

lazy_static! {
    static ref TAG_OR_TEXT: Regex = Regex::new(r"(?s)<[^>]*>|[^<]+").unwrap();
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
}

#[derive(Clone, Debug)]
pub struct Formatter {
    tables: FormatterConfig,
    images: ImageConfig,
    /// The emoticon tokens as they appear in escaped text.
    emoticons: Vec<(String, String)>,
}

impl Formatter {
    pub fn new(config: &Config) -> Self {
        let emoticons = config
            .formatter
            .emoticons
            .iter()
            .map(|&(ref token, ref replacement)| {
                (escape_html(token).into_owned(), replacement.clone())
            })
            .collect();

        Formatter {
            tables: config.formatter.clone(),
            images: config.images.clone(),
            emoticons,
        }
    }

    /// Render plain text as an HTML fragment.
    ///
    /// The text is escaped, links are made clickable, emoticons are
    /// substituted, quoted lines are coloured, and line breaks become
    /// `<br>`.
    pub fn text_to_html(&self, text: &str) -> String {
        let escaped = escape_html(text);
        let linked = links::linkify(&escaped, &self.tables.link_target);
        let smiling = self.substitute_emoticons(&linked);
        quote::color_quoted_lines(&smiling, &self.tables.quote_colors)
            .replace('\n', "<br>\n")
    }

    /// Prepare an HTML body for display: inline images are pointed at the
    /// image URL and blockquotes are coloured by depth.
    pub fn html_for_display(
        &self,
        html: &str,
        session: &str,
        uid: u32,
    ) -> String {
        let html = links::rewrite_cid_images(
            html,
            &self.images.url_template,
            session,
            uid,
        );
        quote::color_blockquotes(&html, &self.tables.quote_colors)
    }

    pub fn html_to_text(&self, html: &str) -> String {
        html::html_to_text(html)
    }

    pub fn wrap(&self, text: &str, width: usize) -> String {
        wrap::wrap_text(text, width)
    }

    /// Replace whole words of escaped text which are emoticon tokens.
    ///
    /// Tags, and text inside anchors, are left alone.
    pub fn substitute_emoticons(&self, escaped: &str) -> String {
        if self.emoticons.is_empty() {
            return escaped.to_owned();
        }

        let mut out = String::with_capacity(escaped.len());
        let mut in_anchor = false;
        for piece in TAG_OR_TEXT.find_iter(escaped) {
            let piece = piece.as_str();
            if piece.starts_with('<') {
                let lower = piece.to_ascii_lowercase();
                if lower.starts_with("<a ") || "<a>" == lower {
                    in_anchor = true;
                } else if lower.starts_with("</a") {
                    in_anchor = false;
                }
                out.push_str(piece);
            } else if in_anchor {
                out.push_str(piece);
            } else {
                out.push_str(&WORD.replace_all(piece, |c: &Captures| {
                    self.emoticons
                        .iter()
                        .find(|&&(ref token, _)| token == &c[0])
                        .map_or_else(
                            || c[0].to_owned(),
                            |&(_, ref replacement)| replacement.clone(),
                        )
                }));
            }
        }
        out
    }
}
