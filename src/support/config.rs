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

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// The complete configuration for rendering messages.
///
/// This is normally stored in a TOML file passed with `--config`. Every
/// section may be omitted, in which case the defaults below apply. The
/// configuration is never mutated once loaded; components that need part of
/// it receive their own copy at construction.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// How the display object is built.
    #[serde(default)]
    pub display: DisplayConfig,

    /// How reply and forward text is built.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Tables used by the content formatter.
    #[serde(default)]
    pub formatter: FormatterConfig,

    /// How inline `cid:` image references are rewritten.
    #[serde(default)]
    pub images: ImageConfig,
}

impl Config {
    /// Read and parse the TOML configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read(path)?;
        Ok(toml::from_slice(&data)?)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// If true, HTML variants of `multipart/alternative` groups are shown in
    /// preference to plain text. If false, HTML is converted to plain text.
    pub prefer_html: bool,

    /// When `prefer_html` is false, keep the original HTML as an attachment
    /// entry which is not rendered.
    pub retain_html: bool,

    /// Text parts larger than this many bytes are not inlined into the
    /// display object; they are listed like any other attachment instead.
    pub inline_text_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            prefer_html: true,
            retain_html: false,
            inline_text_limit: 1 << 20,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Whether to quote the HTML variant of the original message.
    pub prefer_html: bool,
    /// The prefix put before every quoted line of a plain text reply.
    pub quote_prefix: String,
    /// The width at which quoted plain text is wrapped. 0 disables wrapping.
    pub wrap_width: usize,
    /// Header line put above the quoted text of a reply.
    ///
    /// `#FROM#`, `#TO#`, `#DATE#`, `#TIME#` and `#SUBJECT#` are substituted.
    pub reply_template: String,
    /// Header block put above the text of a forwarded message.
    pub forward_template: String,
    /// `chrono` format pattern for `#DATE#`.
    pub date_format: String,
    /// `chrono` format pattern for `#TIME#`.
    pub time_format: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        ReplyConfig {
            prefer_html: false,
            quote_prefix: "> ".to_owned(),
            wrap_width: 76,
            reply_template: "On #DATE# at #TIME#, #FROM# wrote:".to_owned(),
            forward_template: "---------- Original Message ----------\n\
                               From: #FROM#\n\
                               To: #TO#\n\
                               Date: #DATE# #TIME#\n\
                               Subject: #SUBJECT#"
                .to_owned(),
            date_format: "%Y-%m-%d".to_owned(),
            time_format: "%H:%M".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Colours given to quoted text, indexed by quote depth minus one. Depths
    /// beyond the end of the list wrap around.
    pub quote_colors: Vec<String>,
    /// Emoticons to substitute in plain text, as `(token, replacement)`.
    ///
    /// The replacement is inserted verbatim into HTML output.
    pub emoticons: Vec<(String, String)>,
    /// The `target` attribute put on detected hyperlinks. Empty to omit.
    pub link_target: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        FormatterConfig {
            quote_colors: vec![
                "#555555".to_owned(),
                "#0000ff".to_owned(),
                "#008000".to_owned(),
                "#800000".to_owned(),
                "#800080".to_owned(),
            ],
            emoticons: vec![
                (":-)".to_owned(), "\u{1F642}".to_owned()),
                (":)".to_owned(), "\u{1F642}".to_owned()),
                (";-)".to_owned(), "\u{1F609}".to_owned()),
                (";)".to_owned(), "\u{1F609}".to_owned()),
                (":-(".to_owned(), "\u{1F641}".to_owned()),
                (":(".to_owned(), "\u{1F641}".to_owned()),
                (":-D".to_owned(), "\u{1F600}".to_owned()),
                (":-P".to_owned(), "\u{1F61B}".to_owned()),
            ],
            link_target: "_blank".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    /// URL template for inline images.
    ///
    /// `{session}` is replaced by the session secret, `{uid}` by the message
    /// identifier, and `{cid}` by the URL-escaped raw content ID.
    pub url_template: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            url_template: "/mail/image?session={session}&uid={uid}&cid={cid}"
                .to_owned(),
        }
    }
}
