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

/// Determine whether the given name can be used verbatim as the name of a
/// file created inside a destination directory.
///
/// This excludes empty names and anything that could cause directory
/// traversal or hidden files on UNIX, as well as control characters which
/// tend to upset terminals when the name is later printed.
///
/// It does not care whether the OS will ultimately accept the name.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() &&
        // Block directory traversal through .. and creation of hidden files on
        // UNIX
        !name.starts_with('.') &&
        !name.contains('/') &&
        // Only a path separator on Windows, but block everywhere since
        // attachment names frequently come from Windows clients
        !name.contains('\\') &&
        !name.contains(|c: char| c < ' ' || c == '\x7F')
}

/// Turn an arbitrary attachment file name into one that passes
/// `is_safe_name`.
///
/// Only the final path component is kept. Unsafe characters are replaced by
/// `_`, leading dots are removed, and the result is truncated to at most
/// `max_chars` characters (preserving the extension where possible). If
/// nothing is left, `fallback` is used.
pub fn safe_file_name(name: &str, max_chars: usize, fallback: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| if c < ' ' || c == '\x7F' { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim();

    let cleaned = if cleaned.chars().count() > max_chars {
        truncate_keeping_extension(cleaned, max_chars)
    } else {
        cleaned.to_owned()
    };

    if is_safe_name(&cleaned) {
        cleaned
    } else {
        fallback.to_owned()
    }
}

fn truncate_keeping_extension(name: &str, max_chars: usize) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 10 => {
            (&name[..dot], &name[dot..])
        },
        _ => (name, ""),
    };

    let ext_len = ext.chars().count();
    if ext_len >= max_chars {
        return name.chars().take(max_chars).collect();
    }

    let mut truncated: String =
        stem.chars().take(max_chars - ext_len).collect();
    truncated.push_str(ext);
    truncated
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_safe_name() {
        assert!(is_safe_name("foo"));
        assert!(is_safe_name("Entwürfe.pdf"));
        assert!(is_safe_name("郵便"));
        assert!(is_safe_name("report #1.doc"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("."));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name(".hidden"));
        assert!(!is_safe_name("foo/bar"));
        assert!(!is_safe_name("foo\\bar"));
        assert!(!is_safe_name("foo\0"));
        assert!(!is_safe_name("foo\r"));
        assert!(!is_safe_name("fo\x7Fo"));
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!("foo.txt", safe_file_name("foo.txt", 100, "x"));
        assert_eq!("passwd", safe_file_name("../../etc/passwd", 100, "x"));
        assert_eq!("evil.exe", safe_file_name("C:\\temp\\evil.exe", 100, "x"));
        assert_eq!("bashrc", safe_file_name(".bashrc", 100, "x"));
        assert_eq!("a_b", safe_file_name("a\rb", 100, "x"));
        assert_eq!("x", safe_file_name("..", 100, "x"));
        assert_eq!("x", safe_file_name("", 100, "x"));
        assert_eq!("abc.pdf", safe_file_name("abcdefgh.pdf", 7, "x"));
        assert_eq!("abcdefg", safe_file_name("abcdefghij", 7, "x"));
    }
}
