//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Characters that force a value to be quoted on the wire.
const SPECIAL_CHARS: &[char] = &[
    ' ', '\t', ';', '{', '}', '#', '"', '\'', '[', ']', '|', '&', '<', '>',
    '(', ')', '*', '!', '\\',
];

// ===== global functions =====

pub fn needs_quoting(value: &str) -> bool {
    value.is_empty() || value.contains(SPECIAL_CHARS)
}

// Wraps a value in double quotes, escaping embedded quotes and backslashes.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

// Reverses `quote`. Unquoted input is returned unchanged.
pub fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() < 2 || !value.starts_with('"') || !value.ends_with('"') {
        return value.to_owned();
    }

    let mut unquoted = String::with_capacity(value.len());
    let mut escaped = false;
    for ch in value[1..value.len() - 1].chars() {
        if escaped {
            unquoted.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            unquoted.push(ch);
        }
    }
    unquoted
}

// Splits the first path segment off a configuration line.
//
// Returns the unquoted segment and the remainder with leading whitespace
// removed. An unterminated quote extends to the end of the input.
pub fn split_segment(input: &str) -> (String, &str) {
    let input = input.trim_start();
    if !input.starts_with('"') {
        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        return (input[..end].to_owned(), input[end..].trim_start());
    }

    let mut escaped = false;
    for (idx, ch) in input.char_indices().skip(1) {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                let end = idx + 1;
                return (unquote(&input[..end]), input[end..].trim_start());
            }
            _ => (),
        }
    }
    (unquote(&format!("{input}\"")), "")
}

// Splits a whole value into segments, dropping inline list brackets.
pub fn split_segments(input: &str) -> Vec<String> {
    let mut segments = vec![];
    let mut rest = input;
    while !rest.trim().is_empty() {
        let (segment, remainder) = split_segment(rest);
        if segment != "[" && segment != "]" {
            segments.push(segment);
        }
        rest = remainder;
    }
    segments
}

// ===== unit tests =====
