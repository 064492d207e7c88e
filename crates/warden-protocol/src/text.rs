//! Text normalization for response payloads.
//!
//! Some backends double-escape text: accented letters arrive as
//! `é`, `&eacute;`, `&#233;` or `%C3%A9` inside otherwise valid
//! JSON. [`decode`] walks any JSON value and turns every string (keys
//! included) back into plain text.
//!
//! # Rules, per string
//!
//! 1. `\uXXXX` escapes (surrogate pairs included) become characters.
//! 2. Numeric references `&#NNN;` / `&#xHH;` become characters.
//! 3. Named entities from a fixed table (accented Latin letters plus
//!    `&amp; &lt; &gt; &quot; &apos; &nbsp;`) become characters.
//! 4. If a `%` remains, percent-decoding is attempted; a failed attempt
//!    is discarded and the previous text kept.
//!
//! The rules are applied until the text stops changing. Every successful
//! substitution makes the string strictly shorter, so this always ends,
//! and it makes decoding idempotent: `decode(decode(v)) == decode(v)`.
//! Malformed fragments are left as they are; a single bad string never
//! fails the whole value.

use serde_json::{Map, Value};

/// Decodes every string inside `value`, recursively.
///
/// Arrays keep their order. Object keys and values are both decoded;
/// if two keys decode to the same text, the one visited last wins.
/// Nulls, booleans and numbers are returned unchanged.
pub fn decode(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(decode_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(decode).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(decode_text(&key), decode(value));
            }
            Value::Object(out)
        }
        other => other,
    }
}

/// Decodes a single string until it reaches a fixed point.
pub fn decode_text(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = decode_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One pass of every rule, in order.
fn decode_once(input: &str) -> String {
    let mut text = if input.contains("\\u") {
        unescape_unicode(input)
    } else {
        input.to_string()
    };
    if text.contains('&') {
        text = decode_entities(&text);
    }
    if text.contains('%') {
        if let Some(decoded) = percent_decode(&text) {
            text = decoded;
        }
    }
    text
}

// ---------------------------------------------------------------------------
// \uXXXX
// ---------------------------------------------------------------------------

fn unescape_unicode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find("\\u") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];

        let Some(high) = parse_hex4(after) else {
            out.push_str("\\u");
            rest = after;
            continue;
        };

        // High surrogate followed by `\uDC00..DFFF`: one character.
        if (0xD800..0xDC00).contains(&high) {
            if let Some(low) = after[4..].strip_prefix("\\u").and_then(parse_hex4) {
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(c) = char::from_u32(code) {
                        out.push(c);
                        rest = &after[10..];
                        continue;
                    }
                }
            }
        }

        match char::from_u32(high) {
            Some(c) => {
                out.push(c);
                rest = &after[4..];
            }
            // Lone surrogate: keep the escape as written.
            None => {
                out.push_str("\\u");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn parse_hex4(s: &str) -> Option<u32> {
    let digits = s.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

// ---------------------------------------------------------------------------
// &...; entities
// ---------------------------------------------------------------------------

/// Named entities recognised by the decoder.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("agrave", 'à'),
    ("aacute", 'á'),
    ("acirc", 'â'),
    ("atilde", 'ã'),
    ("auml", 'ä'),
    ("aring", 'å'),
    ("aelig", 'æ'),
    ("ccedil", 'ç'),
    ("egrave", 'è'),
    ("eacute", 'é'),
    ("ecirc", 'ê'),
    ("euml", 'ë'),
    ("igrave", 'ì'),
    ("iacute", 'í'),
    ("icirc", 'î'),
    ("iuml", 'ï'),
    ("ntilde", 'ñ'),
    ("ograve", 'ò'),
    ("oacute", 'ó'),
    ("ocirc", 'ô'),
    ("otilde", 'õ'),
    ("ouml", 'ö'),
    ("oelig", 'œ'),
    ("ugrave", 'ù'),
    ("uacute", 'ú'),
    ("ucirc", 'û'),
    ("uuml", 'ü'),
    ("yacute", 'ý'),
    ("yuml", 'ÿ'),
    ("Agrave", 'À'),
    ("Aacute", 'Á'),
    ("Acirc", 'Â'),
    ("Atilde", 'Ã'),
    ("Auml", 'Ä'),
    ("Aring", 'Å'),
    ("AElig", 'Æ'),
    ("Ccedil", 'Ç'),
    ("Egrave", 'È'),
    ("Eacute", 'É'),
    ("Ecirc", 'Ê'),
    ("Euml", 'Ë'),
    ("Igrave", 'Ì'),
    ("Iacute", 'Í'),
    ("Icirc", 'Î'),
    ("Iuml", 'Ï'),
    ("Ntilde", 'Ñ'),
    ("Ograve", 'Ò'),
    ("Oacute", 'Ó'),
    ("Ocirc", 'Ô'),
    ("Otilde", 'Õ'),
    ("Ouml", 'Ö'),
    ("OElig", 'Œ'),
    ("Ugrave", 'Ù'),
    ("Uacute", 'Ú'),
    ("Ucirc", 'Û'),
    ("Uuml", 'Ü'),
    ("Yacute", 'Ý'),
];

/// Longest entity body we try to match (`#x10FFFF` is 8 chars).
const MAX_ENTITY_LEN: usize = 8;

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let decoded = after
            .find(';')
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN)
            .and_then(|end| entity_char(&after[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn entity_char(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, c)| *c)
}

// ---------------------------------------------------------------------------
// %XX
// ---------------------------------------------------------------------------

/// Percent-decodes `input`, or `None` if the result isn't valid UTF-8
/// or nothing was actually decoded.
fn percent_decode(input: &str) -> Option<String> {
    match urlencoding::decode(input) {
        Ok(decoded) if decoded != input => Some(decoded.into_owned()),
        _ => None,
    }
}
