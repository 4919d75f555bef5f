//! HTML entity decoding for scraped metadata.
//!
//! The DOM parser already decodes entities once. Site generators sometimes
//! escape attribute values twice (`&amp;#39;`), so extracted strings get one
//! more pass here. Only numeric references and the six entities below are
//! recognised; anything else is left as written.

/// Longest reference body looked at; `#x10FFFF` with leading zeros fits.
const MAX_REFERENCE_LEN: usize = 12;

/// Decode `&#NNN;`, `&#xHH;` and `&amp; &quot; &apos; &lt; &gt; &nbsp;`.
///
/// Single pass: the output of one replacement is never decoded again, so
/// `&amp;lt;` becomes `&lt;`. References naming an invalid code point are
/// kept verbatim.
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail
            .bytes()
            .skip(1)
            .take(MAX_REFERENCE_LEN + 1)
            .position(|b| b == b';')
            .map(|i| i + 1);
        match semi.and_then(|semi| decode_reference(&tail[1..semi]).map(|c| (c, semi))) {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the body of one reference (between `&` and `;`).
fn decode_reference(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                u32::from_str_radix(hex, 16).ok()?
            }
            Some(_) => return None,
            None if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) => {
                num.parse().ok()?
            }
            None => return None,
        };
        return char::from_u32(code);
    }
    match body {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "nbsp" => Some(' '),
        _ => None,
    }
}
