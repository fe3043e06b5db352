//! Markup helpers for previews and rendered bodies.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

type Rules = Vec<(Regex, &'static str)>;

/// Document-wide rewrite rules applied by [`sanitize_for_render`].
const BLOCK_RULES: &[(&str, &str)] = &[
    // whole blocks, content included
    (r"(?is)<script\b[^>]*>.*?</script\s*>", ""),
    (r"(?is)<style\b[^>]*>.*?</style\s*>", ""),
    // unbalanced openers or closers left behind
    (r"(?i)</?script\b[^>]*>?", ""),
    (r"(?i)</?style\b[^>]*>?", ""),
];

/// Rules applied inside each `<...>` tag only, so body text is never touched.
const TAG_RULES: &[(&str, &str)] = &[
    // inline event handlers after whitespace or `/`: quoted or bare values
    (r#"(?i)[\s/]on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#, ""),
    (r"(?i)(?:java|vb)script\s*:", "blocked:"),
];

fn compile(rules: &[(&str, &'static str)]) -> Rules {
    rules
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, *replacement))
        })
        .collect()
}

static BLOCKS: Lazy<Rules> = Lazy::new(|| compile(BLOCK_RULES));
static TAG_ATTRS: Lazy<Rules> = Lazy::new(|| compile(TAG_RULES));
static TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]*>").ok());

fn apply(rules: &Rules, input: &str) -> String {
    rules.iter().fold(input.to_string(), |text, (re, replacement)| {
        re.replace_all(&text, *replacement).into_owned()
    })
}

/// Named and numeric entities reversed by [`decode_entities`].
const ENTITIES: &[(&str, char)] = &[
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&#39;", '\''),
    ("&#x27;", '\''),
    ("&apos;", '\''),
    ("&nbsp;", ' '),
    ("&#160;", ' '),
];

/// Collapses whitespace runs into one space and trims both ends.
pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes `<...>` markup and collapses whitespace.
///
/// Tags are matched the way `<[^>]*>` would match them: not recursive, and an
/// unterminated `<` is kept literally along with the rest of the input.
#[must_use]
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        // keep words on either side of a tag apart
        out.push(' ');
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    collapse_whitespace(&out)
}

/// Reverses the common HTML entities in a single pass. Unknown entities are
/// left untouched, so `&amp;lt;` decodes to `&lt;` and not `<`.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    'outer: while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        for (entity, ch) in ENTITIES {
            if rest.starts_with(entity) {
                out.push(*ch);
                rest = &rest[entity.len()..];
                continue 'outer;
            }
        }

        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);

    out
}

/// Best-effort cleanup of stored HTML before it is rendered unescaped.
///
/// Drops script and style blocks, and within tags strips inline `on*=`
/// handlers and `javascript:` / `vbscript:` URIs. Rules are reapplied until
/// the output stops changing so nested fragments like
/// `<scr<script></script>ipt>` cannot reassemble. This is a denylist, not an
/// allowlist HTML parser.
#[must_use]
pub fn sanitize_for_render(input: &str) -> String {
    let mut current = input.to_string();

    loop {
        let mut next = apply(&BLOCKS, &current);
        if let Some(tag) = TAG.as_ref() {
            next = tag
                .replace_all(&next, |caps: &Captures<'_>| apply(&TAG_ATTRS, &caps[0]))
                .into_owned();
        }

        // every rule shortens its match, so this terminates
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Truncates to at most `max` characters. Truncated text has trailing
/// whitespace trimmed and gets a single `…`, so the result never exceeds
/// `max + 1` characters.
#[must_use]
pub fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push('…');
    truncated
}
