use std::sync::LazyLock;

use regex::Regex;

const BULLET: &str = "• ";

struct Substitution {
    pattern: Regex,
    replacement: &'static str,
}

// Order matters: longer markers go before their prefixes.
#[allow(clippy::expect_used)]
static SUBSTITUTIONS: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    [
        (r"\*\*\*", ""),
        (r"\*\*", ""),
        (r"###\s?", ""),
        (r"##\s?", ""),
        (r"#\s?", ""),
        (r"(?m)^- ", BULLET),
        (r"(?m)^\* ", BULLET),
        (r"\|", "  "),
        (r"---", ""),
        (r"\[(.*?)\]", "${1}"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Substitution {
        pattern: Regex::new(pattern).expect("substitution patterns are static literals"),
        replacement,
    })
    .collect()
});

/// Strips markdown-like decoration from free-text model output.
///
/// Emphasis markers, heading markers, pipes and horizontal rules are removed,
/// leading `-`/`*` list markers become bullets, bracketed references are
/// unwrapped, and the result is trimmed. This is a cosmetic filter rather
/// than a markdown parser. The pass repeats until the text stops changing,
/// so the output is always a fixed point.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let mut current = apply_substitutions(text);
    loop {
        let next = apply_substitutions(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_substitutions(text: &str) -> String {
    let mut cleaned = text.to_owned();
    for substitution in SUBSTITUTIONS.iter() {
        cleaned = substitution
            .pattern
            .replace_all(&cleaned, substitution.replacement)
            .into_owned();
    }
    cleaned.trim().to_owned()
}
