//! Text normalisation applied before feature extraction and corpus lookup.
//!
//! Visually or semantically similar characters collapse onto one
//! representative so that lookups and models see a stable alphabet. The
//! table is fixed; no value is also a key, so folding is idempotent.

/// Placeholder substituted for tokens that look like links.
pub const URL_PLACEHOLDER: &str = "_html_";

const URL_MARKERS: &[&str] = &["www", "http"];

/// Fixed character substitutions.
pub const SYMBOL_MAP: &[(char, char)] = &[
    ('—', '-'),
    ('“', '«'),
    ('‘', '«'),
    ('”', '»'),
    ('’', '»'),
    ('😆', '😄'),
    ('😊', '😄'),
    ('😑', '😄'),
    ('😔', '😄'),
    ('😉', '😄'),
    ('❗', '😄'),
    ('🤔', '😄'),
    ('😅', '😄'),
    ('⚓', '😄'),
    ('ε', 'α'),
    ('ζ', 'α'),
    ('η', 'α'),
    ('μ', 'α'),
    ('δ', 'α'),
    ('λ', 'α'),
    ('ν', 'α'),
    ('β', 'α'),
    ('γ', 'α'),
    ('と', '尋'),
    ('の', '尋'),
    ('神', '尋'),
    ('隠', '尋'),
    ('し', '尋'),
    ('è', 'e'),
    ('ĕ', 'e'),
    ('ç', 'c'),
    ('ҫ', 'c'),
    ('ё', 'е'),
    ('Ё', 'Е'),
    ('ú', 'u'),
    ('Î', 'I'),
    ('Ç', 'C'),
    ('Ҫ', 'C'),
    ('£', '$'),
    ('₽', '$'),
    ('ӑ', 'a'),
    ('Ă', 'A'),
];

/// Map one character through [`SYMBOL_MAP`].
#[must_use]
pub fn fold_char(c: char) -> char {
    SYMBOL_MAP
        .iter()
        .find_map(|&(from, to)| (from == c).then_some(to))
        .unwrap_or(c)
}

/// Apply [`SYMBOL_MAP`] to every character of `text`.
///
/// # Examples
///
/// ```
/// use rst_predictors::heuristics::text::fold_symbols;
///
/// assert_eq!(fold_symbols("“Ёж” — £5"), "«Еж» - $5");
/// ```
#[must_use]
pub fn fold_symbols(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Canonicalise a whitespace-tokenised sequence.
///
/// Every token is folded through [`SYMBOL_MAP`]; tokens containing `www` or
/// `http` become [`URL_PLACEHOLDER`]. Tokens are rejoined with single spaces,
/// so the token count never changes.
///
/// # Examples
///
/// ```
/// use rst_predictors::heuristics::text::normalize_sequence;
///
/// assert_eq!(normalize_sequence("“Hello” www.test.com"), "«Hello» _html_");
/// ```
#[must_use]
pub fn normalize_sequence(sequence: &str) -> String {
    sequence
        .split_whitespace()
        .map(normalize_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_token(token: &str) -> String {
    let folded = fold_symbols(token);
    if URL_MARKERS.iter().any(|marker| folded.contains(marker)) {
        URL_PLACEHOLDER.to_string()
    } else {
        folded
    }
}

/// Count whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
