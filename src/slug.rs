use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use url::Url;

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Turn a display name into a filesystem-safe path segment:
/// "Agricultura de subsistencia" -> "agricultura-de-subsistencia".
///
/// NFKD decomposition first, so accented letters fold to their base
/// letter; every remaining run of non-alphanumeric characters collapses
/// to a single hyphen. Output is `[a-z0-9-]` only, possibly empty —
/// callers that need a non-empty segment must check.
pub fn slugify(name: &str) -> String {
    let folded: String = name.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let lower = folded.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Final path segment of a URL, case preserved, query/fragment ignored:
/// "https://host/a/b/file_name.PDF" -> "file_name.PDF".
pub fn filename_from_url(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        return url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
    }
    // Relative reference: strip query/fragment by hand, take the last piece.
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    path.rsplit('/').next().unwrap_or(path).to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_spanish_phrase() {
        assert_eq!(slugify("Agricultura de subsistencia"), "agricultura-de-subsistencia");
    }

    #[test]
    fn accents_fold_to_ascii() {
        assert_eq!(slugify("Artes Domésticas"), "artes-domesticas");
        assert_eq!(slugify("Maestrías (Experto)"), "maestrias-experto");
        assert_eq!(slugify("Añil"), "anil");
    }

    #[test]
    fn punctuation_collapses_to_single_hyphen() {
        assert_eq!(slugify("Salud  y   Ciencia!"), "salud-y-ciencia");
        assert_eq!(slugify("--ADRA--"), "adra");
    }

    #[test]
    fn idempotent_on_slugs() {
        for s in ["agricultura-de-subsistencia", "adra", "salud-y-ciencia"] {
            assert_eq!(slugify(s), s);
        }
    }

    #[test]
    fn output_charset() {
        static SHAPE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());
        for input in ["Recreación", "Crecimiento Espiritual, Actividades Misioneras y Herencia", "x"] {
            let slug = slugify(input);
            assert!(SHAPE.is_match(&slug), "bad slug {:?} for {:?}", slug, input);
        }
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("¡¿!?"), "");
    }

    #[test]
    fn filename_keeps_case() {
        assert_eq!(
            filename_from_url("https://host/path/to/file_name.PDF"),
            "file_name.PDF"
        );
    }

    #[test]
    fn filename_ignores_query() {
        assert_eq!(
            filename_from_url("https://host/uploads/aves.png?cache=1#frag"),
            "aves.png"
        );
    }

    #[test]
    fn filename_from_relative_reference() {
        assert_eq!(filename_from_url("/uploads/1/1/3/1/agricultura.pdf"), "agricultura.pdf");
        assert_eq!(filename_from_url("aves.png"), "aves.png");
    }

    #[test]
    fn filename_of_bare_host_is_empty() {
        assert_eq!(filename_from_url("https://www.guiasmayores.com"), "");
    }
}
