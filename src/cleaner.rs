//! Deterministic text normalization for scraped titles and bodies.
//! Every function here is pure and idempotent: cleaning already-clean
//! text must return it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Collapses every run of whitespace (including newlines) to a single
/// space and trims the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Source-specific boilerplate stripped from bodies, in application order.
/// The multi-part tribunal-ambiental contact block comes first so the
/// narrower patterns below only see whatever fragments survive.
static BODY_BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?s)Acceder al expediente de la causa.{0,400}?contacto@tribunalambiental\.cl\.?",
        r"(?s)Morandé 360, Piso 8, Santiago.{0,200}?contacto@tribunalambiental\.cl\.?",
        r"contacto@tribunalambiental\.cl\.?",
        r"Morandé 360, Piso 8, Santiago",
        r"\(56\)\s*2\s*2393\s*69\s*00",
        r"(?s)Poder Judicial Radio.{0,200}?Compartir",
        r"Portal Unificado de Sentencias",
        r"\bCompartir\b",
        r"\bImprimir\b",
        r"Volver al listado",
        r"Tel[eé]fonos?:?\s*[\d\s()+.-]{7,}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Trailing date/time artifacts left by listing markup, e.g.
/// "Titular 12-08-2025 10:30".
static TRAILING_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}:\d{2}(?::\d{2})?)\s*$")
        .unwrap()
});

/// UI chrome that leaks into anchor text on listing pages.
static TITLE_NOISE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:compartir|imprimir|cerrar|volver|leer m[aá]s|ver m[aá]s|video)\b|×")
        .unwrap()
});

pub fn clean_title(raw: &str) -> String {
    let mut s = TITLE_NOISE_RE.replace_all(raw, " ").into_owned();
    s = collapse_whitespace(&s);
    loop {
        let trimmed = TRAILING_DATE_RE.replace(&s, "").trim_end().to_string();
        if trimmed == s {
            break;
        }
        s = trimmed;
    }
    s.trim_matches(|c: char| c.is_whitespace() || ".,;:|-–·»«".contains(c))
        .to_string()
}

/// Full body pipeline: tag strip, boilerplate removal, URL removal,
/// whitespace collapse. Does not touch the title-prefix duplication,
/// which needs the title and lives in [`dedupe_title_prefix`].
pub fn clean_body(raw: &str) -> String {
    let mut s = HTML_TAG_RE.replace_all(raw, " ").into_owned();
    for re in BODY_BOILERPLATE.iter() {
        s = re.replace_all(&s, " ").into_owned();
    }
    s = URL_RE.replace_all(&s, " ").into_owned();
    collapse_whitespace(&s)
}

static LEADING_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}\s+de\s+[a-záéíóúA-ZÁÉÍÓÚ]+\s+(?:de|del)\s+\d{4})(?:\s+\d{1,2}:\d{2})?\s*",
    )
    .unwrap()
});

/// Listing pages frequently repeat the headline as the first line of the
/// article body. Strips the title (exact match or a shared four-word
/// prefix) and any date fragment that follows it. Runs to a fixed point
/// so repeated headlines collapse in one call.
pub fn dedupe_title_prefix(title: &str, body: &str) -> String {
    let title_norm = collapse_whitespace(title).to_lowercase();
    if title_norm.is_empty() {
        return body.trim().to_string();
    }
    let title_words: Vec<&str> = title_norm.split(' ').collect();
    let mut out = body.trim().to_string();

    loop {
        let lower = out.to_lowercase();
        let next = if lower.starts_with(&title_norm) {
            let skip = title_norm.chars().count();
            out.chars().skip(skip).collect::<String>()
        } else if common_word_prefix_len(&lower, &title_words) >= 4 {
            // A variant headline. Drop only the words it shares with the
            // title so a shorter variant never eats the opening sentence.
            drop_words(&out, common_word_prefix_len(&lower, &title_words))
        } else {
            break;
        };
        out = LEADING_DATE_RE.replace(next.trim_start(), "").trim().to_string();
        if out.is_empty() {
            break;
        }
    }
    out
}

fn common_word_prefix_len(body_lower: &str, title_words: &[&str]) -> usize {
    body_lower
        .split_whitespace()
        .zip(title_words)
        .take_while(|&(b, t)| b == *t)
        .count()
}

fn drop_words(s: &str, n: usize) -> String {
    let mut it = s.split_whitespace();
    for _ in 0..n {
        if it.next().is_none() {
            break;
        }
    }
    it.collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  a\n\t b   c "), "a b c");
    }

    #[test]
    fn strips_tribunal_ambiental_contact_block() {
        let raw = "El tribunal acogió la reclamación presentada por la comunidad. \
                   Acceder al expediente de la causaR-498-2025 Morandé 360, Piso 8, \
                   Santiago(56) 2 2393 69 00, Piso 8, Santiago(56) 2 2393 69 00\
                   contacto@tribunalambiental.cl.";
        let clean = clean_body(raw);
        assert!(!clean.contains("Acceder al expediente"));
        assert!(!clean.contains("Morandé 360"));
        assert!(!clean.contains("contacto@tribunalambiental.cl"));
        assert!(clean.contains("acogió la reclamación"));
    }

    #[test]
    fn clean_body_is_idempotent() {
        let raw = "<p>Texto  con   <b>etiquetas</b></p> Compartir \
                   Morandé 360, Piso 8, Santiago https://example.cl/x \
                   contacto@tribunalambiental.cl.";
        let once = clean_body(raw);
        assert_eq!(clean_body(&once), once);
    }

    #[test]
    fn strips_tags_and_urls() {
        let clean = clean_body("<div>Ver <a href='x'>texto</a> en https://pjud.cl/n/1 hoy</div>");
        assert_eq!(clean, "Ver texto en hoy");
    }

    #[test]
    fn title_loses_trailing_date_and_chrome() {
        assert_eq!(
            clean_title("Corte Suprema confirma fallo Compartir 12-08-2025 10:30"),
            "Corte Suprema confirma fallo"
        );
        assert_eq!(clean_title("  Dictamen N° 5 | "), "Dictamen N° 5");
    }

    #[test]
    fn clean_title_is_idempotent() {
        let once = clean_title("Noticia breve 01/02/2024");
        assert_eq!(clean_title(&once), once);
    }

    #[test]
    fn removes_exact_title_prefix_from_body() {
        let title = "Corte confirma multa a empresa";
        let body = "Corte confirma multa a empresa 12-08-2025 La Corte de Apelaciones confirmó la multa.";
        assert_eq!(
            dedupe_title_prefix(title, body),
            "La Corte de Apelaciones confirmó la multa."
        );
    }

    #[test]
    fn variant_headline_drop_stops_at_the_divergence() {
        let title = "Corte confirma multa a empresa sanitaria";
        // The body repeats a variant headline that diverges after word four;
        // only the shared words go.
        let body = "Corte confirma multa a la sanitaria El fallo quedó firme.";
        assert_eq!(
            dedupe_title_prefix(title, body),
            "la sanitaria El fallo quedó firme."
        );
    }

    #[test]
    fn shorter_variant_headline_keeps_the_opening_sentence() {
        let title = "Corte confirma multa a empresa sanitaria regional";
        // The body headline is one word shorter than the title; dropping a
        // full title's worth of words would swallow "El".
        let body = "Corte confirma multa a empresa sanitaria 12-08-2025 El fallo quedó firme.";
        assert_eq!(dedupe_title_prefix(title, body), "El fallo quedó firme.");
    }

    #[test]
    fn dedupe_is_idempotent_on_repeated_headline() {
        let title = "Titular repetido dos veces aqui";
        let body = "Titular repetido dos veces aqui Titular repetido dos veces aqui Cuerpo real.";
        let once = dedupe_title_prefix(title, body);
        assert_eq!(once, "Cuerpo real.");
        assert_eq!(dedupe_title_prefix(title, &once), once);
    }

    #[test]
    fn body_without_title_prefix_is_untouched() {
        let title = "Otro titular distinto";
        let body = "La Contraloría emitió un dictamen sobre la materia.";
        assert_eq!(dedupe_title_prefix(title, body), body);
    }
}
