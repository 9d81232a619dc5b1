//! Publication-date recovery from article pages. Sources rarely agree on
//! a date format, so extraction runs a fixed strategy order and the first
//! hit wins: date-bearing elements, free text, the URL path, meta tags.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static DATE_ELEMENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "time[datetime]",
        "time",
        ".fecha",
        ".fecha-publicacion",
        ".fecha-noticia",
        ".noticia-fecha",
        ".date",
        ".entry-date",
        ".post-date",
        ".published",
        "[datetime]",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static META_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"meta[property="article:published_time"]"#,
        r#"meta[name="publish_date"]"#,
        r#"meta[name="date"]"#,
        r#"meta[name="pubdate"]"#,
        r#"meta[property="og:updated_time"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

/// Runs the four strategies in order against a parsed document.
pub fn extract_date(doc: &Html, url: &str) -> Option<DateTime<Utc>> {
    from_date_elements(doc)
        .or_else(|| parse_date_text(&page_text(doc)))
        .or_else(|| from_url(url))
        .or_else(|| from_meta_tags(doc))
}

fn from_date_elements(doc: &Html) -> Option<DateTime<Utc>> {
    for sel in DATE_ELEMENT_SELECTORS.iter() {
        for el in doc.select(sel) {
            if let Some(attr) = el.value().attr("datetime") {
                if let Some(dt) = parse_iso(attr) {
                    return Some(dt);
                }
            }
            let text = el.text().collect::<String>();
            if let Some(dt) = parse_date_text(&text) {
                return Some(dt);
            }
        }
    }
    None
}

fn page_text(doc: &Html) -> String {
    // Free-text scan only needs the opening stretch of the page.
    doc.root_element().text().collect::<String>().chars().take(4000).collect()
}

static URL_DATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/(\d{4})/(\d{1,2})/(\d{1,2})/",
        r"(\d{4})-(\d{1,2})-(\d{1,2})",
        r"(\d{1,2})-(\d{1,2})-(\d{4})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

fn from_url(url: &str) -> Option<DateTime<Utc>> {
    for (i, re) in URL_DATE_RES.iter().enumerate() {
        if let Some(c) = re.captures(url) {
            let (y, m, d) = if i == 2 {
                (num(&c, 3)?, num(&c, 2)?, num(&c, 1)?)
            } else {
                (num(&c, 1)?, num(&c, 2)?, num(&c, 3)?)
            };
            if let Some(dt) = to_utc(y, m, d) {
                return Some(dt);
            }
        }
    }
    None
}

fn from_meta_tags(doc: &Html) -> Option<DateTime<Utc>> {
    for sel in META_SELECTORS.iter() {
        for el in doc.select(sel) {
            if let Some(content) = el.value().attr("content") {
                if let Some(dt) = parse_iso(content).or_else(|| parse_date_text(content)) {
                    return Some(dt);
                }
            }
        }
    }
    None
}

static ISO_DATETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2})(?::(\d{2}))?").unwrap());
static DMY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})\b").unwrap());
static YMD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static SPANISH_LONG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s+de\s+([a-záéíóú]+)\s+(?:de|del)\s+(\d{4})").unwrap()
});
static MONTH_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-záéíóú]{3,})\.?\s+(\d{1,2}),?\s+(\d{4})").unwrap());
static DAY_MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s+([a-záéíóú]{3,})\.?\s+(\d{4})").unwrap());
static DMY_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2})\b").unwrap());

/// Parses a date out of arbitrary prose. Patterns are tried in a fixed
/// order; every candidate match of a pattern is checked before falling
/// through to the next, so "99/99/2024 ... 12/08/2024" still resolves.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    for c in ISO_DATETIME_RE.captures_iter(text) {
        let (y, m, d) = (num(&c, 1)?, num(&c, 2)?, num(&c, 3)?);
        let (h, min) = (num(&c, 4)?, num(&c, 5)?);
        let s = c.get(6).and_then(|v| v.as_str().parse().ok()).unwrap_or(0);
        if let chrono::LocalResult::Single(dt) = Utc.with_ymd_and_hms(y as i32, m, d, h, min, s) {
            return Some(dt);
        }
    }
    for c in DMY_RE.captures_iter(text) {
        if let Some(dt) = to_utc(num(&c, 3)?, num(&c, 2)?, num(&c, 1)?) {
            return Some(dt);
        }
    }
    for c in YMD_RE.captures_iter(text) {
        if let Some(dt) = to_utc(num(&c, 1)?, num(&c, 2)?, num(&c, 3)?) {
            return Some(dt);
        }
    }
    for c in SPANISH_LONG_RE.captures_iter(text) {
        if let Some(m) = month_number(&c[2]) {
            if let Some(dt) = to_utc(num(&c, 3)?, m, num(&c, 1)?) {
                return Some(dt);
            }
        }
    }
    for c in MONTH_FIRST_RE.captures_iter(text) {
        if let Some(m) = month_number(&c[1]) {
            if let Some(dt) = to_utc(num(&c, 3)?, m, num(&c, 2)?) {
                return Some(dt);
            }
        }
    }
    for c in DAY_MONTH_YEAR_RE.captures_iter(text) {
        if let Some(m) = month_number(&c[2]) {
            if let Some(dt) = to_utc(num(&c, 3)?, m, num(&c, 1)?) {
                return Some(dt);
            }
        }
    }
    for c in DMY_SHORT_RE.captures_iter(text) {
        let y = pivot_two_digit_year(num(&c, 3)?);
        if let Some(dt) = to_utc(y, num(&c, 2)?, num(&c, 1)?) {
            return Some(dt);
        }
    }
    None
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s.trim(), fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn num(c: &regex::Captures<'_>, i: usize) -> Option<u32> {
    c.get(i)?.as_str().parse().ok()
}

/// Two-digit years pivot at 50: 00-49 map to 2000-2049, 50-99 to 1950-1999.
fn pivot_two_digit_year(y: u32) -> u32 {
    if y < 50 {
        2000 + y
    } else {
        1900 + y
    }
}

fn to_utc(y: u32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(y as i32, m, d)?;
    let naive = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let spanish = [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ];
    if let Some(i) = spanish.iter().position(|m| *m == lower) {
        return Some(i as u32 + 1);
    }
    let english = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    english
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd(dt: DateTime<Utc>) -> (i32, u32, u32) {
        (dt.year(), dt.month(), dt.day())
    }

    #[test]
    fn parses_numeric_dmy() {
        let dt = parse_date_text("Publicado el 12-08-2025 en Santiago").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
        let dt = parse_date_text("12/08/2025").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
    }

    #[test]
    fn parses_spanish_long_form() {
        let dt = parse_date_text("Santiago, 5 de agosto de 2025.").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 5));
        let dt = parse_date_text("1 de enero del 2024").unwrap();
        assert_eq!(ymd(dt), (2024, 1, 1));
    }

    #[test]
    fn parses_month_first_and_day_month_year() {
        let dt = parse_date_text("Agosto 12, 2025").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
        let dt = parse_date_text("12 agosto 2025").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
    }

    #[test]
    fn parses_iso_with_time() {
        let dt = parse_date_text("2025-08-12T10:30:00 algo").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
        assert_eq!(dt.format("%H:%M").to_string(), "10:30");
    }

    #[test]
    fn two_digit_years_pivot_at_fifty() {
        let dt = parse_date_text("12/08/25").unwrap();
        assert_eq!(dt.year(), 2025);
        let dt = parse_date_text("12/08/99").unwrap();
        assert_eq!(dt.year(), 1999);
    }

    #[test]
    fn invalid_calendar_dates_fall_through_to_later_matches() {
        let dt = parse_date_text("ref 99/99/2024 publicado 12/08/2024").unwrap();
        assert_eq!(ymd(dt), (2024, 8, 12));
        assert!(parse_date_text("31/02/2024").is_none());
    }

    #[test]
    fn date_element_beats_free_text() {
        let html = Html::parse_document(
            r#"<html><body>
                 <time datetime="2025-08-12T09:00:00Z">hoy</time>
                 <p>Texto con otra fecha 01-01-2020</p>
               </body></html>"#,
        );
        let dt = extract_date(&html, "https://x.cl/nota").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
    }

    #[test]
    fn falls_back_to_url_path() {
        let html = Html::parse_document("<html><body><p>Sin fecha visible aqui</p></body></html>");
        let dt = extract_date(&html, "https://x.cl/2025/08/12/nota-sin-fecha").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
    }

    #[test]
    fn falls_back_to_meta_tags() {
        let html = Html::parse_document(
            r#"<html><head>
                 <meta property="article:published_time" content="2025-08-12T08:00:00+00:00">
               </head><body><p>Nada que fechar en el cuerpo</p></body></html>"#,
        );
        let dt = extract_date(&html, "https://x.cl/nota").unwrap();
        assert_eq!(ymd(dt), (2025, 8, 12));
    }

    #[test]
    fn no_date_anywhere_returns_none() {
        let html = Html::parse_document("<html><body><p>Texto plano</p></body></html>");
        assert!(extract_date(&html, "https://x.cl/nota").is_none());
    }
}
