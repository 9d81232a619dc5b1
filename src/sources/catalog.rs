//! Static catalog of the harvested institutions. Each entry carries the
//! listing location, the default taxonomy and the per-source filtering
//! knobs; the adapter kind selects which listing strategy applies.

use crate::model::{Category, DocumentType, Jurisdiction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Poder Judicial newsroom: anchor mining with a keyword allowlist.
    PoderJudicial,
    /// Generic listing page: anchors whose href contains a needle.
    Index,
    /// XML sitemap of posts (quick-xml).
    Sitemap,
    /// RSS/Atom feed (feed-rs).
    Rss,
    /// SII newsroom: article codes mined from the index markup.
    SiiCodes,
    /// WordPress-style listing with entry-title anchors.
    WordPress,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub code: &'static str,
    pub display_name: &'static str,
    pub base_url: &'static str,
    pub listing_url: &'static str,
    pub kind: SourceKind,
    pub category: Category,
    pub jurisdiction: Jurisdiction,
    pub document_type: DocumentType,
    /// Anchor-text allowlist; empty means accept everything.
    pub keywords: &'static [&'static str],
    /// Anchor-text blocklist, checked after the allowlist.
    pub exclusions: &'static [&'static str],
    /// href substrings that mark article links for `Index` listings.
    pub link_needles: &'static [&'static str],
    /// Prepended to every title, e.g. the environmental courts' ordinal.
    pub title_prefix: Option<&'static str>,
    /// Content selectors tried in order before the paragraph fallback.
    pub body_selectors: &'static [&'static str],
}

pub static CATALOG: &[SourceConfig] = &[
    SourceConfig {
        code: "poder_judicial",
        display_name: "Poder Judicial de Chile",
        base_url: "https://www.pjud.cl",
        listing_url: "https://www.pjud.cl/prensa-y-comunicaciones/noticias-del-poder-judicial",
        kind: SourceKind::PoderJudicial,
        category: Category::Tribunal,
        jurisdiction: Jurisdiction::Nacional,
        document_type: DocumentType::Noticia,
        keywords: &[
            "corte", "tribunal", "fallo", "sentencia", "juez", "jueza", "ministro",
            "condena", "recurso", "judicial", "audiencia",
        ],
        exclusions: &["licitación", "concurso público", "remate", "postulación"],
        link_needles: &["/noticias-del-poder-judicial/"],
        title_prefix: None,
        body_selectors: &[".noticia-contenido", ".field--name-body", "article .content"],
    },
    SourceConfig {
        code: "contraloria",
        display_name: "Contraloría General de la República",
        base_url: "https://www.contraloria.cl",
        listing_url: "https://www.contraloria.cl/web/cgr/noticias",
        kind: SourceKind::Index,
        category: Category::Contraloria,
        jurisdiction: Jurisdiction::Administrativo,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &["ver todas", "archivo"],
        link_needles: &["noticia", "/content/"],
        title_prefix: None,
        body_selectors: &[".journal-content-article", ".noticia-detalle", ".asset-content"],
    },
    SourceConfig {
        code: "cde",
        display_name: "Consejo de Defensa del Estado",
        base_url: "https://www.cde.cl",
        listing_url: "https://www.cde.cl/post-sitemap.xml",
        kind: SourceKind::Sitemap,
        category: Category::Organismo,
        jurisdiction: Jurisdiction::Nacional,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: None,
        body_selectors: &[".entry-content", ".post-content"],
    },
    SourceConfig {
        code: "ministerio_justicia",
        display_name: "Ministerio de Justicia y Derechos Humanos",
        base_url: "https://www.minjusticia.gob.cl",
        listing_url: "https://www.minjusticia.gob.cl/category/noticias/feed/",
        kind: SourceKind::Rss,
        category: Category::Ministerio,
        jurisdiction: Jurisdiction::Nacional,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: None,
        body_selectors: &[".entry-content", ".post-content"],
    },
    SourceConfig {
        code: "sii",
        display_name: "Servicio de Impuestos Internos",
        base_url: "https://www.sii.cl",
        listing_url: "https://www.sii.cl/noticias/2025/index.html",
        kind: SourceKind::SiiCodes,
        category: Category::Tributario,
        jurisdiction: Jurisdiction::Administrativo,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: None,
        body_selectors: &["#main_content", ".contenido", "#contenido"],
    },
    SourceConfig {
        code: "dpp",
        display_name: "Defensoría Penal Pública",
        base_url: "https://www.dpp.cl",
        listing_url: "https://www.dpp.cl/sala_prensa/noticias",
        kind: SourceKind::Index,
        category: Category::Defensoria,
        jurisdiction: Jurisdiction::Penal,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &["galería", "video"],
        link_needles: &["noticia"],
        title_prefix: None,
        body_selectors: &[".noticia-texto", ".field-item", "article"],
    },
    SourceConfig {
        code: "tta",
        display_name: "Tribunales Tributarios y Aduaneros",
        base_url: "https://www.tta.cl",
        listing_url: "https://www.tta.cl/category/noticias/",
        kind: SourceKind::WordPress,
        category: Category::Tribunal,
        jurisdiction: Jurisdiction::Administrativo,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: None,
        body_selectors: &[".entry-content"],
    },
    SourceConfig {
        code: "inapi",
        display_name: "Instituto Nacional de Propiedad Industrial",
        base_url: "https://www.inapi.cl",
        listing_url: "https://www.inapi.cl/sala-de-prensa/noticias",
        kind: SourceKind::Index,
        category: Category::Organismo,
        jurisdiction: Jurisdiction::Comercial,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &["ver más noticias"],
        link_needles: &["noticia", "/sala-de-prensa/"],
        title_prefix: None,
        body_selectors: &[".news-body", ".field--name-body", "article"],
    },
    SourceConfig {
        code: "dt",
        display_name: "Dirección del Trabajo",
        base_url: "https://www.dt.gob.cl",
        listing_url: "https://www.dt.gob.cl/portal/1627/w3-channel.html",
        kind: SourceKind::Index,
        category: Category::Organismo,
        jurisdiction: Jurisdiction::Laboral,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &["suscríbete"],
        link_needles: &["w3-article"],
        title_prefix: None,
        body_selectors: &["#main_content", ".cuerpo", "article"],
    },
    SourceConfig {
        code: "tdlc",
        display_name: "Tribunal de Defensa de la Libre Competencia",
        base_url: "https://www.tdlc.cl",
        listing_url: "https://www.tdlc.cl/noticias/",
        kind: SourceKind::WordPress,
        category: Category::Tribunal,
        jurisdiction: Jurisdiction::Comercial,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: None,
        body_selectors: &[".entry-content", ".post-content"],
    },
    SourceConfig {
        code: "1ta",
        display_name: "Primer Tribunal Ambiental",
        base_url: "https://www.1ta.cl",
        listing_url: "https://www.1ta.cl/category/noticias/",
        kind: SourceKind::WordPress,
        category: Category::Ambiental,
        jurisdiction: Jurisdiction::Ambiental,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: Some("(1º)"),
        body_selectors: &[".entry-content"],
    },
    SourceConfig {
        code: "tribunal_ambiental",
        display_name: "Segundo Tribunal Ambiental",
        base_url: "https://tribunalambiental.cl",
        listing_url: "https://tribunalambiental.cl/category/noticias/",
        kind: SourceKind::WordPress,
        category: Category::Ambiental,
        jurisdiction: Jurisdiction::Ambiental,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: Some("(2º)"),
        body_selectors: &[".entry-content"],
    },
    SourceConfig {
        code: "3ta",
        display_name: "Tercer Tribunal Ambiental",
        base_url: "https://3ta.cl",
        listing_url: "https://3ta.cl/category/noticias/",
        kind: SourceKind::WordPress,
        category: Category::Ambiental,
        jurisdiction: Jurisdiction::Ambiental,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: Some("(3º)"),
        body_selectors: &[".entry-content"],
    },
    SourceConfig {
        code: "tdpi",
        display_name: "Tribunal de Propiedad Industrial",
        base_url: "https://www.tdpi.cl",
        listing_url: "https://www.tdpi.cl/category/noticias/",
        kind: SourceKind::WordPress,
        category: Category::Tribunal,
        jurisdiction: Jurisdiction::Comercial,
        document_type: DocumentType::Noticia,
        keywords: &[],
        exclusions: &[],
        link_needles: &[],
        title_prefix: None,
        body_selectors: &[".entry-content"],
    },
];

pub fn find(code: &str) -> Option<&'static SourceConfig> {
    CATALOG.iter().find(|s| s.code == code)
}
