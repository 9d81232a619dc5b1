//! Keyword-driven refinement of the per-source default taxonomy, plus
//! small extractors for case metadata (rol, tribunal, region) and legal
//! vocabulary tags.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Category, DocumentType, Jurisdiction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub jurisdiction: Jurisdiction,
    pub document_type: DocumentType,
}

/// Refines source defaults with signals from the title and body. Source
/// defaults win unless the text carries a stronger signal.
pub fn classify(
    text: &str,
    default_category: Category,
    default_jurisdiction: Jurisdiction,
    default_document_type: DocumentType,
) -> Classification {
    let lower = text.to_lowercase();
    let mut out = Classification {
        category: default_category,
        jurisdiction: default_jurisdiction,
        document_type: default_document_type,
    };

    if contains_any(&lower, &["sentencia", "fallo judicial", "falla a favor", "fallo de"]) {
        out.document_type = DocumentType::Fallo;
        out.category = Category::Fallos;
    } else if lower.contains("dictamen") {
        out.document_type = DocumentType::Dictamen;
    } else if contains_any(&lower, &["resolución exenta", "resolucion exenta", "resolución n°"]) {
        out.document_type = DocumentType::Resolucion;
    } else if lower.contains("audiencia") {
        out.document_type = DocumentType::Audiencia;
    } else if lower.contains("comunicado") {
        out.document_type = DocumentType::Comunicado;
    } else if lower.contains("circular") {
        out.document_type = DocumentType::Circular;
    }

    if out.jurisdiction == Jurisdiction::General || out.jurisdiction == Jurisdiction::Nacional {
        if contains_any(
            &lower,
            &["penal", "imputado", "condena", "delito", "prisión preventiva", "fiscalía"],
        ) {
            out.jurisdiction = Jurisdiction::Penal;
        } else if contains_any(&lower, &["laboral", "trabajador", "despido", "sindicato"]) {
            out.jurisdiction = Jurisdiction::Laboral;
        } else if contains_any(&lower, &["ambiental", "medio ambiente", "contaminación"]) {
            out.jurisdiction = Jurisdiction::Ambiental;
        } else if contains_any(&lower, &["tributario", "impuesto", "iva", "renta"]) {
            out.jurisdiction = Jurisdiction::Administrativo;
            out.category = Category::Tributario;
        } else if contains_any(&lower, &["constitucional", "inaplicabilidad"]) {
            out.jurisdiction = Jurisdiction::Constitucional;
        } else if contains_any(&lower, &["libre competencia", "colusión", "mercado"]) {
            out.jurisdiction = Jurisdiction::Comercial;
        }
    }

    out
}

static CASE_ROLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\brol\s*(?:n[°º.]?\s*)?([A-Z]{0,3}[\s-]?\d+-\d{2,4})").unwrap());
static CASE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcausa\s*(?:n[°º.]?\s*)?([A-Z]{0,3}-?\d+-\d{2,4})").unwrap());

/// Case role like "Rol 12.345-2024" or "Rol C-123-2024".
pub fn extract_case_role(text: &str) -> Option<String> {
    CASE_ROLE_RE
        .captures(text)
        .map(|c| c[1].trim().replace(' ', ""))
}

pub fn extract_case_number(text: &str) -> Option<String> {
    CASE_NUMBER_RE.captures(text).map(|c| c[1].trim().to_string())
}

const TRIBUNALS: &[&str] = &[
    "Corte Suprema",
    "Corte de Apelaciones",
    "Tribunal Constitucional",
    "Tribunal de Defensa de la Libre Competencia",
    "Tribunal Ambiental",
    "Tribunal de Contratación Pública",
    "Tribunal de Propiedad Industrial",
    "Juzgado de Garantía",
    "Tribunal Oral en lo Penal",
    "Juzgado de Letras",
    "Juzgado de Familia",
];

pub fn extract_tribunal(text: &str) -> Option<String> {
    TRIBUNALS
        .iter()
        .find(|t| text.contains(*t))
        .map(|t| t.to_string())
}

const REGIONS: &[&str] = &[
    "Arica y Parinacota",
    "Tarapacá",
    "Antofagasta",
    "Atacama",
    "Coquimbo",
    "Valparaíso",
    "Metropolitana",
    "O'Higgins",
    "Maule",
    "Ñuble",
    "Biobío",
    "La Araucanía",
    "Los Ríos",
    "Los Lagos",
    "Aysén",
    "Magallanes",
];

pub fn extract_region(text: &str) -> Option<String> {
    REGIONS
        .iter()
        .find(|r| text.contains(*r))
        .map(|r| r.to_string())
}

const LEGAL_TERMS: &[&str] = &[
    "sentencia",
    "recurso de protección",
    "recurso de casación",
    "recurso de apelación",
    "dictamen",
    "sumario",
    "querella",
    "demanda",
    "condena",
    "absolución",
    "prisión preventiva",
    "medida cautelar",
    "reclamación",
    "licitación",
    "fiscalización",
    "jurisprudencia",
    "indemnización",
    "nulidad",
];

/// Legal vocabulary found in the text, in catalog order, capped at 10.
/// These feed the record's free-form tags.
pub fn extract_tags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    LEGAL_TERMS
        .iter()
        .filter(|t| lower.contains(*t))
        .take(10)
        .map(|t| t.to_string())
        .collect()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
