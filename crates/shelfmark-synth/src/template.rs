//! Deterministic title synthesis
//!
//! A naming template such as `Tipo + Dimensiones y/o cantidad de piezas + Color`
//! is split on `+`; each part is mapped to descriptor fields by keyword and
//! the values are joined in template order. When nothing in the template can
//! be filled, a generic `brand + category + description` title is used.

use shelfmark_extract::vocabulary::is_connector;
use shelfmark_extract::{title_case, ProductDescriptor};
use shelfmark_taxonomy::TaxonomyRecord;

use crate::SynthesisError;

/// Upper bound for synthesized titles, in characters.
pub const MAX_TITLE_CHARS: usize = 150;

/// `(descriptor, record) -> title`.
pub trait TitleSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    fn synthesize(
        &self,
        descriptor: &ProductDescriptor,
        record: &TaxonomyRecord,
    ) -> Result<String, SynthesisError>;
}

/// Descriptor field a template part refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSlot {
    Type,
    Brand,
    Dimensions,
    Quantity,
    Color,
    Model,
    Specifications,
    Material,
}

const SLOT_KEYWORDS: &[(TemplateSlot, &[&str])] = &[
    (TemplateSlot::Type, &["tipo", "type", "producto", "product", "categor", "nombre"]),
    (TemplateSlot::Brand, &["marca", "brand", "fabricante"]),
    (TemplateSlot::Model, &["modelo", "model", "patron", "patrón", "pattern", "diseño", "diseno"]),
    (
        TemplateSlot::Dimensions,
        &["dimension", "medida", "size", "tamaño", "tamano", "largo", "calibre"],
    ),
    (TemplateSlot::Quantity, &["cantidad", "pieza", "quantity", "pieces", "pzs"]),
    (TemplateSlot::Specifications, &["especificacion", "especificación", "specification", "spec", "caracter", "valor r", "r-value"]),
    (TemplateSlot::Material, &["material", "acabado", "finish"]),
    (TemplateSlot::Color, &["color", "colour", "tono"]),
];

/// Slots named by one template part, in the order they appear in the text.
pub fn part_slots(part: &str) -> Vec<TemplateSlot> {
    let lower = part.to_lowercase();
    let mut hits: Vec<(usize, TemplateSlot)> = SLOT_KEYWORDS
        .iter()
        .filter_map(|(slot, words)| {
            words
                .iter()
                .filter_map(|w| lower.find(w))
                .min()
                .map(|pos| (pos, *slot))
        })
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, slot)| slot).collect()
}

/// Parse a whole naming template into slots, duplicates dropped.
pub fn template_slots(template: &str) -> Vec<TemplateSlot> {
    let mut out = Vec::new();
    for part in template.split('+') {
        for slot in part_slots(part) {
            if !out.contains(&slot) {
                out.push(slot);
            }
        }
    }
    out
}

/// Title-case every word, keeping connector words lower-case after the first.
pub fn title_case_phrase(text: &str) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(i, w)| {
            if i > 0 && is_connector(&w.to_uppercase()) {
                w.to_lowercase()
            } else {
                title_case(w)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn material_gloss(descriptor: &ProductDescriptor) -> Option<String> {
    descriptor
        .detected_domain_terms
        .iter()
        .find(|t| t.tag.starts_with("material-") || t.tag.starts_with("finish-"))
        .map(|t| title_case(&t.gloss))
}

fn slot_value(
    slot: TemplateSlot,
    descriptor: &ProductDescriptor,
    record: &TaxonomyRecord,
) -> Option<String> {
    match slot {
        TemplateSlot::Type => Some(
            descriptor
                .product_type
                .as_deref()
                .map(title_case_phrase)
                .unwrap_or_else(|| title_case_phrase(record.category())),
        ),
        TemplateSlot::Brand => descriptor.brand.clone(),
        TemplateSlot::Dimensions => descriptor.dimensions.clone(),
        TemplateSlot::Quantity => descriptor.quantity.clone(),
        TemplateSlot::Color => descriptor.color.clone(),
        TemplateSlot::Model => descriptor.tile_pattern.as_deref().map(title_case),
        TemplateSlot::Specifications => descriptor
            .r_value
            .clone()
            .or_else(|| descriptor.enrichment.get("specifications").cloned()),
        TemplateSlot::Material => material_gloss(descriptor),
    }
}

/// Collapse whitespace and cap at [`MAX_TITLE_CHARS`] (`...` marks a cut).
pub fn finish_title(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_TITLE_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(MAX_TITLE_CHARS - 3).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// Fill `record`'s naming template from `descriptor`.
///
/// Returns `None` when the template names no slot at all. Values already
/// present in the title (case-insensitive) are not repeated.
pub fn join_template(descriptor: &ProductDescriptor, record: &TaxonomyRecord) -> Option<String> {
    let slots = template_slots(record.naming_template());
    if slots.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    for slot in slots {
        let Some(value) = slot_value(slot, descriptor, record) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let lower = value.to_lowercase();
        if parts.iter().any(|p| p.to_lowercase().contains(&lower)) {
            continue;
        }
        parts.push(value.to_string());
    }
    (!parts.is_empty()).then(|| finish_title(&parts.join(" ")))
}

fn push_unique_words(parts: &mut Vec<String>, text: &str) {
    let fresh: Vec<&str> = text
        .split_whitespace()
        .filter(|w| {
            !parts
                .iter()
                .flat_map(|p| p.split_whitespace())
                .any(|seen| seen.to_lowercase() == w.to_lowercase())
        })
        .collect();
    if !fresh.is_empty() {
        parts.push(fresh.join(" "));
    }
}

/// Generic title when the template gives nothing: brand, category, the first
/// four words of the description, then color, dimensions and model. Words
/// already used are not repeated.
pub fn safe_fallback_title(descriptor: &ProductDescriptor, record: Option<&TaxonomyRecord>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(brand) = &descriptor.brand {
        parts.push(brand.clone());
    }
    if let Some(record) = record {
        push_unique_words(&mut parts, &title_case_phrase(record.category()));
    }
    let description = descriptor
        .description
        .as_deref()
        .unwrap_or(descriptor.raw_title());
    for word in description.split_whitespace().take(4) {
        push_unique_words(&mut parts, word);
    }
    for extra in [&descriptor.color, &descriptor.dimensions, &descriptor.tile_pattern]
        .into_iter()
        .flatten()
    {
        push_unique_words(&mut parts, extra);
    }
    let title = finish_title(&parts.join(" "));
    if title.is_empty() {
        "Product Item".to_string()
    } else {
        title
    }
}

/// Naming-template join with [`safe_fallback_title`] as the last resort.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSynthesizer;

impl TitleSynthesizer for TemplateSynthesizer {
    fn name(&self) -> &str {
        "template"
    }

    fn synthesize(
        &self,
        descriptor: &ProductDescriptor,
        record: &TaxonomyRecord,
    ) -> Result<String, SynthesisError> {
        Ok(join_template(descriptor, record)
            .unwrap_or_else(|| safe_fallback_title(descriptor, Some(record))))
    }
}
