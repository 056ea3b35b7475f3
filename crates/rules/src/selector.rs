//! Tag-affinity template selection.

use tracing::debug;

use crate::error::SelectionError;
use crate::schema::{TemplateCatalog, TemplateVariant};

/// Count (context tag, variant tag) pairs that are equal, duplicates included.
pub fn tag_score<C, V>(context_tags: &[C], variant_tags: &[V]) -> usize
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    context_tags
        .iter()
        .map(|c| {
            variant_tags
                .iter()
                .filter(|v| v.as_ref() == c.as_ref())
                .count()
        })
        .sum()
}

/// Pick the best-scoring variant for `event` from `catalog`.
///
/// Variants are scanned in declaration order and only a strictly greater
/// score replaces the current pick, so ties go to the earliest variant. A
/// zero-score variant is still returned when nothing scores higher.
pub fn select_template<'a, T>(
    event: &str,
    tags: &[T],
    catalog: &'a TemplateCatalog,
) -> Result<&'a TemplateVariant, SelectionError>
where
    T: AsRef<str>,
{
    let family = catalog
        .family(event)
        .ok_or_else(|| SelectionError::UnknownEvent {
            event: event.to_string(),
        })?;

    let mut best: Option<(usize, usize)> = None;
    for (index, variant) in family.payloads.iter().enumerate() {
        let score = tag_score(tags, &variant.tags);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }

    let (index, score) = best.ok_or_else(|| SelectionError::EmptyFamily {
        event: event.to_string(),
    })?;
    debug!(event, variant = index, score, "selected template variant");
    Ok(&family.payloads[index])
}
