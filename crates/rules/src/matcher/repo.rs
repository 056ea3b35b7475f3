//! Source pattern matching.

use crate::schema::SourcePattern;

/// Find the first pattern whose glob matches `source`.
///
/// Declaration order decides: a broad pattern declared before a more
/// specific one shadows it.
pub fn match_repo<'a, I>(source: &str, patterns: I) -> Option<(usize, &'a SourcePattern)>
where
    I: IntoIterator<Item = &'a SourcePattern>,
{
    patterns
        .into_iter()
        .enumerate()
        .find(|(_, p)| p.pattern.matches(source))
}

/// Destinations for an organization-level event without a repository.
///
/// Collects `notify_to` from every pattern written exactly as `<org>/*`,
/// de-duplicated in first-seen order.
pub fn org_destinations<'a, I>(org: &str, patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a SourcePattern>,
{
    let wanted = format!("{org}/*");
    let mut destinations: Vec<String> = Vec::new();
    for pattern in patterns {
        if pattern.pattern.as_str() != wanted {
            continue;
        }
        for dest in &pattern.notify_to {
            if !destinations.contains(dest) {
                destinations.push(dest.clone());
            }
        }
    }
    destinations
}
