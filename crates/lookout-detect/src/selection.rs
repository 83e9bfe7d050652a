//! Best-match selection across redundant templates.
//!
//! An element state is usually backed by several template images (theme
//! and rendering variants). These helpers reduce the raw matches of such a
//! template set to one result per distinct screen location.

use tracing::debug;

use lookout_core::{Error, MatchLocation, Region, Result, TemplateImage};

use crate::matcher::TemplateMatcher;

/// Find the single best match across a set of templates.
///
/// Every template that is found must land in (almost) the same screen
/// region; templates of one element in different locations indicate either
/// a bad template set or two instances of the element, and fail with
/// [`Error::DuplicateMatch`]. Returns the index of the winning template
/// and its match, or `None` when nothing matched.
pub fn best_match(
    matcher: &dyn TemplateMatcher,
    templates: &[TemplateImage],
    region: Option<&Region>,
    min_overlap: f64,
) -> Result<Option<(usize, MatchLocation)>> {
    let mut best: Option<(usize, MatchLocation)> = None;
    for (index, template) in templates.iter().enumerate() {
        let Some(found) = matcher.find(template, region)? else {
            continue;
        };
        debug!(template = template.name(), score = found.score, "template matched");
        match best {
            None => best = Some((index, found)),
            Some((best_index, best_found)) => {
                if !best_found.region.same_region(&found.region, min_overlap) {
                    return Err(Error::DuplicateMatch {
                        what: format!(
                            "templates '{}' and '{}'",
                            templates[best_index].name(),
                            template.name()
                        ),
                        regions: vec![best_found.region, found.region],
                    });
                }
                if found.score > best_found.score {
                    best = Some((index, found));
                }
            }
        }
    }
    Ok(best)
}

/// Find the best match per distinct screen location across a set of
/// templates.
///
/// Matches landing in (almost) the same region are collapsed to the one
/// with the highest score; matches in different regions are kept separate.
/// Returns `(template index, match)` pairs in discovery order.
pub fn best_matches(
    matcher: &dyn TemplateMatcher,
    templates: &[TemplateImage],
    region: Option<&Region>,
    min_overlap: f64,
) -> Result<Vec<(usize, MatchLocation)>> {
    let mut best: Vec<(usize, MatchLocation)> = Vec::new();
    for (index, template) in templates.iter().enumerate() {
        for found in matcher.find_all(template, region)? {
            match best
                .iter_mut()
                .find(|(_, kept)| kept.region.same_region(&found.region, min_overlap))
            {
                Some(entry) => {
                    if found.score > entry.1.score {
                        *entry = (index, found);
                    }
                }
                None => best.push((index, found)),
            }
        }
    }
    Ok(best)
}
