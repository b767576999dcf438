//! Splits a call's arguments into positional values and one options mapping.

use super::error::NormalizeError;
use super::nodes::{Mapping, Normalized, Primitive};
use super::normalizer::Normalizer;
use crate::core::raw::{RawKind, RawNode};

/// Arguments of a call after normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifiedArguments {
    /// Non-mapping values in source order, empty results removed.
    pub positional: Vec<Normalized>,
    /// First mapping among the arguments, or an empty one.
    pub options: Mapping,
}

/// Classify the argument list of a call.
///
/// Every argument is normalized on its own. Keyword arguments and `{}` literals
/// both normalize to a mapping; only the first mapping becomes the options, any
/// later one is dropped.
pub fn classify(
    normalizer: &mut Normalizer<'_>,
    arguments: Option<&RawNode>,
) -> Result<ClassifiedArguments, NormalizeError> {
    let Some(arguments) = arguments else {
        return Ok(ClassifiedArguments::default());
    };
    let RawKind::Arguments(items) = &arguments.kind else {
        return Ok(ClassifiedArguments::default());
    };
    if items.is_empty() {
        return Ok(ClassifiedArguments::default());
    }

    let mut positional = Vec::new();
    let mut options = None;
    for item in items {
        match normalizer.normalize(item)? {
            Normalized::Primitive(Primitive::Mapping(mapping)) => {
                if options.is_none() {
                    options = Some(mapping);
                }
            }
            value if value.is_empty() => {}
            value => positional.push(value),
        }
    }

    Ok(ClassifiedArguments {
        positional,
        options: options.unwrap_or_default(),
    })
}
