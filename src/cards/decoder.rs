/// Detector label decoding
///
/// Turns a detector class name into a fully populated `CardAttributes`.
use super::{Attribute, CardAttributes, Color, Count, Fill, Shape};
use crate::error::DecodeError;

/// Decode a label such as `"clg1"` into its card attributes
///
/// The label is normalized first: every whitespace character is removed and
/// ASCII letters are lowercased. Exactly the 81 canonical labels decode; any
/// other input fails with `DecodeError::UnrecognizedLabel` carrying the label
/// as received.
pub fn decode(label: &str) -> Result<CardAttributes, DecodeError> {
    let normalized = normalize(label);
    let unrecognized = || DecodeError::UnrecognizedLabel(label.to_string());

    let mut codes = normalized.chars();
    let (Some(shape), Some(fill), Some(color), Some(count), None) = (
        codes.next(),
        codes.next(),
        codes.next(),
        codes.next(),
        codes.next(),
    ) else {
        return Err(unrecognized());
    };

    Ok(CardAttributes {
        shape: Shape::from_code(shape).ok_or_else(unrecognized)?,
        fill: Fill::from_code(fill).ok_or_else(unrecognized)?,
        color: Color::from_code(color).ok_or_else(unrecognized)?,
        count: Count::from_code(count).ok_or_else(unrecognized)?,
    })
}

/// Strip all whitespace and lowercase
fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
