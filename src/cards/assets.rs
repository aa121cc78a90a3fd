/// Presentation asset lookup
///
/// Maps each of the 81 cards to the key of the image shown in a result slot.
/// The table is built once on first use.
use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::CardAttributes;

/// Asset shown in every slot when no set is on screen
pub const PLACEHOLDER_ASSET: &str = "red_cross";

static ASSET_TABLE: Lazy<HashMap<CardAttributes, String>> = Lazy::new(|| {
    CardAttributes::all()
        .map(|card| (card, format!("card_{}", card.label())))
        .collect()
});

/// Asset key for a card
pub fn asset_key(card: &CardAttributes) -> &'static str {
    ASSET_TABLE
        .get(card)
        .map(String::as_str)
        .unwrap_or(PLACEHOLDER_ASSET)
}
