use crate::cards::{Attribute, CardAttributes};
use crate::error::MatcherInputError;

/// Outcome of searching one frame's cards for a set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// No valid triple (or fewer than three cards)
    NoMatch,
    /// Strictly ascending, in-bounds indices of the three cards
    Match { indices: [usize; 3] },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match { .. })
    }

    pub fn indices(&self) -> Option<[usize; 3]> {
        match self {
            MatchResult::Match { indices } => Some(*indices),
            MatchResult::NoMatch => None,
        }
    }

    /// Per-card selection mask over a list of `len` cards
    pub fn membership(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        if let Some(indices) = self.indices() {
            for index in indices {
                if let Some(slot) = mask.get_mut(index) {
                    *slot = true;
                }
            }
        }
        mask
    }

    /// Rewrite indices through a lookup table (decoded position -> detection position)
    pub fn remap(&self, origin: &[usize]) -> MatchResult {
        match self {
            MatchResult::Match { indices } => MatchResult::Match {
                indices: indices.map(|i| origin[i]),
            },
            MatchResult::NoMatch => MatchResult::NoMatch,
        }
    }
}

impl From<Result<[usize; 3], MatcherInputError>> for MatchResult {
    fn from(result: Result<[usize; 3], MatcherInputError>) -> Self {
        match result {
            Ok(indices) => MatchResult::Match { indices },
            Err(_) => MatchResult::NoMatch,
        }
    }
}

/// All equal or all distinct
#[inline]
fn dimension_ok<T: Attribute>(a: T, b: T, c: T) -> bool {
    (a == b) == (b == c) && (a == b) == (a == c)
}

/// Check whether three cards form a set
///
/// Independently for each of the four dimensions, the three values must be
/// either all equal or pairwise distinct.
#[inline]
pub fn is_set(a: &CardAttributes, b: &CardAttributes, c: &CardAttributes) -> bool {
    dimension_ok(a.shape, b.shape, c.shape)
        && dimension_ok(a.fill, b.fill, c.fill)
        && dimension_ok(a.color, b.color, c.color)
        && dimension_ok(a.count, b.count, c.count)
}

/// The unique card completing a set with `a` and `b`
pub fn third_card(a: &CardAttributes, b: &CardAttributes) -> CardAttributes {
    CardAttributes {
        shape: Attribute::complete(a.shape, b.shape),
        fill: Attribute::complete(a.fill, b.fill),
        color: Attribute::complete(a.color, b.color),
        count: Attribute::complete(a.count, b.count),
    }
}

/// Search for a set, reporting why none was found
///
/// Candidates are visited with `i < j < k` ascending, so the lexicographically
/// smallest valid triple is returned.
pub fn solve(cards: &[CardAttributes]) -> Result<[usize; 3], MatcherInputError> {
    let n = cards.len();
    if n < 3 {
        return Err(MatcherInputError::TooFew { found: n });
    }

    for i in 0..n - 2 {
        for j in i + 1..n - 1 {
            for k in j + 1..n {
                if is_set(&cards[i], &cards[j], &cards[k]) {
                    return Ok([i, j, k]);
                }
            }
        }
    }

    Err(MatcherInputError::NoSet)
}

/// Find the first set among `cards`, or `NoMatch`
pub fn find_match(cards: &[CardAttributes]) -> MatchResult {
    let result = solve(cards);
    if let Err(reason) = result {
        tracing::trace!("No set: {}", reason);
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{decode, Color, Count, Fill, Shape};

    fn card(shape: Shape, fill: Fill, color: Color, count: Count) -> CardAttributes {
        CardAttributes::new(shape, fill, color, count)
    }

    fn cards(labels: &[&str]) -> Vec<CardAttributes> {
        labels.iter().map(|label| decode(label).unwrap()).collect()
    }

    #[test]
    fn test_counts_differ_rest_equal() {
        let hand = vec![
            card(Shape::Oval, Fill::Solid, Color::Red, Count::One),
            card(Shape::Oval, Fill::Solid, Color::Red, Count::Two),
            card(Shape::Oval, Fill::Solid, Color::Red, Count::Three),
        ];
        assert_eq!(find_match(&hand), MatchResult::Match { indices: [0, 1, 2] });
    }

    #[test]
    fn test_two_shapes_same_one_different() {
        let hand = vec![
            card(Shape::Oval, Fill::Solid, Color::Red, Count::One),
            card(Shape::Oval, Fill::Solid, Color::Green, Count::Two),
            card(Shape::Diamond, Fill::Solid, Color::Purple, Count::Three),
        ];
        assert_eq!(find_match(&hand), MatchResult::NoMatch);
    }

    #[test]
    fn test_every_valid_triple_matches() {
        let deck: Vec<CardAttributes> = CardAttributes::all().collect();
        for a in &deck {
            for b in &deck {
                if a == b {
                    continue;
                }
                let c = third_card(a, b);
                assert!(is_set(a, b, &c), "{a} {b} {c}");
                assert_eq!(find_match(&[*a, *b, c]), MatchResult::Match { indices: [0, 1, 2] });
            }
        }
    }

    #[test]
    fn test_every_invalid_triple_is_rejected() {
        let deck: Vec<CardAttributes> = CardAttributes::all().collect();
        let (a, b) = (deck[0], deck[40]);
        let completing = third_card(&a, &b);
        for c in deck.iter().filter(|c| **c != completing) {
            assert!(!is_set(&a, &b, c));
            assert_eq!(find_match(&[a, b, *c]), MatchResult::NoMatch);
        }
    }

    #[test]
    fn test_fewer_than_three_cards() {
        assert_eq!(find_match(&[]), MatchResult::NoMatch);
        assert_eq!(find_match(&cards(&["clg1", "clg2"])), MatchResult::NoMatch);
        assert_eq!(solve(&cards(&["clg1"])), Err(MatcherInputError::TooFew { found: 1 }));
    }

    #[test]
    fn test_tie_break_is_lexicographic() {
        // Both {0,2,3} and {1,2,4} are sets
        let hand = cards(&["clg1", "rdv1", "clg2", "clg3", "wgr3"]);
        let expected = solve(&hand).unwrap();
        assert_eq!(expected, [0, 2, 3]);
        for _ in 0..10 {
            assert_eq!(find_match(&hand), MatchResult::Match { indices: [0, 2, 3] });
        }
    }

    #[test]
    fn test_tie_break_prefers_lower_middle_index() {
        // Both {0,1,4} and {0,2,3} are sets; {0,1,4} is smaller
        let hand = cards(&["clg1", "clg2", "rdv1", "wgr1", "clg3"]);
        assert!(is_set(&hand[0], &hand[2], &hand[3]));
        assert_eq!(find_match(&hand), MatchResult::Match { indices: [0, 1, 4] });
    }

    #[test]
    fn test_duplicate_cards_are_not_a_set() {
        // Two identical cards can never share a set with a third distinct card
        let hand = cards(&["clg1", "clg1", "rdv3"]);
        assert_eq!(find_match(&hand), MatchResult::NoMatch);
    }

    #[test]
    fn test_hand_with_duplicate_detection() {
        let hand = cards(&["clg1", "clg3", "clg3", "rdv3", "wgr2"]);
        assert_eq!(find_match(&hand), MatchResult::Match { indices: [0, 3, 4] });
    }

    #[test]
    fn test_five_cards_without_set() {
        let hand = cards(&["clg1", "clg2", "clr1", "cdg1", "rlg1"]);
        assert_eq!(solve(&hand), Err(MatcherInputError::NoSet));
        assert_eq!(find_match(&hand), MatchResult::NoMatch);
    }

    #[test]
    fn test_membership_mask() {
        let result = MatchResult::Match { indices: [1, 3, 4] };
        assert_eq!(result.membership(5), vec![false, true, false, true, true]);
        assert_eq!(MatchResult::NoMatch.membership(3), vec![false; 3]);
    }

    #[test]
    fn test_remap_indices() {
        let result = MatchResult::Match { indices: [0, 1, 2] };
        assert_eq!(result.remap(&[1, 4, 6]), MatchResult::Match { indices: [1, 4, 6] });
        assert_eq!(MatchResult::NoMatch.remap(&[]), MatchResult::NoMatch);
    }

    #[test]
    fn test_set_free_hand_full_scan() {
        // Greedily collect cards that never complete a set: worst case for the scan
        let mut hand: Vec<CardAttributes> = Vec::new();
        for candidate in CardAttributes::all() {
            let completes = hand.iter().enumerate().any(|(i, a)| {
                hand[i + 1..].iter().any(|b| third_card(a, b) == candidate)
            });
            if !completes {
                hand.push(candidate);
            }
        }
        assert!(hand.len() >= 9);
        assert_eq!(find_match(&hand), MatchResult::NoMatch);

        let start = std::time::Instant::now();
        for _ in 0..1000 {
            let _ = find_match(&hand);
        }
        assert!(start.elapsed().as_millis() < 2000);
    }
}
