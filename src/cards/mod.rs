/// Card model for the SET game
///
/// Every card has four ternary attributes. A detector label encodes them as
/// four positional characters: shape, fill, color, count (e.g. `clg1`).
///
/// ## Usage
///
/// ```rust,ignore
/// use set_solver::cards::{decode, CardAttributes};
///
/// let card = decode("rdv3")?;
/// assert_eq!(card.label(), "rdv3");
/// let asset = set_solver::cards::asset_key(&card);
/// ```

pub mod assets;
pub mod decoder;

pub use assets::asset_key;
pub use decoder::decode;

/// Shape printed on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    Oval,
    Diamond,
    Squiggle,
}

/// Shading of the shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fill {
    Solid,
    Striped,
    Open,
}

/// Ink color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Green,
    Red,
    Purple,
}

/// Number of shapes on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Count {
    One,
    Two,
    Three,
}

/// Shared behaviour of the four ternary dimensions
pub trait Attribute: Copy + Eq + Sized + 'static {
    /// The three values, in code order
    const VALUES: [Self; 3];

    /// Single-character label code
    fn code(self) -> char;

    /// Parse a (lowercase) label code
    fn from_code(code: char) -> Option<Self> {
        Self::VALUES.into_iter().find(|value| value.code() == code)
    }

    /// Position within `VALUES` (0..3)
    fn ordinal(self) -> usize {
        Self::VALUES
            .iter()
            .position(|value| *value == self)
            .unwrap_or_default()
    }

    /// The value that is neither `a` nor `b`, or `a` itself when they agree
    fn complete(a: Self, b: Self) -> Self {
        if a == b {
            return a;
        }
        // Ordinals 0 + 1 + 2 = 3
        Self::VALUES[3 - a.ordinal() - b.ordinal()]
    }
}

impl Attribute for Shape {
    const VALUES: [Self; 3] = [Shape::Oval, Shape::Diamond, Shape::Squiggle];

    fn code(self) -> char {
        match self {
            Shape::Oval => 'c',
            Shape::Diamond => 'r',
            Shape::Squiggle => 'w',
        }
    }
}

impl Attribute for Fill {
    const VALUES: [Self; 3] = [Fill::Solid, Fill::Striped, Fill::Open];

    fn code(self) -> char {
        match self {
            Fill::Solid => 'l',
            Fill::Striped => 'g',
            Fill::Open => 'd',
        }
    }
}

impl Attribute for Color {
    const VALUES: [Self; 3] = [Color::Green, Color::Red, Color::Purple];

    fn code(self) -> char {
        match self {
            Color::Green => 'g',
            Color::Red => 'r',
            Color::Purple => 'v',
        }
    }
}

impl Attribute for Count {
    const VALUES: [Self; 3] = [Count::One, Count::Two, Count::Three];

    fn code(self) -> char {
        match self {
            Count::One => '1',
            Count::Two => '2',
            Count::Three => '3',
        }
    }
}

/// The four attributes of one card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardAttributes {
    pub shape: Shape,
    pub fill: Fill,
    pub color: Color,
    pub count: Count,
}

impl CardAttributes {
    pub fn new(shape: Shape, fill: Fill, color: Color, count: Count) -> Self {
        Self {
            shape,
            fill,
            color,
            count,
        }
    }

    /// Canonical four-character label
    pub fn label(&self) -> String {
        [
            self.shape.code(),
            self.fill.code(),
            self.color.code(),
            self.count.code(),
        ]
        .iter()
        .collect()
    }

    /// All 81 cards of the deck, in label code order
    pub fn all() -> impl Iterator<Item = CardAttributes> {
        Shape::VALUES.into_iter().flat_map(|shape| {
            Fill::VALUES.into_iter().flat_map(move |fill| {
                Color::VALUES.into_iter().flat_map(move |color| {
                    Count::VALUES
                        .into_iter()
                        .map(move |count| CardAttributes::new(shape, fill, color, count))
                })
            })
        })
    }
}

impl std::fmt::Display for CardAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
