//! Declared and computed styles.
//!
//! [CSS Cascading Level 4 § 4 Value Processing](https://www.w3.org/TR/css-cascade-4/#value-stages)
//!
//! A [`Style`] is what one rule (or one `style` attribute) declares: every
//! property is [`Declared::Unset`] unless the rule mentions it. A
//! [`ComputedStyle`] is fully concrete and is what boxes carry. The cascade
//! folds declared styles over a computed accumulator and never mutates a
//! computed style in place.

use serde::Serialize;

use crate::values::{Colour, Length};

/// The default font size: 12pt at 90 px/in.
pub const DEFAULT_FONT_SIZE_PX: f32 = 15.0;

/// Ratio between adjacent absolute font-size keywords.
pub const FONT_SIZE_STEP: f32 = 1.2;

/// One property's value in a declared [`Style`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Declared<T> {
    /// Not declared: the cascade carries the accumulated value through.
    Unset,
    /// [§ 7.3.3 Explicit Inheritance](https://www.w3.org/TR/css-cascade-4/#inherit)
    ///
    /// "The inherit keyword causes the property's specified value to be the
    /// computed value of the property on the element's parent."
    Inherit,
    /// A concrete declared value.
    Value(T),
}

impl<T> Default for Declared<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: Copy> Declared<T> {
    /// Resolve against the accumulated value and the parent's computed value.
    fn resolve(self, accumulated: T, parent: T) -> T {
        match self {
            Self::Unset => accumulated,
            Self::Inherit => parent,
            Self::Value(value) => value,
        }
    }

    /// Whether anything was declared.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

/// [CSS Display § 2](https://www.w3.org/TR/css-display-3/#the-display-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Display {
    /// Block-level box.
    Block,
    /// Inline-level content; no box of its own.
    Inline,
    /// No box at all for the element or its descendants.
    None,
    /// A fixed-layout table.
    Table,
    /// A table row.
    TableRow,
    /// A table cell.
    TableCell,
}

/// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Float {
    /// "The box is not floated."
    None,
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

/// [§ 9.5.2 The 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Clear {
    /// "No constraint on the box's position with respect to floats."
    None,
    /// Below any left-floating boxes.
    Left,
    /// Below any right-floating boxes.
    Right,
    /// Below any floating boxes.
    Both,
}

/// [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Flush right.
    Right,
    /// Centred in the line box.
    Center,
}

/// [§ 15.6 Font boldness](https://www.w3.org/TR/CSS2/fonts.html#font-boldness)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    /// 400.
    Normal,
    /// 700.
    Bold,
}

/// [§ 15.7 Font styling](https://www.w3.org/TR/CSS2/fonts.html#font-styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontStyle {
    /// Upright.
    Normal,
    /// Italic or oblique.
    Italic,
}

/// A declared `font-size`; resolved to px during the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    /// An absolute or font-relative length.
    Length(Length),
    /// A percentage of the parent's font size.
    Percent(f32),
}

/// [§ 10.2 Content width](https://www.w3.org/TR/CSS2/visudet.html#the-width-property)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Width {
    /// Fill the containing block.
    Auto,
    /// A fixed length.
    Length(Length),
    /// A percentage of the containing block's width.
    Percent(f32),
}

/// [§ 10.5 Content height](https://www.w3.org/TR/CSS2/visudet.html#the-height-property)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Height {
    /// Sum of the content.
    Auto,
    /// A fixed length.
    Length(Length),
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LineHeight {
    /// A multiple of the element's font size; `normal` is 1.2.
    Absolute(f32),
    /// A length.
    Length(Length),
    /// A percentage of the element's font size.
    Percent(f32),
}

/// The properties one declaration block sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// `background-color`
    pub background_color: Declared<Colour>,
    /// `clear`
    pub clear: Declared<Clear>,
    /// `color`
    pub color: Declared<Colour>,
    /// `display`
    pub display: Declared<Display>,
    /// `float`
    pub float: Declared<Float>,
    /// `font-size`
    pub font_size: Declared<FontSize>,
    /// `font-weight`
    pub font_weight: Declared<FontWeight>,
    /// `font-style`
    pub font_style: Declared<FontStyle>,
    /// `height`
    pub height: Declared<Height>,
    /// `line-height`
    pub line_height: Declared<LineHeight>,
    /// `text-align`
    pub text_align: Declared<TextAlign>,
    /// `width`
    pub width: Declared<Width>,
}

impl Style {
    /// The initial values of the non-inherited properties.
    ///
    /// [§ 7.1 Initial Values](https://www.w3.org/TR/css-cascade-4/#initial-values)
    ///
    /// Cascaded first for every element, so an element no rule mentions is
    /// an inline box with a transparent background that inherits everything
    /// else from its parent.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            background_color: Declared::Value(Colour::Transparent),
            clear: Declared::Value(Clear::None),
            display: Declared::Value(Display::Inline),
            float: Declared::Value(Float::None),
            height: Declared::Value(Height::Auto),
            width: Declared::Value(Width::Auto),
            ..Self::default()
        }
    }

    /// Overlay `other` on `self`: every property `other` declares wins.
    ///
    /// Used when a later rule with an identical selector chain is merged
    /// into an earlier one.
    pub fn merge(&mut self, other: &Self) {
        fn take<T: Copy>(into: &mut Declared<T>, from: Declared<T>) {
            if from.is_set() {
                *into = from;
            }
        }
        take(&mut self.background_color, other.background_color);
        take(&mut self.clear, other.clear);
        take(&mut self.color, other.color);
        take(&mut self.display, other.display);
        take(&mut self.float, other.float);
        take(&mut self.font_size, other.font_size);
        take(&mut self.font_weight, other.font_weight);
        take(&mut self.font_style, other.font_style);
        take(&mut self.height, other.height);
        take(&mut self.line_height, other.line_height);
        take(&mut self.text_align, other.text_align);
        take(&mut self.width, other.width);
    }

    /// Whether no property is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A fully resolved style.
///
/// [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    /// `background-color`
    pub background_color: Colour,
    /// `clear`
    pub clear: Clear,
    /// `color`
    pub color: Colour,
    /// `display`
    pub display: Display,
    /// `float`
    pub float: Float,
    /// `font-size` in px.
    pub font_size: f32,
    /// `font-weight`
    pub font_weight: FontWeight,
    /// `font-style`
    pub font_style: FontStyle,
    /// `height`
    pub height: Height,
    /// `line-height`
    pub line_height: LineHeight,
    /// `text-align`
    pub text_align: TextAlign,
    /// `width`
    pub width: Width,
}

impl ComputedStyle {
    /// The style the document root is cascaded onto: every property
    /// concrete, white background, black 12pt text.
    #[must_use]
    pub const fn base() -> Self {
        Self {
            background_color: Colour::WHITE,
            clear: Clear::None,
            color: Colour::BLACK,
            display: Display::Block,
            float: Float::None,
            font_size: DEFAULT_FONT_SIZE_PX,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            height: Height::Auto,
            line_height: LineHeight::Absolute(1.2),
            text_align: TextAlign::Left,
            width: Width::Auto,
        }
    }

    /// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
    ///
    /// Apply one declared style on top of `self`, returning a new value.
    /// Undeclared properties keep the accumulated value, `inherit` takes the
    /// parent's computed value, and relative font sizes resolve against the
    /// parent's font size.
    #[must_use]
    pub fn cascade(&self, style: &Style, parent: &Self) -> Self {
        let font_size = match style.font_size {
            Declared::Unset => self.font_size,
            Declared::Inherit => parent.font_size,
            Declared::Value(FontSize::Length(length)) => length.to_px(parent.font_size),
            Declared::Value(FontSize::Percent(percent)) => parent.font_size * percent / 100.0,
        };
        Self {
            background_color: style
                .background_color
                .resolve(self.background_color, parent.background_color),
            clear: style.clear.resolve(self.clear, parent.clear),
            color: style.color.resolve(self.color, parent.color),
            display: style.display.resolve(self.display, parent.display),
            float: style.float.resolve(self.float, parent.float),
            font_size: font_size.max(0.0),
            font_weight: style.font_weight.resolve(self.font_weight, parent.font_weight),
            font_style: style.font_style.resolve(self.font_style, parent.font_style),
            height: style.height.resolve(self.height, parent.height),
            line_height: style.line_height.resolve(self.line_height, parent.line_height),
            text_align: style.text_align.resolve(self.text_align, parent.text_align),
            width: style.width.resolve(self.width, parent.width),
        }
    }

    /// The used line height in px.
    #[must_use]
    pub fn line_height_px(&self) -> f32 {
        match self.line_height {
            LineHeight::Absolute(factor) => factor * self.font_size,
            LineHeight::Length(length) => length.to_px(self.font_size),
            LineHeight::Percent(percent) => percent * self.font_size / 100.0,
        }
    }
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self::base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_keeps_accumulated_value() {
        let parent = ComputedStyle::base();
        let red = Style {
            color: Declared::Value(Colour::rgb(255, 0, 0)),
            ..Style::default()
        };
        let acc = parent.cascade(&red, &parent);
        let after = acc.cascade(&Style::default(), &parent);
        assert_eq!(after.color, Colour::rgb(255, 0, 0));
    }

    #[test]
    fn test_explicit_inherit_takes_parent_value() {
        let parent = ComputedStyle {
            color: Colour::rgb(0, 0, 255),
            ..ComputedStyle::base()
        };
        let red = Style {
            color: Declared::Value(Colour::rgb(255, 0, 0)),
            ..Style::default()
        };
        let inherit = Style {
            color: Declared::Inherit,
            ..Style::default()
        };
        let result = parent.cascade(&red, &parent).cascade(&inherit, &parent);
        assert_eq!(result.color, Colour::rgb(0, 0, 255));
    }

    #[test]
    fn test_relative_font_size_uses_parent() {
        let parent = ComputedStyle {
            font_size: 10.0,
            ..ComputedStyle::base()
        };
        let double = Style {
            font_size: Declared::Value(FontSize::Length(Length {
                value: 2.0,
                unit: crate::values::Unit::Em,
            })),
            ..Style::default()
        };
        // Applying the same rule twice must not compound.
        let result = parent.cascade(&double, &parent).cascade(&double, &parent);
        assert!((result.font_size - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_merge_later_declarations_win() {
        let mut a = Style {
            color: Declared::Value(Colour::BLACK),
            display: Declared::Value(Display::Block),
            ..Style::default()
        };
        let b = Style {
            color: Declared::Value(Colour::WHITE),
            ..Style::default()
        };
        a.merge(&b);
        assert_eq!(a.color, Declared::Value(Colour::WHITE));
        assert_eq!(a.display, Declared::Value(Display::Block));
    }

    #[test]
    fn test_line_height_px() {
        let mut style = ComputedStyle {
            font_size: 10.0,
            ..ComputedStyle::base()
        };
        assert!((style.line_height_px() - 12.0).abs() < 1e-4);
        style.line_height = LineHeight::Percent(150.0);
        assert!((style.line_height_px() - 15.0).abs() < 1e-4);
        style.line_height = LineHeight::Length(Length::px(20.0));
        assert!((style.line_height_px() - 20.0).abs() < 1e-4);
    }
}
