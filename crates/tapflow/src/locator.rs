//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an opaque, comparable key handed to the automation
//! driver. Tapflow never interprets it beyond equality and display: the
//! driver decides how `id=login` maps onto the native view hierarchy.
//!
//! # Design Philosophy
//!
//! - **Immutable**: Locators are built once when a step is authored and never mutated
//! - **Comparable**: `Eq + Hash` so drivers and fixtures can key element tables by them
//! - **Fluent API**: Chainable refinements (`at_index`, `within`, `containing`)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating native elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// Test ID (accessibility identifier / resource id)
    Id(String),
    /// Accessibility label
    Label(String),
    /// Visible text content
    Text(String),
    /// Native view type (e.g. "RCTScrollView")
    Type(String),
    /// Accessibility traits, all of which must match
    Traits(Vec<String>),
}

impl Selector {
    /// Short tag used when rendering the selector
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Label(_) => "label",
            Self::Text(_) => "text",
            Self::Type(_) => "type",
            Self::Traits(_) => "traits",
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) | Self::Label(v) | Self::Text(v) | Self::Type(v) => {
                write!(f, "{}={v}", self.kind())
            }
            Self::Traits(traits) => write!(f, "traits=[{}]", traits.join(",")),
        }
    }
}

/// A locator for finding an element through the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ancestor: Option<Box<Locator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    descendant: Option<Box<Locator>>,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            index: None,
            ancestor: None,
            descendant: None,
        }
    }

    /// Match by test ID
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::Id(id.into()))
    }

    /// Match by accessibility label
    #[must_use]
    pub fn by_label(label: impl Into<String>) -> Self {
        Self::from_selector(Selector::Label(label.into()))
    }

    /// Match by visible text
    #[must_use]
    pub fn by_text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::Text(text.into()))
    }

    /// Match by native view type
    #[must_use]
    pub fn by_type(view_type: impl Into<String>) -> Self {
        Self::from_selector(Selector::Type(view_type.into()))
    }

    /// Match by accessibility traits
    #[must_use]
    pub fn by_traits<I, S>(traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_selector(Selector::Traits(
            traits.into_iter().map(Into::into).collect(),
        ))
    }

    /// Pick the n-th match when several elements share the selector
    #[must_use]
    pub const fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Restrict matches to elements inside `ancestor`
    #[must_use]
    pub fn within(mut self, ancestor: Self) -> Self {
        self.ancestor = Some(Box::new(ancestor));
        self
    }

    /// Restrict matches to elements containing `descendant`
    #[must_use]
    pub fn containing(mut self, descendant: Self) -> Self {
        self.descendant = Some(Box::new(descendant));
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the match index, if any
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// Get the ancestor refinement, if any
    #[must_use]
    pub fn ancestor(&self) -> Option<&Self> {
        self.ancestor.as_deref()
    }

    /// Get the descendant refinement, if any
    #[must_use]
    pub fn descendant(&self) -> Option<&Self> {
        self.descendant.as_deref()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(descendant) = &self.descendant {
            write!(f, " containing ({descendant})")?;
        }
        if let Some(ancestor) = &self.ancestor {
            write!(f, " within ({ancestor})")?;
        }
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// Proptest strategies for locators
#[cfg(any(test, feature = "proptest"))]
pub mod strategies {
    use super::{Locator, Selector};
    use proptest::prelude::*;

    /// Any single selector with a short identifier payload
    pub fn any_selector() -> impl Strategy<Value = Selector> {
        let ident = "[a-z][a-z0-9_]{0,11}";
        prop_oneof![
            ident.prop_map(Selector::Id),
            ident.prop_map(Selector::Label),
            ident.prop_map(Selector::Text),
            ident.prop_map(Selector::Type),
            prop::collection::vec(ident, 1..3).prop_map(Selector::Traits),
        ]
    }

    /// Any locator, optionally indexed
    pub fn any_locator() -> impl Strategy<Value = Locator> {
        (any_selector(), proptest::option::of(0usize..4)).prop_map(|(selector, index)| {
            let locator = Locator::from_selector(selector);
            match index {
                Some(i) => locator.at_index(i),
                None => locator,
            }
        })
    }
}
