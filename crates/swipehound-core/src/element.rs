//! Shared element and geometry types for gesture-based automation.
//!
//! This module defines how callers name things on screen ([`Locator`],
//! [`ElementHandle`], [`Target`]) and the device-pixel geometry the engine
//! works in ([`Point`], [`Size`], [`Rect`]). These types are independent of
//! any specific driver backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lookup strategy for a [`Locator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum By {
    /// Platform resource id (e.g. `com.example:id/title`).
    Id,
    /// Accessibility id / content description.
    AccessibilityId,
    /// XPath expression over the UI tree.
    XPath,
    /// Native widget class name.
    ClassName,
}

impl By {
    /// Short, static name for logs and span fields.
    pub fn name(&self) -> &'static str {
        match self {
            By::Id => "id",
            By::AccessibilityId => "accessibility id",
            By::XPath => "xpath",
            By::ClassName => "class name",
        }
    }
}

/// A query the driver resolves into zero or more elements.
///
/// The engine never interprets the value; it is handed to
/// [`MobileDriver::find_elements`](crate::driver::MobileDriver::find_elements)
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// The lookup strategy.
    pub by: By,
    /// The strategy-specific query string.
    pub value: String,
}

impl Locator {
    pub fn new(by: By, value: impl Into<String>) -> Self {
        Self { by, value: value.into() }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(By::Id, value)
    }

    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(By::AccessibilityId, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(By::XPath, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(By::ClassName, value)
    }

    /// Substitutes `%s` placeholders in the value, in order.
    ///
    /// Page objects keep templated locators (a list row whose text is only
    /// known at runtime) and format them on demand.
    pub fn format(&self, args: &[&str]) -> Self {
        let mut value = String::with_capacity(self.value.len());
        let mut args = args.iter();
        let mut rest = self.value.as_str();
        while let Some(idx) = rest.find("%s") {
            value.push_str(&rest[..idx]);
            match args.next() {
                Some(arg) => value.push_str(arg),
                None => value.push_str("%s"),
            }
            rest = &rest[idx + 2..];
        }
        value.push_str(rest);
        Self { by: self.by, value }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}: {}", self.by.name(), self.value)
    }
}

/// Opaque reference to an element inside the remote session.
///
/// Handles are issued by the driver and only mean something to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element {}", self.0)
    }
}

/// Something the engine can look for: a locator to resolve on every check, or
/// an element handle obtained earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Locator(Locator),
    Element(ElementHandle),
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Target::Locator(locator)
    }
}

impl From<ElementHandle> for Target {
    fn from(handle: ElementHandle) -> Self {
        Target::Element(handle)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Locator(locator) => locator.fmt(f),
            Target::Element(handle) => handle.fmt(f),
        }
    }
}

/// A position in device pixels, origin at the top-left of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in device pixels.
///
/// Rectangles are queried fresh before every gesture attempt and never cached:
/// window and container geometry shift when the keyboard shows or the layout
/// reflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle anchored at the screen origin, covering the whole window.
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// The point at the given fractions of width and height, truncated toward
    /// zero and offset by the rectangle origin.
    pub fn fraction(&self, fx: f64, fy: f64) -> Point {
        Point::new(
            self.x + (self.width as f64 * fx) as i32,
            self.y + (self.height as f64 * fy) as i32,
        )
    }

    /// Inclusive containment: points on the edge count as inside.
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}
