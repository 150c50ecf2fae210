//! Offset geometry.
//!
//! Trellis does not lay anything out. A widget may carry a cached offset
//! rectangle set by a layout or by the application; changing its size is the
//! one geometry touch point that produces a lifecycle message (`resize`).

/// An offset rectangle relative to the parent element.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left offset.
    pub x: i32,
    /// Top offset.
    pub y: i32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl Rect {
    /// Construct a rectangle.
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Return true if `other` has a different width or height.
    pub fn size_differs(&self, other: &Self) -> bool {
        self.w != other.w || self.h != other.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_differs_ignores_offset() {
        let a = Rect::new(0, 0, 10, 5);
        assert!(!a.size_differs(&Rect::new(3, 4, 10, 5)));
        assert!(a.size_differs(&Rect::new(0, 0, 10, 6)));
        assert!(a.size_differs(&Rect::new(0, 0, 11, 5)));
    }
}
