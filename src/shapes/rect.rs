/// Axis-aligned face box in frame pixels, anchored at its top-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Callers must not pass a degenerate box; imageproc rejects zero sizes.
impl From<FaceBox> for imageproc::rect::Rect {
    fn from(b: FaceBox) -> imageproc::rect::Rect {
        debug_assert!(!b.is_degenerate());
        imageproc::rect::Rect::at(b.x, b.y).of_size(b.w, b.h)
    }
}

impl FaceBox {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> FaceBox {
        FaceBox { x, y, w, h }
    }

    pub fn left(&self) -> i32 {
        self.x
    }
    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }
    pub fn top(&self) -> i32 {
        self.y
    }
    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    pub fn is_degenerate(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// The box moved `by` pixels inwards on every side, if anything is left.
    pub fn shrink(&self, by: u32) -> Option<FaceBox> {
        if self.w <= by * 2 || self.h <= by * 2 {
            return None;
        }
        Some(FaceBox::new(
            self.x + by as i32,
            self.y + by as i32,
            self.w - by * 2,
            self.h - by * 2,
        ))
    }

    /// Clamp to a `width` x `height` frame. Returns `None` when nothing of
    /// the box is left inside.
    pub fn clip(&self, width: u32, height: u32) -> Option<FaceBox> {
        let l = self.left().max(0);
        let t = self.top().max(0);
        let r = self.right().min(width as i32);
        let b = self.bottom().min(height as i32);

        if l >= r || t >= b {
            return None;
        }

        Some(FaceBox::new(l, t, (r - l) as u32, (b - t) as u32))
    }

    /// Where a label of `text_height` pixels goes: `offset` pixels above the
    /// box, pushed back inside the frame when the box touches the top edge.
    pub fn label_anchor(&self, offset: i32, text_height: i32) -> (i32, i32) {
        let y = (self.top() - offset - text_height).max(0);
        (self.left().max(0), y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let b = FaceBox::new(10, 20, 30, 40);
        assert_eq!(b.left(), 10);
        assert_eq!(b.right(), 40);
        assert_eq!(b.top(), 20);
        assert_eq!(b.bottom(), 60);
    }

    #[test]
    fn test_degenerate() {
        assert!(FaceBox::new(5, 5, 0, 10).is_degenerate());
        assert!(FaceBox::new(5, 5, 10, 0).is_degenerate());
        assert!(!FaceBox::new(5, 5, 1, 1).is_degenerate());
    }

    #[test]
    fn test_shrink() {
        let b = FaceBox::new(-3, 4, 10, 6);
        assert_eq!(b.shrink(0), Some(b));
        assert_eq!(b.shrink(1), Some(FaceBox::new(-2, 5, 8, 4)));
        assert_eq!(b.shrink(3), None);
    }

    #[test]
    fn test_into_imageproc_rect() {
        let r: imageproc::rect::Rect = FaceBox::new(-10, 5, 40, 20).into();
        assert_eq!((r.left(), r.top(), r.right(), r.bottom()), (-10, 5, 29, 24));
    }

    #[test]
    fn test_clip() {
        let b = FaceBox::new(-5, 90, 20, 20);
        assert_eq!(b.clip(100, 100), Some(FaceBox::new(0, 90, 15, 10)));

        let outside = FaceBox::new(120, 0, 10, 10);
        assert_eq!(outside.clip(100, 100), None);
    }

    #[test]
    fn test_label_anchor() {
        let b = FaceBox::new(10, 50, 30, 30);
        assert_eq!(b.label_anchor(10, 20), (10, 20));

        let at_top = FaceBox::new(10, 2, 30, 30);
        assert_eq!(at_top.label_anchor(10, 20), (10, 0));
    }
}
