//! Result labels placed over the canvas.
//!
//! Labels are pure data: markup plus an anchor. Typesetting is delegated to a
//! [`MathTypesetter`] supplied by the host, and dragging is owned by the host's
//! drag widget, which reports final positions back through
//! [`OverlayPlacer::update_label_anchor`].

use crate::solver::ResultItem;
use crate::surface::Surface;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overlay errors.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("No label at index {index} (have {len})")]
    LabelOutOfRange { index: usize, len: usize },
}

/// Turns label markup into visible glyphs.
///
/// Receives the complete markup list every time it changes and re-typesets
/// all of it.
pub trait MathTypesetter {
    fn typeset(&mut self, markup: &[String]);
}

impl<F: FnMut(&[String])> MathTypesetter for F {
    fn typeset(&mut self, markup: &[String]) {
        self(markup)
    }
}

/// Typesetter that renders nothing, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTypesetter;

impl MathTypesetter for NullTypesetter {
    fn typeset(&mut self, _markup: &[String]) {}
}

/// A placed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayLabel {
    pub expression: String,
    pub answer: String,
    /// Inline math markup handed to the typesetter.
    pub markup: String,
    /// Canvas position of the label.
    pub anchor: Point,
}

impl DisplayLabel {
    pub fn new(item: &ResultItem, anchor: Point) -> Self {
        Self {
            expression: item.expression.clone(),
            answer: item.answer.clone(),
            markup: format_markup(&item.expression, &item.answer),
            anchor,
        }
    }

    /// Plain `expression = answer` form.
    pub fn text(&self) -> String {
        format!("{} = {}", self.expression, self.answer)
    }
}

/// Inline math markup for one result.
pub fn format_markup(expression: &str, answer: &str) -> String {
    format!("\\(\\LARGE{{{} = {}}}\\)", expression, answer)
}

/// Owns the label sequence and keeps the typesetter in sync with it.
pub struct OverlayPlacer {
    labels: Vec<DisplayLabel>,
    typesetter: Box<dyn MathTypesetter>,
}

impl std::fmt::Debug for OverlayPlacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayPlacer")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl OverlayPlacer {
    pub fn new(typesetter: Box<dyn MathTypesetter>) -> Self {
        Self {
            labels: Vec::new(),
            typesetter,
        }
    }

    pub fn labels(&self) -> &[DisplayLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Append a label for `item` at `anchor` and wipe the sketch beneath it.
    /// Returns the new label's index.
    pub fn place(&mut self, item: &ResultItem, anchor: Point, surface: &mut Surface) -> usize {
        let label = DisplayLabel::new(item, anchor);
        log::info!("Placing {} at ({:.1}, {:.1})", label.text(), anchor.x, anchor.y);
        self.labels.push(label);
        surface.clear();
        self.notify();
        self.labels.len() - 1
    }

    /// Record a position reported by the drag widget for one label.
    pub fn update_label_anchor(&mut self, index: usize, position: Point) -> Result<(), OverlayError> {
        let len = self.labels.len();
        let label = self
            .labels
            .get_mut(index)
            .ok_or(OverlayError::LabelOutOfRange { index, len })?;
        label.anchor = position;
        Ok(())
    }

    /// Remove every label.
    pub fn clear(&mut self) {
        self.labels.clear();
        self.notify();
    }

    fn notify(&mut self) {
        let markup: Vec<String> = self.labels.iter().map(|l| l.markup.clone()).collect();
        self.typesetter.typeset(&markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::InkColor;
    use kurbo::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_placer() -> (OverlayPlacer, Rc<RefCell<Vec<Vec<String>>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let placer = OverlayPlacer::new(Box::new(move |markup: &[String]| {
            sink.borrow_mut().push(markup.to_vec());
        }));
        (placer, calls)
    }

    #[test]
    fn test_markup() {
        assert_eq!(format_markup("2+2", "4"), r"\(\LARGE{2+2 = 4}\)");
    }

    #[test]
    fn test_place_appends_and_clears_surface() {
        let (mut placer, calls) = recording_placer();
        let mut surface = Surface::new(40, 40).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), InkColor::WHITE);

        let index = placer.place(&ResultItem::new("2+2", "4", false), Point::new(5.0, 5.0), &mut surface);
        assert_eq!(index, 0);
        assert_eq!(placer.labels()[0].text(), "2+2 = 4");
        assert_eq!(placer.labels()[0].anchor, Point::new(5.0, 5.0));
        assert_eq!(surface.snapshot_pixels().alpha(5, 5), Some(0));

        placer.place(&ResultItem::new("x", "5", true), Point::new(7.0, 8.0), &mut surface);
        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].len(), 2);
        assert_eq!(calls[1][1], r"\(\LARGE{x = 5}\)");
    }

    #[test]
    fn test_update_anchor_only_moves_one_label() {
        let (mut placer, _) = recording_placer();
        let mut surface = Surface::new(10, 10).unwrap();
        let anchor = Point::new(1.0, 1.0);
        placer.place(&ResultItem::new("a", "1", false), anchor, &mut surface);
        placer.place(&ResultItem::new("b", "2", false), anchor, &mut surface);

        placer.update_label_anchor(0, Point::new(50.0, 60.0)).unwrap();
        assert_eq!(placer.labels()[0].anchor, Point::new(50.0, 60.0));
        assert_eq!(placer.labels()[1].anchor, anchor);

        assert!(matches!(
            placer.update_label_anchor(2, Point::ZERO),
            Err(OverlayError::LabelOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_clear_notifies_empty() {
        let (mut placer, calls) = recording_placer();
        let mut surface = Surface::new(10, 10).unwrap();
        placer.place(&ResultItem::new("a", "1", false), Point::ZERO, &mut surface);

        placer.clear();
        assert!(placer.is_empty());
        assert!(calls.borrow().last().unwrap().is_empty());
    }
}
