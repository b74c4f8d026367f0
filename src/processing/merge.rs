use crate::models::rules::{MERGE_THRESHOLD_X, MERGE_THRESHOLD_Y};
use crate::models::{BoundingBox, MergedLabel, RecognizedWord};

/// Coalesces recognized words that continue the same printed line into a
/// single label ("Date of" + "Birth*").
pub struct MultilineMerger;

struct Accumulator {
    text: String,
    page: usize,
    bbox: BoundingBox,
    last_top: i32,
}

impl Accumulator {
    fn start(word: &RecognizedWord) -> Self {
        Accumulator {
            text: word.text.clone(),
            page: word.page,
            bbox: word.bbox,
            last_top: word.bbox.y,
        }
    }

    fn continues_with(&self, word: &RecognizedWord) -> bool {
        word.page == self.page
            && (word.bbox.y - self.last_top).abs() < MERGE_THRESHOLD_Y
            && (word.bbox.x - self.bbox.right()).abs() < MERGE_THRESHOLD_X
    }

    fn extend(&mut self, word: &RecognizedWord) {
        self.text.push(' ');
        self.text.push_str(&word.text);
        self.bbox.width = word.bbox.right() - self.bbox.x;
        self.bbox.height = self.bbox.height.max(word.bbox.height);
        self.last_top = word.bbox.y;
    }

    fn finish(self) -> MergedLabel {
        MergedLabel {
            text: self.text,
            page: self.page,
            bbox: self.bbox,
        }
    }
}

impl MultilineMerger {
    /// Single pass in recognizer order. A word joins the open label when its
    /// top is within 18px of the previous word's top and its left edge is
    /// within 70px of the label's right edge; otherwise the label is closed.
    /// Labels never span pages.
    pub fn merge(words: &[RecognizedWord]) -> Vec<MergedLabel> {
        let mut labels = Vec::new();
        let mut current: Option<Accumulator> = None;

        for word in words.iter().filter(|w| !w.text.trim().is_empty()) {
            if let Some(acc) = current.as_mut() {
                if acc.continues_with(word) {
                    acc.extend(word);
                    continue;
                }
            }
            if let Some(done) = current.replace(Accumulator::start(word)) {
                labels.push(done.finish());
            }
        }

        if let Some(done) = current {
            labels.push(done.finish());
        }

        labels
    }

    pub fn merge_pages(pages: &[Vec<RecognizedWord>]) -> Vec<MergedLabel> {
        pages.iter().flat_map(|words| Self::merge(words)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: i32, y: i32, w: i32, h: i32) -> RecognizedWord {
        RecognizedWord::new(text, 1, BoundingBox::new(x, y, w, h))
    }

    #[test]
    fn test_three_collinear_words_merge() {
        let words = vec![
            word("Date", 100, 200, 60, 20),
            word("of", 180, 202, 25, 18),
            word("Birth*", 230, 199, 80, 24),
        ];
        let labels = MultilineMerger::merge(&words);

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "Date of Birth*");
        assert_eq!(labels[0].bbox, BoundingBox::new(100, 200, 310 - 100, 24));
    }

    #[test]
    fn test_horizontal_gap_at_threshold_splits() {
        // Right edge 150, next left 220: gap of exactly 70.
        let words = vec![word("Mobile", 100, 200, 50, 20), word("No.", 220, 200, 40, 20)];
        let labels = MultilineMerger::merge(&words);
        assert_eq!(labels.len(), 2);

        let words = vec![word("Mobile", 100, 200, 50, 20), word("No.", 219, 200, 40, 20)];
        assert_eq!(MultilineMerger::merge(&words).len(), 1);
    }

    #[test]
    fn test_vertical_offset_at_threshold_splits() {
        let words = vec![word("Address*", 100, 200, 90, 20), word("Line", 200, 218, 40, 20)];
        assert_eq!(MultilineMerger::merge(&words).len(), 2);

        let words = vec![word("Address*", 100, 200, 90, 20), word("Line", 200, 217, 40, 20)];
        assert_eq!(MultilineMerger::merge(&words).len(), 1);
    }

    #[test]
    fn test_vertical_test_uses_last_word_top() {
        // Each step drifts 10px, well under the threshold, even though the
        // third word is 20px below the first.
        let words = vec![
            word("a", 100, 200, 20, 20),
            word("b", 130, 210, 20, 20),
            word("c", 160, 220, 20, 20),
        ];
        let labels = MultilineMerger::merge(&words);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].bbox.y, 200);
    }

    #[test]
    fn test_state_does_not_cross_pages() {
        let first = word(".name*", 100, 200, 50, 20);
        let mut second = word("continued", 160, 200, 80, 20);
        second.page = 2;

        let labels = MultilineMerger::merge_pages(&[vec![first], vec![second]]);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].page, 1);
        assert_eq!(labels[1].page, 2);

        // Same words handed over as one sequence still split on the page change.
        let mut mixed = vec![word(".name*", 100, 200, 50, 20)];
        let mut other = word("x", 160, 200, 10, 20);
        other.page = 2;
        mixed.push(other);
        assert_eq!(MultilineMerger::merge(&mixed).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(MultilineMerger::merge(&[]).is_empty());
    }

    #[test]
    fn test_blank_words_are_skipped() {
        let words = vec![word("Gender*", 100, 200, 80, 20), word(" ", 190, 200, 5, 20)];
        let labels = MultilineMerger::merge(&words);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "Gender*");
    }
}
