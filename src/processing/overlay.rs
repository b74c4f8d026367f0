use crate::config::FontConfig;
use crate::models::rules::{
    ADDRESS_MAX_CHARS, ADDRESS_WRAP_WIDTH, DRAW_OFFSET_X, DRAW_OFFSET_Y, LINE_HEIGHT,
};
use crate::models::{CanonicalField, CanonicalFieldRecord, TextPlacement};
use crate::processing::font::OverlayFont;
use crate::processing::mapper::MappedOccurrence;
use crate::utils::FormError;
use image::{Rgb, RgbImage};
use log::{debug, info};
use rayon::prelude::*;

/// Plans and paints field values next to their located labels.
pub struct OverlayRenderer {
    font: OverlayFont,
    size: f32,
    color: Rgb<u8>,
}

impl OverlayRenderer {
    pub fn new(config: &FontConfig) -> Self {
        OverlayRenderer {
            font: OverlayFont::resolve(config.path.as_deref()),
            size: config.size,
            color: Rgb(config.color),
        }
    }

    pub fn with_font(font: OverlayFont, config: &FontConfig) -> Self {
        OverlayRenderer {
            font,
            size: config.size,
            color: Rgb(config.color),
        }
    }

    /// Every draw call for the document, grouped by page in page order.
    /// Occurrences on pages outside `1..=page_count` are ignored.
    pub fn plan(
        page_count: usize,
        occurrences: &[MappedOccurrence<'_>],
        record: &CanonicalFieldRecord,
    ) -> Vec<Vec<TextPlacement>> {
        let mut pages: Vec<Vec<TextPlacement>> = vec![Vec::new(); page_count];

        for mapped in occurrences {
            let page = mapped.occurrence.page;
            if page == 0 || page > page_count {
                debug!("Occurrence on page {} is outside the document", page);
                continue;
            }

            let Some((field, value)) = resolve_value(mapped, record) else {
                continue;
            };

            let x = mapped.occurrence.bbox.x + DRAW_OFFSET_X;
            let y = mapped.occurrence.bbox.y + DRAW_OFFSET_Y;

            let lines = if field == CanonicalField::Address {
                wrap_address(value)
            } else {
                vec![value.to_string()]
            };

            for (index, line) in lines.into_iter().enumerate() {
                pages[page - 1].push(TextPlacement {
                    page,
                    x,
                    y: y + LINE_HEIGHT * index as i32,
                    text: line,
                    field: field.as_str().to_string(),
                });
            }
        }

        pages
    }

    pub fn paint_page(&self, image: &mut RgbImage, placements: &[TextPlacement]) {
        for placement in placements {
            self.font.draw(
                image,
                placement.x,
                placement.y,
                &placement.text,
                self.size,
                self.color,
            );
        }
    }

    /// Paint planned text onto every page in parallel. `plan` must have one
    /// entry per page.
    pub fn paint(&self, pages: &mut [RgbImage], plan: &[Vec<TextPlacement>]) -> Result<(), FormError> {
        if pages.len() != plan.len() {
            return Err(FormError::render(
                pages.len().min(plan.len()) + 1,
                format!("{} page images but {} planned pages", pages.len(), plan.len()),
            ));
        }

        pages
            .par_iter_mut()
            .zip(plan.par_iter())
            .for_each(|(image, placements)| self.paint_page(image, placements));

        let drawn: usize = plan.iter().map(Vec::len).sum();
        info!("Drew {} text line(s) across {} page(s)", drawn, pages.len());
        Ok(())
    }
}

/// Field and value to draw for an occurrence: the mapped field when it has a
/// usable value, otherwise the mapping's fallback field.
fn resolve_value<'r>(
    mapped: &MappedOccurrence<'_>,
    record: &'r CanonicalFieldRecord,
) -> Option<(CanonicalField, &'r str)> {
    let primary = mapped.mapping.field;
    if let Some(value) = record.get(primary) {
        return Some((primary, value));
    }
    let fallback = mapped.mapping.fallback?;
    record.get(fallback).map(|value| (fallback, value))
}

/// Truncate to the address limit, then wrap.
pub fn wrap_address(value: &str) -> Vec<String> {
    let truncated: String = value.chars().take(ADDRESS_MAX_CHARS).collect();
    wrap_text(&truncated, ADDRESS_WRAP_WIDTH)
}

/// Greedy word wrap. Lines break at whitespace, or after a hyphen joining
/// two words ("NORTH-EASTERN"). Runs of whitespace collapse to one space.
/// A word longer than `width` is split, at its last hyphen that fits when it
/// has one.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current: Vec<char> = Vec::new();

    for word in text.split_whitespace() {
        for (index, piece) in hyphen_pieces(word).iter().enumerate() {
            let mut rest: &[char] = piece;
            // Pieces after the first continue the word without a space.
            let mut gap = usize::from(index == 0 && !current.is_empty());

            while !rest.is_empty() {
                if current.len() + gap + rest.len() <= width {
                    if gap == 1 {
                        current.push(' ');
                    }
                    current.extend_from_slice(rest);
                    break;
                }

                if rest.len() > width {
                    let space_left = width.saturating_sub(current.len() + gap);
                    if space_left > 0 {
                        let head = &rest[..space_left];
                        let cut = head
                            .iter()
                            .rposition(|c| *c == '-')
                            .filter(|&h| h > 0 && head[..h].iter().any(|c| *c != '-'))
                            .map_or(space_left, |h| h + 1);
                        if gap == 1 {
                            current.push(' ');
                        }
                        current.extend_from_slice(&rest[..cut]);
                        rest = &rest[cut..];
                    }
                }

                lines.push(current.drain(..).collect());
                gap = 0;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current.into_iter().collect());
    }
    lines
}

/// Split a word after each hyphen that sits between letters: two letters
/// (or letter-hyphen-letter) before it, and two letters after it, possibly
/// hyphen-separated. "NORTH-EASTERN" splits, "SECTOR-15" does not.
fn hyphen_pieces(word: &str) -> Vec<Vec<char>> {
    let chars: Vec<char> = word.chars().collect();
    let letter = |i: usize| chars.get(i).map_or(false, |c| c.is_alphabetic());
    let hyphen = |i: usize| chars.get(i) == Some(&'-');

    let mut pieces = Vec::new();
    let mut start = 0;
    for i in 2..chars.len() {
        if chars[i] != '-' {
            continue;
        }
        let before = letter(i - 1) && (letter(i - 2) || (i >= 3 && hyphen(i - 2) && letter(i - 3)));
        let after = letter(i + 1) && (letter(i + 2) || (hyphen(i + 2) && letter(i + 3)));
        if before && after {
            pieces.push(chars[start..=i].to_vec());
            start = i + 1;
        }
    }
    pieces.push(chars[start..].to_vec());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, FieldOccurrence, NOT_FOUND};
    use crate::processing::mapper::FieldMapper;

    fn occurrence(marker: &str, page: usize, x: i32, y: i32) -> FieldOccurrence {
        FieldOccurrence {
            field_marker: marker.to_string(),
            page,
            bbox: BoundingBox::new(x, y, 50, 20),
        }
    }

    #[test]
    fn test_sentinel_values_are_never_planned() {
        let mapper = FieldMapper::default();
        let occurrences = vec![occurrence(".gender*", 1, 100, 200), occurrence(".pan*", 1, 100, 300)];
        let mapped = mapper.map_all(&occurrences);

        let mut record = CanonicalFieldRecord::all_not_found();
        record.set(CanonicalField::PanNumber, "ABCDE1234F");

        let plan = OverlayRenderer::plan(1, &mapped, &record);
        assert_eq!(plan[0].len(), 1);
        assert_eq!(plan[0][0].text, "ABCDE1234F");
        assert_eq!((plan[0][0].x, plan[0][0].y), (325, 290));
    }

    #[test]
    fn test_name_marker_falls_back_to_first_name() {
        let mapper = FieldMapper::default();
        let occurrences = vec![occurrence(".name*", 1, 100, 200)];
        let mapped = mapper.map_all(&occurrences);

        let mut record = CanonicalFieldRecord::all_not_found();
        record.set(CanonicalField::FirstName, "JOHN");
        record.set(CanonicalField::LastName, "DOE");

        let plan = OverlayRenderer::plan(1, &mapped, &record);
        assert_eq!(plan[0].len(), 1);
        assert_eq!(plan[0][0].text, "JOHN");
        assert_eq!(plan[0][0].field, "First Name");
        assert_eq!((plan[0][0].x, plan[0][0].y), (325, 190));

        record.set(CanonicalField::Name, "JOHN DOE");
        let plan = OverlayRenderer::plan(1, &mapped, &record);
        assert_eq!(plan[0][0].text, "JOHN DOE");
    }

    #[test]
    fn test_address_of_100_chars_wraps_into_two_lines() {
        let mapper = FieldMapper::default();
        let occurrences = vec![occurrence("address*", 1, 100, 500)];
        let mapped = mapper.map_all(&occurrences);

        let address = "A".repeat(100);
        let mut record = CanonicalFieldRecord::all_not_found();
        record.set(CanonicalField::Address, address);

        let plan = OverlayRenderer::plan(1, &mapped, &record);
        let lines = &plan[0];
        assert_eq!(lines.len(), (74 + 40 - 1) / 40);
        assert_eq!(lines[0].y, 490);
        assert_eq!(lines[1].y, 525);
        assert_eq!(lines.iter().map(|l| l.text.chars().count()).sum::<usize>(), 74);
        assert!(lines.iter().all(|l| l.x == 325));
    }

    #[test]
    fn test_every_occurrence_is_drawn_on_its_page() {
        let mapper = FieldMapper::default();
        let occurrences = vec![
            occurrence("mobile no.", 1, 100, 200),
            occurrence("mobile no.", 2, 300, 700),
            occurrence("mobile no.", 2, 300, 900),
            occurrence("mobile no.", 5, 300, 900),
        ];
        let mapped = mapper.map_all(&occurrences);
        let mut record = CanonicalFieldRecord::new();
        record.set(CanonicalField::PhoneNumber, "9876543210");

        let plan = OverlayRenderer::plan(3, &mapped, &record);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].len(), 1);
        assert_eq!(plan[1].len(), 2);
        assert!(plan[2].is_empty());
        assert_eq!(plan[1][1].y, 890);
    }

    #[test]
    fn test_missing_field_is_not_drawn() {
        let mapper = FieldMapper::default();
        let mapped = mapper.map_all(&[occurrence(".date of birth*", 1, 0, 0)]);
        let mut record = CanonicalFieldRecord::new();
        record.insert("Date of Birth", NOT_FOUND);
        assert!(OverlayRenderer::plan(1, &mapped, &record)[0].is_empty());
        assert!(OverlayRenderer::plan(1, &mapped, &CanonicalFieldRecord::new())[0].is_empty());
    }

    #[test]
    fn test_wrap_text_breaks_on_words() {
        let lines = wrap_text("12 MG ROAD, NEAR CITY BUS STAND, BENGALURU KARNATAKA 560001", 40);
        assert_eq!(
            lines,
            vec!["12 MG ROAD, NEAR CITY BUS STAND,", "BENGALURU KARNATAKA 560001"]
        );
        assert!(lines.iter().all(|l| l.chars().count() <= 40));
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let lines = wrap_text("AB CDEFGHIJ", 4);
        assert_eq!(lines, vec!["AB C", "DEFG", "HIJ"]);
    }

    #[test]
    fn test_wrap_text_breaks_after_hyphens_between_words() {
        assert_eq!(
            wrap_text("FLAT 9 GREEN PARK APARTMENTS NORTH-EASTERN BLOCK", 40),
            vec!["FLAT 9 GREEN PARK APARTMENTS NORTH-", "EASTERN BLOCK"]
        );
        assert_eq!(
            wrap_text("PLOT 4 SUPER-LONG-NEIGHBOURHOOD-NAME-THAT-NEVER-ENDS CITY", 40),
            vec!["PLOT 4 SUPER-LONG-NEIGHBOURHOOD-NAME-", "THAT-NEVER-ENDS CITY"]
        );
        // A hyphen before digits is not a break point.
        assert_eq!(
            wrap_text("HOUSE 12 SECTOR-15 GURUGRAM HARYANA NEAR-BY MARKET", 40),
            vec!["HOUSE 12 SECTOR-15 GURUGRAM HARYANA", "NEAR-BY MARKET"]
        );
    }

    #[test]
    fn test_long_word_splits_at_its_last_hyphen() {
        let word = format!("SECTOR-{}", "15".repeat(20));
        let lines = wrap_text(&format!("A {} X", word), 40);
        assert_eq!(lines, vec!["A SECTOR-".to_string(), "15".repeat(20), "X".to_string()]);
    }

    #[test]
    fn test_wrap_text_collapses_whitespace() {
        assert_eq!(wrap_text("  FLAT   4 \n TOWER  ", 40), vec!["FLAT 4 TOWER"]);
        assert!(wrap_text("   ", 40).is_empty());
    }

    #[test]
    fn test_paint_changes_only_planned_pages() {
        let config = FontConfig::default();
        let renderer = OverlayRenderer::with_font(OverlayFont::Builtin, &config);
        let white = Rgb([255, 255, 255]);
        let mut pages = vec![
            RgbImage::from_pixel(400, 300, white),
            RgbImage::from_pixel(400, 300, white),
        ];
        let plan = vec![
            vec![],
            vec![TextPlacement {
                page: 2,
                x: 10,
                y: 10,
                text: "M".to_string(),
                field: "Gender".to_string(),
            }],
        ];

        renderer.paint(&mut pages, &plan).unwrap();
        assert!(pages[0].pixels().all(|px| *px == white));
        assert_eq!(*pages[1].get_pixel(10, 10), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_paint_rejects_mismatched_plan() {
        let renderer = OverlayRenderer::with_font(OverlayFont::Builtin, &FontConfig::default());
        let mut pages = vec![RgbImage::new(10, 10)];
        let result = renderer.paint(&mut pages, &[]);
        assert!(matches!(result, Err(FormError::RenderFailure { .. })));
    }
}
