// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in 5x7 block font, used when no font file is available

use crate::bool2d::{merge_contours, profile_to_contours};
use nalgebra::Point2;

/// Glyph cell width including one column of spacing
const ADVANCE: f64 = 6.0;

/// Pixel growth so that diagonal neighbours overlap and merge
const BLEED: f64 = 0.06;

/// Rows top to bottom, bit 4 is the leftmost column
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        ' ' => [0x00; 7],
        _ => return None,
    };
    Some(rows)
}

/// Outline `text` as merged pixel contours, one unit per pixel, baseline
/// at y = 0
///
/// Characters without a glyph leave an empty cell.
pub fn outline(text: &str) -> Vec<Vec<Point2<f64>>> {
    let mut squares = Vec::new();
    for (cell, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        let left = cell as f64 * ADVANCE;
        for (row, bits) in rows.iter().enumerate() {
            let top = (7 - row) as f64;
            for col in 0..5 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let x = left + col as f64;
                squares.push(vec![
                    Point2::new(x - BLEED, top - 1.0 - BLEED),
                    Point2::new(x + 1.0 + BLEED, top - 1.0 - BLEED),
                    Point2::new(x + 1.0 + BLEED, top + BLEED),
                    Point2::new(x - BLEED, top + BLEED),
                ]);
            }
        }
    }

    if squares.is_empty() {
        return Vec::new();
    }
    merge_contours(&squares)
        .iter()
        .flat_map(profile_to_contours)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool2d::compute_signed_area;

    #[test]
    fn test_single_glyph_merges_into_one_shape() {
        let contours = outline("L");
        assert_eq!(contours.len(), 1);
        // Seven pixels in the stem plus four in the foot
        let area = compute_signed_area(&contours[0]).abs();
        assert!(area > 11.0 && area < 11.0 + 4.0);
    }

    #[test]
    fn test_counters_become_holes() {
        let contours = outline("O");
        assert_eq!(contours.len(), 2);
        let areas: Vec<f64> = contours.iter().map(|c| compute_signed_area(c)).collect();
        assert!(areas[0] > 0.0);
        assert!(areas[1] < 0.0);
    }

    #[test]
    fn test_lowercase_and_unknown_characters() {
        assert_eq!(outline("abc").len(), outline("ABC").len());
        assert!(outline("~~").is_empty());
        assert!(outline("   ").is_empty());
        assert!(glyph('€').is_none());
    }
}
