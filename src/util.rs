use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the UTF-8 bytes, so colours stay put across toolchains.
pub fn stable_hash(text: &str) -> u64 {
    text.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Truncates `text` to at most `max_chars` characters, marking the cut with
/// an ellipsis.
pub fn short_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut label = text.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    label.push('…');
    label
}

/// Offset of the `index`-th point on a phyllotaxis spiral, used to seed nodes
/// that have no previous position.
pub fn phyllotaxis_offset(index: usize, spacing: f32) -> Vec2 {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let radius = spacing * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(angle.cos(), angle.sin()) * radius
}

pub fn normalize_log(value: usize, min: usize, max: usize) -> f32 {
    let min = (min.max(1) as f32).ln();
    let max = (max.max(1) as f32).ln();
    if (max - min).abs() < f32::EPSILON {
        return 0.5;
    }
    (((value.max(1) as f32).ln() - min) / (max - min)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_label_keeps_short_text() {
        assert_eq!(short_label("Acme", 10), "Acme");
        assert_eq!(short_label("Northwind Traders", 9), "Northwin…");
    }

    #[test]
    fn phyllotaxis_points_are_distinct() {
        let points = (0..50).map(|i| phyllotaxis_offset(i, 10.0)).collect::<Vec<_>>();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!((*a - *b).length() > 1.0);
            }
        }
    }

    #[test]
    fn stable_hash_is_deterministic() {
        assert_eq!(stable_hash("partner"), stable_hash("partner"));
        assert_ne!(stable_hash("partner"), stable_hash("supplier"));
        assert_eq!(stable_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(stable_hash("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn normalize_log_bounds() {
        assert_eq!(normalize_log(1, 1, 1), 0.5);
        assert_eq!(normalize_log(1, 1, 10), 0.0);
        assert_eq!(normalize_log(10, 1, 10), 1.0);
    }
}
