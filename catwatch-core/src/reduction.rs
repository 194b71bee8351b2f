//! Per-tick reduction of raw detections

use crate::config::{DetectionConfig, SizeFilter};
use crate::types::{Detection, Label, Rect, TickResult};

impl SizeFilter {
    /// Both width and height must fall within `[min, max]`
    pub fn accepts(&self, rect: &Rect) -> bool {
        let range = self.min..=self.max;
        range.contains(&rect.width()) && range.contains(&rect.height())
    }
}

/// Reduce one frame's detections to a [`TickResult`].
///
/// Thresholds are exclusive. With a size filter configured, a cat without a
/// box is rejected. The best cat is the highest-confidence accepted one; the
/// first seen wins ties.
pub fn reduce(detections: &[Detection], config: &DetectionConfig) -> TickResult {
    let person_present = detections.iter().any(|d| {
        d.label == Label::Person && d.confidence > config.person_confidence_threshold
    });

    let mut best_cat: Option<&Detection> = None;
    for detection in detections.iter().filter(|d| is_accepted_cat(d, config)) {
        match best_cat {
            Some(best) if detection.confidence <= best.confidence => {}
            _ => best_cat = Some(detection),
        }
    }

    TickResult::new(person_present, best_cat.cloned())
}

fn is_accepted_cat(detection: &Detection, config: &DetectionConfig) -> bool {
    if detection.label != Label::Cat || !(detection.confidence > config.cat_confidence_threshold) {
        return false;
    }

    match (config.size_filter, detection.bbox) {
        (None, _) => true,
        (Some(filter), Some(bbox)) => filter.accepts(&bbox),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filtered_config() -> DetectionConfig {
        DetectionConfig {
            person_confidence_threshold: 0.5,
            cat_confidence_threshold: 0.7,
            size_filter: Some(SizeFilter::new(50, 100)),
        }
    }

    fn cat_box(width: i32, height: i32) -> Rect {
        Rect::new(10, 10, 10 + width, 10 + height)
    }

    #[test]
    fn test_empty_frame() {
        let tick = reduce(&[], &DetectionConfig::default());
        assert_eq!(tick, TickResult::empty());
    }

    #[test]
    fn test_person_threshold_is_exclusive() {
        let config = filtered_config();
        assert!(!reduce(&[Detection::person(0.5)], &config).person_present_raw());
        assert!(reduce(&[Detection::person(0.51)], &config).person_present_raw());
    }

    #[test]
    fn test_cat_threshold_is_exclusive() {
        let config = filtered_config();
        let at_threshold = Detection::cat(0.7, cat_box(70, 80));
        assert!(!reduce(&[at_threshold], &config).cat_present_raw());

        let above = Detection::cat(0.71, cat_box(70, 80));
        assert!(reduce(&[above], &config).cat_present_raw());
    }

    #[test]
    fn test_size_filter_bounds_inclusive() {
        let config = filtered_config();
        assert!(reduce(&[Detection::cat(0.8, cat_box(50, 100))], &config).cat_present_raw());
        assert!(!reduce(&[Detection::cat(0.8, cat_box(49, 80))], &config).cat_present_raw());
        assert!(!reduce(&[Detection::cat(0.8, cat_box(80, 101))], &config).cat_present_raw());
    }

    #[test]
    fn test_size_filter_rejects_boxless_cat() {
        let config = filtered_config();
        let boxless = Detection { label: Label::Cat, confidence: 0.9, bbox: None };
        assert!(!reduce(&[boxless.clone()], &config).cat_present_raw());

        let unfiltered = DetectionConfig { size_filter: None, ..filtered_config() };
        assert!(reduce(&[boxless], &unfiltered).cat_present_raw());
    }

    #[test]
    fn test_no_size_filter_accepts_any_box() {
        let config = DetectionConfig::default();
        assert!(reduce(&[Detection::cat(0.65, cat_box(250, 280))], &config).cat_present_raw());
    }

    #[test]
    fn test_best_cat_highest_confidence() {
        let config = filtered_config();
        let detections = vec![
            Detection::cat(0.75, cat_box(60, 60)),
            Detection::cat(0.92, cat_box(70, 70)),
            Detection::cat(0.99, cat_box(200, 200)), // rejected by size
            Detection::cat(0.80, cat_box(80, 80)),
        ];
        let tick = reduce(&detections, &config);
        assert_eq!(tick.best_cat(), Some(&detections[1]));
    }

    #[test]
    fn test_best_cat_tie_keeps_first_seen() {
        let config = filtered_config();
        let detections = vec![
            Detection::cat(0.8, cat_box(60, 60)),
            Detection::cat(0.8, cat_box(90, 90)),
        ];
        let tick = reduce(&detections, &config);
        assert_eq!(tick.best_cat(), Some(&detections[0]));
    }

    #[test]
    fn test_person_and_cat_reduced_independently() {
        let config = filtered_config();
        let detections = vec![
            Detection::person(0.9),
            Detection::other(0.99),
            Detection::cat(0.8, cat_box(70, 80)),
        ];
        let tick = reduce(&detections, &config);
        assert!(tick.person_present_raw());
        assert!(tick.cat_present_raw());
    }

    #[test]
    fn test_nan_confidence_rejected() {
        let config = DetectionConfig::default();
        let tick = reduce(&[Detection::cat(f32::NAN, cat_box(60, 60)), Detection::person(f32::NAN)], &config);
        assert_eq!(tick, TickResult::empty());
    }
}
