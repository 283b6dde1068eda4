//! Optional per-track classification of cropped detections

use crate::sources::Classifier;
use crate::track::Track;
use image::RgbImage;
use ioumatch::Rect;

/// Ask the classifier for a top-1 verdict on each track's crop and attach
/// it. Errors and empty results leave the track's classification as-is.
pub fn classify_tracks(tracks: &mut [Track], img: &RgbImage, classifier: &mut dyn Classifier) {
    for track in tracks.iter_mut() {
        let cropped = crop_to_detection(img, &track.det.bbox);
        match classifier.classify(&cropped) {
            Ok(Some(classification)) => track.classification = Some(classification),
            Ok(None) => {}
            Err(e) => log::warn!("error classifying detection: {}", e),
        }
    }
}

/// Crop the frame to a detection rectangle, clamped to the image bounds.
/// An empty rectangle means no crop.
fn crop_to_detection(img: &RgbImage, bbox: &Rect) -> RgbImage {
    if bbox.x1 <= 0 || bbox.y1 <= 0 {
        return img.clone();
    }
    let x = bbox.x0.max(0) as u32;
    let y = bbox.y0.max(0) as u32;
    let w = (bbox.x1.max(0) as u32).saturating_sub(x);
    let h = (bbox.y1.max(0) as u32).saturating_sub(y);
    if w == 0 || h == 0 || x >= img.width() || y >= img.height() {
        return img.clone();
    }
    image::imageops::crop_imm(img, x, y, w.min(img.width() - x), h.min(img.height() - y))
        .to_image()
}
