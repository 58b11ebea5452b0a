//! End-to-end decode scenarios: prediction JSON in, color raster out.
//!
//! These tests verify that:
//! 1. Known labels take their palette color exactly
//! 2. Labels outside the class count become void
//! 3. Zero classes yields a black image of the input shape
//! 4. Substituted palettes are honored
//! 5. Decoding is deterministic and shape preserving

use serde_json::json;

use segviz::{
    decode, ClassPalette, DecodeError, DecodeMode, LabelMap, Rgb, SegmentationDecoder,
    CATEGORY_COLORS,
};

fn label_map(value: serde_json::Value) -> LabelMap {
    LabelMap::from_json(&value).expect("valid label map")
}

#[test]
fn decodes_mixed_categories() {
    let labels = label_map(json!([[0, 1], [7, 2]]));
    let out = decode(&labels, 8, &ClassPalette::default()).unwrap();
    assert_eq!(
        out.to_rows(),
        vec![
            vec![[0, 0, 0], [128, 64, 128]],
            vec![[0, 0, 142], [102, 102, 156]],
        ]
    );
}

#[test]
fn single_out_of_range_pixel_is_void() {
    let labels = label_map(json!([[9]]));
    let out = decode(&labels, 8, &ClassPalette::default()).unwrap();
    assert_eq!(out.to_rows(), vec![vec![[0, 0, 0]]]);
}

#[test]
fn substituted_single_class_palette() {
    let labels = label_map(json!([[0, 0], [0, 0]]));
    let palette = ClassPalette::from_colors([Rgb(5, 5, 5)]);
    let out = decode(&labels, 1, &palette).unwrap();
    assert_eq!(out.to_rows(), vec![vec![[5, 5, 5]; 2]; 2]);
}

#[test]
fn oversized_and_negative_labels_are_void() {
    let labels = label_map(json!([[0, 4294967296u64], [-1, 1]]));
    let out = decode(&labels, 8, &ClassPalette::default()).unwrap();
    assert_eq!(
        out.to_rows(),
        vec![vec![[0, 0, 0], [0, 0, 0]], vec![[0, 0, 0], [128, 64, 128]]]
    );
}

#[test]
fn zero_classes_ignores_label_contents() {
    let labels = label_map(json!([[3, 4, 5], [6, 7, 100]]));
    let out = decode(&labels, 0, &ClassPalette::default()).unwrap();
    assert_eq!(out.to_rows(), vec![vec![[0, 0, 0]; 3]; 2]);
}

#[test]
fn every_category_color_round_trips_through_decode() {
    let labels = label_map(json!([[0, 1, 2, 3, 4, 5, 6, 7]]));
    let out = decode(&labels, 8, &ClassPalette::default()).unwrap();
    for (idx, (_, rgb)) in CATEGORY_COLORS.iter().enumerate() {
        assert_eq!(out.pixel(0, idx as u32), Some(*rgb));
    }
}

#[test]
fn non_square_shapes_are_preserved() {
    let rows: Vec<Vec<u32>> = (0..3).map(|y| (0..17).map(|x| (x + y) % 10).collect()).collect();
    let labels = LabelMap::from_rows(&rows).unwrap();
    let out = decode(&labels, 8, &ClassPalette::default()).unwrap();
    assert_eq!((out.height(), out.width()), (3, 17));

    let palette = ClassPalette::default();
    for (y, row) in rows.iter().enumerate() {
        for (x, &label) in row.iter().enumerate() {
            let expected = if label < 8 {
                palette.color(label as usize).unwrap()
            } else {
                Rgb::VOID
            };
            assert_eq!(out.pixel(y as u32, x as u32), Some(expected));
        }
    }
}

#[test]
fn decoding_is_deterministic() {
    let labels = label_map(json!([[1, 2, 3], [9, 0, 6]]));
    let decoder = SegmentationDecoder::new(ClassPalette::default(), 8).unwrap();
    let first = decoder.decode(&labels).unwrap();
    let second = decoder.decode(&labels).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_rgb_image().as_raw(), second.as_rgb_image().as_raw());
}

#[test]
fn class_count_above_palette_fails_fast() {
    let labels = label_map(json!([[0]]));
    let err = decode(&labels, 9, &ClassPalette::default()).unwrap_err();
    assert!(matches!(err, DecodeError::Configuration(_)));
    assert!(err.to_string().contains("exceeds palette size 8"));
}

#[test]
fn strict_decoder_rejects_noisy_predictions() {
    let labels = label_map(json!([[0, 1], [2, 12]]));
    let decoder = SegmentationDecoder::new(ClassPalette::default(), 8)
        .unwrap()
        .with_mode(DecodeMode::Strict);
    match decoder.decode(&labels) {
        Err(DecodeError::LabelOutOfRange { row, col, label, .. }) => {
            assert_eq!((row, col, label), (1, 1, 12));
        }
        other => panic!("expected LabelOutOfRange, got {:?}", other),
    }
}

#[test]
fn ragged_predictions_are_shape_errors() {
    let err = LabelMap::from_json(&json!([[0, 1, 2], [3, 4]])).unwrap_err();
    assert!(matches!(err, DecodeError::Shape(_)));
}
