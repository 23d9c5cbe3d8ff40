use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;
use nalgebra::Point2;
use shotcard::{
    score_canonical_sheet, RingFailure, ScoreError, ScoreParams, SegmenterError, SheetProposal,
    SheetScorer, SheetSegmenter, StaticMaskSegmenter, Zone,
};
use shotcard_core::{homography_from_4pt, mask, warp_perspective_rgb, Ellipse};

const WHITE: Rgb<u8> = Rgb([245, 245, 245]);
const INK: Rgb<u8> = Rgb([15, 15, 15]);
const IMPACT: Rgb<u8> = Rgb([230, 20, 25]);

const RING_CENTERS: [(Zone, (i32, i32)); 5] = [
    (Zone::TopLeft, (250, 250)),
    (Zone::TopRight, (750, 250)),
    (Zone::Center, (500, 500)),
    (Zone::BottomLeft, (250, 750)),
    (Zone::BottomRight, (750, 750)),
];

fn blank_sheet() -> RgbImage {
    RgbImage::from_pixel(1000, 1000, WHITE)
}

fn five_ring_sheet(radius: i32) -> RgbImage {
    let mut sheet = blank_sheet();
    for (_, c) in RING_CENTERS {
        draw_filled_circle_mut(&mut sheet, c, radius, INK);
    }
    sheet
}

fn within(a: Point2<f64>, x: f64, y: f64, tol: f64) -> bool {
    (a - Point2::new(x, y)).norm() <= tol
}

fn angle_to_zero(deg: f64) -> f64 {
    deg.min(360.0 - deg)
}

#[test]
fn single_ring_with_central_impact() {
    let mut sheet = blank_sheet();
    draw_filled_circle_mut(&mut sheet, (500, 500), 200, INK);
    draw_filled_circle_mut(&mut sheet, (500, 500), 8, IMPACT);

    let params = ScoreParams {
        zones: vec![Zone::Center],
        ..ScoreParams::default()
    };
    let result = score_canonical_sheet(sheet, &params).expect("scored");

    assert_eq!(result.impacts.len(), 1);
    let impact = &result.impacts[0];
    assert_eq!(impact.distance, 0);
    assert_eq!(impact.score, 570);
    assert_eq!(impact.zone, Zone::Center);
    assert_eq!(impact.amount, 1);

    let ring = result.targets.get(Zone::Center).expect("center ring");
    assert!(within(ring.center, 500.0, 500.0, 2.0), "{ring:?}");
    let aspect = ring.aspect_ratio();
    assert!((0.95..=1.05).contains(&aspect), "aspect {aspect}");
    assert_eq!(result.targets.len(), 1);
    assert!(result.corners.is_none());
}

#[test]
fn five_rings_on_rectified_sheet() {
    let mut sheet = five_ring_sheet(100);
    // 40 px right of the TOP_RIGHT centre: 10 mm on a 100 px ring
    draw_filled_circle_mut(&mut sheet, (790, 250), 7, IMPACT);
    // dead centre of BOTTOM_LEFT
    draw_filled_circle_mut(&mut sheet, (250, 750), 7, IMPACT);

    let result = score_canonical_sheet(sheet, &ScoreParams::default()).expect("scored");
    assert_eq!(result.targets.len(), 5);
    for (zone, (x, y)) in RING_CENTERS {
        let ring = result.targets.get(zone).expect("ring");
        assert!(
            within(ring.center, x as f64, y as f64, 2.0),
            "{zone}: {ring:?}"
        );
        assert!((ring.axes.0 - 200.0).abs() < 4.0, "{zone}: {ring:?}");
    }

    let mut impacts = result.impacts.clone();
    impacts.sort_by_key(|i| i.zone);
    assert_eq!(impacts.len(), 2);
    assert_eq!(impacts[0].zone, Zone::TopRight);
    assert_eq!(impacts[0].distance, 10);
    assert_eq!(impacts[0].score, 525);
    assert!(angle_to_zero(impacts[0].angle) < 2.0, "{:?}", impacts[0]);
    assert_eq!(impacts[1].zone, Zone::BottomLeft);
    assert_eq!(impacts[1].distance, 0);
    assert_eq!(impacts[1].score, 570);
}

#[test]
fn perspective_photo_end_to_end() {
    let mut sheet = five_ring_sheet(100);
    draw_filled_circle_mut(&mut sheet, (790, 250), 7, IMPACT);
    draw_filled_circle_mut(&mut sheet, (250, 750), 7, IMPACT);

    let (photo_w, photo_h) = (1200u32, 900u32);
    let photo_corners = [
        Point2::new(200.0, 120.0),
        Point2::new(1000.0, 140.0),
        Point2::new(1020.0, 800.0),
        Point2::new(180.0, 780.0),
    ];
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(1000.0, 0.0),
        Point2::new(1000.0, 1000.0),
        Point2::new(0.0, 1000.0),
    ];
    let sheet_from_photo = homography_from_4pt(&photo_corners, &square).expect("homography");
    let photo = warp_perspective_rgb(&sheet, &sheet_from_photo, photo_w, photo_h);

    let mut sheet_mask = GrayImage::new(1000, 1000);
    let poly: Vec<Point<i32>> = photo_corners
        .iter()
        .map(|p| {
            Point::new(
                (p.x * 1000.0 / photo_w as f64).round() as i32,
                (p.y * 1000.0 / photo_h as f64).round() as i32,
            )
        })
        .collect();
    draw_polygon_mut(&mut sheet_mask, &poly, Luma([255]));

    let scorer = SheetScorer::new(StaticMaskSegmenter::new(sheet_mask), ScoreParams::default());
    let result = scorer.score(&photo).expect("scored");

    let corners = result.corners.expect("corners");
    for (got, want) in corners
        .to_pixels(photo_w, photo_h)
        .iter()
        .zip(photo_corners.iter())
    {
        assert!((got - want).norm() < 5.0, "{got:?} vs {want:?}");
    }

    assert_eq!(result.sheet.dimensions(), (1000, 1000));
    assert_eq!(result.targets.len(), 5);
    for (zone, (x, y)) in RING_CENTERS {
        let ring = result.targets.get(zone).expect("ring");
        assert!(
            within(ring.center, x as f64, y as f64, 8.0),
            "{zone}: {ring:?}"
        );
    }

    let mut impacts = result.impacts.clone();
    impacts.sort_by_key(|i| i.zone);
    assert_eq!(impacts.len(), 2);
    assert_eq!(impacts[0].zone, Zone::TopRight);
    assert!((9..=11).contains(&impacts[0].distance), "{:?}", impacts[0]);
    assert_eq!(impacts[1].zone, Zone::BottomLeft);
    assert!(impacts[1].distance <= 1, "{:?}", impacts[1]);
    assert!(impacts[1].score >= 564);
}

#[test]
fn flattened_ring_aborts_the_sheet() {
    let mut sheet = blank_sheet();
    let flat = Ellipse::new(Point2::new(500.0, 500.0), (300.0, 150.0), 20.0);
    let blob = mask::filled_ellipse(1000, 1000, &flat);
    for (x, y, p) in blob.enumerate_pixels() {
        if p[0] == mask::ON {
            sheet.put_pixel(x, y, INK);
        }
    }
    let params = ScoreParams {
        zones: vec![Zone::Center],
        ..ScoreParams::default()
    };
    let err = score_canonical_sheet(sheet, &params).unwrap_err();
    match err {
        ScoreError::InvalidRingGeometry {
            zone: Zone::Center,
            failure: RingFailure::AspectRatio(r),
        } => assert!(r < 0.7, "ratio {r}"),
        other => panic!("unexpected error {other}"),
    }
}

struct Offline;

impl SheetSegmenter for Offline {
    fn segment(&self, _image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
        Err("model offline".into())
    }
}

struct Nothing;

impl SheetSegmenter for Nothing {
    fn segment(&self, _image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
        Ok(Vec::new())
    }
}

#[test]
fn segmenter_failures_abort_the_photo() {
    let photo = RgbImage::from_pixel(640, 480, WHITE);

    let err = SheetScorer::new(Offline, ScoreParams::default())
        .score(&photo)
        .unwrap_err();
    assert!(matches!(err, ScoreError::Segmentation(_)), "{err}");

    let err = SheetScorer::new(Nothing, ScoreParams::default())
        .score(&photo)
        .unwrap_err();
    assert!(matches!(err, ScoreError::SheetNotDetected { .. }), "{err}");
}

#[test]
fn report_serializes_impacts_and_targets() {
    let mut sheet = blank_sheet();
    draw_filled_circle_mut(&mut sheet, (500, 500), 200, INK);
    draw_filled_circle_mut(&mut sheet, (500, 540), 8, IMPACT);
    let params = ScoreParams {
        zones: vec![Zone::Center],
        ..ScoreParams::default()
    };
    let report = score_canonical_sheet(sheet, &params)
        .expect("scored")
        .report();

    let json = serde_json::to_value(&report).expect("json");
    let impacts = json["impacts"].as_array().expect("impacts");
    assert_eq!(impacts.len(), 1);
    assert_eq!(impacts[0]["zone"], "CENTER");
    assert_eq!(impacts[0]["amount"], 1);
    // 40 px below the centre of a 200 px ring
    assert_eq!(impacts[0]["distance"], 5);
    assert_eq!(impacts[0]["score"], 540);
    assert!(json["targets"]["CENTER"]["center"].is_array());
}
