use rand::SeedableRng;

use super::*;

fn entries(n: usize) -> Vec<(Label, ImageDims)> {
    (0..n)
        .map(|i| {
            (
                Label::new(format!("{}s", 1950 + i * 10)),
                ImageDims {
                    width: 64,
                    height: 48,
                },
            )
        })
        .collect()
}

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(7)
}

#[test]
fn empty_mapping_is_rejected() {
    let err = plan_page(&PageLayout::default(), &[], &mut rng()).unwrap_err();
    assert!(matches!(err, AlbumError::Validation(_)), "{err:?}");
}

#[test]
fn one_cell_per_image_in_input_order() {
    let input = entries(4);
    let plan = plan_page(&PageLayout::default(), &input, &mut rng()).unwrap();

    assert_eq!(plan.cell_count(), 4);
    let indices: Vec<_> = plan.cells().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    let labels: Vec<_> = plan.cells().map(|c| c.label.clone()).collect();
    let expected: Vec<_> = input.iter().map(|(l, _)| l.clone()).collect();
    assert_eq!(labels, expected);
}

#[test]
fn two_images_occupy_the_first_two_slots() {
    let layout = PageLayout::default();
    let plan = plan_page(&layout, &entries(2), &mut rng()).unwrap();

    assert_eq!((plan.width, plan.height), (2480, 3508));
    assert_eq!(plan.grid, GridSpec { cols: 2, rows: 3 });
    for cell in plan.cells() {
        let center = layout.cell_rect(plan.grid, cell.index).center();
        let placed = cell.transform * kurbo::Point::ORIGIN;
        assert!((placed - center).hypot() < 1e-9);
    }
}

#[test]
fn rotations_stay_within_bounds() {
    let plan = plan_page(&PageLayout::default(), &entries(6), &mut rng()).unwrap();
    for cell in plan.cells() {
        assert!(cell.rotation_deg.abs() <= 2.0, "{}", cell.rotation_deg);
    }
}

#[test]
fn zero_rotation_limit_draws_straight_prints() {
    let layout = PageLayout {
        max_rotation_deg: 0.0,
        ..PageLayout::default()
    };
    let plan = plan_page(&layout, &entries(3), &mut rng()).unwrap();
    assert!(plan.cells().all(|c| c.rotation_deg == 0.0));
}

#[test]
fn same_seed_gives_same_plan() {
    let a = plan_page(&PageLayout::default(), &entries(5), &mut rng()).unwrap();
    let b = plan_page(&PageLayout::default(), &entries(5), &mut rng()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn crop_is_a_centered_square() {
    let input = vec![
        (
            Label::from("wide"),
            ImageDims {
                width: 40,
                height: 20,
            },
        ),
        (
            Label::from("tall"),
            ImageDims {
                width: 10,
                height: 30,
            },
        ),
    ];
    let plan = plan_page(&PageLayout::default(), &input, &mut rng()).unwrap();
    let crops: Vec<_> = plan.cells().map(|c| c.crop).collect();
    assert_eq!(crops[0], Rect::new(10.0, 0.0, 30.0, 20.0));
    assert_eq!(crops[1], Rect::new(0.0, 10.0, 10.0, 20.0));
}

#[test]
fn more_than_six_images_grow_the_grid() {
    let plan = plan_page(&PageLayout::default(), &entries(8), &mut rng()).unwrap();
    assert_eq!(plan.grid, GridSpec { cols: 2, rows: 4 });
    assert_eq!(plan.cell_count(), 8);
}

#[test]
fn without_text_strips_title_and_captions() {
    let plan = plan_page(&PageLayout::default(), &entries(3), &mut rng()).unwrap();
    assert!(plan.has_text());
    assert!(matches!(plan.ops.first(), Some(PageOp::Title(_))));

    let bare = plan.without_text();
    assert!(!bare.has_text());
    assert_eq!(bare.cell_count(), 3);
    assert!(bare.cells().all(|c| c.caption.is_none()));
}

#[test]
fn captions_carry_the_label_text() {
    let plan = plan_page(&PageLayout::default(), &entries(1), &mut rng()).unwrap();
    let cell = plan.cells().next().unwrap();
    let caption = cell.caption.as_ref().unwrap();
    assert_eq!(caption.text, "1950s");
    assert_eq!(caption.role, FontRole::Caption);
    assert_eq!(caption.transform, cell.transform);
}
