use super::*;

#[test]
fn starts_at_requested_resting_side() {
    let unflipped = FlipController::new(false);
    assert_eq!(unflipped.orientation(), 0.0);
    assert_eq!(unflipped.face_visible(), CardFace::Front);
    assert!(!unflipped.is_animating());

    let flipped = FlipController::new(true);
    assert_eq!(flipped.orientation(), 180.0);
    assert_eq!(flipped.face_visible(), CardFace::Back);
    assert!(flipped.is_flipped());
}

#[test]
fn front_is_visible_strictly_below_edge_on() {
    let mut flip = FlipController::default();
    for tenth in 0..900 {
        let orientation = f64::from(tenth) / 10.0;
        flip.set_orientation(orientation);
        assert_eq!(flip.face_visible(), CardFace::Front, "at {orientation}");
    }
    for degree in 90..=180 {
        flip.set_orientation(f64::from(degree));
        assert_eq!(flip.face_visible(), CardFace::Back, "at {degree}");
    }
}

#[test]
fn edge_on_resolves_to_back() {
    assert_eq!(face_for_orientation(90.0), CardFace::Back);
    assert_eq!(face_for_orientation(89.999), CardFace::Front);
}

#[test]
fn toggle_sets_target_without_moving_orientation() {
    let mut flip = FlipController::new(false);
    assert_eq!(flip.toggle(), 180.0);
    assert_eq!(flip.orientation(), 0.0);
    assert!(flip.is_animating());
    assert_eq!(flip.face_visible(), CardFace::Front);

    flip.set_orientation(180.0);
    assert!(!flip.is_animating());
    assert_eq!(flip.toggle(), 0.0);
}

#[test]
fn second_toggle_mid_flight_reverses_from_current_orientation() {
    let mut flip = FlipController::new(false);
    flip.toggle();
    flip.set_orientation(40.0);

    assert_eq!(flip.toggle(), 0.0);
    assert_eq!(flip.orientation(), 40.0);
    assert!(!flip.is_flipped());

    // Past edge-on the reversal still heads home without snapping.
    flip.toggle();
    flip.set_orientation(120.0);
    assert_eq!(flip.toggle(), 0.0);
    assert_eq!(flip.orientation(), 120.0);
    assert_eq!(flip.face_visible(), CardFace::Back);
}

#[test]
fn clamps_and_ignores_bad_orientations() {
    let mut flip = FlipController::default();
    flip.set_orientation(-15.0);
    assert_eq!(flip.orientation(), 0.0);
    flip.set_orientation(270.0);
    assert_eq!(flip.orientation(), 180.0);
    flip.set_orientation(f64::NAN);
    assert_eq!(flip.orientation(), 180.0);
}

#[test]
fn opacity_follows_visible_face_and_back_is_counter_rotated() {
    let mut flip = FlipController::default();
    flip.set_orientation(45.0);
    assert_eq!((flip.front_opacity(), flip.back_opacity()), (1.0, 0.0));
    flip.set_orientation(135.0);
    assert_eq!((flip.front_opacity(), flip.back_opacity()), (0.0, 1.0));
    assert_eq!(flip.back_face_rotation(), 180.0);
}

#[test]
fn reset_returns_to_front_at_rest() {
    let mut flip = FlipController::new(true);
    flip.toggle();
    flip.set_orientation(100.0);
    flip.reset();
    assert_eq!(flip, FlipController::new(false));
}
