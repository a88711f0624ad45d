use super::*;

#[test]
fn mul_div255_matches_exact_rounding() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(200, 128), 100);
}

#[test]
fn unit_to_u8_clamps_and_rounds() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(2.0), 255);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(unit_to_u8(f32::NAN), 0);
}

#[test]
fn near_integer_tolerance() {
    assert!(nearly_integer(3.00001));
    assert!(!nearly_integer(3.25));
    assert!(nearly_zero(-1e-9));
}
