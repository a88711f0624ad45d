pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Map a `[0, 1]` float to `0..=255`, rounding to nearest. NaN maps to 0.
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn nearly_integer(v: f64) -> bool {
    (v - v.round()).abs() <= 1e-4
}

pub(crate) fn nearly_zero(v: f64) -> bool {
    v.abs() <= 1e-6
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
