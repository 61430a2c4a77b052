//! Water and turbidity transfer between tanks.
//!
//! Transfers saturate at tank boundaries and never fail; moving nothing is
//! a valid outcome.  Turbidity is blended by the amount actually moved,
//! after clamping.

use super::tank::{Capacity, Tank};

/// Move up to `requested` units from `source` into `sink` at
/// `incoming_turbidity`.  Returns the amount moved.
pub fn transfer(source: &mut Tank, sink: &mut Tank, requested: u32, incoming_turbidity: f32) -> u32 {
    let moved = requested.min(source.available()).min(sink.room());
    if moved == 0 {
        return 0;
    }

    blend_into(sink, moved, incoming_turbidity);

    if source.capacity != Capacity::Limitless {
        source.quantity -= moved;
    }
    if sink.is_bounded() {
        sink.quantity += moved;
    }
    moved
}

/// Pass up to `requested` units of `tank` through a device and back into the
/// same tank.  Quantity is unchanged; the treated share is re-blended.
pub fn recirculate(tank: &mut Tank, requested: u32, incoming_turbidity: f32) -> u32 {
    let moved = requested.min(tank.available());
    if moved == 0 || !tank.is_bounded() {
        return moved;
    }

    let q = f64::from(tank.quantity);
    let treated = f64::from(moved);
    let blended = (f64::from(incoming_turbidity) * treated
        + f64::from(tank.turbidity) * (q - treated))
        / q;
    tank.turbidity = bounded_blend(blended, tank.turbidity, incoming_turbidity);
    moved
}

fn blend_into(sink: &mut Tank, moved: u32, incoming_turbidity: f32) {
    match sink.capacity {
        // Infinite dilution.
        Capacity::Limitless => {}
        Capacity::Bottomless => sink.turbidity = incoming_turbidity,
        Capacity::Bounded(_) => {
            let q = f64::from(sink.quantity);
            let m = f64::from(moved);
            let blended =
                (f64::from(incoming_turbidity) * m + f64::from(sink.turbidity) * q) / (q + m);
            sink.turbidity = bounded_blend(blended, sink.turbidity, incoming_turbidity);
        }
    }
}

/// Keep rounding from pushing a weighted average outside its inputs.
fn bounded_blend(blended: f64, a: f32, b: f32) -> f32 {
    (blended as f32).clamp(a.min(b), a.max(b))
}
