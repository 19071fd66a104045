//! Interest weights per action kind

use event_schema::ActionKind;

pub const VIEW_WEIGHT: f64 = 0.4;
pub const REGISTER_WEIGHT: f64 = 0.8;
pub const LIKE_WEIGHT: f64 = 1.0;

/// Interest weight of an action kind
///
/// Stronger commitment to an event yields a larger weight. The match is
/// exhaustive, so adding a kind to [`ActionKind`] forces a weight to be
/// chosen here.
pub fn weight_of(kind: ActionKind) -> f64 {
    match kind {
        ActionKind::View => VIEW_WEIGHT,
        ActionKind::Register => REGISTER_WEIGHT,
        ActionKind::Like => LIKE_WEIGHT,
    }
}
