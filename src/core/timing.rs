use crate::core::state::PolyInfo;
use crate::error::{NodeError, Result};

/// Resolves a global time to the segment it falls in and the time local to
/// that segment.
///
/// The segment is the first one whose cumulative end time exceeds `t_global`,
/// so a time exactly on a boundary belongs to the later segment. Times at or
/// slightly past the total duration are evaluated on the last segment.
///
/// # Arguments
/// * `t_global` - Time since the start of the trajectory.
/// * `durations` - Duration of every segment, in order.
/// * `tolerance` - How far past the total duration `t_global` may lie.
///
/// # Returns
/// `(segment_id, t_local)`, or an error if the durations are unset or the
/// time lies outside the trajectory.
pub fn local_time(t_global: f64, durations: &[f64], tolerance: f64) -> Result<(usize, f64)> {
    if durations.is_empty() {
        return Err(NodeError::EmptySchedule);
    }
    if durations.iter().any(|&d| d <= 0.0) {
        return Err(NodeError::DurationsNotSet);
    }

    let total: f64 = durations.iter().sum();
    if !(t_global >= 0.0 && t_global <= total + tolerance) {
        return Err(NodeError::time_out_of_range(t_global, total));
    }

    let mut t_start = 0.0;
    for (id, &d) in durations.iter().enumerate() {
        if t_start + d > t_global {
            return Ok((id, t_global - t_start));
        }
        t_start += d;
    }

    // At or within tolerance past the end: stay on the last segment.
    let last = durations.len() - 1;
    let t_local = t_global - (t_start - durations[last]);
    if t_global > total {
        tracing::warn!(t_global, total, "query time clamped onto last segment");
    }
    Ok((last, t_local))
}

/// Checks that every duration is positive and finite.
pub fn validate_durations(durations: &[f64]) -> Result<()> {
    for (index, &duration) in durations.iter().enumerate() {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(NodeError::InvalidDuration { index, duration });
        }
    }
    Ok(())
}

/// Splits every phase duration evenly across the segments of that phase.
///
/// # Arguments
/// * `poly_infos` - Placement of every segment in the phase schedule.
/// * `phase_durations` - Duration of every phase.
///
/// # Returns
/// One duration per segment, such that the segments of each phase sum to
/// that phase's duration.
pub fn segment_durations(poly_infos: &[PolyInfo], phase_durations: &[f64]) -> Result<Vec<f64>> {
    validate_durations(phase_durations)?;

    poly_infos
        .iter()
        .map(|info| {
            let phase_duration = phase_durations
                .get(info.phase)
                .ok_or_else(|| NodeError::index_out_of_range(info.phase, phase_durations.len()))?;
            Ok(phase_duration / info.num_polys_in_phase as f64)
        })
        .collect()
}
