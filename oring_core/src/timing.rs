// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Refresh periods and next-frame target prediction.
//!
//! Two prediction rules exist, graded by how much the display server told us:
//!
//! - **Presented**: an authoritative presentation timestamp `P` is known, so
//!   the next frame targets `P + period`.
//! - **Draw-done**: only a "drawing complete" signal at `D` is known. That
//!   signal arrives roughly half a refresh before the frame it completes is
//!   shown, so the next committable frame targets `D + 1.5 × period`.
//!
//! The period itself is resolved from the best available source, in order:
//! the compositor's refresh hint, the sync output's current mode, the
//! surface's current output, and finally a nominal period.

use crate::output::Output;
use crate::time::{Duration, LogicalTime};

/// Nominal refresh rate used when nothing better is known (60 Hz).
pub const NOMINAL_REFRESH_MILLIHZ: u32 = 60_000;

/// Refresh period of [`NOMINAL_REFRESH_MILLIHZ`], rounded to the nearest
/// nanosecond.
pub const NOMINAL_REFRESH_PERIOD: Duration = Duration(16_666_667);

/// Converts a refresh rate in millihertz to a period, rounded to the nearest
/// nanosecond.
///
/// Returns `None` for `0`, which the protocol uses for "unknown".
#[must_use]
pub const fn period_from_millihz(millihz: u32) -> Option<Duration> {
    if millihz == 0 {
        return None;
    }
    let millihz = millihz as u64;
    Some(Duration((1_000_000_000_000 + millihz / 2) / millihz))
}

/// Where a prediction's refresh period came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeriodSource {
    /// The refresh interval carried on the presentation confirmation.
    FeedbackHint,
    /// The current mode of the output the frame was synchronized to.
    SyncOutput,
    /// The current mode of an output the surface occupies.
    SurfaceOutput,
    /// The configured nominal fallback.
    Nominal,
}

/// Which signal a prediction was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PredictionBasis {
    /// An explicit presentation timestamp.
    Presented,
    /// A drawing-complete signal (or the time a discard was handled).
    DrawDone,
}

/// The predicted target time for the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Prediction {
    /// Logical time the next frame should aim at.
    pub next_target: LogicalTime,
    /// Refresh period the prediction used.
    pub period: Duration,
    /// Where `period` came from.
    pub period_source: PeriodSource,
    /// Which signal anchored the prediction.
    pub basis: PredictionBasis,
}

/// Picks the refresh period from the best available source.
///
/// A zero `hint` means the compositor did not report one.
#[must_use]
pub fn resolve_period(
    hint: Duration,
    sync_output: Option<&Output>,
    surface_output: Option<&Output>,
    nominal: Duration,
) -> (Duration, PeriodSource) {
    if !hint.is_zero() {
        return (hint, PeriodSource::FeedbackHint);
    }
    if let Some(period) = sync_output.and_then(Output::refresh_period) {
        return (period, PeriodSource::SyncOutput);
    }
    if let Some(period) = surface_output.and_then(Output::refresh_period) {
        return (period, PeriodSource::SurfaceOutput);
    }
    (nominal, PeriodSource::Nominal)
}

/// Predicts the next target one period after a confirmed presentation.
#[must_use]
pub fn predict_after_presented(
    presented: LogicalTime,
    period: Duration,
    period_source: PeriodSource,
) -> Prediction {
    Prediction {
        next_target: presented.saturating_add(period),
        period,
        period_source,
        basis: PredictionBasis::Presented,
    }
}

/// Predicts the next target one and a half periods after a draw-done signal.
#[must_use]
pub fn predict_after_draw_done(
    draw_done: LogicalTime,
    period: Duration,
    period_source: PeriodSource,
) -> Prediction {
    Prediction {
        next_target: draw_done.saturating_add(period.mul_ratio(3, 2)),
        period,
        period_source,
        basis: PredictionBasis::DrawDone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputId, VideoMode};

    fn output_at(refresh_millihz: u32) -> Output {
        let output = Output::new(OutputId(0), 1);
        output.add_mode(VideoMode {
            width: 800,
            height: 600,
            refresh_millihz,
            current: true,
            preferred: true,
        });
        output
    }

    #[test]
    fn millihz_conversion_rounds_to_nearest() {
        assert_eq!(period_from_millihz(60_000), Some(NOMINAL_REFRESH_PERIOD));
        assert_eq!(period_from_millihz(144_000), Some(Duration(6_944_444)));
        assert_eq!(period_from_millihz(59_940), Some(Duration(16_683_350)));
        assert_eq!(period_from_millihz(0), None);
    }

    #[test]
    fn nonzero_hint_wins() {
        let output = output_at(144_000);
        let (period, source) = resolve_period(
            Duration(8_333_333),
            Some(&output),
            Some(&output),
            NOMINAL_REFRESH_PERIOD,
        );
        assert_eq!(period, Duration(8_333_333));
        assert_eq!(source, PeriodSource::FeedbackHint);
    }

    #[test]
    fn period_falls_back_in_order() {
        let sync = output_at(120_000);
        let surface = output_at(50_000);

        let (period, source) = resolve_period(
            Duration::ZERO,
            Some(&sync),
            Some(&surface),
            NOMINAL_REFRESH_PERIOD,
        );
        assert_eq!((period, source), (Duration(8_333_333), PeriodSource::SyncOutput));

        let (period, source) =
            resolve_period(Duration::ZERO, None, Some(&surface), NOMINAL_REFRESH_PERIOD);
        assert_eq!(
            (period, source),
            (Duration(20_000_000), PeriodSource::SurfaceOutput)
        );

        let (period, source) = resolve_period(Duration::ZERO, None, None, NOMINAL_REFRESH_PERIOD);
        assert_eq!((period, source), (NOMINAL_REFRESH_PERIOD, PeriodSource::Nominal));
    }

    #[test]
    fn output_without_mode_is_skipped() {
        let unknown = Output::new(OutputId(3), 3);
        let surface = output_at(60_000);
        let (_, source) = resolve_period(
            Duration::ZERO,
            Some(&unknown),
            Some(&surface),
            NOMINAL_REFRESH_PERIOD,
        );
        assert_eq!(source, PeriodSource::SurfaceOutput);
    }

    #[test]
    fn presented_prediction_adds_one_period() {
        let p = predict_after_presented(
            LogicalTime(1_000_000),
            Duration(16_000_000),
            PeriodSource::FeedbackHint,
        );
        assert_eq!(p.next_target, LogicalTime(17_000_000));
        assert_eq!(p.basis, PredictionBasis::Presented);
    }

    #[test]
    fn draw_done_prediction_adds_one_and_a_half_periods() {
        let p = predict_after_draw_done(
            LogicalTime(120),
            NOMINAL_REFRESH_PERIOD,
            PeriodSource::SurfaceOutput,
        );
        assert_eq!(p.next_target, LogicalTime(25_000_120));
        assert_eq!(p.basis, PredictionBasis::DrawDone);
    }
}
