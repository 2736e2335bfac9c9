//! Day-stepped scan for transiting aspects against a natal layer.
//!
//! One transiting layer is built per sampled day and every
//! (transiting, natal) pair is classified against the major-aspect table.
//! Consecutive in-orb days merge into intervals; an interval still open at
//! the horizon is followed day-by-day past it, up to a bounded extension.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use astro_aspects::classify_pair;
use astro_chart::{ChartError, ChartLayer, ChartPoint, ChartRequest, PointId, build_layer};
use astro_config::{AspectRule, AspectTable, ScanSettings};
use astro_core::angle::separation_deg;
use astro_ephem::{Body, Ephemeris, Frame};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scan horizon: a start instant and a span in whole days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start_jd_ut: f64,
    pub horizon_days: u32,
}

/// Inputs for one transit scan.
#[derive(Debug, Clone)]
pub struct ScanRequest<'a> {
    pub natal: &'a ChartLayer,
    pub window: TimeWindow,
    /// Place the transiting layer is computed for.
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub roster: &'a [Body],
    /// Major-aspect subset; minor aspects are too brief for daily sampling.
    pub table: &'a AspectTable,
    pub settings: ScanSettings,
}

/// Cooperative cancellation flag for the scan loop, checked once per
/// sampled day.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Progress report emitted once per sampled day.
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress {
    pub day_offset: f64,
    pub horizon_days: u32,
    pub open_intervals: usize,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("transit scan cancelled at day offset {day_offset}")]
    Cancelled { day_offset: f64 },
    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// One detected transit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitInterval {
    pub transiting: PointId,
    pub natal: PointId,
    pub aspect: String,
    pub start_jd_ut: f64,
    pub end_jd_ut: f64,
    /// True when the pair was still in orb at the last horizon sample and
    /// the end date comes from the bounded extension scan.
    pub extends_beyond_horizon: bool,
    /// Tightest orb observed across the interval.
    pub min_orb_deg: f64,
    /// Sample where the tightest orb was observed.
    pub peak_jd_ut: f64,
    /// Transiting point's sign and motion at the peak sample.
    pub transiting_sign: String,
    pub transiting_retrograde: bool,
    /// Natal point's sign and (when the natal layer has cusps) house.
    pub natal_sign: String,
    pub natal_house: Option<u8>,
}

/// Date-stamped sample stream for the scan loop.
///
/// An explicit iterator so adaptive step sizing (finer steps for
/// fast-moving bodies) can replace it later without touching the
/// interval-merging logic.
#[derive(Debug, Clone)]
pub struct DaySampler {
    start_jd_ut: f64,
    step_days: f64,
    next_index: u32,
    sample_count: u32,
}

/// One sampled moment of the scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySample {
    pub index: u32,
    pub offset_days: f64,
    pub jd_ut: f64,
}

impl DaySampler {
    pub fn new(start_jd_ut: f64, step_days: f64, span_days: u32) -> Self {
        let step = step_days.max(0.1);
        let sample_count = (f64::from(span_days) / step).floor() as u32 + 1;
        Self {
            start_jd_ut,
            step_days: step,
            next_index: 0,
            sample_count,
        }
    }
}

impl Iterator for DaySampler {
    type Item = DaySample;

    fn next(&mut self) -> Option<DaySample> {
        if self.next_index >= self.sample_count {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        let offset_days = f64::from(index) * self.step_days;
        Some(DaySample {
            index,
            offset_days,
            jd_ut: self.start_jd_ut + offset_days,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IntervalKey {
    transiting: PointId,
    natal: PointId,
    aspect: String,
}

#[derive(Debug, Clone)]
struct OpenInterval {
    transiting_body: Body,
    start_offset: f64,
    last_seen_offset: f64,
    min_orb_deg: f64,
    peak_offset: f64,
    peak_sign: String,
    peak_retrograde: bool,
}

/// Scan the window for transiting aspects against the natal layer.
///
/// Output carries one record per (transiting point, natal point, aspect)
/// interval, sorted by start date. Progress is reported per sampled day;
/// cancellation is checked at the same cadence.
pub fn scan_transits(
    ephemeris: &dyn Ephemeris,
    request: &ScanRequest<'_>,
    cancel: Option<&CancelToken>,
    mut progress: Option<&mut dyn FnMut(ScanProgress)>,
) -> Result<Vec<TransitInterval>, ScanError> {
    let settings = request.settings;
    log::info!(
        "transit scan: {} days from JD {}, step {} days",
        request.window.horizon_days,
        request.window.start_jd_ut,
        settings.step_days
    );

    let mut open: HashMap<IntervalKey, OpenInterval> = HashMap::new();
    let mut finished: Vec<(IntervalKey, OpenInterval, bool)> = Vec::new();
    let mut final_offset = 0.0_f64;

    for sample in DaySampler::new(
        request.window.start_jd_ut,
        settings.step_days,
        request.window.horizon_days,
    ) {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(ScanError::Cancelled {
                    day_offset: sample.offset_days,
                });
            }
        }
        if let Some(report) = progress.as_deref_mut() {
            report(ScanProgress {
                day_offset: sample.offset_days,
                horizon_days: request.window.horizon_days,
                open_intervals: open.len(),
            });
        }
        final_offset = sample.offset_days;

        let transiting = build_layer(
            ephemeris,
            &ChartRequest::transiting(
                sample.jd_ut,
                request.latitude_deg,
                request.longitude_deg,
                request.roster,
            ),
        )?;

        for t_point in &transiting.points {
            let PointId::Body(t_body) = t_point.id else {
                continue;
            };
            for n_point in &request.natal.points {
                let Some(hit) = classify_pair(t_point, n_point, request.table) else {
                    continue;
                };
                let key = IntervalKey {
                    transiting: t_point.id,
                    natal: n_point.id,
                    aspect: hit.aspect,
                };
                match open.remove(&key) {
                    Some(mut interval)
                        if sample.offset_days - interval.last_seen_offset
                            <= settings.merge_gap_days =>
                    {
                        interval.last_seen_offset = sample.offset_days;
                        note_orb(&mut interval, hit.orb_deg, sample.offset_days, t_point);
                        open.insert(key, interval);
                    }
                    previous => {
                        // Either nothing was open for this key, or the gap
                        // since the last hit means a genuinely separate pass.
                        if let Some(stale) = previous {
                            finished.push((key.clone(), stale, false));
                        }
                        open.insert(
                            key,
                            OpenInterval {
                                transiting_body: t_body,
                                start_offset: sample.offset_days,
                                last_seen_offset: sample.offset_days,
                                min_orb_deg: hit.orb_deg,
                                peak_offset: sample.offset_days,
                                peak_sign: t_point.sign().to_string(),
                                peak_retrograde: t_point.retrograde,
                            },
                        );
                    }
                }
            }
        }
    }

    // Intervals in orb at the last sampled day get followed past the
    // horizon; everything else closes where it was last seen.
    for (key, mut interval) in open.drain() {
        let open_at_horizon = final_offset - interval.last_seen_offset < 1e-9;
        if open_at_horizon {
            extend_past_horizon(ephemeris, request, &key, &mut interval, final_offset)?;
            finished.push((key, interval, true));
        } else {
            finished.push((key, interval, false));
        }
    }

    let mut intervals: Vec<TransitInterval> = finished
        .into_iter()
        .map(|(key, interval, beyond)| to_record(request, key, interval, beyond))
        .collect();
    intervals.sort_by(|a, b| {
        a.start_jd_ut
            .partial_cmp(&b.start_jd_ut)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.aspect.cmp(&b.aspect))
    });
    log::info!("transit scan: {} intervals detected", intervals.len());
    Ok(intervals)
}

fn note_orb(interval: &mut OpenInterval, orb_deg: f64, offset_days: f64, t_point: &ChartPoint) {
    if orb_deg < interval.min_orb_deg {
        interval.min_orb_deg = orb_deg;
        interval.peak_offset = offset_days;
        interval.peak_sign = t_point.sign().to_string();
        interval.peak_retrograde = t_point.retrograde;
    }
}

/// Follow one still-open interval day-by-day past the horizon until the
/// pair falls out of orb or the extension cap runs out. Only the one
/// transiting body is queried; the rest of the layer is irrelevant here.
fn extend_past_horizon(
    ephemeris: &dyn Ephemeris,
    request: &ScanRequest<'_>,
    key: &IntervalKey,
    interval: &mut OpenInterval,
    horizon_offset: f64,
) -> Result<(), ScanError> {
    let Some(rule) = rule_by_label(request.table, &key.aspect) else {
        return Ok(());
    };
    let Some(natal_point) = request.natal.point(key.natal) else {
        return Ok(());
    };
    let body = interval.transiting_body;
    let cap = f64::from(request.settings.extension_cap_days);
    let step = request.settings.step_days.max(0.1);

    let mut offset = horizon_offset + step;
    while offset - horizon_offset <= cap {
        let position = ephemeris
            .position_at(request.window.start_jd_ut + offset, body, Frame::Geocentric)
            .map_err(ChartError::from)?;
        let point = ChartPoint {
            id: PointId::Body(body),
            longitude_deg: position.longitude_deg,
            speed_deg_per_day: position.speed_deg_per_day,
            retrograde: position.speed_deg_per_day < 0.0,
            luminary: body.is_luminary(Frame::Geocentric),
        };
        if !in_orb(&point, natal_point, rule) {
            break;
        }
        interval.last_seen_offset = offset;
        let orb = (separation_deg(point.longitude_deg, natal_point.longitude_deg)
            - rule.exact_angle_deg)
            .abs();
        note_orb(interval, orb, offset, &point);
        offset += step;
    }
    log::debug!(
        "extended {} {} {} to day offset {}",
        key.transiting,
        key.aspect,
        key.natal,
        interval.last_seen_offset
    );
    Ok(())
}

fn in_orb(a: &ChartPoint, b: &ChartPoint, rule: &AspectRule) -> bool {
    let limit = if a.luminary || b.luminary {
        rule.orb_luminary_deg
    } else {
        rule.orb_standard_deg
    };
    let orb = (separation_deg(a.longitude_deg, b.longitude_deg) - rule.exact_angle_deg).abs();
    limit > 0.0 && orb < limit
}

fn rule_by_label<'a>(table: &'a AspectTable, label: &str) -> Option<&'a AspectRule> {
    table.rules.iter().find(|rule| rule.label == label)
}

fn to_record(
    request: &ScanRequest<'_>,
    key: IntervalKey,
    interval: OpenInterval,
    extends_beyond_horizon: bool,
) -> TransitInterval {
    let natal_point = request.natal.point(key.natal);
    let natal_sign = natal_point
        .map(|p| p.sign().to_string())
        .unwrap_or_default();
    let natal_house = request.natal.house_of(key.natal);
    TransitInterval {
        transiting: key.transiting,
        natal: key.natal,
        aspect: key.aspect,
        start_jd_ut: request.window.start_jd_ut + interval.start_offset,
        end_jd_ut: request.window.start_jd_ut + interval.last_seen_offset,
        extends_beyond_horizon,
        min_orb_deg: interval.min_orb_deg,
        peak_jd_ut: request.window.start_jd_ut + interval.peak_offset,
        transiting_sign: interval.peak_sign,
        transiting_retrograde: interval.peak_retrograde,
        natal_sign,
        natal_house,
    }
}
