use crate::data::Account;
use rand::Rng;

/// Both axes of the editor use a normalized [0, 100] range before mapping
/// to pixels or seconds.
pub const NORM_MAX: f64 = 100.0;

pub const MIN_MAX_DELAY: f64 = 1.0;
pub const MAX_MAX_DELAY: f64 = 60.0;
pub const DEFAULT_MAX_DELAY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveKind {
    Uniform,
    #[default]
    Quadratic,
    Random,
    Custom,
}

impl CurveKind {
    /// The selectable preset shapes. `Custom` is entered by dragging a
    /// marker and is never offered as a button.
    pub const PRESETS: [CurveKind; 3] = [
        CurveKind::Uniform,
        CurveKind::Quadratic,
        CurveKind::Random,
    ];

    pub fn is_preset(self) -> bool {
        !matches!(self, CurveKind::Custom)
    }
}

impl std::fmt::Display for CurveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveKind::Uniform => write!(f, "Uniform"),
            CurveKind::Quadratic => write!(f, "Quadratic"),
            CurveKind::Random => write!(f, "Random"),
            CurveKind::Custom => write!(f, "Custom"),
        }
    }
}

/// One editable point binding an account to a (slot, delay) pair.
///
/// `index` is assigned at generation time and never reassigned; `x` is the
/// fixed horizontal slot and only `y` moves during a drag. `delay_secs` is
/// derived from `y` and the current bound and is recomputed in the same
/// step as any change to either.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub index: usize,
    pub address: String,
    pub x: f64,
    pub y: f64,
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveConfig {
    pub kind: CurveKind,
    pub flipped: bool,
    pub max_delay_secs: f64,
    /// Accepted from the host for compatibility; no computation reads it.
    pub min_delay_secs: f64,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            kind: CurveKind::Quadratic,
            flipped: false,
            max_delay_secs: DEFAULT_MAX_DELAY,
            min_delay_secs: 0.0,
        }
    }
}

/// Convert a normalized delay into seconds under the given bound.
pub fn delay_secs(y: f64, max_delay_secs: f64) -> f64 {
    y / NORM_MAX * max_delay_secs
}

/// Inverse of [`delay_secs`].
pub fn norm_from_secs(secs: f64, max_delay_secs: f64) -> f64 {
    if max_delay_secs <= 0.0 {
        return 0.0;
    }
    secs / max_delay_secs * NORM_MAX
}

/// The fixed horizontal slot for an item index. A single item lands on
/// the left edge instead of dividing by zero.
pub fn slot_x(index: usize, count: usize) -> f64 {
    index as f64 / count.saturating_sub(1).max(1) as f64 * NORM_MAX
}

/// Clamp a configured delay bound into the supported range, falling back
/// to the default when the value is not a usable number.
pub fn clamp_max_delay(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_MAX_DELAY, MAX_MAX_DELAY)
    } else {
        DEFAULT_MAX_DELAY
    }
}

/// Parse raw max-delay text input. Empty or non-numeric input falls back
/// to the default bound; out-of-range values are clamped.
pub fn parse_max_delay(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) => clamp_max_delay(value),
        Err(_) => DEFAULT_MAX_DELAY,
    }
}

/// Produce the full marker set for a curve shape.
///
/// For `i` in `0..n`, `t = i / max(n-1, 1)`. Uniform maps both axes to
/// `t`, quadratic squares the delay for a late steep rise, random draws
/// both axes independently per item. Flip replaces `y` with `100 - y`
/// after the shape formula; `delay_secs` is derived from the final `y`.
pub fn generate<R: Rng>(
    accounts: &[Account],
    kind: CurveKind,
    flipped: bool,
    max_delay_secs: f64,
    rng: &mut R,
) -> Vec<Marker> {
    let count = accounts.len();
    let mut markers = Vec::with_capacity(count);

    for (index, account) in accounts.iter().enumerate() {
        let t = index as f64 / count.saturating_sub(1).max(1) as f64;
        let (x, y) = match kind {
            CurveKind::Uniform => (t * NORM_MAX, t * NORM_MAX),
            CurveKind::Quadratic => (t * NORM_MAX, t * t * NORM_MAX),
            CurveKind::Random => (
                rng.random_range(0.0..=NORM_MAX),
                rng.random_range(0.0..=NORM_MAX),
            ),
            // `Custom` has no formula; callers regenerate custom curves
            // with the reset shape.
            CurveKind::Custom => (t * NORM_MAX, t * t * NORM_MAX),
        };

        let y = if flipped { NORM_MAX - y } else { y };
        markers.push(Marker {
            index,
            address: account.address.clone(),
            x,
            y,
            delay_secs: delay_secs(y, max_delay_secs),
        });
    }

    markers
}

pub type DelaySink = Box<dyn FnMut(&[f64]) + Send>;

/// The authoritative ordered marker collection plus the configuration
/// that produced it.
///
/// Every mutating operation reports the full derived delay list, in
/// marker order, to the sink exactly once and synchronously.
pub struct DelayCurve {
    markers: Vec<Marker>,
    config: CurveConfig,
    last_preset: CurveKind,
    on_change: DelaySink,
}

impl DelayCurve {
    pub fn new(config: CurveConfig, on_change: DelaySink) -> Self {
        let config = CurveConfig {
            max_delay_secs: clamp_max_delay(config.max_delay_secs),
            ..config
        };
        let last_preset = if config.kind.is_preset() {
            config.kind
        } else {
            CurveKind::Quadratic
        };

        Self {
            markers: Vec::new(),
            config,
            last_preset,
            on_change,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The ordered delay list, one entry per item in `index` order.
    pub fn delays(&self) -> Vec<f64> {
        self.markers.iter().map(|m| m.delay_secs).collect()
    }

    /// Align the store with a freshly loaded roster.
    ///
    /// Regenerates from the last preset when the roster differs from the
    /// current markers in count or content, discarding drag edits. An
    /// identical roster leaves the store untouched; an empty roster
    /// clears it without notifying the sink.
    pub fn sync_accounts(&mut self, accounts: &[Account]) {
        if accounts.is_empty() {
            self.markers.clear();
            return;
        }

        let unchanged = self.markers.len() == accounts.len()
            && self
                .markers
                .iter()
                .zip(accounts)
                .all(|(marker, account)| marker.address == account.address);
        if unchanged {
            return;
        }

        self.config.kind = self.last_preset;
        let markers = generate(
            accounts,
            self.config.kind,
            self.config.flipped,
            self.config.max_delay_secs,
            &mut rand::rng(),
        );
        self.replace_all(markers);
    }

    /// Apply a preset shape to the current items, replacing any drag
    /// edits. `Custom` is not a preset and is ignored.
    pub fn apply_preset(&mut self, kind: CurveKind) {
        if !kind.is_preset() {
            return;
        }
        self.config.kind = kind;
        self.last_preset = kind;
        self.regenerate();
    }

    /// Invert the curve direction. Regenerates from the last preset, so
    /// drag edits do not survive a flip.
    pub fn toggle_flip(&mut self) {
        self.config.flipped = !self.config.flipped;
        self.config.kind = self.last_preset;
        self.regenerate();
    }

    /// Restore the default shape with the current flip state.
    pub fn reset(&mut self) {
        self.config.kind = CurveKind::Quadratic;
        self.last_preset = CurveKind::Quadratic;
        self.regenerate();
    }

    /// Reinterpret the current shape under a new delay bound parsed from
    /// raw text input. `y` values are untouched; only `delay_secs` is
    /// recomputed. Returns the bound that was applied so the input field
    /// can echo it.
    pub fn set_max_delay(&mut self, input: &str) -> f64 {
        let bound = parse_max_delay(input);
        self.config.max_delay_secs = bound;
        for marker in &mut self.markers {
            marker.delay_secs = delay_secs(marker.y, bound);
        }
        if !self.markers.is_empty() {
            self.emit();
        }
        bound
    }

    /// Commit a drag gesture: update one marker's delay, leaving its
    /// slot and every other marker untouched. An unknown index is a
    /// no-op.
    pub fn commit_drag(&mut self, index: usize, y: f64) {
        let y = y.clamp(0.0, NORM_MAX);
        let Some(marker) = self.markers.iter_mut().find(|m| m.index == index) else {
            log::warn!("drag commit for unknown marker index {index}");
            return;
        };

        marker.y = y;
        marker.delay_secs = delay_secs(y, self.config.max_delay_secs);
        self.config.kind = CurveKind::Custom;
        self.emit();
    }

    fn regenerate(&mut self) {
        if self.markers.is_empty() {
            return;
        }
        let accounts: Vec<Account> = self
            .markers
            .iter()
            .map(|m| Account {
                address: m.address.clone(),
            })
            .collect();
        let markers = generate(
            &accounts,
            self.config.kind,
            self.config.flipped,
            self.config.max_delay_secs,
            &mut rand::rng(),
        );
        self.replace_all(markers);
    }

    fn replace_all(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
        self.emit();
    }

    fn emit(&mut self) {
        let delays = self.delays();
        (self.on_change)(&delays);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::{Arc, Mutex};

    fn accounts(n: usize) -> Vec<Account> {
        (0..n)
            .map(|i| Account {
                address: format!("acct{i:02}"),
            })
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn curve_with_log() -> (DelayCurve, Arc<Mutex<Vec<Vec<f64>>>>) {
        let emissions = Arc::new(Mutex::new(Vec::new()));
        let sink = emissions.clone();
        let curve = DelayCurve::new(
            CurveConfig::default(),
            Box::new(move |delays| sink.lock().unwrap().push(delays.to_vec())),
        );
        (curve, emissions)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn generate_returns_one_marker_per_item_in_order() {
        for kind in CurveKind::PRESETS {
            let markers = generate(&accounts(5), kind, false, DEFAULT_MAX_DELAY, &mut rng());
            assert_eq!(markers.len(), 5);
            for (i, marker) in markers.iter().enumerate() {
                assert_eq!(marker.index, i);
                assert_eq!(marker.address, format!("acct{i:02}"));
            }
        }
    }

    #[test]
    fn uniform_maps_both_axes_to_t() {
        let markers = generate(
            &accounts(4),
            CurveKind::Uniform,
            false,
            DEFAULT_MAX_DELAY,
            &mut rng(),
        );
        for marker in &markers {
            assert_close(marker.y, marker.x);
        }
        assert_close(markers[3].x, NORM_MAX);
    }

    #[test]
    fn quadratic_squares_the_ramp() {
        let n = 5;
        let markers = generate(
            &accounts(n),
            CurveKind::Quadratic,
            false,
            DEFAULT_MAX_DELAY,
            &mut rng(),
        );
        for (i, marker) in markers.iter().enumerate() {
            let t = i as f64 / (n - 1) as f64;
            assert_close(marker.x, t * NORM_MAX);
            assert_close(marker.y, t * t * NORM_MAX);
        }
    }

    #[test]
    fn single_item_lands_on_the_left_edge() {
        for kind in [CurveKind::Uniform, CurveKind::Quadratic] {
            let markers = generate(&accounts(1), kind, false, DEFAULT_MAX_DELAY, &mut rng());
            assert_eq!(markers.len(), 1);
            assert_close(markers[0].x, 0.0);
            assert_close(markers[0].y, 0.0);
            assert_close(markers[0].delay_secs, 0.0);
        }
    }

    #[test]
    fn random_draws_stay_in_range() {
        let markers = generate(
            &accounts(40),
            CurveKind::Random,
            false,
            20.0,
            &mut rng(),
        );
        for marker in &markers {
            assert!((0.0..=NORM_MAX).contains(&marker.x));
            assert!((0.0..=NORM_MAX).contains(&marker.y));
            assert_close(marker.delay_secs, marker.y / NORM_MAX * 20.0);
        }
    }

    #[test]
    fn flip_mirrors_the_delay_axis() {
        let plain = generate(
            &accounts(4),
            CurveKind::Quadratic,
            false,
            DEFAULT_MAX_DELAY,
            &mut rng(),
        );
        let flipped = generate(
            &accounts(4),
            CurveKind::Quadratic,
            true,
            DEFAULT_MAX_DELAY,
            &mut rng(),
        );
        for (a, b) in plain.iter().zip(&flipped) {
            assert_close(b.y, NORM_MAX - a.y);
            assert_close(b.x, a.x);
        }
    }

    #[test]
    fn flip_is_involutive_for_preset_shapes() {
        for kind in [CurveKind::Uniform, CurveKind::Quadratic] {
            let (mut curve, _) = curve_with_log();
            curve.sync_accounts(&accounts(6));
            curve.apply_preset(kind);
            let before: Vec<f64> = curve.markers().iter().map(|m| m.y).collect();

            curve.toggle_flip();
            curve.toggle_flip();

            let after: Vec<f64> = curve.markers().iter().map(|m| m.y).collect();
            for (a, b) in before.iter().zip(&after) {
                assert_close(*a, *b);
            }
        }
    }

    #[test]
    fn scenario_quadratic_three_items() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(3));

        let delays = curve.delays();
        assert_close(delays[0], 0.0);
        assert_close(delays[1], 2.5);
        assert_close(delays[2], 10.0);
    }

    #[test]
    fn scenario_flipped_three_items() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(3));
        curve.toggle_flip();

        let delays = curve.delays();
        assert_close(delays[0], 10.0);
        assert_close(delays[1], 7.5);
        assert_close(delays[2], 0.0);
    }

    #[test]
    fn drag_commit_touches_exactly_one_marker() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(3));
        let before: Vec<Marker> = curve.markers().to_vec();

        curve.commit_drag(1, 60.0);

        let markers = curve.markers();
        assert_close(markers[1].y, 60.0);
        assert_close(markers[1].delay_secs, 6.0);
        assert_close(markers[1].x, before[1].x);
        assert_eq!(markers[0], before[0]);
        assert_eq!(markers[2], before[2]);
        assert_eq!(curve.config().kind, CurveKind::Custom);
    }

    #[test]
    fn drag_commit_clamps_out_of_range_values() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(3));

        curve.commit_drag(0, 240.0);
        assert_close(curve.markers()[0].y, NORM_MAX);

        curve.commit_drag(0, -35.0);
        assert_close(curve.markers()[0].y, 0.0);
    }

    #[test]
    fn drag_commit_for_unknown_index_is_a_noop() {
        let (mut curve, emissions) = curve_with_log();
        curve.sync_accounts(&accounts(3));
        let before: Vec<Marker> = curve.markers().to_vec();
        let emitted = emissions.lock().unwrap().len();

        curve.commit_drag(99, 50.0);

        assert_eq!(curve.markers(), &before[..]);
        assert_eq!(curve.config().kind, CurveKind::Quadratic);
        assert_eq!(emissions.lock().unwrap().len(), emitted);
    }

    #[test]
    fn rescale_keeps_the_shape_and_rederives_seconds() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(3));
        curve.commit_drag(1, 40.0);
        let before: Vec<f64> = curve.markers().iter().map(|m| m.y).collect();

        let applied = curve.set_max_delay("20");

        assert_close(applied, 20.0);
        for (marker, y) in curve.markers().iter().zip(&before) {
            assert_close(marker.y, *y);
            assert_close(marker.delay_secs, y / NORM_MAX * 20.0);
        }
        assert_eq!(curve.config().kind, CurveKind::Custom);
    }

    #[test]
    fn max_delay_input_falls_back_and_clamps() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(2));

        assert_close(curve.set_max_delay(""), DEFAULT_MAX_DELAY);
        assert_close(curve.set_max_delay("999"), MAX_MAX_DELAY);
        assert_close(curve.set_max_delay("0.2"), MIN_MAX_DELAY);
        assert_close(curve.set_max_delay("abc"), DEFAULT_MAX_DELAY);
        assert_close(curve.set_max_delay("nan"), DEFAULT_MAX_DELAY);
        assert_close(curve.set_max_delay(" 15 "), 15.0);
    }

    #[test]
    fn publisher_fires_once_per_mutation_with_full_lists() {
        let (mut curve, emissions) = curve_with_log();

        curve.sync_accounts(&accounts(4));
        curve.apply_preset(CurveKind::Uniform);
        curve.toggle_flip();
        curve.set_max_delay("30");
        curve.commit_drag(2, 50.0);

        let emissions = emissions.lock().unwrap();
        assert_eq!(emissions.len(), 5);
        for emitted in emissions.iter() {
            assert_eq!(emitted.len(), 4);
        }
        assert_eq!(*emissions.last().unwrap(), curve.delays());
    }

    #[test]
    fn empty_roster_clears_without_notifying() {
        let (mut curve, emissions) = curve_with_log();

        curve.sync_accounts(&[]);
        assert!(curve.is_empty());
        assert!(emissions.lock().unwrap().is_empty());

        curve.sync_accounts(&accounts(3));
        assert_eq!(emissions.lock().unwrap().len(), 1);

        curve.sync_accounts(&[]);
        assert!(curve.is_empty());
        assert_eq!(emissions.lock().unwrap().len(), 1);
    }

    #[test]
    fn identical_roster_is_a_noop_and_keeps_edits() {
        let (mut curve, emissions) = curve_with_log();
        let roster = accounts(3);
        curve.sync_accounts(&roster);
        curve.commit_drag(1, 80.0);

        curve.sync_accounts(&roster);

        assert_close(curve.markers()[1].y, 80.0);
        assert_eq!(emissions.lock().unwrap().len(), 2);
    }

    #[test]
    fn count_change_regenerates_from_the_last_preset() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(3));
        curve.apply_preset(CurveKind::Uniform);
        curve.commit_drag(0, 90.0);

        curve.sync_accounts(&accounts(5));

        assert_eq!(curve.markers().len(), 5);
        assert_eq!(curve.config().kind, CurveKind::Uniform);
        for marker in curve.markers() {
            assert_close(marker.y, marker.x);
        }
    }

    #[test]
    fn flip_regenerates_from_the_last_preset_while_custom() {
        let (mut curve, _) = curve_with_log();
        curve.sync_accounts(&accounts(4));
        curve.apply_preset(CurveKind::Uniform);
        curve.commit_drag(2, 5.0);

        curve.toggle_flip();

        assert_eq!(curve.config().kind, CurveKind::Uniform);
        assert!(curve.config().flipped);
        for marker in curve.markers() {
            assert_close(marker.y, NORM_MAX - marker.x);
        }
    }

    #[test]
    fn reset_restores_the_default_shape() {
        let (mut curve, _) = curve_with_log();
        let n = 4;
        curve.sync_accounts(&accounts(n));
        curve.apply_preset(CurveKind::Random);
        curve.commit_drag(3, 1.0);

        curve.reset();

        assert_eq!(curve.config().kind, CurveKind::Quadratic);
        for (i, marker) in curve.markers().iter().enumerate() {
            let t = i as f64 / (n - 1) as f64;
            assert_close(marker.y, t * t * NORM_MAX);
        }
    }

    #[test]
    fn slot_positions_cover_the_axis() {
        assert_close(slot_x(0, 1), 0.0);
        assert_close(slot_x(0, 5), 0.0);
        assert_close(slot_x(4, 5), NORM_MAX);
        assert_close(slot_x(2, 5), 50.0);
    }

    #[test]
    fn seconds_mapping_round_trips() {
        for y in [0.0, 12.5, 50.0, 100.0] {
            let secs = delay_secs(y, 24.0);
            assert_close(norm_from_secs(secs, 24.0), y);
        }
    }
}
