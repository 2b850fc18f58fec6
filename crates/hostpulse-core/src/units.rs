//! Display-unit selection and label formatting.
//!
//! A [`UnitLadder`] is an ascending list of units with their base-unit
//! equivalents. Selection is a left bisection over those thresholds: the
//! largest unit whose threshold is `<=` the magnitude wins, clamped to the
//! ends of the ladder.
//!
//! Callers picking a unit for a chart feed the observed maximum through
//! [`UnitLadder::select_with_headroom`], which multiplies by [`HEADROOM`]
//! first. That moves the switch to the next unit slightly ahead of the
//! mathematical boundary, so a metric hovering around 1024 does not make
//! the axis flip between KB and MB every tick.

/// Multiplier applied to observed maxima for axis bounds and unit choice.
pub const HEADROOM: f64 = 1.25;

/// Smallest magnitude considered by unit selection.
pub const MIN_MAGNITUDE: f64 = 1.0 / HEADROOM;

/// One rung of a unit ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub name: &'static str,
    /// How many base units (bytes, watts) one of this unit holds.
    pub factor: f64,
}

impl Unit {
    pub const fn new(name: &'static str, factor: f64) -> Self {
        Self { name, factor }
    }

    /// Convert a base-unit value into this unit.
    pub fn scale(&self, value: f64) -> f64 {
        value / self.factor
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Ordered set of units for one quantity kind, smallest first.
#[derive(Debug, Clone, Copy)]
pub struct UnitLadder {
    units: &'static [Unit],
}

/// Binary byte ladder used by memory, disk and network families.
pub const BYTES: UnitLadder = UnitLadder::new(&[
    Unit::new("B", 1.0),
    Unit::new("KB", 1024.0),
    Unit::new("MB", 1024.0 * 1024.0),
    Unit::new("GB", 1024.0 * 1024.0 * 1024.0),
    Unit::new("TB", 1024.0 * 1024.0 * 1024.0 * 1024.0),
]);

/// Power ladder used by the auxiliary power family.
pub const WATTS: UnitLadder = UnitLadder::new(&[Unit::new("W", 1.0), Unit::new("kW", 1000.0)]);

impl UnitLadder {
    /// Build a ladder. `units` must be non-empty and sorted by ascending factor.
    pub const fn new(units: &'static [Unit]) -> Self {
        assert!(!units.is_empty(), "unit ladder needs at least one unit");
        Self { units }
    }

    pub fn units(&self) -> &'static [Unit] {
        self.units
    }

    pub fn smallest(&self) -> Unit {
        self.units[0]
    }

    pub fn largest(&self) -> Unit {
        self.units[self.units.len() - 1]
    }

    pub fn by_name(&self, name: &str) -> Option<Unit> {
        self.units.iter().copied().find(|u| u.name == name)
    }

    /// Largest unit whose threshold is `<=` the magnitude.
    ///
    /// Magnitudes below every threshold pick the smallest unit; NaN and
    /// anything under [`MIN_MAGNITUDE`] are treated as [`MIN_MAGNITUDE`].
    pub fn select(&self, magnitude: f64) -> Unit {
        let m = floor_magnitude(magnitude);
        let idx = self.units.partition_point(|u| u.factor <= m);
        self.units[idx.saturating_sub(1)]
    }

    /// Smallest unit whose threshold strictly exceeds the magnitude, or the
    /// largest unit when none does.
    pub fn select_strict(&self, magnitude: f64) -> Unit {
        let m = floor_magnitude(magnitude);
        let idx = self.units.partition_point(|u| u.factor <= m);
        self.units[idx.min(self.units.len() - 1)]
    }

    /// Unit for a chart whose observed maximum is `observed_max`.
    pub fn select_with_headroom(&self, observed_max: f64) -> Unit {
        self.select(observed_max * HEADROOM)
    }
}

fn floor_magnitude(magnitude: f64) -> f64 {
    if magnitude.is_nan() {
        MIN_MAGNITUDE
    } else {
        magnitude.max(MIN_MAGNITUDE)
    }
}

/// Round for display: `decimals` places up to 10, whole numbers above.
///
/// `clip10(9.96, 1) == "10.0"` while `clip10(10.04, 1) == "10"`.
pub fn clip10(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    if value.abs() > 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.decimals$}")
    }
}

/// `clip10` over an optional sample, rendering a missing value as a dash.
pub fn clip10_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => clip10(v, decimals),
        None => "—".to_string(),
    }
}

/// Format a base-unit quantity with the best-fit unit of `ladder`.
pub fn format_scaled(value: f64, ladder: &UnitLadder) -> String {
    let unit = ladder.select(value.abs());
    format!("{} {unit}", clip10(unit.scale(value), 1))
}
