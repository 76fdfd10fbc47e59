use log::debug;

/// Highest sea state accepted by [`Environment::set_sea_state`].
pub const MAX_SEA_STATE: u8 = 12;

/// Water temperature drop per 100 m of depth (°C).
const LAPSE_PER_100M: f64 = 2.0;

/// Ambient water conditions.
///
/// Deserializing goes through [`Environment::new`]: the sea state is
/// clamped and any serialized sound velocity is recomputed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "EnvironmentParams"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    /// Surface water temperature (°C).
    temperature_c: f64,

    /// Salinity (ppt).
    salinity_ppt: f64,

    /// Reference depth (meters).
    depth_m: f64,

    /// Sea state, 0 (calm) through 12.
    sea_state: u8,

    /// Thermocline depth (meters).
    thermocline_depth_m: f64,

    /// Sound velocity at `depth_m` and `temperature_c` (m/s).
    sound_velocity_mps: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(15.0, 35.0, 50.0, 2, 30.0)
    }
}

/// Serialized form of the independent [`Environment`] inputs.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct EnvironmentParams {
    temperature_c: f64,
    salinity_ppt: f64,
    depth_m: f64,
    sea_state: i64,
    thermocline_depth_m: f64,
}

#[cfg(feature = "serde")]
impl Default for EnvironmentParams {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            temperature_c: env.temperature_c,
            salinity_ppt: env.salinity_ppt,
            depth_m: env.depth_m,
            sea_state: i64::from(env.sea_state),
            thermocline_depth_m: env.thermocline_depth_m,
        }
    }
}

#[cfg(feature = "serde")]
impl From<EnvironmentParams> for Environment {
    fn from(params: EnvironmentParams) -> Self {
        Environment::new(
            params.temperature_c,
            params.salinity_ppt,
            params.depth_m,
            clamp_sea_state(params.sea_state),
            params.thermocline_depth_m,
        )
    }
}

// Clamped first, so the cast cannot truncate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_sea_state(sea_state: i64) -> u8 {
    sea_state.clamp(0, i64::from(MAX_SEA_STATE)) as u8
}

impl Environment {
    pub fn new(
        temperature_c: f64,
        salinity_ppt: f64,
        depth_m: f64,
        sea_state: u8,
        thermocline_depth_m: f64,
    ) -> Self {
        let mut env = Self {
            temperature_c,
            salinity_ppt,
            depth_m,
            sea_state: sea_state.min(MAX_SEA_STATE),
            thermocline_depth_m,
            sound_velocity_mps: 0.0,
        };
        env.refresh_sound_velocity();
        env
    }

    /// Speed of sound in sea water (m/s).
    ///
    /// ```text
    /// c = 1449.2 + 4.6·T − 0.055·T² + 0.00029·T³ + (1.34 − 0.01·T)·(S − 35) + 0.016·D
    /// ```
    pub fn sound_velocity(&self, depth_m: f64, temperature_c: f64) -> f64 {
        let t = temperature_c;
        let s = self.salinity_ppt;
        let d = depth_m;
        1449.2 + 4.6 * t - 0.055 * t.powi(2) + 0.000_29 * t.powi(3)
            + (1.34 - 0.01 * t) * (s - 35.0)
            + 0.016 * d
    }

    /// Water temperature at `depth_m`, extrapolated from the surface
    /// with a fixed lapse rate. Not bounded below.
    pub fn temperature_at_depth(&self, depth_m: f64) -> f64 {
        self.temperature_c - depth_m / 100.0 * LAPSE_PER_100M
    }

    /// Clamps to `[0, MAX_SEA_STATE]`.
    pub fn set_sea_state(&mut self, sea_state: i32) {
        let clamped = clamp_sea_state(i64::from(sea_state));
        if clamped != self.sea_state {
            debug!("sea state {} -> {clamped}", self.sea_state);
        }
        self.sea_state = clamped;
    }

    pub fn set_temperature(&mut self, temperature_c: f64) {
        debug!("water temperature {} -> {temperature_c} °C", self.temperature_c);
        self.temperature_c = temperature_c;
        self.refresh_sound_velocity();
    }

    fn refresh_sound_velocity(&mut self) {
        self.sound_velocity_mps = self.sound_velocity(self.depth_m, self.temperature_c);
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn salinity_ppt(&self) -> f64 {
        self.salinity_ppt
    }

    pub fn depth_m(&self) -> f64 {
        self.depth_m
    }

    pub fn sea_state(&self) -> u8 {
        self.sea_state
    }

    pub fn thermocline_depth_m(&self) -> f64 {
        self.thermocline_depth_m
    }

    /// Sound velocity at the reference depth and surface temperature.
    pub fn current_sound_velocity(&self) -> f64 {
        self.sound_velocity_mps
    }
}
