//! Live-tunable scene parameters and the bounds a control surface enforces.

/// Identifies one tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    SunIntensity,
    SpeedFactor,
    BumpScale,
    OceanMetalness,
    FresnelIntensity,
    AtmosphereOpacity,
    AtmospherePower,
    AtmosphereMultiplier,
}

/// Default value, range, and step of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    pub label: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamSpec {
    /// Clamp a value into `[min, max]`. NaN maps to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

/// Every parameter in panel order.
pub const PARAM_SPECS: [ParamSpec; 8] = [
    ParamSpec {
        id: ParamId::SunIntensity,
        label: "sun intensity",
        default: 1.3,
        min: 0.0,
        max: 5.0,
        step: 0.1,
    },
    ParamSpec {
        id: ParamId::SpeedFactor,
        label: "rotation speed",
        default: 2.0,
        min: 0.1,
        max: 20.0,
        step: 0.1,
    },
    ParamSpec {
        id: ParamId::BumpScale,
        label: "bump scale",
        default: 0.03,
        min: 0.0,
        max: 1.0,
        step: 0.01,
    },
    ParamSpec {
        id: ParamId::OceanMetalness,
        label: "ocean metalness",
        default: 0.1,
        min: 0.0,
        max: 1.0,
        step: 0.05,
    },
    ParamSpec {
        id: ParamId::FresnelIntensity,
        label: "fresnel intensity",
        default: 1.4,
        min: 0.0,
        max: 2.0,
        step: 0.05,
    },
    ParamSpec {
        id: ParamId::AtmosphereOpacity,
        label: "atmosphere opacity",
        default: 0.7,
        min: 0.0,
        max: 1.0,
        step: 0.05,
    },
    ParamSpec {
        id: ParamId::AtmospherePower,
        label: "atmosphere power",
        default: 4.1,
        min: 0.0,
        max: 20.0,
        step: 0.1,
    },
    ParamSpec {
        id: ParamId::AtmosphereMultiplier,
        label: "atmosphere multiplier",
        default: 9.5,
        min: 0.0,
        max: 20.0,
        step: 0.1,
    },
];

impl ParamId {
    pub const ALL: [ParamId; 8] = [
        ParamId::SunIntensity,
        ParamId::SpeedFactor,
        ParamId::BumpScale,
        ParamId::OceanMetalness,
        ParamId::FresnelIntensity,
        ParamId::AtmosphereOpacity,
        ParamId::AtmospherePower,
        ParamId::AtmosphereMultiplier,
    ];

    pub fn spec(self) -> &'static ParamSpec {
        &PARAM_SPECS[self as usize]
    }
}

/// The mutable record of tunable values.
///
/// Owned by the harness and lent to whoever needs it: the panel writes,
/// the parameter bridge and frame updater read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParameters {
    pub sun_intensity: f32,
    pub speed_factor: f32,
    pub bump_scale: f32,
    pub ocean_metalness: f32,
    pub fresnel_intensity: f32,
    pub atmosphere_opacity: f32,
    pub atmosphere_power: f32,
    pub atmosphere_multiplier: f32,
}

impl Default for SceneParameters {
    fn default() -> Self {
        let d = |id: ParamId| id.spec().default;
        Self {
            sun_intensity: d(ParamId::SunIntensity),
            speed_factor: d(ParamId::SpeedFactor),
            bump_scale: d(ParamId::BumpScale),
            ocean_metalness: d(ParamId::OceanMetalness),
            fresnel_intensity: d(ParamId::FresnelIntensity),
            atmosphere_opacity: d(ParamId::AtmosphereOpacity),
            atmosphere_power: d(ParamId::AtmospherePower),
            atmosphere_multiplier: d(ParamId::AtmosphereMultiplier),
        }
    }
}

impl SceneParameters {
    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::SunIntensity => self.sun_intensity,
            ParamId::SpeedFactor => self.speed_factor,
            ParamId::BumpScale => self.bump_scale,
            ParamId::OceanMetalness => self.ocean_metalness,
            ParamId::FresnelIntensity => self.fresnel_intensity,
            ParamId::AtmosphereOpacity => self.atmosphere_opacity,
            ParamId::AtmospherePower => self.atmosphere_power,
            ParamId::AtmosphereMultiplier => self.atmosphere_multiplier,
        }
    }

    /// Store a value as given. Range enforcement belongs to the control surface.
    pub fn set(&mut self, id: ParamId, value: f32) {
        let slot = match id {
            ParamId::SunIntensity => &mut self.sun_intensity,
            ParamId::SpeedFactor => &mut self.speed_factor,
            ParamId::BumpScale => &mut self.bump_scale,
            ParamId::OceanMetalness => &mut self.ocean_metalness,
            ParamId::FresnelIntensity => &mut self.fresnel_intensity,
            ParamId::AtmosphereOpacity => &mut self.atmosphere_opacity,
            ParamId::AtmospherePower => &mut self.atmosphere_power,
            ParamId::AtmosphereMultiplier => &mut self.atmosphere_multiplier,
        };
        *slot = value;
    }
}
