// Orientation module - device pose model and orientation-diversity analysis
//
// Angles follow the device-orientation convention: alpha is the compass
// heading (0–360°, about Z), beta the pitch (−180–180°, about X) and gamma
// the roll (−90–90°, about Y), composed intrinsically as Z·X·Y. All angle
// math runs in f64 degrees at the API and radians internally.
//
// The octant of a pose is read from the device's local +Y axis rotated into
// the world frame: the sign of its Y component picks the hemisphere, and the
// larger of |X| (east/west) and |Z| (north/south) picks the quadrant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

use crate::config::DiversityConfig;

/// Number of orientation buckets
pub const NUM_OCTANTS: usize = 8;

/// One sensor reading; any angle may be unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceOrientation {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub timestamp_ms: u64,
    /// Heading is relative to magnetic north rather than an arbitrary frame
    pub absolute: bool,
}

impl DeviceOrientation {
    pub fn new(alpha: f64, beta: f64, gamma: f64, timestamp_ms: u64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
            timestamp_ms,
            absolute: false,
        }
    }

    /// Reading with no sensor data
    pub fn unavailable(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }

    /// True when all three angles are present
    pub fn is_valid(&self) -> bool {
        self.euler().is_some()
    }

    pub fn euler(&self) -> Option<EulerAngles> {
        Some(EulerAngles {
            alpha: self.alpha?,
            beta: self.beta?,
            gamma: self.gamma?,
        })
    }

    pub fn to_quaternion(&self) -> Option<Quaternion> {
        self.euler()
            .map(|e| euler_to_quaternion(e.alpha, e.beta, e.gamma))
    }

    /// World-frame direction of the device's local +Y axis
    pub fn up_vector(&self) -> Option<Vector3> {
        self.to_quaternion()
            .map(|q| rotate_vector_by_quaternion(Vector3::new(0.0, 1.0, 0.0), q))
    }

    pub fn octant(&self) -> Option<Octant> {
        self.up_vector().map(classify_octant)
    }
}

/// Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Unit quaternion [w, x, y, z]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Hamilton product
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

/// Quaternion of the intrinsic Z·X·Y rotation (alpha, beta, gamma in degrees)
///
/// Closed form of `q_z(alpha) · q_x(beta) · q_y(gamma)`.
pub fn euler_to_quaternion(alpha: f64, beta: f64, gamma: f64) -> Quaternion {
    let (s1, c1) = (alpha.to_radians() / 2.0).sin_cos();
    let (s2, c2) = (beta.to_radians() / 2.0).sin_cos();
    let (s3, c3) = (gamma.to_radians() / 2.0).sin_cos();

    Quaternion::new(
        c1 * c2 * c3 - s1 * s2 * s3,
        c1 * s2 * c3 - s1 * c2 * s3,
        c1 * c2 * s3 + s1 * s2 * c3,
        s1 * c2 * c3 + c1 * s2 * s3,
    )
}

/// Recover Z·X·Y Euler angles in degrees
///
/// alpha is normalized to [0, 360). At the gimbal-lock boundary (|beta| = 90°)
/// roll is folded into the heading and gamma is reported as 0.
pub fn quaternion_to_euler(q: Quaternion) -> EulerAngles {
    let Quaternion { w, x, y, z } = q;
    let sin_beta = (2.0 * (w * x + y * z)).clamp(-1.0, 1.0);

    let (alpha, beta, gamma) = if sin_beta.abs() > 1.0 - 1e-9 {
        let alpha = (2.0 * (x * y + w * z)).atan2(1.0 - 2.0 * (y * y + z * z));
        (alpha, 90f64.to_radians().copysign(sin_beta), 0.0)
    } else {
        (
            (2.0 * (w * z - x * y)).atan2(1.0 - 2.0 * (x * x + z * z)),
            sin_beta.asin(),
            (2.0 * (w * y - x * z)).atan2(1.0 - 2.0 * (x * x + y * y)),
        )
    };

    EulerAngles {
        alpha: alpha.to_degrees().rem_euclid(360.0),
        beta: beta.to_degrees(),
        gamma: gamma.to_degrees(),
    }
}

/// Rotate `v` by unit quaternion `q`: v + 2w(q×v) + 2(q×(q×v))
pub fn rotate_vector_by_quaternion(v: Vector3, q: Quaternion) -> Vector3 {
    let u = q.vector();
    let t = u.cross(&v);
    let tt = u.cross(&t);
    Vector3::new(
        v.x + 2.0 * q.w * t.x + 2.0 * tt.x,
        v.y + 2.0 * q.w * t.y + 2.0 * tt.y,
        v.z + 2.0 * q.w * t.z + 2.0 * tt.z,
    )
}

/// Orientation bucket: hemisphere × compass quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Octant {
    UpperNorth,
    UpperEast,
    UpperSouth,
    UpperWest,
    LowerNorth,
    LowerEast,
    LowerSouth,
    LowerWest,
}

impl Octant {
    pub const ALL: [Octant; NUM_OCTANTS] = [
        Octant::UpperNorth,
        Octant::UpperEast,
        Octant::UpperSouth,
        Octant::UpperWest,
        Octant::LowerNorth,
        Octant::LowerEast,
        Octant::LowerSouth,
        Octant::LowerWest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Octant::UpperNorth => "Upper-North",
            Octant::UpperEast => "Upper-East",
            Octant::UpperSouth => "Upper-South",
            Octant::UpperWest => "Upper-West",
            Octant::LowerNorth => "Lower-North",
            Octant::LowerEast => "Lower-East",
            Octant::LowerSouth => "Lower-South",
            Octant::LowerWest => "Lower-West",
        }
    }
}

impl fmt::Display for Octant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a world-frame up vector
///
/// Y ≥ 0 is the upper hemisphere. The quadrant follows whichever of |X| and
/// |Z| is larger (ties go to Z): +X east, −X west, +Z north, −Z south.
pub fn classify_octant(up: Vector3) -> Octant {
    let upper = up.y >= 0.0;
    match (upper, up.x.abs() > up.z.abs(), up.x > 0.0, up.z > 0.0) {
        (true, true, true, _) => Octant::UpperEast,
        (true, true, false, _) => Octant::UpperWest,
        (true, false, _, true) => Octant::UpperNorth,
        (true, false, _, false) => Octant::UpperSouth,
        (false, true, true, _) => Octant::LowerEast,
        (false, true, false, _) => Octant::LowerWest,
        (false, false, _, true) => Octant::LowerNorth,
        (false, false, _, false) => Octant::LowerSouth,
    }
}

/// How well a set of captures covers the space of device orientations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationStats {
    /// Samples per octant, indexed by `Octant::index`
    pub octant_counts: [usize; NUM_OCTANTS],
    pub total_samples: usize,
    /// Samples with all three angles present
    pub valid_samples: usize,
    pub octants_covered: usize,
    /// `octants_covered / 8`
    pub octant_coverage: f32,
    /// Normalized entropy of the octant distribution (0 = one octant, 1 = uniform)
    pub diversity_score: f32,
    pub dominant_octant: Option<Octant>,
    /// Share of valid samples in the dominant octant
    pub dominant_share: f32,
    pub warnings: Vec<String>,
}

impl OrientationStats {
    /// Whether the set is diverse enough to train on
    pub fn is_sufficient(&self, config: &DiversityConfig) -> bool {
        self.valid_samples >= config.min_samples
            && self.octant_coverage >= config.min_coverage
            && self.diversity_score >= config.min_diversity
            && self.dominant_share <= config.max_dominant_share
    }
}

/// Bucket valid orientations into octants and score their diversity
///
/// Readings with any missing angle are counted in `total_samples` only.
pub fn analyze_orientation_diversity(
    orientations: &[DeviceOrientation],
    config: &DiversityConfig,
) -> OrientationStats {
    let mut octant_counts = [0usize; NUM_OCTANTS];
    for octant in orientations.iter().filter_map(DeviceOrientation::octant) {
        octant_counts[octant.index()] += 1;
    }
    let valid_samples: usize = octant_counts.iter().sum();
    let octants_covered = octant_counts.iter().filter(|&&c| c > 0).count();
    let octant_coverage = octants_covered as f32 / NUM_OCTANTS as f32;

    let diversity_score = if valid_samples == 0 {
        0.0
    } else {
        let entropy: f64 = octant_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / valid_samples as f64;
                -p * p.log2()
            })
            .sum();
        (entropy / (NUM_OCTANTS as f64).log2()).clamp(0.0, 1.0) as f32
    };

    let dominant = octant_counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(i, count)| (**count, std::cmp::Reverse(*i)))
        .map(|(i, count)| (Octant::ALL[i], *count));
    let dominant_share = match dominant {
        Some((_, count)) => count as f32 / valid_samples as f32,
        None => 0.0,
    };

    let mut warnings = Vec::new();
    if valid_samples == 0 {
        warnings.push("No orientation data available".to_string());
    } else {
        if valid_samples < config.min_samples {
            warnings.push(format!(
                "Only {} orientation samples; at least {} recommended",
                valid_samples, config.min_samples
            ));
        }
        if octant_coverage < config.min_coverage {
            warnings.push(format!(
                "Low octant coverage: {}/{} octants sampled",
                octants_covered, NUM_OCTANTS
            ));
        }
        if diversity_score < config.min_diversity {
            warnings.push(format!(
                "Low orientation diversity (score {:.2})",
                diversity_score
            ));
        }
        if let Some((octant, _)) = dominant {
            if dominant_share > config.max_dominant_share {
                warnings.push(format!(
                    "{} holds {:.0}% of samples",
                    octant,
                    dominant_share * 100.0
                ));
            }
        }
    }

    OrientationStats {
        octant_counts,
        total_samples: orientations.len(),
        valid_samples,
        octants_covered,
        octant_coverage,
        diversity_score,
        dominant_octant: dominant.map(|(octant, _)| octant),
        dominant_share,
        warnings,
    }
}
