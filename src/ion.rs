use serde::{Deserialize, Serialize};
use std::fmt;

/// Default stop-following energy (eV).
pub const DEFAULT_EF: f64 = 3.0;

/// Transport state of an ion. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IonState {
    Moving,
    Stopped,
}

/// Projectile species: the key all per-projectile constants are derived for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub z: u32,
    pub m: f64,
}

/// Extra tracking data carried alongside an ion.
///
/// The transport engine never reads the payload; it only asks for the
/// payload of a freshly spawned recoil.
pub trait IonPayload: Clone + Default + fmt::Debug {
    /// Payload given to a recoil knocked on by an ion carrying `self`.
    fn spawn(&self) -> Self {
        self.clone()
    }
}

impl IonPayload for () {}

/// Cascade-generation marker used to flag the first recoil that falls into
/// an energy window of interest (e.g. the range handed to MD).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdTag {
    /// 0: not yet marked; n > 0: n-th generation below the marked ion.
    pub md: u32,
}

impl MdTag {
    /// Mark this ion with 1 if it is still unmarked and `e` lies in `(lo, hi)`.
    pub fn mark_gap(&mut self, e: f64, lo: f64, hi: f64) -> bool {
        if self.md == 0 && e > lo && e < hi {
            self.md = 1;
            return true;
        }
        false
    }
}

impl IonPayload for MdTag {
    fn spawn(&self) -> Self {
        MdTag {
            md: if self.md > 0 { self.md + 1 } else { 0 },
        }
    }
}

/// A transported particle: a primary fragment or a recoil.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ion<P = ()> {
    /// Atomic number.
    pub z1: u32,
    /// Mass (amu). Zero means "use the most abundant isotope" from the stopping table.
    pub m1: f64,
    /// Kinetic energy (eV).
    pub e: f64,
    /// Position (Å).
    pub pos: [f64; 3],
    /// Unit direction.
    pub dir: [f64; 3],
    /// Simulated time (fs).
    pub t: f64,
    /// Generation (0 = primary).
    pub gen: u32,
    /// Stop-following energy (eV).
    pub ef: f64,
    /// Cluster the ion originated in, if any.
    pub tag: Option<usize>,
    pub state: IonState,
    #[serde(flatten)]
    pub payload: P,
}

impl<P: IonPayload> Ion<P> {
    pub fn new(z1: u32, m1: f64, e: f64) -> Self {
        Ion {
            z1,
            m1,
            e,
            pos: [0.0; 3],
            dir: [1.0, 0.0, 0.0],
            t: 0.0,
            gen: 0,
            ef: DEFAULT_EF,
            tag: None,
            state: IonState::Moving,
            payload: P::default(),
        }
    }

    pub fn with_position(mut self, pos: [f64; 3]) -> Self {
        self.pos = pos;
        self
    }

    /// Set the direction, normalising it. Zero vectors are kept as given.
    pub fn with_direction(mut self, dir: [f64; 3]) -> Self {
        self.set_direction(dir);
        self
    }

    pub fn set_direction(&mut self, dir: [f64; 3]) {
        let norm = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
        self.dir = if norm > 0.0 {
            [dir[0] / norm, dir[1] / norm, dir[2] / norm]
        } else {
            dir
        };
    }

    pub fn species(&self) -> Species {
        Species {
            z: self.z1,
            m: self.m1,
        }
    }

    /// Create a recoil knocked on by this ion.
    ///
    /// The recoil sits at this ion's position and time, one generation
    /// deeper. Species, energy and direction are left for the collision
    /// step to fill in.
    pub fn spawn_recoil(&self) -> Ion<P> {
        Ion {
            z1: 0,
            m1: 0.0,
            e: 0.0,
            pos: self.pos,
            dir: self.dir,
            t: self.t,
            gen: self.gen + 1,
            ef: DEFAULT_EF,
            tag: self.tag,
            state: IonState::Moving,
            payload: self.payload.spawn(),
        }
    }
}

impl<P> Ion<P> {
    pub fn is_moving(&self) -> bool {
        self.state == IonState::Moving
    }

    pub fn stop(&mut self) {
        self.state = IonState::Stopped;
    }
}

impl<P: fmt::Debug> Ion<P> {
    fn fmt_base(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag.map(|t| t as i64).unwrap_or(-1);
        write!(
            f,
            "{} {} {} {} {} {} {} {} {}",
            self.pos[0], self.pos[1], self.pos[2], self.z1, self.m1, self.e, self.t, self.gen, tag
        )
    }
}

impl fmt::Display for Ion<()> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_base(f)
    }
}

impl fmt::Display for Ion<MdTag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_base(f)?;
        write!(f, " {}", self.payload.md)
    }
}
