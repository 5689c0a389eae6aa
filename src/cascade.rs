// Fission event driver.
//
// A fission event emits two fragments back to back from a random point of
// the sample. Both fragments and every recoil of their cascades are
// transported in FIFO order while an observer watches each ion.

use crate::bank::RecoilQueue;
use crate::error::Result;
use crate::inverter::{EnergyInverter, Inverter, MassInverter};
use crate::ion::{Ion, IonPayload, MdTag};
use crate::ledger::EnergyLedger;
use crate::sample::{ClusterSample, Sample};
use crate::transport::{Outcome, TransportObserver, Trim};
use log::{info, warn};
use rand::Rng;
use std::io::Write;

/// Relative energy imbalance above which an event is reported.
pub const BALANCE_TOLERANCE: f64 = 1e-3;

/// Recoil energy window (eV) whose first entrant is marked for MD.
pub const MD_GAP: (f64, f64) = (200.0, 12000.0);

/// One fission fragment before it is turned into an ion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Mass number.
    pub a: f64,
    pub z: u32,
    /// Kinetic energy (eV).
    pub e: f64,
}

/// Samples fission fragment pairs of a fissioning nucleus.
#[derive(Debug, Clone)]
pub struct FissionSource {
    pub total_mass: f64,
    pub total_charge: u32,
    mass: MassInverter,
    energy: EnergyInverter,
}

impl Default for FissionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FissionSource {
    /// U-235 fission.
    pub fn new() -> Self {
        FissionSource {
            total_mass: MassInverter::TOTAL_MASS,
            total_charge: 92,
            mass: MassInverter::new(),
            energy: EnergyInverter::new(),
        }
    }

    /// Sample masses, charges and kinetic energies of a fragment pair.
    ///
    /// The total kinetic energy is split so that momentum is conserved and
    /// the charge is divided in proportion to mass.
    pub fn sample_fragments<R: Rng>(&mut self, rng: &mut R) -> Result<[Fragment; 2]> {
        let a1 = self.mass.sample(rng.gen::<f64>())?;
        let a2 = self.total_mass - a1;
        self.energy.set_fragment_mass(a1)?;
        let etot = self.energy.sample(rng.gen::<f64>())?;

        let e1 = etot * a2 / (a1 + a2);
        let e2 = etot - e1;
        let z1 = ((a1 * self.total_charge as f64) / self.total_mass).round() as u32;
        let z2 = self.total_charge.saturating_sub(z1);

        Ok([
            Fragment {
                a: a1,
                z: z1,
                e: e1 * 1.0e6,
            },
            Fragment {
                a: a2,
                z: z2,
                e: e2 * 1.0e6,
            },
        ])
    }

    /// Sample a fragment pair leaving `origin` in opposite directions.
    pub fn sample_pair<P: IonPayload, R: Rng>(
        &mut self,
        origin: [f64; 3],
        ef: f64,
        rng: &mut R,
    ) -> Result<[Ion<P>; 2]> {
        let [f1, f2] = self.sample_fragments(rng)?;
        let dir = isotropic_direction(rng);

        let mut first: Ion<P> = Ion::new(f1.z, f1.a, f1.e)
            .with_position(origin)
            .with_direction(dir);
        first.ef = ef;
        let mut second: Ion<P> = Ion::new(f2.z, f2.a, f2.e)
            .with_position(origin)
            .with_direction([-dir[0], -dir[1], -dir[2]]);
        second.ef = ef;
        Ok([first, second])
    }
}

/// Uniformly distributed unit vector (rejection sampling in the unit ball).
pub fn isotropic_direction<R: Rng>(rng: &mut R) -> [f64; 3] {
    loop {
        let d = [
            rng.gen::<f64>() - 0.5,
            rng.gen::<f64>() - 0.5,
            rng.gen::<f64>() - 0.5,
        ];
        let norm = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
        if norm > 1.0e-4 && norm <= 0.25 {
            let n = norm.sqrt();
            return [d[0] / n, d[1] / n, d[2] / n];
        }
    }
}

/// Uniform point inside a box of the given widths.
pub fn random_origin<R: Rng>(width: [f64; 3], rng: &mut R) -> [f64; 3] {
    [
        rng.gen::<f64>() * width[0],
        rng.gen::<f64>() * width[1],
        rng.gen::<f64>() * width[2],
    ]
}

/// Per-ion hooks of the event loop, on top of the per-collision hooks.
pub trait CascadeObserver<P>: TransportObserver<P> {
    /// Called before an ion is transported; may update its payload.
    fn before(&mut self, _ion: &mut Ion<P>) -> Result<()> {
        Ok(())
    }

    /// Called once the ion has stopped or escaped.
    fn after(&mut self, _ion: &Ion<P>, _outcome: Outcome) -> Result<()> {
        Ok(())
    }
}

impl<P> CascadeObserver<P> for () {}

/// Bookkeeping of one finished event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    /// Kinetic energy of the primaries (eV).
    pub initial_energy: f64,
    pub ledger: EnergyLedger,
    /// Ions transported, primaries included.
    pub ions: usize,
    /// Ions that left the sample.
    pub escaped_ions: usize,
    /// Deepest recoil generation reached.
    pub max_generation: u32,
}

impl EventSummary {
    pub fn balance(&self) -> f64 {
        self.ledger.balance(self.initial_energy)
    }

    pub fn relative_balance(&self) -> f64 {
        self.ledger.relative_balance(self.initial_energy)
    }
}

/// Transport `primaries` and their full cascade.
pub fn run_event<S, P, R, O>(
    trim: &Trim<S>,
    primaries: Vec<Ion<P>>,
    rng: &mut R,
    observer: &mut O,
) -> Result<EventSummary>
where
    S: Sample,
    P: IonPayload,
    R: Rng,
    O: CascadeObserver<P>,
{
    let initial_energy: f64 = primaries.iter().map(|ion| ion.e).sum();
    let mut queue = RecoilQueue::with_capacity(1024);
    for ion in primaries {
        queue.add_source_ion(ion);
    }

    let mut ledger = EnergyLedger::new();
    let mut ions = 0;
    let mut escaped_ions = 0;
    let mut max_generation = 0;

    while let Some(mut ion) = queue.pop_ion() {
        observer.before(&mut ion)?;
        let outcome = trim.transport_with(&mut ion, &mut queue, &mut ledger, rng, observer)?;
        observer.after(&ion, outcome)?;

        ions += 1;
        if outcome == Outcome::Escaped {
            escaped_ions += 1;
        }
        max_generation = max_generation.max(ion.gen);
    }

    let summary = EventSummary {
        initial_energy,
        ledger,
        ions,
        escaped_ions,
        max_generation,
    };
    info!(
        "event: {} ions, electronic {:.6e} eV, nuclear {:.6e} eV, escaped {:.6e} eV, balance {:.3e} eV",
        summary.ions,
        summary.ledger.electronic,
        summary.ledger.nuclear,
        summary.ledger.escaped,
        summary.balance()
    );
    if summary.relative_balance().abs() > BALANCE_TOLERANCE {
        warn!(
            "energy imbalance of {:.3e} eV ({:.3e} relative) in event",
            summary.balance(),
            summary.relative_balance()
        );
    }
    Ok(summary)
}

/// Sample one fission event at a random point of the sample and run it.
pub fn run_fission_event<S, P, R, O>(
    trim: &Trim<S>,
    source: &mut FissionSource,
    rng: &mut R,
    observer: &mut O,
) -> Result<EventSummary>
where
    S: Sample,
    P: IonPayload,
    R: Rng,
    O: CascadeObserver<P>,
{
    let origin = random_origin(trim.sample().width(), rng);
    let pair: [Ion<P>; 2] = source.sample_pair(origin, trim.settings().ef, rng)?;
    info!(
        "fission: A1={:.3} Z1={} ({:.3} MeV), A2={:.3} Z2={} ({:.3} MeV)",
        pair[0].m1,
        pair[0].z1,
        pair[0].e * 1.0e-6,
        pair[1].m1,
        pair[1].z1,
        pair[1].e * 1.0e-6
    );
    run_event(trim, Vec::from(pair), rng, observer)
}

/// Records gas-atom recoils of a bubble sample.
///
/// For every ion of the gas species it writes the recoil energy line
/// (`e gen md`) before transport and, for ions born inside a bubble, the
/// distance from the bubble centre to the final position
/// (`dist md x y z`). Sub-threshold deposits go to the optional phonon
/// stream as `e x y z t`.
pub struct RecoilLog<'a, W: Write> {
    sample: &'a ClusterSample,
    gas_z: u32,
    erec: W,
    dist: W,
    phonons: Option<W>,
    io_error: Option<std::io::Error>,
}

impl<'a, W: Write> RecoilLog<'a, W> {
    pub fn new(sample: &'a ClusterSample, gas_z: u32, erec: W, dist: W) -> Self {
        RecoilLog {
            sample,
            gas_z,
            erec,
            dist,
            phonons: None,
            io_error: None,
        }
    }

    pub fn with_phonons(mut self, phonons: W) -> Self {
        self.phonons = Some(phonons);
        self
    }

    fn take_io_error(&mut self) -> Result<()> {
        match self.io_error.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.take_io_error()?;
        self.erec.flush()?;
        self.dist.flush()?;
        if let Some(phonons) = self.phonons.as_mut() {
            phonons.flush()?;
        }
        Ok(())
    }

    pub fn into_writers(self) -> (W, W, Option<W>) {
        (self.erec, self.dist, self.phonons)
    }
}

impl<'a, W: Write> TransportObserver<MdTag> for RecoilLog<'a, W> {
    fn phonon(&mut self, ion: &Ion<MdTag>, energy: f64) {
        if self.io_error.is_some() || energy <= 0.0 {
            return;
        }
        if let Some(phonons) = self.phonons.as_mut() {
            if let Err(e) = writeln!(
                phonons,
                "{} {} {} {} {}",
                energy, ion.pos[0], ion.pos[1], ion.pos[2], ion.t
            ) {
                self.io_error = Some(e);
            }
        }
    }
}

impl<'a, W: Write> CascadeObserver<MdTag> for RecoilLog<'a, W> {
    fn before(&mut self, ion: &mut Ion<MdTag>) -> Result<()> {
        self.take_io_error()?;
        if ion.z1 != self.gas_z {
            return Ok(());
        }
        ion.payload.mark_gap(ion.e, MD_GAP.0, MD_GAP.1);
        if ion.gen > 0 {
            writeln!(self.erec, "{}\t{}\t{}", ion.e, ion.gen, ion.payload.md)?;
        }
        Ok(())
    }

    fn after(&mut self, ion: &Ion<MdTag>, _outcome: Outcome) -> Result<()> {
        self.take_io_error()?;
        if ion.z1 != self.gas_z {
            return Ok(());
        }
        let cluster = match ion.tag.and_then(|tag| self.sample.clusters().get(tag)) {
            Some(cluster) => cluster,
            None => return Ok(()),
        };
        let d = self.sample.min_image([
            cluster.center[0] - ion.pos[0],
            cluster.center[1] - ion.pos[1],
            cluster.center[2] - ion.pos[2],
        ]);
        let distance = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        writeln!(
            self.dist,
            "{} {} {} {} {}",
            distance, ion.payload.md, ion.pos[0], ion.pos[1], ion.pos[2]
        )?;
        Ok(())
    }
}
