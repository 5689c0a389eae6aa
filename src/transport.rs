// Binary-collision transport of a single ion through a sample.
//
// Each step is a free flight with continuous electronic loss followed by one
// elastic collision with a lattice atom. Collisions that transfer more than
// the partner's displacement energy queue a recoil.

use crate::bank::RecoilQueue;
use crate::error::{Error, Result};
use crate::ion::{Ion, IonPayload};
use crate::ledger::EnergyLedger;
use crate::material::DerivedConstants;
use crate::sample::Sample;
use crate::scatter::{magic, rotate_direction_3d};
use crate::settings::TransportSettings;
use crate::stopping::StoppingTable;
use log::debug;
use nalgebra::Vector3;
use rand::Rng;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

/// sqrt(eV/amu) expressed in Å/fs.
const VELOCITY_UNIT: f64 = 0.098_226_9;

/// How a transport call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Energy fell below the ion's cutoff inside the sample.
    Stopped,
    /// The ion left the sample across a cut boundary or into vacuum.
    Escaped,
}

/// One elastic collision as seen by a [`TransportObserver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Atomic number of the struck atom.
    pub z2: u32,
    /// Impact parameter (Å).
    pub p: f64,
    /// sin²(θ/2) of the CM deflection.
    pub s2: f64,
    /// Energy transferred to the struck atom (eV).
    pub transferred: f64,
    /// Share of the transfer lost to electronic excitation (eV).
    pub electronic: f64,
    /// Share of the transfer left as atomic motion (eV).
    pub damage: f64,
    /// Collision point (Å).
    pub pos: [f64; 3],
}

/// Hooks into the collision loop. All methods default to doing nothing.
pub trait TransportObserver<P> {
    fn collision(&mut self, _ion: &Ion<P>, _collision: &Collision) {}

    /// A recoil has been queued.
    fn recoil(&mut self, _parent: &Ion<P>, _recoil: &Ion<P>) {}

    /// Energy deposited as atomic motion at the ion's position without
    /// creating a recoil.
    fn phonon(&mut self, _ion: &Ion<P>, _energy: f64) {}
}

impl<P> TransportObserver<P> for () {}

/// BCA transport engine bound to a sample and a stopping table.
pub struct Trim<S> {
    sample: S,
    table: Arc<StoppingTable>,
    settings: TransportSettings,
}

impl<S: Sample> Trim<S> {
    pub fn new(sample: S, table: Arc<StoppingTable>, settings: TransportSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Trim {
            sample,
            table,
            settings,
        })
    }

    pub fn sample(&self) -> &S {
        &self.sample
    }

    pub fn sample_mut(&mut self) -> &mut S {
        &mut self.sample
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn table(&self) -> &Arc<StoppingTable> {
        &self.table
    }

    fn escape<P>(&self, ion: &mut Ion<P>, ledger: &mut EnergyLedger, collisions: u64) -> Outcome {
        ledger.add_escaped(ion.e);
        ion.stop();
        debug!(
            "ion z1={} gen={} escaped with {} eV after {} collisions",
            ion.z1, ion.gen, ion.e, collisions
        );
        Outcome::Escaped
    }

    /// Follow `ion` until it stops or escapes, queueing recoils and booking
    /// every energy loss in `ledger`.
    pub fn transport<P: IonPayload, R: Rng>(
        &self,
        ion: &mut Ion<P>,
        recoils: &mut RecoilQueue<P>,
        ledger: &mut EnergyLedger,
        rng: &mut R,
    ) -> Result<Outcome> {
        self.transport_with(ion, recoils, ledger, rng, &mut ())
    }

    /// [`Trim::transport`] reporting collision events to `observer`.
    pub fn transport_with<P: IonPayload, R: Rng, O: TransportObserver<P>>(
        &self,
        ion: &mut Ion<P>,
        recoils: &mut RecoilQueue<P>,
        ledger: &mut EnergyLedger,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<Outcome> {
        if !ion.is_moving() {
            return Ok(Outcome::Stopped);
        }
        if !ion.e.is_finite() || ion.e < 0.0 {
            return Err(Error::InvalidParam(format!(
                "ion energy must be finite and >= 0, got {}",
                ion.e
            )));
        }

        if ion.m1 == 0.0 {
            ion.m1 = self.table.get(ion.z1)?.mm1;
        }

        let species = ion.species();
        let mut constants: HashMap<usize, DerivedConstants> = HashMap::new();
        let mut first_flight = true;
        let mut collisions: u64 = 0;

        loop {
            if ion.e <= ion.ef {
                ledger.add_nuclear(ion.e);
                observer.phonon(ion, ion.e);
                ion.stop();
                debug!(
                    "ion z1={} gen={} stopped after {} collisions",
                    ion.z1, ion.gen, collisions
                );
                return Ok(Outcome::Stopped);
            }

            let folded = self.sample.fold(ion.pos);
            let hit = match folded.and_then(|pos| self.sample.lookup_material(&pos)) {
                Some(hit) => hit,
                None => return Ok(self.escape(ion, ledger, collisions)),
            };
            if let Some(pos) = folded {
                ion.pos = pos;
            }
            let material = hit.material;

            let c = match constants.entry(hit.index) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    entry.insert(material.derive_constants(species, self.settings.tmin)?)
                }
            };

            // free flight length from the maximum impact parameter
            let eps = ion.e * c.f;
            let eeg = (eps * c.epsdg).sqrt();
            let pmax = c.a / (eeg + eeg.sqrt() + 0.125 * eeg.powf(0.1));
            let mut ls = 1.0 / (PI * pmax * pmax * c.arho);
            if first_flight && self.settings.randomize_first_flight {
                ls *= rng.gen::<f64>();
            }
            first_flight = false;

            // electronic energy loss along the flight
            let se = material.getrstop(&self.table, c, ion)?;
            let dee = (ls * se).min(ion.e);
            ion.t += ls / (VELOCITY_UNIT * (2.0 * ion.e / ion.m1).sqrt());
            ion.e -= dee;
            ledger.add_electronic(dee);
            for i in 0..3 {
                ion.pos[i] += ls * ion.dir[i];
            }
            match self.sample.fold(ion.pos) {
                Some(pos) => ion.pos = pos,
                None => return Ok(self.escape(ion, ledger, collisions)),
            }

            // elastic collision with a randomly chosen partner
            let p = pmax * rng.gen::<f64>().sqrt();
            let j = material.select_element(rng.gen::<f64>());
            let element = &material.elements[j];
            let ec = &c.elements[j];
            let deflection = magic(ec.fi * ion.e, p / ec.ai);

            let den = (ec.ec * deflection.s2 * ion.e).min(ion.e);
            ion.e -= den;

            let damage = if self.settings.robinson_partition {
                c.damage_energy(den)
            } else {
                den
            };
            let electronic = den - damage;
            ledger.add_electronic(electronic);

            observer.collision(
                ion,
                &Collision {
                    z2: element.z,
                    p,
                    s2: deflection.s2,
                    transferred: den,
                    electronic,
                    damage,
                    pos: ion.pos,
                },
            );

            let incident = Vector3::new(ion.dir[0], ion.dir[1], ion.dir[2]);
            let phi = 2.0 * PI * rng.gen::<f64>();

            if damage > element.edisp.max(element.elbind) {
                let mut recoil = ion.spawn_recoil();
                recoil.z1 = element.z;
                recoil.m1 = element.m;
                recoil.e = damage - element.elbind;
                recoil.ef = self.settings.ef;
                recoil.tag = hit.tag;
                let rdir = rotate_direction_3d(&incident, deflection.recoil_lab_cosine(), phi + PI);
                recoil.dir = [rdir.x, rdir.y, rdir.z];
                ledger.add_nuclear(element.elbind);
                observer.recoil(ion, &recoil);
                recoils.bank_recoil(recoil);
            } else {
                ledger.add_nuclear(damage);
                observer.phonon(ion, damage);
            }

            let ndir = rotate_direction_3d(
                &incident,
                deflection.projectile_lab_cosine(ec.my),
                phi,
            );
            ion.dir = [ndir.x, ndir.y, ndir.z];

            collisions += 1;
            if collisions >= self.settings.max_collisions {
                return Err(Error::StepLimit { collisions });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::ion::MdTag;
    use crate::material::Material;
    use crate::sample::{BoundaryCondition, HomogeneousSample};
    use crate::stopping::ElementCoefficients;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> Arc<StoppingTable> {
        let records = (1..=92)
            .map(|z| {
                let fz = z as f64;
                ElementCoefficients {
                    z,
                    symbol: None,
                    mm1: 2.0 * fz + 1.0,
                    lfctr: 1.2,
                    vfermi: 1.0,
                    atrho: 5.0,
                    pcoef: [
                        1.5 + 0.02 * fz,
                        0.45,
                        2.0 + 0.05 * fz,
                        0.4,
                        1000.0 + 60.0 * fz,
                        0.75,
                        200.0 + 10.0 * fz,
                        0.01,
                    ],
                }
            })
            .collect();
        Arc::new(StoppingTable::from_records(records).unwrap())
    }

    fn uo2() -> Material {
        let mut m = Material::new(10.0);
        m.add_element(Element::new(92, 235.0, 1.0).unwrap());
        m.add_element(Element::new(8, 16.0, 2.0).unwrap());
        m
    }

    fn trim(width: f64) -> Trim<HomogeneousSample> {
        let sample = HomogeneousSample::new([width; 3], uo2()).unwrap();
        Trim::new(sample, table(), TransportSettings::default()).unwrap()
    }

    #[derive(Default)]
    struct Counter {
        collisions: usize,
        recoils: usize,
        phonon: f64,
        transferred: f64,
    }

    impl<P> TransportObserver<P> for Counter {
        fn collision(&mut self, _ion: &Ion<P>, c: &Collision) {
            self.collisions += 1;
            self.transferred += c.transferred;
            assert!((c.electronic + c.damage - c.transferred).abs() < 1e-9 * (1.0 + c.transferred));
        }
        fn recoil(&mut self, parent: &Ion<P>, recoil: &Ion<P>) {
            self.recoils += 1;
            assert_eq!(recoil.gen, parent.gen + 1);
        }
        fn phonon(&mut self, _ion: &Ion<P>, e: f64) {
            self.phonon += e;
        }
    }

    #[test]
    fn test_low_energy_ion_stops_immediately() {
        let trim = trim(100.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut ion: Ion = Ion::new(8, 16.0, 2.0).with_position([50.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let outcome = trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Stopped);
        assert!(!ion.is_moving());
        assert_eq!(ledger.nuclear, 2.0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stopped_ion_is_not_transported_again() {
        let trim = trim(100.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut ion: Ion = Ion::new(54, 132.0, 1e5).with_position([50.0; 3]);
        ion.stop();
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let outcome = trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Stopped);
        assert_eq!(ledger.total(), 0.0);
        assert_eq!(ion.e, 1e5);
    }

    #[test]
    fn test_energy_is_conserved_for_one_ion() {
        let trim = trim(400.0);
        let mut rng = StdRng::seed_from_u64(42);
        let e0 = 2.0e5;
        let mut ion: Ion = Ion::new(54, 132.0, e0).with_position([200.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let mut counter = Counter::default();
        trim.transport_with(&mut ion, &mut queue, &mut ledger, &mut rng, &mut counter)
            .unwrap();

        assert!(counter.collisions > 0);
        assert_eq!(counter.recoils, queue.len());
        let queued: f64 = queue.iter().map(|r| r.e).sum();
        let balance = e0 - ledger.total() - queued;
        assert!(balance.abs() < 1e-6 * e0, "unaccounted energy {}", balance);
        assert!(ion.e <= ion.ef);
        assert!(ion.t > 0.0);
    }

    #[test]
    fn test_recoils_carry_partner_species_and_tag() {
        let trim = trim(400.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut ion: Ion<MdTag> = Ion::new(54, 132.0, 1.0e6).with_position([200.0; 3]);
        ion.payload.md = 1;
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();
        assert!(!queue.is_empty());
        for recoil in queue.iter() {
            assert!(recoil.z1 == 92 || recoil.z1 == 8);
            assert!(recoil.m1 == 235.0 || recoil.m1 == 16.0);
            assert_eq!(recoil.gen, 1);
            assert_eq!(recoil.payload.md, 2);
            assert_eq!(recoil.tag, None);
            assert!(recoil.e > 0.0);
            let norm: f64 = recoil.dir.iter().map(|d| d * d).sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cut_boundary_books_escaped_energy() {
        let sample = HomogeneousSample::new([20.0, 1000.0, 1000.0], uo2())
            .unwrap()
            .with_boundary(0, BoundaryCondition::Cut);
        let trim = Trim::new(sample, table(), TransportSettings::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut ion: Ion = Ion::new(54, 132.0, 5.0e7)
            .with_position([10.0, 500.0, 500.0])
            .with_direction([1.0, 0.0, 0.0]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let outcome = trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Escaped);
        assert!(ledger.escaped > 0.0);
        assert_eq!(ledger.escaped, ion.e);
        assert!(!ion.is_moving());
    }

    #[test]
    fn test_periodic_boundaries_keep_ion_inside() {
        let trim = trim(30.0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut ion: Ion = Ion::new(38, 95.0, 1.0e6).with_position([15.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let outcome = trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Stopped);
        assert_eq!(ledger.escaped, 0.0);
        for recoil in queue.iter() {
            assert!(recoil.pos.iter().all(|&x| (0.0..30.0).contains(&x)));
        }
    }

    #[test]
    fn test_step_limit() {
        let sample = HomogeneousSample::new([400.0; 3], uo2()).unwrap();
        let settings = TransportSettings {
            max_collisions: 3,
            ..TransportSettings::default()
        };
        let trim = Trim::new(sample, table(), settings).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut ion: Ion = Ion::new(54, 132.0, 1.0e7).with_position([200.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let err = trim
            .transport(&mut ion, &mut queue, &mut ledger, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::StepLimit { collisions: 3 }));
    }

    #[test]
    fn test_without_partition_damage_is_full_transfer() {
        let sample = HomogeneousSample::new([400.0; 3], uo2()).unwrap();
        let settings = TransportSettings {
            robinson_partition: false,
            ..TransportSettings::default()
        };
        let trim = Trim::new(sample, table(), settings).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut ion: Ion = Ion::new(54, 132.0, 1.0e5).with_position([200.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();

        struct NoElectronicShare;
        impl TransportObserver<()> for NoElectronicShare {
            fn collision(&mut self, _ion: &Ion<()>, c: &Collision) {
                assert_eq!(c.electronic, 0.0);
                assert_eq!(c.damage, c.transferred);
            }
        }
        trim.transport_with(&mut ion, &mut queue, &mut ledger, &mut rng, &mut NoElectronicShare)
            .unwrap();
    }

    #[test]
    fn test_binding_equal_to_threshold_gives_positive_recoils() {
        let mut cu = Material::new(8.9);
        cu.add_element(Element::new(29, 63.5, 1.0).unwrap().with_thresholds(1.0, 1.0).unwrap());
        let sample = HomogeneousSample::new([400.0; 3], cu).unwrap();
        let trim = Trim::new(sample, table(), TransportSettings::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let e0 = 5.0e4;
        let mut ion: Ion = Ion::new(29, 63.5, e0).with_position([200.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();

        assert!(!queue.is_empty());
        assert!(queue.iter().all(|r| r.e > 0.0));
        let queued: f64 = queue.iter().map(|r| r.e).sum();
        assert!((e0 - ledger.total() - queued).abs() < 1e-6 * e0);
    }

    #[test]
    fn test_zero_mass_takes_table_mass() {
        let trim = trim(400.0);
        let mut rng = StdRng::seed_from_u64(8);
        let mut ion: Ion = Ion::new(29, 0.0, 5.0e4).with_position([200.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let outcome = trim.transport(&mut ion, &mut queue, &mut ledger, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Stopped);
        assert_eq!(ion.m1, 59.0);
        assert!(ion.t > 0.0 && ion.t.is_finite());
    }

    #[test]
    fn test_light_projectile_is_an_error() {
        let trim = trim(100.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut ion: Ion = Ion::new(2, 4.0, 1.0e6).with_position([50.0; 3]);
        let mut queue = RecoilQueue::new();
        let mut ledger = EnergyLedger::new();
        let err = trim
            .transport(&mut ion, &mut queue, &mut ledger, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProjectile { z: 2 }));
    }
}
