// Integration test: recoil generations and cascade termination.

use rand::rngs::StdRng;
use rand::SeedableRng;
use yatrim::*;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/stopping_synthetic.json");

/// Checks every ion as it leaves the queue and as it finishes.
#[derive(Default)]
struct GenerationCheck {
    popped: Vec<u32>,
    finished: usize,
    recoils: usize,
    max_recoil_fraction: f64,
}

impl TransportObserver<MdTag> for GenerationCheck {
    fn collision(&mut self, ion: &Ion<MdTag>, collision: &Collision) {
        assert!(ion.is_moving());
        assert!(collision.transferred >= 0.0);
        assert!(collision.damage <= collision.transferred + 1e-9);
    }

    fn recoil(&mut self, parent: &Ion<MdTag>, recoil: &Ion<MdTag>) {
        self.recoils += 1;
        assert_eq!(recoil.gen, parent.gen + 1);
        assert_eq!(recoil.t, parent.t);
        assert!(recoil.e > 0.0);
        assert!(recoil.z1 == 92 || recoil.z1 == 8);
        if parent.payload.md > 0 {
            assert_eq!(recoil.payload.md, parent.payload.md + 1);
        } else {
            assert_eq!(recoil.payload.md, 0);
        }
        let fraction = recoil.e / (recoil.e + parent.e);
        self.max_recoil_fraction = self.max_recoil_fraction.max(fraction);
    }
}

impl CascadeObserver<MdTag> for GenerationCheck {
    fn before(&mut self, ion: &mut Ion<MdTag>) -> Result<()> {
        assert!(ion.is_moving());
        self.popped.push(ion.gen);
        ion.payload.mark_gap(ion.e, 200.0, 12000.0);
        Ok(())
    }

    fn after(&mut self, ion: &Ion<MdTag>, outcome: Outcome) -> Result<()> {
        assert_eq!(outcome, Outcome::Stopped);
        assert_eq!(ion.state, IonState::Stopped);
        assert!(ion.e <= ion.ef);
        self.finished += 1;
        Ok(())
    }
}

#[test]
fn test_generations_in_fifo_order() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut uo2 = Material::new(10.0);
    uo2.add_element(Element::new(92, 235.0, 1.0).unwrap());
    uo2.add_element(Element::new(8, 16.0, 2.0).unwrap());
    let sample = HomogeneousSample::new([400.0; 3], uo2).unwrap();
    let table = get_or_load_table(FIXTURE).unwrap();
    let trim = Trim::new(sample, table, TransportSettings::default()).unwrap();

    let primaries: Vec<Ion<MdTag>> = vec![
        Ion::new(54, 132.0, 1.0e6).with_position([200.0; 3]).with_direction([0.0, 0.0, 1.0]),
        Ion::new(38, 95.0, 1.0e6).with_position([200.0; 3]).with_direction([0.0, 0.0, -1.0]),
    ];
    let mut check = GenerationCheck::default();
    let summary = run_event(&trim, primaries, &mut rng, &mut check).unwrap();

    assert_eq!(check.finished, summary.ions);
    assert_eq!(check.recoils + 2, summary.ions);
    assert_eq!(&check.popped[..2], &[0, 0]);
    // breadth first: generations never decrease along the queue
    for w in check.popped.windows(2) {
        assert!(w[1] >= w[0], "generation {} popped after {}", w[1], w[0]);
    }
    assert_eq!(*check.popped.iter().max().unwrap(), summary.max_generation);
    assert!(summary.max_generation >= 2);
    assert!(check.max_recoil_fraction < 1.0);
}

#[test]
fn test_sub_threshold_ion_only_deposits() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut cu = Material::new(8.96);
    cu.add_element(Element::from_symbol("Cu", 1.0).unwrap());
    let sample = HomogeneousSample::new([100.0; 3], cu).unwrap();
    let table = get_or_load_table(FIXTURE).unwrap();
    let trim = Trim::new(sample, table, TransportSettings::default()).unwrap();

    // below every displacement threshold: no recoil can be created
    let ion: Ion<MdTag> = Ion::new(29, 63.5, 20.0).with_position([50.0; 3]);
    let mut check = GenerationCheck::default();
    let summary = run_event(&trim, vec![ion], &mut rng, &mut check).unwrap();
    assert_eq!(summary.ions, 1);
    assert_eq!(check.recoils, 0);
    assert!(summary.relative_balance().abs() < 1e-12);
}
