// Integration test: energy bookkeeping of complete fission events.
// Every eV of fragment kinetic energy must end up electronic, nuclear or
// escaped, in a periodic bubble sample and in a slab with cut faces.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use yatrim::*;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/stopping_synthetic.json");

fn uo2() -> Material {
    let mut m = Material::new(10.0).with_name("UO2");
    m.add_element(Element::new(92, 235.0, 1.0).unwrap());
    m.add_element(Element::new(8, 16.0, 2.0).unwrap());
    m
}

fn xe() -> Material {
    let mut m = Material::new(3.5).with_name("Xe");
    m.add_element(Element::new(54, 132.0, 1.0).unwrap());
    m
}

fn table() -> Arc<StoppingTable> {
    get_or_load_table(FIXTURE).unwrap()
}

#[test]
fn test_fission_event_conserves_energy() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut sample = ClusterSample::new([400.0; 3], uo2(), xe()).unwrap();
    sample.add_random_clusters(40, 10.0, 25.0, &mut rng).unwrap();
    let trim = Trim::new(sample, table(), TransportSettings::default()).unwrap();

    let mut source = FissionSource::new();
    let summary = run_fission_event::<_, MdTag, _, _>(&trim, &mut source, &mut rng, &mut ()).unwrap();

    // fission fragments carry tens of MeV each
    assert!(summary.initial_energy > 1.0e7);
    assert!(summary.ions > 2, "fragments must knock on recoils");
    assert!(summary.max_generation >= 1);
    assert_eq!(summary.escaped_ions, 0);
    assert_eq!(summary.ledger.escaped, 0.0);
    assert!(summary.ledger.electronic > summary.ledger.nuclear);
    assert!(
        summary.relative_balance().abs() < 1e-3,
        "imbalance {} eV of {} eV",
        summary.balance(),
        summary.initial_energy
    );
}

#[test]
fn test_cut_faces_book_escaped_energy() {
    let mut rng = StdRng::seed_from_u64(77);
    let sample = HomogeneousSample::new([40.0, 400.0, 400.0], uo2())
        .unwrap()
        .with_boundary(0, BoundaryCondition::Cut);
    let trim = Trim::new(sample, table(), TransportSettings::default()).unwrap();
    let mut source = FissionSource::new();

    let mut escaped_ions = 0;
    let mut escaped_energy = 0.0;
    for _ in 0..3 {
        let summary = run_fission_event::<_, (), _, _>(&trim, &mut source, &mut rng, &mut ()).unwrap();
        assert!(summary.relative_balance().abs() < 1e-3);
        escaped_ions += summary.escaped_ions;
        escaped_energy += summary.ledger.escaped;
    }
    assert!(escaped_ions > 0);
    assert!(escaped_energy > 0.0);
}

#[test]
fn test_single_ion_balance_without_partition() {
    let mut rng = StdRng::seed_from_u64(3);
    let sample = HomogeneousSample::new([400.0; 3], uo2()).unwrap();
    let settings = TransportSettings {
        robinson_partition: false,
        ..TransportSettings::default()
    };
    let trim = Trim::new(sample, table(), settings).unwrap();
    let ion: Ion = Ion::new(38, 95.0, 2.0e5).with_position([200.0; 3]);
    let summary = run_event(&trim, vec![ion], &mut rng, &mut ()).unwrap();
    assert!((summary.initial_energy - 2.0e5).abs() < 1e-9);
    assert!(summary.relative_balance().abs() < 1e-9);
}
