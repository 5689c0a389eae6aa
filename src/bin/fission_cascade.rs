//! # Fission cascade in UO2 with Xe bubbles
//!
//! Fission events in a periodic UO2 box containing randomly placed Xe
//! bubbles. Every Xe recoil is logged with its energy, generation and MD
//! marker; Xe atoms knocked out of a bubble additionally log their final
//! distance from the bubble centre.
//!
//! ## Usage
//!
//! ```bash
//! # 100 events, 10 Å bubbles at the reference bubble density
//! fission_cascade run1 10 1 100 --stopping-data data/scoef.json --seed 1
//! ```
//!
//! Output files: `<basename>.clcoor` (bubble centres), `<basename>.Erec`
//! (Xe recoil energies), `<basename>.dist` (Xe displacement from the bubble
//! centre) and, with `--phonons`, `<basename>.phonons`.

use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use yatrim::stopping::load_configured_table;
use yatrim::{
    run_fission_event, BoundaryCondition, ClusterSample, Config, Element, EnergyLedger,
    FissionSource, Material, MdTag, RecoilLog, Sample, TransportSettings, Trim,
};

/// Atomic number of the bubble gas.
const GAS_Z: u32 = 54;
/// Bubbles per Å³ at `Cbfactor = 1` (7e-4 per nm³).
const REFERENCE_BUBBLE_DENSITY: f64 = 7.0e-7;
/// Minimum distance between bubble surfaces (Å).
const BUBBLE_GAP: f64 = 25.0;

/// Fission fragment cascades in UO2 with Xe bubbles
#[derive(Parser, Debug)]
#[command(name = "fission_cascade")]
#[command(about = "BCA simulation of fission fragment cascades in UO2 with Xe bubbles")]
struct Args {
    /// Prefix of all output files
    basename: String,

    /// Bubble radius in Å
    radius: f64,

    /// Bubble density factor (1 => 7e-4 bubbles/nm^3)
    cbfactor: f64,

    /// Number of fission events (two fragments each)
    events: usize,

    /// Stopping coefficient JSON file (falls back to YATRIM_STOPPING_DATA)
    #[arg(long, short = 's')]
    stopping_data: Option<PathBuf>,

    /// Transport settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Random seed (system entropy when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Edge length of the cubic sample in Å
    #[arg(long, short = 'w', default_value = "400")]
    width: f64,

    /// Boundary condition per axis, e.g. `--boundary x=cut` (default periodic)
    #[arg(long = "boundary", value_parser = parse_boundary)]
    boundaries: Vec<(usize, BoundaryCondition)>,

    /// Write sub-threshold energy deposits to <basename>.phonons
    #[arg(long)]
    phonons: bool,
}

fn parse_boundary(s: &str) -> Result<(usize, BoundaryCondition), String> {
    BoundaryCondition::parse_axis(s).map_err(|e| e.to_string())
}

fn create(basename: &str, extension: &str) -> std::io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(format!(
        "{}.{}",
        basename, extension
    ))?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    if let Some(path) = &args.stopping_data {
        Config::global().set_stopping_data(path);
    }
    let table = load_configured_table()?;
    let settings = match &args.settings {
        Some(path) => TransportSettings::from_json_file(path)?,
        None => TransportSettings::default(),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut uo2 = Material::new(10.0).with_name("UO2");
    uo2.add_element(Element::new(92, 235.0, 1.0)?);
    uo2.add_element(Element::new(8, 16.0, 2.0)?);
    let mut xe = Material::new(3.5).with_name("Xe bubble");
    xe.add_element(Element::new(GAS_Z, 132.0, 1.0)?);

    let mut sample = ClusterSample::new([args.width; 3], uo2, xe)?;
    for &(axis, bc) in &args.boundaries {
        sample = sample.with_boundary(axis, bc);
    }

    let w = sample.width();
    let v_sam = w[0] * w[1] * w[2];
    let v_cl = 4.0 / 3.0 * std::f64::consts::PI * args.radius.powi(3);
    let n_cl = (v_sam * REFERENCE_BUBBLE_DENSITY * args.cbfactor) as usize;
    info!("adding {} clusters...", n_cl);
    let placed = sample.add_random_clusters(n_cl, args.radius, BUBBLE_GAP, &mut rng)?;

    let mut clcoor = create(&args.basename, "clcoor")?;
    for (i, cluster) in sample.clusters().iter().enumerate() {
        writeln!(
            clcoor,
            "{} {} {} {} {}",
            cluster.center[0], cluster.center[1], cluster.center[2], cluster.radius, i
        )?;
    }
    clcoor.flush()?;
    info!("sample built");

    let n_uo2 = sample.matrix().aggregate()?.arho * (v_sam - placed as f64 * v_cl);
    let gas_arho = sample.cluster_material().aggregate()?.arho;
    let n_gas = placed as f64 * gas_arho * v_cl;
    println!("N_UO2 = {}", n_uo2);
    println!("N_gas = {} (arho={})", n_gas, gas_arho);

    let trim = Trim::new(sample, table, settings)?;
    let mut recorder = RecoilLog::new(
        trim.sample(),
        GAS_Z,
        create(&args.basename, "Erec")?,
        create(&args.basename, "dist")?,
    );
    if args.phonons {
        recorder = recorder.with_phonons(create(&args.basename, "phonons")?);
    }

    let mut source = FissionSource::new();
    let mut total = EnergyLedger::new();
    for n in 0..args.events {
        if n % 10 == 0 {
            info!("event #{}", n + 1);
        }
        let summary =
            run_fission_event::<_, MdTag, _, _>(&trim, &mut source, &mut rng, &mut recorder)?;
        println!("{}", summary.ledger.electronic);
        println!("{}", summary.ledger.nuclear);
        println!("{}", summary.balance());
        total += summary.ledger;
    }
    recorder.flush()?;

    info!(
        "{} events: electronic {:.6e} eV, nuclear {:.6e} eV, escaped {:.6e} eV",
        args.events, total.electronic, total.nuclear, total.escaped
    );
    Ok(())
}
