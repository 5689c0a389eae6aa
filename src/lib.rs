pub mod data;
// Physics model: stopping, composition, scattering
pub mod config;
pub mod element;
pub mod error;
pub mod inverter;
pub mod material;
pub mod scatter;
pub mod settings;
pub mod stopping;

// Transport
pub mod bank;
pub mod cascade;
pub mod ion;
pub mod ledger;
pub mod sample;
pub mod transport;

pub use bank::RecoilQueue;
pub use cascade::{run_event, run_fission_event, CascadeObserver, EventSummary, FissionSource, RecoilLog};
pub use config::Config;
pub use element::{Element, ElementConstants};
pub use error::{Error, Result};
pub use inverter::{EnergyInverter, Inverter, MassInverter};
pub use ion::{Ion, IonPayload, IonState, MdTag, Species};
pub use ledger::EnergyLedger;
pub use material::{DerivedConstants, Material};
pub use sample::{BoundaryCondition, Cluster, ClusterSample, HomogeneousSample, MaterialHit, Sample};
pub use settings::TransportSettings;
pub use stopping::{get_or_load_table, StoppingTable};
pub use transport::{Collision, Outcome, TransportObserver, Trim};
