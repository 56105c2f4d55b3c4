#![warn(missing_docs)]
//! stack-tox: classify small molecules as toxic or non-toxic from SMILES.
//!
//! A pre-trained classifier is applied to molecular descriptors computed in
//! pure Rust (no RDKit/OpenBabel needed):
//!
//! - **smiles** — parser and validator producing a molecular graph
//! - **descriptors** — physicochemical, constitutional, topological and
//!   fragment descriptors, addressed by their conventional names
//! - **artifacts** — loads the classifier, scaler, imputer and descriptor list
//! - **preprocess** — repairs missing values and scales the feature vector
//! - **models** — compiled classifiers and the toxicity prediction
//! - **pipeline** — the stages wired together
//!
//! # Quick examples
//!
//! ### Validate and parse
//! ```
//! use stack_tox::{is_valid_smiles, parse_smiles};
//!
//! assert!(is_valid_smiles("CC(=O)Oc1ccccc1C(=O)O"));  // aspirin
//! assert!(!is_valid_smiles("C1CC"));                   // unclosed ring
//!
//! let mol = parse_smiles("CCO").unwrap();
//! assert_eq!(mol.atom_count(), 3);
//! ```
//!
//! ### Descriptor families
//! ```
//! use stack_tox::{constitutional_descriptors, physchem_descriptors, topological_descriptors};
//!
//! let props = physchem_descriptors("CCO").unwrap();  // ethanol
//! println!("MolWt: {:.3}, LogP: {:.2}, TPSA: {:.1}",
//!          props.mol_wt, props.mol_log_p, props.tpsa);
//!
//! let counts = constitutional_descriptors("CCO").unwrap();
//! assert_eq!(counts.num_h_donors, 1);
//!
//! let topo = topological_descriptors("CCO").unwrap();
//! assert!(topo.kappa1 > 0.0);
//! ```
//!
//! ### Classify with artifacts from a directory
//! ```no_run
//! use stack_tox::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default().with_artifact_dir("models"));
//! let prediction = pipeline.run("CCO", &mut std::io::stdout())?;
//! println!("{prediction}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifacts;
pub mod config;
pub mod descriptors;
pub mod element;
pub mod models;
pub mod molecule;
pub mod pipeline;
pub mod preprocess;
pub mod ring;
pub mod smiles;

// ─────────────────────────────────────────────────────────────────────────────
// Convenience re-exports
// ─────────────────────────────────────────────────────────────────────────────
pub use descriptors::constitutional::{constitutional_descriptors, ConstitutionalDescriptors};
pub use descriptors::fragments::{fragment_descriptors, FragmentDescriptors};
pub use descriptors::physicochemical::{physchem_descriptors, PhysChemDescriptors};
pub use descriptors::topological::{topological_descriptors, TopologicalDescriptors};
pub use descriptors::{calculate_descriptors, DescriptorError, DescriptorReport};

pub use artifacts::{load_pipeline, ArtifactBundle, ArtifactError};
pub use config::PipelineConfig;
pub use models::{predict_toxicity, Classifier, Prediction, ToxicityLabel};
pub use molecule::Molecule;
pub use pipeline::{Pipeline, PipelineError};
pub use smiles::{is_valid_smiles, parse_smiles, SmilesError};
