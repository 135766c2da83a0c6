//! xorcrypt-engine: parallel repeating-key XOR file transform
//!
//! Pipeline: load key → load input → partition → XOR workers → barrier → write output
//!
//! ```text
//! input buffer  [0 ........................................ N)
//!                | worker 0  | worker 1  | ... | worker W-1 + remainder |
//! output[i] = input[i] ^ key[i % key_len]
//! ```
//!
//! Each worker owns a disjoint `&mut` slice of the input buffer, so the
//! transform needs no locks. The transform is its own inverse: running it
//! twice with the same key restores the original bytes.

pub mod entry;
pub mod loader;
pub mod orchestrator;
pub mod partition;
pub mod pool;
pub mod writer;

pub use entry::{build_request, decrypt, encrypt, transform};
pub use loader::{load_input, load_key, InputBuffer, KeyBuffer};
pub use orchestrator::{EngineOptions, TransformStage, Transformer};
pub use partition::{partition, split_fragments, Fragment, FragmentSlice};
pub use pool::{run_workers, xor_fragment, StdSpawner, WorkerSpawner};
pub use writer::write_output;
