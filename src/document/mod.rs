/*!
 * Document model for zip-of-XML containers.
 *
 * - `format`: per-format constants (parts, leaves, paragraphs)
 * - `indexer`: text units bound to tree positions
 * - `patcher`: position-safe write-back
 * - `direction`: right-to-left paragraph metadata
 * - `validator`: well-formedness check and repackaging
 */

pub mod direction;
pub mod format;
pub mod indexer;
pub mod patcher;
pub mod validator;

pub use self::format::{DocumentFormat, Granularity};
pub use self::indexer::{TextUnit, TextUnitIndexer};
pub use self::patcher::{PatchSummary, StructuralPatcher};
pub use self::validator::ContainerValidator;
